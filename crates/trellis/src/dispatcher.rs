// File: src/dispatcher.rs
// Purpose: Per-request pipeline: match, method lookup, middleware, handler,
// render, error boundaries

use crate::compose::render_page;
use crate::error::DispatchError;
use crate::middleware::{Endpoint, Next};
use crate::module::{BoxFuture, HandlerFn, Outcome};
use crate::request_context::{Request, RequestContext};
use crate::response::Response;
use crate::route_table::{ErrorBoundary, HandlerRoute, RouteTable};
use anyhow::anyhow;
use axum::http::StatusCode;
use tracing::{debug, error, warn};

/// The handler plus rendering, run after the middleware chain
struct RouteEndpoint<'r> {
    route: &'r HandlerRoute,
    handler: &'r HandlerFn,
}

impl Endpoint for RouteEndpoint<'_> {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, anyhow::Result<Response>> {
        Box::pin(async move {
            match (self.handler)(ctx).await? {
                Outcome::Response(response) => Ok(response),
                Outcome::Render(data) => {
                    ctx.data = data;
                    let component = self.route.component.as_ref().ok_or_else(|| {
                        anyhow!("route `{}` has no component to render", self.route.file())
                    })?;
                    let markup = render_page(component, &self.route.composition, ctx)?;
                    Ok(Response::html(markup))
                }
            }
        })
    }
}

/// Dispatches one request against `table`
///
/// 404 and 405 are answered before any middleware runs. Failures from
/// middleware, the handler or rendering walk the route's error chain;
/// `Err` means no boundary recovered.
pub async fn handle_request(
    table: &RouteTable,
    request: Request,
) -> Result<Response, DispatchError> {
    let Some(matched) = table.find(request.path()) else {
        debug!("No route for {} {}", request.method, request.path());
        return Ok(Response::not_found());
    };

    let route = matched.value.as_ref();
    let Some(handler) = route.methods.get(&request.method) else {
        debug!(
            "{} not allowed on {} (allowed {:?})",
            request.method,
            route.pattern(),
            route.methods
        );
        return Ok(Response::method_not_allowed(&route.methods.allowed()));
    };

    debug!("{} {} -> {}", request.method, request.path(), route.file());

    let mut ctx = RequestContext::new(request, matched.params, route.pattern().as_str());
    let endpoint = RouteEndpoint { route, handler };

    match Next::new(&route.middleware, &endpoint).run(&mut ctx).await {
        Ok(response) => Ok(response),
        Err(failure) => recover(route, &mut ctx, failure).await,
    }
}

/// Walks the error chain nearest-first
///
/// Each boundary sees the latest failure in `ctx.error`. A boundary that
/// fails hands its own failure to the next one up, never to itself.
async fn recover(
    route: &HandlerRoute,
    ctx: &mut RequestContext,
    mut failure: anyhow::Error,
) -> Result<Response, DispatchError> {
    for boundary in &route.error_chain {
        if !boundary.can_respond(&ctx.method) {
            continue;
        }

        warn!(
            "{} {} failed: {:#}; rendering {}",
            ctx.method, ctx.path, failure, boundary.entry.file
        );

        ctx.data = None;
        ctx.error = Some(failure);
        match respond(boundary, ctx).await {
            Ok(response) => return Ok(response),
            Err(next) => failure = next,
        }
    }

    error!(
        "{} {} failed with no error boundary left: {:#}",
        ctx.method, ctx.path, failure
    );

    Err(DispatchError::Unrecovered {
        method: ctx.method.clone(),
        path: ctx.path.clone(),
        route: ctx.route.clone(),
        source: failure,
    })
}

async fn respond(boundary: &ErrorBoundary, ctx: &mut RequestContext) -> anyhow::Result<Response> {
    if let Some(handler) = boundary.methods.get(&ctx.method) {
        match handler(ctx).await? {
            Outcome::Response(response) => return Ok(response),
            Outcome::Render(data) => ctx.data = data,
        }
    }

    let component = boundary.component.as_ref().ok_or_else(|| {
        anyhow!("error boundary `{}` has no component to render", boundary.entry.file)
    })?;
    let markup = render_page(component, &boundary.composition, ctx)?;
    Ok(Response::html(markup).status(StatusCode::INTERNAL_SERVER_ERROR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;
    use crate::module::{component, handler, Exports, ModuleRegistry};
    use axum::http::Method;

    async fn table(registry: ModuleRegistry) -> RouteTable {
        RouteTable::build("routes", &registry, &registry, &RoutingConfig::default())
            .await
            .unwrap()
    }

    fn failing(message: &'static str) -> Exports {
        Exports::new().with_handler(handler(move |_ctx| {
            Box::pin(async move { Err(anyhow!(message)) })
        }))
    }

    #[tokio::test]
    async fn test_not_found_skips_everything() {
        let table = table(ModuleRegistry::new()).await;
        let response = handle_request(&table, Request::new(Method::GET, "/nope"))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_boundary_without_component_is_skipped() {
        let registry = ModuleRegistry::new()
            .with_module(
                "_error.tsx",
                Exports::new().with_component(component(|props| {
                    Ok(maud::html! { "root: " (props.ctx.error_message().unwrap_or_default()) })
                })),
            )
            .with_module(
                "inner/_error.tsx",
                Exports::new().with_method(
                    Method::POST,
                    handler(|_ctx| Box::pin(async { Ok(Response::text("posted").into()) })),
                ),
            )
            .with_module("inner/boom.tsx", failing("bad"));
        let table = table(registry).await;

        let response = handle_request(&table, Request::new(Method::GET, "/inner/boom"))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body, "root: bad");

        let response = handle_request(&table, Request::new(Method::POST, "/inner/boom"))
            .await
            .unwrap();
        assert_eq!(response.body, "posted");
    }

    #[tokio::test]
    async fn test_unrecovered_failure() {
        let table = table(ModuleRegistry::new().with_module("boom.ts", failing("kaput"))).await;
        let err = handle_request(&table, Request::new(Method::GET, "/boom"))
            .await
            .unwrap_err();
        let DispatchError::Unrecovered { route, source, .. } = err;
        assert_eq!(route, "/boom");
        assert_eq!(source.to_string(), "kaput");
    }
}
