use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;
use trellis::RouteTable;

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RouteTable>,
}

/// Every path goes through the route table; axum only provides transport
pub fn router(table: Arc<RouteTable>) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(AppState { table })
        .layer(TraceLayer::new_for_http())
}

async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Payload Too Large",
                &e.to_string(),
            )
        }
    };

    let request = trellis::Request::from_parts(&parts, body);
    match state.table.handle(request).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            error!("{:#}", anyhow::Error::from(e));
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "The request failed and no error page handled it.",
            )
        }
    }
}

fn error_response(status: StatusCode, title: &str, message: &str) -> Response {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><title>{title}</title></head>
<body>
  <h1>{status} {title}</h1>
  <p>{message}</p>
  <a href="/">Go Home</a>
</body>
</html>"#,
        status = status.as_u16(),
        title = title,
        message = message
    );
    (status, Html(html)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use axum::body::Body;
    use axum::http::{self, Method};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tower::ServiceExt;
    use trellis::{Exports, ModuleRegistry, RoutingConfig};

    async fn demo_app() -> Router {
        let registry = demo::registry();
        let table = RouteTable::build("routes", &registry, &registry, &RoutingConfig::default())
            .await
            .unwrap();
        router(Arc::new(table))
    }

    async fn call(app: Router, request: http::Request<Body>) -> (StatusCode, http::HeaderMap, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get(uri: &str) -> http::Request<Body> {
        http::Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[rstest]
    #[case("/", StatusCode::OK)]
    #[case("/about", StatusCode::OK)]
    #[case("/blog", StatusCode::OK)]
    #[case("/blog/hello-world", StatusCode::OK)]
    #[case("/docs/guide/routing", StatusCode::OK)]
    #[case("/blog/broken", StatusCode::INTERNAL_SERVER_ERROR)]
    #[case("/admin", StatusCode::UNAUTHORIZED)]
    #[case("/missing/page", StatusCode::NOT_FOUND)]
    #[tokio::test]
    async fn test_demo_statuses(#[case] uri: &str, #[case] status: StatusCode) {
        let (actual, _, _) = call(demo_app().await, get(uri)).await;
        assert_eq!(actual, status);
    }

    #[tokio::test]
    async fn test_home_is_wrapped_in_shell_and_layout() {
        let request = http::Request::builder()
            .uri("/")
            .header("x-user", "ada")
            .body(Body::empty())
            .unwrap();
        let (_, headers, body) = call(demo_app().await, request).await;

        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("<nav>"));
        assert!(body.contains("Hello, ada."));
        assert!(headers.contains_key("x-response-time"));
        assert_eq!(headers["content-type"], trellis::HTML_CONTENT_TYPE);
    }

    #[tokio::test]
    async fn test_blog_error_boundary() {
        let (_, _, body) = call(demo_app().await, get("/blog/broken")).await;
        assert!(body.contains("Blog error"));
        assert!(body.contains("this post failed to load"));
        assert!(body.contains("<nav>"));
    }

    #[tokio::test]
    async fn test_widget_skips_shell() {
        let (_, _, body) = call(demo_app().await, get("/embed/widget")).await;
        assert_eq!(body, r#"<nav><a href="/">Home</a> <a href="/blog">Blog</a> <a href="/docs">Docs</a> <a href="/about">About</a></nav><main><div class="widget">widget</div></main>"#);
    }

    #[tokio::test]
    async fn test_admin_with_header() {
        let request = http::Request::builder()
            .uri("/admin")
            .header("x-admin", "1")
            .header("x-user", "root")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = call(demo_app().await, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Signed in as root"));
    }

    #[tokio::test]
    async fn test_api_echo() {
        let request = http::Request::builder()
            .method(Method::POST)
            .uri("/api/echo")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"n":1}"#))
            .unwrap();
        let (status, headers, body) = call(demo_app().await, request).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(headers["content-type"], "application/json");
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "echo": { "n": 1 } }));
    }

    #[tokio::test]
    async fn test_api_rejects_other_methods() {
        let request = http::Request::builder()
            .method(Method::DELETE)
            .uri("/api/echo")
            .body(Body::empty())
            .unwrap();
        let (status, headers, _) = call(demo_app().await, request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers["allow"], "GET, POST");
    }

    #[tokio::test]
    async fn test_unrecovered_failure_is_500() {
        let registry = ModuleRegistry::new().with_module(
            "boom.ts",
            Exports::new().with_handler(trellis::handler(|_ctx| {
                Box::pin(async { Err(anyhow::anyhow!("boom")) })
            })),
        );
        let table = RouteTable::build("routes", &registry, &registry, &RoutingConfig::default())
            .await
            .unwrap();

        let (status, _, body) = call(router(Arc::new(table)), get("/boom")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Internal Server Error"));
        assert!(!body.contains("boom"));
    }
}
