//! Render composition: leaf component, then layouts innermost to outermost,
//! then the app shell.

use crate::module::{PageProps, RenderFn, RouteConfig};
use crate::request_context::RequestContext;
use anyhow::Result;
use maud::Markup;
use std::sync::Arc;

/// A `_layout` module as it applies to routes below it
#[derive(Clone)]
pub struct Layout {
    /// Directory the layout lives in (`/`, `/blog`)
    pub dir: String,
    /// Source file, relative to the routes root
    pub file: String,
    /// `None` for config-only layouts, which wrap nothing
    pub component: Option<RenderFn>,
    pub config: RouteConfig,
}

impl std::fmt::Debug for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layout")
            .field("file", &self.file)
            .field("config", &self.config)
            .finish()
    }
}

/// Precomputed wrapping for one route or error boundary
#[derive(Clone, Default)]
pub struct Composition {
    /// Root-to-leaf
    pub layouts: Vec<Arc<Layout>>,
    pub app: Option<RenderFn>,
}

impl Composition {
    pub fn wraps_in_app(&self) -> bool {
        self.app.is_some()
    }

    /// Source files of the layouts, root-to-leaf
    pub fn layout_files(&self) -> Vec<&str> {
        self.layouts.iter().map(|l| l.file.as_str()).collect()
    }
}

impl std::fmt::Debug for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composition")
            .field("layouts", &self.layout_files())
            .field("app", &self.app.is_some())
            .finish()
    }
}

/// Wraps already-rendered `leaf` markup in `layouts` and then `app`
pub fn compose(
    leaf: Markup,
    layouts: &[Arc<Layout>],
    app: Option<&RenderFn>,
    ctx: &RequestContext,
) -> Result<Markup> {
    let wrapped = layouts
        .iter()
        .rev()
        .try_fold(leaf, |children, layout| match &layout.component {
            Some(component) => component(&PageProps::new(ctx, Some(children))),
            None => Ok(children),
        })?;

    match app {
        Some(app) => app(&PageProps::new(ctx, Some(wrapped))),
        None => Ok(wrapped),
    }
}

/// Renders `component` and wraps it per `composition`
pub fn render_page(
    component: &RenderFn,
    composition: &Composition,
    ctx: &RequestContext,
) -> Result<Markup> {
    let leaf = component(&PageProps::new(ctx, None))?;
    compose(leaf, &composition.layouts, composition.app.as_ref(), ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::component;
    use crate::request_context::Request;
    use axum::http::Method;
    use trellis_router::Params;

    fn wrapper(name: &'static str) -> RenderFn {
        component(move |props| {
            Ok(maud::html! { (name) "(" (props.children()) ")" })
        })
    }

    fn layout(dir: &str, component: Option<RenderFn>) -> Arc<Layout> {
        Arc::new(Layout {
            dir: dir.to_string(),
            file: format!("{}/_layout.tsx", dir.trim_end_matches('/')),
            component,
            config: RouteConfig::default(),
        })
    }

    fn ctx() -> RequestContext {
        RequestContext::new(Request::new(Method::GET, "/"), Params::new(), "/")
    }

    #[test]
    fn test_layouts_nest_innermost_first() {
        let layouts = vec![
            layout("/", Some(wrapper("layout"))),
            layout("/foo", Some(wrapper("foo_layout"))),
        ];
        let app = wrapper("app");
        let leaf = maud::html! { "page" };

        let html = compose(leaf, &layouts, Some(&app), &ctx()).unwrap();
        assert_eq!(html.into_string(), "app(layout(foo_layout(page)))");
    }

    #[test]
    fn test_config_only_layout_is_transparent() {
        let layouts = vec![layout("/", None), layout("/foo", Some(wrapper("inner")))];
        let html = compose(maud::html! { "x" }, &layouts, None, &ctx()).unwrap();
        assert_eq!(html.into_string(), "inner(x)");
    }

    #[test]
    fn test_render_page_with_data() {
        let page = component(|props| {
            let name = props
                .data()
                .and_then(|d| d["name"].as_str())
                .unwrap_or("nobody");
            Ok(maud::html! { "hi " (name) })
        });
        let mut ctx = ctx();
        ctx.data = Some(serde_json::json!({ "name": "ada" }));

        let composition = Composition {
            layouts: vec![],
            app: Some(wrapper("app")),
        };
        let html = render_page(&page, &composition, &ctx).unwrap();
        assert_eq!(html.into_string(), "app(hi ada)");
    }

    #[test]
    fn test_layout_failure_propagates() {
        let failing = component(|_props| anyhow::bail!("layout broke"));
        let layouts = vec![layout("/", Some(failing))];
        let err = compose(maud::html! { "x" }, &layouts, None, &ctx()).unwrap_err();
        assert_eq!(err.to_string(), "layout broke");
    }
}
