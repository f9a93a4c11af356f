// File: src/module.rs
// Purpose: Route module exports and the loader seam that produces them

use crate::discovery::{FileEntry, FileKind, FileLister};
use crate::middleware::Next;
use crate::request_context::RequestContext;
use crate::response::Response;
use async_trait::async_trait;
use axum::http::Method;
use maud::Markup;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Request handler: may render the route's component or answer directly
pub type HandlerFn = Arc<
    dyn for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, anyhow::Result<Outcome>> + Send + Sync,
>;

/// Middleware link: receives the context and the rest of the chain
pub type MiddlewareFn = Arc<
    dyn for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, anyhow::Result<Response>>
        + Send
        + Sync,
>;

/// Component: page, layout, app shell or error boundary markup
pub type RenderFn = Arc<dyn Fn(&PageProps<'_>) -> anyhow::Result<Markup> + Send + Sync>;

/// Wraps a closure as a [`HandlerFn`]
///
/// ```ignore
/// handler(|ctx| Box::pin(async move {
///     ctx.state.insert("seen", true);
///     Ok(Outcome::render())
/// }))
/// ```
pub fn handler<F>(f: F) -> HandlerFn
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, anyhow::Result<Outcome>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Wraps a closure as a [`MiddlewareFn`]
///
/// ```ignore
/// middleware(|ctx, next| Box::pin(async move {
///     ctx.state.insert("user", "ada");
///     next.run(ctx).await
/// }))
/// ```
pub fn middleware<F>(f: F) -> MiddlewareFn
where
    F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, anyhow::Result<Response>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Wraps a closure as a [`RenderFn`]
pub fn component<F>(f: F) -> RenderFn
where
    F: Fn(&PageProps<'_>) -> anyhow::Result<Markup> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Handler that renders the route's component with no data
pub(crate) fn render_component() -> HandlerFn {
    handler(|_ctx| Box::pin(async { Ok(Outcome::render()) }))
}

// ============================================================================
// Outcome & PageProps
// ============================================================================

/// What a handler asks the dispatcher to do next
#[derive(Debug)]
pub enum Outcome {
    /// Render the route's component, optionally with data
    Render(Option<JsonValue>),
    /// Send this response as-is: no component, no layouts, no app shell
    Response(Response),
}

impl Outcome {
    pub fn render() -> Self {
        Outcome::Render(None)
    }

    pub fn render_with(data: impl Into<JsonValue>) -> Self {
        Outcome::Render(Some(data.into()))
    }
}

impl From<Response> for Outcome {
    fn from(response: Response) -> Self {
        Outcome::Response(response)
    }
}

/// Input to every component
///
/// `children` carries the already-rendered markup of the nested component
/// when a layout or app shell is being rendered.
pub struct PageProps<'a> {
    pub ctx: &'a RequestContext,
    pub children: Option<Markup>,
}

impl<'a> PageProps<'a> {
    pub fn new(ctx: &'a RequestContext, children: Option<Markup>) -> Self {
        Self { ctx, children }
    }

    /// Nested markup, or empty markup for a leaf component
    pub fn children(&self) -> Markup {
        self.children
            .clone()
            .unwrap_or_else(|| maud::PreEscaped(String::new()))
    }

    pub fn data(&self) -> Option<&JsonValue> {
        self.ctx.data.as_ref()
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        self.ctx.error.as_ref()
    }
}

// ============================================================================
// Exports
// ============================================================================

/// Per-file flags that change how a route or layout is wrapped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteConfig {
    /// Do not wrap in the `_app` shell
    pub skip_app_wrapper: bool,
    /// Ignore layouts from ancestor directories
    pub skip_inherited_layouts: bool,
}

impl RouteConfig {
    pub fn skip_app_wrapper() -> Self {
        Self {
            skip_app_wrapper: true,
            ..Self::default()
        }
    }

    pub fn skip_inherited_layouts() -> Self {
        Self {
            skip_inherited_layouts: true,
            ..Self::default()
        }
    }
}

/// The `handlers` export
#[derive(Clone)]
pub enum Handlers {
    /// One function for every supported method
    All(HandlerFn),
    /// Only the listed methods are accepted
    ByMethod(HashMap<Method, HandlerFn>),
}

/// Everything a route module can export
#[derive(Clone, Default)]
pub struct Exports {
    pub handler: Option<HandlerFn>,
    pub handlers: Option<Handlers>,
    pub default: Option<RenderFn>,
    pub config: Option<RouteConfig>,
    pub middleware: Vec<MiddlewareFn>,
}

impl std::fmt::Debug for Exports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = match &self.handlers {
            None => None,
            Some(Handlers::All(_)) => Some(vec!["*".to_string()]),
            Some(Handlers::ByMethod(map)) => {
                let mut methods: Vec<String> = map.keys().map(|m| m.to_string()).collect();
                methods.sort();
                Some(methods)
            }
        };

        f.debug_struct("Exports")
            .field("handler", &self.handler.is_some())
            .field("handlers", &handlers)
            .field("default", &self.default.is_some())
            .field("config", &self.config)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

impl Exports {
    pub fn new() -> Self {
        Self::default()
    }

    /// `handler` export: one function answering every method
    pub fn with_handler(mut self, handler: HandlerFn) -> Self {
        self.handler = Some(handler);
        self
    }

    /// `handlers` export as a single function
    pub fn with_handlers(mut self, handler: HandlerFn) -> Self {
        self.handlers = Some(Handlers::All(handler));
        self
    }

    /// Adds one entry to a per-method `handlers` export
    ///
    /// Replaces a previous single-function `handlers` export.
    pub fn with_method(mut self, method: Method, handler: HandlerFn) -> Self {
        match &mut self.handlers {
            Some(Handlers::ByMethod(map)) => {
                map.insert(method, handler);
            }
            _ => {
                self.handlers = Some(Handlers::ByMethod(HashMap::from([(method, handler)])));
            }
        }
        self
    }

    /// `default` export
    pub fn with_component(mut self, component: RenderFn) -> Self {
        self.default = Some(component);
        self
    }

    pub fn with_config(mut self, config: RouteConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_middleware(mut self, middleware: MiddlewareFn) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Whether the module exports any of `handler`, `handlers`, `default`, `config`
    pub fn has_relevant_exports(&self) -> bool {
        self.handler.is_some()
            || self.handlers.is_some()
            || self.default.is_some()
            || self.config.is_some()
    }

    pub fn config_or_default(&self) -> RouteConfig {
        self.config.unwrap_or_default()
    }
}

// ============================================================================
// Module loading
// ============================================================================

/// Resolves a logical path (relative to the routes root, with extension)
/// to the module's exports
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self, logical_path: &str) -> anyhow::Result<Exports>;
}

/// In-memory module table
///
/// Doubles as a [`FileLister`] so a route tree can be declared entirely in
/// code, which is how the server's demo tree and the tests are built.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, Exports>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `exports` under a path relative to the routes root
    /// (`blog/[slug].tsx`)
    pub fn with_module(mut self, path: impl Into<String>, exports: Exports) -> Self {
        self.insert(path, exports);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, exports: Exports) {
        let path = path.into().replace('\\', "/");
        self.modules
            .insert(path.trim_start_matches('/').to_string(), exports);
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[async_trait]
impl ModuleLoader for ModuleRegistry {
    async fn load(&self, logical_path: &str) -> anyhow::Result<Exports> {
        self.modules
            .get(logical_path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("module not found: {logical_path}"))
    }
}

impl FileLister for ModuleRegistry {
    fn list(&self, root: &Path) -> anyhow::Result<Vec<FileEntry>> {
        Ok(self
            .modules
            .keys()
            .map(|key| FileEntry {
                path: root.join(key),
                kind: FileKind::File,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn page(text: &'static str) -> RenderFn {
        component(move |_props| Ok(maud::html! { (text) }))
    }

    #[test]
    fn test_relevant_exports() {
        assert!(!Exports::new().has_relevant_exports());
        assert!(!Exports::new()
            .with_middleware(middleware(|ctx, next| next.run(ctx)))
            .has_relevant_exports());
        assert!(Exports::new().with_component(page("x")).has_relevant_exports());
        assert!(Exports::new()
            .with_config(RouteConfig::skip_app_wrapper())
            .has_relevant_exports());
        assert!(Exports::new()
            .with_handler(render_component())
            .has_relevant_exports());
    }

    #[test]
    fn test_with_method_accumulates() {
        let exports = Exports::new()
            .with_method(Method::GET, render_component())
            .with_method(Method::POST, render_component());

        match exports.handlers {
            Some(Handlers::ByMethod(map)) => {
                assert_eq!(map.len(), 2);
                assert!(map.contains_key(&Method::POST));
            }
            _ => panic!("expected per-method handlers"),
        }
    }

    #[tokio::test]
    async fn test_registry_loads_and_lists() {
        let registry = ModuleRegistry::new()
            .with_module("index.tsx", Exports::new().with_component(page("home")))
            .with_module("/blog/[slug].tsx", Exports::new().with_component(page("post")));

        assert!(registry.load("index.tsx").await.is_ok());
        assert!(registry.load("blog/[slug].tsx").await.is_ok());

        let err = registry.load("missing.tsx").await.unwrap_err();
        assert!(err.to_string().contains("module not found"));

        let listed: Vec<PathBuf> = registry
            .list(Path::new("routes"))
            .unwrap()
            .into_iter()
            .map(|entry| entry.path)
            .collect();
        assert_eq!(
            listed,
            vec![
                PathBuf::from("routes/blog/[slug].tsx"),
                PathBuf::from("routes/index.tsx")
            ]
        );
    }
}
