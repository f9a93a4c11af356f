// Trellis - file-routed request pipeline
// Resolves a routes directory into handlers wrapped by layouts, middleware
// and error boundaries, rendered with Maud

pub mod compose;
pub mod config;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod middleware;
pub mod module;
pub mod request_context;
pub mod response;
pub mod route_table;

// Re-export Maud for components
pub use maud::{html as maud, Markup, PreEscaped, DOCTYPE};

// Re-export framework types
pub use compose::{compose, render_page, Composition, Layout};
pub use config::{Config, RoutingConfig, ServerConfig};
pub use discovery::{FileEntry, FileKind, FileLister, FsLister};
pub use dispatcher::handle_request;
pub use error::{BuildError, DispatchError};
pub use middleware::{Endpoint, Next};
pub use module::{
    component, handler, middleware, BoxFuture, Exports, HandlerFn, Handlers,
    MiddlewareFn, ModuleLoader, ModuleRegistry, Outcome, PageProps, RenderFn, RouteConfig,
};
pub use request_context::{QueryParams, Request, RequestContext, State};
pub use response::{IntoHtml, Response, HTML_CONTENT_TYPE};
pub use route_table::{
    build_route_table, EntryKind, ErrorBoundary, HandlerRoute, MethodTable, RouteEntry,
    RouteTable, SUPPORTED_METHODS,
};

// Re-export the pure routing layer
pub use trellis_router::{Params, ParamValue, Pattern, PatternError};

// Re-export commonly used types from dependencies
pub use axum;
pub use axum::http::{Method, StatusCode};
