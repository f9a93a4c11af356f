// File: src/route_table.rs
// Purpose: Builds the immutable route table from a routes directory

use crate::compose::{Composition, Layout};
use crate::config::RoutingConfig;
use crate::discovery::{relative_route_path, FileKind, FileLister};
use crate::error::{BuildError, DispatchError};
use crate::module::{
    render_component, Exports, HandlerFn, Handlers, MiddlewareFn, ModuleLoader, RenderFn,
    RouteConfig,
};
use crate::request_context::Request;
use crate::response::Response;
use axum::http::Method;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trellis_router::{sort_route_paths, split_extension, PathHierarchy, Pattern, RouteMatch, Router};

/// Methods a `handlers` function export answers
pub const SUPPORTED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PATCH,
    Method::PUT,
    Method::DELETE,
    Method::HEAD,
];

// ============================================================================
// Entries
// ============================================================================

/// What a route file is, decided once from its stem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Handler,
    Layout,
    Middleware,
    ErrorBoundary,
    AppShell,
}

impl EntryKind {
    pub fn classify(stem: &str) -> Self {
        match stem {
            "_app" => EntryKind::AppShell,
            "_error" => EntryKind::ErrorBoundary,
            "_middleware" => EntryKind::Middleware,
            "_layout" => EntryKind::Layout,
            _ => EntryKind::Handler,
        }
    }
}

/// A discovered route file
///
/// For handlers `pattern` is the route they answer; for the special files it
/// is the directory they apply to.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    /// Path relative to the routes root, with extension
    pub file: String,
    /// Directory in route form (`/`, `/blog/[slug]`)
    pub dir: String,
    pub kind: EntryKind,
    pub pattern: Pattern,
    pub config: RouteConfig,
}

impl RouteEntry {
    fn discover(file: String) -> Result<Self, BuildError> {
        let (dir_part, name) = file.rsplit_once('/').unwrap_or(("", file.as_str()));
        let (stem, _) = split_extension(name);
        let dir = format!("/{dir_part}");
        let kind = EntryKind::classify(stem);

        let route = match kind {
            EntryKind::Handler if stem != "index" => join_route(&dir, stem),
            _ => dir.clone(),
        };

        let pattern = Pattern::compile(&route).map_err(|source| BuildError::InvalidPattern {
            path: file.clone(),
            source,
        })?;

        Ok(Self {
            file,
            dir,
            kind,
            pattern,
            config: RouteConfig::default(),
        })
    }
}

fn join_route(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

// ============================================================================
// Method table
// ============================================================================

/// Per-method handler lookup for one route or error boundary
#[derive(Clone, Default)]
pub struct MethodTable {
    by_method: HashMap<Method, HandlerFn>,
    /// From a `handler` export: answers every method
    any: Option<HandlerFn>,
}

impl MethodTable {
    /// `render_on_get` maps GET to component rendering for `default`-only modules
    fn from_exports(exports: &Exports, render_on_get: bool) -> Self {
        let mut table = MethodTable {
            by_method: HashMap::new(),
            any: exports.handler.clone(),
        };

        match &exports.handlers {
            Some(Handlers::All(handler)) => {
                for method in SUPPORTED_METHODS {
                    table.by_method.insert(method, handler.clone());
                }
            }
            Some(Handlers::ByMethod(map)) => {
                table
                    .by_method
                    .extend(map.iter().map(|(m, h)| (m.clone(), h.clone())));
            }
            None => {
                if render_on_get && table.any.is_none() && exports.default.is_some() {
                    table.by_method.insert(Method::GET, render_component());
                }
            }
        }

        table
    }

    pub fn get(&self, method: &Method) -> Option<&HandlerFn> {
        self.by_method.get(method).or(self.any.as_ref())
    }

    pub fn accepts(&self, method: &Method) -> bool {
        self.get(method).is_some()
    }

    /// Accepted methods, in `SUPPORTED_METHODS` order first
    pub fn allowed(&self) -> Vec<Method> {
        if self.any.is_some() {
            return SUPPORTED_METHODS.to_vec();
        }

        let mut extra: Vec<Method> = self
            .by_method
            .keys()
            .filter(|m| !SUPPORTED_METHODS.contains(m))
            .cloned()
            .collect();
        extra.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        SUPPORTED_METHODS
            .iter()
            .filter(|m| self.by_method.contains_key(*m))
            .cloned()
            .chain(extra)
            .collect()
    }
}

impl std::fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.allowed()).finish()
    }
}

// ============================================================================
// Routes
// ============================================================================

/// An `_error` module with its own precomputed wrapping
pub struct ErrorBoundary {
    pub entry: RouteEntry,
    pub methods: MethodTable,
    pub component: Option<RenderFn>,
    pub composition: Composition,
}

impl ErrorBoundary {
    /// Whether this boundary can answer a request made with `method`
    pub fn can_respond(&self, method: &Method) -> bool {
        self.methods.accepts(method) || self.component.is_some()
    }
}

impl std::fmt::Debug for ErrorBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorBoundary")
            .field("file", &self.entry.file)
            .field("methods", &self.methods)
            .field("component", &self.component.is_some())
            .field("composition", &self.composition)
            .finish()
    }
}

/// A dispatchable route with every chain it needs
pub struct HandlerRoute {
    pub entry: RouteEntry,
    pub methods: MethodTable,
    pub component: Option<RenderFn>,
    /// Root-to-leaf
    pub middleware: Vec<MiddlewareFn>,
    pub composition: Composition,
    /// Nearest boundary first
    pub error_chain: Vec<Arc<ErrorBoundary>>,
}

impl HandlerRoute {
    pub fn pattern(&self) -> &Pattern {
        &self.entry.pattern
    }

    pub fn file(&self) -> &str {
        &self.entry.file
    }

    /// Source files of the error boundaries, nearest first
    pub fn error_files(&self) -> Vec<&str> {
        self.error_chain
            .iter()
            .map(|b| b.entry.file.as_str())
            .collect()
    }
}

impl std::fmt::Debug for HandlerRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRoute")
            .field("pattern", &self.entry.pattern.as_str())
            .field("file", &self.entry.file)
            .field("methods", &self.methods)
            .field("middleware", &self.middleware.len())
            .field("composition", &self.composition)
            .field("error_chain", &self.error_files())
            .finish()
    }
}

// ============================================================================
// Route table
// ============================================================================

/// Immutable, ordered route table shared by all requests
pub struct RouteTable {
    router: Router<Arc<HandlerRoute>>,
    entries: Vec<RouteEntry>,
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.router.len())
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl RouteTable {
    /// Discovers, loads and links every route file under `root`
    ///
    /// Modules load concurrently; the first failure aborts the build.
    pub async fn build(
        root: impl AsRef<Path>,
        loader: &dyn ModuleLoader,
        lister: &dyn FileLister,
        config: &RoutingConfig,
    ) -> Result<Self, BuildError> {
        let root = root.as_ref();
        let listed = lister
            .list(root)
            .map_err(|source| BuildError::Discovery {
                root: root.to_path_buf(),
                source,
            })?;

        let mut files: Vec<String> = listed
            .into_iter()
            .filter(|entry| entry.kind == FileKind::File)
            .filter_map(|entry| relative_route_path(root, &entry.path))
            .filter(|file| {
                let name = file.rsplit('/').next().unwrap_or(file);
                config.accepts_extension(split_extension(name).1)
            })
            .collect();
        sort_route_paths(&mut files, |file| file.as_str());

        let entries = files
            .into_iter()
            .map(RouteEntry::discover)
            .collect::<Result<Vec<_>, _>>()?;

        let modules = try_join_all(entries.iter().map(|entry| async move {
            loader
                .load(&entry.file)
                .await
                .map_err(|source| BuildError::ModuleLoad {
                    path: entry.file.clone(),
                    source,
                })
        }))
        .await?;

        let mut linker = Linker::default();
        let mut kept = Vec::with_capacity(entries.len());
        for (mut entry, exports) in entries.into_iter().zip(modules) {
            validate(&entry, &exports)?;
            entry.config = exports.config_or_default();
            if linker.collect(&entry, &exports)? {
                kept.push((entry, exports));
            }
        }

        linker.link_boundaries(&kept);

        let mut router = Router::new().with_case_insensitive(config.case_insensitive);
        for (entry, exports) in kept.iter().filter(|(e, _)| e.kind == EntryKind::Handler) {
            if router.contains_pattern(&entry.pattern) {
                warn!(
                    "Route {} from {} is shadowed by an earlier file and was dropped",
                    entry.pattern, entry.file
                );
                continue;
            }

            let route = linker.link_handler(entry, exports);
            debug!(
                "Registered route {} -> {} (methods {:?}, layouts {:?}, app {})",
                route.entry.pattern,
                route.entry.file,
                route.methods,
                route.composition.layout_files(),
                route.composition.wraps_in_app()
            );
            router.push(entry.pattern.clone(), Arc::new(route));
        }

        info!(
            "Built route table: {} routes from {} files under {:?}",
            router.len(),
            kept.len(),
            root
        );

        Ok(Self {
            router,
            entries: kept.into_iter().map(|(entry, _)| entry).collect(),
        })
    }

    /// First route matching `path`, after normalization
    pub fn find(&self, path: &str) -> Option<RouteMatch<'_, Arc<HandlerRoute>>> {
        self.router.match_route(path)
    }

    /// Dispatches one request
    pub async fn handle(&self, request: Request) -> Result<Response, DispatchError> {
        crate::dispatcher::handle_request(self, request).await
    }

    /// Handler routes in precedence order
    pub fn routes(&self) -> impl Iterator<Item = &HandlerRoute> {
        self.router.routes().map(|(_, route)| route.as_ref())
    }

    /// Every linked route file (handlers and special files), in sort order
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.router.len()
    }

    pub fn is_empty(&self) -> bool {
        self.router.is_empty()
    }
}

/// Free-function form of [`RouteTable::build`]
pub async fn build_route_table(
    root: impl AsRef<Path>,
    loader: &dyn ModuleLoader,
    lister: &dyn FileLister,
    config: &RoutingConfig,
) -> Result<RouteTable, BuildError> {
    RouteTable::build(root, loader, lister, config).await
}

fn validate(entry: &RouteEntry, exports: &Exports) -> Result<(), BuildError> {
    match entry.kind {
        EntryKind::Middleware if exports.middleware.is_empty() => {
            Err(BuildError::MissingMiddleware {
                path: entry.file.clone(),
            })
        }
        EntryKind::Middleware => Ok(()),
        _ if !exports.has_relevant_exports() => Err(BuildError::MissingExports {
            path: entry.file.clone(),
        }),
        _ => Ok(()),
    }
}

// ============================================================================
// Linking
// ============================================================================

/// Per-directory special files, keyed by directory in route form
#[derive(Default)]
struct Linker {
    app: Option<(String, Option<RenderFn>)>,
    layouts: HashMap<String, Arc<Layout>>,
    middleware: HashMap<String, (String, Vec<MiddlewareFn>)>,
    boundaries: HashMap<String, Arc<ErrorBoundary>>,
}

impl Linker {
    /// Records a special file; returns whether the entry is kept
    fn collect(&mut self, entry: &RouteEntry, exports: &Exports) -> Result<bool, BuildError> {
        match entry.kind {
            EntryKind::AppShell => {
                if entry.dir != "/" {
                    warn!("Ignoring {}: _app is only honored at the routes root", entry.file);
                    return Ok(false);
                }
                if let Some((first, _)) = &self.app {
                    return Err(BuildError::DuplicateAppShell {
                        first: first.clone(),
                        second: entry.file.clone(),
                    });
                }
                self.app = Some((entry.file.clone(), exports.default.clone()));
            }
            EntryKind::Layout => {
                if let Some(existing) = self.layouts.get(&entry.dir) {
                    warn!("Ignoring {}: {} already defines this layout", entry.file, existing.file);
                    return Ok(false);
                }
                let layout = Layout {
                    dir: entry.dir.clone(),
                    file: entry.file.clone(),
                    component: exports.default.clone(),
                    config: entry.config,
                };
                self.layouts.insert(entry.dir.clone(), Arc::new(layout));
            }
            EntryKind::Middleware => {
                if let Some((existing, _)) = self.middleware.get(&entry.dir) {
                    warn!("Ignoring {}: {} already defines this middleware", entry.file, existing);
                    return Ok(false);
                }
                self.middleware.insert(
                    entry.dir.clone(),
                    (entry.file.clone(), exports.middleware.clone()),
                );
            }
            EntryKind::ErrorBoundary | EntryKind::Handler => {
                if !exports.middleware.is_empty() {
                    warn!(
                        "Ignoring middleware exported by {}: only _middleware files contribute middleware",
                        entry.file
                    );
                }
            }
        }
        Ok(true)
    }

    /// Builds every `_error` boundary once layouts and the app shell are known
    fn link_boundaries(&mut self, kept: &[(RouteEntry, Exports)]) {
        for (entry, exports) in kept.iter().filter(|(e, _)| e.kind == EntryKind::ErrorBoundary) {
            if let Some(existing) = self.boundaries.get(&entry.dir) {
                warn!("Ignoring {}: {} already handles errors here", entry.file, existing.entry.file);
                continue;
            }
            let boundary = ErrorBoundary {
                entry: entry.clone(),
                methods: MethodTable::from_exports(exports, false),
                component: exports.default.clone(),
                composition: self.composition(&entry.dir, entry.config),
            };
            self.boundaries.insert(entry.dir.clone(), Arc::new(boundary));
        }
    }

    fn link_handler(&self, entry: &RouteEntry, exports: &Exports) -> HandlerRoute {
        let middleware = PathHierarchy::new(&entry.dir)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .filter_map(|dir| self.middleware.get(dir))
            .flat_map(|(_, chain)| chain.iter().cloned())
            .collect();

        let error_chain = PathHierarchy::new(&entry.dir)
            .filter_map(|dir| self.boundaries.get(dir).cloned())
            .collect();

        HandlerRoute {
            entry: entry.clone(),
            methods: MethodTable::from_exports(exports, true),
            component: exports.default.clone(),
            middleware,
            composition: self.composition(&entry.dir, entry.config),
            error_chain,
        }
    }

    /// Layouts and app shell for a file in `dir` with its own `config`
    fn composition(&self, dir: &str, config: RouteConfig) -> Composition {
        let layouts = if config.skip_inherited_layouts {
            Vec::new()
        } else {
            self.layout_chain(dir)
        };

        let skip_app = config.skip_app_wrapper
            || layouts
                .last()
                .is_some_and(|layout| layout.config.skip_app_wrapper);

        let app = match &self.app {
            Some((_, component)) if !skip_app => component.clone(),
            _ => None,
        };

        Composition { layouts, app }
    }

    /// Root-to-leaf, truncated at the nearest layout that skips inherited ones
    fn layout_chain(&self, dir: &str) -> Vec<Arc<Layout>> {
        let mut chain = Vec::new();
        for ancestor in PathHierarchy::new(dir) {
            if let Some(layout) = self.layouts.get(ancestor) {
                chain.push(Arc::clone(layout));
                if layout.config.skip_inherited_layouts {
                    break;
                }
            }
        }
        chain.reverse();
        chain
    }
}
