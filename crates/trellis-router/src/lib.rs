//! # Trellis Router
//!
//! The pure half of file-system routing:
//! - Static segments (`/about`)
//! - Dynamic parameters (`/users/[id]`)
//! - Trailing catch-all (`/docs/[...slug]`, zero or more segments)
//! - A total precedence order over route files ([`compare_route_paths`])
//!
//! Nothing in this crate touches the filesystem; callers hand it route names
//! and request paths.
//!
//! ## Path Normalization
//!
//! Request paths are normalized before matching:
//! - Trailing slashes: `/path/` → `/path`
//! - Double slashes: `/path//to` → `/path/to`
//! - Backslashes: `\path\to` → `/path/to`
//!
//! ## Example
//!
//! ```
//! use trellis_router::{Pattern, Router};
//!
//! let router = Router::new()
//!     .with_route(Pattern::compile("/users/all").unwrap(), "all")
//!     .with_route(Pattern::compile("/users/[id]").unwrap(), "one");
//!
//! let m = router.match_route("/users/123").unwrap();
//! assert_eq!(*m.value, "one");
//! assert_eq!(m.params.get("id"), Some("123"));
//! ```

use std::borrow::Cow;
use std::collections::HashMap;

// ============================================================================
// Module Declarations
// ============================================================================

pub mod path;
pub mod route;
pub mod sort;

pub use path::{is_valid_path, normalize_path, PathHierarchy};
pub use route::pattern::{classify_segment, Segment};
pub use sort::{compare_route_paths, sort_route_paths, split_extension, SegmentRank};

// ============================================================================
// Errors
// ============================================================================

/// Reasons a route name cannot be compiled into a [`Pattern`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("catch-all segment `[...{name}]` must be the last segment of `{route}`")]
    CatchAllNotLast { route: String, name: String },

    #[error("parameter `{name}` is captured more than once in `{route}`")]
    DuplicateParam { route: String, name: String },

    #[error("segment `{segment}` has an empty parameter name")]
    EmptyParam { segment: String },

    #[error("segment `{segment}` is malformed: brackets must wrap the whole segment")]
    Malformed { segment: String },
}

// ============================================================================
// Parameters
// ============================================================================

/// Value captured by a dynamic segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Captured by `[name]`
    One(String),
    /// Captured by `[...name]`, in path order
    Many(Vec<String>),
}

/// Parameters extracted from a matched path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: HashMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-segment value of `name`. `None` for catch-all captures.
    pub fn get(&self, name: &str) -> Option<&str> {
        match self.values.get(name)? {
            ParamValue::One(value) => Some(value),
            ParamValue::Many(_) => None,
        }
    }

    /// All segments captured under `name`
    ///
    /// A single-segment capture is returned as a one-element slice.
    pub fn get_all(&self, name: &str) -> Option<&[String]> {
        match self.values.get(name)? {
            ParamValue::One(value) => Some(std::slice::from_ref(value)),
            ParamValue::Many(values) => Some(values),
        }
    }

    pub fn value(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn insert_one(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), ParamValue::One(value.into()));
    }

    pub fn insert_many(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.values.insert(name.into(), ParamValue::Many(values));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn decode(segment: &str) -> Cow<'_, str> {
    urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment))
}

// ============================================================================
// Pattern
// ============================================================================

/// A compiled route pattern
///
/// # Examples
///
/// ```
/// use trellis_router::Pattern;
///
/// let pattern = Pattern::compile("docs/[...slug]").unwrap();
/// assert_eq!(pattern.as_str(), "/docs/*slug");
///
/// let params = pattern.matches("/docs/guide/intro").unwrap();
/// assert_eq!(params.get_all("slug").unwrap(), ["guide", "intro"]);
///
/// // catch-all also matches zero segments
/// assert!(pattern.matches("/docs").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    display: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compiles a route name such as `users/[id]` or `/docs/[...slug]`
    pub fn compile(route: &str) -> Result<Self, PatternError> {
        let (display, segments) = route::parse_route(route)?;
        Ok(Self { display, segments })
    }

    /// Display form: `/users/:id`, `/docs/*slug`, `/`
    pub fn as_str(&self) -> &str {
        &self.display
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn has_catch_all(&self) -> bool {
        self.segments.last().is_some_and(Segment::is_catch_all)
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::param_name)
    }

    /// Matches a request path (case-sensitive)
    pub fn matches(&self, path: &str) -> Option<Params> {
        self.matches_with_options(path, false)
    }

    /// Matches a request path
    ///
    /// Walks pattern and path segments together. Segment counts must agree
    /// exactly unless the pattern ends in a catch-all. Captured values are
    /// percent-decoded.
    pub fn matches_with_options(&self, path: &str, case_insensitive: bool) -> Option<Params> {
        fn match_segments(
            pattern: &[Segment],
            path: &[&str],
            mut params: Params,
            case_insensitive: bool,
        ) -> Option<Params> {
            match pattern.split_first() {
                None => path.is_empty().then_some(params),
                Some((Segment::CatchAll(name), _)) => {
                    let values = path.iter().map(|s| decode(s).into_owned()).collect();
                    params.insert_many(name.as_str(), values);
                    Some(params)
                }
                Some((Segment::Param(name), rest)) => {
                    let (first, remaining) = path.split_first()?;
                    params.insert_one(name.as_str(), decode(first).into_owned());
                    match_segments(rest, remaining, params, case_insensitive)
                }
                Some((Segment::Static(text), rest)) => {
                    let (first, remaining) = path.split_first()?;
                    let segment = decode(first);
                    let matches = if case_insensitive {
                        text.eq_ignore_ascii_case(&segment)
                    } else {
                        *text == segment
                    };
                    if !matches {
                        return None;
                    }
                    match_segments(rest, remaining, params, case_insensitive)
                }
            }
        }

        let path_segments = crate::path::segments(path);
        match_segments(&self.segments, &path_segments, Params::new(), case_insensitive)
    }

    /// Builds a concrete path by substituting `params`
    ///
    /// Returns `None` when a parameter is missing. Values are percent-encoded.
    ///
    /// ```
    /// use trellis_router::{Params, Pattern};
    ///
    /// let pattern = Pattern::compile("users/[id]").unwrap();
    /// let mut params = Params::new();
    /// params.insert_one("id", "42");
    /// assert_eq!(pattern.to_path(&params).as_deref(), Some("/users/42"));
    /// ```
    pub fn to_path(&self, params: &Params) -> Option<String> {
        let parts = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Static(text) => Some(vec![text.clone()]),
                Segment::Param(name) => params
                    .get(name)
                    .map(|value| vec![urlencoding::encode(value).into_owned()]),
                Segment::CatchAll(name) => params.get_all(name).map(|values| {
                    values
                        .iter()
                        .map(|value| urlencoding::encode(value).into_owned())
                        .collect()
                }),
            })
            .collect::<Option<Vec<_>>>()?;

        Some(format!("/{}", parts.concat().join("/")))
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display)
    }
}

// ============================================================================
// Router
// ============================================================================

/// Result of matching a path against a [`Router`]
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    pub pattern: &'a Pattern,
    pub value: &'a T,
    pub params: Params,
}

/// Ordered pattern table; the first matching entry wins
///
/// The router keeps registration order. Callers are expected to register
/// routes already sorted by [`compare_route_paths`].
#[derive(Debug, Clone)]
pub struct Router<T> {
    routes: Vec<(Pattern, T)>,
    case_insensitive: bool,
}

impl<T> Router<T> {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            case_insensitive: false,
        }
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn with_route(mut self, pattern: Pattern, value: T) -> Self {
        self.routes.push((pattern, value));
        self
    }

    pub fn push(&mut self, pattern: Pattern, value: T) {
        self.routes.push((pattern, value));
    }

    /// Finds the first route matching `path`
    ///
    /// The path is normalized first, so `/users/1/` and `/users//1` match
    /// like `/users/1`.
    pub fn match_route(&self, path: &str) -> Option<RouteMatch<'_, T>> {
        let normalized = normalize_path(path);
        self.routes.iter().find_map(|(pattern, value)| {
            pattern
                .matches_with_options(&normalized, self.case_insensitive)
                .map(|params| RouteMatch {
                    pattern,
                    value,
                    params,
                })
        })
    }

    pub fn contains_pattern(&self, pattern: &Pattern) -> bool {
        self.routes.iter().any(|(existing, _)| existing == pattern)
    }

    pub fn routes(&self) -> impl Iterator<Item = (&Pattern, &T)> {
        self.routes.iter().map(|(p, v)| (p, v))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}
