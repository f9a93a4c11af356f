//! Route name parsing
//!
//! Pure functional parser that transforms a logical route name
//! (`users/[id]`, `/docs/[...slug]`) into typed segments plus the display
//! form used in logs (`/users/:id`, `/docs/*slug`).

use super::pattern::{classify_segment, Segment};
use crate::PatternError;

/// Internal state accumulator for fold-based parsing
///
/// All mutations are local to the fold accumulator; each step consumes
/// the previous state and returns the next one.
#[derive(Default)]
struct ParseState {
    display: String,
    segments: Vec<Segment>,
}

impl ParseState {
    fn with_segment(mut self, segment: Segment, route: &str) -> Result<Self, PatternError> {
        if let Some(Segment::CatchAll(name)) = self.segments.last() {
            return Err(PatternError::CatchAllNotLast {
                route: route.to_string(),
                name: name.clone(),
            });
        }

        if let Some(name) = segment.param_name() {
            let duplicate = self
                .segments
                .iter()
                .any(|existing| existing.param_name() == Some(name));
            if duplicate {
                return Err(PatternError::DuplicateParam {
                    route: route.to_string(),
                    name: name.to_string(),
                });
            }
        }

        match &segment {
            Segment::Static(text) => {
                self.display.push('/');
                self.display.push_str(text);
            }
            Segment::Param(name) => {
                self.display.push_str("/:");
                self.display.push_str(name);
            }
            Segment::CatchAll(name) => {
                self.display.push_str("/*");
                self.display.push_str(name);
            }
        }

        self.segments.push(segment);
        Ok(self)
    }

    /// Finalizes the pattern, handling the empty (root) case
    fn finalize(mut self) -> (String, Vec<Segment>) {
        if self.display.is_empty() {
            self.display = "/".to_string();
        }
        (self.display, self.segments)
    }
}

/// Parses a route name into its display form and segments (pure function)
///
/// Leading, trailing and repeated slashes are ignored, so `""`, `"/"` and
/// `"//"` all denote the root route.
///
/// # Errors
///
/// - [`PatternError::CatchAllNotLast`] when a `[...name]` segment is followed
///   by anything
/// - [`PatternError::DuplicateParam`] when two segments capture the same name
/// - [`PatternError::EmptyParam`] / [`PatternError::Malformed`] from segment
///   classification
///
/// # Examples
///
/// ```
/// use trellis_router::route::parser::parse_route;
///
/// let (display, segments) = parse_route("users/[id]").unwrap();
/// assert_eq!(display, "/users/:id");
/// assert_eq!(segments.len(), 2);
///
/// assert!(parse_route("docs/[...slug]/edit").is_err());
/// ```
pub fn parse_route(route: &str) -> Result<(String, Vec<Segment>), PatternError> {
    route
        .split('/')
        .filter(|segment| !segment.is_empty())
        .try_fold(ParseState::default(), |state, segment| {
            state.with_segment(classify_segment(segment)?, route)
        })
        .map(ParseState::finalize)
}
