//! Segment classification for route patterns
//!
//! Pure functional parsing of file-based route segments into typed segments.
//! All functions are **pure**: same input → same output, no side effects.

use crate::PatternError;

/// A single segment of a compiled route pattern
///
/// Functional sum type for pattern matching route segments.
///
/// # Examples
///
/// ```
/// use trellis_router::route::pattern::{classify_segment, Segment};
///
/// let seg = classify_segment("about").unwrap();
/// assert!(matches!(seg, Segment::Static(_)));
///
/// let seg = classify_segment("[id]").unwrap();
/// assert!(matches!(seg, Segment::Param(_)));
///
/// let seg = classify_segment("[...slug]").unwrap();
/// assert!(matches!(seg, Segment::CatchAll(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Static text segment
    Static(String),
    /// Single-segment parameter: `[id]`
    Param(String),
    /// Trailing catch-all: `[...slug]`, matches zero or more segments
    CatchAll(String),
}

impl Segment {
    /// Returns the parameter name for dynamic segments
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Static(_) => None,
            Segment::Param(name) | Segment::CatchAll(name) => Some(name),
        }
    }

    /// Whether this is a catch-all segment
    pub fn is_catch_all(&self) -> bool {
        matches!(self, Segment::CatchAll(_))
    }
}

/// Classifies a single path segment (pure function)
///
/// # Parsing Rules (evaluated in order)
///
/// 1. **Catch-all**: `[...name]`
/// 2. **Param**: `[name]`
/// 3. **Static**: text without brackets
///
/// A segment that contains brackets but is not fully wrapped by them
/// (`foo[id]`, `[id`, `[[id]]`) is rejected rather than treated as static.
///
/// # Examples
///
/// ```
/// use trellis_router::route::pattern::{classify_segment, Segment};
///
/// assert_eq!(classify_segment("[id]").unwrap(), Segment::Param("id".into()));
/// assert!(classify_segment("[]").is_err());
/// assert!(classify_segment("a[b]").is_err());
/// ```
pub fn classify_segment(segment: &str) -> Result<Segment, PatternError> {
    match segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(inner) => {
            if inner.contains('[') || inner.contains(']') {
                return Err(PatternError::Malformed {
                    segment: segment.to_string(),
                });
            }

            let (name, catch_all) = match inner.strip_prefix("...") {
                Some(name) => (name, true),
                None => (inner, false),
            };

            if name.is_empty() {
                return Err(PatternError::EmptyParam {
                    segment: segment.to_string(),
                });
            }

            Ok(if catch_all {
                Segment::CatchAll(name.to_string())
            } else {
                Segment::Param(name.to_string())
            })
        }
        None if segment.contains('[') || segment.contains(']') => Err(PatternError::Malformed {
            segment: segment.to_string(),
        }),
        None => Ok(Segment::Static(segment.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_static() {
        let seg = classify_segment("about").unwrap();
        assert_eq!(seg, Segment::Static("about".to_string()));
        assert_eq!(seg.param_name(), None);
    }

    #[test]
    fn test_classify_param() {
        let seg = classify_segment("[id]").unwrap();
        assert_eq!(seg, Segment::Param("id".to_string()));
        assert_eq!(seg.param_name(), Some("id"));
        assert!(!seg.is_catch_all());
    }

    #[test]
    fn test_classify_catch_all() {
        let seg = classify_segment("[...slug]").unwrap();
        assert_eq!(seg, Segment::CatchAll("slug".to_string()));
        assert!(seg.is_catch_all());
    }

    #[test]
    fn test_classify_empty_names() {
        assert!(matches!(
            classify_segment("[]"),
            Err(PatternError::EmptyParam { .. })
        ));
        assert!(matches!(
            classify_segment("[...]"),
            Err(PatternError::EmptyParam { .. })
        ));
    }

    #[test]
    fn test_classify_malformed() {
        for bad in ["[id", "id]", "pre[id]", "[[id]]", "[a]b"] {
            assert!(
                matches!(classify_segment(bad), Err(PatternError::Malformed { .. })),
                "{bad} should be malformed"
            );
        }
    }
}
