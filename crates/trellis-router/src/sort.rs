//! Deterministic precedence order over route file paths
//!
//! The same order is used to walk sibling entries of a directory and to
//! register the final route table, so that the first matching route at
//! dispatch time is always the most specific one.
//!
//! Every path is turned into a sort key (one tuple per segment) and keys are
//! compared lexicographically. Comparing derived keys rather than raw
//! characters keeps the relation total, transitive and stable.
use std::cmp::Ordering;

/// Precedence class of a single segment at one directory level
///
/// Declaration order is the precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SegmentRank {
    /// `_app` file
    AppShell,
    /// `_error` file
    ErrorBoundary,
    /// `_middleware` file
    Middleware,
    /// `_layout` file
    Layout,
    /// `index` and every other plain name
    Static,
    /// `[param]`
    Dynamic,
    /// `[...rest]`
    CatchAll,
}

impl SegmentRank {
    fn of_name(name: &str) -> Self {
        if name.starts_with("[...") {
            SegmentRank::CatchAll
        } else if name.starts_with('[') {
            SegmentRank::Dynamic
        } else {
            SegmentRank::Static
        }
    }

    fn of_file_stem(stem: &str) -> Self {
        match stem {
            "_app" => SegmentRank::AppShell,
            "_error" => SegmentRank::ErrorBoundary,
            "_middleware" => SegmentRank::Middleware,
            "_layout" => SegmentRank::Layout,
            other => Self::of_name(other),
        }
    }
}

/// Sort key of one path segment. Field order is comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct SegmentKey<'a> {
    rank: SegmentRank,
    name: &'a str,
    // a file named `foo.*` comes before the contents of directory `foo/`
    is_dir: bool,
    ext: &'a str,
}

/// Splits `name.ext` into stem and extension. Dotfiles keep their name as stem.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (file_name, ""),
    }
}

fn sort_key(path: &str) -> Vec<SegmentKey<'_>> {
    let parts: Vec<&str> = path
        .split(|c: char| c == '/' || c == '\\')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    let last = parts.len().saturating_sub(1);

    parts
        .iter()
        .enumerate()
        .map(|(idx, part)| {
            if idx == last {
                let (stem, ext) = split_extension(part);
                SegmentKey {
                    rank: SegmentRank::of_file_stem(stem),
                    name: stem,
                    is_dir: false,
                    ext,
                }
            } else {
                SegmentKey {
                    rank: SegmentRank::of_name(part),
                    name: part,
                    is_dir: true,
                    ext: "",
                }
            }
        })
        .collect()
}

/// Compares two route file paths by routing precedence
///
/// Paths are relative to the routes root (`users/[id].tsx`, `_layout.tsx`).
///
/// # Rules, applied per segment from the root
///
/// 1. `_app` < `_error` < `_middleware` < `_layout` < static < `[param]` < `[...rest]`
/// 2. `foo.tsx` sorts before anything inside `foo/`
/// 3. equal stems fall back to the extension (`.js` < `.jsx` < `.ts` < `.tsx`)
/// 4. directories follow the same static < dynamic < catch-all order
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use trellis_router::compare_route_paths;
///
/// assert_eq!(compare_route_paths("all.tsx", "[id].tsx"), Ordering::Less);
/// assert_eq!(compare_route_paths("_layout.tsx", "index.tsx"), Ordering::Less);
/// assert_eq!(compare_route_paths("[...rest].tsx", "[id].tsx"), Ordering::Greater);
/// ```
pub fn compare_route_paths(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

/// Stable in-place sort of items by the route path they carry
pub fn sort_route_paths<T, F>(items: &mut [T], path: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| compare_route_paths(path(a), path(b)));
}
