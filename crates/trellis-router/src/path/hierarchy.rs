/// Lazy iterator over a directory path and its ancestors
///
/// For `/a/b/c` yields `/a/b/c` → `/a/b` → `/a` → `/`.
/// Borrows from the input; no allocations.
///
/// Used to collect per-directory resources (layouts, middleware, error
/// boundaries) from the leaf directory up to the root.
///
/// # Examples
///
/// ```
/// use trellis_router::path::PathHierarchy;
///
/// let paths: Vec<&str> = PathHierarchy::new("/a/b/c").collect();
/// assert_eq!(paths, vec!["/a/b/c", "/a/b", "/a", "/"]);
/// ```
#[derive(Debug, Clone)]
pub struct PathHierarchy<'a> {
    current: Option<&'a str>,
}

impl<'a> PathHierarchy<'a> {
    /// Creates a new hierarchy iterator starting from `path` (inclusive)
    pub fn new(path: &'a str) -> Self {
        Self {
            current: Some(path),
        }
    }
}

impl<'a> Iterator for PathHierarchy<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;

        self.current = if current == "/" {
            None
        } else {
            match current.rfind('/') {
                Some(0) => Some("/"),
                Some(slash_pos) => Some(&current[..slash_pos]),
                None => None,
            }
        };

        Some(current)
    }
}
