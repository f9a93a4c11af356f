// File: src/discovery.rs
// Purpose: Enumerates candidate route files under a routes root

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileKind {
    File,
    Directory,
}

/// One discovered entry, with its path including the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub kind: FileKind,
}

/// Source of route files
pub trait FileLister: Send + Sync {
    fn list(&self, root: &Path) -> Result<Vec<FileEntry>>;
}

/// Walks the real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl FileLister for FsLister {
    fn list(&self, root: &Path) -> Result<Vec<FileEntry>> {
        if !root.exists() {
            warn!("routes directory {:?} does not exist", root);
            return Ok(Vec::new());
        }

        WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| {
                let entry =
                    entry.with_context(|| format!("Failed to walk routes directory: {:?}", root))?;
                let kind = if entry.file_type().is_dir() {
                    FileKind::Directory
                } else {
                    FileKind::File
                };
                Ok(FileEntry {
                    path: entry.into_path(),
                    kind,
                })
            })
            .collect()
    }
}

/// `path` relative to `root`, with `/` separators
pub fn relative_route_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<_>>()?;

    (!parts.is_empty()).then(|| parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_fs_lister_walks_tree() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("blog")).unwrap();
        fs::write(dir.path().join("index.tsx"), "").unwrap();
        fs::write(dir.path().join("blog/[slug].tsx"), "").unwrap();

        let entries = FsLister.list(dir.path()).unwrap();
        let mut relative: Vec<(String, FileKind)> = entries
            .iter()
            .map(|e| (relative_route_path(dir.path(), &e.path).unwrap(), e.kind))
            .collect();
        relative.sort();

        assert_eq!(
            relative,
            vec![
                ("blog".to_string(), FileKind::Directory),
                ("blog/[slug].tsx".to_string(), FileKind::File),
                ("index.tsx".to_string(), FileKind::File),
            ]
        );
    }

    #[test]
    fn test_fs_lister_missing_root() {
        let entries = FsLister.list(Path::new("/definitely/not/here")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_relative_route_path() {
        let root = Path::new("routes");
        assert_eq!(
            relative_route_path(root, Path::new("routes/a/b.tsx")).as_deref(),
            Some("a/b.tsx")
        );
        assert_eq!(relative_route_path(root, Path::new("other/a.tsx")), None);
        assert_eq!(relative_route_path(root, root), None);
    }
}
