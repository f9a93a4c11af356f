// File: src/error.rs
// Purpose: Build-time and dispatch-time error types

use axum::http::Method;
use std::path::PathBuf;
use trellis_router::PatternError;

/// Fatal problems found while building the route table
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to list route files under {}", root.display())]
    Discovery {
        root: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to load module `{path}`")]
    ModuleLoad {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("module `{path}` does not export any relevant exports (handler, handlers, default, config)")]
    MissingExports { path: String },

    #[error("middleware module `{path}` does not export any middleware")]
    MissingMiddleware { path: String },

    #[error("route file `{path}` has an invalid pattern")]
    InvalidPattern {
        path: String,
        #[source]
        source: PatternError,
    },

    #[error("only one root app shell is allowed, found `{first}` and `{second}`")]
    DuplicateAppShell { first: String, second: String },
}

/// A request failure that no error boundary recovered
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unhandled failure in {method} {path} (route {route})")]
    Unrecovered {
        method: Method,
        path: String,
        route: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_missing_exports_message() {
        let err = BuildError::MissingExports {
            path: "about.tsx".to_string(),
        };
        assert!(err.to_string().contains("relevant exports"));
        assert!(err.to_string().contains("about.tsx"));
    }

    #[test]
    fn test_unrecovered_keeps_source() {
        let err = DispatchError::Unrecovered {
            method: Method::GET,
            path: "/boom".to_string(),
            route: "/boom".to_string(),
            source: anyhow::anyhow!("kaboom"),
        };
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("kaboom"));
    }
}
