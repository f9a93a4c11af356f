//! Route module for file-based routing
//!
//! Contains pure functional components for route parsing:
//! - `pattern`: classification of a single segment
//! - `parser`: fold of segments into a compiled route

pub mod parser;
pub mod pattern;

// Re-export commonly used types
pub use parser::parse_route;
pub use pattern::{classify_segment, Segment};
