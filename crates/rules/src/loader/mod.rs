//! Filesystem loader for YAML rule documents.
//!
//! Scans a rules directory recursively, validates every `MetricRule`
//! document by compiling its code once, and keeps the documents in memory
//! keyed by rule ID. Rules themselves are built on demand so each caller
//! (and each thread) gets its own runtime.

mod core;
mod error;


pub use self::core::RuleLoader;
pub use self::error::{LoadError, LoadResult, LoadStatus, Result};
