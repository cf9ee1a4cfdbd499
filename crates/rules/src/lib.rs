//! Scripted metric scoring rules.
//!
//! This crate provides:
//! - [`Rule`]: a Lua-backed rule that turns an ordered metric vector into
//!   one numeric verdict
//! - YAML rule documents ([`schema`]) and a directory [`loader`]
//! - the `rule-eval` command-line tool

pub mod loader;
pub mod rule;
pub mod schema;

pub use loader::{LoadError, RuleLoader};
pub use rule::{ErrorPhase, Rule, RuleError, RuleState, ENTRY_POINT};
pub use schema::RuleDocument;
