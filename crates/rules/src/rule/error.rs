//! Error taxonomy for rule configuration and evaluation.

/// When in a rule's life an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPhase {
    /// Raised by `set_code` (or anything that calls it).
    Configuration,
    /// Raised by `evaluate`.
    Evaluation,
}

/// Errors raised while configuring or evaluating a [`Rule`](super::Rule).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    /// The embedded script runtime could not be created.
    #[error("rule '{rule}': cannot initiate script runtime: {reason}")]
    RuntimeInit { rule: String, reason: String },

    /// The source failed to parse, or raised while running its top level.
    #[error("rule '{rule}': invalid code: {reason}")]
    Compile { rule: String, reason: String },

    /// The code ran but left no callable entry point behind.
    #[error("rule '{rule}': function main() not found")]
    MissingEntryPoint { rule: String },

    #[error("rule '{rule}' is not valid")]
    NotValid { rule: String },

    /// The entry point raised while being called.
    #[error("rule '{rule}': calling main() failed: {reason}")]
    Evaluation { rule: String, reason: String },

    #[error("rule '{rule}': main() returned {found}, expected a number")]
    NonNumericResult { rule: String, found: String },
}

impl RuleError {
    pub fn phase(&self) -> ErrorPhase {
        match self {
            RuleError::RuntimeInit { .. }
            | RuleError::Compile { .. }
            | RuleError::MissingEntryPoint { .. } => ErrorPhase::Configuration,
            RuleError::NotValid { .. }
            | RuleError::Evaluation { .. }
            | RuleError::NonNumericResult { .. } => ErrorPhase::Evaluation,
        }
    }

    /// Name of the rule the error belongs to.
    pub fn rule(&self) -> &str {
        match self {
            RuleError::RuntimeInit { rule, .. }
            | RuleError::Compile { rule, .. }
            | RuleError::MissingEntryPoint { rule }
            | RuleError::NotValid { rule }
            | RuleError::Evaluation { rule, .. }
            | RuleError::NonNumericResult { rule, .. } => rule,
        }
    }
}

/// Result alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;
