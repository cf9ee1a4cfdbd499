//! Scripted scoring rule backed by an embedded Lua runtime.
//!
//! A [`Rule`] owns one Lua state, a source script and a set of named numeric
//! constants. The script must define a global function [`ENTRY_POINT`];
//! each call to [`Rule::evaluate`] invokes it with the metric values as
//! positional arguments and expects a single number back.
//!
//! Configuration is eager: `set_code` rebuilds the runtime from scratch and
//! validates the script immediately, so a rule is always either fully
//! usable or explicitly not valid.

mod error;
mod runtime;


use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

pub use self::error::{ErrorPhase, Result, RuleError};
use self::runtime::{ScriptRuntime, ScriptValue};

/// Reserved name of the function every rule script must define.
pub const ENTRY_POINT: &str = "main";

/// Observable configuration state of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
    /// `set_code` has never been called.
    Unconfigured,
    Valid,
    /// The last `set_code` failed.
    Invalid,
}

/// A configurable, evaluatable scoring rule.
///
/// Not `Send`: the embedded runtime must stay on the thread that created
/// it. Use one rule instance per thread for concurrent evaluation.
pub struct Rule {
    name: String,
    code: String,
    globals: BTreeMap<String, f64>,
    valid: bool,
    configured: bool,
    runtime: Option<ScriptRuntime>,
}

impl Rule {
    /// Create an unconfigured rule.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: String::new(),
            globals: BTreeMap::new(),
            valid: false,
            configured: false,
            runtime: None,
        }
    }

    /// Build a rule and configure it in one step.
    pub fn from_parts<K: Into<String>>(
        name: impl Into<String>,
        globals: impl IntoIterator<Item = (K, f64)>,
        code: impl Into<String>,
    ) -> Result<Self> {
        let mut rule = Self::new(name);
        rule.set_globals(globals);
        rule.set_code(code)?;
        Ok(rule)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn globals(&self) -> &BTreeMap<String, f64> {
        &self.globals
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn state(&self) -> RuleState {
        match (self.configured, self.valid) {
            (false, _) => RuleState::Unconfigured,
            (true, true) => RuleState::Valid,
            (true, false) => RuleState::Invalid,
        }
    }

    /// Replace all global constants.
    ///
    /// The previous mapping is discarded, not merged. When a runtime is
    /// live the new values are pushed into it straight away and names that
    /// are no longer present are cleared. Validity is left untouched.
    pub fn set_globals<K: Into<String>>(&mut self, vars: impl IntoIterator<Item = (K, f64)>) {
        let previous = std::mem::replace(
            &mut self.globals,
            vars.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        );

        if let Some(runtime) = &self.runtime {
            for name in previous.keys().filter(|k| !self.globals.contains_key(*k)) {
                if let Err(e) = runtime.clear_global(name) {
                    warn!(rule = %self.name, global = %name, error = %e, "failed to clear global");
                }
            }
        }
        self.push_globals();
    }

    /// Replace the rule's code and validate it.
    ///
    /// The old runtime is dropped first and a fresh one is created, so no
    /// definition from the previous code survives. Current globals are
    /// pushed before the code runs. On error the rule is left not valid
    /// but keeps its name, globals and (unless the runtime could not be
    /// created) the new code.
    pub fn set_code(&mut self, source: impl Into<String>) -> Result<()> {
        if self.runtime.take().is_some() {
            debug!(rule = %self.name, "closed previous script runtime");
        }
        self.valid = false;
        self.configured = true;
        self.code.clear();

        let runtime = ScriptRuntime::create().map_err(|e| RuleError::RuntimeInit {
            rule: self.name.clone(),
            reason: e.to_string(),
        })?;
        let runtime = self.runtime.insert(runtime);
        debug!(rule = %self.name, "created script runtime");

        Self::push_globals_into(runtime, &self.name, &self.globals);

        self.code = source.into();
        if self.code.trim().is_empty() {
            return Err(RuleError::Compile {
                rule: self.name.clone(),
                reason: "code is empty".to_string(),
            });
        }
        runtime
            .exec(&self.name, &self.code)
            .map_err(|e| RuleError::Compile {
                rule: self.name.clone(),
                reason: e.to_string(),
            })?;

        let entry = runtime
            .function(ENTRY_POINT)
            .map_err(|e| RuleError::Compile {
                rule: self.name.clone(),
                reason: e.to_string(),
            })?;
        if entry.is_none() {
            return Err(RuleError::MissingEntryPoint {
                rule: self.name.clone(),
            });
        }

        self.valid = true;
        debug!(rule = %self.name, globals = self.globals.len(), "rule code validated");
        Ok(())
    }

    /// Call the entry point with `metrics` as positional arguments.
    pub fn evaluate(&self, metrics: &[f64]) -> Result<f64> {
        let runtime = match &self.runtime {
            Some(rt) if self.valid => rt,
            _ => {
                return Err(RuleError::NotValid {
                    rule: self.name.clone(),
                })
            }
        };

        let evaluation_error = |reason: String| RuleError::Evaluation {
            rule: self.name.clone(),
            reason,
        };

        // Looked up per call: the script may have rebound it.
        let entry = runtime
            .function(ENTRY_POINT)
            .map_err(|e| evaluation_error(e.to_string()))?
            .ok_or_else(|| evaluation_error(format!("{ENTRY_POINT} is no longer a function")))?;

        match runtime.call(&entry, metrics) {
            Ok(ScriptValue::Number(n)) => Ok(n),
            Ok(ScriptValue::Other(found)) => Err(RuleError::NonNumericResult {
                rule: self.name.clone(),
                found: found.to_string(),
            }),
            Err(e) => Err(evaluation_error(e.to_string())),
        }
    }

    /// Copy the rule into a new, independent runtime, surfacing any
    /// configuration error the copy hits.
    pub fn try_clone(&self) -> Result<Self> {
        let mut copy = Self::new(self.name.clone());
        copy.globals = self.globals.clone();
        if self.configured {
            copy.set_code(self.code.clone())?;
        }
        Ok(copy)
    }

    fn push_globals(&self) {
        if let Some(runtime) = &self.runtime {
            Self::push_globals_into(runtime, &self.name, &self.globals);
        }
    }

    fn push_globals_into(runtime: &ScriptRuntime, rule: &str, globals: &BTreeMap<String, f64>) {
        for (name, value) in globals {
            if let Err(e) = runtime.set_global(name, *value) {
                warn!(rule = %rule, global = %name, error = %e, "failed to set global");
            }
        }
    }
}

impl Clone for Rule {
    /// The copy gets its own runtime built from the same name, globals and
    /// code, so it ends up in the same state as the original.
    fn clone(&self) -> Self {
        let mut copy = Self::new(self.name.clone());
        copy.globals = self.globals.clone();
        if self.configured {
            if let Err(e) = copy.set_code(self.code.clone()) {
                debug!(rule = %self.name, error = %e, "copied rule is not valid");
            }
        }
        copy
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("globals", &self.globals)
            .field("code_len", &self.code.len())
            .finish()
    }
}
