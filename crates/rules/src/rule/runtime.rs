//! Owned Lua state backing one configuration generation of a rule.

use mlua::{Function, Lua, LuaOptions, StdLib, Value, Variadic};

/// Exclusively owned script runtime.
///
/// Dropping it closes the underlying Lua state. A rule holds at most one of
/// these and replaces it wholesale on every `set_code`.
pub(crate) struct ScriptRuntime {
    lua: Lua,
}

/// Entry point return value, classified at the host boundary.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ScriptValue {
    Number(f64),
    /// Anything else, tagged with its Lua type name.
    Other(&'static str),
}

impl ScriptValue {
    /// Only Lua integers and floats count as numbers. Strings are never
    /// coerced, even when they look numeric (`"42"` is `Other("string")`).
    fn classify(value: &Value) -> Self {
        match value {
            Value::Number(n) => ScriptValue::Number(*n),
            Value::Integer(i) => ScriptValue::Number(*i as f64),
            other => ScriptValue::Other(other.type_name()),
        }
    }
}

impl ScriptRuntime {
    /// Create a fresh Lua state with the safe standard libraries loaded.
    ///
    /// That is every standard library except `debug` (and LuaJIT's `ffi`).
    pub(crate) fn create() -> mlua::Result<Self> {
        let lua = Lua::new_with(StdLib::ALL_SAFE, LuaOptions::default())?;
        Ok(Self { lua })
    }

    pub(crate) fn set_global(&self, name: &str, value: f64) -> mlua::Result<()> {
        self.lua.globals().set(name, value)
    }

    pub(crate) fn clear_global(&self, name: &str) -> mlua::Result<()> {
        self.lua.globals().set(name, Value::Nil)
    }

    /// Run `source` as a top level chunk named `chunk_name`.
    pub(crate) fn exec(&self, chunk_name: &str, source: &str) -> mlua::Result<()> {
        self.lua
            .load(source)
            .set_name(format!("={chunk_name}"))
            .exec()
    }

    /// Look up a global function, `None` if absent or not callable.
    pub(crate) fn function(&self, name: &str) -> mlua::Result<Option<Function>> {
        match self.lua.globals().get::<Value>(name)? {
            Value::Function(f) => Ok(Some(f)),
            _ => Ok(None),
        }
    }

    /// Call `func` with one positional number per element of `args`.
    ///
    /// Only the first return value is kept. mlua pops everything the call
    /// pushed, so the Lua stack is empty again when this returns.
    pub(crate) fn call(&self, func: &Function, args: &[f64]) -> mlua::Result<ScriptValue> {
        let ret: Value = func.call(args.iter().copied().collect::<Variadic<f64>>())?;
        Ok(ScriptValue::classify(&ret))
    }
}
