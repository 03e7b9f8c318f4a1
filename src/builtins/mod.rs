//! # The prelude
//!
//! Root-environment bindings, organized by concern:
//!
//! - **[arithmetic]**: `+ - * / % ^ ^/ < > <= >=` on dimensioned
//!   numbers, plus the SI unit constructors (`meters`, `seconds`, …)
//! - **[strings]**: `++` and the `Str` module
//! - **[functional]**: composition and application operators
//!   (`<< >> |> $`), fallback `|?`, weak equality `~=`, binding `.=`
//! - **[io_mod]**: the `IO` module (print/read/exit/define/forget/
//!   try/import), wired to the host's `IoHandle`
//! - **[sym_mod]**, **[refl_mod]**, **[imp_mod]**: symbols,
//!   reflection, and imperative control flow
//!
//! Each sub-module exposes a `register` or `module` entry point; the
//! modules themselves are table-backed native callees answering
//! symbol keys.

use crate::env::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{HandleRef, ModuleCache};
use crate::units::Dimension;
use crate::value::{LazyName, Value};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::rc::Rc;

pub mod arithmetic;
pub mod functional;
pub mod imp_mod;
pub mod io_mod;
pub mod refl_mod;
pub mod strings;
pub mod sym_mod;

/// Registers the whole prelude in `env` (normally the root).
pub fn register_prelude(
    env: &Rc<Environment>,
    handle: &HandleRef,
    modules: &ModuleCache,
    location: &str,
) {
    arithmetic::register(env);
    strings::register(env);
    functional::register(env);

    env.define("true".to_string(), Value::Bool(true));
    env.define("false".to_string(), Value::Bool(false));

    env.define(
        "IO".to_string(),
        io_mod::module_value(env, handle, modules, location),
    );
    env.define("Str".to_string(), strings::module_value());
    env.define("Sym".to_string(), sym_mod::module_value());
    env.define("Refl".to_string(), refl_mod::module_value());
    env.define("Imp".to_string(), imp_mod::module_value());
}

/// A curried two-argument native. The partially applied form carries a
/// lazy name so `+ 2` only formats when actually printed.
pub fn native2<F>(name: &'static str, fun: F) -> Value
where
    F: Fn(Value, Value, &Rc<Environment>) -> Result<Value, RuntimeError> + Clone + 'static,
{
    Value::native(name, move |first, _env| {
        let fun = fun.clone();
        let shown = first.clone();
        Ok(Value::Native {
            name: LazyName::lazy(move || format!("{} {}", name, shown)),
            fun: Rc::new(move |second, env| fun(first.clone(), second, env)),
        })
    })
}

/// A table-backed native callee: answers `Symbol(key)` with the named
/// entry, and `:__table__` with the backing table for introspection.
pub fn module(name: &'static str, entries: IndexMap<String, Value>) -> Value {
    let table = Rc::new(entries);
    Value::native(name, move |arg, _env| match arg {
        Value::Symbol(key) => {
            if key == "__table__" {
                return Ok(Value::Table((*table).clone()));
            }
            table
                .get(&key)
                .cloned()
                .ok_or(RuntimeError::MissingKey(key))
        }
        other => Err(RuntimeError::unexpected("symbol", &other)),
    })
}

pub fn as_unit(value: &Value) -> Result<(Decimal, Dimension), RuntimeError> {
    match value {
        Value::Unit { magnitude, dim } => Ok((*magnitude, *dim)),
        other => Err(RuntimeError::unexpected("number", other)),
    }
}

pub fn as_str(value: &Value) -> Result<&str, RuntimeError> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(RuntimeError::unexpected("string", other)),
    }
}

pub fn as_bool(value: &Value) -> Result<bool, RuntimeError> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(RuntimeError::unexpected("boolean", other)),
    }
}

pub fn as_symbol(value: &Value) -> Result<&str, RuntimeError> {
    match value {
        Value::Symbol(s) => Ok(s),
        other => Err(RuntimeError::unexpected("symbol", other)),
    }
}

pub fn as_table(value: &Value) -> Result<&IndexMap<String, Value>, RuntimeError> {
    match value {
        Value::Table(entries) => Ok(entries),
        other => Err(RuntimeError::unexpected("table", other)),
    }
}

/// A dimensionless magnitude, for built-ins that take plain numbers.
pub fn dimensionless(value: &Value) -> Result<Decimal, RuntimeError> {
    let (magnitude, dim) = as_unit(value)?;
    if !dim.is_none() {
        return Err(RuntimeError::not_in_domain(
            value.clone(),
            "expected a dimensionless number",
        ));
    }
    Ok(magnitude)
}

/// Fresh root env with the full prelude over a scripted handle.
#[cfg(test)]
pub fn register_prelude_for_tests() -> (
    Rc<Environment>,
    Rc<crate::interpreter::RecordingHandle>,
) {
    let handle = crate::interpreter::RecordingHandle::new();
    let env = Environment::new();
    let as_handle: HandleRef = handle.clone();
    register_prelude(&env, &as_handle, &handle.modules(), "<test>");
    (env, handle)
}
