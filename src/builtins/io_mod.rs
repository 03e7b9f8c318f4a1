//! The `IO` module: host-delegated I/O, top-level definitions, error
//! reification, and module imports
//!
//! All side effects go through the host's `IoHandle`; the core holds
//! no files or sockets of its own.

use crate::builtins::{as_str, as_symbol, module, native2};
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::eval::apply;
use crate::interpreter::{HandleRef, ModuleCache};
use crate::value::Value;
use indexmap::IndexMap;
use std::rc::Rc;

const CIRCULAR_SENTINEL: &str = "__circular_import__";

fn table_of(entries: Vec<(&str, Value)>) -> Value {
    let mut out = IndexMap::new();
    for (key, value) in entries {
        out.insert(key.to_string(), value);
    }
    Value::Table(out)
}

/// Builds the `IO` module. `root` is the environment `define`/`forget`
/// mutate — mutating that node in place is what makes new bindings
/// visible to closures that captured it.
pub fn module_value(
    root: &Rc<Environment>,
    handle: &HandleRef,
    modules: &ModuleCache,
    location: &str,
) -> Value {
    let mut entries = IndexMap::new();

    let h = handle.clone();
    entries.insert(
        "print".to_string(),
        Value::native("IO:print", move |arg, _env| {
            let line = match &arg {
                Value::Str(s) => s.clone(),
                other => format!("{}", other),
            };
            h.write_line(&line);
            Ok(arg)
        }),
    );

    let h = handle.clone();
    entries.insert(
        "read".to_string(),
        Value::native("IO:read", move |_arg, _env| Ok(Value::Str(h.read_line()))),
    );

    let h = handle.clone();
    entries.insert(
        "exit".to_string(),
        Value::native("IO:exit", move |_arg, _env| {
            h.exit();
            Ok(Value::Symbol("nothing".to_string()))
        }),
    );

    let r = root.clone();
    entries.insert(
        "define".to_string(),
        native2("IO:define", move |name, value, _env| {
            let key = as_symbol(&name)?.to_string();
            r.define(key, value.clone());
            Ok(value)
        }),
    );

    let r = root.clone();
    entries.insert(
        "forget".to_string(),
        Value::native("IO:forget", move |name, _env| {
            let key = as_symbol(&name)?;
            r.forget(key)
                .ok_or_else(|| RuntimeError::UndefinedName(key.to_string()))
        }),
    );

    // IO:try f — applies f to {} and reifies the outcome as a table
    entries.insert(
        "try".to_string(),
        Value::native("IO:try", |callee, env| {
            match apply(&callee, Value::empty_table(), env) {
                Ok(value) => Ok(table_of(vec![("ok", value)])),
                Err(e) => Ok(table_of(vec![(
                    "err",
                    table_of(vec![
                        ("kind", Value::Symbol(e.kind().to_string())),
                        ("message", Value::Str(e.to_string())),
                    ]),
                )])),
            }
        }),
    );

    let h = handle.clone();
    let cache = modules.clone();
    let from = location.to_string();
    entries.insert(
        "import".to_string(),
        Value::native("IO:import", move |arg, _env| {
            let name = as_str(&arg)?.to_string();
            let cached = cache.borrow().get(&name).cloned();
            if let Some(cached) = cached {
                if matches!(&cached, Value::Symbol(s) if s == CIRCULAR_SENTINEL) {
                    return Err(RuntimeError::not_in_domain(arg.clone(), "circular import"));
                }
                return Ok(cached);
            }
            cache
                .borrow_mut()
                .insert(name.clone(), Value::Symbol(CIRCULAR_SENTINEL.to_string()));
            match h.resolve_module(&from, &name) {
                None => {
                    cache.borrow_mut().remove(&name);
                    Err(RuntimeError::not_in_domain(arg.clone(), "module not found"))
                }
                Some(Err(err)) => {
                    cache.borrow_mut().remove(&name);
                    Err(RuntimeError::Other(Box::new(Value::Str(err.to_string()))))
                }
                Some(Ok(value)) => {
                    cache.borrow_mut().insert(name, value.clone());
                    Ok(value)
                }
            }
        }),
    );

    module("IO", entries)
}
