// ABOUTME: Host-facing interpreter facade and the IoHandle boundary

use crate::ast::Expr;
use crate::builtins::register_prelude;
use crate::env::Environment;
use crate::error::LangError;
use crate::eval::interpret;
use crate::parser::{default_options, parse_line, parse_multiline, ParserRef};
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

/// Everything the core delegates to its host: console I/O, process
/// exit, and module resolution.
pub trait IoHandle {
    fn read_line(&self) -> String;
    fn write_line(&self, line: &str);
    fn exit(&self);
    /// `None` means "no such module"; otherwise the evaluated module
    /// value (typically from a child interpreter sharing this handle
    /// and the importing interpreter's module cache).
    fn resolve_module(&self, from: &str, name: &str) -> Option<Result<Value, LangError>>;
}

pub type HandleRef = Rc<dyn IoHandle>;

/// Memoised module values, shared across an import graph so circular
/// imports are caught by the `__circular_import__` sentinel.
pub type ModuleCache = Rc<RefCell<HashMap<String, Value>>>;

pub fn new_module_cache() -> ModuleCache {
    Rc::new(RefCell::new(HashMap::new()))
}

/// One language session: a root environment with the prelude, a
/// parser-options handle, and the host handle.
pub struct Interpreter {
    env: Rc<Environment>,
    options: ParserRef,
    location: String,
}

impl Interpreter {
    /// A session with a fresh prelude, default operator table, and its
    /// own module cache.
    pub fn new(handle: HandleRef) -> Self {
        Self::with_parts(handle, None, None, None, None)
    }

    /// A session with an empty root environment: no prelude, so only
    /// literals, lambdas, and conditionals work until the host installs
    /// bindings through `env()`.
    pub fn without_prelude(options: Option<ParserRef>, location: Option<String>) -> Self {
        Interpreter {
            env: Environment::new(),
            options: options.unwrap_or_else(default_options),
            location: location.unwrap_or_else(|| "<main>".to_string()),
        }
    }

    /// A session with any of the parts overridden. With `parent_env`
    /// the prelude is NOT rebuilt; the new top frame chains to the
    /// given environment.
    pub fn with_parts(
        handle: HandleRef,
        parent_env: Option<Rc<Environment>>,
        options: Option<ParserRef>,
        modules: Option<ModuleCache>,
        location: Option<String>,
    ) -> Self {
        let location = location.unwrap_or_else(|| "<main>".to_string());
        let env = match parent_env {
            Some(parent) => Environment::with_parent(parent),
            None => {
                let root = Environment::new();
                let modules = modules.unwrap_or_else(new_module_cache);
                register_prelude(&root, &handle, &modules, &location);
                root
            }
        };
        Interpreter {
            env,
            options: options.unwrap_or_else(default_options),
            location,
        }
    }

    pub fn env(&self) -> &Rc<Environment> {
        &self.env
    }

    pub fn options(&self) -> &ParserRef {
        &self.options
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn run_ast(&self, expr: &Expr) -> Result<Value, LangError> {
        Ok(interpret(expr, &self.env)?)
    }

    /// Parses exactly one expression and evaluates it; trailing input
    /// is a parse error.
    pub fn run_line(&self, source: &str) -> Result<Value, LangError> {
        let expr = parse_line(source, &self.options)?;
        self.run_ast(&expr)
    }

    /// Evaluates a whole script, returning every top-level value.
    pub fn run_multiline(&self, source: &str) -> Result<Vec<Value>, LangError> {
        let exprs = parse_multiline(source, &self.options)?;
        let mut values = Vec::with_capacity(exprs.len());
        for expr in &exprs {
            values.push(self.run_ast(expr)?);
        }
        Ok(values)
    }

    /// Like `run_multiline`, keeping only the last value — the module
    /// convention.
    pub fn run_multiline_return_last(&self, source: &str) -> Result<Value, LangError> {
        let mut values = self.run_multiline(source)?;
        values.pop().ok_or_else(|| {
            LangError::Parse("Expected at least one expression".to_string())
        })
    }
}

/// A scripted handle for tests and embedding: queued input lines,
/// recorded output, and in-memory module sources evaluated in child
/// interpreters that share this handle's module cache.
pub struct RecordingHandle {
    me: Weak<RecordingHandle>,
    input: RefCell<VecDeque<String>>,
    output: RefCell<Vec<String>>,
    sources: RefCell<HashMap<String, String>>,
    resolutions: Cell<usize>,
    exited: Cell<bool>,
    modules: ModuleCache,
}

impl RecordingHandle {
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|me| RecordingHandle {
            me: me.clone(),
            input: RefCell::new(VecDeque::new()),
            output: RefCell::new(Vec::new()),
            sources: RefCell::new(HashMap::new()),
            resolutions: Cell::new(0),
            exited: Cell::new(false),
            modules: new_module_cache(),
        })
    }

    pub fn queue_line(&self, line: &str) {
        self.input.borrow_mut().push_back(line.to_string());
    }

    pub fn written(&self) -> Vec<String> {
        self.output.borrow().clone()
    }

    pub fn add_module(&self, name: &str, source: &str) {
        self.sources
            .borrow_mut()
            .insert(name.to_string(), source.to_string());
    }

    pub fn resolutions(&self) -> usize {
        self.resolutions.get()
    }

    pub fn exited(&self) -> bool {
        self.exited.get()
    }

    /// The module cache to hand to `register_prelude` so parent and
    /// child interpreters see one import graph.
    pub fn modules(&self) -> ModuleCache {
        self.modules.clone()
    }
}

impl IoHandle for RecordingHandle {
    fn read_line(&self) -> String {
        self.input.borrow_mut().pop_front().unwrap_or_default()
    }

    fn write_line(&self, line: &str) {
        self.output.borrow_mut().push(line.to_string());
    }

    fn exit(&self) {
        self.exited.set(true);
    }

    fn resolve_module(&self, _from: &str, name: &str) -> Option<Result<Value, LangError>> {
        let source = self.sources.borrow().get(name).cloned()?;
        self.resolutions.set(self.resolutions.get() + 1);
        let handle: HandleRef = self.me.upgrade()?;
        let child = Interpreter::with_parts(
            handle,
            None,
            None,
            Some(self.modules.clone()),
            Some(name.to_string()),
        );
        Some(child.run_multiline_return_last(&source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (Interpreter, Rc<RecordingHandle>) {
        let handle = RecordingHandle::new();
        let as_handle: HandleRef = handle.clone();
        let interp = Interpreter::with_parts(
            as_handle,
            None,
            None,
            Some(handle.modules()),
            None,
        );
        (interp, handle)
    }

    #[test]
    fn test_run_line() {
        let (interp, _handle) = session();
        assert_eq!(format!("{}", interp.run_line("2 + 2").unwrap()), "4");
    }

    #[test]
    fn test_run_line_rejects_trailing_input() {
        let (interp, _handle) = session();
        assert!(matches!(
            interp.run_line("1; 2"),
            Err(LangError::Parse(_))
        ));
    }

    #[test]
    fn test_run_multiline_collects_values() {
        let (interp, _handle) = session();
        let values = interp.run_multiline(":x .= 2; x * 3;").unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(format!("{}", values[1]), "6");
    }

    #[test]
    fn test_run_multiline_return_last() {
        let (interp, _handle) = session();
        let value = interp
            .run_multiline_return_last(":f .= (x. x + 1); f 10")
            .unwrap();
        assert_eq!(format!("{}", value), "11");
    }

    #[test]
    fn test_state_persists_across_lines() {
        let (interp, _handle) = session();
        interp.run_line(":count .= 1").unwrap();
        interp.run_line(":count .= count + 1").unwrap();
        assert_eq!(format!("{}", interp.run_line("count").unwrap()), "2");
    }

    #[test]
    fn test_lex_parse_and_runtime_errors_are_distinct() {
        let (interp, _handle) = session();
        assert!(matches!(interp.run_line("@"), Err(LangError::Lex(_))));
        assert!(matches!(interp.run_line("(1"), Err(LangError::Parse(_))));
        assert!(matches!(
            interp.run_line("ghost"),
            Err(LangError::Runtime(_))
        ));
    }

    #[test]
    fn test_child_interpreter_shares_parent_env() {
        let (interp, handle) = session();
        interp.run_line(":shared .= 7").unwrap();

        let as_handle: HandleRef = handle.clone();
        let child = Interpreter::with_parts(
            as_handle,
            Some(interp.env().clone()),
            None,
            None,
            None,
        );
        assert_eq!(format!("{}", child.run_line("shared").unwrap()), "7");

        // the child's own definitions do not leak upward
        child.run_line(":private .= 1").unwrap();
        assert!(interp.run_line("private").is_err());
    }

    #[test]
    fn test_without_prelude_has_no_bindings() {
        let interp = Interpreter::without_prelude(None, None);
        assert_eq!(format!("{}", interp.run_line("42").unwrap()), "42");
        assert_eq!(
            format!("{}", interp.run_line("(x y. x) 1 2").unwrap()),
            "1"
        );
        // the operators live in the prelude, so none resolve
        assert!(matches!(
            interp.run_line("1 + 1"),
            Err(LangError::Runtime(
                crate::error::RuntimeError::UndefinedName(name)
            )) if name == "+"
        ));
        assert!(interp.run_line("true").is_err());
    }

    #[test]
    fn test_exit_flag() {
        let (interp, handle) = session();
        interp.run_line("IO:exit {}").unwrap();
        assert!(handle.exited());
    }
}
