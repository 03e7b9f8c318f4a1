// ABOUTME: Environment chain for name bindings and lexical scopes

use crate::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

/// A node in the environment tree. Lookups walk the parent chain.
///
/// The frame is a `RefCell` because `IO:define` and `.=` mutate the
/// node in place, and that mutation must be observable through every
/// `Fun` that holds a reference to the node.
#[derive(Debug)]
pub struct Environment {
    parent: Option<Rc<Environment>>,
    names: RefCell<IndexMap<String, Value>>,
}

impl Environment {
    /// A root environment with no parent.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            parent: None,
            names: RefCell::new(IndexMap::new()),
        })
    }

    /// A child frame; created on each function application and each
    /// destructuring step.
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            parent: Some(parent),
            names: RefCell::new(IndexMap::new()),
        })
    }

    /// Installs a binding in THIS frame only.
    pub fn define(&self, name: String, value: Value) {
        self.names.borrow_mut().insert(name, value);
    }

    /// Removes a binding from THIS frame only.
    pub fn forget(&self, name: &str) -> Option<Value> {
        self.names.borrow_mut().shift_remove(name)
    }

    /// Looks a name up here, then through the parent chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.names.borrow().get(name) {
            return Some(value.clone());
        }
        if let Some(ref parent) = self.parent {
            return parent.get(name);
        }
        None
    }
}
