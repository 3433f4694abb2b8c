use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::object::Value;

/* An environment is a mapping from identifier to value, paired with an optional outer
environment; lookup walks outward until found. Function values capture the environment
active at their definition site, and closures must observe later mutation of that scope —
two closures created in the same enclosing scope must see each other's `let` bindings to
that scope. A teacher-style owned `Box<Environment>` chain cannot do this: cloning the parent
into every call frame severs the link back to the scope the closure actually captured. This
implementation instead hands out `Rc<RefCell<EnvironmentData>>` handles, so `Environment`
itself is a cheap `Clone` (bumping a reference count) and every clone still points at the
same mutable scope. */

#[derive(Debug)]
struct EnvironmentData {
    store: HashMap<String, Value>,
    outer: Option<Environment>,
}

#[derive(Debug, Clone)]
pub struct Environment(Rc<RefCell<EnvironmentData>>);

impl Environment {
    /// Create the top-level (global) environment.
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(EnvironmentData {
            store: HashMap::new(),
            outer: None,
        })))
    }

    /// Create a nested environment enclosing `outer`; a `let` in the new scope shadows, but
    /// never mutates, the same-named binding in `outer`.
    pub fn enclosed(outer: &Environment) -> Self {
        Self(Rc::new(RefCell::new(EnvironmentData {
            store: HashMap::new(),
            outer: Some(outer.clone()),
        })))
    }

    /// Binds `name` in *this* scope only, shadowing (without touching) any outer binding.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().store.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let data = self.0.borrow();
        if let Some(value) = data.store.get(name) {
            return Some(value.clone());
        }
        data.outer.as_ref().and_then(|outer| outer.get(name))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
