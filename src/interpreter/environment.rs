use super::{error::RuntimeErrorKind, value::LoxValue};
use compact_str::{CompactString, ToCompactString};
use std::{cell::RefCell, collections::HashMap, rc::Rc};

/// A handle to one scope. Cloning the handle shares the scope, which is how closures keep the
/// scope they were declared in alive after it has been exited.
#[derive(Debug, Clone)]
pub struct SharedEnvironment {
    inner: Rc<RefCell<Environment>>,
}

#[derive(Debug)]
struct Environment {
    values: HashMap<CompactString, LoxValue>,
    parent: Option<SharedEnvironment>,
}

impl SharedEnvironment {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Environment {
                values: HashMap::new(),
                parent: None,
            })),
        }
    }

    pub fn new_scope(&self) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Environment {
                values: HashMap::new(),
                parent: Some(self.clone()),
            })),
        }
    }

    /// Looks `name` up in this scope and then outwards through every enclosing scope.
    pub fn access(&self, name: &str) -> Result<LoxValue, RuntimeErrorKind> {
        let inner = self.inner.borrow();
        if let Some(value) = inner.values.get(name) {
            Ok(value.clone())
        } else if let Some(ref parent) = inner.parent {
            parent.access(name)
        } else {
            Err(RuntimeErrorKind::UndefinedVariable(name.to_compact_string()))
        }
    }

    /// Rebinds the nearest existing binding of `name`. Never creates a binding.
    pub fn assign(&self, name: &str, value: LoxValue) -> Result<(), RuntimeErrorKind> {
        let mut inner = self.inner.borrow_mut();
        if let Some(slot) = inner.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(ref parent) = inner.parent {
            parent.assign(name, value)
        } else {
            Err(RuntimeErrorKind::UndefinedVariable(name.to_compact_string()))
        }
    }

    /// Binds `name` in this scope only, replacing any previous binding here.
    pub fn declare(&self, name: &str, value: LoxValue) {
        self.inner
            .borrow_mut()
            .values
            .insert(name.to_compact_string(), value);
    }
}

impl Default for SharedEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
