use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// Shared handle to a scope.  Closures, bound methods and the interpreter's
/// current‑scope pointer all hold one of these.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope: its own bindings plus a link to the enclosing scope.
/// The global scope is the only one without an enclosing link.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Fresh child scope of `enclosing`, ready to be shared.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    /// Bind `name` in this scope, replacing any previous binding here.
    pub fn define(&mut self, name: &str, value: Value) {
        let value: Value = value.stored_in(self);
        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup along the whole chain.  Used for globals, which the
    /// resolver leaves unannotated.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.loaded())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if self.values.contains_key(&name.lexeme) {
            let value: Value = value.stored_in(self);
            self.values.insert(name.lexeme.clone(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Walk exactly `distance` enclosing links up from `env`.  `None` when the
    /// chain ends first.
    pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
        let mut current: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let next: Option<EnvRef> = current.borrow().enclosing.clone();
            match next {
                Some(enclosing) => current = enclosing,
                None => {
                    debug!("Scope chain shorter than resolved distance {}", distance);
                    return None;
                }
            }
        }

        Some(current)
    }

    /// Read a variable the resolver located `distance` scopes up.
    pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value> {
        let scope: EnvRef =
            Self::ancestor(env, distance).ok_or_else(|| missing_scope(name, distance))?;
        let value: Option<Value> = scope.borrow().values.get(&name.lexeme).map(Value::loaded);

        value.ok_or_else(|| undefined(name))
    }

    /// Overwrite a variable the resolver located `distance` scopes up.
    pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> Result<()> {
        let scope: EnvRef =
            Self::ancestor(env, distance).ok_or_else(|| missing_scope(name, distance))?;
        let mut scope = scope.borrow_mut();
        let value: Value = value.stored_in(&scope);
        scope.values.insert(name.lexeme.clone(), value);

        Ok(())
    }

    /// Read `this` or `super`, which have no token of their own name.
    pub fn implicit_at(env: &EnvRef, distance: usize, name: &str) -> Option<Value> {
        let scope: EnvRef = Self::ancestor(env, distance)?;
        let value: Option<Value> = scope.borrow().values.get(name).map(Value::loaded);
        value
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

fn missing_scope(name: &Token, distance: usize) -> LoxError {
    LoxError::runtime(
        name,
        format!("No scope {} level(s) up for '{}'.", distance, name.lexeme),
    )
}
