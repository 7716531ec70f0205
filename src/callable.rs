//! The call capability shared by user functions, native functions and classes.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::LoxInstance;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::value::Value;

/// Anything a Lox call expression can invoke.
///
/// The interpreter checks the argument count against [`arity`](Callable::arity)
/// before calling, so implementations may assume it matches.
pub trait Callable {
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value>;
}

/// Host function exposed to scripts, e.g. `clock`.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&mut Interpreter, &[Value]) -> Result<Value>,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(interpreter, &arguments)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

/// How a function holds the scope it closes over.
///
/// The binding a `fun` declaration creates lives in that same scope, so it
/// keeps the scope through a [`Weak`] link.  Every read of the binding hands
/// out a strong copy (see [`Value::loaded`]), which is what lets a returned
/// closure keep its scope alive.
#[derive(Clone)]
enum Closure {
    Strong(EnvRef),
    Weak(Weak<RefCell<Environment>>),
}

impl Closure {
    fn as_ptr(&self) -> *const RefCell<Environment> {
        match self {
            Closure::Strong(env) => Rc::as_ptr(env),
            Closure::Weak(env) => env.as_ptr(),
        }
    }
}

/// A user function or method together with the scope it closes over.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Closure,
    /// `init` methods always hand back `this`.
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure: Closure::Strong(closure),
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// Same declaration closed over the same scope.
    pub fn same_as(&self, other: &LoxFunction) -> bool {
        Rc::ptr_eq(&self.declaration, &other.declaration)
            && self.closure.as_ptr() == other.closure.as_ptr()
    }

    /// Does this function strongly hold `env` as its closure?
    pub fn closes_over(&self, env: &Environment) -> bool {
        match &self.closure {
            Closure::Strong(closure) => std::ptr::eq(RefCell::as_ptr(closure), env),
            Closure::Weak(_) => false,
        }
    }

    /// Copy that refers to its closure through a weak link.
    pub(crate) fn weakened(&self) -> LoxFunction {
        let closure: Closure = match &self.closure {
            Closure::Strong(env) => Closure::Weak(Rc::downgrade(env)),
            weak => weak.clone(),
        };

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure,
            is_initializer: self.is_initializer,
        }
    }

    /// Strong copy of a weakly linked function.  `None` when the closure is
    /// already strong or has been dropped.
    pub(crate) fn strengthened(&self) -> Option<LoxFunction> {
        match &self.closure {
            Closure::Weak(env) => env.upgrade().map(|env| {
                LoxFunction::new(Rc::clone(&self.declaration), env, self.is_initializer)
            }),
            Closure::Strong(_) => None,
        }
    }

    fn closure(&self) -> Result<EnvRef> {
        match &self.closure {
            Closure::Strong(env) => Ok(Rc::clone(env)),
            Closure::Weak(env) => env.upgrade().ok_or_else(|| {
                LoxError::runtime(
                    &self.declaration.name,
                    format!("Scope of '{}' no longer exists.", self.name()),
                )
            }),
        }
    }

    /// Method bound to `instance`: same body, closure extended by a scope that
    /// holds `this`.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> Result<LoxFunction> {
        debug!("Binding method '{}'", self.name());

        let environment: EnvRef = Environment::child_of(&self.closure()?);
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        Ok(LoxFunction::new(
            Rc::clone(&self.declaration),
            environment,
            self.is_initializer,
        ))
    }

    /// The `this` captured by a bound initializer.
    fn bound_this(&self) -> Value {
        self.closure()
            .ok()
            .and_then(|env| Environment::implicit_at(&env, 0, "this"))
            .unwrap_or(Value::Nil)
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!(
            "Calling '{}' with {} argument(s)",
            self.name(),
            arguments.len()
        );

        let environment: EnvRef = Environment::child_of(&self.closure()?);
        {
            let mut scope = environment.borrow_mut();
            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                scope.define(&param.lexeme, argument);
            }
        }

        let flow: Flow = interpreter.execute_block(&self.declaration.body, environment)?;

        if self.is_initializer {
            return Ok(self.bound_this());
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}
