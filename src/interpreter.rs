//! Tree‑walking evaluator.
//!
//! Statements run against the *current* environment; blocks and calls swap in
//! a child scope and always put the previous one back, whichever way the body
//! exits.  `return` travels up as [`Flow::Return`], never as a [`LoxError`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::{ClassDecl, Expr, ExprId, Stmt};
use crate::callable::{LoxFunction, NativeFunction};
use crate::class::{LoxClass, LoxInstance, INITIALIZER};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Deepest chain of nested Lox calls before `Stack overflow.` is reported.
pub const MAX_CALL_DEPTH: usize = 4096;

/// Grow the native stack when less than this is left before a call.
const RED_ZONE: usize = 100 * 1024;

/// Size of each extra native stack segment.
const STACK_PER_CALL: usize = 1024 * 1024;

/// How a statement finished.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Normal,
    /// A `return` is unwinding to the nearest call boundary.
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: Locals,
    output: Box<dyn Write>,
    /// Lox calls currently in progress.
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates a new Interpreter printing to stdout, with the native
    /// functions (`clock`) defined as globals.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Same as [`new`](Self::new) but `print` writes to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: clock,
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
            call_depth: 0,
        }
    }

    /// Merge a resolver table.  Ids are unique per node, so tables from
    /// successive REPL lines never clash.
    pub fn add_locals(&mut self, locals: Locals) {
        debug!("Adding {} resolved local(s)", locals.len());

        self.locals.extend(locals);
    }

    /// Runs a program.  Stops at, and returns, the first runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        info!("Interpreting {} statement(s)", statements.len());

        for stmt in statements {
            self.execute(stmt)?;
        }

        self.output.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ───────────────────────────── statements ──────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                debug!("Printing value: {}", value);
                writeln!(self.output, "{}", value)?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment: EnvRef = Environment::child_of(&self.environment);
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class(class) => self.execute_class(class),
        }
    }

    /// Run `statements` inside `environment`, restoring the current scope on
    /// every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Result<Flow> {
        let previous: EnvRef = std::mem::replace(&mut self.environment, environment);

        let result: Result<Flow> = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn execute_class(&mut self, class: &ClassDecl) -> Result<Flow> {
        debug!("Defining class '{}'", class.name.lexeme);

        let superclass: Option<Rc<LoxClass>> = match &class.superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(superclass) => Some(superclass),
                _ => {
                    let token: &Token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => &class.name,
                    };
                    return Err(LoxError::runtime(token, "Superclass must be a class."));
                }
            },
            None => None,
        };

        // Defined first so methods can refer to the class by name.
        self.environment
            .borrow_mut()
            .define(&class.name.lexeme, Value::Nil);

        let enclosing: Option<EnvRef> = superclass.as_ref().map(|superclass| {
            let environment: EnvRef = Environment::child_of(&self.environment);
            environment
                .borrow_mut()
                .define("super", Value::Class(Rc::clone(superclass)));
            std::mem::replace(&mut self.environment, environment)
        });

        let methods: HashMap<String, Rc<LoxFunction>> = class
            .methods
            .iter()
            .map(|method| {
                let function = LoxFunction::new(
                    Rc::clone(method),
                    Rc::clone(&self.environment),
                    method.name.lexeme == INITIALIZER,
                );
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let lox_class = LoxClass::new(class.name.lexeme.clone(), superclass, methods);

        if let Some(enclosing) = enclosing {
            self.environment = enclosing;
        }

        self.environment
            .borrow_mut()
            .assign(&class.name, Value::Class(Rc::new(lox_class)))?;

        Ok(Flow::Normal)
    }

    // ───────────────────────────── expressions ─────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(Value::from(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;
                self.evaluate_unary(operator, right)
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;
                self.evaluate_binary(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuits = match operator.token_type {
                    TokenType::OR => left.is_truthy(),
                    _ => !left.is_truthy(),
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                let callable = callee.as_callable().ok_or_else(|| {
                    LoxError::runtime(paren, "Can only call functions and classes.")
                })?;

                if values.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            values.len()
                        ),
                    ));
                }

                if self.call_depth >= MAX_CALL_DEPTH {
                    return Err(LoxError::runtime(paren, "Stack overflow."));
                }

                debug!("Calling {} with {} argument(s)", callee, values.len());

                self.call_depth += 1;
                let result: Result<Value> = stacker::maybe_grow(RED_ZONE, STACK_PER_CALL, || {
                    callable.call(self, values)
                });
                self.call_depth -= 1;

                result
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&self, operator: &Token, right: Value) -> Result<Value> {
        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
            _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&self, operator: &Token, left: Value, right: Value) -> Result<Value> {
        debug!("Binary '{}' on {} and {}", operator.lexeme, left, right);

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(LoxError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            _ => {
                let (a, b) = number_operands(operator, &left, &right)?;

                match operator.token_type {
                    TokenType::MINUS => Ok(Value::Number(a - b)),
                    TokenType::STAR => Ok(Value::Number(a * b)),
                    // IEEE semantics: x / 0 is ±inf or NaN, not an error.
                    TokenType::SLASH => Ok(Value::Number(a / b)),
                    TokenType::GREATER => Ok(Value::Bool(a > b)),
                    TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
                    TokenType::LESS => Ok(Value::Bool(a < b)),
                    TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
                    _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
                }
            }
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        // `this` always lives one scope inside the `super` scope.
        let bindings = self.locals.get(&id).and_then(|&distance| {
            let superclass = Environment::implicit_at(&self.environment, distance, "super")?;
            let object =
                Environment::implicit_at(&self.environment, distance.checked_sub(1)?, "this")?;
            Some((superclass, object))
        });

        let Some((Value::Class(superclass), Value::Instance(object))) = bindings else {
            return Err(LoxError::runtime(keyword, "Can't use 'super' here."));
        };

        let function: Rc<LoxFunction> =
            superclass.find_method(&method.lexeme).ok_or_else(|| {
                LoxError::runtime(method, format!("Undefined property '{}'.", method.lexeme))
            })?;

        Ok(Value::Function(Rc::new(function.bind(object)?)))
    }

    /// Locals use the resolved distance; anything unresolved is a global.
    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(operator, "Operands must be numbers.")),
    }
}

/// `clock()`: seconds since the Unix epoch, with millisecond resolution.
fn clock(_interpreter: &mut Interpreter, _arguments: &[Value]) -> Result<Value> {
    let seconds: f64 = Utc::now().timestamp_millis() as f64 / 1000.0;

    debug!("Native function 'clock' returned: {}", seconds);

    Ok(Value::Number(seconds))
}
