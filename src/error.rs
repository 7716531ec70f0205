//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime) convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! The module **does not** print diagnostics itself; the [`Diagnostics`]
//! collector records them and the caller decides where they go.

use std::io;
use thiserror::Error;

use log::debug;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        /// ` at end`, ` at 'lexeme'` or empty.
        location: String,
    },

    /// Static‑analysis failure found by the resolver.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.  Carries the line of the offending token.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Renders the `<location>` part of a compile-time diagnostic.
fn location_of(token: &Token) -> String {
    match token.token_type {
        TokenType::EOF => " at end".to_string(),
        _ => format!(" at '{}'", token.lexeme),
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }

    /// Scan, parse and resolve errors all stop a program before it runs.
    pub fn is_compile_time(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, LoxError::Runtime { .. })
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Ordered collector for every error reported during a run.
///
/// Replaces the classic pair of global `hadError` / `hadRuntimeError` flags:
/// each pipeline stage hands its errors back and the orchestrating session
/// records them here.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<LoxError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, error: LoxError) {
        self.errors.push(error);
    }

    /// Did a scan, parse or resolve error occur?
    pub fn had_error(&self) -> bool {
        self.errors.iter().any(LoxError::is_compile_time)
    }

    pub fn had_runtime_error(&self) -> bool {
        self.errors.iter().any(LoxError::is_runtime)
    }

    /// Everything reported since the last reset, in report order.
    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Forget everything reported so far.
    pub fn reset(&mut self) {
        self.errors.clear();
    }

    /// Conventional sysexits status: 65 for bad input, 70 for runtime failure.
    pub fn exit_code(&self) -> i32 {
        if self.had_error() {
            65
        } else if self.had_runtime_error() {
            70
        } else {
            0
        }
    }
}
