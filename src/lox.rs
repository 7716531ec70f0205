//! A Lox *session*: one interpreter, one global scope, one diagnostics
//! collector.  [`Lox::run`] drives source text through
//! scan → parse → resolve → evaluate.
//!
//! Compile‑time errors (scan, parse, resolve) are all collected and reported,
//! and evaluation is skipped.  A runtime error stops the program and is
//! reported after whatever output the program already produced.

use std::io::{self, Write};

use log::{debug, info};

use crate::error::{Diagnostics, LoxError};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

pub struct Lox {
    interpreter: Interpreter,
    diagnostics: Diagnostics,
    errors: Box<dyn Write>,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// Session printing to stdout and reporting errors to stderr.
    pub fn new() -> Self {
        Self::with_streams(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Session with caller‑supplied output and error streams.
    pub fn with_streams(output: Box<dyn Write>, errors: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(output),
            diagnostics: Diagnostics::new(),
            errors,
        }
    }

    /// Run one chunk of source.  Globals defined here stay visible to later
    /// calls, which is what the REPL relies on.
    pub fn run(&mut self, source: &str) {
        info!("Running {} byte(s) of source", source.len());

        let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
        self.report_all(scan_errors);

        let (statements, parse_errors) = Parser::new(tokens).parse();
        self.report_all(parse_errors);

        if self.diagnostics.had_error() {
            info!("Skipping evaluation: syntax errors reported");
            return;
        }

        match Resolver::new().resolve(&statements) {
            Ok(locals) => self.interpreter.add_locals(locals),
            Err(errors) => {
                info!("Skipping evaluation: resolution errors reported");
                self.report_all(errors);
                return;
            }
        }

        if let Err(e) = self.interpreter.interpret(&statements) {
            self.report(e);
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Clear the error state between REPL lines.
    pub fn reset_diagnostics(&mut self) {
        self.diagnostics.reset();
    }

    fn report_all(&mut self, errors: Vec<LoxError>) {
        for error in errors {
            self.report(error);
        }
    }

    fn report(&mut self, error: LoxError) {
        debug!("Reporting: {}", error);

        // Still recorded when the error stream is broken.
        if let Err(e) = writeln!(self.errors, "{}", error) {
            debug!("Failed to write diagnostic: {}", e);
        }

        self.diagnostics.report(error);
    }
}
