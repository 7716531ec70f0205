#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::Lox;

/// `Write` sink whose contents stay readable after it is handed off.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Result of running one program in a fresh session.
pub struct Outcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

pub fn run(source: &str) -> Outcome {
    let stdout = SharedBuffer::default();
    let stderr = SharedBuffer::default();

    let mut lox = Lox::with_streams(Box::new(stdout.clone()), Box::new(stderr.clone()));
    lox.run(source);

    Outcome {
        stdout: stdout.contents(),
        stderr: stderr.contents(),
        exit_code: lox.diagnostics().exit_code(),
    }
}
