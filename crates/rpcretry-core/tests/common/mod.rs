//! Shared fixtures for retry episode tests.

use std::cell::Cell;
use std::fmt;
use std::time::Duration;

use rpcretry_core::{Code, HasStatusCode, RpcError};

/// Failure type of a fake transport: either an RPC status or a local IO error
/// that carries no status code.
#[derive(Debug)]
pub enum TransportError {
    Rpc(RpcError),
    Io(std::io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Rpc(e) => write!(f, "{}", e),
            TransportError::Io(e) => write!(f, "io: {}", e),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Rpc(e) => Some(e),
            TransportError::Io(e) => Some(e),
        }
    }
}

impl HasStatusCode for TransportError {
    fn status_code(&self) -> Option<Code> {
        match self {
            TransportError::Rpc(e) => Some(e.code),
            TransportError::Io(_) => None,
        }
    }
}

pub fn rpc(code: Code) -> TransportError {
    TransportError::Rpc(RpcError::new(code, "injected"))
}

/// Operation that fails with `code` for the first `failures` calls, then
/// returns `value`. Counts calls and records the timeout of each one.
pub struct Scripted {
    pub calls: Cell<u32>,
    pub timeouts: std::cell::RefCell<Vec<Option<Duration>>>,
    failures: u32,
    code: Code,
    value: i64,
}

impl Scripted {
    pub fn new(failures: u32, code: Code, value: i64) -> Self {
        Self {
            calls: Cell::new(0),
            timeouts: std::cell::RefCell::new(Vec::new()),
            failures,
            code,
            value,
        }
    }

    pub fn call(&self, timeout: Option<Duration>) -> Result<i64, TransportError> {
        let n = self.calls.get();
        self.calls.set(n + 1);
        self.timeouts.borrow_mut().push(timeout);
        if n < self.failures {
            Err(rpc(self.code))
        } else {
            Ok(self.value)
        }
    }
}
