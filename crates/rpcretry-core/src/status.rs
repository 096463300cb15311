//! RPC status codes and the capability trait used to classify failures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical RPC status code.
///
/// Serialized (and parsed) as the upper-case name used in client configs,
/// e.g. `"DEADLINE_EXCEEDED"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Code {
    Ok,
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

const ALL_CODES: [Code; 17] = [
    Code::Ok,
    Code::Cancelled,
    Code::Unknown,
    Code::InvalidArgument,
    Code::DeadlineExceeded,
    Code::NotFound,
    Code::AlreadyExists,
    Code::PermissionDenied,
    Code::ResourceExhausted,
    Code::FailedPrecondition,
    Code::Aborted,
    Code::OutOfRange,
    Code::Unimplemented,
    Code::Internal,
    Code::Unavailable,
    Code::DataLoss,
    Code::Unauthenticated,
];

impl Code {
    /// Name as it appears in client configs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::Ok => "OK",
            Code::Cancelled => "CANCELLED",
            Code::Unknown => "UNKNOWN",
            Code::InvalidArgument => "INVALID_ARGUMENT",
            Code::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Code::NotFound => "NOT_FOUND",
            Code::AlreadyExists => "ALREADY_EXISTS",
            Code::PermissionDenied => "PERMISSION_DENIED",
            Code::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Code::FailedPrecondition => "FAILED_PRECONDITION",
            Code::Aborted => "ABORTED",
            Code::OutOfRange => "OUT_OF_RANGE",
            Code::Unimplemented => "UNIMPLEMENTED",
            Code::Internal => "INTERNAL",
            Code::Unavailable => "UNAVAILABLE",
            Code::DataLoss => "DATA_LOSS",
            Code::Unauthenticated => "UNAUTHENTICATED",
        }
    }

    /// Numeric value on the wire (0 = OK .. 16 = UNAUTHENTICATED).
    pub fn value(&self) -> i32 {
        *self as i32
    }

    /// Map a numeric wire value back to a code. Out-of-range values are `None`.
    pub fn from_value(value: i32) -> Option<Code> {
        usize::try_from(value)
            .ok()
            .and_then(|i| ALL_CODES.get(i).copied())
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status code name: {0:?}")]
pub struct UnknownCode(pub String);

impl FromStr for Code {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_CODES
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCode(s.to_string()))
    }
}

/// Capability: "does this failure expose an RPC status code?"
///
/// The retry loop classifies failures through this trait rather than by
/// concrete type. Failures that return `None` are foreign and propagate
/// untouched.
pub trait HasStatusCode {
    fn status_code(&self) -> Option<Code>;
}

impl HasStatusCode for Code {
    fn status_code(&self) -> Option<Code> {
        Some(*self)
    }
}

impl<T: HasStatusCode + ?Sized> HasStatusCode for &T {
    fn status_code(&self) -> Option<Code> {
        (**self).status_code()
    }
}

impl<T: HasStatusCode + ?Sized> HasStatusCode for Box<T> {
    fn status_code(&self) -> Option<Code> {
        (**self).status_code()
    }
}

/// A failed RPC: status code plus server-provided message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RpcError {
    pub code: Code,
    pub message: String,
}

impl RpcError {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl HasStatusCode for RpcError {
    fn status_code(&self) -> Option<Code> {
        Some(self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names_case_insensitively() {
        assert_eq!("UNAVAILABLE".parse::<Code>().unwrap(), Code::Unavailable);
        assert_eq!(
            "deadline_exceeded".parse::<Code>().unwrap(),
            Code::DeadlineExceeded
        );
        assert!("NOT_A_CODE".parse::<Code>().is_err());
    }

    #[test]
    fn numeric_values_match_wire_order() {
        assert_eq!(Code::Ok.value(), 0);
        assert_eq!(Code::Unavailable.value(), 14);
        assert_eq!(Code::Unauthenticated.value(), 16);
        assert_eq!(Code::from_value(4), Some(Code::DeadlineExceeded));
        assert_eq!(Code::from_value(17), None);
        assert_eq!(Code::from_value(-1), None);
    }

    #[test]
    fn serde_uses_config_names() {
        let json = serde_json::to_string(&Code::ResourceExhausted).unwrap();
        assert_eq!(json, "\"RESOURCE_EXHAUSTED\"");
        let parsed: Code = serde_json::from_str("\"FAILED_PRECONDITION\"").unwrap();
        assert_eq!(parsed, Code::FailedPrecondition);
    }

    #[test]
    fn rpc_error_exposes_its_code() {
        let e = RpcError::new(Code::Aborted, "txn conflict");
        assert_eq!(e.status_code(), Some(Code::Aborted));
        assert_eq!(e.to_string(), "ABORTED: txn conflict");
    }
}
