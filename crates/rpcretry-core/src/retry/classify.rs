//! Classify a failed attempt against the configured retryable codes.

use std::collections::BTreeSet;

use crate::status::{Code, HasStatusCode};

/// Outcome of inspecting one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The failure carries no status code; propagate it untouched.
    Foreign,
    /// Recognized failure whose code is not configured as retryable.
    NonRetryable(Code),
    /// Recognized failure whose code is in the retryable set.
    Retryable(Code),
}

/// Classify a failure by its status code capability.
pub fn classify<E>(failure: &E, retry_codes: &BTreeSet<Code>) -> Classification
where
    E: HasStatusCode + ?Sized,
{
    match failure.status_code() {
        None => Classification::Foreign,
        Some(code) if retry_codes.contains(&code) => Classification::Retryable(code),
        Some(code) => Classification::NonRetryable(code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::RpcError;

    struct Opaque;

    impl HasStatusCode for Opaque {
        fn status_code(&self) -> Option<Code> {
            None
        }
    }

    fn codes(list: &[Code]) -> BTreeSet<Code> {
        list.iter().copied().collect()
    }

    #[test]
    fn no_status_code_is_foreign() {
        assert_eq!(
            classify(&Opaque, &codes(&[Code::Unavailable])),
            Classification::Foreign
        );
    }

    #[test]
    fn code_in_set_is_retryable() {
        let e = RpcError::new(Code::Unavailable, "try again");
        assert_eq!(
            classify(&e, &codes(&[Code::Unavailable, Code::DeadlineExceeded])),
            Classification::Retryable(Code::Unavailable)
        );
    }

    #[test]
    fn code_outside_set_is_non_retryable() {
        let e = RpcError::new(Code::NotFound, "missing");
        assert_eq!(
            classify(&e, &codes(&[Code::Unavailable])),
            Classification::NonRetryable(Code::NotFound)
        );
    }

    #[test]
    fn empty_set_never_retries() {
        for code in [Code::Unavailable, Code::Aborted, Code::Internal] {
            assert_eq!(
                classify(&code, &BTreeSet::new()),
                Classification::NonRetryable(code)
            );
        }
    }
}
