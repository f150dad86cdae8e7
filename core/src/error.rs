//! Result checking for native calls
//!
//! Native failures are never escalated into panics. Every call site runs its
//! result through [`CheckResult::checked`], which logs the failure with the
//! call name and hands the result back unchanged.

use nether_acoustics_shared::{NativeError, NativeResult};

/// Log a failed native call with its call-site name and pass it through
pub trait CheckResult<T> {
    fn checked(self, call: &'static str) -> NativeResult<T>;
}

impl<T> CheckResult<T> for NativeResult<T> {
    fn checked(self, call: &'static str) -> NativeResult<T> {
        if let Err(error) = &self {
            log_failure(call, *error);
        }
        self
    }
}

/// `[call] CODE : message` at error level
pub fn log_failure(call: &'static str, error: NativeError) {
    tracing::error!(call, code = %error.code(), "{} failed: {}", call, error);
}
