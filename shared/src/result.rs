//! Result codes and debug levels reported across the native boundary

use std::ffi::{c_char, c_int};

/// Result reported by every native engine call
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// Call completed successfully
    Ok = 0,
    /// Generic failure without further detail
    Err = 1,
    /// Allocation failure or null reference across the boundary
    ErrMemory = 2,
    /// Malformed input, e.g. an index count that is not a multiple of three
    ErrInvalidParam = 3,
}

impl ResultCode {
    /// Decode a raw value returned by C.
    ///
    /// Unknown values are treated as [`ResultCode::Err`] so an out-of-range
    /// integer never becomes an invalid enum value.
    pub const fn from_raw(raw: c_int) -> Self {
        match raw {
            0 => Self::Ok,
            2 => Self::ErrMemory,
            3 => Self::ErrInvalidParam,
            _ => Self::Err,
        }
    }

    /// Raw C value of this code
    pub const fn as_raw(self) -> c_int {
        self as c_int
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Convert into a Rust result
    pub const fn into_result(self) -> NativeResult<()> {
        match self {
            Self::Ok => Ok(()),
            Self::Err => Err(NativeError::Failed),
            Self::ErrMemory => Err(NativeError::Memory),
            Self::ErrInvalidParam => Err(NativeError::InvalidParam),
        }
    }

    /// Name used in log output (`OK`, `ERR`, ...)
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Err => "ERR",
            Self::ErrMemory => "ERR_MEMORY",
            Self::ErrInvalidParam => "ERR_INVALID_PARAM",
        }
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure half of the result taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum NativeError {
    #[error("ERR: native call failed")]
    Failed,
    #[error("ERR_MEMORY: allocation failed or null reference across the boundary")]
    Memory,
    #[error("ERR_INVALID_PARAM: invalid parameter")]
    InvalidParam,
}

impl NativeError {
    /// The result code this error was decoded from
    pub const fn code(self) -> ResultCode {
        match self {
            Self::Failed => ResultCode::Err,
            Self::Memory => ResultCode::ErrMemory,
            Self::InvalidParam => ResultCode::ErrInvalidParam,
        }
    }
}

impl From<NativeError> for ResultCode {
    fn from(error: NativeError) -> Self {
        error.code()
    }
}

pub type NativeResult<T> = Result<T, NativeError>;

/// Severity attached to a native debug message
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugLevel {
    Log = 0,
    Warn = 1,
    Error = 2,
}

impl DebugLevel {
    /// Decode a raw level from C. Unknown levels are reported as errors.
    pub const fn from_raw(raw: c_int) -> Self {
        match raw {
            0 => Self::Log,
            1 => Self::Warn,
            _ => Self::Error,
        }
    }
}

/// Native log sink signature.
///
/// The level is passed as a raw integer and decoded with
/// [`DebugLevel::from_raw`]; the return value is a raw [`ResultCode`].
/// `message` must be null or point to a NUL-terminated string that stays
/// valid for the duration of the call.
pub type DebugCallback = unsafe extern "C" fn(message: *const c_char, level: c_int) -> c_int;
