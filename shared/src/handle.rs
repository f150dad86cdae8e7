//! Opaque resource tokens handed out by the native engine

use std::ffi::c_void;

/// Address of an engine-owned resource (system or scene).
///
/// The representation belongs entirely to the engine; Rust only stores,
/// compares and passes it back. A null token means "no resource".
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(*mut c_void);

impl RawHandle {
    pub const NULL: Self = Self(std::ptr::null_mut());

    pub const fn from_ptr(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub const fn as_ptr(self) -> *mut c_void {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Default for RawHandle {
    fn default() -> Self {
        Self::NULL
    }
}
