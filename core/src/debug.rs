//! Native debug log bridge
//!
//! The engine reports diagnostics through a single C callback. We register
//! [`native_log_sink`], a fixed `extern "C"` trampoline that forwards every
//! message to `tracing` under the `nether_acoustics::native` target and
//! always acknowledges with `OK`: the channel is notification-only.

use std::borrow::Cow;
use std::ffi::{CStr, c_char, c_int};

use nether_acoustics_shared::{DebugCallback, DebugLevel, NativeResult, ResultCode};

use crate::engine::PropagationEngine;
use crate::error::CheckResult;

/// Log target for messages originating inside the engine
pub const NATIVE_LOG_TARGET: &str = "nether_acoustics::native";

/// Callback handed to the engine's debug registration.
///
/// # Safety
///
/// `message` must be null or a NUL-terminated string valid for the call.
pub unsafe extern "C" fn native_log_sink(message: *const c_char, level: c_int) -> c_int {
    let text: Cow<'_, str> = if message.is_null() {
        Cow::Borrowed("<null message>")
    } else {
        // SAFETY: non-null and NUL-terminated per the callback contract.
        unsafe { CStr::from_ptr(message) }.to_string_lossy()
    };

    match DebugLevel::from_raw(level) {
        DebugLevel::Log => tracing::info!(target: NATIVE_LOG_TARGET, "{}", text),
        DebugLevel::Warn => tracing::warn!(target: NATIVE_LOG_TARGET, "{}", text),
        DebugLevel::Error => tracing::error!(target: NATIVE_LOG_TARGET, "{}", text),
    }

    ResultCode::Ok.as_raw()
}

/// Tracks whether [`native_log_sink`] is currently registered with an engine.
///
/// Owned by the context so unregistration can be ordered after every
/// resource release; the engine must never call the sink afterwards.
#[derive(Debug, Default)]
pub struct DebugRegistration {
    registered: bool,
}

impl DebugRegistration {
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Register the log sink. Re-registering is a no-op.
    pub fn register<E: PropagationEngine + ?Sized>(&mut self, engine: &E) -> NativeResult<()> {
        if self.registered {
            return Ok(());
        }
        engine
            .debug_initialize(Some(native_log_sink as DebugCallback))
            .into_result()
            .checked("Debug.Initialize")?;
        self.registered = true;
        Ok(())
    }

    /// Unregister by handing the engine a null callback.
    ///
    /// The registration is considered gone even if the engine reports a
    /// failure, so a second call never reaches the engine again.
    pub fn unregister<E: PropagationEngine + ?Sized>(&mut self, engine: &E) -> NativeResult<()> {
        if !self.registered {
            return Ok(());
        }
        self.registered = false;
        engine
            .debug_initialize(None)
            .into_result()
            .checked("Debug.Unregister")
    }
}
