//! Boundary types for the Nether acoustics runtime.
//!
//! Everything here crosses the foreign-function boundary to the native
//! propagation engine, so all data types are `#[repr(C)]` PODs.
//!
//! - [`ResultCode`] / [`NativeError`] - the result taxonomy every native call reports
//! - [`DebugLevel`] / [`DebugCallback`] - the native log sink protocol
//! - [`PlVector`] / [`PlQuaternion`] - vector math as the engine sees it
//! - [`RawHandle`] - opaque engine-owned resource token

pub mod handle;
pub mod math;
pub mod result;

pub use handle::RawHandle;
pub use math::{PlQuaternion, PlVector};
pub use result::{DebugCallback, DebugLevel, NativeError, NativeResult, ResultCode};
