//! Capture Source (C1): produces timestamped frames for a named poker
//! window, independent of desktop/workspace, without requiring focus.
#![allow(dead_code)]

mod backend;
mod error;
mod frame;
mod source;
mod window;

pub use backend::{BackendKind, Capabilities, CaptureBackend, GenericBitBltBackend};
pub use error::CaptureError;
pub use frame::{Frame, PixelFormat, Roi};
pub use source::CaptureSource;
pub use window::{Bounds, WindowHandle};
