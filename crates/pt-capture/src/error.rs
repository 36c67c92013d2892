/// Capture failure modes.
///
/// Never propagated past the frame loop: the dispatcher treats every variant
/// as "drop this frame, serve the cached `TableState`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    NotFound,
    Occluded,
    Minimised,
    PermissionDenied,
    Backend(String),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CaptureError::NotFound => write!(f, "window not found"),
            CaptureError::Occluded => write!(f, "window occluded"),
            CaptureError::Minimised => write!(f, "window minimised"),
            CaptureError::PermissionDenied => write!(f, "capture permission denied"),
            CaptureError::Backend(msg) => write!(f, "backend error: {msg}"),
        }
    }
}

impl std::error::Error for CaptureError {}
