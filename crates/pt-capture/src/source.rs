use std::collections::VecDeque;

use crate::backend::{BackendKind, CaptureBackend, Capabilities, GenericBitBltBackend};
use crate::error::CaptureError;
use crate::frame::{Frame, Roi};
use crate::window::WindowHandle;

/// Most recent frames kept to absorb capture jitter.
const RING_CAPACITY: usize = 3;

/// Capture source for a single named poker window.
///
/// Synchronous from the caller's perspective; the backend is fixed at
/// construction and never swapped at runtime.
pub struct CaptureSource {
    backend: Box<dyn CaptureBackend>,
    ring: VecDeque<Frame>,
}

impl CaptureSource {
    pub fn new(backend: Box<dyn CaptureBackend>) -> Self {
        Self {
            backend,
            ring: VecDeque::with_capacity(RING_CAPACITY),
        }
    }

    /// Builds a source using the OS-detected backend.
    ///
    /// `X11`/`Wayland`/`Win32`/`Quartz` all currently resolve to the same
    /// cross-platform implementation; a production build would swap in a
    /// window-manager-aware backend per [`BackendKind`] behind this match.
    pub fn detect() -> Self {
        let kind = BackendKind::detect();
        log::info!("capture backend selected: {kind:?}");
        let backend: Box<dyn CaptureBackend> = Box::new(GenericBitBltBackend::new());
        Self::new(backend)
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.backend.capabilities()
    }

    pub fn enumerate_windows(&self) -> Result<Vec<WindowHandle>, CaptureError> {
        self.backend.enumerate_windows()
    }

    /// Captures one frame and pushes it into the ring buffer.
    ///
    /// On `Minimised`/`Occluded` the ring buffer is left untouched so
    /// [`Self::last_frame`] still serves the most recent good frame, letting
    /// the dispatcher fall back to cached `TableState`.
    pub fn capture(&mut self, handle: &WindowHandle, roi: Option<Roi>) -> Result<Frame, CaptureError> {
        let frame = self.backend.capture(handle, roi)?;
        if self.ring.len() == RING_CAPACITY {
            self.ring.pop_front();
        }
        self.ring.push_back(frame.clone());
        Ok(frame)
    }

    /// The most recently captured frame, if any, for jitter absorption and
    /// minimised-window fallback.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.ring.back()
    }

    pub fn ring_len(&self) -> usize {
        self.ring.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::Bounds;

    struct StubBackend;

    impl CaptureBackend for StubBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::GenericBitBlt
        }
        fn enumerate_windows(&self) -> Result<Vec<WindowHandle>, CaptureError> {
            Ok(vec![])
        }
        fn capture(&self, handle: &WindowHandle, _roi: Option<Roi>) -> Result<Frame, CaptureError> {
            Ok(Frame {
                pixels: vec![0; 12],
                width: 2,
                height: 2,
                stride: 6,
                pixel_format: crate::frame::PixelFormat::Rgb8,
                t_mono_ns: handle.id,
                t_wall: std::time::SystemTime::now(),
                window_id: handle.id,
                monitor_id: 0,
            })
        }
        fn capabilities(&self) -> Capabilities {
            Capabilities {
                cross_desktop: true,
                multi_monitor: true,
                hidden_window: false,
                max_fps: 10,
            }
        }
    }

    fn handle(id: u64) -> WindowHandle {
        WindowHandle {
            id,
            title: "test".into(),
            bounds: Bounds::default(),
            visible: true,
            z: 0,
            pid: 1,
        }
    }

    #[test]
    fn ring_buffer_caps_at_three() {
        let mut source = CaptureSource::new(Box::new(StubBackend));
        for i in 0..5 {
            source.capture(&handle(i), None).unwrap();
        }
        assert_eq!(source.ring_len(), 3);
        assert_eq!(source.last_frame().unwrap().window_id, 4);
    }

    #[test]
    fn minimised_error_preserves_last_good_frame() {
        let fail_next = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        struct SharedFlaky(std::sync::Arc<std::sync::atomic::AtomicBool>);
        impl CaptureBackend for SharedFlaky {
            fn kind(&self) -> BackendKind {
                BackendKind::GenericBitBlt
            }
            fn enumerate_windows(&self) -> Result<Vec<WindowHandle>, CaptureError> {
                Ok(vec![])
            }
            fn capture(&self, handle: &WindowHandle, _roi: Option<Roi>) -> Result<Frame, CaptureError> {
                if self.0.load(std::sync::atomic::Ordering::SeqCst) {
                    return Err(CaptureError::Minimised);
                }
                Ok(Frame {
                    pixels: vec![0; 12],
                    width: 2,
                    height: 2,
                    stride: 6,
                    pixel_format: crate::frame::PixelFormat::Rgb8,
                    t_mono_ns: handle.id,
                    t_wall: std::time::SystemTime::now(),
                    window_id: handle.id,
                    monitor_id: 0,
                })
            }
            fn capabilities(&self) -> Capabilities {
                Capabilities {
                    cross_desktop: true,
                    multi_monitor: true,
                    hidden_window: false,
                    max_fps: 10,
                }
            }
        }
        let mut source = CaptureSource::new(Box::new(SharedFlaky(fail_next.clone())));
        source.capture(&handle(2), None).unwrap();
        fail_next.store(true, std::sync::atomic::Ordering::SeqCst);
        let err = source.capture(&handle(3), None).unwrap_err();
        assert_eq!(err, CaptureError::Minimised);
        assert_eq!(source.last_frame().unwrap().window_id, 2);
    }
}
