use crate::error::CaptureError;
use crate::frame::{Frame, Roi};
use crate::window::WindowHandle;

/// Platform backend selected one-shot at init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    X11,
    Wayland,
    Win32,
    Quartz,
    GenericBitBlt,
}

impl BackendKind {
    /// Picks a backend for the running OS, mirroring how the teacher's
    /// platform selection in `rbp-core` is a one-shot feature choice rather
    /// than a runtime dispatch table.
    pub fn detect() -> Self {
        if cfg!(target_os = "windows") {
            BackendKind::Win32
        } else if cfg!(target_os = "macos") {
            BackendKind::Quartz
        } else if cfg!(target_os = "linux") {
            BackendKind::X11
        } else {
            BackendKind::GenericBitBlt
        }
    }
}

/// What a backend can and cannot do, reported at init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub cross_desktop: bool,
    pub multi_monitor: bool,
    pub hidden_window: bool,
    pub max_fps: u32,
}

/// A capture backend: enumerate windows, capture pixels, report limits.
///
/// Implementations must never block longer than necessary to service a
/// single capture — the frame loop treats every backend call as synchronous.
pub trait CaptureBackend: Send + Sync {
    fn kind(&self) -> BackendKind;
    fn enumerate_windows(&self) -> Result<Vec<WindowHandle>, CaptureError>;
    fn capture(&self, handle: &WindowHandle, roi: Option<Roi>) -> Result<Frame, CaptureError>;
    fn capabilities(&self) -> Capabilities;
}

/// Cross-platform fallback backend built on whole-screen capture
/// (grounded on the `screenshots` crate usage seen for poker window capture
/// in the retrieved corpus). Window enumeration here reports monitors as
/// pseudo-windows since generic bit-blt has no window-manager integration;
/// a real `X11`/`Win32`/`Quartz` backend would enumerate actual application
/// windows and is a straightforward swap behind the same trait.
pub struct GenericBitBltBackend;

impl GenericBitBltBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GenericBitBltBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for GenericBitBltBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::GenericBitBlt
    }

    fn enumerate_windows(&self) -> Result<Vec<WindowHandle>, CaptureError> {
        let screens = screenshots::Screen::all()
            .map_err(|e| CaptureError::Backend(e.to_string()))?;
        Ok(screens
            .into_iter()
            .enumerate()
            .map(|(i, screen)| WindowHandle {
                id: i as u64,
                title: format!("monitor-{i}"),
                bounds: crate::window::Bounds {
                    x: screen.display_info.x,
                    y: screen.display_info.y,
                    w: screen.display_info.width,
                    h: screen.display_info.height,
                },
                visible: true,
                z: 0,
                pid: 0,
            })
            .collect())
    }

    fn capture(&self, handle: &WindowHandle, roi: Option<Roi>) -> Result<Frame, CaptureError> {
        let screens = screenshots::Screen::all()
            .map_err(|e| CaptureError::Backend(e.to_string()))?;
        let screen = screens
            .get(handle.id as usize)
            .ok_or(CaptureError::NotFound)?;
        let image = screen
            .capture()
            .map_err(|e| CaptureError::Backend(e.to_string()))?;
        let t_mono_ns = std::time::Instant::now().elapsed().as_nanos() as u64;
        let frame = Frame {
            pixels: image.rgba().to_vec(),
            width: image.width(),
            height: image.height(),
            stride: image.width() * 4,
            pixel_format: crate::frame::PixelFormat::Rgba8,
            t_mono_ns,
            t_wall: std::time::SystemTime::now(),
            window_id: handle.id,
            monitor_id: handle.id as u32,
        };
        match roi {
            Some(roi) => frame.crop(roi).ok_or(CaptureError::Occluded),
            None => Ok(frame),
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            cross_desktop: false,
            multi_monitor: true,
            hidden_window: false,
            max_fps: 30,
        }
    }
}
