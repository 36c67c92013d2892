/// Raw pixel layout of a captured [`Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb8,
    Bgr8,
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb8 | PixelFormat::Bgr8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Axis-aligned region of interest in window-local pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// A captured frame: pixels plus the timestamps and window/monitor it came
/// from.
///
/// `t_mono_ns` orders frames within a session; `t_wall` is for logging only
/// and must never be used for ordering decisions.
#[derive(Debug, Clone)]
pub struct Frame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub pixel_format: PixelFormat,
    pub t_mono_ns: u64,
    pub t_wall: std::time::SystemTime,
    pub window_id: u64,
    pub monitor_id: u32,
}

impl Frame {
    /// Crops to `roi`, clamping to the frame bounds. Returns `None` if the
    /// resulting region would be empty.
    pub fn crop(&self, roi: Roi) -> Option<Frame> {
        let bpp = self.pixel_format.bytes_per_pixel() as u32;
        let x = roi.x.min(self.width);
        let y = roi.y.min(self.height);
        let w = roi.w.min(self.width.saturating_sub(x));
        let h = roi.h.min(self.height.saturating_sub(y));
        if w == 0 || h == 0 {
            return None;
        }
        let mut pixels = Vec::with_capacity((w * h * bpp) as usize);
        for row in y..y + h {
            let start = (row * self.stride + x * bpp) as usize;
            let end = start + (w * bpp) as usize;
            pixels.extend_from_slice(&self.pixels[start..end]);
        }
        Some(Frame {
            pixels,
            width: w,
            height: h,
            stride: w * bpp,
            pixel_format: self.pixel_format,
            t_mono_ns: self.t_mono_ns,
            t_wall: self.t_wall,
            window_id: self.window_id,
            monitor_id: self.monitor_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(w: u32, h: u32, value: u8) -> Frame {
        Frame {
            pixels: vec![value; (w * h * 3) as usize],
            width: w,
            height: h,
            stride: w * 3,
            pixel_format: PixelFormat::Rgb8,
            t_mono_ns: 0,
            t_wall: std::time::SystemTime::UNIX_EPOCH,
            window_id: 0,
            monitor_id: 0,
        }
    }

    #[test]
    fn crop_clamps_to_bounds() {
        let frame = solid_frame(10, 10, 7);
        let cropped = frame
            .crop(Roi { x: 5, y: 5, w: 20, h: 20 })
            .expect("non-empty crop");
        assert_eq!(cropped.width, 5);
        assert_eq!(cropped.height, 5);
    }

    #[test]
    fn crop_out_of_bounds_is_empty() {
        let frame = solid_frame(10, 10, 7);
        assert!(frame.crop(Roi { x: 10, y: 10, w: 5, h: 5 }).is_none());
    }
}
