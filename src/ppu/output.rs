/*!
Pixel output: where composed PPU pixels go.

The PPU never owns a framebuffer. It hands each visible pixel to a `PixelSink`
borrowed for the duration of the clock call. `FrameBuffer` is the stock sink:
a 256x240 RGBA8 image suitable for uploading to a texture or writing to disk.
*/

/// Screen width in pixels.
pub const NES_WIDTH: usize = 256;
/// Screen height in pixels.
pub const NES_HEIGHT: usize = 240;
/// RGBA bytes per pixel.
pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }
}

/// Receiver for composed pixels. Coordinates are always inside 256x240.
pub trait PixelSink {
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgba);
}

/// Sink that drops everything; useful for headless runs that only need CPU side effects.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSink;

impl PixelSink for NullSink {
    fn set_pixel(&mut self, _x: usize, _y: usize, _color: Rgba) {}
}

#[derive(Clone)]
pub struct FrameBuffer {
    data: Vec<u8>,
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &NES_WIDTH)
            .field("height", &NES_HEIGHT)
            .finish()
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            data: vec![0; NES_WIDTH * NES_HEIGHT * BYTES_PER_PIXEL],
        }
    }

    /// Row-major RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= NES_WIDTH || y >= NES_HEIGHT {
            return None;
        }
        let i = (y * NES_WIDTH + x) * BYTES_PER_PIXEL;
        Some(Rgba {
            r: self.data[i],
            g: self.data[i + 1],
            b: self.data[i + 2],
            a: self.data[i + 3],
        })
    }

    /// Copy into an RGBA8 frame of the same size (e.g. a `pixels` surface).
    pub fn copy_to(&self, frame: &mut [u8]) {
        let n = frame.len().min(self.data.len());
        frame[..n].copy_from_slice(&self.data[..n]);
    }

    #[cfg(feature = "screenshot")]
    pub fn save_png(&self, path: impl AsRef<std::path::Path>) -> Result<(), image::ImageError> {
        image::save_buffer(
            path,
            &self.data,
            NES_WIDTH as u32,
            NES_HEIGHT as u32,
            image::ColorType::Rgba8,
        )
    }
}

impl PixelSink for FrameBuffer {
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: Rgba) {
        if x >= NES_WIDTH || y >= NES_HEIGHT {
            return;
        }
        let i = (y * NES_WIDTH + x) * BYTES_PER_PIXEL;
        self.data[i..i + BYTES_PER_PIXEL].copy_from_slice(&[color.r, color.g, color.b, color.a]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_buffer_stores_rgba() {
        let mut fb = FrameBuffer::new();
        assert_eq!(fb.as_bytes().len(), 256 * 240 * 4);
        fb.set_pixel(255, 239, Rgba::rgb(1, 2, 3));
        assert_eq!(fb.pixel(255, 239), Some(Rgba::rgb(1, 2, 3)));
        assert_eq!(fb.pixel(256, 0), None);
        let tail = &fb.as_bytes()[fb.as_bytes().len() - 4..];
        assert_eq!(tail, &[1, 2, 3, 0xFF]);
    }

    #[test]
    fn out_of_range_pixels_are_ignored() {
        let mut fb = FrameBuffer::new();
        fb.set_pixel(300, 10, Rgba::rgb(9, 9, 9));
        assert!(fb.as_bytes().iter().all(|&b| b == 0));
    }
}
