//! In-memory render targets for the 240x240 round panel.
//!
//! Two canvases exist: the persistent full-screen [`FrameCanvas`] holding
//! RGB332 pixels (what gets pushed to the panel every frame), and the small
//! RGB565 [`LineCanvas`] the poem compositor renders single text lines into
//! before blending them down. Both are plain owned buffers created once and
//! reused; nothing is allocated per frame.

use embedded_graphics::{
    mono_font::MonoFont,
    pixelcolor::{
        Rgb332, Rgb565, Rgb888,
        raw::{RawU8, RawU16},
    },
    prelude::*,
};

/// Panel width in pixels.
pub const SCREEN_W: usize = 240;
/// Panel height in pixels.
pub const SCREEN_H: usize = 240;
/// Scratch line canvas height; tall enough for the tallest text row.
pub const LINE_CANVAS_H: usize = 28;

/// Screen center, useful for the round bezel geometry.
pub const CENTER_X: i32 = (SCREEN_W / 2) as i32;
pub const CENTER_Y: i32 = (SCREEN_H / 2) as i32;

/// Full-screen RGB332 canvas.
pub struct FrameCanvas {
    bytes: [u8; SCREEN_W * SCREEN_H],
}

impl FrameCanvas {
    pub const fn new() -> Self {
        Self {
            bytes: [0u8; SCREEN_W * SCREEN_H],
        }
    }

    /// Fills the whole canvas with one color.
    pub fn fill(&mut self, color: Rgb332) {
        self.bytes.fill(color.into_storage());
    }

    /// Sets a pixel. Returns `true` when the pixel is in bounds.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb332) -> bool {
        if x >= SCREEN_W || y >= SCREEN_H {
            return false;
        }
        self.bytes[y * SCREEN_W + x] = color.into_storage();
        true
    }

    /// Reads a pixel.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb332> {
        if x >= SCREEN_W || y >= SCREEN_H {
            return None;
        }
        Some(Rgb332::from(RawU8::new(self.bytes[y * SCREEN_W + x])))
    }

    /// Raw row-major RGB332 bytes, one byte per pixel.
    pub fn bytes(&self) -> &[u8; SCREEN_W * SCREEN_H] {
        &self.bytes
    }

    /// One row of raw pixel bytes.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= SCREEN_H {
            return None;
        }
        Some(&self.bytes[y * SCREEN_W..(y + 1) * SCREEN_W])
    }
}

impl Default for FrameCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for FrameCanvas {
    fn size(&self) -> Size {
        Size::new(SCREEN_W as u32, SCREEN_H as u32)
    }
}

impl DrawTarget for FrameCanvas {
    type Color = Rgb332;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as usize, point.y as usize, color);
            }
        }
        Ok(())
    }
}

/// Scratch RGB565 canvas for one rendered text line.
pub struct LineCanvas {
    pixels: [u16; SCREEN_W * LINE_CANVAS_H],
}

impl LineCanvas {
    pub const fn new() -> Self {
        Self {
            pixels: [0u16; SCREEN_W * LINE_CANVAS_H],
        }
    }

    /// Fills the whole canvas with one color.
    pub fn fill(&mut self, color: Rgb565) {
        self.pixels.fill(color.into_storage());
    }

    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb565) -> bool {
        if x >= SCREEN_W || y >= LINE_CANVAS_H {
            return false;
        }
        self.pixels[y * SCREEN_W + x] = color.into_storage();
        true
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb565> {
        if x >= SCREEN_W || y >= LINE_CANVAS_H {
            return None;
        }
        Some(Rgb565::from(RawU16::new(self.pixels[y * SCREEN_W + x])))
    }
}

impl Default for LineCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for LineCanvas {
    fn size(&self) -> Size {
        Size::new(SCREEN_W as u32, LINE_CANVAS_H as u32)
    }
}

impl DrawTarget for LineCanvas {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as usize, point.y as usize, color);
            }
        }
        Ok(())
    }
}

/// Truncates RGB565 channels to the RGB332 layout (5->3, 6->3, 5->2 bits).
#[inline]
pub fn rgb565_to_332(color: Rgb565) -> Rgb332 {
    Rgb332::new(color.r() >> 2, color.g() >> 3, color.b() >> 3)
}

/// Truncates RGB888 channels to the RGB332 layout.
#[inline]
pub fn rgb888_to_332(color: Rgb888) -> Rgb332 {
    Rgb332::new(color.r() >> 5, color.g() >> 5, color.b() >> 6)
}

/// Rendered width of `text` in a monospaced font.
pub fn text_width(font: &MonoFont<'_>, text: &str) -> u32 {
    let glyph = font.character_size.width + font.character_spacing;
    text.chars().count() as u32 * glyph
}
