//! Panel sink: streams the RGB332 frame canvas to the GC9A01.

use embedded_hal::{digital::OutputPin, spi::SpiDevice};
use gc9a01::{Config, Gc9a01};
use locket_core::canvas::{FrameCanvas, SCREEN_H, SCREEN_W};
use locket_core::display::DisplaySink;

/// Bytes of one RGB565 scanline on the wire.
const ROW_BYTES: usize = SCREEN_W * 2;

/// Expands a 3-bit channel to 5 bits by bit replication.
const fn expand3_to_5(c: u8) -> u16 {
    ((c << 2) | (c >> 1)) as u16
}

/// Expands a 3-bit channel to 6 bits.
const fn expand3_to_6(c: u8) -> u16 {
    ((c << 3) | c) as u16
}

/// Expands a 2-bit channel to 5 bits.
const fn expand2_to_5(c: u8) -> u16 {
    ((c << 3) | (c << 1) | (c >> 1)) as u16
}

/// RGB332 byte -> RGB565 word, bit-replicated so full-scale maps to
/// full-scale.
const fn expand_332(byte: u8) -> u16 {
    let r = (byte >> 5) & 0x07;
    let g = (byte >> 2) & 0x07;
    let b = byte & 0x03;
    (expand3_to_5(r) << 11) | (expand3_to_6(g) << 5) | expand2_to_5(b)
}

const fn build_expand_lut() -> [u16; 256] {
    let mut lut = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        lut[i] = expand_332(i as u8);
        i += 1;
    }
    lut
}

/// RGB332 -> RGB565 expansion table, built at compile time.
static EXPAND_LUT: [u16; 256] = build_expand_lut();

pub struct PanelDisplay<SPI, DC, RST>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
    RST: OutputPin,
{
    driver: Gc9a01<SPI, DC, RST>,
    row_buf: [u8; ROW_BYTES],
}

impl<SPI, DC, RST> PanelDisplay<SPI, DC, RST>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
    RST: OutputPin,
{
    /// Wraps an initialized panel driver.
    pub fn new(spi: SPI, dc: DC, rst: RST, config: Config) -> Self {
        Self {
            driver: Gc9a01::new(spi, dc, rst, config),
            row_buf: [0u8; ROW_BYTES],
        }
    }

    pub fn driver_mut(&mut self) -> &mut Gc9a01<SPI, DC, RST> {
        &mut self.driver
    }

    /// Runs the panel power-on sequence.
    pub fn init(
        &mut self,
        delay: &mut impl embedded_hal::delay::DelayNs,
    ) -> Result<(), gc9a01::Error<SPI::Error, DC::Error, RST::Error>> {
        self.driver.init(delay)
    }
}

impl<SPI, DC, RST> DisplaySink for PanelDisplay<SPI, DC, RST>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
    RST: OutputPin,
    SPI::Error: core::fmt::Debug,
    DC::Error: core::fmt::Debug,
    RST::Error: core::fmt::Debug,
{
    type Error = gc9a01::Error<SPI::Error, DC::Error, RST::Error>;

    fn push_frame(&mut self, frame: &FrameCanvas) -> Result<(), Self::Error> {
        self.driver
            .set_window(0, 0, (SCREEN_W - 1) as u16, (SCREEN_H - 1) as u16)?;
        self.driver.begin_pixels()?;

        for y in 0..SCREEN_H {
            // Rows always exist; the canvas height is fixed.
            let Some(row) = frame.row(y) else {
                break;
            };
            for (source, out) in row.iter().zip(self.row_buf.chunks_exact_mut(2)) {
                let word = EXPAND_LUT[*source as usize];
                out.copy_from_slice(&word.to_be_bytes());
            }
            self.driver.write_pixels(&self.row_buf)?;
        }
        Ok(())
    }
}
