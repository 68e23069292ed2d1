//! Command-level protocol helpers for the GC9A01.

/// Panel width in pixels.
pub const WIDTH: usize = 240;
/// Panel height in pixels.
pub const HEIGHT: usize = 240;
/// Bytes per pixel on the wire (RGB565, big-endian).
pub const BYTES_PER_PIXEL: usize = 2;

/// Software reset.
pub const CMD_SWRESET: u8 = 0x01;
/// Sleep out.
pub const CMD_SLPOUT: u8 = 0x11;
/// Display inversion on (the panel expects inverted RGB565).
pub const CMD_INVON: u8 = 0x21;
/// Display on.
pub const CMD_DISPON: u8 = 0x29;
/// Column address set.
pub const CMD_CASET: u8 = 0x2A;
/// Row address set.
pub const CMD_RASET: u8 = 0x2B;
/// Memory write.
pub const CMD_RAMWR: u8 = 0x2C;
/// Tearing-effect line on.
pub const CMD_TEON: u8 = 0x35;
/// Memory access control.
pub const CMD_MADCTL: u8 = 0x36;
/// Pixel format set.
pub const CMD_COLMOD: u8 = 0x3A;

/// MADCTL BGR channel-order bit.
pub const MADCTL_BGR: u8 = 0x08;
/// COLMOD value for 16-bit color.
pub const COLMOD_16BPP: u8 = 0x05;

/// One step of the power-on sequence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InitOp {
    /// Command byte plus parameter bytes.
    Cmd(u8, &'static [u8]),
    DelayMs(u32),
}

/// Power-on register sequence.
///
/// The 0x80..0x8F and 0x62..0x74 writes are undocumented Galaxycore tuning
/// registers carried over from the vendor reference code; the panel shows
/// visible artifacts without them.
pub const INIT_SEQUENCE: &[InitOp] = &[
    // Inter-register access unlock.
    InitOp::Cmd(0xEF, &[]),
    InitOp::Cmd(0xEB, &[0x14]),
    InitOp::Cmd(0xFE, &[]),
    InitOp::Cmd(0xEF, &[]),
    InitOp::Cmd(0xEB, &[0x14]),
    InitOp::Cmd(0x84, &[0x40]),
    InitOp::Cmd(0x85, &[0xFF]),
    InitOp::Cmd(0x86, &[0xFF]),
    InitOp::Cmd(0x87, &[0xFF]),
    InitOp::Cmd(0x88, &[0x0A]),
    InitOp::Cmd(0x89, &[0x21]),
    InitOp::Cmd(0x8A, &[0x00]),
    InitOp::Cmd(0x8B, &[0x80]),
    InitOp::Cmd(0x8C, &[0x01]),
    InitOp::Cmd(0x8D, &[0x01]),
    InitOp::Cmd(0x8E, &[0xFF]),
    InitOp::Cmd(0x8F, &[0xFF]),
    // Display function control.
    InitOp::Cmd(0xB6, &[0x00, 0x20]),
    InitOp::Cmd(0x90, &[0x08, 0x08, 0x08, 0x08]),
    InitOp::Cmd(0xBD, &[0x06]),
    InitOp::Cmd(0xBC, &[0x00]),
    InitOp::Cmd(0xFF, &[0x60, 0x01, 0x04]),
    // Power control.
    InitOp::Cmd(0xC3, &[0x13]),
    InitOp::Cmd(0xC4, &[0x13]),
    InitOp::Cmd(0xC9, &[0x22]),
    InitOp::Cmd(0xBE, &[0x11]),
    InitOp::Cmd(0xE1, &[0x10, 0x0E]),
    InitOp::Cmd(0xDF, &[0x21, 0x0C, 0x02]),
    // Gamma.
    InitOp::Cmd(0xF0, &[0x45, 0x09, 0x08, 0x08, 0x26, 0x2A]),
    InitOp::Cmd(0xF1, &[0x43, 0x70, 0x72, 0x36, 0x37, 0x6F]),
    InitOp::Cmd(0xF2, &[0x45, 0x09, 0x08, 0x08, 0x26, 0x2A]),
    InitOp::Cmd(0xF3, &[0x43, 0x70, 0x72, 0x36, 0x37, 0x6F]),
    InitOp::Cmd(0xED, &[0x1B, 0x0B]),
    InitOp::Cmd(0xAE, &[0x77]),
    InitOp::Cmd(0xCD, &[0x63]),
    InitOp::Cmd(0x70, &[0x07, 0x07, 0x04, 0x0E, 0x0F, 0x09, 0x07, 0x08, 0x03]),
    InitOp::Cmd(0xE8, &[0x34]),
    // Source/gate timing.
    InitOp::Cmd(0x62, &[0x18, 0x0D, 0x71, 0xED, 0x70, 0x70, 0x18, 0x0F, 0x71, 0xEF, 0x70, 0x70]),
    InitOp::Cmd(0x63, &[0x18, 0x11, 0x71, 0xF1, 0x70, 0x70, 0x18, 0x13, 0x71, 0xF3, 0x70, 0x70]),
    InitOp::Cmd(0x64, &[0x28, 0x29, 0xF1, 0x01, 0xF1, 0x00, 0x07]),
    InitOp::Cmd(0x66, &[0x3C, 0x00, 0xCD, 0x67, 0x45, 0x45, 0x10, 0x00, 0x00, 0x00]),
    InitOp::Cmd(0x67, &[0x00, 0x3C, 0x00, 0x00, 0x00, 0x01, 0x54, 0x10, 0x32, 0x98]),
    InitOp::Cmd(0x74, &[0x10, 0x85, 0x80, 0x00, 0x00, 0x4E, 0x00]),
    InitOp::Cmd(0x98, &[0x3E, 0x07]),
    InitOp::Cmd(CMD_TEON, &[0x00]),
    InitOp::Cmd(CMD_INVON, &[]),
    InitOp::Cmd(CMD_SLPOUT, &[]),
    InitOp::DelayMs(120),
    InitOp::Cmd(CMD_DISPON, &[]),
    InitOp::DelayMs(20),
];

/// Encodes a CASET/RASET parameter block for an inclusive pixel range.
///
/// Returns `None` when the range is inverted or exceeds the panel.
#[inline]
pub fn encode_address_range(start: u16, end: u16, extent: usize) -> Option<[u8; 4]> {
    if start > end || end as usize >= extent {
        return None;
    }

    let s = start.to_be_bytes();
    let e = end.to_be_bytes();
    Some([s[0], s[1], e[0], e[1]])
}

/// Column window parameters (CASET).
#[inline]
pub fn encode_column_window(x0: u16, x1: u16) -> Option<[u8; 4]> {
    encode_address_range(x0, x1, WIDTH)
}

/// Row window parameters (RASET).
#[inline]
pub fn encode_row_window(y0: u16, y1: u16) -> Option<[u8; 4]> {
    encode_address_range(y0, y1, HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_ranges_encode_big_endian_inclusive_bounds() {
        assert_eq!(encode_column_window(0, 239), Some([0x00, 0x00, 0x00, 0xEF]));
        assert_eq!(encode_row_window(16, 43), Some([0x00, 0x10, 0x00, 0x2B]));
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        assert_eq!(encode_column_window(10, 9), None);
        assert_eq!(encode_column_window(0, 240), None);
        assert_eq!(encode_row_window(240, 240), None);
    }

    #[test]
    fn init_sequence_wakes_then_enables_the_panel() {
        let position = |cmd: u8| {
            INIT_SEQUENCE
                .iter()
                .position(|op| matches!(op, InitOp::Cmd(c, _) if *c == cmd))
        };

        let slpout = position(CMD_SLPOUT).unwrap();
        let dispon = position(CMD_DISPON).unwrap();
        assert!(slpout < dispon);

        // Sleep-out must be followed by a settle delay before display-on.
        assert!(matches!(INIT_SEQUENCE[slpout + 1], InitOp::DelayMs(ms) if ms >= 120));
    }
}
