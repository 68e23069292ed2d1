//! Gamma lookup tables for linear-light blending.
//!
//! The panel stores gamma-encoded channel values (5/6 bits in the RGB565
//! scratch canvas, 3/3/2 bits in the RGB332 frame canvas). Averaging those
//! directly under-represents brightness, so the compositor converts to
//! 16-bit linear intensity, accumulates there, and converts back. Tables
//! are built once at startup and read-only afterwards.

use libm::powf;

/// Display gamma exponent.
const GAMMA: f32 = 2.2;

/// Full-scale linear intensity.
pub const LINEAR_MAX: u16 = u16::MAX;

pub struct GammaTables {
    /// 5-bit gamma channel -> 16-bit linear.
    to_linear5: [u16; 32],
    /// 6-bit gamma channel -> 16-bit linear.
    to_linear6: [u16; 64],
    /// 3-bit gamma channel -> 16-bit linear.
    to_linear3: [u16; 8],
    /// 2-bit gamma channel -> 16-bit linear.
    to_linear2: [u16; 4],
    /// High byte of 16-bit linear -> 3-bit gamma.
    from_linear3: [u8; 256],
    /// High byte of 16-bit linear -> 2-bit gamma.
    from_linear2: [u8; 256],
}

fn encode_table<const N: usize>(max_code: u16) -> [u16; N] {
    let mut table = [0u16; N];
    for (code, slot) in table.iter_mut().enumerate() {
        let normalized = code as f32 / max_code as f32;
        *slot = (powf(normalized, GAMMA) * LINEAR_MAX as f32 + 0.5) as u16;
    }
    table
}

fn decode_table(max_code: u16) -> [u8; 256] {
    let mut table = [0u8; 256];
    for (index, slot) in table.iter_mut().enumerate() {
        // Sample the middle of the 256-wide linear bucket.
        let linear = (index as f32 + 0.5) / 256.0;
        let encoded = powf(linear, 1.0 / GAMMA) * max_code as f32;
        *slot = (encoded + 0.5) as u8;
    }
    table
}

impl GammaTables {
    pub fn new() -> Self {
        Self {
            to_linear5: encode_table::<32>(31),
            to_linear6: encode_table::<64>(63),
            to_linear3: encode_table::<8>(7),
            to_linear2: encode_table::<4>(3),
            from_linear3: decode_table(7),
            from_linear2: decode_table(3),
        }
    }

    /// Linearizes a 5-bit gamma-encoded channel.
    #[inline]
    pub fn linear5(&self, code: u8) -> u16 {
        self.to_linear5[(code & 0x1F) as usize]
    }

    /// Linearizes a 6-bit gamma-encoded channel.
    #[inline]
    pub fn linear6(&self, code: u8) -> u16 {
        self.to_linear6[(code & 0x3F) as usize]
    }

    /// Linearizes a 3-bit gamma-encoded channel.
    #[inline]
    pub fn linear3(&self, code: u8) -> u16 {
        self.to_linear3[(code & 0x07) as usize]
    }

    /// Linearizes a 2-bit gamma-encoded channel.
    #[inline]
    pub fn linear2(&self, code: u8) -> u16 {
        self.to_linear2[(code & 0x03) as usize]
    }

    /// Re-encodes a 16-bit linear intensity as a 3-bit gamma channel.
    #[inline]
    pub fn encode3(&self, linear: u16) -> u8 {
        self.from_linear3[(linear >> 8) as usize]
    }

    /// Re-encodes a 16-bit linear intensity as a 2-bit gamma channel.
    #[inline]
    pub fn encode2(&self, linear: u16) -> u8 {
        self.from_linear2[(linear >> 8) as usize]
    }
}

impl Default for GammaTables {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_tables_cover_full_linear_range() {
        let t = GammaTables::new();

        assert_eq!(t.linear5(0), 0);
        assert_eq!(t.linear5(31), LINEAR_MAX);
        assert_eq!(t.linear6(0), 0);
        assert_eq!(t.linear6(63), LINEAR_MAX);
        assert_eq!(t.linear3(0), 0);
        assert_eq!(t.linear3(7), LINEAR_MAX);
        assert_eq!(t.linear2(0), 0);
        assert_eq!(t.linear2(3), LINEAR_MAX);
    }

    #[test]
    fn encode_tables_are_strictly_monotonic() {
        let t = GammaTables::new();

        for code in 1u8..32 {
            assert!(t.linear5(code) > t.linear5(code - 1));
        }
        for code in 1u8..64 {
            assert!(t.linear6(code) > t.linear6(code - 1));
        }
    }

    #[test]
    fn low_codes_map_to_dim_linear_values() {
        // Gamma 2.2 compresses the low end hard: half-scale input is well
        // under a quarter of full linear intensity.
        let t = GammaTables::new();
        assert!(t.linear5(16) < LINEAR_MAX / 4);
        assert!(t.linear3(3) < LINEAR_MAX / 4);
    }

    #[test]
    fn inverse_tables_round_trip_every_destination_code() {
        let t = GammaTables::new();

        for code in 0u8..8 {
            assert_eq!(t.encode3(t.linear3(code)), code, "3-bit code {code}");
        }
        for code in 0u8..4 {
            assert_eq!(t.encode2(t.linear2(code)), code, "2-bit code {code}");
        }
    }

    #[test]
    fn inverse_tables_are_monotonic() {
        let t = GammaTables::new();

        for index in 1usize..256 {
            assert!(t.from_linear3[index] >= t.from_linear3[index - 1]);
            assert!(t.from_linear2[index] >= t.from_linear2[index - 1]);
        }
        assert_eq!(t.encode3(LINEAR_MAX), 7);
        assert_eq!(t.encode2(LINEAR_MAX), 3);
    }
}
