//! Sub-pixel line compositor.
//!
//! Text lines render into the RGB565 scratch canvas at integer position
//! zero, then blend into the RGB332 frame canvas at a fractional X so the
//! curved left margin glides instead of snapping pixel to pixel. A source
//! pixel at a fractional offset straddles two destination columns, so its
//! intensity is split between them by weight. The split must happen in
//! linear light: averaging gamma-encoded values under-represents
//! brightness. Background (black) source pixels are skipped entirely so
//! stacked lines compose in the same frame.

use embedded_graphics::pixelcolor::{Rgb332, Rgb565};
use embedded_graphics::prelude::*;
use libm::floorf;

use crate::canvas::{FrameCanvas, LineCanvas, SCREEN_H, SCREEN_W, rgb565_to_332};
use crate::gamma::{GammaTables, LINEAR_MAX};

/// Sub-pixel weight resolution.
pub const SUBPIXEL_STEPS: u32 = 256;
/// Remainders below this weight take the direct-copy path.
const FAST_PATH_WEIGHT: u32 = 2;

/// Linear-light channel triple.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct LinearRgb {
    r: u32,
    g: u32,
    b: u32,
}

fn linearize_565(tables: &GammaTables, color: Rgb565) -> LinearRgb {
    LinearRgb {
        r: tables.linear5(color.r()) as u32,
        g: tables.linear6(color.g()) as u32,
        b: tables.linear5(color.b()) as u32,
    }
}

fn linearize_332(tables: &GammaTables, color: Rgb332) -> LinearRgb {
    LinearRgb {
        r: tables.linear3(color.r()) as u32,
        g: tables.linear3(color.g()) as u32,
        b: tables.linear2(color.b()) as u32,
    }
}

fn encode_332(tables: &GammaTables, linear: LinearRgb) -> Rgb332 {
    Rgb332::new(
        tables.encode3(linear.r.min(LINEAR_MAX as u32) as u16),
        tables.encode3(linear.g.min(LINEAR_MAX as u32) as u16),
        tables.encode2(linear.b.min(LINEAR_MAX as u32) as u16),
    )
}

/// Blits the top-left `src_w` x `src_h` region of the scratch canvas into
/// the frame at fractional `x`, integer `y`.
///
/// Rows outside the frame are skipped per-row, columns per-pixel; there is
/// no wraparound.
pub fn blit_line(
    frame: &mut FrameCanvas,
    scratch: &LineCanvas,
    src_w: u32,
    src_h: u32,
    x: f32,
    y: i32,
    tables: &GammaTables,
) {
    let base = floorf(x);
    let base_x = base as i32;
    let weight_right = ((x - base) * SUBPIXEL_STEPS as f32) as u32;

    if weight_right < FAST_PATH_WEIGHT {
        blit_direct(frame, scratch, src_w, src_h, base_x, y);
    } else {
        blit_blended(frame, scratch, src_w, src_h, base_x, y, weight_right, tables);
    }
}

/// Whole-pixel path: per-pixel 5/6/5 -> 3/3/2 truncation copy.
fn blit_direct(
    frame: &mut FrameCanvas,
    scratch: &LineCanvas,
    src_w: u32,
    src_h: u32,
    base_x: i32,
    y: i32,
) {
    for sy in 0..src_h {
        let dy = y + sy as i32;
        if dy < 0 || dy >= SCREEN_H as i32 {
            continue;
        }
        for sx in 0..src_w {
            let Some(color) = scratch.pixel(sx as usize, sy as usize) else {
                break;
            };
            if color == Rgb565::BLACK {
                continue;
            }
            let dx = base_x + sx as i32;
            if dx < 0 || dx >= SCREEN_W as i32 {
                continue;
            }
            frame.set_pixel(dx as usize, dy as usize, rgb565_to_332(color));
        }
    }
}

/// Fractional path: accumulate weighted linear intensity into both
/// straddled destination columns.
fn blit_blended(
    frame: &mut FrameCanvas,
    scratch: &LineCanvas,
    src_w: u32,
    src_h: u32,
    base_x: i32,
    y: i32,
    weight_right: u32,
    tables: &GammaTables,
) {
    let weight_left = SUBPIXEL_STEPS - weight_right;

    for sy in 0..src_h {
        let dy = y + sy as i32;
        if dy < 0 || dy >= SCREEN_H as i32 {
            continue;
        }
        for sx in 0..src_w {
            let Some(color) = scratch.pixel(sx as usize, sy as usize) else {
                break;
            };
            if color == Rgb565::BLACK {
                continue;
            }

            let source = linearize_565(tables, color);
            for (offset, weight) in [(0i32, weight_left), (1, weight_right)] {
                let dx = base_x + sx as i32 + offset;
                if dx < 0 || dx >= SCREEN_W as i32 {
                    continue;
                }

                let Some(existing) = frame.pixel(dx as usize, dy as usize) else {
                    continue;
                };
                let dst = linearize_332(tables, existing);
                let mixed = LinearRgb {
                    r: dst.r + (source.r * weight >> 8),
                    g: dst.g + (source.g * weight >> 8),
                    b: dst.b + (source.b * weight >> 8),
                };
                frame.set_pixel(dx as usize, dy as usize, encode_332(tables, mixed));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> GammaTables {
        GammaTables::new()
    }

    fn scratch_with(pixels: &[(usize, usize, Rgb565)]) -> LineCanvas {
        let mut scratch = LineCanvas::new();
        for &(x, y, color) in pixels {
            assert!(scratch.set_pixel(x, y, color));
        }
        scratch
    }

    #[test]
    fn zero_offset_blit_matches_direct_truncation() {
        let t = tables();
        let scratch = scratch_with(&[
            (0, 0, Rgb565::WHITE),
            (3, 1, Rgb565::new(31, 45, 0)),
            (7, 2, Rgb565::new(9, 20, 11)),
        ]);

        let mut frame = FrameCanvas::new();
        blit_line(&mut frame, &scratch, 8, 3, 37.0, 10, &t);

        assert_eq!(frame.pixel(37, 10), Some(rgb565_to_332(Rgb565::WHITE)));
        assert_eq!(frame.pixel(40, 11), Some(rgb565_to_332(Rgb565::new(31, 45, 0))));
        assert_eq!(frame.pixel(44, 12), Some(rgb565_to_332(Rgb565::new(9, 20, 11))));
        // Background stayed untouched.
        assert_eq!(frame.pixel(38, 10), Some(Rgb332::BLACK));
    }

    #[test]
    fn negligible_remainder_takes_the_fast_path() {
        let t = tables();
        let scratch = scratch_with(&[(0, 0, Rgb565::new(17, 33, 9))]);

        let mut exact = FrameCanvas::new();
        let mut nudged = FrameCanvas::new();
        blit_line(&mut exact, &scratch, 1, 1, 20.0, 0, &t);
        blit_line(&mut nudged, &scratch, 1, 1, 20.004, 0, &t);

        assert_eq!(exact.bytes(), nudged.bytes());
    }

    #[test]
    fn half_pixel_offset_splits_intensity_across_both_columns() {
        let t = tables();
        let scratch = scratch_with(&[(0, 0, Rgb565::WHITE)]);

        let mut frame = FrameCanvas::new();
        blit_line(&mut frame, &scratch, 1, 1, 10.5, 0, &t);

        let left = frame.pixel(10, 0).unwrap();
        let right = frame.pixel(11, 0).unwrap();
        assert_eq!(left, right);
        // Half the linear intensity of white lands well above half-code.
        assert!(left.r() >= 4 && left.r() < 7);
        assert_eq!(frame.pixel(9, 0), Some(Rgb332::BLACK));
        assert_eq!(frame.pixel(12, 0), Some(Rgb332::BLACK));
    }

    #[test]
    fn blended_writes_accumulate_toward_full_intensity() {
        let t = tables();
        let scratch = scratch_with(&[(0, 0, Rgb565::WHITE)]);

        let mut frame = FrameCanvas::new();
        blit_line(&mut frame, &scratch, 1, 1, 10.5, 0, &t);
        blit_line(&mut frame, &scratch, 1, 1, 10.5, 0, &t);

        // Two half-weight deposits saturate back to white.
        assert_eq!(frame.pixel(10, 0), Some(Rgb332::WHITE));
        assert_eq!(frame.pixel(11, 0), Some(Rgb332::WHITE));
    }

    #[test]
    fn background_source_pixels_never_touch_the_destination() {
        let t = tables();
        let scratch = LineCanvas::new();

        let mut frame = FrameCanvas::new();
        frame.fill(Rgb332::new(3, 2, 1));
        blit_line(&mut frame, &scratch, 40, 4, 5.5, 5, &t);

        assert!(frame.bytes().iter().all(|&b| b == Rgb332::new(3, 2, 1).into_storage()));
    }

    #[test]
    fn rows_and_columns_outside_the_frame_are_clamped() {
        let t = tables();
        let mut scratch = LineCanvas::new();
        for x in 0..8 {
            scratch.set_pixel(x, 0, Rgb565::WHITE);
            scratch.set_pixel(x, 1, Rgb565::WHITE);
        }

        let mut frame = FrameCanvas::new();
        // Top rows above the frame, right edge past column 239.
        blit_line(&mut frame, &scratch, 8, 2, 236.5, -1, &t);

        // Row -1 skipped, row 0 kept; columns clamp at the right edge
        // without wrapping to the next row.
        assert_ne!(frame.pixel(237, 0), Some(Rgb332::BLACK));
        assert_ne!(frame.pixel(239, 0), Some(Rgb332::BLACK));
        assert_eq!(frame.pixel(0, 0), Some(Rgb332::BLACK));
        assert_eq!(frame.pixel(0, 1), Some(Rgb332::BLACK));

        // Fully below the frame: nothing drawn.
        let mut below = FrameCanvas::new();
        blit_line(&mut below, &scratch, 8, 2, 10.5, SCREEN_H as i32, &t);
        assert!(below.bytes().iter().all(|&b| b == 0));
    }
}
