//! Shared drawing helpers for the mode screens.

use embedded_graphics::{
    mono_font::{
        MonoFont, MonoTextStyle,
        ascii::{FONT_6X13, FONT_10X20},
    },
    pixelcolor::Rgb332,
    prelude::*,
    primitives::{Circle, PrimitiveStyle, Rectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};

use crate::canvas::{CENTER_X, CENTER_Y, FrameCanvas};

/// Large caption font (titles, counters).
pub const FONT_LARGE: MonoFont<'static> = FONT_10X20;
/// Body/caption font.
pub const FONT_SMALL: MonoFont<'static> = FONT_6X13;

pub const BG: Rgb332 = Rgb332::BLACK;
pub const TEXT: Rgb332 = Rgb332::WHITE;
pub const RING: Rgb332 = Rgb332::CYAN;
pub const ACCENT: Rgb332 = Rgb332::GREEN;
pub const ALERT: Rgb332 = Rgb332::RED;
pub const DIM: Rgb332 = Rgb332::new(2, 2, 1);
pub const TITLE_ORANGE: Rgb332 = Rgb332::new(7, 5, 0);

/// Draws text centered on the screen's vertical axis, top-anchored at `y`.
pub fn draw_centered(frame: &mut FrameCanvas, font: &MonoFont<'_>, color: Rgb332, text: &str, y: i32) {
    let style = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Top)
        .build();
    let _ = Text::with_text_style(
        text,
        Point::new(CENTER_X, y),
        MonoTextStyle::new(font, color),
        style,
    )
    .draw(frame);
}

/// Draws left-aligned text, top-anchored.
pub fn draw_label(frame: &mut FrameCanvas, font: &MonoFont<'_>, color: Rgb332, text: &str, x: i32, y: i32) {
    let style = TextStyleBuilder::new()
        .alignment(Alignment::Left)
        .baseline(Baseline::Top)
        .build();
    let _ = Text::with_text_style(text, Point::new(x, y), MonoTextStyle::new(font, color), style)
        .draw(frame);
}

/// Clears the screen and shows a centered one- or two-line notice.
pub fn draw_notice(frame: &mut FrameCanvas, line1: &str, line2: Option<&str>) {
    frame.fill(BG);

    let style = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();
    let _ = Text::with_text_style(
        line1,
        Point::new(CENTER_X, 110),
        MonoTextStyle::new(&FONT_SMALL, TEXT),
        style,
    )
    .draw(frame);
    if let Some(line2) = line2 {
        let _ = Text::with_text_style(
            line2,
            Point::new(CENTER_X, 130),
            MonoTextStyle::new(&FONT_SMALL, TEXT),
            style,
        )
        .draw(frame);
    }
}

/// Draws the bezel ring highlighting the round panel shape.
pub fn draw_ring(frame: &mut FrameCanvas) {
    for radius in 118u32..=120 {
        let _ = Circle::with_center(Point::new(CENTER_X, CENTER_Y), radius * 2 + 1)
            .into_styled(PrimitiveStyle::with_stroke(RING, 1))
            .draw(frame);
    }
}

/// Horizontal progress bar with a one-pixel outline.
pub fn draw_progress_bar(frame: &mut FrameCanvas, x: i32, y: i32, w: u32, h: u32, current: u32, total: u32) {
    let _ = Rectangle::new(Point::new(x, y), Size::new(w, h))
        .into_styled(PrimitiveStyle::with_stroke(TEXT, 1))
        .draw(frame);
    if total > 0 {
        let fill = (w.saturating_sub(2)) * current.min(total) / total;
        let _ = Rectangle::new(Point::new(x + 1, y + 1), Size::new(fill, h.saturating_sub(2)))
            .into_styled(PrimitiveStyle::with_fill(RING))
            .draw(frame);
    }
}
