//! Scrolling poem reader.
//!
//! Documents live as `.md` files in `/poems` on internal flash. Each one is
//! laid out once ([`layout`]), then scrolled continuously; visible lines are
//! rendered through the sub-pixel compositor ([`compositor`]) so the curved
//! left margin tracks the round bezel smoothly. When a poem has scrolled
//! past its end the reader rotates to the next one and persists the
//! position, so the device picks up where it left off after power loss.

pub mod compositor;
pub mod layout;

#[cfg(test)]
mod tests;

use embedded_graphics::{
    mono_font::MonoTextStyle,
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{PrimitiveStyle, Triangle},
    text::{Baseline, Text, TextStyleBuilder},
};
use heapless::{String, Vec};
use libm::{fabsf, floorf, sqrtf};
use log::{info, warn};

use crate::canvas::{LineCanvas, SCREEN_H, SCREEN_W, text_width};
use crate::error::ModeError;
use crate::gamma::GammaTables;
use crate::input::Button;
use crate::render::{self, BG, FONT_LARGE, FONT_SMALL};
use crate::shell::{Mode, Platform, Services};
use crate::storage::{EntryKind, PATH_BYTES, Volume, join_path};

use compositor::blit_line;
use layout::{BODY_LINE_H, DisplayLine, LineKind, MAX_POEM_BYTES, PoemLayout, TITLE_BODY_GAP, layout_document};

/// Folder scanned for poem documents.
pub const POEMS_FOLDER: &str = "/poems";
/// Maximum documents tracked per scan.
pub const MAX_POEMS: usize = 16;

const NAMESPACE: &str = "poems";

/// Bezel radius used for the curved left margin, with a small margin.
const EDGE_RADIUS: f32 = 114.0;
/// Indent added inside the circle edge.
const EDGE_INSET: f32 = 6.0;
/// Horizontal offset of wrap-continuation text behind its indicator.
const WRAP_TEXT_INDENT: u32 = 12;

const TITLE_COLOR: Rgb565 = Rgb565::new(31, 45, 0);
const BODY_COLOR: Rgb565 = Rgb565::WHITE;
const INDICATOR_COLOR: Rgb565 = Rgb565::new(15, 31, 15);

/// Scroll tuning. The defaults match the shipped behavior; both knobs are
/// tuned constants without a documented derivation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollConfig {
    /// Pixels advanced per throttled tick.
    pub step_px: f32,
    /// Extra travel past the ceiling before rotating documents.
    pub overshoot_px: i32,
    /// Minimum milliseconds between scroll advances.
    pub frame_interval_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            step_px: 0.4,
            overshoot_px: 80,
            frame_interval_ms: 16,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Playback {
    /// No documents to show; a notice is on screen.
    Idle,
    Displaying,
}

pub struct PoemsMode {
    config: ScrollConfig,
    paths: Vec<String<PATH_BYTES>, MAX_POEMS>,
    current: usize,
    layout: PoemLayout,
    scroll_y: f32,
    last_frame_ms: u64,
    state: Playback,
    error: Option<ModeError>,
    scratch: Option<LineCanvas>,
    tables: GammaTables,
}

impl PoemsMode {
    /// `scratch` is the compositor's line render target; without it the
    /// mode falls back to direct integer-position rendering.
    pub fn new(config: ScrollConfig, scratch: Option<LineCanvas>) -> Self {
        Self {
            config,
            paths: Vec::new(),
            current: 0,
            layout: PoemLayout::empty(),
            scroll_y: 0.0,
            last_frame_ms: 0,
            state: Playback::Idle,
            error: None,
            scratch,
            tables: GammaTables::new(),
        }
    }

    pub fn document_count(&self) -> usize {
        self.paths.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_path(&self) -> Option<&str> {
        self.paths.get(self.current).map(|p| p.as_str())
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_y
    }

    pub fn layout(&self) -> &PoemLayout {
        &self.layout
    }

    pub fn last_error(&self) -> Option<ModeError> {
        self.error
    }

    #[cfg(test)]
    pub(crate) fn inject_layout(&mut self, layout: PoemLayout) {
        self.layout = layout;
        self.scroll_y = 0.0;
    }

    fn scan_documents<P: Platform>(&mut self, svc: &mut Services<'_, P>) -> Result<(), ModeError> {
        self.paths.clear();

        if !svc.platform.internal().is_ready() {
            return Err(ModeError::StorageUnavailable);
        }

        let listing = svc
            .platform
            .internal()
            .list_dir(POEMS_FOLDER)
            .map_err(|_| ModeError::NoDocuments)?;
        for entry in &listing {
            if entry.name.starts_with('.') || entry.kind != EntryKind::Document {
                continue;
            }
            let Some(path) = join_path(POEMS_FOLDER, entry.name.as_str()) else {
                continue;
            };
            if self.paths.push(path).is_err() {
                break;
            }
        }

        if self.paths.is_empty() {
            return Err(ModeError::NoDocuments);
        }

        self.paths.sort_unstable();
        Ok(())
    }

    fn load_current<P: Platform>(&mut self, svc: &mut Services<'_, P>, now_ms: u64) {
        self.layout = PoemLayout::empty();
        self.scroll_y = 0.0;
        self.last_frame_ms = now_ms;
        self.error = None;

        let Some(path) = self.paths.get(self.current) else {
            return;
        };

        let mut raw = [0u8; MAX_POEM_BYTES];
        match svc.platform.internal().read(path.as_str(), 0, &mut raw) {
            Ok(len) => {
                self.layout = layout_document(&raw[..len]);
                info!(
                    "poems: loaded \"{}\" ({} display lines)",
                    self.layout.title, self.layout.lines.len()
                );
            }
            Err(error) => {
                warn!("poems: cannot open {path}: {error:?}");
                self.error = Some(ModeError::DocumentOpenFailed);
            }
        }
    }

    fn persist<P: Platform>(&mut self, svc: &mut Services<'_, P>) {
        svc.persist_index(NAMESPACE, self.current);
    }

    fn step_document<P: Platform>(&mut self, svc: &mut Services<'_, P>, delta: i32, now_ms: u64) {
        let count = self.paths.len() as i32;
        self.current = (self.current as i32 + delta).rem_euclid(count) as usize;
        self.persist(svc);
        self.load_current(svc, now_ms);
    }

    fn draw<P: Platform>(&mut self, svc: &mut Services<'_, P>) {
        match self.error {
            Some(ModeError::StorageUnavailable) => {
                render::draw_notice(svc.frame, "Storage not", Some("available"));
            }
            Some(ModeError::NoDocuments) => {
                render::draw_notice(svc.frame, "No poems found", Some("Add .md to /poems"));
            }
            Some(ModeError::DocumentOpenFailed) => {
                render::draw_notice(svc.frame, "Cannot open", Some("poem file"));
            }
            Some(ModeError::RenderTargetAllocationFailed) | None => {
                self.render_document(svc);
            }
        }
        svc.present();
    }

    fn render_document<P: Platform>(&mut self, svc: &mut Services<'_, P>) {
        svc.frame.fill(BG);

        let mut y = self.layout.top_pad as f32 - self.scroll_y;
        let mut past_title = false;

        for line in self.layout.lines.iter() {
            if !past_title && line.kind != LineKind::Title {
                y += TITLE_BODY_GAP as f32;
                past_title = true;
            }

            let row_h = line.kind.row_height();
            let y_top = floorf(y) as i32;
            if y_top + row_h < 0 {
                y += row_h as f32;
                continue;
            }
            if y_top >= SCREEN_H as i32 {
                break;
            }

            let x = match line.kind {
                LineKind::Title => {
                    let width = text_width(&FONT_LARGE, line.text.as_str()) as i32;
                    ((SCREEN_W as i32 - width) / 2).max(0) as f32
                }
                LineKind::Body | LineKind::WrapContinuation => left_edge(y),
            };

            match self.scratch.as_mut() {
                Some(scratch) => {
                    let (src_w, src_h) = render_line_into(scratch, line);
                    blit_line(svc.frame, scratch, src_w, src_h, x, y_top, &self.tables);
                }
                None => draw_line_direct(svc.frame, line, floorf(x + 0.5) as i32, y_top),
            }

            y += row_h as f32;
        }
    }
}

impl Mode for PoemsMode {
    fn name(&self) -> &'static str {
        "Poems"
    }

    fn enter<P: Platform>(&mut self, svc: &mut Services<'_, P>, now_ms: u64) {
        self.current = 0;
        self.state = Playback::Idle;
        self.error = None;

        if self.scratch.is_none() {
            // Compositor disabled for this session; lines draw at integer
            // positions instead.
            warn!("poems: no line canvas, sub-pixel rendering disabled");
            self.error = Some(ModeError::RenderTargetAllocationFailed);
        }

        if let Err(error) = self.scan_documents(svc) {
            self.error = Some(error);
            self.draw(svc);
            return;
        }

        self.current = svc.restore_index(NAMESPACE, self.paths.len());
        info!(
            "poems: found {} poems, resuming at {}",
            self.paths.len(),
            self.current + 1
        );

        let degraded = self.error;
        self.load_current(svc, now_ms);
        self.error = self.error.or(degraded);
        self.state = Playback::Displaying;
        self.draw(svc);
    }

    fn update<P: Platform>(&mut self, svc: &mut Services<'_, P>, now_ms: u64) {
        if self.state != Playback::Displaying || self.layout.is_empty() {
            return;
        }

        let ceiling = self.layout.scroll_ceiling();
        if ceiling <= 0 {
            return;
        }

        if now_ms.saturating_sub(self.last_frame_ms) < self.config.frame_interval_ms {
            return;
        }
        self.last_frame_ms = now_ms;

        self.scroll_y += self.config.step_px;

        if self.scroll_y > (ceiling + self.config.overshoot_px) as f32 {
            self.step_document(svc, 1, now_ms);
        }

        self.draw(svc);
    }

    fn on_button<P: Platform>(&mut self, svc: &mut Services<'_, P>, button: Button, now_ms: u64) {
        if self.paths.is_empty() {
            return;
        }

        let delta = match button {
            Button::Bottom => 1,
            Button::Top => -1,
        };
        self.step_document(svc, delta, now_ms);
        self.draw(svc);
    }
}

/// Left edge of the circular display at a given row top, evaluated in f32
/// so the indent moves through sub-pixel positions while scrolling.
/// Extrapolates linearly beyond the circle so text slides off smoothly.
fn left_edge(row_top: f32) -> f32 {
    let mid = row_top + BODY_LINE_H as f32 / 2.0;
    let dy = fabsf(mid - SCREEN_H as f32 / 2.0);
    if dy >= EDGE_RADIUS {
        SCREEN_W as f32 / 2.0 + (dy - EDGE_RADIUS) * 2.0
    } else {
        SCREEN_W as f32 / 2.0 - sqrtf(EDGE_RADIUS * EDGE_RADIUS - dy * dy) + EDGE_INSET
    }
}

/// Renders one display line into the scratch canvas at position zero.
/// Returns the occupied (width, height) to blit.
fn render_line_into(scratch: &mut LineCanvas, line: &DisplayLine) -> (u32, u32) {
    scratch.fill(Rgb565::BLACK);

    let top_style = TextStyleBuilder::new().baseline(Baseline::Top).build();
    match line.kind {
        LineKind::Title => {
            let _ = Text::with_text_style(
                line.text.as_str(),
                Point::zero(),
                MonoTextStyle::new(&FONT_LARGE, TITLE_COLOR),
                top_style,
            )
            .draw(scratch);
            (
                text_width(&FONT_LARGE, line.text.as_str()),
                FONT_LARGE.character_size.height,
            )
        }
        LineKind::Body => {
            let _ = Text::with_text_style(
                line.text.as_str(),
                Point::zero(),
                MonoTextStyle::new(&FONT_SMALL, BODY_COLOR),
                top_style,
            )
            .draw(scratch);
            (line.pixel_width as u32, FONT_SMALL.character_size.height)
        }
        LineKind::WrapContinuation => {
            let _ = Triangle::new(Point::new(0, 3), Point::new(0, 9), Point::new(4, 6))
                .into_styled(PrimitiveStyle::with_fill(INDICATOR_COLOR))
                .draw(scratch);
            let _ = Text::with_text_style(
                line.text.as_str(),
                Point::new(WRAP_TEXT_INDENT as i32, 0),
                MonoTextStyle::new(&FONT_SMALL, BODY_COLOR),
                top_style,
            )
            .draw(scratch);
            (
                line.pixel_width as u32 + WRAP_TEXT_INDENT,
                FONT_SMALL.character_size.height,
            )
        }
    }
}

/// Degraded path when no scratch canvas exists: draw straight into the
/// RGB332 frame at whole-pixel positions.
fn draw_line_direct(frame: &mut crate::canvas::FrameCanvas, line: &DisplayLine, x: i32, y: i32) {
    use crate::canvas::rgb565_to_332;

    match line.kind {
        LineKind::Title => {
            render::draw_label(frame, &FONT_LARGE, rgb565_to_332(TITLE_COLOR), line.text.as_str(), x, y);
        }
        LineKind::Body => {
            render::draw_label(frame, &FONT_SMALL, rgb565_to_332(BODY_COLOR), line.text.as_str(), x, y);
        }
        LineKind::WrapContinuation => {
            let _ = Triangle::new(
                Point::new(x, y + 3),
                Point::new(x, y + 9),
                Point::new(x + 4, y + 6),
            )
            .into_styled(PrimitiveStyle::with_fill(rgb565_to_332(INDICATOR_COLOR)))
            .draw(frame);
            render::draw_label(
                frame,
                &FONT_SMALL,
                rgb565_to_332(BODY_COLOR),
                line.text.as_str(),
                x + WRAP_TEXT_INDENT as i32,
                y,
            );
        }
    }
}
