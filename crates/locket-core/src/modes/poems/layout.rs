//! Text layout engine for the poem reader.
//!
//! Turns raw document bytes into pre-wrapped, pre-measured display lines
//! plus the vertical metrics the scroll controller needs. Layout runs once
//! per document load; rendering reuses the cached lines every tick.

use heapless::{String, Vec};

use crate::canvas::{SCREEN_H, text_width};
use crate::render::FONT_SMALL;

/// Raw document size ceiling; longer content is truncated.
pub const MAX_POEM_BYTES: usize = 2048;
/// Maximum display lines per document; extras are silently dropped.
pub const MAX_LINES: usize = 128;
/// Maximum visible characters per display line.
pub const LINE_CHARS: usize = 33;
/// Byte capacity backing one display line.
pub const LINE_BYTES: usize = 64;
/// Title wrap column, narrower than body.
pub const TITLE_WRAP: usize = 16;
/// Body wrap column.
pub const BODY_WRAP: usize = 32;

/// Title row height in pixels.
pub const TITLE_LINE_H: i32 = 28;
/// Body/continuation row height in pixels.
pub const BODY_LINE_H: i32 = 20;
/// Gap inserted once at the title -> body transition.
pub const TITLE_BODY_GAP: i32 = 20;
/// Minimum top padding so short titles clear the bezel.
pub const TOP_PAD_MIN: i32 = 20;
/// Trailing pad letting the last line scroll to screen center.
pub const TRAILING_PAD: i32 = 120;

const FALLBACK_TITLE: &str = "Untitled";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineKind {
    Title,
    Body,
    WrapContinuation,
}

impl LineKind {
    pub const fn row_height(self) -> i32 {
        match self {
            Self::Title => TITLE_LINE_H,
            Self::Body | Self::WrapContinuation => BODY_LINE_H,
        }
    }
}

/// One pre-wrapped, pre-measured display line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DisplayLine {
    pub text: String<LINE_BYTES>,
    pub kind: LineKind,
    /// Rendered width in pixels; 0 for titles, which center at render time.
    pub pixel_width: u16,
}

/// Layout output for one document.
pub struct PoemLayout {
    pub title: String<LINE_BYTES>,
    pub lines: Vec<DisplayLine, MAX_LINES>,
    pub top_pad: i32,
    pub total_height: i32,
}

impl PoemLayout {
    pub const fn empty() -> Self {
        Self {
            title: String::new(),
            lines: Vec::new(),
            top_pad: 0,
            total_height: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Highest scroll offset before the document counts as fully read.
    pub fn scroll_ceiling(&self) -> i32 {
        self.total_height - SCREEN_H as i32
    }
}

/// Lays out one document from its raw bytes.
pub fn layout_document(raw: &[u8]) -> PoemLayout {
    let text = truncate_utf8(raw, MAX_POEM_BYTES);
    let mut layout = PoemLayout::empty();

    let (title, body) = split_title(text);
    let _ = layout.title.push_str(truncate_chars(title, LINE_CHARS));

    wrap_into(&mut layout.lines, title, TITLE_WRAP, LineKind::Title, LineKind::Title);

    let title_block = layout.lines.len() as i32 * TITLE_LINE_H;
    layout.top_pad = ((SCREEN_H as i32 - title_block) / 2).max(TOP_PAD_MIN);

    if !body.is_empty() {
        let drop_trailing = body.ends_with('\n');
        let segment_count = body.split('\n').count();
        for (index, line) in body.split('\n').enumerate() {
            if drop_trailing && index + 1 == segment_count {
                break;
            }
            let line = line.strip_suffix('\r').unwrap_or(line);
            wrap_into(&mut layout.lines, line, BODY_WRAP, LineKind::Body, LineKind::WrapContinuation);
        }
    }

    layout.total_height = total_height(layout.top_pad, &layout.lines);
    layout
}

fn total_height(top_pad: i32, lines: &[DisplayLine]) -> i32 {
    let mut height = top_pad;
    let mut past_title = false;
    for line in lines {
        if !past_title && line.kind != LineKind::Title {
            height += TITLE_BODY_GAP;
            past_title = true;
        }
        height += line.kind.row_height();
    }
    height + TRAILING_PAD
}

/// Splits a leading `"# "` heading off the document.
///
/// Returns the title text (fallback when no heading) and the body remainder.
/// Blank lines between heading and body are swallowed.
fn split_title(text: &str) -> (&str, &str) {
    let Some(after_marker) = text.strip_prefix("# ") else {
        return (FALLBACK_TITLE, text);
    };

    match after_marker.find('\n') {
        Some(newline) => {
            let title = after_marker[..newline].strip_suffix('\r').unwrap_or(&after_marker[..newline]);
            let body = after_marker[newline + 1..].trim_start_matches(['\r', '\n']);
            (title, body)
        }
        None => (after_marker.strip_suffix('\r').unwrap_or(after_marker), ""),
    }
}

/// Word-wraps `text` at `max_chars` columns into display lines.
///
/// Breaks at the last space at or before the column boundary; with no space
/// in range the break is hard, exactly at the boundary. Spaces after a break
/// are skipped. Lines beyond [`MAX_LINES`] are dropped.
fn wrap_into(
    lines: &mut Vec<DisplayLine, MAX_LINES>,
    text: &str,
    max_chars: usize,
    first: LineKind,
    continuation: LineKind,
) {
    if text.is_empty() {
        push_line(lines, "", first);
        return;
    }

    let mut rest = text;
    let mut kind = first;
    while !rest.is_empty() {
        let Some(boundary) = byte_offset_of_char(rest, max_chars) else {
            push_line(lines, rest, kind);
            break;
        };

        let cut = if rest[boundary..].starts_with(' ') {
            boundary
        } else {
            match rest[..boundary].rfind(' ') {
                Some(at) if at > 0 => at,
                _ => boundary,
            }
        };

        push_line(lines, &rest[..cut], kind);
        rest = rest[cut..].trim_start_matches(' ');
        kind = continuation;
    }
}

fn push_line(lines: &mut Vec<DisplayLine, MAX_LINES>, text: &str, kind: LineKind) {
    let mut line = DisplayLine {
        text: String::new(),
        kind,
        pixel_width: 0,
    };
    let _ = line.text.push_str(truncate_chars(text, LINE_CHARS));
    if kind != LineKind::Title {
        line.pixel_width = text_width(&FONT_SMALL, line.text.as_str()) as u16;
    }
    let _ = lines.push(line);
}

/// Byte offset of the character at index `n`, `None` when the string is
/// at most `n` characters long.
fn byte_offset_of_char(text: &str, n: usize) -> Option<usize> {
    text.char_indices().nth(n).map(|(offset, _)| offset)
}

/// Longest prefix of at most `max_chars` characters.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match byte_offset_of_char(text, max_chars) {
        Some(offset) => &text[..offset],
        None => text,
    }
}

/// Longest valid UTF-8 prefix of at most `max_bytes` bytes.
fn truncate_utf8(raw: &[u8], max_bytes: usize) -> &str {
    let raw = &raw[..raw.len().min(max_bytes)];
    match core::str::from_utf8(raw) {
        Ok(text) => text,
        Err(error) => {
            // Safe: valid_up_to marks the end of the last complete sequence.
            core::str::from_utf8(&raw[..error.valid_up_to()]).unwrap_or("")
        }
    }
}
