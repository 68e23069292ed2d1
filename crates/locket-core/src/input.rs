//! Input abstraction layer.

/// The two physical buttons beside the bezel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Button {
    Bottom,
    Top,
}

/// Debounced button actions delivered to the shell.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ButtonEvent {
    /// Quick press and release; routed to the active mode.
    Short(Button),
    /// Press held past the long-press threshold; switches modes.
    Long(Button),
}

/// Polled input provider.
pub trait InputProvider {
    type Error;

    fn poll_event(&mut self, now_ms: u64) -> Result<Option<ButtonEvent>, Self::Error>;
}

/// No-hardware input source used during bring-up.
#[derive(Default, Debug, Clone, Copy)]
pub struct NullInput;

impl NullInput {
    pub const fn new() -> Self {
        Self
    }
}

impl InputProvider for NullInput {
    type Error = core::convert::Infallible;

    fn poll_event(&mut self, _now_ms: u64) -> Result<Option<ButtonEvent>, Self::Error> {
        Ok(None)
    }
}
