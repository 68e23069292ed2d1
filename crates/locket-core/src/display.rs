//! Display output abstraction.

use crate::canvas::FrameCanvas;

/// Sink accepting finished frames for the physical panel.
pub trait DisplaySink {
    type Error: core::fmt::Debug;

    /// Transfers the whole frame canvas to the panel.
    fn push_frame(&mut self, frame: &FrameCanvas) -> Result<(), Self::Error>;
}

/// Discarding sink used by tests and desktop bring-up; counts pushes so
/// redraw behavior stays observable.
#[derive(Default, Debug)]
pub struct NullSink {
    pub frames_pushed: u32,
}

impl NullSink {
    pub const fn new() -> Self {
        Self { frames_pushed: 0 }
    }
}

impl DisplaySink for NullSink {
    type Error = core::convert::Infallible;

    fn push_frame(&mut self, _frame: &FrameCanvas) -> Result<(), Self::Error> {
        self.frames_pushed += 1;
        Ok(())
    }
}
