//! Failure taxonomy shared by the modes.
//!
//! Every failure is handled where it occurs and degrades to an on-screen
//! notice; nothing here propagates far enough to halt the device.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModeError {
    /// The durable storage layer failed to initialize.
    StorageUnavailable,
    /// The content folder is empty or unreadable.
    NoDocuments,
    /// A listed path could not be read at load time.
    DocumentOpenFailed,
    /// A render target could not be provided at bring-up.
    RenderTargetAllocationFailed,
}

impl core::fmt::Display for ModeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            Self::StorageUnavailable => "storage unavailable",
            Self::NoDocuments => "no documents",
            Self::DocumentOpenFailed => "document open failed",
            Self::RenderTargetAllocationFailed => "render target allocation failed",
        };
        f.write_str(text)
    }
}
