//! Display and input collaborator.
//!
//! The session never talks to a window system directly. It asks a
//! [`Frontend`] for pending input and hands it composed frames; the native
//! window in [`crate::native`] is one implementation, the scripted frontend
//! in the session tests is another.

use std::time::Duration;

use image::RgbaImage;

use crate::editor::{EditorKey, PointerEvent};

/// One input event, already translated into editor terms.
///
/// Pointer coordinates are in displayed-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(EditorKey),
    Pointer(PointerEvent),
    /// The window was closed by the user
    Closed,
}

/// A composed frame ready for display.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Image with the box overlay drawn in
    pub pixels: &'a RgbaImage,
    /// Window title
    pub title: &'a str,
}

/// Errors raised by a frontend.
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error("Event loop error: {0}")]
    EventLoop(String),

    #[error("Window error: {0}")]
    Window(String),

    #[error("Render error: {0}")]
    Render(String),
}

/// Source of input and sink for frames.
///
/// Both calls happen on the session thread, one after the other.
pub trait Frontend {
    /// Wait at most `timeout` for input and return everything that arrived,
    /// in order. An empty vector means the wait timed out.
    fn poll_events(&mut self, timeout: Duration) -> Result<Vec<InputEvent>, FrontendError>;

    /// Show a frame.
    fn present(&mut self, frame: &Frame<'_>) -> Result<(), FrontendError>;
}
