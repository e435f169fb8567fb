//! Session controller.
//!
//! A [`Session`] walks the image list. For each image it decodes the raster,
//! loads the boxes through the annotation store, and runs the editor until
//! the user moves to another image or ends the session. Edits are written as
//! soon as they complete; anything still unsaved is flushed when the image
//! is left.

mod controller;
mod cursor;
mod image_session;

#[cfg(test)]
mod tests;

pub use controller::{Session, SessionError, SessionSummary};
pub use cursor::ImageCursor;
pub use image_session::{ExitReason, ImageSession, Step};
