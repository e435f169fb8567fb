//! Editor state machine.
//!
//! Keyboard and pointer events for the image on screen are dispatched to an
//! [`EditorState`], which mutates the image's [`BoxCollection`] and reports
//! back an [`Action`] for the session controller.
//!
//! ## Modes
//!
//! - **Idle**: a primary press selects the first box under the pointer.
//! - **BoxSelected**: a primary press starts redrawing the selected box; a
//!   secondary press inside it starts class-id entry, inside another box
//!   swaps the two class ids.
//! - **Drawing**: dragging with the primary button; release writes the
//!   rectangle into the selected box.
//! - **EditingId**: digits, delete and confirm edit the selected box's id.
//!
//! [`BoxCollection`]: crate::collection::BoxCollection

mod input;
mod state;


pub use input::{Action, Direction, EditorKey, PointerButton, PointerEvent};
pub use state::{EditorState, Mode};
