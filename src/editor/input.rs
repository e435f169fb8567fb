//! Abstract input events understood by the editor.
//!
//! Frontends translate their own key codes and mouse events into these;
//! see `keybindings` for the configurable key mapping.

use crate::geometry::{PixelBox, Point};

/// Direction of travel through the image list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Keyboard commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    PreviousImage,
    NextImage,
    PreviousClass,
    NextClass,
    NewBox,
    /// Delete the selected box, or the last typed digit while editing an id
    DeleteSelected,
    /// End the whole session
    Cancel,
    /// A digit typed while editing a class id (0-9)
    Digit(u8),
    /// Commit a typed class id
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Left button: select, draw
    Primary,
    /// Right button: edit or swap class ids
    Secondary,
}

/// Pointer events in displayed-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Press { button: PointerButton, at: Point },
    Move { at: Point },
    Release { button: PointerButton, at: Point },
}

impl PointerEvent {
    pub fn press(button: PointerButton, x: i32, y: i32) -> Self {
        Self::Press {
            button,
            at: Point::new(x, y),
        }
    }

    pub fn moved(x: i32, y: i32) -> Self {
        Self::Move {
            at: Point::new(x, y),
        }
    }

    pub fn release(button: PointerButton, x: i32, y: i32) -> Self {
        Self::Release {
            button,
            at: Point::new(x, y),
        }
    }
}

/// What the session has to do after the editor handled an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep processing events for this image.
    Continue,
    /// Show a rubber-band rectangle; no state changed.
    Preview(PixelBox),
    /// Leave this image and move the cursor.
    Navigate(Direction),
    /// End the session.
    Exit,
}
