//! Interaction state for the image on screen.

use crate::collection::BoxCollection;
use crate::editor::input::{Action, Direction, EditorKey, PointerButton, PointerEvent};
use crate::geometry::{PixelBox, Point};

/// Longest class id that can be typed; nine digits always fit in a `u32`.
const MAX_ID_DIGITS: usize = 9;

/// Interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Nothing selected.
    #[default]
    Idle,
    /// One box highlighted.
    BoxSelected,
    /// The selected box is being dragged out.
    Drawing,
    /// A class id is being typed for the selected box.
    EditingId,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Idle => "Idle",
            Mode::BoxSelected => "Selected",
            Mode::Drawing => "Drawing",
            Mode::EditingId => "Editing id",
        }
    }
}

/// Selection, drawing and edit state of one image session.
///
/// Events are applied with [`EditorState::on_key`] and
/// [`EditorState::on_pointer`], which mutate the box collection passed in.
/// `dirty` is set by every completed edit; the owner saves and calls
/// [`EditorState::mark_saved`].
#[derive(Debug, Clone)]
pub struct EditorState {
    selected: Option<usize>,
    mode: Mode,
    active_class: u32,
    num_classes: u32,
    dirty: bool,
    drag_anchor: Option<Point>,
    needs_redraw: bool,
    /// Digits typed in `EditingId` mode.
    id_entry: String,
    /// Index of a box created by `NewBox` that has not been drawn yet.
    pending_new: Option<usize>,
}

impl EditorState {
    /// Create an idle state cycling classes in `[0, num_classes)`.
    pub fn new(num_classes: u32) -> Self {
        Self {
            selected: None,
            mode: Mode::Idle,
            active_class: 0,
            num_classes: num_classes.max(1),
            dirty: false,
            drag_anchor: None,
            // First frame of a fresh image always has to be drawn
            needs_redraw: true,
            id_entry: String::new(),
            pending_new: None,
        }
    }

    /// Start with a given active class (wrapped into range).
    pub fn with_active_class(mut self, class_id: u32) -> Self {
        self.active_class = class_id % self.num_classes;
        self
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn active_class(&self) -> u32 {
        self.active_class
    }

    pub fn num_classes(&self) -> u32 {
        self.num_classes
    }

    pub fn drag_anchor(&self) -> Option<Point> {
        self.drag_anchor
    }

    /// Digits typed so far while editing a class id.
    pub fn id_entry(&self) -> &str {
        &self.id_entry
    }

    /// Check if the collection has edits that are not saved yet.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag after a successful save.
    #[inline]
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    #[inline]
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    #[inline]
    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Return whether a redraw is pending and clear the flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    // ========================================================================
    // Keyboard
    // ========================================================================

    /// Apply a keyboard command.
    pub fn on_key(&mut self, boxes: &mut BoxCollection, key: EditorKey) -> Action {
        match key {
            EditorKey::PreviousClass => {
                self.active_class = if self.active_class == 0 {
                    self.num_classes - 1
                } else {
                    self.active_class - 1
                };
                log::debug!("Active class {}", self.active_class);
                self.request_redraw();
            }
            EditorKey::NextClass => {
                self.active_class = (self.active_class + 1) % self.num_classes;
                log::debug!("Active class {}", self.active_class);
                self.request_redraw();
            }
            EditorKey::NewBox => {
                if self.mode != Mode::Drawing {
                    let index = boxes.append(PixelBox::empty(self.active_class));
                    self.selected = Some(index);
                    self.mode = Mode::Drawing;
                    self.drag_anchor = None;
                    self.id_entry.clear();
                    self.pending_new = Some(index);
                    log::debug!("New box {} with class {}", index, self.active_class);
                    self.request_redraw();
                }
            }
            EditorKey::DeleteSelected => {
                if self.mode == Mode::EditingId {
                    self.id_entry.pop();
                    self.request_redraw();
                } else if let Some(index) = self.selected {
                    boxes.remove_at(index);
                    log::debug!("Deleted box {}", index);
                    self.clear_selection();
                    self.dirty = true;
                }
            }
            EditorKey::PreviousImage => {
                self.abandon(boxes);
                return Action::Navigate(Direction::Previous);
            }
            EditorKey::NextImage => {
                self.abandon(boxes);
                return Action::Navigate(Direction::Next);
            }
            EditorKey::Cancel => return Action::Exit,
            EditorKey::Digit(digit) => {
                if self.mode == Mode::EditingId && digit <= 9 && self.id_entry.len() < MAX_ID_DIGITS
                {
                    self.id_entry.push(char::from(b'0' + digit));
                    self.request_redraw();
                }
            }
            EditorKey::Confirm => {
                if self.mode == Mode::EditingId {
                    self.commit_id_entry(boxes);
                }
            }
        }
        Action::Continue
    }

    // ========================================================================
    // Pointer
    // ========================================================================

    /// Apply a pointer event.
    pub fn on_pointer(&mut self, boxes: &mut BoxCollection, event: PointerEvent) -> Action {
        match event {
            PointerEvent::Press {
                button: PointerButton::Primary,
                at,
            } => self.on_primary_press(boxes, at),
            PointerEvent::Press {
                button: PointerButton::Secondary,
                at,
            } => self.on_secondary_press(boxes, at),
            PointerEvent::Move { at } => return self.preview(boxes, at),
            PointerEvent::Release {
                button: PointerButton::Primary,
                at,
            } => self.on_primary_release(boxes, at),
            PointerEvent::Release {
                button: PointerButton::Secondary,
                ..
            } => {}
        }
        Action::Continue
    }

    fn on_primary_press(&mut self, boxes: &BoxCollection, at: Point) {
        if self.mode == Mode::Drawing || self.selected.is_some() {
            // Start (or restart) dragging out the selected box
            self.drag_anchor = Some(at);
            self.mode = Mode::Drawing;
            self.id_entry.clear();
            self.request_redraw();
        } else if let Some(index) = boxes.hit_test(at) {
            log::debug!("Selected box {}", index);
            self.selected = Some(index);
            self.mode = Mode::BoxSelected;
            self.request_redraw();
        }
    }

    fn preview(&self, boxes: &BoxCollection, at: Point) -> Action {
        if self.mode != Mode::Drawing {
            return Action::Continue;
        }
        match (self.drag_anchor, self.selected) {
            (Some(anchor), Some(index)) => {
                let class_id = boxes
                    .get(index)
                    .map_or(self.active_class, |bbox| bbox.class_id);
                Action::Preview(PixelBox::from_corners(anchor, at, class_id))
            }
            _ => Action::Continue,
        }
    }

    fn on_primary_release(&mut self, boxes: &mut BoxCollection, at: Point) {
        if self.mode != Mode::Drawing {
            return;
        }
        let Some(anchor) = self.drag_anchor else {
            return;
        };

        if let Some(index) = self.selected {
            let class_id = boxes
                .get(index)
                .map_or(self.active_class, |bbox| bbox.class_id);
            let drawn = PixelBox::from_corners(anchor, at, class_id);
            if boxes.replace_at(index, drawn).is_some() {
                log::debug!("Box {} drawn as {:?}", index, drawn);
                self.dirty = true;
            }
        }
        self.clear_selection();
    }

    fn on_secondary_press(&mut self, boxes: &mut BoxCollection, at: Point) {
        if self.mode == Mode::Drawing {
            return;
        }
        let Some(selected) = self.selected else {
            return;
        };

        if boxes.get(selected).is_some_and(|bbox| bbox.contains(at)) {
            self.mode = Mode::EditingId;
            self.id_entry.clear();
            self.request_redraw();
        } else if let Some(other) = boxes.hit_test(at) {
            if boxes.swap_classes(selected, other) {
                log::debug!("Swapped classes of boxes {} and {}", selected, other);
                self.dirty = true;
            }
            self.clear_selection();
        }
    }

    fn commit_id_entry(&mut self, boxes: &mut BoxCollection) {
        if let (Some(index), false) = (self.selected, self.id_entry.is_empty()) {
            match self.id_entry.parse::<u32>() {
                Ok(class_id) => {
                    if boxes.set_class(index, class_id) {
                        log::debug!("Box {} relabelled to {}", index, class_id);
                        self.dirty = true;
                    }
                }
                Err(e) => log::warn!("Ignoring class id '{}': {}", self.id_entry, e),
            }
        }
        self.clear_selection();
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Back to `Idle` with no selection, anchor or pending entry.
    fn clear_selection(&mut self) {
        self.selected = None;
        self.mode = Mode::Idle;
        self.drag_anchor = None;
        self.id_entry.clear();
        self.pending_new = None;
        self.request_redraw();
    }

    /// Drop any gesture in progress before the image is left.
    ///
    /// A box created with `NewBox` but never drawn is removed so it cannot
    /// be persisted as an all-zero record.
    pub fn abandon(&mut self, boxes: &mut BoxCollection) {
        if let Some(index) = self.pending_new {
            boxes.remove_at(index);
        }
        self.clear_selection();
    }
}
