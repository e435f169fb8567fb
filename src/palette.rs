//! Class id to colour mapping for the overlay.

use std::collections::HashMap;

/// RGB colour
pub type Rgb = [u8; 3];

pub const GREEN: Rgb = [0, 200, 0];
pub const RED: Rgb = [200, 0, 0];
pub const MAGENTA: Rgb = [200, 0, 200];
pub const WHITE: Rgb = [255, 255, 255];
pub const ORANGE: Rgb = [255, 165, 0];
pub const BRIGHT_GREEN: Rgb = [0, 255, 0];

/// Colours used to draw boxes.
///
/// Classes without an explicit entry use `unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPalette {
    classes: HashMap<u32, Rgb>,
    pub unknown: Rgb,
    /// Outline of the selected box
    pub selected: Rgb,
    /// Outline of the box whose class id is being typed
    pub editing: Rgb,
    /// Rubber band while drawing
    pub preview: Rgb,
}

impl Default for ClassPalette {
    fn default() -> Self {
        Self {
            classes: HashMap::from([(0, GREEN), (1, RED)]),
            unknown: MAGENTA,
            selected: WHITE,
            editing: ORANGE,
            preview: BRIGHT_GREEN,
        }
    }
}

impl ClassPalette {
    /// A palette with no class entries; every class draws as `unknown`.
    pub fn empty(unknown: Rgb) -> Self {
        Self {
            classes: HashMap::new(),
            unknown,
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class_id: u32, color: Rgb) -> Self {
        self.classes.insert(class_id, color);
        self
    }

    pub fn set_class(&mut self, class_id: u32, color: Rgb) {
        self.classes.insert(class_id, color);
    }

    pub fn color_for(&self, class_id: u32) -> Rgb {
        self.classes.get(&class_id).copied().unwrap_or(self.unknown)
    }

    /// Explicit entries sorted by class id.
    pub fn entries(&self) -> Vec<(u32, Rgb)> {
        let mut entries: Vec<(u32, Rgb)> = self.classes.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }
}
