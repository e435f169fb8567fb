//! The ordered box list of the image on screen.

use crate::geometry::{PixelBox, Point};

/// Boxes of one image in append order.
///
/// Order matters twice: it is the order records are written in, and hit
/// testing returns the earliest box containing a point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxCollection {
    boxes: Vec<PixelBox>,
}

impl BoxCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_boxes(boxes: Vec<PixelBox>) -> Self {
        Self { boxes }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PixelBox> {
        self.boxes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PixelBox> {
        self.boxes.iter()
    }

    pub fn as_slice(&self) -> &[PixelBox] {
        &self.boxes
    }

    /// Index of the first box, in collection order, containing the point.
    pub fn hit_test(&self, point: Point) -> Option<usize> {
        self.boxes.iter().position(|bbox| bbox.contains(point))
    }

    /// Append a box and return its index.
    pub fn append(&mut self, bbox: PixelBox) -> usize {
        self.boxes.push(bbox);
        self.boxes.len() - 1
    }

    /// Remove the box at `index`, shifting later boxes down.
    ///
    /// Any selection at or above `index` is stale afterwards; clearing it is
    /// the caller's job.
    pub fn remove_at(&mut self, index: usize) -> Option<PixelBox> {
        (index < self.boxes.len()).then(|| self.boxes.remove(index))
    }

    /// Replace the box at `index`, returning the previous one.
    pub fn replace_at(&mut self, index: usize, bbox: PixelBox) -> Option<PixelBox> {
        self.boxes
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, bbox))
    }

    /// Set the class label of the box at `index`. Returns false if out of range.
    pub fn set_class(&mut self, index: usize, class_id: u32) -> bool {
        match self.boxes.get_mut(index) {
            Some(bbox) => {
                bbox.class_id = class_id;
                true
            }
            None => false,
        }
    }

    /// Exchange the class labels of two boxes. Returns false if either index
    /// is out of range.
    pub fn swap_classes(&mut self, a: usize, b: usize) -> bool {
        let (Some(class_a), Some(class_b)) = (
            self.boxes.get(a).map(|bbox| bbox.class_id),
            self.boxes.get(b).map(|bbox| bbox.class_id),
        ) else {
            return false;
        };
        self.boxes[a].class_id = class_b;
        self.boxes[b].class_id = class_a;
        true
    }

    pub fn into_vec(self) -> Vec<PixelBox> {
        self.boxes
    }
}
