use crate::editor::Direction;

/// Position in the image list.
///
/// Moving back from the first image stays on it; moving forward from the
/// last image leaves the list, which ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageCursor {
    index: usize,
    len: usize,
}

impl ImageCursor {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current index, `None` once the cursor has left the list.
    pub fn current(&self) -> Option<usize> {
        (self.index < self.len).then_some(self.index)
    }

    /// Move one image in `direction`. Returns the new index, or `None` when
    /// the move left the end of the list.
    pub fn advance(&mut self, direction: Direction) -> Option<usize> {
        match direction {
            Direction::Previous => self.index = self.index.saturating_sub(1),
            Direction::Next => self.index = self.index.saturating_add(1).min(self.len),
        }
        self.current()
    }
}
