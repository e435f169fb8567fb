use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::classes::ClassCatalog;
use crate::collection::BoxCollection;
use crate::detector::Detector;
use crate::editor::{Action, Direction, EditorState, Mode, PointerEvent};
use crate::format::{AnnotationStore, FormatError, LoadSource};
use crate::frontend::InputEvent;
use crate::geometry;
use crate::images::DisplayImage;
use crate::palette::ClassPalette;
use crate::render::{self, LabelFont, Labels, Overlay};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Moved past the last image
    Finished,
    /// Cancel key
    Cancelled,
    /// Window closed
    Closed,
}

/// Result of feeding one event to an image session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Navigate(Direction),
    Exit(ExitReason),
}

/// One image's boxes and editor state, live while the image is on screen.
#[derive(Debug)]
pub struct ImageSession {
    path: PathBuf,
    image: DisplayImage,
    boxes: BoxCollection,
    state: EditorState,
    source: LoadSource,
    /// Rubber band of the drag in progress
    preview: Option<geometry::PixelBox>,
    saves: usize,
}

impl ImageSession {
    /// Load the annotations for `path` and start editing.
    ///
    /// The detector is only consulted when no annotation file was found.
    pub fn open(
        path: &Path,
        image: DisplayImage,
        store: &AnnotationStore,
        detector: Option<&mut Box<dyn Detector>>,
        num_classes: u32,
        active_class: u32,
    ) -> Self {
        let (width, height) = (image.width(), image.height());
        let loaded = store.load_records(path);
        let mut boxes: Vec<geometry::PixelBox> = loaded
            .records
            .iter()
            .map(|record| geometry::to_pixel(record, width, height))
            .collect();

        if let (LoadSource::Empty, Some(detector)) = (&loaded.source, detector) {
            match detector.detect(&image) {
                Ok(proposed) => {
                    log::info!("Detector proposed {} boxes for {:?}", proposed.len(), path);
                    boxes = proposed;
                }
                Err(e) => log::warn!("{}", e),
            }
        }

        log::info!("Opened {:?} ({}x{}, {} boxes)", path, width, height, boxes.len());

        Self {
            path: path.to_path_buf(),
            image,
            boxes: BoxCollection::from_boxes(boxes),
            state: EditorState::new(num_classes).with_active_class(active_class),
            source: loaded.source,
            preview: None,
            saves: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn boxes(&self) -> &BoxCollection {
        &self.boxes
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn source(&self) -> &LoadSource {
        &self.source
    }

    /// Number of successful saves while this image was open.
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Apply one input event. Completed edits are saved right away.
    pub fn handle(&mut self, event: InputEvent, store: &AnnotationStore) -> Step {
        let action = match event {
            InputEvent::Key(key) => self.state.on_key(&mut self.boxes, key),
            InputEvent::Pointer(pointer) => {
                if matches!(pointer, PointerEvent::Press { .. }) && self.preview.take().is_some() {
                    self.state.request_redraw();
                }
                self.state.on_pointer(&mut self.boxes, pointer)
            }
            InputEvent::Closed => Action::Exit,
        };

        if self.state.mode() != Mode::Drawing && self.preview.take().is_some() {
            self.state.request_redraw();
        }

        if self.state.is_dirty() && self.save(store).is_err() {
            log::debug!("Keeping {:?} dirty, retrying on the next event", self.path);
        }

        match action {
            Action::Continue => Step::Continue,
            Action::Preview(bbox) => {
                self.preview = Some(bbox);
                self.state.request_redraw();
                Step::Continue
            }
            Action::Navigate(direction) => Step::Navigate(direction),
            Action::Exit => Step::Exit(match event {
                InputEvent::Closed => ExitReason::Closed,
                _ => ExitReason::Cancelled,
            }),
        }
    }

    /// Write the current boxes and clear `dirty` on success.
    pub fn save(&mut self, store: &AnnotationStore) -> Result<PathBuf, FormatError> {
        match store.save(
            &self.path,
            self.boxes.as_slice(),
            self.image.width(),
            self.image.height(),
        ) {
            Ok(target) => {
                self.state.mark_saved();
                self.saves += 1;
                Ok(target)
            }
            Err(e) => {
                log::error!("Failed to save annotations for {:?}: {}", self.path, e);
                Err(e)
            }
        }
    }

    /// Save outstanding edits before the image is left.
    pub fn flush(&mut self, store: &AnnotationStore) -> Result<(), FormatError> {
        self.state.abandon(&mut self.boxes);
        if self.state.is_dirty() {
            self.save(store)?;
        }
        Ok(())
    }

    /// Compose a new frame if anything changed since the last one.
    ///
    /// Boxes are labelled with their class names when a font is given.
    pub fn render(
        &mut self,
        palette: &ClassPalette,
        catalog: &ClassCatalog,
        font: Option<&LabelFont>,
    ) -> Option<RgbaImage> {
        if !self.state.take_redraw() {
            return None;
        }
        let overlay = Overlay {
            boxes: self.boxes.as_slice(),
            selected: self.state.selected(),
            mode: self.state.mode(),
            preview: self.preview,
            labels: font.map(|font| Labels {
                catalog,
                font,
                active_class: self.state.active_class(),
            }),
        };
        Some(render::compose(&self.image.pixels, &overlay, palette))
    }

    /// Window title: image path, active class and any typed class id.
    pub fn title(&self, catalog: &ClassCatalog) -> String {
        let mut title = format!(
            "{} | class {}",
            self.path.display(),
            catalog.label(self.state.active_class())
        );
        if self.state.mode() == Mode::EditingId {
            title.push_str(&format!(" | id: {}_", self.state.id_entry()));
        }
        title
    }
}
