use std::time::Duration;

use crate::classes::ClassCatalog;
use crate::constants;
use crate::detector::Detector;
use crate::editor::Direction;
use crate::format::{AnnotationStore, FormatError};
use crate::frontend::{Frame, Frontend, FrontendError};
use crate::images::{ImageError, ImageList, ImageSource};
use crate::palette::ClassPalette;
use crate::render::LabelFont;
use crate::session::cursor::ImageCursor;
use crate::session::image_session::{ExitReason, ImageSession, Step};

/// Errors that end a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Annotation store error: {0}")]
    Store(#[from] FormatError),

    #[error("Frontend error: {0}")]
    Frontend(#[from] FrontendError),
}

/// What happened during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Images opened for editing (revisits included)
    pub opened: usize,
    /// Annotation files written
    pub saved: usize,
    /// Images skipped because they could not be decoded
    pub skipped: usize,
    pub exit: ExitReason,
}

/// Walks the image list, one [`ImageSession`] per image on screen.
pub struct Session<F, S> {
    images: ImageList,
    store: AnnotationStore,
    catalog: ClassCatalog,
    palette: ClassPalette,
    poll_interval: Duration,
    detector: Option<Box<dyn Detector>>,
    label_font: Option<LabelFont>,
    frontend: F,
    source: S,
}

impl<F: Frontend, S: ImageSource> Session<F, S> {
    pub fn new(images: ImageList, store: AnnotationStore, frontend: F, source: S) -> Self {
        Self {
            images,
            store,
            catalog: ClassCatalog::numeric(constants::DEFAULT_CLASS_COUNT),
            palette: ClassPalette::default(),
            poll_interval: Duration::from_millis(constants::DEFAULT_POLL_INTERVAL_MS),
            detector: None,
            label_font: LabelFont::embedded()
                .map_err(|e| log::warn!("Box labels disabled: {}", e))
                .ok(),
            frontend,
            source,
        }
    }

    pub fn with_catalog(mut self, catalog: ClassCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_palette(mut self, palette: ClassPalette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_detector(mut self, detector: Box<dyn Detector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// Run until the user cancels, closes the window or moves past the last
    /// image.
    pub fn run(&mut self) -> Result<SessionSummary, SessionError> {
        self.store.prepare()?;

        let mut cursor = ImageCursor::new(self.images.len());
        let mut direction = Direction::Next;
        let mut active_class = 0;
        let mut summary = SessionSummary {
            opened: 0,
            saved: 0,
            skipped: 0,
            exit: ExitReason::Finished,
        };

        while let Some(index) = cursor.current() {
            let Some(path) = self.images.get(index).map(|p| p.to_path_buf()) else {
                break;
            };

            let image = match self.source.load(&path) {
                Ok(image) => image,
                Err(e) if self.images.is_directory_scan() => {
                    log::warn!("Skipping {:?}: {}", path, e);
                    summary.skipped += 1;
                    // Nothing before the first image; keep going forward
                    if direction == Direction::Previous && index == 0 {
                        direction = Direction::Next;
                    }
                    cursor.advance(direction);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let mut session = ImageSession::open(
                &path,
                image,
                &self.store,
                self.detector.as_mut(),
                self.catalog.count(),
                active_class,
            );
            summary.opened += 1;

            let step = self.edit(&mut session);
            active_class = session.state().active_class();
            let step = match step {
                Ok(step) => step,
                Err(e) => {
                    summary.saved += session.saves();
                    return Err(e);
                }
            };

            match step {
                Step::Navigate(dir) => {
                    if let Err(e) = session.flush(&self.store) {
                        log::error!("Unsaved edits for {:?} are lost: {}", path, e);
                    }
                    summary.saved += session.saves();
                    direction = dir;
                    cursor.advance(dir);
                }
                Step::Exit(reason) => {
                    summary.saved += session.saves();
                    summary.exit = reason;
                    log::info!("Session ended: {:?}", reason);
                    return Ok(summary);
                }
                Step::Continue => {}
            }
        }

        log::info!("Reached the end of the image list");
        Ok(summary)
    }

    /// Event loop for one image: redraw when needed, poll, dispatch.
    fn edit(&mut self, session: &mut ImageSession) -> Result<Step, SessionError> {
        loop {
            let font = self.label_font.as_ref();
            if let Some(pixels) = session.render(&self.palette, &self.catalog, font) {
                let title = session.title(&self.catalog);
                self.frontend.present(&Frame {
                    pixels: &pixels,
                    title: &title,
                })?;
            }

            for event in self.frontend.poll_events(self.poll_interval)? {
                match session.handle(event, &self.store) {
                    Step::Continue => {}
                    step => return Ok(step),
                }
            }
        }
    }
}
