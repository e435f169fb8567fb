//! Session tests driven by a scripted frontend and in-memory images.

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use image::RgbaImage;
use tempfile::TempDir;

use crate::classes::ClassCatalog;
use crate::detector::{Detector, DetectorError};
use crate::editor::{EditorKey, PointerButton, PointerEvent};
use crate::format::AnnotationStore;
use crate::frontend::{Frame, Frontend, FrontendError, InputEvent};
use crate::geometry::PixelBox;
use crate::images::{DisplayImage, ImageError, ImageList, ImageSource};
use crate::palette::{GREEN, RED};
use crate::session::{ExitReason, ImageSession, Session, SessionError, Step};

// ============================================================================
// Test doubles
// ============================================================================

/// Replays one event per poll; reports `Closed` once the script runs out.
#[derive(Default)]
struct ScriptedFrontend {
    script: VecDeque<InputEvent>,
    titles: Vec<String>,
    frames: Vec<RgbaImage>,
}

impl ScriptedFrontend {
    fn new(events: Vec<InputEvent>) -> Self {
        Self {
            script: events.into(),
            ..Self::default()
        }
    }

    /// Image paths in the order they were first shown after each switch.
    fn shown_images(&self) -> Vec<String> {
        let mut shown: Vec<String> = Vec::new();
        for title in &self.titles {
            let image = title.split(" | ").next().unwrap_or_default().to_string();
            if shown.last() != Some(&image) {
                shown.push(image);
            }
        }
        shown
    }
}

impl Frontend for ScriptedFrontend {
    fn poll_events(&mut self, _timeout: Duration) -> Result<Vec<InputEvent>, FrontendError> {
        Ok(vec![self.script.pop_front().unwrap_or(InputEvent::Closed)])
    }

    fn present(&mut self, frame: &Frame<'_>) -> Result<(), FrontendError> {
        self.titles.push(frame.title.to_string());
        self.frames.push(frame.pixels.clone());
        Ok(())
    }
}

/// Blank images of fixed sizes; unknown paths fail to decode.
struct MemorySource {
    sizes: HashMap<PathBuf, (u32, u32)>,
}

impl MemorySource {
    fn new(images: &[(&PathBuf, (u32, u32))]) -> Self {
        Self {
            sizes: images
                .iter()
                .map(|(path, size)| ((*path).clone(), *size))
                .collect(),
        }
    }
}

impl ImageSource for MemorySource {
    fn load(&mut self, path: &Path) -> Result<DisplayImage, ImageError> {
        let Some(&(w, h)) = self.sizes.get(path) else {
            return Err(ImageError::Decode {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "not an image",
                )),
            });
        };
        Ok(DisplayImage {
            pixels: RgbaImage::new(w, h),
            original_size: (w, h),
        })
    }
}

struct FixedDetector {
    boxes: Vec<PixelBox>,
    calls: Rc<Cell<usize>>,
}

impl Detector for FixedDetector {
    fn detect(&mut self, _image: &DisplayImage) -> Result<Vec<PixelBox>, DetectorError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.boxes.clone())
    }
}

struct Workspace {
    _dir: TempDir,
    images: PathBuf,
    output: PathBuf,
    existing: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        let output = dir.path().join("annotations");
        let existing = dir.path().join("labels");
        std::fs::create_dir_all(&existing).unwrap();
        Self {
            _dir: dir,
            images,
            output,
            existing,
        }
    }

    fn image(&self, name: &str) -> PathBuf {
        self.images.join(name)
    }

    fn store(&self) -> AnnotationStore {
        AnnotationStore::new(&self.output).with_fallback(&self.existing)
    }
}

fn key(key: EditorKey) -> InputEvent {
    InputEvent::Key(key)
}

fn press(x: i32, y: i32) -> InputEvent {
    InputEvent::Pointer(PointerEvent::press(PointerButton::Primary, x, y))
}

fn right_press(x: i32, y: i32) -> InputEvent {
    InputEvent::Pointer(PointerEvent::press(PointerButton::Secondary, x, y))
}

fn moved(x: i32, y: i32) -> InputEvent {
    InputEvent::Pointer(PointerEvent::moved(x, y))
}

fn release(x: i32, y: i32) -> InputEvent {
    InputEvent::Pointer(PointerEvent::release(PointerButton::Primary, x, y))
}

fn pixel(frame: &RgbaImage, x: u32, y: u32) -> [u8; 3] {
    let p = frame.get_pixel(x, y);
    [p[0], p[1], p[2]]
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_draw_advance_and_return() {
    let ws = Workspace::new();
    let img1 = ws.image("img1.jpg");
    let img2 = ws.image("img2.jpg");
    let images = ImageList::from_paths(vec![img1.clone(), img2.clone()]);
    let source = MemorySource::new(&[(&img1, (640, 480)), (&img2, (640, 480))]);

    let frontend = ScriptedFrontend::new(vec![
        key(EditorKey::NewBox),
        press(10, 10),
        moved(30, 30),
        release(50, 40),
        key(EditorKey::NextImage),
        key(EditorKey::PreviousImage),
        key(EditorKey::Cancel),
    ]);
    let mut session = Session::new(images, ws.store(), frontend, source)
        .with_catalog(ClassCatalog::numeric(2));

    let summary = session.run().unwrap();
    assert_eq!(summary.exit, ExitReason::Cancelled);
    assert_eq!(summary.opened, 3);
    assert_eq!(summary.saved, 1);

    // One normalized record persisted for img1, nothing for img2
    let content = std::fs::read_to_string(ws.output.join("img1.txt")).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.starts_with("0 "));
    assert!(!ws.output.join("img2.txt").exists());

    let reloaded = ws.store().load(&img1, 640, 480);
    assert_eq!(reloaded, vec![PixelBox::new(10, 10, 50, 40, 0)]);

    let frontend = session.frontend();
    assert_eq!(
        frontend.shown_images(),
        vec![
            img1.display().to_string(),
            img2.display().to_string(),
            img1.display().to_string()
        ]
    );
    // Last frame is img1 again, with the reloaded box in the class 0 colour
    let last = frontend.frames.last().unwrap();
    assert_eq!(pixel(last, 10, 25), GREEN);
}

#[test]
fn test_preview_frame_while_dragging() {
    let ws = Workspace::new();
    let img = ws.image("a.png");
    let frontend = ScriptedFrontend::new(vec![
        key(EditorKey::NewBox),
        press(5, 5),
        moved(20, 20),
        key(EditorKey::Cancel),
    ]);
    let mut session = Session::new(
        ImageList::single(&img),
        ws.store(),
        frontend,
        MemorySource::new(&[(&img, (64, 64))]),
    );
    session.run().unwrap();

    let last = session.frontend().frames.last().unwrap();
    assert_eq!(pixel(last, 5, 12), [0, 255, 0]);
    assert_eq!(pixel(last, 20, 12), [0, 255, 0]);
    assert!(!ws.output.join("a.txt").exists());
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_fallback_annotations_are_not_rewritten_without_edits() {
    let ws = Workspace::new();
    let img = ws.image("a.png");
    std::fs::write(ws.existing.join("a.txt"), "1 0.5 0.5 0.5 0.5\n").unwrap();

    let frontend = ScriptedFrontend::new(vec![key(EditorKey::NextImage)]);
    let mut session = Session::new(
        ImageList::single(&img),
        ws.store(),
        frontend,
        MemorySource::new(&[(&img, (100, 100))]),
    );
    let summary = session.run().unwrap();

    assert_eq!(summary.exit, ExitReason::Finished);
    assert_eq!(summary.saved, 0);
    assert!(!ws.output.join("a.txt").exists());
    // Box (25,25)-(75,75) drawn in class 1 colour
    assert_eq!(pixel(&session.frontend().frames[0], 25, 50), RED);
}

#[test]
fn test_frames_label_boxes_with_class_names() {
    let ws = Workspace::new();
    let img = ws.image("a.png");
    std::fs::write(ws.existing.join("a.txt"), "1 0.5 0.5 0.5 0.5\n").unwrap();

    let frontend = ScriptedFrontend::new(vec![key(EditorKey::Cancel)]);
    let mut session = Session::new(
        ImageList::single(&img),
        ws.store(),
        frontend,
        MemorySource::new(&[(&img, (100, 100))]),
    )
    .with_catalog(ClassCatalog::from_names(vec!["ball".into(), "player".into()]));
    session.run().unwrap();

    // Red-only text above the class 1 box; the corner label is green
    let frame = &session.frontend().frames[0];
    let label_pixels = (28..75)
        .flat_map(|x| (5..25).map(move |y| (x, y)))
        .map(|(x, y)| pixel(frame, x, y))
        .filter(|p| p[0] > 0 && p[1] == 0 && p[2] == 0)
        .count();
    assert!(label_pixels > 0);
    assert_eq!(pixel(frame, 25, 50), RED);
}

#[test]
fn test_detector_only_runs_without_annotations() {
    let ws = Workspace::new();
    let with_labels = ws.image("a.png");
    let without = ws.image("b.png");
    std::fs::write(ws.existing.join("a.txt"), "0 0.5 0.5 0.2 0.2\n").unwrap();

    let calls = Rc::new(Cell::new(0));
    let detector = FixedDetector {
        boxes: vec![PixelBox::new(1, 1, 8, 8, 1)],
        calls: Rc::clone(&calls),
    };
    let frontend = ScriptedFrontend::new(vec![
        key(EditorKey::NextImage),
        key(EditorKey::Cancel),
    ]);
    let mut session = Session::new(
        ImageList::from_paths(vec![with_labels.clone(), without.clone()]),
        ws.store(),
        frontend,
        MemorySource::new(&[(&with_labels, (20, 20)), (&without, (20, 20))]),
    )
    .with_detector(Box::new(detector));
    session.run().unwrap();

    assert_eq!(calls.get(), 1);
    // Proposals are shown but not saved until edited
    assert_eq!(pixel(session.frontend().frames.last().unwrap(), 1, 4), RED);
    assert!(!ws.output.join("b.txt").exists());
}

// ============================================================================
// Saving
// ============================================================================

#[test]
fn test_delete_is_saved_immediately() {
    let ws = Workspace::new();
    let img = ws.image("a.png");
    std::fs::write(
        ws.existing.join("a.txt"),
        "0 0.25 0.25 0.1 0.1\n1 0.75 0.75 0.1 0.1\n",
    )
    .unwrap();

    let frontend = ScriptedFrontend::new(vec![
        press(25, 25),
        release(25, 25),
        key(EditorKey::DeleteSelected),
        key(EditorKey::Cancel),
    ]);
    let mut session = Session::new(
        ImageList::single(&img),
        ws.store(),
        frontend,
        MemorySource::new(&[(&img, (100, 100))]),
    );
    let summary = session.run().unwrap();

    assert_eq!(summary.saved, 1);
    let content = std::fs::read_to_string(ws.output.join("a.txt")).unwrap();
    assert_eq!(content, "1 0.75 0.75 0.1 0.1\n");
}

#[test]
fn test_class_id_entry_and_swap_are_saved() {
    let ws = Workspace::new();
    let img = ws.image("a.png");
    std::fs::write(
        ws.existing.join("a.txt"),
        "0 0.25 0.25 0.1 0.1\n1 0.75 0.75 0.1 0.1\n",
    )
    .unwrap();

    let frontend = ScriptedFrontend::new(vec![
        // Type 12 for the first box
        press(25, 25),
        right_press(25, 25),
        key(EditorKey::Digit(1)),
        key(EditorKey::Digit(2)),
        key(EditorKey::Confirm),
        // Swap the two boxes' classes
        press(75, 75),
        right_press(25, 25),
        key(EditorKey::Cancel),
    ]);
    let mut session = Session::new(
        ImageList::single(&img),
        ws.store(),
        frontend,
        MemorySource::new(&[(&img, (100, 100))]),
    );
    let summary = session.run().unwrap();
    assert_eq!(summary.saved, 2);

    let records = ws.store().load(&img, 100, 100);
    let classes: Vec<u32> = records.iter().map(|b| b.class_id).collect();
    assert_eq!(classes, vec![1, 12]);

    let titles = &session.frontend().titles;
    assert!(titles.iter().any(|t| t.ends_with("| id: 12_")));
}

#[test]
fn test_active_class_carries_to_next_image() {
    let ws = Workspace::new();
    let img1 = ws.image("a.png");
    let img2 = ws.image("b.png");
    let frontend = ScriptedFrontend::new(vec![
        key(EditorKey::NextClass),
        key(EditorKey::NextImage),
        key(EditorKey::NewBox),
        press(2, 2),
        release(8, 8),
        key(EditorKey::Cancel),
    ]);
    let mut session = Session::new(
        ImageList::from_paths(vec![img1.clone(), img2.clone()]),
        ws.store(),
        frontend,
        MemorySource::new(&[(&img1, (20, 20)), (&img2, (20, 20))]),
    )
    .with_catalog(ClassCatalog::from_names(vec!["ball".into(), "player".into()]));
    session.run().unwrap();

    assert_eq!(
        ws.store().load(&img2, 20, 20),
        vec![PixelBox::new(2, 2, 8, 8, 1)]
    );
    let titles = &session.frontend().titles;
    assert!(titles.first().unwrap().ends_with("class ball"));
    assert!(titles.last().unwrap().ends_with("class player"));
}

#[test]
fn test_undrawn_new_box_is_discarded() {
    let ws = Workspace::new();
    let img = ws.image("a.png");
    let frontend = ScriptedFrontend::new(vec![
        key(EditorKey::NewBox),
        key(EditorKey::NextImage),
    ]);
    let mut session = Session::new(
        ImageList::single(&img),
        ws.store(),
        frontend,
        MemorySource::new(&[(&img, (20, 20))]),
    );
    let summary = session.run().unwrap();
    assert_eq!(summary.saved, 0);
    assert!(!ws.output.join("a.txt").exists());
}

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn test_previous_on_first_image_reloads_it() {
    let ws = Workspace::new();
    let img1 = ws.image("a.png");
    let img2 = ws.image("b.png");
    let frontend = ScriptedFrontend::new(vec![
        key(EditorKey::PreviousImage),
        key(EditorKey::NextImage),
        key(EditorKey::NextImage),
    ]);
    let mut session = Session::new(
        ImageList::from_paths(vec![img1.clone(), img2.clone()]),
        ws.store(),
        frontend,
        MemorySource::new(&[(&img1, (20, 20)), (&img2, (20, 20))]),
    );
    let summary = session.run().unwrap();

    assert_eq!(summary.exit, ExitReason::Finished);
    assert_eq!(summary.opened, 3);
    // The output directory exists even though nothing was saved
    assert!(ws.output.is_dir());
}

#[test]
fn test_window_close_ends_session() {
    let ws = Workspace::new();
    let img = ws.image("a.png");
    let mut session = Session::new(
        ImageList::single(&img),
        ws.store(),
        ScriptedFrontend::new(vec![InputEvent::Closed]),
        MemorySource::new(&[(&img, (20, 20))]),
    );
    assert_eq!(session.run().unwrap().exit, ExitReason::Closed);
}

#[test]
fn test_single_image_decode_failure_is_fatal() {
    let ws = Workspace::new();
    let img = ws.image("broken.png");
    let mut session = Session::new(
        ImageList::single(&img),
        ws.store(),
        ScriptedFrontend::new(Vec::new()),
        MemorySource::new(&[]),
    );
    assert!(matches!(
        session.run(),
        Err(SessionError::Image(ImageError::Decode { .. }))
    ));
}

#[test]
fn test_directory_mode_skips_undecodable_images() {
    let ws = Workspace::new();
    let a = ws.image("a.png");
    let broken = ws.image("b.png");
    let c = ws.image("c.png");
    let frontend = ScriptedFrontend::new(vec![
        key(EditorKey::NextImage),
        key(EditorKey::PreviousImage),
        key(EditorKey::Cancel),
    ]);
    let mut session = Session::new(
        ImageList::from_paths(vec![a.clone(), broken, c.clone()]),
        ws.store(),
        frontend,
        MemorySource::new(&[(&a, (20, 20)), (&c, (20, 20))]),
    );
    let summary = session.run().unwrap();

    assert_eq!(summary.skipped, 2);
    assert_eq!(
        session.frontend().shown_images(),
        vec![
            a.display().to_string(),
            c.display().to_string(),
            a.display().to_string()
        ]
    );
}

#[test]
fn test_failed_save_is_retried_on_next_event() {
    let ws = Workspace::new();
    let img = ws.image("a.png");
    // A plain file where the output directory belongs makes saving fail
    std::fs::write(&ws.output, b"").unwrap();

    let store = ws.store();
    let image = DisplayImage {
        pixels: RgbaImage::new(20, 20),
        original_size: (20, 20),
    };
    let mut session = ImageSession::open(&img, image, &store, None, 2, 0);

    for event in [key(EditorKey::NewBox), press(2, 2), release(8, 8)] {
        assert_eq!(session.handle(event, &store), Step::Continue);
    }
    assert!(session.state().is_dirty());
    assert_eq!(session.saves(), 0);

    std::fs::remove_file(&ws.output).unwrap();
    session.handle(key(EditorKey::NextClass), &store);

    assert!(!session.state().is_dirty());
    assert_eq!(session.saves(), 1);
    assert_eq!(store.load(&img, 20, 20), vec![PixelBox::new(2, 2, 8, 8, 0)]);
}
