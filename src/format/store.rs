//! Per-image annotation files with a fallback chain.
//!
//! Edited annotations live in an output directory, one `<stem>.txt` per
//! image. When an image has no readable file there yet, annotations are read
//! from an optional directory of existing annotations instead.

use std::path::{Path, PathBuf};

use crate::format::error::FormatError;
use crate::format::yolo;
use crate::geometry::{self, NormalizedRecord, PixelBox};

/// Where a set of loaded annotations came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// The output directory (previously edited).
    Primary(PathBuf),
    /// The existing-annotations directory.
    Fallback(PathBuf),
    /// Nothing readable was found.
    Empty,
}

/// Records loaded for one image together with their origin.
#[derive(Debug, Clone)]
pub struct LoadedAnnotations {
    pub records: Vec<NormalizedRecord>,
    pub source: LoadSource,
}

/// Reads and writes annotation files for images.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    /// Directory edited annotations are written to.
    output_dir: PathBuf,
    /// Directory of existing annotations consulted when the output has none.
    fallback_dir: Option<PathBuf>,
}

impl AnnotationStore {
    /// Create a store writing to `output_dir` with no fallback.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            fallback_dir: None,
        }
    }

    /// Set the existing-annotations directory.
    pub fn with_fallback(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = Some(dir.into());
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn fallback_dir(&self) -> Option<&Path> {
        self.fallback_dir.as_deref()
    }

    /// Create the output directory if it does not exist yet.
    pub fn prepare(&self) -> Result<(), FormatError> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// Path of the edited annotation file for an image.
    pub fn primary_path(&self, image_path: &Path) -> PathBuf {
        self.output_dir.join(annotation_file_name(image_path))
    }

    /// Path of the existing annotation file for an image, if a fallback
    /// directory is configured.
    pub fn fallback_path(&self, image_path: &Path) -> Option<PathBuf> {
        self.fallback_dir
            .as_ref()
            .map(|dir| dir.join(annotation_file_name(image_path)))
    }

    /// Load the normalized records for an image, walking the fallback chain.
    ///
    /// A missing, unreadable or malformed file counts as absent; the next
    /// location is tried and an empty set is returned when all fail.
    pub fn load_records(&self, image_path: &Path) -> LoadedAnnotations {
        let primary = self.primary_path(image_path);
        if let Some(records) = try_read(&primary) {
            log::info!(
                "Loaded {} annotations from {:?}",
                records.len(),
                primary
            );
            return LoadedAnnotations {
                records,
                source: LoadSource::Primary(primary),
            };
        }

        if let Some(fallback) = self.fallback_path(image_path) {
            if let Some(records) = try_read(&fallback) {
                log::info!(
                    "Loaded {} existing annotations from {:?}",
                    records.len(),
                    fallback
                );
                return LoadedAnnotations {
                    records,
                    source: LoadSource::Fallback(fallback),
                };
            }
        }

        log::info!("No annotations found for {:?}", image_path);
        LoadedAnnotations {
            records: Vec::new(),
            source: LoadSource::Empty,
        }
    }

    /// Load the boxes for an image in the pixel space of a displayed image
    /// of the given size.
    pub fn load(&self, image_path: &Path, image_width: u32, image_height: u32) -> Vec<PixelBox> {
        self.load_records(image_path)
            .records
            .iter()
            .map(|record| geometry::to_pixel(record, image_width, image_height))
            .collect()
    }

    /// Write the boxes for an image, replacing any previous file.
    ///
    /// The content is written to a temporary sibling and renamed into place,
    /// so a failed save leaves the previous file untouched.
    pub fn save(
        &self,
        image_path: &Path,
        boxes: &[PixelBox],
        image_width: u32,
        image_height: u32,
    ) -> Result<PathBuf, FormatError> {
        if image_width == 0 || image_height == 0 {
            return Err(FormatError::InvalidDimensions {
                width: image_width,
                height: image_height,
            });
        }

        let records: Vec<NormalizedRecord> = boxes
            .iter()
            .map(|bbox| geometry::to_normalized(bbox, image_width, image_height))
            .collect();
        let content = yolo::format_records(&records);

        self.prepare()?;
        let target = self.primary_path(image_path);
        let staging = target.with_extension("txt.tmp");
        std::fs::write(&staging, content)?;
        if let Err(e) = std::fs::rename(&staging, &target) {
            if let Err(cleanup) = std::fs::remove_file(&staging) {
                log::debug!("Could not remove {:?}: {}", staging, cleanup);
            }
            return Err(e.into());
        }

        log::info!("Saved {} annotations to {:?}", records.len(), target);
        Ok(target)
    }
}

/// Read and parse an annotation file, logging why it was rejected.
fn try_read(path: &Path) -> Option<Vec<NormalizedRecord>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::debug!("Cannot read {:?}: {}", path, e);
            return None;
        }
    };

    match yolo::parse_records(&content) {
        Ok(records) => Some(records),
        Err(e) => {
            log::warn!("Ignoring malformed annotation file {:?}: {}", path, e);
            None
        }
    }
}

/// `image.jpg` -> `image.txt`
pub fn annotation_file_name(image_path: &Path) -> String {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string());
    format!("{}.txt", stem)
}
