//! Annotation file format and storage.
//!
//! - [`yolo`]: the record line codec
//! - [`AnnotationStore`]: per-image files with a two-tier load fallback and
//!   whole-file replacement on save

mod error;
mod store;
pub mod yolo;

#[cfg(test)]
mod tests;

pub use error::FormatError;
pub use store::{AnnotationStore, LoadSource, LoadedAnnotations, annotation_file_name};
