//! Optional automatic labelling hook.
//!
//! A session with a detector asks it for proposals when an image has no
//! annotations anywhere in the fallback chain. Without one, nothing is
//! invoked and the image simply starts empty.

use crate::geometry::PixelBox;
use crate::images::DisplayImage;

/// Proposes boxes for an image, in displayed-image pixel space.
pub trait Detector {
    fn detect(&mut self, image: &DisplayImage) -> Result<Vec<PixelBox>, DetectorError>;
}

#[derive(Debug, thiserror::Error)]
#[error("Detection failed: {0}")]
pub struct DetectorError(pub String);
