//! Image discovery and decoding.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use image::imageops::FilterType;

/// Supported image extensions
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp"];

/// Check if a path has a supported image extension (case-insensitive).
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Errors raised while building the image list or decoding an image.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("No images found in {0}")]
    NoImages(PathBuf),

    #[error("Failed to read directory {path:?}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

// ============================================================================
// Image List
// ============================================================================

/// The ordered list of images a session walks through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageList {
    paths: Vec<PathBuf>,
    /// Built from a directory scan rather than one explicit path
    from_directory: bool,
}

impl ImageList {
    /// A list holding one explicitly named image.
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
            from_directory: false,
        }
    }

    /// Discover image files in a directory, non-recursively, sorted by path.
    pub fn from_directory(dir: &Path) -> Result<Self, ImageError> {
        if !dir.is_dir() {
            return Err(ImageError::DirectoryNotFound(dir.to_path_buf()));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|source| ImageError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_image_file(path))
            .collect();

        if paths.is_empty() {
            return Err(ImageError::NoImages(dir.to_path_buf()));
        }

        paths.sort();
        log::info!("Found {} images in {:?}", paths.len(), dir);

        Ok(Self {
            paths,
            from_directory: true,
        })
    }

    /// Build a list from paths already in the desired order.
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            from_directory: true,
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Whether undecodable images may be skipped instead of ending the run.
    pub fn is_directory_scan(&self) -> bool {
        self.from_directory
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// A decoded image as it is shown on screen.
#[derive(Debug, Clone)]
pub struct DisplayImage {
    /// Displayed raster, possibly downscaled
    pub pixels: RgbaImage,
    /// Size of the file on disk
    pub original_size: (u32, u32),
}

impl DisplayImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn was_downscaled(&self) -> bool {
        self.original_size != self.pixels.dimensions()
    }
}

/// Loads the raster for an image path.
pub trait ImageSource {
    fn load(&mut self, path: &Path) -> Result<DisplayImage, ImageError>;
}

/// Decodes image files from disk and shrinks them to fit a screen.
#[derive(Debug, Clone)]
pub struct FileImageSource {
    max_width: u32,
    max_height: u32,
}

impl FileImageSource {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width: max_width.max(1),
            max_height: max_height.max(1),
        }
    }
}

impl ImageSource for FileImageSource {
    fn load(&mut self, path: &Path) -> Result<DisplayImage, ImageError> {
        let decoded = image::open(path).map_err(|source| ImageError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let original_size = (decoded.width(), decoded.height());

        let pixels = match fit_within(original_size, (self.max_width, self.max_height)) {
            Some((w, h)) => {
                log::info!(
                    "Downscaling {:?} from {}x{} to {}x{}",
                    path,
                    original_size.0,
                    original_size.1,
                    w,
                    h
                );
                decoded.resize_exact(w, h, FilterType::Triangle).to_rgba8()
            }
            None => decoded.to_rgba8(),
        };

        Ok(DisplayImage {
            pixels,
            original_size,
        })
    }
}

/// Size an image must be scaled to so it fits inside `bounds`, preserving
/// its aspect ratio. `None` if it already fits.
pub fn fit_within(size: (u32, u32), bounds: (u32, u32)) -> Option<(u32, u32)> {
    let (width, height) = size;
    let (max_width, max_height) = bounds;
    if width <= max_width && height <= max_height {
        return None;
    }

    let scale = f64::min(
        f64::from(max_width) / f64::from(width),
        f64::from(max_height) / f64::from(height),
    );
    let scaled = |v: u32| ((f64::from(v) * scale).round() as u32).max(1);
    Some((
        scaled(width).min(max_width),
        scaled(height).min(max_height),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a/b/photo.jpg")));
        assert!(is_image_file(Path::new("scan.TIFF")));
        assert!(is_image_file(Path::new("x.WebP")));
        assert!(!is_image_file(Path::new("labels.txt")));
        assert!(!is_image_file(Path::new("noext")));
    }

    #[test]
    fn test_from_directory_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "c.txt", "d.jpeg"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let list = ImageList::from_directory(dir.path()).unwrap();
        let names: Vec<_> = list
            .paths()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png", "d.jpeg"]);
        assert!(list.is_directory_scan());
    }

    #[test]
    fn test_from_directory_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            ImageList::from_directory(&missing),
            Err(ImageError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_from_directory_without_images() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hi").unwrap();
        assert!(matches!(
            ImageList::from_directory(dir.path()),
            Err(ImageError::NoImages(_))
        ));
    }

    #[test]
    fn test_single_is_not_a_scan() {
        let list = ImageList::single("one.png");
        assert_eq!(list.len(), 1);
        assert!(!list.is_directory_scan());
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within((640, 480), (2560, 1440)), None);
        assert_eq!(fit_within((2560, 1440), (2560, 1440)), None);
        assert_eq!(fit_within((5120, 1440), (2560, 1440)), Some((2560, 720)));
        assert_eq!(fit_within((1000, 4000), (2560, 1440)), Some((360, 1440)));
    }

    #[test]
    fn test_file_source_downscales_large_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        RgbaImage::new(400, 200).save(&path).unwrap();

        let mut source = FileImageSource::new(100, 100);
        let image = source.load(&path).unwrap();
        assert_eq!(image.pixels.dimensions(), (100, 50));
        assert_eq!(image.original_size, (400, 200));
        assert!(image.was_downscaled());
    }

    #[test]
    fn test_file_source_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let mut source = FileImageSource::new(100, 100);
        assert!(matches!(
            source.load(&path),
            Err(ImageError::Decode { .. })
        ));
    }
}
