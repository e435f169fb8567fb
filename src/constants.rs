//! Global constants for boxfix

/// Screen width images are shrunk to fit when no config says otherwise
pub const DEFAULT_SCREEN_WIDTH: u32 = 2560;

/// Screen height images are shrunk to fit when no config says otherwise
pub const DEFAULT_SCREEN_HEIGHT: u32 = 1440;

/// Number of classes cycled through when no class names are given
pub const DEFAULT_CLASS_COUNT: u32 = 2;

/// Name of the output directory created next to the images
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "annotations";

/// Longest wait for input per loop iteration, in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;
