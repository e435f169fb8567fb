//! boxfix command-line entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use boxfix::classes::ClassCatalog;
use boxfix::config::AppConfig;
use boxfix::format::AnnotationStore;
use boxfix::images::{FileImageSource, ImageError, ImageList};
use boxfix::native::NativeFrontend;
use boxfix::session::Session;

#[derive(Parser, Debug)]
#[command(
    name = "boxfix",
    version,
    about = "Review and correct bounding-box annotations image by image"
)]
struct Args {
    /// Annotate a single image
    #[arg(long, conflicts_with = "img_dir")]
    image: Option<PathBuf>,

    /// Annotate every image in a directory
    #[arg(long)]
    img_dir: Option<PathBuf>,

    /// Directory with existing annotation files to start from
    #[arg(long)]
    txt_dir: Option<PathBuf>,

    /// File with one class name per line
    #[arg(long)]
    names: Option<PathBuf>,

    /// Dataset file with `classes` and `names` entries
    #[arg(long)]
    data: Option<PathBuf>,

    /// Directory annotation files are written to
    #[arg(long)]
    output: Option<PathBuf>,

    /// Configuration file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<log::LevelFilter>,

    /// Write the default configuration and exit
    #[arg(long)]
    write_config: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let (config, config_error) = load_config(args.config.as_deref());
    init_logging(&config, args.log_level);
    if let Some(e) = config_error {
        log::error!("{}", e);
        return ExitCode::FAILURE;
    }

    if args.write_config {
        return match AppConfig::default().save_to_default_path() {
            Ok(path) => {
                log::info!("Wrote default configuration to {:?}", path);
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("Failed to write configuration: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let images = match image_list(&args) {
        Ok(Some(images)) => images,
        Ok(None) => return ExitCode::SUCCESS,
        Err(message) => {
            log::error!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    match run(&args, &config, images) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load the config from `--config` or the default location.
///
/// An explicit file that cannot be loaded is an error; a broken default file
/// is reported and replaced by defaults.
fn load_config(path: Option<&Path>) -> (AppConfig, Option<String>) {
    match path {
        Some(path) => match AppConfig::load(path) {
            Ok(config) => (config, None),
            Err(e) => (
                AppConfig::default(),
                Some(format!("Failed to load config {:?}: {}", path, e)),
            ),
        },
        None => (AppConfig::load_from_default_path().unwrap_or_default(), None),
    }
}

fn init_logging(config: &AppConfig, override_level: Option<log::LevelFilter>) {
    let level = override_level.unwrap_or_else(|| config.preferences.log_level.to_level_filter());

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    // RUST_LOG wins over both
    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_env("RUST_LOG");
    }
    builder.init();
}

/// Resolve the images to work through.
///
/// `Ok(None)` means there is nothing to do: the directory is missing or has
/// no images. Nothing is created on disk in that case.
fn image_list(args: &Args) -> Result<Option<ImageList>, String> {
    if let Some(image) = &args.image {
        return Ok(Some(ImageList::single(image.clone())));
    }

    let Some(dir) = &args.img_dir else {
        return Err("Either --image or --img-dir is required".to_string());
    };

    match ImageList::from_directory(dir) {
        Ok(images) => {
            log::info!("Found {} images in {:?}", images.len(), dir);
            Ok(Some(images))
        }
        Err(e @ (ImageError::DirectoryNotFound(_) | ImageError::NoImages(_))) => {
            log::warn!("{}", e);
            Ok(None)
        }
        Err(e) => Err(e.to_string()),
    }
}

/// Directory the annotation files go to: `--output`, or a folder next to the images.
fn output_dir(args: &Args, config: &AppConfig) -> PathBuf {
    if let Some(output) = &args.output {
        return output.clone();
    }

    let base = match (&args.img_dir, &args.image) {
        (Some(dir), _) => dir.clone(),
        (None, Some(image)) => image
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
        (None, None) => PathBuf::new(),
    };
    base.join(&config.preferences.output_dir_name)
}

fn run(args: &Args, config: &AppConfig, images: ImageList) -> Result<(), Box<dyn std::error::Error>> {
    let prefs = &config.preferences;

    let mut store = AnnotationStore::new(output_dir(args, config));
    if let Some(txt_dir) = &args.txt_dir {
        store = store.with_fallback(txt_dir.clone());
    }

    let catalog = ClassCatalog::resolve(
        args.names.as_deref(),
        args.data.as_deref(),
        prefs.default_class_count,
    );
    let labels: Vec<String> = (0..catalog.count()).map(|id| catalog.label(id)).collect();
    log::info!("{} classes: {}", catalog.count(), labels.join(", "));

    let bindings = config.keybindings.to_keybindings();
    for line in bindings.help_lines() {
        log::info!("{}", line);
    }

    let frontend = NativeFrontend::new("boxfix", bindings)?;
    let source = FileImageSource::new(prefs.screen_width, prefs.screen_height);

    let mut session = Session::new(images, store, frontend, source)
        .with_catalog(catalog)
        .with_palette(config.colors.to_palette())
        .with_poll_interval(Duration::from_millis(prefs.poll_interval_ms));

    let summary = session.run()?;
    log::info!(
        "Done ({:?}): {} images opened, {} files saved, {} skipped",
        summary.exit,
        summary.opened,
        summary.saved,
        summary.skipped
    );
    Ok(())
}
