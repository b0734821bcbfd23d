//! Simple OCR - pick an image, extract its text
//!
//! Runs text recognition on-device with the ocrs models; nothing leaves
//! the machine apart from the one-time model download.

mod config;
mod controller;
mod error;
mod picker;
mod storage;
mod ui;
mod vision;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{AppConfig, RecognitionSettings};
use crate::controller::{AnalyzeOutcome, OcrController};
use crate::picker::ImageReference;
use crate::vision::{FileImageLoader, ModelManager, OcrsRecognizer, RecognitionClient};

/// Upper bound for headless recognition, including a first model download
const HEADLESS_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Simple OCR - extract text from images
#[derive(Parser, Debug)]
#[command(name = "simple-ocr")]
#[command(about = "Pick an image and extract its text with on-device OCR")]
struct Args {
    /// Image to preselect
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Recognize --image without opening a window and print the text
    #[arg(long, requires = "image")]
    recognize: bool,

    /// Configuration file (defaults to the per-user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the OCR models
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Never download missing models
    #[arg(long)]
    offline: bool,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config_path = match args.config.clone() {
        Some(path) => Some(path),
        None => match storage::default_config_path() {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("No configuration directory: {:#}", e);
                None
            }
        },
    };
    let (config, config_path) = load_or_default_config(config_path);

    // Command-line overrides last for this run only
    let mut recognition = config.recognition.clone();
    if let Some(dir) = args.models_dir.clone() {
        recognition.models_dir = Some(dir);
    }
    recognition.offline |= args.offline;

    let controller = build_controller(&recognition)?;
    let initial_image = args.image.map(ImageReference::new);

    if args.recognize {
        return run_headless(controller, initial_image);
    }

    info!("Simple OCR starting...");
    if let Err(e) = ui::run_app(controller, config, config_path, initial_image) {
        error!("Window error: {}", e);
        anyhow::bail!("failed to run the application window: {}", e);
    }

    info!("Simple OCR shutdown complete");
    Ok(())
}

/// Load configuration from file or fall back to defaults
///
/// Also returns where changes may be written back: `None` when the file
/// exists but could not be read, so a broken file is never overwritten.
fn load_or_default_config(path: Option<PathBuf>) -> (AppConfig, Option<PathBuf>) {
    if let Some(path) = path {
        if !path.exists() {
            info!("Using default configuration");
            return (AppConfig::default(), Some(path));
        }
        return match config::load_config(&path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", path);
                (config, Some(path))
            }
            Err(e) => {
                warn!("Ignoring configuration, it will not be saved: {:#}", e);
                (AppConfig::default(), None)
            }
        };
    }
    info!("Using default configuration");
    (AppConfig::default(), None)
}

/// Wire loader, recognizer and client into a controller
fn build_controller(recognition: &RecognitionSettings) -> Result<OcrController> {
    let models = match &recognition.models_dir {
        Some(dir) => ModelManager::with_dir(dir.clone()),
        None => ModelManager::new(),
    }
    .context("Failed to prepare the model directory")?
    .offline(recognition.offline);

    info!(
        "Models directory: {:?}{}",
        models.models_dir(),
        if models.is_offline() { " (offline)" } else { "" }
    );

    let recognizer = Arc::new(OcrsRecognizer::new(models));
    let loader = FileImageLoader::new(recognition.max_image_dimension);

    Ok(OcrController::new(Box::new(loader), RecognitionClient::new(recognizer)))
}

/// Pick, analyze and print without a window
fn run_headless(mut controller: OcrController, image: Option<ImageReference>) -> Result<()> {
    controller.on_image_picked(image);

    match controller.on_analyze() {
        AnalyzeOutcome::Submitted(_) => {}
        AnalyzeOutcome::NoImage => anyhow::bail!("no image given"),
        AnalyzeOutcome::Busy => anyhow::bail!("a recognition request is already running"),
        AnalyzeOutcome::LoadFailed => {
            anyhow::bail!("{}", controller.state().recognized_text)
        }
    }

    if !controller.wait_for_result(HEADLESS_TIMEOUT) {
        anyhow::bail!("recognition did not finish within {:?}", HEADLESS_TIMEOUT);
    }

    let state = controller.state();
    if state.last_error.is_some() {
        anyhow::bail!("{}", state.recognized_text);
    }

    println!("{}", state.recognized_text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_file_is_writable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let (config, save_to) = load_or_default_config(Some(path.clone()));
        assert_eq!(config.recognition.max_image_dimension, 2560);
        assert_eq!(save_to, Some(path));
    }

    #[test]
    fn test_broken_config_file_is_not_writable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[recognition]\nmax_image_dimension = 1024\noffline = tru\n").unwrap();

        let (config, save_to) = load_or_default_config(Some(path));
        assert!(!config.recognition.offline);
        assert!(save_to.is_none());
    }

    #[test]
    fn test_loaded_config_file_is_writable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[recognition]\nmax_image_dimension = 1024\n").unwrap();

        let (config, save_to) = load_or_default_config(Some(path.clone()));
        assert_eq!(config.recognition.max_image_dimension, 1024);
        assert_eq!(save_to, Some(path));
    }
}
