//! Application window

use eframe::egui;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{self, AppConfig};
use crate::controller::{AnalyzeOutcome, OcrController};
use crate::picker::ImageReference;
use crate::ui::picker_window::PickerWindow;
use crate::ui::screen::{render_screen, ScreenAction};
use crate::ui::theme;

/// The main application
pub struct OcrApp {
    controller: OcrController,
    config: AppConfig,
    /// Where config changes are written back, if anywhere
    config_path: Option<PathBuf>,
    picker: Option<PickerWindow>,
    preview_texture: Option<egui::TextureHandle>,
    /// Preview generation the texture was built from
    texture_generation: u64,
    theme_applied: bool,
}

impl OcrApp {
    pub fn new(controller: OcrController, config: AppConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            controller,
            config,
            config_path,
            picker: None,
            preview_texture: None,
            texture_generation: 0,
            theme_applied: false,
        }
    }

    /// Create eframe options for the main window
    pub fn options(config: &AppConfig) -> eframe::NativeOptions {
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([config.window.width, config.window.height])
                .with_min_inner_size([320.0, 400.0])
                .with_title("Simple OCR"),
            ..Default::default()
        }
    }

    fn handle_action(&mut self, ctx: &egui::Context, action: ScreenAction) {
        match action {
            ScreenAction::SelectImage => self.controller.on_select_image(),
            ScreenAction::Analyze => {
                if let AnalyzeOutcome::Submitted(id) = self.controller.on_analyze() {
                    debug!("Analysis {} started", id);
                }
            }
            ScreenAction::CopyText => {
                ctx.copy_text(self.controller.state().recognized_text.clone());
            }
        }
    }

    fn open_picker_if_requested(&mut self) {
        if !self.controller.take_picker_request() || self.picker.is_some() {
            return;
        }

        let start_dir = self
            .controller
            .state()
            .image
            .as_ref()
            .and_then(|r| r.path().parent().map(|p| p.to_path_buf()))
            .or_else(|| self.config.picker.start_dir.clone())
            .filter(|dir| dir.is_dir())
            .unwrap_or_else(crate::storage::default_picker_dir);

        self.picker = Some(PickerWindow::new(start_dir, self.config.picker.show_hidden));
    }

    fn show_picker(&mut self, ctx: &egui::Context) {
        let Some(picker) = self.picker.as_mut() else {
            return;
        };

        if let Some(picked) = picker.show(ctx).into_result() {
            self.picker = None;
            if let Some(reference) = &picked {
                self.remember_directory(reference);
            }
            self.controller.on_image_picked(picked);
        }
    }

    /// Persist the picked image's directory as the next start directory
    fn remember_directory(&mut self, reference: &ImageReference) {
        if !self.config.picker.remember_last_dir {
            return;
        }
        let Some(dir) = reference.path().parent() else {
            return;
        };
        if self.config.picker.start_dir.as_deref() == Some(dir) {
            return;
        }

        self.config.picker.start_dir = Some(dir.to_path_buf());
        if let Some(path) = &self.config_path {
            match save_start_dir(path, dir) {
                Ok(()) => debug!("Saved picker directory to {:?}", path),
                Err(e) => warn!("Failed to save configuration: {:#}", e),
            }
        }
    }

    /// Upload the preview bitmap when it changed
    fn sync_preview_texture(&mut self, ctx: &egui::Context) {
        let generation = self.controller.preview_generation();
        if generation == self.texture_generation {
            return;
        }
        self.texture_generation = generation;

        self.preview_texture = self.controller.preview().map(|bitmap| {
            let (width, height) = bitmap.dimensions();
            let color_image = egui::ColorImage::from_rgba_unmultiplied(
                [width as usize, height as usize],
                bitmap.as_rgba().as_raw(),
            );
            ctx.load_texture("selected_image", color_image, egui::TextureOptions::LINEAR)
        });
    }
}

/// Update only `picker.start_dir` in the file at `path`
///
/// The file is re-read so settings that were overridden for this run
/// stay as the user wrote them. A file that no longer parses is left alone.
fn save_start_dir(path: &Path, dir: &Path) -> anyhow::Result<()> {
    let mut on_disk = if path.exists() {
        config::load_config(path)?
    } else {
        AppConfig::default()
    };
    on_disk.picker.start_dir = Some(dir.to_path_buf());
    config::save_config(&on_disk, path)
}

impl eframe::App for OcrApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            theme::apply_theme(ctx);
            self.theme_applied = true;
        }

        // Results from the worker land here, on the UI thread
        self.controller.poll();

        self.open_picker_if_requested();
        self.show_picker(ctx);
        self.sync_preview_texture(ctx);

        let mut action = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::Frame::none().inner_margin(16.0).show(ui, |ui| {
                action = render_screen(ui, self.controller.state(), self.preview_texture.as_ref());
            });
        });

        if let Some(action) = action {
            self.handle_action(ctx, action);
        }
    }
}

/// Run the application window
pub fn run_app(
    mut controller: OcrController,
    config: AppConfig,
    config_path: Option<PathBuf>,
    initial_image: Option<ImageReference>,
) -> Result<(), eframe::Error> {
    let options = OcrApp::options(&config);

    if initial_image.is_some() {
        controller.on_image_picked(initial_image);
    }

    info!("Opening main window");
    eframe::run_native(
        "Simple OCR",
        options,
        Box::new(move |cc| {
            // Wake the UI when a recognition result arrives
            let ctx = cc.egui_ctx.clone();
            controller
                .client_mut()
                .set_notifier(Arc::new(move || ctx.request_repaint()));

            Ok(Box::new(OcrApp::new(controller, config, config_path)))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecognitionError;
    use crate::vision::{FileImageLoader, RecognitionClient, RecognitionRequest, TextRecognizer};
    use tempfile::tempdir;

    struct Silent;

    impl TextRecognizer for Silent {
        fn recognize(&self, _request: &RecognitionRequest) -> Result<String, RecognitionError> {
            Ok(String::new())
        }
    }

    fn app(config: AppConfig, config_path: Option<PathBuf>) -> OcrApp {
        let controller = OcrController::new(
            Box::new(FileImageLoader::default()),
            RecognitionClient::new(Arc::new(Silent)),
        );
        OcrApp::new(controller, config, config_path)
    }

    #[test]
    fn test_remember_directory_saves_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let mut app = app(AppConfig::default(), Some(config_path.clone()));

        app.remember_directory(&ImageReference::new(dir.path().join("scan.png")));

        let saved = config::load_config(&config_path).unwrap();
        assert_eq!(saved.picker.start_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_remember_directory_keeps_run_overrides_out_of_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "[recognition]\nmax_image_dimension = 1024\n").unwrap();

        let mut config = config::load_config(&config_path).unwrap();
        config.recognition.offline = true;
        config.recognition.models_dir = Some(PathBuf::from("/tmp/once"));
        let mut app = app(config, Some(config_path.clone()));

        app.remember_directory(&ImageReference::new(dir.path().join("scan.png")));

        let saved = config::load_config(&config_path).unwrap();
        assert_eq!(saved.picker.start_dir.as_deref(), Some(dir.path()));
        assert_eq!(saved.recognition.max_image_dimension, 1024);
        assert!(!saved.recognition.offline);
        assert!(saved.recognition.models_dir.is_none());
    }

    #[test]
    fn test_remember_directory_leaves_broken_file_alone() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let contents = "[recognition]\nmax_image_dimension = 1024\noffline = tru\n";
        std::fs::write(&config_path, contents).unwrap();
        let mut app = app(AppConfig::default(), Some(config_path.clone()));

        app.remember_directory(&ImageReference::new(dir.path().join("scan.png")));

        assert_eq!(std::fs::read_to_string(&config_path).unwrap(), contents);
        assert_eq!(app.config.picker.start_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_remember_directory_respects_setting() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.picker.remember_last_dir = false;
        let mut app = app(config, Some(config_path.clone()));

        app.remember_directory(&ImageReference::new(dir.path().join("scan.png")));

        assert!(app.config.picker.start_dir.is_none());
        assert!(!config_path.exists());
    }

    #[test]
    fn test_picker_opens_on_request() {
        let mut app = app(AppConfig::default(), None);
        app.open_picker_if_requested();
        assert!(app.picker.is_none());

        app.controller.on_select_image();
        app.open_picker_if_requested();
        assert!(app.picker.is_some());
    }
}
