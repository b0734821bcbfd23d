//! Screen state controller
//!
//! Owns the state of the single screen and maps the "select image" and
//! "analyze" actions onto the picker, loader and recognition client.
//! All methods run on the UI thread; recognition results are applied
//! from `poll`.

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::picker::ImageReference;
use crate::vision::{
    Bitmap, ImageLoader, RecognitionClient, RecognitionEvent, RecognitionRequest, RequestId,
};

/// State rendered by the screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenState {
    /// Image chosen by the user
    pub image: Option<ImageReference>,
    /// Output of the last analysis, or its error message
    pub recognized_text: String,
    /// True while a recognition request is outstanding
    pub is_loading: bool,
    /// True once an analysis has produced `recognized_text`
    pub has_result: bool,
    /// Message of the last failed analysis
    pub last_error: Option<String>,
    /// Problem with the picked image that is not an analysis result
    pub notice: Option<String>,
}

/// What `on_analyze` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    /// No image selected; nothing happened
    NoImage,
    /// A request is already running; nothing happened
    Busy,
    /// The image could not be loaded
    LoadFailed,
    /// A recognition request was submitted
    Submitted(RequestId),
}

/// Controller for the OCR screen
pub struct OcrController {
    state: ScreenState,
    loader: Box<dyn ImageLoader>,
    client: RecognitionClient,
    in_flight: Option<RequestId>,
    preview: Option<Bitmap>,
    preview_generation: u64,
    picker_requested: bool,
}

impl OcrController {
    pub fn new(loader: Box<dyn ImageLoader>, client: RecognitionClient) -> Self {
        Self {
            state: ScreenState::default(),
            loader,
            client,
            in_flight: None,
            preview: None,
            preview_generation: 0,
            picker_requested: false,
        }
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    pub fn client_mut(&mut self) -> &mut RecognitionClient {
        &mut self.client
    }

    /// Decoded preview of the selected image
    pub fn preview(&self) -> Option<&Bitmap> {
        self.preview.as_ref()
    }

    /// Bumped whenever the preview changes
    pub fn preview_generation(&self) -> u64 {
        self.preview_generation
    }

    /// "Select image" action: ask the UI to open the picker
    pub fn on_select_image(&mut self) {
        debug!("Image picker requested");
        self.picker_requested = true;
    }

    /// Consume a pending picker request
    pub fn take_picker_request(&mut self) -> bool {
        std::mem::take(&mut self.picker_requested)
    }

    /// Apply the picker result; `None` means the user cancelled
    pub fn on_image_picked(&mut self, picked: Option<ImageReference>) {
        let Some(reference) = picked else {
            debug!("Image picker cancelled");
            return;
        };

        info!("Selected image {}", reference);

        match self.loader.load(&reference) {
            Ok(bitmap) => {
                self.preview = Some(bitmap);
                self.state.notice = None;
            }
            Err(e) => {
                warn!("Cannot preview {}: {}", reference, e);
                self.preview = None;
                self.state.notice = Some(format!("Cannot display image: {}", e));
            }
        }
        self.preview_generation += 1;
        self.state.image = Some(reference);
    }

    /// "Analyze" action: run OCR on the selected image
    pub fn on_analyze(&mut self) -> AnalyzeOutcome {
        let Some(reference) = self.state.image.clone() else {
            debug!("Analyze ignored: no image selected");
            return AnalyzeOutcome::NoImage;
        };

        if let Some(id) = self.in_flight {
            debug!("Analyze ignored: request {} still running", id);
            return AnalyzeOutcome::Busy;
        }

        let bitmap = match self.loader.load(&reference) {
            Ok(bitmap) => bitmap,
            Err(e) => {
                warn!("Failed to load {} for analysis: {}", reference, e);
                let message = e.to_string();
                self.state.recognized_text = format!("Error loading image: {}", message);
                self.state.last_error = Some(message);
                self.state.is_loading = false;
                self.state.has_result = true;
                return AnalyzeOutcome::LoadFailed;
            }
        };

        let id = self.client.submit(RecognitionRequest::new(bitmap));
        info!("Analyzing {} as request {}", reference.display_name(), id);

        self.in_flight = Some(id);
        self.state.is_loading = true;
        AnalyzeOutcome::Submitted(id)
    }

    /// Apply every delivered result; returns true if state changed
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Some(event) = self.client.try_recv() {
            changed |= self.apply(event);
        }
        changed
    }

    /// Block until the in-flight request completes or `timeout` passes
    ///
    /// Returns true if a result was applied.
    pub fn wait_for_result(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.client.recv_timeout(remaining) {
                Some(event) => {
                    if self.apply(event) {
                        return true;
                    }
                }
                None => return false,
            }
        }
        false
    }

    fn apply(&mut self, event: RecognitionEvent) -> bool {
        if self.in_flight != Some(event.id) {
            debug!("Discarding result of superseded request {}", event.id);
            return false;
        }
        self.in_flight = None;
        self.state.is_loading = false;
        self.state.has_result = true;

        match event.outcome {
            Ok(text) => {
                info!(
                    "Request {} recognized {} characters in {:?}",
                    event.id,
                    text.chars().count(),
                    event.elapsed
                );
                self.state.recognized_text = text;
                self.state.last_error = None;
            }
            Err(e) => {
                warn!("Request {} failed after {:?}: {}", event.id, event.elapsed, e);
                let message = e.to_string();
                self.state.recognized_text = format!("Error recognizing text: {}", message);
                self.state.last_error = Some(message);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecognitionError;
    use crate::vision::{FileImageLoader, TextRecognizer};
    use crossbeam_channel::{bounded, Receiver, Sender};
    use image::{Rgba, RgbaImage};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    const WAIT: Duration = Duration::from_secs(10);

    /// Returns a fixed outcome, optionally after a release signal
    struct FakeRecognizer {
        outcome: Result<String, RecognitionError>,
        gate: Option<Receiver<()>>,
    }

    impl TextRecognizer for FakeRecognizer {
        fn recognize(&self, _request: &RecognitionRequest) -> Result<String, RecognitionError> {
            if let Some(gate) = &self.gate {
                let _ = gate.recv_timeout(WAIT);
            }
            self.outcome.clone()
        }
    }

    fn controller(outcome: Result<String, RecognitionError>) -> OcrController {
        let recognizer = FakeRecognizer { outcome, gate: None };
        OcrController::new(
            Box::new(FileImageLoader::default()),
            RecognitionClient::new(Arc::new(recognizer)),
        )
    }

    fn gated_controller(outcome: Result<String, RecognitionError>) -> (OcrController, Sender<()>) {
        let (release, gate) = bounded(4);
        let recognizer = FakeRecognizer {
            outcome,
            gate: Some(gate),
        };
        let controller = OcrController::new(
            Box::new(FileImageLoader::default()),
            RecognitionClient::new(Arc::new(recognizer)),
        );
        (controller, release)
    }

    fn write_image(dir: &Path, name: &str) -> ImageReference {
        let path = dir.join(name);
        RgbaImage::from_pixel(16, 8, Rgba([255, 255, 255, 255])).save(&path).unwrap();
        ImageReference::new(path)
    }

    fn with_image() -> (TempDir, ImageReference) {
        let dir = tempdir().unwrap();
        let reference = write_image(dir.path(), "sign.png");
        (dir, reference)
    }

    #[test]
    fn test_pick_sets_image_reference() {
        let (_dir, reference) = with_image();
        let mut controller = controller(Ok(String::new()));

        controller.on_image_picked(Some(reference.clone()));

        assert_eq!(controller.state().image, Some(reference));
        assert_eq!(controller.preview().map(|b| b.dimensions()), Some((16, 8)));
        assert_eq!(controller.preview_generation(), 1);
        assert!(controller.state().notice.is_none());
    }

    #[test]
    fn test_cancelled_pick_leaves_state_unchanged() {
        let (_dir, reference) = with_image();
        let mut controller = controller(Ok(String::new()));
        controller.on_image_picked(Some(reference));
        let before = controller.state().clone();

        controller.on_image_picked(None);

        assert_eq!(controller.state(), &before);
        assert_eq!(controller.preview_generation(), 1);
    }

    #[test]
    fn test_select_image_requests_picker_once() {
        let mut controller = controller(Ok(String::new()));
        assert!(!controller.take_picker_request());

        controller.on_select_image();
        assert!(controller.take_picker_request());
        assert!(!controller.take_picker_request());
    }

    #[test]
    fn test_analyze_without_image_does_nothing() {
        let mut controller = controller(Ok("HELLO".to_string()));

        assert_eq!(controller.on_analyze(), AnalyzeOutcome::NoImage);
        assert_eq!(controller.state(), &ScreenState::default());
        assert!(!controller.wait_for_result(Duration::from_millis(50)));
    }

    #[test]
    fn test_analyze_sets_loading_until_result() {
        let (_dir, reference) = with_image();
        let (mut controller, release) = gated_controller(Ok("HELLO".to_string()));
        controller.on_image_picked(Some(reference));

        assert!(matches!(controller.on_analyze(), AnalyzeOutcome::Submitted(_)));
        assert!(controller.state().is_loading);
        assert!(!controller.poll());
        assert!(controller.state().is_loading);

        release.send(()).unwrap();
        assert!(controller.wait_for_result(WAIT));
        assert!(!controller.state().is_loading);
    }

    #[test]
    fn test_successful_recognition_sets_text() {
        let (_dir, reference) = with_image();
        let mut controller = controller(Ok("HELLO".to_string()));
        controller.on_image_picked(Some(reference));

        controller.on_analyze();
        assert!(controller.wait_for_result(WAIT));

        assert_eq!(controller.state().recognized_text, "HELLO");
        assert!(controller.state().last_error.is_none());
        assert!(!controller.state().is_loading);
    }

    #[test]
    fn test_empty_recognition_counts_as_result() {
        let (_dir, reference) = with_image();
        let mut controller = controller(Ok(String::new()));
        controller.on_image_picked(Some(reference));
        assert!(!controller.state().has_result);

        controller.on_analyze();
        assert!(controller.wait_for_result(WAIT));

        assert_eq!(controller.state().recognized_text, "");
        assert!(controller.state().has_result);
    }

    #[test]
    fn test_failed_recognition_surfaces_message() {
        let (_dir, reference) = with_image();
        let mut controller =
            controller(Err(RecognitionError::Engine("network unavailable".to_string())));
        controller.on_image_picked(Some(reference));

        controller.on_analyze();
        assert!(controller.wait_for_result(WAIT));

        let state = controller.state();
        assert!(state.recognized_text.contains("network unavailable"));
        assert!(state.recognized_text.starts_with("Error recognizing text"));
        assert_eq!(state.last_error.as_deref(), Some("network unavailable"));
        assert!(!state.is_loading);
    }

    #[test]
    fn test_analyze_while_running_is_rejected() {
        let (_dir, reference) = with_image();
        let (mut controller, release) = gated_controller(Ok("first".to_string()));
        controller.on_image_picked(Some(reference));

        let first = controller.on_analyze();
        assert!(matches!(first, AnalyzeOutcome::Submitted(_)));
        let before = controller.state().clone();

        assert_eq!(controller.on_analyze(), AnalyzeOutcome::Busy);
        assert_eq!(controller.state(), &before);

        release.send(()).unwrap();
        assert!(controller.wait_for_result(WAIT));
        assert_eq!(controller.state().recognized_text, "first");

        // Exclusive, not permanent
        release.send(()).unwrap();
        assert!(matches!(controller.on_analyze(), AnalyzeOutcome::Submitted(_)));
        assert!(controller.wait_for_result(WAIT));
    }

    #[test]
    fn test_undecodable_image_surfaces_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        let mut controller = controller(Ok("HELLO".to_string()));

        controller.on_image_picked(Some(ImageReference::new(&path)));
        assert!(controller.state().notice.is_some());
        assert!(controller.preview().is_none());

        assert_eq!(controller.on_analyze(), AnalyzeOutcome::LoadFailed);
        let state = controller.state();
        assert!(state.recognized_text.starts_with("Error loading image"));
        assert!(state.last_error.is_some());
        assert!(!state.is_loading);
    }

    #[test]
    fn test_image_deleted_after_pick_surfaces_error() {
        let (dir, reference) = with_image();
        let mut controller = controller(Ok("HELLO".to_string()));
        controller.on_image_picked(Some(reference.clone()));

        std::fs::remove_file(reference.path()).unwrap();
        drop(dir);

        assert_eq!(controller.on_analyze(), AnalyzeOutcome::LoadFailed);
        assert!(controller.state().recognized_text.contains("not found"));
    }

    #[test]
    fn test_result_of_other_request_is_ignored() {
        let (_dir, reference) = with_image();
        let mut controller = controller(Ok("HELLO".to_string()));
        controller.on_image_picked(Some(reference));

        // A result nobody is waiting for
        let stray = controller
            .client_mut()
            .submit(RecognitionRequest::new(Bitmap::new(RgbaImage::new(1, 1))));
        let event = controller.client_mut().recv_timeout(WAIT).unwrap();
        assert_eq!(event.id, stray);

        assert!(!controller.apply(event));
        assert_eq!(controller.state().recognized_text, "");
        assert!(!controller.state().is_loading);
    }

    #[test]
    fn test_new_pick_keeps_previous_text() {
        let dir = tempdir().unwrap();
        let first = write_image(dir.path(), "a.png");
        let second = write_image(dir.path(), "b.png");
        let mut controller = controller(Ok("HELLO".to_string()));

        controller.on_image_picked(Some(first));
        controller.on_analyze();
        assert!(controller.wait_for_result(WAIT));

        controller.on_image_picked(Some(second.clone()));
        assert_eq!(controller.state().image, Some(second));
        assert_eq!(controller.state().recognized_text, "HELLO");
        assert_eq!(controller.preview_generation(), 2);
    }
}
