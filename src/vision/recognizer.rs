//! Text recognition engines
//!
//! Uses the ocrs models on the rten runtime for on-device text detection
//! and recognition.

use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::bitmap::{Bitmap, Rotation};
use super::models::{ModelManager, ModelType};
use crate::error::RecognitionError;

/// A single recognition request
#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    pub bitmap: Bitmap,
    pub rotation: Rotation,
}

impl RecognitionRequest {
    pub fn new(bitmap: Bitmap) -> Self {
        Self {
            bitmap,
            rotation: Rotation::None,
        }
    }
}

/// Engine that turns a bitmap into text
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, request: &RecognitionRequest) -> Result<String, RecognitionError>;
}

/// Recognizer backed by the ocrs engine
///
/// Models are loaded on the first request and the engine is reused after.
pub struct OcrsRecognizer {
    models: ModelManager,
    engine: Mutex<Option<Arc<OcrEngine>>>,
}

impl OcrsRecognizer {
    pub fn new(models: ModelManager) -> Self {
        Self {
            models,
            engine: Mutex::new(None),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.lock().is_some()
    }

    /// Get the engine, loading models on first use
    fn engine(&self) -> Result<Arc<OcrEngine>, RecognitionError> {
        // Held across loading so concurrent first requests load once
        let mut guard = self.engine.lock();
        if let Some(engine) = guard.as_ref() {
            return Ok(engine.clone());
        }

        info!("Initializing OCR engine");
        let start = Instant::now();

        let detection_model = self.load_model(ModelType::Detection)?;
        let recognition_model = self.load_model(ModelType::Recognition)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| RecognitionError::ModelsUnavailable(e.to_string()))?;

        info!("OCR engine initialized in {:?}", start.elapsed());

        let engine = Arc::new(engine);
        *guard = Some(engine.clone());
        Ok(engine)
    }

    fn load_model(&self, model_type: ModelType) -> Result<rten::Model, RecognitionError> {
        let path = self
            .models
            .ensure_model(model_type)
            .map_err(|e| RecognitionError::ModelsUnavailable(format!("{:#}", e)))?;

        rten::Model::load_file(&path).map_err(|e| {
            RecognitionError::ModelsUnavailable(format!(
                "failed to load {} model from {:?}: {}",
                model_type.display_name(),
                path,
                e
            ))
        })
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn recognize(&self, request: &RecognitionRequest) -> Result<String, RecognitionError> {
        let engine = self.engine()?;

        let rgb = request.bitmap.to_rgb8(request.rotation);
        debug!(
            "Recognizing {}x{} image (rotation {})",
            rgb.width(),
            rgb.height(),
            request.rotation.degrees()
        );

        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())
            .map_err(|e| RecognitionError::Engine(e.to_string()))?;
        let input = engine
            .prepare_input(source)
            .map_err(|e| RecognitionError::Engine(e.to_string()))?;
        let text = engine
            .get_text(&input)
            .map_err(|e| RecognitionError::Engine(e.to_string()))?;

        debug!("Recognized {} characters", text.chars().count());
        Ok(text)
    }
}
