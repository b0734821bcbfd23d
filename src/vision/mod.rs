//! Vision Layer
//!
//! Image loading and text recognition:
//! - `loader` decodes picked images into bitmaps
//! - `recognizer` runs the ocrs engine over a bitmap
//! - `client` moves recognition off the UI thread

pub mod bitmap;
pub mod client;
pub mod loader;
pub mod models;
pub mod recognizer;

pub use bitmap::Bitmap;
pub use client::{RecognitionClient, RecognitionEvent, RequestId};
pub use loader::{FileImageLoader, ImageLoader};
pub use models::ModelManager;
pub use recognizer::{OcrsRecognizer, RecognitionRequest, TextRecognizer};
