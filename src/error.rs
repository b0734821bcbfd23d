//! Error types for the picker, loader and recognition layers

use std::path::PathBuf;
use thiserror::Error;

/// Failure while browsing for an image
#[derive(Debug, Error)]
pub enum PickerError {
    #[error("cannot read directory {path:?}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0:?} is not a directory")]
    NotADirectory(PathBuf),
}

/// Failure while turning an image reference into a bitmap
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("image not found: {0:?}")]
    NotFound(PathBuf),
    #[error("permission denied: {0:?}")]
    PermissionDenied(PathBuf),
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl LoadError {
    /// Classify an I/O error raised while opening `path`
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(path),
            std::io::ErrorKind::PermissionDenied => LoadError::PermissionDenied(path),
            _ => LoadError::Io { path, source },
        }
    }
}

/// Failure reported by the recognition engine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecognitionError {
    /// Models could not be located, downloaded or loaded
    #[error("OCR models unavailable: {0}")]
    ModelsUnavailable(String),
    /// The engine rejected the input or failed during recognition
    #[error("{0}")]
    Engine(String),
    /// The worker thread could not be started
    #[error("failed to start recognition worker: {0}")]
    Spawn(String),
    /// The recognizer panicked while processing the request
    #[error("recognition worker panicked: {0}")]
    Panicked(String),
}
