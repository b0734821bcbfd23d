//! User Interface
//!
//! A single egui window: image preview, recognized text and two actions,
//! plus the image picker window.

pub mod app;
pub mod picker_window;
pub mod screen;
pub mod theme;

pub use app::run_app;
