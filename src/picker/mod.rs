//! Image Picker
//!
//! Browses the filesystem for image files and yields a reference to the
//! one the user confirms. Cancelling yields nothing.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::PickerError;

/// Opaque handle to user-selected image content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference(PathBuf);

impl ImageReference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// File name shown in the UI
    pub fn display_name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.display().to_string())
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Outcome of one picker session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerResponse {
    /// The user is still browsing
    Pending,
    /// The user confirmed an image
    Picked(ImageReference),
    /// The user closed the picker without choosing
    Cancelled,
}

impl PickerResponse {
    /// Collapse a finished session into the picker result
    pub fn into_result(self) -> Option<Option<ImageReference>> {
        match self {
            PickerResponse::Pending => None,
            PickerResponse::Picked(reference) => Some(Some(reference)),
            PickerResponse::Cancelled => Some(None),
        }
    }
}

/// Kind of a listed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    Image,
}

/// A directory or image file shown in the picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Check whether a path names a file in a decodable image format
pub fn is_image_path(path: &Path) -> bool {
    image::ImageFormat::from_path(path)
        .map(|format| format.reading_enabled())
        .unwrap_or(false)
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// List subdirectories and image files of `dir`
///
/// Directories come first, then images, each sorted case-insensitively.
/// Entries that cannot be inspected are skipped.
pub fn list_directory(dir: &Path, show_hidden: bool) -> Result<Vec<DirectoryEntry>, PickerError> {
    if !dir.is_dir() {
        return Err(PickerError::NotADirectory(dir.to_path_buf()));
    }

    let read_dir = std::fs::read_dir(dir).map_err(|source| PickerError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut entries: Vec<DirectoryEntry> = read_dir
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !show_hidden && is_hidden(&name) {
                return None;
            }

            let path = entry.path();
            // Follows symlinks
            let kind = if path.is_dir() {
                EntryKind::Directory
            } else if path.is_file() && is_image_path(&path) {
                EntryKind::Image
            } else {
                return None;
            };

            Some(DirectoryEntry { name, path, kind })
        })
        .collect();

    entries.sort_by(|a, b| match (a.kind, b.kind) {
        (EntryKind::Directory, EntryKind::Image) => Ordering::Less,
        (EntryKind::Image, EntryKind::Directory) => Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });

    debug!("Listed {} entries in {:?}", entries.len(), dir);
    Ok(entries)
}

/// Browsing state of the image picker
#[derive(Debug)]
pub struct ImageBrowser {
    current_dir: PathBuf,
    entries: Vec<DirectoryEntry>,
    /// Case-insensitive substring filter on entry names
    pub filter: String,
    show_hidden: bool,
    selected: Option<PathBuf>,
    error: Option<String>,
}

impl ImageBrowser {
    /// Open the browser in `start_dir`
    pub fn new(start_dir: PathBuf, show_hidden: bool) -> Self {
        let mut browser = Self {
            current_dir: start_dir,
            entries: Vec::new(),
            filter: String::new(),
            show_hidden,
            selected: None,
            error: None,
        };
        browser.refresh();
        browser
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    pub fn set_show_hidden(&mut self, show_hidden: bool) {
        if self.show_hidden != show_hidden {
            self.show_hidden = show_hidden;
            self.refresh();
        }
    }

    /// Re-read the current directory
    pub fn refresh(&mut self) {
        match list_directory(&self.current_dir, self.show_hidden) {
            Ok(entries) => {
                self.entries = entries;
                self.error = None;
            }
            Err(e) => {
                self.entries.clear();
                self.error = Some(e.to_string());
            }
        }

        let still_listed = self
            .selected
            .as_ref()
            .is_some_and(|sel| self.entries.iter().any(|e| &e.path == sel));
        if !still_listed {
            self.selected = None;
        }
    }

    /// Entries matching the current filter (directories are always shown)
    pub fn visible_entries(&self) -> impl Iterator<Item = &DirectoryEntry> {
        let needle = self.filter.to_lowercase();
        self.entries.iter().filter(move |entry| {
            needle.is_empty()
                || entry.kind == EntryKind::Directory
                || entry.name.to_lowercase().contains(&needle)
        })
    }

    /// Navigate into `dir`
    pub fn enter(&mut self, dir: PathBuf) {
        self.current_dir = dir;
        self.selected = None;
        self.refresh();
    }

    /// Navigate to the parent directory, if any
    pub fn go_up(&mut self) -> bool {
        match self.current_dir.parent() {
            Some(parent) => {
                let parent = parent.to_path_buf();
                self.enter(parent);
                true
            }
            None => false,
        }
    }

    /// Highlight an image entry
    pub fn select(&mut self, path: PathBuf) {
        if is_image_path(&path) {
            self.selected = Some(path);
        }
    }

    pub fn selected(&self) -> Option<&Path> {
        self.selected.as_deref()
    }

    /// Confirm the highlighted image
    pub fn confirm(&self) -> Option<ImageReference> {
        self.selected.clone().map(ImageReference::new)
    }
}
