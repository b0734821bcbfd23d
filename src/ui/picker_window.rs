//! Image picker window

use egui::RichText;
use std::path::PathBuf;

use crate::picker::{EntryKind, ImageBrowser, PickerResponse};
use crate::ui::theme::ThemeColors;

/// Modal-style window wrapping an `ImageBrowser`
pub struct PickerWindow {
    browser: ImageBrowser,
    open: bool,
}

impl PickerWindow {
    pub fn new(start_dir: PathBuf, show_hidden: bool) -> Self {
        Self {
            browser: ImageBrowser::new(start_dir, show_hidden),
            open: true,
        }
    }

    /// Show the window; reports the user's decision once made
    pub fn show(&mut self, ctx: &egui::Context) -> PickerResponse {
        let mut response = PickerResponse::Pending;
        let mut open = self.open;

        egui::Window::new("Select Image")
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .default_size([420.0, 480.0])
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                response = self.render_contents(ui);
            });

        if !open || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            response = PickerResponse::Cancelled;
        }
        if response != PickerResponse::Pending {
            self.open = false;
        }
        response
    }

    fn render_contents(&mut self, ui: &mut egui::Ui) -> PickerResponse {
        let mut response = PickerResponse::Pending;
        let mut navigate_to: Option<PathBuf> = None;

        ui.horizontal(|ui| {
            let has_parent = self.browser.current_dir().parent().is_some();
            if ui.add_enabled(has_parent, egui::Button::new("Up")).clicked() {
                self.browser.go_up();
            }
            ui.label(
                RichText::new(self.browser.current_dir().display().to_string())
                    .size(13.0)
                    .color(ThemeColors::TEXT_SECONDARY),
            );
        });

        ui.horizontal(|ui| {
            ui.label("Filter:");
            ui.text_edit_singleline(&mut self.browser.filter);

            let mut show_hidden = self.browser.show_hidden();
            if ui.checkbox(&mut show_hidden, "Hidden").changed() {
                self.browser.set_show_hidden(show_hidden);
            }
        });

        ui.separator();

        if let Some(error) = self.browser.error() {
            ui.label(RichText::new(error).color(ThemeColors::ACCENT_ERROR));
        }

        let list_height = (ui.available_height() - 40.0).max(120.0);
        egui::ScrollArea::vertical()
            .max_height(list_height)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let selected = self.browser.selected().map(|p| p.to_path_buf());
                let mut clicked: Option<PathBuf> = None;
                let mut opened: Option<PathBuf> = None;

                for entry in self.browser.visible_entries() {
                    let label = match entry.kind {
                        EntryKind::Directory => format!("[dir]  {}", entry.name),
                        EntryKind::Image => entry.name.clone(),
                    };
                    let is_selected = selected.as_ref() == Some(&entry.path);
                    let item = ui.selectable_label(is_selected, label);

                    match entry.kind {
                        EntryKind::Directory if item.clicked() => {
                            navigate_to = Some(entry.path.clone());
                        }
                        EntryKind::Image if item.double_clicked() => {
                            opened = Some(entry.path.clone());
                        }
                        EntryKind::Image if item.clicked() => {
                            clicked = Some(entry.path.clone());
                        }
                        _ => {}
                    }
                }

                if let Some(path) = clicked {
                    self.browser.select(path);
                }
                if let Some(path) = opened {
                    self.browser.select(path);
                    if let Some(reference) = self.browser.confirm() {
                        response = PickerResponse::Picked(reference);
                    }
                }
            });

        if let Some(dir) = navigate_to {
            self.browser.enter(dir);
        }

        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Cancel").clicked() {
                response = PickerResponse::Cancelled;
            }
            let can_open = self.browser.selected().is_some();
            if ui.add_enabled(can_open, egui::Button::new("Open")).clicked() {
                if let Some(reference) = self.browser.confirm() {
                    response = PickerResponse::Picked(reference);
                }
            }
        });

        response
    }
}
