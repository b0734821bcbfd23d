//! The OCR screen: image preview, recognized text and the two actions

use egui::load::SizedTexture;
use egui::{Align, Layout, RichText, Rounding};

use crate::controller::ScreenState;
use crate::ui::theme::ThemeColors;

/// User action emitted by the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAction {
    SelectImage,
    Analyze,
    CopyText,
}

/// Whether the analyze button accepts clicks
pub fn can_analyze(state: &ScreenState) -> bool {
    state.image.is_some() && !state.is_loading
}

/// Text shown in the output area
pub fn output_text(state: &ScreenState) -> &str {
    if state.is_loading {
        "Recognizing text..."
    } else if state.recognized_text.is_empty() && state.has_result {
        "No text found."
    } else if state.recognized_text.is_empty() && state.image.is_some() {
        "Press \"OCR Analyze\" to extract text."
    } else if state.recognized_text.is_empty() {
        "Select an image to get started."
    } else {
        &state.recognized_text
    }
}

/// Render the screen from `state`
pub fn render_screen(
    ui: &mut egui::Ui,
    state: &ScreenState,
    preview: Option<&egui::TextureHandle>,
) -> Option<ScreenAction> {
    let mut action = None;

    ui.with_layout(Layout::top_down(Align::Center), |ui| {
        ui.add_space(16.0);

        if let Some(texture) = preview {
            let max_size = egui::vec2(ui.available_width(), ui.available_height() * 0.45);
            ui.add(
                egui::Image::from_texture(SizedTexture::from_handle(texture))
                    .max_size(max_size)
                    .maintain_aspect_ratio(true)
                    .rounding(Rounding::same(6.0)),
            )
            .on_hover_text(
                state
                    .image
                    .as_ref()
                    .map(|r| r.to_string())
                    .unwrap_or_default(),
            );
        }

        if let Some(reference) = &state.image {
            ui.label(
                RichText::new(reference.display_name())
                    .size(13.0)
                    .color(ThemeColors::TEXT_MUTED),
            );
        }

        if let Some(notice) = &state.notice {
            ui.label(RichText::new(notice).size(14.0).color(ThemeColors::ACCENT_WARNING));
        }

        ui.add_space(16.0);

        render_output(ui, state, &mut action);

        ui.add_space(16.0);

        if ui
            .add_sized([200.0, 36.0], egui::Button::new("Select Image"))
            .clicked()
        {
            action = Some(ScreenAction::SelectImage);
        }

        ui.add_space(16.0);

        let analyze = egui::Button::new(RichText::new("OCR Analyze").color(ThemeColors::TEXT_PRIMARY))
            .fill(ThemeColors::ACCENT_PRIMARY);
        let response = ui.add_enabled_ui(can_analyze(state), |ui| ui.add_sized([200.0, 36.0], analyze));
        if response.inner.clicked() {
            action = Some(ScreenAction::Analyze);
        }
    });

    action
}

fn render_output(ui: &mut egui::Ui, state: &ScreenState, action: &mut Option<ScreenAction>) {
    egui::Frame::none()
        .fill(ThemeColors::BG_MEDIUM)
        .rounding(Rounding::same(8.0))
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());

            if state.is_loading {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(RichText::new(output_text(state)).color(ThemeColors::TEXT_SECONDARY));
                });
                return;
            }

            let color = if state.last_error.is_some() {
                ThemeColors::ACCENT_ERROR
            } else if state.recognized_text.is_empty() {
                ThemeColors::TEXT_MUTED
            } else {
                ThemeColors::TEXT_PRIMARY
            };

            egui::ScrollArea::vertical()
                .max_height(220.0)
                .auto_shrink([false, true])
                .show(ui, |ui| {
                    ui.add(egui::Label::new(RichText::new(output_text(state)).color(color)).selectable(true));
                });

            if !state.recognized_text.is_empty() && state.last_error.is_none() {
                ui.with_layout(Layout::right_to_left(Align::Min), |ui| {
                    if ui.small_button("Copy").clicked() {
                        *action = Some(ScreenAction::CopyText);
                    }
                });
            }
        });
}
