//! Painting of a [`RenderPlan`]. Returns the action a click asked for, if any.

use egui::Ui;
use entity_view::{CardImage, CardUnit, Presentation, RenderPlan, TableModel};

use crate::controller::orchestration::UiAction;

const CARD_WIDTH: f32 = 220.0;

pub fn show_plan(ui: &mut Ui, plan: &RenderPlan) -> Option<UiAction> {
    match plan {
        RenderPlan::Busy { label } => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(*label);
            });
            None
        }
        RenderPlan::Error {
            message,
            retry_label,
        } => {
            ui.colored_label(ui.visuals().error_fg_color, *message);
            ui.add_space(6.0);
            ui.button(*retry_label).clicked().then_some(UiAction::Retry)
        }
        RenderPlan::Nothing => None,
        RenderPlan::Content { presentation, .. } => {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| match presentation {
                    Presentation::Cards(cards) => show_cards(ui, cards),
                    Presentation::Table(table) => show_table(ui, table),
                });
            None
        }
    }
}

fn show_cards(ui: &mut Ui, cards: &[CardUnit]) {
    ui.horizontal_wrapped(|ui| {
        for card in cards {
            ui.push_id(card.key, |ui| {
                egui::Frame::group(ui.style())
                    .corner_radius(8.0)
                    .inner_margin(egui::Margin::symmetric(10, 8))
                    .show(ui, |ui| {
                        ui.set_width(CARD_WIDTH);
                        ui.vertical(|ui| {
                            show_card_image(ui, &card.image);
                            ui.strong(&card.title);
                            ui.label(&card.description);
                        });
                    });
            });
        }
    });
}

// Remote images are not fetched; the slot keeps the card layout and names the picture.
fn show_card_image(ui: &mut Ui, image: &CardImage) {
    let size = egui::vec2(image.width as f32, image.height as f32);
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::hover());
    let painter = ui.painter();
    painter.rect_filled(rect, 4.0, ui.visuals().faint_bg_color);
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        &image.alt,
        egui::FontId::proportional(11.0),
        ui.visuals().weak_text_color(),
    );
    if !image.url.is_empty() {
        response.on_hover_text(&image.url);
    }
}

fn show_table(ui: &mut Ui, model: &TableModel) {
    egui::Grid::new(&model.aria_label)
        .striped(true)
        .num_columns(model.header.len())
        .show(ui, |ui| {
            for name in &model.header {
                ui.strong(name);
            }
            ui.end_row();
            for row in &model.rows {
                for cell in &row.cells {
                    ui.label(cell);
                }
                ui.end_row();
            }
        });
}
