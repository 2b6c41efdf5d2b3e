use crossbeam_channel::Receiver;
use entity_view::RenderPlan;
use shared::EntityType;

use crate::controller::{
    events::{FetchPhase, UiEvent},
    orchestration::{BrowserController, UiAction},
};
use crate::ui::widgets;

pub struct CatalogBrowserApp {
    controller: BrowserController,
    ui_rx: Receiver<UiEvent>,
    status: String,
    validating: bool,
}

impl CatalogBrowserApp {
    pub fn new(controller: BrowserController, ui_rx: Receiver<UiEvent>) -> Self {
        let status = format!("Loading {}…", controller.view().entity().label());
        Self {
            controller,
            ui_rx,
            status,
            validating: false,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            // Notices from a view that has since been swapped out.
            if event.entity() != self.controller.view().entity() {
                continue;
            }
            let UiEvent::CacheChanged { phase, .. } = &event;
            self.validating = *phase == FetchPhase::Validating;
            self.status = event.status_line();
        }
    }

    fn show_top_bar(&self, ui: &mut egui::Ui, plan: &RenderPlan, actions: &mut Vec<UiAction>) {
        ui.horizontal(|ui| {
            let current = self.controller.view().entity();
            for entity in EntityType::ALL {
                if ui
                    .selectable_label(entity == current, entity.label())
                    .clicked()
                {
                    actions.push(UiAction::SelectEntity(entity));
                }
            }
            ui.separator();
            // The switch only exists while there is content to lay out.
            if let RenderPlan::Content { toggle_label, .. } = plan {
                if ui.button(*toggle_label).clicked() {
                    actions.push(UiAction::ToggleMode);
                }
            }
            if ui.button("Refresh").clicked() {
                actions.push(UiAction::Refresh);
            }
            if self.validating {
                ui.spinner();
            }
        });
    }
}

impl eframe::App for CatalogBrowserApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        let plan = self.controller.view().render();
        let mut actions = Vec::new();
        egui::TopBottomPanel::top("catalog_top_bar").show(ctx, |ui| {
            self.show_top_bar(ui, &plan, &mut actions);
        });
        egui::TopBottomPanel::bottom("catalog_status_bar").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(self.controller.view().entity().label());
            ui.add_space(8.0);
            if let Some(action) = widgets::show_plan(ui, &plan) {
                actions.push(action);
            }
        });

        for action in actions {
            self.controller.dispatch(action, &mut self.status);
        }
    }
}
