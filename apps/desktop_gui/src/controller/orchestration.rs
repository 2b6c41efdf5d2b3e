//! UI actions and their dispatch onto the mounted entity view.

use std::sync::Arc;

use client_core::{CatalogEndpoint, EntityCache};
use crossbeam_channel::{Sender, TrySendError};
use entity_view::EntityView;
use shared::EntityType;

use crate::controller::events::UiEvent;

/// Asks the UI to paint again. Called from the backend thread.
pub type RepaintHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    SelectEntity(EntityType),
    ToggleMode,
    Retry,
    Refresh,
}

impl UiAction {
    fn name(self) -> &'static str {
        match self {
            UiAction::SelectEntity(_) => "select_entity",
            UiAction::ToggleMode => "toggle_mode",
            UiAction::Retry => "retry",
            UiAction::Refresh => "refresh",
        }
    }
}

pub struct BrowserController {
    cache: Arc<EntityCache>,
    endpoint: CatalogEndpoint,
    ui_tx: Sender<UiEvent>,
    repaint: RepaintHook,
    view: EntityView,
}

impl BrowserController {
    pub fn new(
        cache: Arc<EntityCache>,
        endpoint: CatalogEndpoint,
        ui_tx: Sender<UiEvent>,
        repaint: RepaintHook,
        entity: EntityType,
    ) -> Self {
        let view = mount_view(&cache, &endpoint, entity, &ui_tx, &repaint);
        Self {
            cache,
            endpoint,
            ui_tx,
            repaint,
            view,
        }
    }

    pub fn view(&self) -> &EntityView {
        &self.view
    }

    pub fn dispatch(&mut self, action: UiAction, status: &mut String) {
        match action {
            UiAction::SelectEntity(entity) => {
                if entity == self.view.entity() {
                    return;
                }
                self.view =
                    mount_view(&self.cache, &self.endpoint, entity, &self.ui_tx, &self.repaint);
            }
            UiAction::ToggleMode => {
                self.view.toggle_mode();
            }
            UiAction::Retry => {
                if !self.view.retry() {
                    *status = format!("Already reloading {}", self.view.entity().label());
                }
            }
            UiAction::Refresh => {
                if !self.view.refresh() {
                    *status = format!("Already refreshing {}", self.view.entity().label());
                }
            }
        }
        tracing::debug!(action = action.name(), entity = %self.view.entity(), "applied ui action");
    }
}

fn mount_view(
    cache: &Arc<EntityCache>,
    endpoint: &CatalogEndpoint,
    entity: EntityType,
    ui_tx: &Sender<UiEvent>,
    repaint: &RepaintHook,
) -> EntityView {
    let ui_tx = ui_tx.clone();
    let repaint = Arc::clone(repaint);
    EntityView::mount(cache, endpoint, entity, move |snapshot| {
        match ui_tx.try_send(UiEvent::from_snapshot(entity, snapshot)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::debug!(entity = %entity, "ui event queue full; dropping cache notice");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!(entity = %entity, "ui event receiver gone");
                return;
            }
        }
        repaint();
    })
}
