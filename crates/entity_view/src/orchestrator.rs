use std::sync::Arc;

use client_core::{CacheSnapshot, CatalogEndpoint, EntityCache, Subscription};
use shared::{EntityType, ResourceKey};
use tracing::{debug, info};

use crate::{
    mode::PresentationMode,
    state::{select_view_state, ViewState, LOADING_LABEL, RETRY_LABEL},
    strategy::{present, Presentation},
};

/// What the presentation layer paints for the current state.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPlan {
    Busy {
        label: &'static str,
    },
    Error {
        message: &'static str,
        retry_label: &'static str,
    },
    Nothing,
    Content {
        mode: PresentationMode,
        toggle_label: &'static str,
        presentation: Presentation,
    },
}

/// One mounted entity screen: a cache subscription plus the session-local mode.
/// Dropping it unmounts the subscription.
#[derive(Debug)]
pub struct EntityView {
    entity: EntityType,
    subscription: Subscription,
    mode: PresentationMode,
}

impl EntityView {
    pub fn mount<F>(
        cache: &Arc<EntityCache>,
        endpoint: &CatalogEndpoint,
        entity: EntityType,
        on_change: F,
    ) -> Self
    where
        F: Fn(&CacheSnapshot) + Send + Sync + 'static,
    {
        let key = endpoint.resolve(entity);
        debug!(entity = %entity, key = %key, "view: mounting");
        Self {
            entity,
            subscription: cache.subscribe(key, on_change),
            mode: PresentationMode::default(),
        }
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    pub fn key(&self) -> &ResourceKey {
        self.subscription.key()
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        self.subscription.snapshot()
    }

    pub fn state(&self) -> ViewState {
        select_view_state(&self.subscription.snapshot(), self.mode)
    }

    /// Local flip only; fetch state is untouched.
    pub fn toggle_mode(&mut self) -> PresentationMode {
        self.mode = self.mode.toggled();
        info!(entity = %self.entity, mode = self.mode.label(), "view: presentation mode toggled");
        self.mode
    }

    /// Retry from the error state. Goes through cache revalidation, so it coalesces with
    /// any fetch already running and leaves the error visible until that fetch settles.
    pub fn retry(&self) -> bool {
        let started = self.subscription.revalidate();
        info!(entity = %self.entity, started, "view: retry requested");
        started
    }

    pub fn refresh(&self) -> bool {
        self.subscription.revalidate()
    }

    pub async fn changed(&mut self) -> bool {
        self.subscription.changed().await
    }

    pub fn render(&self) -> RenderPlan {
        match self.state() {
            ViewState::Loading => RenderPlan::Busy {
                label: LOADING_LABEL,
            },
            ViewState::Error { message, .. } => RenderPlan::Error {
                message,
                retry_label: RETRY_LABEL,
            },
            ViewState::Empty => RenderPlan::Nothing,
            ViewState::Rendering { collection, mode } => RenderPlan::Content {
                mode,
                toggle_label: mode.toggle_label(),
                presentation: present(mode, &collection, self.entity),
            },
        }
    }
}
