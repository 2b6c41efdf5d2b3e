//! Cache notices delivered from the backend thread to the UI loop.

use client_core::CacheSnapshot;
use shared::{EntityType, FetchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Loading,
    Validating,
    Failed,
    Settled,
}

impl FetchPhase {
    pub fn of(snapshot: &CacheSnapshot) -> Self {
        if snapshot.is_loading {
            FetchPhase::Loading
        } else if snapshot.is_validating {
            FetchPhase::Validating
        } else if snapshot.error.is_some() {
            FetchPhase::Failed
        } else {
            FetchPhase::Settled
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    CacheChanged {
        entity: EntityType,
        phase: FetchPhase,
        error: Option<FetchError>,
    },
}

impl UiEvent {
    pub fn from_snapshot(entity: EntityType, snapshot: &CacheSnapshot) -> Self {
        UiEvent::CacheChanged {
            entity,
            phase: FetchPhase::of(snapshot),
            error: snapshot.error.clone(),
        }
    }

    pub fn entity(&self) -> EntityType {
        match self {
            UiEvent::CacheChanged { entity, .. } => *entity,
        }
    }

    pub fn status_line(&self) -> String {
        match self {
            UiEvent::CacheChanged { entity, phase, error } => match phase {
                FetchPhase::Loading => format!("Loading {}…", entity.label()),
                FetchPhase::Validating => format!("Refreshing {}…", entity.label()),
                FetchPhase::Failed => match error {
                    Some(err) => format!("Failed to load {}: {err}", entity.label()),
                    None => format!("Failed to load {}", entity.label()),
                },
                FetchPhase::Settled => format!("{} up to date", entity.label()),
            },
        }
    }
}
