use std::sync::Arc;

use client_core::{CacheSnapshot, FetchResult};
use shared::{Collection, FetchError};

use crate::mode::PresentationMode;

pub const LOAD_ERROR_MESSAGE: &str = "Error al cargar datos";
pub const RETRY_LABEL: &str = "Reintentar";
pub const LOADING_LABEL: &str = "Cargando…";

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Loading,
    Error {
        message: &'static str,
        reason: FetchError,
    },
    Empty,
    Rendering {
        collection: Arc<Collection>,
        mode: PresentationMode,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStateKind {
    Loading,
    Error,
    Empty,
    Rendering,
}

impl ViewState {
    pub fn kind(&self) -> ViewStateKind {
        match self {
            ViewState::Loading => ViewStateKind::Loading,
            ViewState::Error { .. } => ViewStateKind::Error,
            ViewState::Empty => ViewStateKind::Empty,
            ViewState::Rendering { .. } => ViewStateKind::Rendering,
        }
    }
}

/// Loading > Error > Empty > Rendering. Stale data never hides an error.
pub fn select_view_state(snapshot: &CacheSnapshot, mode: PresentationMode) -> ViewState {
    match snapshot.result() {
        FetchResult::Loading => ViewState::Loading,
        FetchResult::Error(reason) => ViewState::Error {
            message: LOAD_ERROR_MESSAGE,
            reason: reason.clone(),
        },
        FetchResult::Success(_) => match &snapshot.data {
            Some(collection) if !collection.is_empty() => ViewState::Rendering {
                collection: Arc::clone(collection),
                mode,
            },
            _ => ViewState::Empty,
        },
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
