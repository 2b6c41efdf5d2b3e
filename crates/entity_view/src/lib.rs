//! View orchestration for catalog entities: picks loading, error, empty or rendered output
//! from a cache snapshot and the session's presentation mode.

pub mod mode;
pub mod orchestrator;
pub mod state;
pub mod strategy;

pub use mode::PresentationMode;
pub use orchestrator::{EntityView, RenderPlan};
pub use state::{
    select_view_state, ViewState, ViewStateKind, LOADING_LABEL, LOAD_ERROR_MESSAGE, RETRY_LABEL,
};
pub use strategy::{
    present, render_cards, render_table, CardImage, CardUnit, Presentation, TableModel, TableRow,
    CARD_IMAGE_SIZE,
};
