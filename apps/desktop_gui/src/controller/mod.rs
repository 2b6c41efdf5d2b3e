//! Controller layer: cache notices for the UI loop and dispatch of UI actions onto the
//! mounted entity view.

pub mod events;
pub mod orchestration;
