//! UI layer for the catalog browser: app shell and render-plan widgets.

pub mod app;
pub mod widgets;

pub use app::CatalogBrowserApp;
