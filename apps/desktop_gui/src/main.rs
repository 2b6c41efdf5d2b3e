use std::sync::Arc;

use anyhow::Context as _;
use client_core::{load_settings, CatalogEndpoint, EntityCache, HttpFetchTransport};
use crossbeam_channel::bounded;
use shared::EntityType;
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod controller;
mod ui;

use crate::controller::{
    events::UiEvent,
    orchestration::{BrowserController, RepaintHook},
};
use crate::ui::CatalogBrowserApp;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let endpoint = CatalogEndpoint::from_settings(&settings)?;
    let transport = HttpFetchTransport::new(settings.request_timeout())
        .context("failed to build catalog http client")?;
    let backend = backend_bridge::runtime::launch()?;
    let cache = EntityCache::with_options(
        Arc::new(transport),
        backend.handle(),
        settings.cache_options(),
    );
    tracing::info!(api_url = %endpoint.base_url(), "catalog browser starting");

    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Catalog Browser")
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Catalog Browser",
        options,
        Box::new(move |cc| {
            let egui_ctx = cc.egui_ctx.clone();
            let repaint: RepaintHook = Arc::new(move || egui_ctx.request_repaint());
            let controller =
                BrowserController::new(cache, endpoint, ui_tx, repaint, EntityType::Characters);
            Ok(Box::new(CatalogBrowserApp::new(controller, ui_rx)))
        }),
    )
    .map_err(|err| anyhow::anyhow!("gui exited with error: {err}"))?;

    drop(backend);
    Ok(())
}
