use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use client_core::{load_settings, CatalogEndpoint, EntityCache, HttpFetchTransport};
use entity_view::{EntityView, PresentationMode, RenderPlan, ViewStateKind};
use shared::EntityType;
use tokio::runtime::Handle;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod print;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Card,
    Table,
}

#[derive(Parser, Debug)]
#[command(about = "Fetch one catalog collection and print it as cards or a table")]
struct Args {
    /// characters, films, starships or planets
    #[arg(long, default_value = "characters")]
    entity: EntityType,
    #[arg(long, value_enum, default_value_t = ModeArg::Card)]
    mode: ModeArg,
    /// Overrides api_url from catalog.toml / environment.
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }
    let endpoint = CatalogEndpoint::from_settings(&settings)?;
    let transport = HttpFetchTransport::new(settings.request_timeout())
        .context("failed to build catalog http client")?;
    let cache = EntityCache::with_options(
        Arc::new(transport),
        Handle::current(),
        settings.cache_options(),
    );

    let mut view = EntityView::mount(&cache, &endpoint, args.entity, |_| {});
    if args.mode == ModeArg::Table && view.mode() == PresentationMode::Card {
        view.toggle_mode();
    }

    while view.state().kind() == ViewStateKind::Loading {
        if !view.changed().await {
            bail!("cache entry for {} closed before the fetch settled", view.key());
        }
    }

    match view.render() {
        RenderPlan::Busy { .. } => bail!("fetch for {} never settled", view.key()),
        RenderPlan::Error { message, .. } => {
            let reason = view
                .snapshot()
                .error
                .map(|err| err.to_string())
                .unwrap_or_default();
            error!(entity = %args.entity, %reason, "catalog fetch failed");
            bail!("{message}: {reason}");
        }
        RenderPlan::Nothing => {
            info!(entity = %args.entity, "catalog returned no items");
        }
        RenderPlan::Content { presentation, .. } => {
            println!("{}", print::format_presentation(&presentation));
        }
    }

    Ok(())
}
