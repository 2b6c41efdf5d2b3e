//! Client side of the catalog browser: the shared entity cache, its fetch transport and the
//! settings that locate the catalog API.

pub mod cache;
pub mod config;
pub mod endpoint;
pub mod transport;

pub use cache::{CacheOptions, CacheSnapshot, EntityCache, FetchResult, Subscription};
pub use config::{load_settings, load_settings_from, Settings, SettingsError};
pub use endpoint::CatalogEndpoint;
pub use transport::{decode_collection, FetchTransport, HttpFetchTransport};
