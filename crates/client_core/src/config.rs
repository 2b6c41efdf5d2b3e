use std::{fs, path::Path, time::Duration};

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::cache::CacheOptions;

pub const SETTINGS_FILE: &str = "catalog.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub request_timeout_secs: u64,
    pub revalidate_on_mount: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080/api".into(),
            request_timeout_secs: 10,
            revalidate_on_mount: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid catalog api url '{url}': {source}")]
    InvalidApiUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("catalog api url '{url}' must use http or https, not '{scheme}'")]
    UnsupportedScheme { url: String, scheme: String },
}

impl Settings {
    /// Parses `api_url` once; callers keep the validated string for key resolution.
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        let raw = self.api_url.trim();
        let url = Url::parse(raw).map_err(|source| SettingsError::InvalidApiUrl {
            url: raw.to_string(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(SettingsError::UnsupportedScheme {
                url: raw.to_string(),
                scheme: scheme.to_string(),
            }),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            revalidate_on_mount: self.revalidate_on_mount,
        }
    }
}

/// Defaults, then `catalog.toml` in the working directory, then environment variables.
pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |name| std::env::var(name).ok())
}

pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<toml::Table>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = table_value(&file_cfg, "api_url") {
                    settings.api_url = v;
                }
                if let Some(v) = table_value(&file_cfg, "request_timeout_secs") {
                    apply_timeout(&mut settings, &v);
                }
                if let Some(v) = table_value(&file_cfg, "revalidate_on_mount") {
                    apply_flag(&mut settings, &v);
                }
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "config: ignoring unparsable settings file"
                );
            }
        }
    }

    if let Some(v) = env("CATALOG_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        apply_timeout(&mut settings, &v);
    }
    if let Some(v) = env("APP__REVALIDATE_ON_MOUNT") {
        apply_flag(&mut settings, &v);
    }

    settings
}

fn table_value(table: &toml::Table, key: &str) -> Option<String> {
    match table.get(key)? {
        toml::Value::String(v) => Some(v.clone()),
        toml::Value::Integer(v) => Some(v.to_string()),
        toml::Value::Boolean(v) => Some(v.to_string()),
        other => {
            warn!(key, kind = other.type_str(), "config: ignoring non-scalar setting");
            None
        }
    }
}

fn apply_timeout(settings: &mut Settings, raw: &str) {
    match raw.trim().parse::<u64>() {
        Ok(parsed) => settings.request_timeout_secs = parsed,
        Err(_) => warn!(value = raw, "config: request timeout is not a whole number of seconds"),
    }
}

fn apply_flag(settings: &mut Settings, raw: &str) {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => settings.revalidate_on_mount = true,
        "0" | "false" | "no" | "off" => settings.revalidate_on_mount = false,
        _ => warn!(value = raw, "config: revalidate_on_mount is not a boolean"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
