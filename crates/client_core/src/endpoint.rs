use shared::{EntityType, ResourceKey};

use crate::config::{Settings, SettingsError};

/// Maps entity types onto resource keys under one catalog base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEndpoint {
    base_url: String,
}

impl CatalogEndpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        settings.base_url()?;
        Ok(Self::new(settings.api_url.trim()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn resolve(&self, entity: EntityType) -> ResourceKey {
        let path = entity.as_path();
        if self.base_url.ends_with('/') {
            ResourceKey::from(format!("{}{path}", self.base_url))
        } else {
            ResourceKey::from(format!("{}/{path}", self.base_url))
        }
    }
}

#[cfg(test)]
#[path = "tests/endpoint_tests.rs"]
mod tests;
