use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{Collection, FetchError, Item, ResourceKey};
use tracing::debug;

/// Fetches one collection. Any failure, network or application, is a [`FetchError`].
#[async_trait]
pub trait FetchTransport: Send + Sync {
    async fn fetch(&self, key: &ResourceKey) -> Result<Collection, FetchError>;
}

pub struct HttpFetchTransport {
    http: Client,
}

impl HttpFetchTransport {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl FetchTransport for HttpFetchTransport {
    async fn fetch(&self, key: &ResourceKey) -> Result<Collection, FetchError> {
        debug!(key = %key, "transport: GET");
        let response = self
            .http
            .get(key.as_str())
            .send()
            .await
            .map_err(|err| FetchError::new(format!("failed to reach catalog endpoint: {err}")))?
            .error_for_status()
            .map_err(|err| FetchError::new(format!("catalog endpoint returned error: {err}")))?;

        let body: Value = response
            .json()
            .await
            .map_err(|err| FetchError::new(format!("invalid catalog response payload: {err}")))?;
        decode_collection(body)
    }
}

/// Accepts a bare array of records or an object wrapping them under `results`.
pub fn decode_collection(body: Value) -> Result<Collection, FetchError> {
    let records = match body {
        Value::Array(records) => records,
        Value::Object(mut envelope) => match envelope.remove("results") {
            Some(Value::Array(records)) => records,
            _ => {
                return Err(FetchError::new(
                    "invalid catalog response payload: object without a 'results' array",
                ))
            }
        },
        other => {
            return Err(FetchError::new(format!(
                "invalid catalog response payload: expected an array, got {}",
                json_kind(&other)
            )))
        }
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| match record {
            Value::Object(fields) => Ok(fields
                .into_iter()
                .map(|(name, value)| (name, display_value(value)))
                .collect::<Item>()),
            other => Err(FetchError::new(format!(
                "invalid catalog response payload: record {index} is {}, not an object",
                json_kind(&other)
            ))),
        })
        .collect()
}

fn display_value(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        nested @ (Value::Array(_) | Value::Object(_)) => nested.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
