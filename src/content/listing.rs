//! Redirect listing loaders.
//!
//! # Responsibilities
//! - Fetch the exported CMS redirect listing (HTTP or local file)
//! - Decode it into an ordered rule set, skipping malformed entries

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::content::probe::{local_path, remote_url};
use crate::error::{ListingError, RouterError};
use crate::routing::redirect::RedirectRule;

/// Source of the current redirect rule set.
#[async_trait]
pub trait RuleSource: Send + Sync + std::fmt::Debug {
    async fn load_rules(&self, location: &str) -> Result<Vec<RedirectRule>, ListingError>;
}

/// Decode a listing document, preserving entry order.
///
/// `null` and non-array documents yield an empty rule set. Entries that do
/// not decode are skipped individually.
pub fn parse_listing(bytes: &[u8]) -> Result<Vec<RedirectRule>, ListingError> {
    let document: Value = serde_json::from_slice(bytes)?;
    let entries = match document {
        Value::Array(entries) => entries,
        Value::Null => return Ok(Vec::new()),
        other => {
            tracing::warn!(kind = %json_kind(&other), "Redirect listing is not an array, ignoring");
            return Ok(Vec::new());
        }
    };

    let mut rules = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        if entry.is_null() {
            continue;
        }
        match serde_json::from_value::<RedirectRule>(entry) {
            Ok(rule) => rules.push(rule),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed redirect entry");
            }
        }
    }
    Ok(rules)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Loads the listing over HTTP, relative to the content origin.
#[derive(Debug, Clone)]
pub struct HttpRuleSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpRuleSource {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, RouterError> {
        let base = Url::parse(base).map_err(|source| RouterError::InvalidContentUrl {
            url: base.to_string(),
            source,
        })?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base))
    }

    pub fn with_client(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }
}

#[async_trait]
impl RuleSource for HttpRuleSource {
    async fn load_rules(&self, location: &str) -> Result<Vec<RedirectRule>, ListingError> {
        let url = remote_url(&self.base, location);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ListingError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        parse_listing(&body)
    }
}

/// Loads the listing from a local content export.
#[derive(Debug, Clone)]
pub struct FsRuleSource {
    dir: PathBuf,
}

impl FsRuleSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl RuleSource for FsRuleSource {
    async fn load_rules(&self, location: &str) -> Result<Vec<RedirectRule>, ListingError> {
        let path = local_path(&self.dir, location)
            .ok_or_else(|| ListingError::InvalidLocation(location.to_string()))?;
        let body = tokio::fs::read(&path).await?;
        parse_listing(&body)
    }
}
