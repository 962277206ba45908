//! Content store existence probes.
//!
//! # Responsibilities
//! - Report whether a candidate location exists in the published content store
//! - Return the raw record bytes when it does
//!
//! # Design Decisions
//! - Transport is hidden behind `ContentProbe`; the router only sees the outcome
//! - Non-success HTTP statuses are `NotFound`, not errors
//! - Locations are always paths under the store base, never other hosts
//! - Filesystem locations are percent-decoded per segment; `..` is rejected

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{ProbeError, RouterError};

/// Result of probing one candidate location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Found(Vec<u8>),
    NotFound,
}

/// Existence check against the published content store.
#[async_trait]
pub trait ContentProbe: Send + Sync + std::fmt::Debug {
    async fn probe(&self, location: &str) -> Result<ProbeOutcome, ProbeError>;
}

/// Probes content over HTTP, relative to the content origin.
#[derive(Debug, Clone)]
pub struct HttpContentProbe {
    client: reqwest::Client,
    base: Url,
}

impl HttpContentProbe {
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

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl ContentProbe for HttpContentProbe {
    async fn probe(&self, location: &str) -> Result<ProbeOutcome, ProbeError> {
        let url = remote_url(&self.base, location);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            tracing::trace!(location = %location, status = %response.status(), "Content not found");
            return Ok(ProbeOutcome::NotFound);
        }

        let body = response.bytes().await?;
        Ok(ProbeOutcome::Found(body.to_vec()))
    }
}

/// Append a root-relative location to the base URL path.
pub(crate) fn remote_url(base: &Url, location: &str) -> Url {
    let mut url = base.clone();
    let prefix = base.path().strip_suffix('/').unwrap_or(base.path());
    if location.starts_with('/') {
        url.set_path(&format!("{}{}", prefix, location));
    } else {
        url.set_path(&format!("{}/{}", prefix, location));
    }
    url
}

/// Map a root-relative, percent-encoded location into `dir`.
///
/// Segments that decode to a parent reference or contain a separator are refused.
pub(crate) fn local_path(dir: &Path, location: &str) -> Option<PathBuf> {
    let mut path = dir.to_path_buf();
    for segment in location.split('/') {
        let decoded = percent_decode_str(segment).decode_utf8().ok()?;
        if decoded.contains(['/', '\\', '\0']) {
            return None;
        }
        match Path::new(&*decoded).components().next() {
            None | Some(Component::CurDir) => {}
            Some(Component::Normal(part)) => path.push(part),
            Some(_) => return None,
        }
    }
    Some(path)
}

/// Probes content exported to a local directory.
#[derive(Debug, Clone)]
pub struct FsContentProbe {
    dir: PathBuf,
}

impl FsContentProbe {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ContentProbe for FsContentProbe {
    async fn probe(&self, location: &str) -> Result<ProbeOutcome, ProbeError> {
        let path = local_path(&self.dir, location)
            .ok_or_else(|| ProbeError::InvalidLocation(location.to_string()))?;

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(ProbeOutcome::NotFound),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ProbeOutcome::NotFound),
            Err(e) => return Err(e.into()),
        }

        let body = tokio::fs::read(&path).await?;
        Ok(ProbeOutcome::Found(body))
    }
}
