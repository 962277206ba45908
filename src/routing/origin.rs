//! Editor origin allow-list validation.
//!
//! # Responsibilities
//! - Decide whether a CMS editor origin may inject its launcher script
//! - Build the launcher script URL for authorized origins
//!
//! # Design Decisions
//! - `*` authorizes any well-formed origin
//! - Unparsable allow-list entries are skipped, never fatal
//! - Candidate origins that do not parse or lack a host are denied
//! - Entries without `://` (for example `localhost:3000`) match any scheme
//! - Missing ports default to 443 (https) / 80 (http), per side

use url::Url;

use crate::error::OriginError;
use crate::routing::path::join_url_path;

/// Launcher script path, relative to the editor origin.
pub const EDITOR_SCRIPT_PATH: &str = "js/jsHarmonyCMS.js";

const WILDCARD: &str = "*";

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "https" => Some(443),
        "http" => Some(80),
        _ => None,
    }
}

/// A parsed allow-list entry. The scheme is optional.
#[derive(Debug, Clone)]
struct AllowedOrigin {
    scheme: Option<String>,
    host: String,
    port: Option<u16>,
    path: String,
}

impl AllowedOrigin {
    /// Parse an entry; entries without `://` borrow the candidate's scheme.
    fn parse(entry: &str, candidate: &Url) -> Option<Self> {
        let (url, scheme) = if entry.contains("://") {
            let url = Url::parse(entry).ok()?;
            let scheme = url.scheme().to_string();
            (url, Some(scheme))
        } else {
            let url = Url::parse(&format!("{}://{}", candidate.scheme(), entry)).ok()?;
            (url, None)
        };

        let host = url.host_str()?.to_ascii_lowercase();
        let path = match url.path() {
            "" => "/".to_string(),
            p => p.to_string(),
        };

        Some(Self {
            scheme,
            host,
            port: url.port(),
            path,
        })
    }

    fn matches(&self, candidate: &Url) -> bool {
        let candidate_scheme = candidate.scheme();

        if let Some(scheme) = &self.scheme {
            if !scheme.eq_ignore_ascii_case(candidate_scheme) {
                return false;
            }
        }

        let candidate_host = match candidate.host_str() {
            Some(h) => h,
            None => return false,
        };
        if !candidate_host.eq_ignore_ascii_case(&self.host) {
            return false;
        }

        let entry_scheme = self.scheme.as_deref().unwrap_or(candidate_scheme);
        let entry_port = self.port.or_else(|| default_port(entry_scheme));
        let candidate_port = candidate.port().or_else(|| default_port(candidate_scheme));
        if entry_port != candidate_port {
            return false;
        }

        let candidate_path = match candidate.path() {
            "" => "/",
            p => p,
        };
        candidate_path.starts_with(&self.path)
    }
}

/// Validates editor origins against an ordered allow-list.
#[derive(Debug, Clone, Default)]
pub struct OriginValidator {
    allow_list: Vec<String>,
}

impl OriginValidator {
    pub fn new(allow_list: Vec<String>) -> Self {
        Self { allow_list }
    }

    /// Parse an editor origin; it must be an absolute URL with a host.
    pub fn parse_candidate(candidate: &str) -> Result<Url, OriginError> {
        let url = Url::parse(candidate).map_err(|source| OriginError::InvalidCandidate {
            origin: candidate.to_string(),
            source,
        })?;
        if url.host_str().is_none() {
            return Err(OriginError::MissingHost(candidate.to_string()));
        }
        Ok(url)
    }

    /// Returns true if `candidate` is authorized to launch the editor.
    pub fn is_authorized(&self, candidate: &str) -> bool {
        let candidate_url = match Self::parse_candidate(candidate) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(error = %e, "Editor origin denied");
                return false;
            }
        };

        for entry in self.allow_list.iter().map(|e| e.trim()) {
            if entry.is_empty() {
                continue;
            }
            if entry == WILDCARD {
                return true;
            }
            match AllowedOrigin::parse(entry, &candidate_url) {
                Some(allowed) if allowed.matches(&candidate_url) => return true,
                Some(_) => {}
                None => {
                    tracing::debug!(entry = %entry, "Skipping unparsable editor allow-list entry");
                }
            }
        }

        false
    }

    /// Launcher script URL for an authorized origin, `None` if denied.
    pub fn editor_script_url(&self, candidate: &str) -> Option<String> {
        if !self.is_authorized(candidate) {
            tracing::info!(origin = %candidate, "Editor origin not in allow-list");
            return None;
        }

        let joined = join_url_path(candidate, EDITOR_SCRIPT_PATH);
        Some(match Url::parse(&joined) {
            Ok(url) => url.to_string(),
            Err(_) => joined,
        })
    }
}
