//! Per-request routing decision.
//!
//! # Responsibilities
//! - Probe candidate content locations in order
//! - Fall back to the redirect listing when no content exists
//! - Produce exactly one `RoutingDecision` per request
//!
//! # Design Decisions
//! - Immutable after construction (shared via Arc, no locks)
//! - Published content always wins over a redirect for the same path
//! - Probe and listing failures degrade to "not found" / "no rules"
//! - Probing is sequential and stops at the first hit

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::content::listing::RuleSource;
use crate::content::probe::{ContentProbe, ProbeOutcome};
use crate::observability::metrics;
use crate::routing::path::{normalize_path, PathResolver};
use crate::routing::redirect::{RedirectMatcher, ResolvedRedirect};

/// The engine's single output for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "target", rename_all = "snake_case")]
pub enum RoutingDecision {
    /// Published content exists; hand the original path to the renderer.
    RewriteToRenderer(String),
    /// A redirect rule matched.
    Redirect(ResolvedRedirect),
    /// Nothing to do; serve the request normally.
    PassThrough,
}

impl RoutingDecision {
    /// Label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RoutingDecision::RewriteToRenderer(_) => "rewrite",
            RoutingDecision::Redirect(_) => "redirect",
            RoutingDecision::PassThrough => "pass_through",
        }
    }
}

/// Where the redirect listing comes from.
#[derive(Debug, Clone)]
struct RedirectListing {
    source: Arc<dyn RuleSource>,
    location: String,
}

/// Composes content probing and redirect matching into one decision.
#[derive(Debug, Clone)]
pub struct RequestRouter {
    resolver: PathResolver,
    probe: Arc<dyn ContentProbe>,
    listing: Option<RedirectListing>,
    excluded_prefixes: Vec<String>,
}

impl RequestRouter {
    /// Router with content probing only; redirect matching disabled.
    pub fn new(resolver: PathResolver, probe: Arc<dyn ContentProbe>) -> Self {
        Self {
            resolver,
            probe,
            listing: None,
            excluded_prefixes: Vec::new(),
        }
    }

    /// Enable redirect matching against the listing at `location`.
    pub fn with_redirects(mut self, source: Arc<dyn RuleSource>, location: impl Into<String>) -> Self {
        self.listing = Some(RedirectListing {
            source,
            location: location.into(),
        });
        self
    }

    /// Paths under these prefixes always pass through untouched.
    pub fn with_excluded_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.excluded_prefixes = prefixes;
        self
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Location of the redirect listing, if matching is enabled.
    pub fn redirect_listing_location(&self) -> Option<&str> {
        self.listing.as_ref().map(|l| l.location.as_str())
    }

    pub fn is_excluded(&self, request_path: &str) -> bool {
        let path = normalize_path(request_path);
        self.excluded_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && path.starts_with(prefix.as_str()))
    }

    /// Decide what to do with `request_path`.
    pub async fn route(&self, request_path: &str) -> RoutingDecision {
        let start = Instant::now();

        let decision = if self.is_excluded(request_path) {
            RoutingDecision::PassThrough
        } else if self.has_page_object(request_path).await {
            RoutingDecision::RewriteToRenderer(request_path.to_string())
        } else if let Some(redirect) = self.get_redirect(request_path).await {
            RoutingDecision::Redirect(redirect)
        } else {
            RoutingDecision::PassThrough
        };

        tracing::debug!(path = %request_path, decision = decision.kind(), "Routing decision");
        metrics::record_decision(decision.kind(), start);
        decision
    }

    /// First existing candidate location and its record bytes.
    pub async fn find_content(&self, request_path: &str) -> Option<(String, Vec<u8>)> {
        for location in self.resolver.candidates(request_path) {
            match self.probe.probe(&location).await {
                Ok(ProbeOutcome::Found(body)) => {
                    tracing::debug!(path = %request_path, location = %location, "Content found");
                    return Some((location, body));
                }
                Ok(ProbeOutcome::NotFound) => {}
                Err(e) => {
                    tracing::warn!(location = %location, error = %e, "Content probe failed, treating as not found");
                    metrics::record_probe_error();
                }
            }
        }
        None
    }

    /// True if published content exists for `request_path`.
    pub async fn has_page_object(&self, request_path: &str) -> bool {
        self.find_content(request_path).await.is_some()
    }

    /// Load the current rule set and match `request_path` against it.
    pub async fn get_redirect(&self, request_path: &str) -> Option<ResolvedRedirect> {
        let matcher = self.load_matcher().await?;
        matcher.find(request_path)
    }

    /// Compile the current listing, `None` when matching is disabled or empty.
    pub async fn load_matcher(&self) -> Option<RedirectMatcher> {
        let listing = self.listing.as_ref()?;
        let rules = match listing.source.load_rules(&listing.location).await {
            Ok(rules) => rules,
            Err(e) => {
                tracing::warn!(location = %listing.location, error = %e, "Redirect listing unavailable, no rules applied");
                metrics::record_listing_error();
                return None;
            }
        };

        if rules.is_empty() {
            return None;
        }
        Some(RedirectMatcher::new(rules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ListingError, ProbeError};
    use crate::routing::redirect::{Disposal, MatchType, RedirectRule};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory content store. Locations mapped to `None` fail with a transport error.
    #[derive(Debug, Default)]
    struct MemoryProbe {
        entries: HashMap<String, Option<Vec<u8>>>,
        probed: Mutex<Vec<String>>,
    }

    impl MemoryProbe {
        fn with(entries: &[(&str, Option<&str>)]) -> Self {
            Self {
                entries: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.map(|s| s.as_bytes().to_vec())))
                    .collect(),
                probed: Mutex::new(Vec::new()),
            }
        }

        fn probed(&self) -> Vec<String> {
            self.probed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContentProbe for MemoryProbe {
        async fn probe(&self, location: &str) -> Result<ProbeOutcome, ProbeError> {
            self.probed.lock().unwrap().push(location.to_string());
            match self.entries.get(location) {
                Some(Some(body)) => Ok(ProbeOutcome::Found(body.clone())),
                Some(None) => Err(ProbeError::InvalidLocation(location.to_string())),
                None => Ok(ProbeOutcome::NotFound),
            }
        }
    }

    #[derive(Debug)]
    struct StaticRules(Result<Vec<RedirectRule>, u16>);

    #[async_trait]
    impl RuleSource for StaticRules {
        async fn load_rules(&self, _location: &str) -> Result<Vec<RedirectRule>, ListingError> {
            self.0.clone().map_err(ListingError::Status)
        }
    }

    fn resolver() -> PathResolver {
        PathResolver::new("/cms", "index.html").unwrap()
    }

    fn docs_rule() -> RedirectRule {
        RedirectRule::new(1, "/docs/", MatchType::Exact, "/manual/", Disposal::Permanent)
    }

    #[tokio::test]
    async fn test_content_wins_over_redirect() {
        let probe = Arc::new(MemoryProbe::with(&[("/cms/docs/index.html", Some("{}"))]));
        let router = RequestRouter::new(resolver(), probe.clone())
            .with_redirects(Arc::new(StaticRules(Ok(vec![docs_rule()]))), "/cms/redirects.json");

        assert_eq!(
            router.route("/docs/").await,
            RoutingDecision::RewriteToRenderer("/docs/".into())
        );
        assert_eq!(probe.probed(), vec!["/cms/docs/", "/cms/docs/index.html"]);
    }

    #[tokio::test]
    async fn test_probing_stops_at_first_hit() {
        let probe = Arc::new(MemoryProbe::with(&[
            ("/cms/docs/", Some("{}")),
            ("/cms/docs/index.html", Some("{}")),
        ]));
        let router = RequestRouter::new(resolver(), probe.clone());
        assert!(router.has_page_object("/docs/").await);
        assert_eq!(probe.probed(), vec!["/cms/docs/"]);
    }

    #[tokio::test]
    async fn test_probe_error_tries_next_candidate() {
        let probe = Arc::new(MemoryProbe::with(&[
            ("/cms/docs/", None),
            ("/cms/docs/index.html", Some("{}")),
        ]));
        let router = RequestRouter::new(resolver(), probe);
        assert_eq!(
            router.route("/docs/").await,
            RoutingDecision::RewriteToRenderer("/docs/".into())
        );
    }

    #[tokio::test]
    async fn test_redirect_when_no_content() {
        let router = RequestRouter::new(resolver(), Arc::new(MemoryProbe::default()))
            .with_redirects(Arc::new(StaticRules(Ok(vec![docs_rule()]))), "/cms/redirects.json");

        assert_eq!(
            router.route("docs/").await,
            RoutingDecision::Redirect(ResolvedRedirect {
                disposal: Disposal::Permanent,
                url: "/manual/".into()
            })
        );
    }

    #[tokio::test]
    async fn test_pass_through_without_rules() {
        let router = RequestRouter::new(resolver(), Arc::new(MemoryProbe::default()))
            .with_redirects(Arc::new(StaticRules(Ok(Vec::new()))), "/cms/redirects.json");
        assert_eq!(router.route("/nothing").await, RoutingDecision::PassThrough);

        let router = RequestRouter::new(resolver(), Arc::new(MemoryProbe::default()));
        assert_eq!(router.route("/docs/").await, RoutingDecision::PassThrough);
    }

    #[tokio::test]
    async fn test_listing_failure_is_pass_through() {
        let router = RequestRouter::new(resolver(), Arc::new(MemoryProbe::default()))
            .with_redirects(Arc::new(StaticRules(Err(500))), "/cms/redirects.json");
        assert_eq!(router.route("/docs/").await, RoutingDecision::PassThrough);
    }

    #[tokio::test]
    async fn test_excluded_prefix_skips_probe() {
        let probe = Arc::new(MemoryProbe::with(&[("/cms/api/x", Some("{}"))]));
        let router = RequestRouter::new(resolver(), probe.clone())
            .with_excluded_prefixes(vec!["/api".into(), String::new()]);
        assert_eq!(router.route("/api/x").await, RoutingDecision::PassThrough);
        assert!(probe.probed().is_empty());
        assert!(!router.is_excluded("/docs/"));
    }

    #[test]
    fn test_decision_serialization() {
        let value = serde_json::to_value(RoutingDecision::Redirect(ResolvedRedirect {
            disposal: Disposal::Temporary,
            url: "/x".into(),
        }))
        .unwrap();
        assert_eq!(value["decision"], "redirect");
        assert_eq!(value["target"]["disposal"], "302");
        assert_eq!(value["target"]["url"], "/x");

        let value = serde_json::to_value(RoutingDecision::PassThrough).unwrap();
        assert_eq!(value["decision"], "pass_through");
    }
}
