//! Routing engine assembled from configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::config::schema::CmsConfig;
use crate::content::listing::{FsRuleSource, HttpRuleSource, RuleSource};
use crate::content::probe::{ContentProbe, FsContentProbe, HttpContentProbe};
use crate::error::RouterError;
use crate::routing::origin::OriginValidator;
use crate::routing::path::PathResolver;
use crate::routing::router::RequestRouter;

/// Everything needed to route a request and serve page records.
///
/// Built once per configuration load and shared immutably.
#[derive(Debug, Clone)]
pub struct Engine {
    pub router: RequestRouter,
    pub validator: OriginValidator,
}

impl Engine {
    pub fn new(router: RequestRouter, validator: OriginValidator) -> Self {
        Self { router, validator }
    }

    /// Build the engine and its content store collaborators.
    pub fn from_config(config: &CmsConfig) -> Result<Self, RouterError> {
        let content = &config.content;
        let resolver = PathResolver::new(content.content_root.trim(), content.default_document.trim())?;

        let probe: Arc<dyn ContentProbe>;
        let source: Arc<dyn RuleSource>;
        match &content.content_dir {
            Some(dir) => {
                probe = Arc::new(FsContentProbe::new(dir));
                source = Arc::new(FsRuleSource::new(dir));
            }
            None => {
                let base = content.content_url.as_deref().unwrap_or(&config.upstream.app_url);
                let timeout = Duration::from_secs(config.timeouts.probe_secs);
                let http_probe = HttpContentProbe::new(base, timeout)?;
                source = Arc::new(HttpRuleSource::with_client(
                    http_probe.client().clone(),
                    http_probe.base().clone(),
                ));
                probe = Arc::new(http_probe);
            }
        }

        let mut router = RequestRouter::new(resolver, probe)
            .with_excluded_prefixes(config.upstream.excluded_prefixes.clone());
        if let Some(location) = content.redirect_listing_location() {
            router = router.with_redirects(source, location);
        }

        tracing::info!(
            content_root = %content.content_root,
            redirects = router.redirect_listing_location().unwrap_or("disabled"),
            editor_origins = content.editor_allow_list.len(),
            "Routing engine ready"
        );

        Ok(Self::new(router, OriginValidator::new(content.editor_allow_list.clone())))
    }
}
