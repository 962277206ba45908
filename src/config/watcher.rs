//! Hot reload of the router configuration and the local redirect listing.
//!
//! # Responsibilities
//! - Reload and validate the config file when it changes
//! - Report which settings changed, skipping no-op saves
//! - Watch the redirect listing of a local content export and check each
//!   new revision compiles, since a broken listing silently disables redirects
//!
//! # Design Decisions
//! - notify events are funneled into one task that owns the watcher, so the
//!   listing watch can follow a reloaded `content_dir` or listing path
//! - The listing is read per request by the router; the watcher only reports

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::loader::load_config;
use crate::config::schema::CmsConfig;
use crate::content::listing::parse_listing;
use crate::content::probe::local_path;
use crate::routing::redirect::RedirectMatcher;

/// Local file holding the redirect listing, when content is served from disk.
pub fn listing_file(config: &CmsConfig) -> Option<PathBuf> {
    let dir = config.content.content_dir.as_deref()?;
    let location = config.content.redirect_listing_location()?;
    let path = local_path(Path::new(dir), &location)?;
    Some(std::fs::canonicalize(&path).unwrap_or(path))
}

/// Validate a listing revision and log what the router will see.
pub async fn check_listing(path: &Path) -> Option<usize> {
    let body = match tokio::fs::read(path).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "Redirect listing unreadable, redirects disabled");
            return None;
        }
    };

    match parse_listing(&body) {
        Ok(rules) => {
            let matcher = RedirectMatcher::new(rules);
            tracing::info!(path = ?path, rules = matcher.len(), "Redirect listing updated");
            Some(matcher.len())
        }
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "Redirect listing is invalid, redirects disabled");
            None
        }
    }
}

/// Watches the config file and the local redirect listing.
pub struct ConfigWatcher {
    path: PathBuf,
    current: CmsConfig,
    update_tx: mpsc::UnboundedSender<CmsConfig>,
}

impl ConfigWatcher {
    /// Create a watcher for `path`, starting from the already loaded `current`.
    ///
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path, current: CmsConfig) -> (Self, mpsc::UnboundedReceiver<CmsConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                current,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. Must be called inside the Tokio runtime.
    pub fn run(self) -> Result<JoinHandle<()>, notify::Error> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = event_tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;
        let listing = listing_file(&self.current);
        if let Some(listing) = &listing {
            watch_listing(&mut watcher, listing);
        }

        tracing::info!(path = ?self.path, listing = ?listing, "Config watcher started");
        Ok(tokio::spawn(self.watch_loop(watcher, event_rx, listing)))
    }

    async fn watch_loop(
        mut self,
        mut watcher: RecommendedWatcher,
        mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
        mut listing: Option<PathBuf>,
    ) {
        while let Some(res) = events.recv().await {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!(error = ?e, "Watch error");
                    continue;
                }
            };
            if !(event.kind.is_modify() || event.kind.is_create()) {
                continue;
            }

            if let Some(path) = listing.as_ref().filter(|l| event.paths.contains(*l)) {
                check_listing(path).await;
                continue;
            }

            let Some(config) = self.reload() else { continue };
            let new_listing = listing_file(&config);
            if new_listing != listing {
                if let Some(old) = &listing {
                    let _ = watcher.unwatch(old);
                }
                if let Some(new) = &new_listing {
                    watch_listing(&mut watcher, new);
                    check_listing(new).await;
                }
                listing = new_listing;
            }

            if self.update_tx.send(config).is_err() {
                break;
            }
        }
    }

    /// Load the config file; `None` when it is invalid or unchanged.
    fn reload(&mut self) -> Option<CmsConfig> {
        let config = match load_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                return None;
            }
        };

        let changed = self.current.changed_fields(&config);
        if changed.is_empty() {
            tracing::debug!(path = ?self.path, "Config file touched without changes");
            return None;
        }

        tracing::info!(changed = ?changed, "Config file changed");
        self.current = config.clone();
        Some(config)
    }
}

fn watch_listing(watcher: &mut RecommendedWatcher, path: &Path) {
    if let Err(e) = watcher.watch(path, RecursiveMode::NonRecursive) {
        tracing::warn!(path = ?path, error = %e, "Cannot watch redirect listing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONFIG: &str = r#"
[content]
content_root = "/cms"
redirect_listing_path = "jshcms_redirects.json"
"#;

    #[test]
    fn test_listing_file_requires_local_export() {
        let mut config = CmsConfig::default();
        config.content.content_root = "/cms".into();
        config.content.redirect_listing_path = Some("jshcms_redirects.json".into());
        assert_eq!(listing_file(&config), None);

        config.content.content_dir = Some("/srv/export".into());
        assert_eq!(
            listing_file(&config),
            Some(PathBuf::from("/srv/export/cms/jshcms_redirects.json"))
        );

        config.content.redirect_listing_path = None;
        assert_eq!(listing_file(&config), None);
    }

    #[tokio::test]
    async fn test_check_listing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jshcms_redirects.json");

        std::fs::write(
            &path,
            br#"[{"redirect_url":"/old","redirect_url_type":"EXACT","redirect_dest":"/new","redirect_http_code":"301"}]"#,
        )
        .unwrap();
        assert_eq!(check_listing(&path).await, Some(1));

        std::fs::write(&path, b"{not json").unwrap();
        assert_eq!(check_listing(&path).await, None);

        assert_eq!(check_listing(&dir.path().join("missing.json")).await, None);
    }

    #[test]
    fn test_reload_skips_unchanged_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        let current = load_config(file.path()).unwrap();

        let (mut watcher, _updates) = ConfigWatcher::new(file.path(), current);
        assert!(watcher.reload().is_none());

        std::fs::write(
            file.path(),
            format!("{}\n[upstream]\nrenderer_path = \"/render\"\n", CONFIG),
        )
        .unwrap();
        let config = watcher.reload().unwrap();
        assert_eq!(config.upstream.renderer_path, "/render");
        assert_eq!(watcher.current.upstream.renderer_path, "/render");
    }
}
