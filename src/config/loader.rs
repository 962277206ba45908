//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::CmsConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Environment variables overriding the content section.
pub const ENV_CONTENT_PATH: &str = "CMS_CONTENT_PATH";
pub const ENV_CONTENT_URL: &str = "CMS_CONTENT_URL";
pub const ENV_SERVER_URLS: &str = "CMS_SERVER_URL";

/// Parse a TOML document without validating it.
pub fn parse_config(content: &str) -> Result<CmsConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Apply `CMS_*` environment overrides using `lookup` for variable access.
pub fn apply_env_overrides<F>(config: &mut CmsConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(ENV_CONTENT_PATH).filter(|v| !v.is_empty()) {
        config.content.content_root = path;
    }
    if let Some(url) = lookup(ENV_CONTENT_URL).filter(|v| !v.is_empty()) {
        config.content.content_url = Some(url);
    }
    if let Some(urls) = lookup(ENV_SERVER_URLS).filter(|v| !v.is_empty()) {
        config.content.editor_allow_list = urls
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

/// Validate a configuration, collecting every error.
pub fn finalize(config: CmsConfig) -> Result<CmsConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<CmsConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    finalize(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[content]
content_root = "/cms"
content_url = "http://127.0.0.1:3000"
redirect_listing_path = "jshcms_redirects.json"
editor_allow_list = ["https://cms.example.com"]

[upstream]
app_url = "http://127.0.0.1:4000"

[timeouts]
probe_secs = 2
"#;

    #[test]
    fn test_parse_config_with_defaults() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.content.content_root, "/cms");
        assert_eq!(config.content.default_document, "index.html");
        assert_eq!(config.timeouts.probe_secs, 2);
        assert_eq!(config.timeouts.request_secs, 30);
        assert_eq!(config.upstream.renderer_path, "/cms_support/page_object");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = parse_config(SAMPLE).unwrap();
        apply_env_overrides(&mut config, |key| match key {
            ENV_CONTENT_PATH => Some("/export".to_string()),
            ENV_SERVER_URLS => Some("https://a.example.com, *".to_string()),
            _ => None,
        });
        assert_eq!(config.content.content_root, "/export");
        assert_eq!(config.content.content_url.as_deref(), Some("http://127.0.0.1:3000"));
        assert_eq!(config.content.editor_allow_list, vec!["https://a.example.com", "*"]);
    }

    #[test]
    fn test_load_config_rejects_missing_root() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[content]\ndefault_document = \"index.html\"").unwrap();

        let result = parse_config(&std::fs::read_to_string(file.path()).unwrap())
            .and_then(finalize);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();
        let config = parse_config(&std::fs::read_to_string(file.path()).unwrap())
            .and_then(finalize)
            .unwrap();
        assert_eq!(config.upstream.app_url, "http://127.0.0.1:4000");
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(parse_config("[content"), Err(ConfigError::Parse(_))));
    }
}
