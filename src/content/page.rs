//! Page records for the rendering handler.
//!
//! # Responsibilities
//! - Fetch and decode the published page record for a path
//! - Provide the blank page used when no record exists
//! - Attach the editor launcher script for authorized CMS editor sessions
//!
//! # Design Decisions
//! - Any fetch or decode failure yields the blank page
//! - `null` record fields decode as empty values
//! - Unknown record fields are preserved for the renderer

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::PageError;
use crate::routing::origin::OriginValidator;
use crate::routing::router::RequestRouter;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn content_areas<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let areas: Option<BTreeMap<String, Option<String>>> = Option::deserialize(deserializer)?;
    Ok(areas
        .unwrap_or_default()
        .into_iter()
        .map(|(name, html)| (name, html.unwrap_or_default()))
        .collect())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSeo {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub keywords: String,
    #[serde(deserialize_with = "null_as_default")]
    pub metadesc: String,
    #[serde(deserialize_with = "null_as_default")]
    pub canonical_url: String,
}

/// Published page record, as exported by the CMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub seo: PageSeo,
    #[serde(deserialize_with = "null_as_default")]
    pub css: String,
    #[serde(deserialize_with = "null_as_default")]
    pub js: String,
    #[serde(deserialize_with = "null_as_default")]
    pub header: String,
    #[serde(deserialize_with = "null_as_default")]
    pub footer: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "content_areas")]
    pub content: BTreeMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub properties: Map<String, Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub page_template_id: String,

    /// Opened from a CMS editor session.
    #[serde(rename = "isInEditor")]
    pub is_in_editor: bool,

    /// Launcher script URL, only for authorized editor origins.
    #[serde(rename = "editorScript", skip_serializing_if = "Option::is_none")]
    pub editor_script: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PageRecord {
    fn default() -> Self {
        Self::blank()
    }
}

impl PageRecord {
    /// Empty page, for blank editors or missing content.
    pub fn blank() -> Self {
        let mut content = BTreeMap::new();
        content.insert("body".to_string(), String::new());
        Self {
            seo: PageSeo::default(),
            css: String::new(),
            js: String::new(),
            header: String::new(),
            footer: String::new(),
            title: String::new(),
            content,
            properties: Map::new(),
            page_template_id: String::new(),
            is_in_editor: false,
            editor_script: None,
            extra: Map::new(),
        }
    }
}

/// Query parameters the renderer receives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    /// Original request path.
    pub url: Option<String>,
    pub jshcms_token: Option<String>,
    /// Editor origin requesting to launch.
    pub jshcms_url: Option<String>,
}

impl PageQuery {
    fn editor_origin(&self) -> Option<&str> {
        match (&self.jshcms_token, &self.jshcms_url) {
            (Some(token), Some(url)) if !token.is_empty() && !url.is_empty() => Some(url),
            _ => None,
        }
    }
}

/// Page record for `path`, or the blank page when it cannot be loaded.
pub async fn get_page(router: &RequestRouter, path: &str) -> PageRecord {
    let Some((location, body)) = router.find_content(path).await else {
        return PageRecord::blank();
    };

    match serde_json::from_slice::<PageRecord>(&body) {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(location = %location, error = %e, "Page record is not valid JSON");
            PageRecord::blank()
        }
    }
}

/// Page for the rendering handler, with editor support when requested.
pub async fn get_standalone(
    router: &RequestRouter,
    validator: &OriginValidator,
    query: &PageQuery,
) -> Result<PageRecord, PageError> {
    let path = match query.url.as_deref() {
        Some(path) => path,
        None if query.jshcms_token.is_some() => "",
        None => return Err(PageError::NotFound),
    };

    let mut page = get_page(router, path).await;

    if let Some(origin) = query.editor_origin() {
        page.is_in_editor = true;
        page.editor_script = validator.editor_script_url(origin);
    }

    Ok(page)
}
