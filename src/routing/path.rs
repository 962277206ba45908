//! Request path to content location resolution.
//!
//! # Responsibilities
//! - Normalize root-relative request paths (`foo/bar` -> `/foo/bar`)
//! - Join the content root and request path with a slash-aware join
//! - Expand a path into the ordered list of candidate locations to probe
//!
//! # Design Decisions
//! - Pure string transformation, no I/O
//! - Most specific candidate first; callers stop at the first hit
//! - Internal duplicate separators are never collapsed

use crate::error::RouterError;

/// Default directory document when none is configured.
pub const DEFAULT_DOCUMENT: &str = "index.html";

/// Prefix a path with `/` unless it already is root-relative (or `//` absolute).
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Join two path fragments with exactly one `/` at the boundary.
///
/// If both sides carry a separator at the boundary one of them is dropped,
/// if neither does one is inserted. An empty side yields the other side.
pub fn join_url_path(left: &str, right: &str) -> String {
    if left.is_empty() {
        return right.to_string();
    }
    if right.is_empty() {
        return left.to_string();
    }

    match (left.ends_with('/'), right.starts_with('/')) {
        (true, true) => format!("{}{}", left, &right[1..]),
        (false, false) => format!("{}/{}", left, right),
        _ => format!("{}{}", left, right),
    }
}

/// Extension of the final path segment (text after its last `.`), if any.
fn extension(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    segment.rfind('.').map(|idx| &segment[idx + 1..])
}

fn same_extension(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// Maps request paths onto candidate storage locations under a content root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    content_root: String,
    default_document: String,
}

impl PathResolver {
    /// Create a resolver. An empty content root is a configuration error.
    pub fn new(
        content_root: impl Into<String>,
        default_document: impl Into<String>,
    ) -> Result<Self, RouterError> {
        let content_root = content_root.into();
        if content_root.is_empty() {
            return Err(RouterError::MissingContentRoot);
        }

        let mut default_document = default_document.into();
        if default_document.is_empty() {
            default_document = DEFAULT_DOCUMENT.to_string();
        }

        Ok(Self {
            content_root,
            default_document,
        })
    }

    pub fn content_root(&self) -> &str {
        &self.content_root
    }

    pub fn default_document(&self) -> &str {
        &self.default_document
    }

    /// Candidate locations for `request_path`, most specific first.
    pub fn candidates(&self, request_path: &str) -> Vec<String> {
        let joined = join_url_path(&self.content_root, &normalize_path(request_path));

        if joined.ends_with('/') {
            let with_default = join_url_path(&joined, &self.default_document);
            return vec![joined, with_default];
        }

        if same_extension(extension(&joined), extension(&self.default_document)) {
            vec![joined]
        } else {
            let with_default = join_url_path(&joined, &self.default_document);
            vec![joined, with_default]
        }
    }
}
