//! Redirect rule matching.
//!
//! # Responsibilities
//! - Decode redirect rules from the CMS listing format
//! - Evaluate rules in listing order, first match wins
//! - Substitute regex captures into the destination template
//!
//! # Design Decisions
//! - Patterns compile once per rule set load, not per request
//! - Uses the `regex` crate (linear time) with a compiled size limit
//! - A rule whose pattern fails to compile never matches; other rules still do
//! - Paths longer than `MAX_REGEX_INPUT` skip regex rules entirely

use std::fmt;
use std::str::FromStr;

use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::observability::metrics;
use crate::routing::path::normalize_path;

/// Longest path evaluated against regex rules.
pub const MAX_REGEX_INPUT: usize = 8 * 1024;

/// Compiled program size limit for a single rule pattern.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// How a rule's `source_pattern` is compared with the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum MatchType {
    #[serde(rename = "EXACT")]
    Exact,
    #[serde(rename = "EXACTICASE")]
    ExactCaseInsensitive,
    #[serde(rename = "BEGINS")]
    Prefix,
    #[serde(rename = "BEGINSICASE")]
    PrefixCaseInsensitive,
    #[serde(rename = "REGEX")]
    Regex,
    #[serde(rename = "REGEXICASE")]
    RegexCaseInsensitive,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "EXACT",
            MatchType::ExactCaseInsensitive => "EXACTICASE",
            MatchType::Prefix => "BEGINS",
            MatchType::PrefixCaseInsensitive => "BEGINSICASE",
            MatchType::Regex => "REGEX",
            MatchType::RegexCaseInsensitive => "REGEXICASE",
        }
    }
}

impl FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EXACT" => Ok(MatchType::Exact),
            "EXACTICASE" => Ok(MatchType::ExactCaseInsensitive),
            "BEGINS" => Ok(MatchType::Prefix),
            "BEGINSICASE" => Ok(MatchType::PrefixCaseInsensitive),
            "REGEX" => Ok(MatchType::Regex),
            "REGEXICASE" => Ok(MatchType::RegexCaseInsensitive),
            other => Err(format!("unknown redirect_url_type '{}'", other)),
        }
    }
}

impl TryFrom<String> for MatchType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the hosting layer does with a matched redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "HttpCodeRepr")]
pub enum Disposal {
    /// HTTP 301.
    #[serde(rename = "301")]
    Permanent,
    /// HTTP 302.
    #[serde(rename = "302")]
    Temporary,
    /// Internal rewrite, no client-visible redirect.
    #[serde(rename = "PASSTHRU")]
    Passthrough,
}

impl Disposal {
    /// Status code sent to the client, `None` for internal rewrites.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Disposal::Permanent => Some(301),
            Disposal::Temporary => Some(302),
            Disposal::Passthrough => None,
        }
    }
}

/// Listings carry the code as a string, but tolerate a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum HttpCodeRepr {
    Text(String),
    Number(u16),
}

impl TryFrom<HttpCodeRepr> for Disposal {
    type Error = String;

    fn try_from(value: HttpCodeRepr) -> Result<Self, Self::Error> {
        match value {
            HttpCodeRepr::Text(s) => match s.as_str() {
                "301" => Ok(Disposal::Permanent),
                "302" => Ok(Disposal::Temporary),
                "PASSTHRU" => Ok(Disposal::Passthrough),
                other => Err(format!("unknown redirect_http_code '{}'", other)),
            },
            HttpCodeRepr::Number(301) => Ok(Disposal::Permanent),
            HttpCodeRepr::Number(302) => Ok(Disposal::Temporary),
            HttpCodeRepr::Number(other) => Err(format!("unknown redirect_http_code {}", other)),
        }
    }
}

/// A single entry of the CMS redirect listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRule {
    /// Informational identifier.
    #[serde(rename = "redirect_key", default)]
    pub key: i64,

    #[serde(rename = "redirect_url", default)]
    pub source_pattern: String,

    #[serde(rename = "redirect_url_type")]
    pub match_type: MatchType,

    /// May contain `$1`, `$2`, ... placeholders for regex captures.
    #[serde(rename = "redirect_dest", default)]
    pub destination_template: String,

    #[serde(rename = "redirect_http_code")]
    pub disposal: Disposal,
}

impl RedirectRule {
    pub fn new(
        key: i64,
        source_pattern: impl Into<String>,
        match_type: MatchType,
        destination_template: impl Into<String>,
        disposal: Disposal,
    ) -> Self {
        Self {
            key,
            source_pattern: source_pattern.into(),
            match_type,
            destination_template: destination_template.into(),
            disposal,
        }
    }
}

/// Outcome of a successful rule match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRedirect {
    pub disposal: Disposal,
    pub url: String,
}

#[derive(Debug)]
enum Pattern {
    Literal,
    Compiled(Regex),
    Invalid,
}

#[derive(Debug)]
struct CompiledRule {
    rule: RedirectRule,
    pattern: Pattern,
}

impl CompiledRule {
    fn compile(rule: RedirectRule) -> Self {
        let case_insensitive = match rule.match_type {
            MatchType::Regex => false,
            MatchType::RegexCaseInsensitive => true,
            _ => {
                return Self {
                    rule,
                    pattern: Pattern::Literal,
                }
            }
        };

        let pattern = match RegexBuilder::new(&rule.source_pattern)
            .case_insensitive(case_insensitive)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
        {
            Ok(regex) => Pattern::Compiled(regex),
            Err(e) => {
                tracing::warn!(
                    rule_key = rule.key,
                    pattern = %rule.source_pattern,
                    error = %e,
                    "Redirect rule pattern failed to compile, rule disabled"
                );
                metrics::record_rule_compile_error();
                Pattern::Invalid
            }
        };

        Self { rule, pattern }
    }

    fn resolve(&self, path: &str) -> Option<ResolvedRedirect> {
        let source = self.rule.source_pattern.as_str();
        let url = match (&self.pattern, self.rule.match_type) {
            (Pattern::Invalid, _) => return None,
            (Pattern::Compiled(regex), _) => {
                if path.len() > MAX_REGEX_INPUT {
                    return None;
                }
                let captures = regex.captures(path)?;
                substitute_captures(&self.rule.destination_template, &captures)
            }
            (Pattern::Literal, MatchType::Exact) => {
                if path != source {
                    return None;
                }
                self.rule.destination_template.clone()
            }
            (Pattern::Literal, MatchType::ExactCaseInsensitive) => {
                if path.to_lowercase() != source.to_lowercase() {
                    return None;
                }
                self.rule.destination_template.clone()
            }
            (Pattern::Literal, MatchType::Prefix) => {
                if !path.starts_with(source) {
                    return None;
                }
                self.rule.destination_template.clone()
            }
            (Pattern::Literal, MatchType::PrefixCaseInsensitive) => {
                if !path.to_lowercase().starts_with(&source.to_lowercase()) {
                    return None;
                }
                self.rule.destination_template.clone()
            }
            (Pattern::Literal, MatchType::Regex | MatchType::RegexCaseInsensitive) => return None,
        };

        Some(ResolvedRedirect {
            disposal: self.rule.disposal,
            url,
        })
    }
}

/// Replace `$N` placeholders with capture group text, highest index first.
///
/// Groups that did not participate in the match substitute an empty string.
fn substitute_captures(template: &str, captures: &Captures<'_>) -> String {
    let mut dest = template.to_string();
    for idx in (1..captures.len()).rev() {
        let text = captures.get(idx).map(|m| m.as_str()).unwrap_or("");
        dest = dest.replace(&format!("${}", idx), text);
    }
    dest
}

/// Ordered, pre-compiled redirect rule set.
#[derive(Debug, Default)]
pub struct RedirectMatcher {
    rules: Vec<CompiledRule>,
}

impl RedirectMatcher {
    /// Compile a rule set, preserving its order.
    pub fn new(rules: Vec<RedirectRule>) -> Self {
        Self {
            rules: rules.into_iter().map(CompiledRule::compile).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First matching rule's resolved redirect for `path`, if any.
    pub fn find(&self, path: &str) -> Option<ResolvedRedirect> {
        let path = normalize_path(path);
        self.rules.iter().find_map(|compiled| {
            let resolved = compiled.resolve(&path)?;
            tracing::debug!(
                rule_key = compiled.rule.key,
                match_type = %compiled.rule.match_type,
                path = %path,
                destination = %resolved.url,
                "Redirect rule matched"
            );
            Some(resolved)
        })
    }
}

/// Match `path` against `rules` without keeping the compiled set.
pub fn match_redirect(rules: &[RedirectRule], path: &str) -> Option<ResolvedRedirect> {
    RedirectMatcher::new(rules.to_vec()).find(path)
}
