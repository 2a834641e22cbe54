// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Miette diagnostics for configuration problems.
//!
//! Figment extraction errors are mapped onto [`ConfigError`], pointing at the
//! offending key inside the TOML file when it can be located and suggesting
//! the closest valid key for typos.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a valid key must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A TOML file that took part in loading, kept for span rendering.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(bizchat::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        /// Comma-separated keys accepted by the enclosing section.
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(bizchat::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A key the enabled provider needs is absent or blank.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(bizchat::config::missing_key),
        help("set `{key}` in bizchat.toml or through its BIZCHAT_ environment variable")
    )]
    MissingKey { key: String },

    #[error("validation error: {message}")]
    #[diagnostic(code(bizchat::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(bizchat::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Map every error carried by a figment failure onto a diagnostic.
pub fn figment_to_config_errors(err: figment::Error, sources: &[SourceFile]) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let section: Vec<String> = error.path.clone();
            match error.kind {
                Kind::UnknownField(ref key, expected) => {
                    let (span, src) = locate(&error, &section, key, sources);
                    ConfigError::UnknownKey {
                        suggestion: suggest_key(key, expected),
                        valid_keys: expected.join(", "),
                        key: key.clone(),
                        span,
                        src,
                    }
                }
                Kind::MissingField(ref key) => ConfigError::MissingKey {
                    key: dotted(&section, key),
                },
                Kind::InvalidType(ref actual, ref expected) => {
                    let (parent, leaf) = section.split_at(section.len().saturating_sub(1));
                    let (span, src) = match leaf.first() {
                        Some(leaf) => locate(&error, parent, leaf, sources),
                        None => (None, None),
                    };
                    ConfigError::InvalidType {
                        key: section.join("."),
                        detail: format!("found {actual}, expected {expected}"),
                        expected: expected.clone(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn dotted(section: &[String], key: &str) -> String {
    if section.is_empty() {
        key.to_string()
    } else {
        format!("{}.{key}", section.join("."))
    }
}

/// Resolve the file an error came from and the span of `key` inside it.
fn locate(
    error: &figment::Error,
    section: &[String],
    key: &str,
    sources: &[SourceFile],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = match error.metadata.as_ref().and_then(|m| m.source.as_ref()) {
        Some(figment::Source::File(path)) => Some(path.display().to_string()),
        // Inline strings have no file path; fall back to a single source.
        _ if sources.len() == 1 => Some(sources[0].name.clone()),
        _ => None,
    };

    let Some(file) = origin.and_then(|name| sources.iter().find(|s| s.name == name)) else {
        return (None, None);
    };

    match find_key_offset(&file.content, section, key) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), key.len())),
            Some(NamedSource::new(&file.name, file.content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `key` as an assignment inside the `[section]` table.
///
/// Tracks the current table header line by line, so a key of the same name
/// in another table is not matched.
pub fn find_key_offset(content: &str, section: &[String], key: &str) -> Option<usize> {
    let wanted = section.first().map(String::as_str);
    let mut current: Option<&str> = None;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(header) = trimmed.strip_prefix('[') {
            current = header.split(']').next().map(str::trim);
        } else if current == wanted
            && let Some(rest) = trimmed.strip_prefix(key)
            && rest.trim_start().starts_with('=')
        {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }

    None
}

/// Closest valid key by Jaro-Winkler similarity, if close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_access_token_for_typo() {
        let valid = &["enabled", "provider", "phone_number_id", "access_token"];
        assert_eq!(
            suggest_key("acess_token", valid),
            Some("access_token".to_string())
        );
    }

    #[test]
    fn suggests_webhook_secret_for_typo() {
        let valid = &["msg91_auth_key", "webhook_secret", "max_length"];
        assert_eq!(
            suggest_key("webhok_secret", valid),
            Some("webhook_secret".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        assert_eq!(suggest_key("zzzzzz", &["host", "port", "log_level"]), None);
    }

    #[test]
    fn key_offset_is_scoped_to_its_table() {
        let content = "[server]\nport = 3000\n\n[sms]\nport = 1\nwebhok_secret = \"x\"\n";
        let sms = vec!["sms".to_string()];
        let offset = find_key_offset(content, &sms, "port").unwrap();
        assert_eq!(offset, content.find("port = 1").unwrap());
        let offset = find_key_offset(content, &sms, "webhok_secret").unwrap();
        assert_eq!(&content[offset..offset + 13], "webhok_secret");
    }

    #[test]
    fn key_offset_missing_table() {
        let content = "[server]\nport = 3000\n";
        assert!(find_key_offset(content, &["payment".to_string()], "currency").is_none());
    }

    #[test]
    fn missing_key_paths_are_dotted() {
        assert_eq!(dotted(&["sms".into()], "max_length"), "sms.max_length");
        assert_eq!(dotted(&[], "server"), "server");
    }
}
