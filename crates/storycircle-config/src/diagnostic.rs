// SPDX-FileCopyrightText: 2026 Story Circle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment failures and validation findings into miette diagnostics.
//!
//! Unknown keys get a "did you mean" hint from Jaro-Winkler similarity, and
//! when the offending file is known the key is underlined in its source.

#![allow(unused_assignments)] // emitted by the miette derive

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Below this Jaro-Winkler score no suggestion is offered.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, renderable as a miette report.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {section}")]
    #[diagnostic(
        code(storycircle::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// `[questions]`-style table name, or "the top level".
        section: String,
        suggestion: Option<String>,
        /// Comma-separated keys accepted in `section`.
        valid_keys: String,
        #[label("not a known setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(storycircle::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// Dotted path, e.g. `questions.cooldown_secs`.
        key: String,
        found: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing key `{key}`")]
    #[diagnostic(
        code(storycircle::config::missing_key),
        help("set `{key}` in storycircle.toml or remove the table to use the defaults")
    )]
    MissingKey { key: String },

    /// A value parsed but is not acceptable.
    #[error("invalid value for `{key}`: {message}")]
    #[diagnostic(code(storycircle::config::validation))]
    Validation { key: String, message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(storycircle::config::other))]
    Other(String),
}

impl ConfigError {
    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Validation {
            key: key.into(),
            message: message.into(),
        }
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

fn section_name(path: &[String]) -> String {
    if path.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{}]", path.join("."))
    }
}

/// Converts every error carried by a `figment::Error`.
///
/// `sources` pairs a display path with the file's content; it is used only to
/// attach spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let located = SourceLookup::for_error(&error, sources);
            match &error.kind {
                Kind::UnknownField(field, expected) => ConfigError::UnknownKey {
                    key: field.clone(),
                    section: section_name(&error.path),
                    suggestion: suggest_key(field, expected),
                    valid_keys: expected.join(", "),
                    span: located.as_ref().and_then(|l| l.key_span(&error.path, field)),
                    src: located.map(SourceLookup::into_named),
                },
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: dotted(&error.path, field),
                },
                Kind::InvalidType(found, expected) | Kind::InvalidValue(found, expected) => {
                    let (table, field) = match error.path.split_last() {
                        Some((last, table)) => (table.to_vec(), last.clone()),
                        None => (Vec::new(), String::new()),
                    };
                    ConfigError::InvalidType {
                        key: error.path.join("."),
                        found: found.to_string(),
                        expected: expected.clone(),
                        span: located.as_ref().and_then(|l| l.key_span(&table, &field)),
                        src: located.map(SourceLookup::into_named),
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn dotted(path: &[String], field: &str) -> String {
    let mut parts = path.to_vec();
    parts.push(field.to_string());
    parts.join(".")
}

/// The TOML file an error came from.
struct SourceLookup<'a> {
    name: &'a str,
    content: &'a str,
}

impl<'a> SourceLookup<'a> {
    fn for_error(error: &figment::Error, sources: &'a [(String, String)]) -> Option<Self> {
        let origin = error
            .metadata
            .as_ref()
            .and_then(|m| m.source.as_ref())
            .and_then(|s| match s {
                figment::Source::File(path) => Some(path.display().to_string()),
                _ => None,
            });
        // Inline strings have no file; fall back to the single source given.
        let found = match origin {
            Some(path) => sources.iter().find(|(p, _)| *p == path),
            None if sources.len() == 1 => sources.first(),
            None => None,
        }?;
        Some(Self {
            name: &found.0,
            content: &found.1,
        })
    }

    fn key_span(&self, table: &[String], field: &str) -> Option<SourceSpan> {
        find_key_offset(self.content, table, field)
            .map(|offset| SourceSpan::new(offset.into(), field.len()))
    }

    fn into_named(self) -> NamedSource<String> {
        NamedSource::new(self.name, self.content.to_string())
    }
}

/// Byte offset of `field` inside the `[table]` it belongs to.
///
/// Lines are walked once while tracking the current table header, so a key
/// with the same name in another table is never matched. An empty `table`
/// means keys before the first header.
pub fn find_key_offset(content: &str, table: &[String], field: &str) -> Option<usize> {
    let wanted = table.join(".");
    let mut current = String::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        if let Some(header) = trimmed.strip_prefix('[') {
            current = header
                .split(']')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
        } else if current == wanted {
            if let Some(rest) = trimmed.strip_prefix(field) {
                if rest.trim_start().starts_with('=') {
                    return Some(offset + indent);
                }
            }
        }
        offset += line.len();
    }
    None
}

/// The valid key closest to `unknown`, if any is close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Prints each error as a graphical miette report on stderr.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
    if errors.len() > 1 {
        eprintln!("{} configuration problems found", errors.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn suggests_plural_for_singular_typo() {
        let valid = &["min_comment_length", "max_questions_per_conversation", "cooldown_secs"];
        assert_eq!(suggest_key("cooldown_sec", valid).as_deref(), Some("cooldown_secs"));
    }

    #[test]
    fn suggests_transposed_letters() {
        let valid = &["device_class", "preferred_encodings"];
        assert_eq!(suggest_key("devcie_class", valid).as_deref(), Some("device_class"));
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        assert_eq!(suggest_key("zzzzzz", &["name", "log_level", "conversation_type"]), None);
    }

    #[test]
    fn key_found_inside_its_table() {
        let content = "[questions]\ncooldown_sec = 30\n";
        let o = find_key_offset(content, &table(&["questions"]), "cooldown_sec").unwrap();
        assert_eq!(&content[o..o + 12], "cooldown_sec");
    }

    #[test]
    fn key_found_in_nested_table() {
        let content = "[network]\nprofile = \"stable\"\n\n[network.stable]\n  upload_sec = 3\n";
        let o = find_key_offset(content, &table(&["network", "stable"]), "upload_sec").unwrap();
        assert_eq!(&content[o..o + 10], "upload_sec");
    }

    #[test]
    fn same_key_in_other_table_is_ignored() {
        let content = "[circle]\nname = \"x\"\n[storage]\nwal = true\n";
        assert_eq!(find_key_offset(content, &table(&["circle"]), "wal"), None);
        assert!(find_key_offset(content, &table(&["storage"]), "wal").is_some());
    }

    #[test]
    fn prefix_of_longer_key_does_not_match() {
        let content = "[questions]\ncooldown_secs_extra = 1\n";
        assert_eq!(find_key_offset(content, &table(&["questions"]), "cooldown_secs"), None);
    }

    #[test]
    fn validation_error_names_the_key() {
        let e = ConfigError::validation("questions.history_window", "must be at least 1");
        assert_eq!(
            e.to_string(),
            "invalid value for `questions.history_window`: must be at least 1"
        );
    }
}
