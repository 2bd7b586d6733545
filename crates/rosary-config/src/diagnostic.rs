// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config diagnostics: figment failures rendered through miette.
//!
//! Every figment error becomes one [`ConfigError`]. When the offending key
//! can be found in one of the TOML files that were read, the diagnostic
//! points at it. Unknown keys get a "did you mean" hint ranked by
//! Jaro-Winkler similarity.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Below this Jaro-Winkler score a key is not offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A TOML file that took part in loading, kept for span lookup.
#[derive(Debug, Clone)]
pub struct TomlSource {
    pub name: String,
    pub content: String,
}

impl TomlSource {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Where a diagnostic points: a span in one named source.
type Located = (Option<SourceSpan>, Option<NamedSource<String>>);

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in [{section}]")]
    #[diagnostic(
        code(rosary::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Dotted section path, `root` for top-level keys.
        section: String,
        suggestion: Option<String>,
        /// Comma-separated keys accepted in the section.
        valid_keys: String,
        #[label("not a {section} setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(rosary::config::invalid_type), help("use a {expected} here"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has an unsupported value: {detail}")]
    #[diagnostic(code(rosary::config::invalid_value))]
    InvalidValue {
        key: String,
        detail: String,
        #[label("unsupported value")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(rosary::config::missing_key),
        help("add `{key} = <value>` to rosary.toml")
    )]
    MissingKey { key: String },

    /// A value parsed but failed a semantic check.
    #[error("validation error: {message}")]
    #[diagnostic(code(rosary::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(rosary::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error carried by a `figment::Error` into a diagnostic.
pub fn figment_to_config_errors(err: figment::Error, sources: &[TomlSource]) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.clone();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    // figment's path already ends with the unknown field.
                    let section = match path.split_last() {
                        Some((last, section)) if last == field => section,
                        _ => path.as_slice(),
                    };
                    let (span, src) = locate(&error, section, field, sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        section: section_name(section),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: dotted(&path, field),
                },
                Kind::InvalidType(actual, expected) => {
                    let (span, src) = locate_leaf(&error, &path, sources);
                    ConfigError::InvalidType {
                        key: path.join("."),
                        detail: format!("found {actual}, expected {expected}"),
                        expected: expected.to_string(),
                        span,
                        src,
                    }
                }
                Kind::UnknownVariant(found, allowed) => {
                    let (span, src) = locate_leaf(&error, &path, sources);
                    ConfigError::InvalidValue {
                        key: path.join("."),
                        detail: format!("`{found}` is not one of {}", allowed.join(", ")),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn section_name(path: &[String]) -> String {
    if path.is_empty() {
        "root".to_string()
    } else {
        path.join(".")
    }
}

fn dotted(path: &[String], field: &str) -> String {
    path.iter()
        .map(String::as_str)
        .chain(std::iter::once(field))
        .collect::<Vec<_>>()
        .join(".")
}

/// Locate the value at the end of `path` (the path names the key itself).
fn locate_leaf(error: &figment::Error, path: &[String], sources: &[TomlSource]) -> Located {
    match path.split_last() {
        Some((field, section)) => locate(error, section, field, sources),
        None => (None, None),
    }
}

/// Find `field` under `section` in the source file figment blamed.
fn locate(
    error: &figment::Error,
    section: &[String],
    field: &str,
    sources: &[TomlSource],
) -> Located {
    let blamed = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // Inline strings carry no file path; fall back to the only source.
    let source = match blamed {
        Some(name) => sources.iter().find(|s| s.name == name),
        None if sources.len() == 1 => sources.first(),
        None => None,
    };

    source
        .and_then(|s| {
            let offset = find_key_offset(&s.content, section, field)?;
            Some((
                Some(SourceSpan::new(offset.into(), field.len())),
                Some(NamedSource::new(&s.name, s.content.clone())),
            ))
        })
        .unwrap_or((None, None))
}

/// Byte offset of `field` as a key inside the `[section]` table of `content`.
///
/// `section` is the dotted table path; array-of-tables headers
/// (`[[geo.prefixes]]`) count as the table they repeat. An empty section
/// searches the keys before the first header.
pub fn find_key_offset(content: &str, section: &[String], field: &str) -> Option<usize> {
    let wanted = section.join(".");
    let mut in_section = section.is_empty();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(header) = table_header(trimmed) {
            in_section = header == wanted;
        } else if in_section {
            let is_key = trimmed
                .strip_prefix(field)
                .is_some_and(|rest| rest.trim_start().starts_with('='));
            if is_key {
                return Some(offset + (line.len() - trimmed.len()));
            }
        }
        offset += line.len();
    }
    None
}

fn table_header(line: &str) -> Option<&str> {
    let line = line.trim_end();
    let inner = line
        .strip_prefix("[[")
        .and_then(|l| l.strip_suffix("]]"))
        .or_else(|| line.strip_prefix('[').and_then(|l| l.strip_suffix(']')))?;
    Some(inner.trim())
}

/// The valid key closest to `unknown`, if any is close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn suggests_nearest_key() {
        assert_eq!(
            suggest_key("prot", &["host", "port", "log_level"]).as_deref(),
            Some("port")
        );
        assert_eq!(
            suggest_key(
                "presense_window_minutes",
                &["track_requests", "presence_window_minutes", "heatmap_window_minutes"],
            )
            .as_deref(),
            Some("presence_window_minutes")
        );
    }

    #[test]
    fn distant_typo_gets_no_suggestion() {
        assert_eq!(suggest_key("zzzzzz", &["host", "port", "log_level"]), None);
    }

    #[test]
    fn key_is_found_in_its_own_section_only() {
        let content = "[server]\nport = 1\n[storage]\nport = 2\n";
        let o = find_key_offset(content, &path(&["storage"]), "port").unwrap();
        assert_eq!(&content[o..], "port = 2\n");
    }

    #[test]
    fn key_prefix_of_another_key_is_not_matched() {
        let content = "[storage]\nwal_mode_extra = 1\nwal_mod = true\n";
        let o = find_key_offset(content, &path(&["storage"]), "wal_mod").unwrap();
        assert!(content[o..].starts_with("wal_mod = true"));
    }

    #[test]
    fn array_of_tables_and_root_keys() {
        let content = "top = 1\n[geo]\nprovider = \"static\"\n\n  [[geo.prefixes]]\n  prefx = \"81.\"\n";
        let o = find_key_offset(content, &path(&["geo", "prefixes"]), "prefx").unwrap();
        assert!(content[o..].starts_with("prefx"));
        assert_eq!(find_key_offset(content, &[], "top"), Some(0));
        assert_eq!(find_key_offset(content, &[], "provider"), None);
    }

    #[test]
    fn inline_source_gets_a_span() {
        let toml = "[activity]\nheatmap_windw_minutes = 3\n";
        let err = crate::loader::load_config_from_str(toml).unwrap_err();
        let errors = figment_to_config_errors(err, &[TomlSource::new("<inline>", toml)]);
        let ConfigError::UnknownKey {
            section,
            suggestion,
            span,
            ..
        } = &errors[0]
        else {
            panic!("expected UnknownKey, got {errors:?}");
        };
        assert_eq!(section, "activity");
        assert_eq!(suggestion.as_deref(), Some("heatmap_window_minutes"));
        assert_eq!(span.map(|s| s.offset()), Some(11));
    }
}
