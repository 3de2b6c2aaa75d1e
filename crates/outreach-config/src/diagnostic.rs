// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment extraction errors into miette diagnostics.
//!
//! Unknown keys carry a "did you mean" hint and, when the offending TOML can
//! be read back, a labelled span. Values injected through `OUTREACH_*`
//! variables are reported under the variable name rather than a dotted path.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::fmt;

use figment::error::{Error as FigmentError, Kind};
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a "did you mean" hint.
const SUGGESTION_THRESHOLD: f64 = 0.75;

const ENV_PREFIX: &str = "OUTREACH_";

/// Source name used for configuration passed as a string.
pub const INLINE_SOURCE: &str = "<inline>";

/// Where an offending value was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueOrigin {
    File(String),
    Env(String),
    Inline,
}

impl fmt::Display for ValueOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => f.write_str(path),
            Self::Env(var) => write!(f, "environment variable {var}"),
            Self::Inline => f.write_str("inline configuration"),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {origin}")]
    #[diagnostic(
        code(outreach::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        origin: ValueOrigin,
        suggestion: Option<String>,
        valid_keys: Vec<String>,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("bad value for `{key}` in {origin}: found {found}")]
    #[diagnostic(code(outreach::config::invalid_value), help("expected {expected}"))]
    InvalidValue {
        key: String,
        origin: ValueOrigin,
        found: String,
        expected: String,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(outreach::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(outreach::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &[String]) -> String {
    let valid = valid_keys.join(", ");
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys here: {valid}"),
        None => format!("valid keys here: {valid}"),
    }
}

/// Convert a `figment::Error` (which may carry several errors) into diagnostics.
///
/// `sources` pairs a source name with its TOML text. File sources are named
/// by path, string sources by [`INLINE_SOURCE`].
pub fn figment_to_config_errors(
    err: FigmentError,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter().map(|error| convert(&error, sources)).collect()
}

fn convert(error: &FigmentError, sources: &[(String, String)]) -> ConfigError {
    match &error.kind {
        Kind::UnknownField(field, expected) => {
            // figment's path may already end with the offending key.
            let parents = match error.path.split_last() {
                Some((last, parents)) if last == field => parents,
                _ => &error.path[..],
            };
            let origin = origin_of(error, parents, Some(field.as_str()));
            let section = parents.first().map(String::as_str);
            let (span, src) = source_text(&origin, sources)
                .and_then(|(name, content)| {
                    let offset = locate_key(content, section, field)?;
                    Some((
                        SourceSpan::new(offset.into(), field.len()),
                        NamedSource::new(name, content.to_string()),
                    ))
                })
                .unzip();
            ConfigError::UnknownKey {
                key: field.clone(),
                origin,
                suggestion: suggest_key(field, expected),
                valid_keys: expected.iter().map(|k| k.to_string()).collect(),
                span,
                src,
            }
        }
        Kind::InvalidType(found, expected) | Kind::InvalidValue(found, expected) => {
            ConfigError::InvalidValue {
                key: error.path.join("."),
                origin: origin_of(error, &error.path, None),
                found: found.to_string(),
                expected: expected.clone(),
            }
        }
        _ => ConfigError::Other(error.to_string()),
    }
}

fn origin_of(error: &FigmentError, path: &[String], field: Option<&str>) -> ValueOrigin {
    let Some(metadata) = error.metadata.as_ref() else {
        return ValueOrigin::Inline;
    };
    if let Some(figment::Source::File(file)) = &metadata.source {
        return ValueOrigin::File(file.display().to_string());
    }
    if metadata.name.contains("environment") {
        return ValueOrigin::Env(env_var_name(path, field));
    }
    ValueOrigin::Inline
}

/// `["dispatch"]` + `batch_size` becomes `OUTREACH_DISPATCH_BATCH_SIZE`.
pub fn env_var_name(path: &[String], field: Option<&str>) -> String {
    let parts: Vec<&str> = path.iter().map(String::as_str).chain(field).collect();
    format!("{ENV_PREFIX}{}", parts.join("_").to_ascii_uppercase())
}

fn source_text<'a>(
    origin: &ValueOrigin,
    sources: &'a [(String, String)],
) -> Option<(&'a str, &'a str)> {
    let wanted = match origin {
        ValueOrigin::File(path) => path.as_str(),
        ValueOrigin::Inline => INLINE_SOURCE,
        ValueOrigin::Env(_) => return None,
    };
    sources
        .iter()
        .find(|(name, _)| name == wanted)
        .map(|(name, content)| (name.as_str(), content.as_str()))
}

/// Byte offset of `field` within `content`.
///
/// With a section, only `field = ...` lines under that `[section]` header
/// match. Without one, a `[field]` header also matches, so an unknown
/// top-level table can be pointed at.
pub fn locate_key(content: &str, section: Option<&str>, field: &str) -> Option<usize> {
    let mut current: Option<&str> = None;
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();
        if let Some(header) = trimmed.strip_prefix('[') {
            let name = header.split(']').next().map(str::trim);
            if section.is_none() && name == Some(field) {
                return Some(offset + indent + 1 + (header.len() - header.trim_start().len()));
            }
            current = name;
        } else if current == section
            && let Some(rest) = trimmed.strip_prefix(field)
            && rest.trim_start().starts_with('=')
        {
            return Some(offset + indent);
        }
        offset += line.len();
    }
    None
}

/// Closest valid key above the similarity threshold, if any.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render errors to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}
