// SPDX-FileCopyrightText: 2026 Outreach Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./outreach.toml` > `~/.config/outreach/outreach.toml` >
//! `/etc/outreach/outreach.toml` with environment variable overrides via `OUTREACH_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::OutreachConfig;

/// Config sections reachable through `OUTREACH_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "service",
    "storage",
    "dispatch",
    "retry",
    "twilio",
    "gateway",
    "scheduler",
    "prometheus",
];

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/outreach/outreach.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "outreach.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("outreach/outreach.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/outreach/outreach.toml` (system-wide)
/// 3. `~/.config/outreach/outreach.toml` (user XDG config)
/// 4. `./outreach.toml` (local directory)
/// 5. `OUTREACH_*` environment variables
pub fn load_config() -> Result<OutreachConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<OutreachConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OutreachConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<OutreachConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OutreachConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(OutreachConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys contain
/// underscores: `OUTREACH_DISPATCH_BATCH_SIZE` must map to
/// `dispatch.batch_size`, not `dispatch.batch.size`.
fn env_provider() -> Env {
    Env::prefixed("OUTREACH_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a prefix-stripped env var name to a lowercase dotted config path.
///
/// Figment passes the key in its original case (`DISPATCH_BATCH_SIZE`).
pub(crate) fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
            && !rest.is_empty()
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
