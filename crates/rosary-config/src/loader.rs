// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./rosary.toml` > `~/.config/rosary/rosary.toml` > `/etc/rosary/rosary.toml`
//! with environment variable overrides via `ROSARY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RosaryConfig;

/// Top-level config sections, used to map `ROSARY_<SECTION>_<KEY>` variables.
const SECTIONS: &[&str] = &["server", "storage", "rosary", "activity", "geo", "session"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/rosary/rosary.toml` (system-wide)
/// 3. `~/.config/rosary/rosary.toml` (user XDG config)
/// 4. `./rosary.toml` (local directory)
/// 5. `ROSARY_*` environment variables
pub fn load_config() -> Result<RosaryConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<RosaryConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RosaryConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RosaryConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RosaryConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RosaryConfig::default()))
        .merge(Toml::file("/etc/rosary/rosary.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("rosary/rosary.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("rosary.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider with explicit section-to-dot mapping.
///
/// Only the section prefix is turned into a dot so underscore-containing keys
/// survive: `ROSARY_ACTIVITY_PRESENCE_WINDOW_MINUTES` maps to
/// `activity.presence_window_minutes`, not `activity.presence.window.minutes`.
fn env_provider() -> Env {
    Env::prefixed("ROSARY_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a prefix-stripped env key onto its dotted, lowercase config path.
///
/// figment hands keys over in their original case (`SERVER_PORT`).
pub fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
