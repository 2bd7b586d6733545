// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Rosary tracker.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use rosary_core::DayMatch;
use serde::{Deserialize, Serialize};

/// Top-level Rosary configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RosaryConfig {
    /// HTTP listener and logging settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Recitation settings (day resolution).
    #[serde(default)]
    pub rosary: RecitationConfig,

    /// Presence tracking windows.
    #[serde(default)]
    pub activity: ActivityConfig,

    /// Client IP geolocation settings.
    #[serde(default)]
    pub geo: GeoConfig,

    /// Session cookie settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("rosary").join("rosary.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("rosary.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Recitation configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecitationConfig {
    /// How today's weekday is matched against mystery-set day lists.
    #[serde(default)]
    pub day_match: DayMatch,

    /// Offset from UTC, in minutes, used to decide what "today" is.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Presence aggregation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ActivityConfig {
    /// Record presence on authenticated requests.
    #[serde(default = "default_track_requests")]
    pub track_requests: bool,

    /// Trailing window for the "praying now" count.
    #[serde(default = "default_presence_window")]
    pub presence_window_minutes: u32,

    /// Trailing window for heatmap weighting.
    #[serde(default = "default_heatmap_window")]
    pub heatmap_window_minutes: u32,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            track_requests: default_track_requests(),
            presence_window_minutes: default_presence_window(),
            heatmap_window_minutes: default_heatmap_window(),
        }
    }
}

fn default_track_requests() -> bool {
    true
}

fn default_presence_window() -> u32 {
    10
}

fn default_heatmap_window() -> u32 {
    15
}

/// Which geolocation backend resolves client addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoProvider {
    /// No lookup; every client is "Unknown".
    #[default]
    None,
    /// Resolve from the configured address prefix table.
    Static,
    /// Query an HTTP lookup service.
    Http,
}

/// Geolocation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeoConfig {
    #[serde(default)]
    pub provider: GeoProvider,

    /// Lookup URL for the HTTP provider; `{ip}` is replaced by the client address.
    #[serde(default = "default_url_template")]
    pub url_template: String,

    /// Upper bound on a single HTTP lookup.
    #[serde(default = "default_geo_timeout_ms")]
    pub timeout_ms: u64,

    /// Address prefix table for the static provider.
    #[serde(default)]
    pub prefixes: Vec<GeoPrefixConfig>,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            provider: GeoProvider::default(),
            url_template: default_url_template(),
            timeout_ms: default_geo_timeout_ms(),
            prefixes: Vec::new(),
        }
    }
}

fn default_url_template() -> String {
    "http://ip-api.com/json/{ip}".to_string()
}

fn default_geo_timeout_ms() -> u64 {
    1500
}

/// One static geolocation entry: addresses starting with `prefix` map to `region`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeoPrefixConfig {
    pub prefix: String,
    pub region: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Mark the cookie `Secure` (HTTPS-only).
    #[serde(default)]
    pub secure_cookie: bool,

    /// Sessions unused for this long are forgotten.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_minutes: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secure_cookie: false,
            idle_timeout_minutes: default_idle_timeout(),
        }
    }
}

fn default_cookie_name() -> String {
    "rosary_session".to_string()
}

fn default_idle_timeout() -> u32 {
    120
}
