// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Rosary tracker.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use rosary_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, TomlSource, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::RosaryConfig;

use std::path::{Path, PathBuf};

/// Load configuration from the XDG hierarchy and validate it.
///
/// Parse failures become diagnostics pointing into whichever of the
/// hierarchy's files could be read.
pub fn load_and_validate() -> Result<RosaryConfig, Vec<ConfigError>> {
    checked(loader::load_config(), hierarchy_sources)
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<RosaryConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Load configuration from a specific TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<RosaryConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![TomlSource::new("<inline>", toml_content)]
    })
}

/// Validate a parsed config, or turn the parse error into diagnostics.
///
/// Sources are only read when there is an error to point into.
fn checked(
    loaded: Result<RosaryConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<TomlSource>,
) -> Result<RosaryConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::figment_to_config_errors(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

fn read_source(path: &Path) -> Option<TomlSource> {
    let content = std::fs::read_to_string(path).ok()?;
    Some(TomlSource::new(path.display().to_string(), content))
}

/// The files of the lookup hierarchy that exist, most specific first.
fn hierarchy_sources() -> Vec<TomlSource> {
    let local = std::env::current_dir()
        .map(|d| d.join("rosary.toml"))
        .unwrap_or_else(|_| "rosary.toml".into());
    let user = dirs::config_dir().map(|d| d.join("rosary").join("rosary.toml"));

    [Some(local), user, Some("/etc/rosary/rosary.toml".into())]
        .into_iter()
        .flatten()
        .filter_map(|path: PathBuf| read_source(&path))
        .collect()
}
