// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind addresses, non-empty paths, and sane time windows.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{GeoProvider, RosaryConfig};

/// Largest accepted UTC offset (a full day either way).
const MAX_UTC_OFFSET_MINUTES: i32 = 24 * 60;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &RosaryConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.rosary.utc_offset_minutes.abs() >= MAX_UTC_OFFSET_MINUTES {
        errors.push(ConfigError::Validation {
            message: format!(
                "rosary.utc_offset_minutes must be within ±{}, got {}",
                MAX_UTC_OFFSET_MINUTES - 1,
                config.rosary.utc_offset_minutes
            ),
        });
    }

    if config.activity.presence_window_minutes == 0 {
        errors.push(ConfigError::Validation {
            message: "activity.presence_window_minutes must be at least 1".to_string(),
        });
    }

    if config.activity.heatmap_window_minutes == 0 {
        errors.push(ConfigError::Validation {
            message: "activity.heatmap_window_minutes must be at least 1".to_string(),
        });
    }

    if config.geo.provider == GeoProvider::Http && !config.geo.url_template.contains("{ip}") {
        errors.push(ConfigError::Validation {
            message: "geo.url_template must contain the `{ip}` placeholder".to_string(),
        });
    }

    if config.geo.timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "geo.timeout_ms must be at least 1".to_string(),
        });
    }

    let mut seen_prefixes = HashSet::new();
    for (i, entry) in config.geo.prefixes.iter().enumerate() {
        if entry.prefix.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("geo.prefixes[{i}].prefix must not be empty"),
            });
        } else if !seen_prefixes.insert(entry.prefix.trim()) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate geo prefix `{}`", entry.prefix.trim()),
            });
        }
        if entry.region.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("geo.prefixes[{i}].region must not be empty"),
            });
        }
    }

    if config.session.cookie_name.is_empty()
        || !config
            .session
            .cookie_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "session.cookie_name `{}` must be non-empty ASCII letters, digits, `_` or `-`",
                config.session.cookie_name
            ),
        });
    }

    if config.session.idle_timeout_minutes == 0 {
        errors.push(ConfigError::Validation {
            message: "session.idle_timeout_minutes must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeoPrefixConfig;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = RosaryConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = RosaryConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn zero_windows_fail_validation() {
        let mut config = RosaryConfig::default();
        config.activity.presence_window_minutes = 0;
        config.activity.heatmap_window_minutes = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(has_error(&errors, "presence_window_minutes"));
        assert!(has_error(&errors, "heatmap_window_minutes"));
    }

    #[test]
    fn http_provider_requires_placeholder() {
        let mut config = RosaryConfig::default();
        config.geo.provider = GeoProvider::Http;
        config.geo.url_template = "https://geo.example/lookup".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "{ip}"));
    }

    #[test]
    fn duplicate_prefixes_fail_validation() {
        let mut config = RosaryConfig::default();
        let entry = GeoPrefixConfig {
            prefix: "81.".to_string(),
            region: "England".to_string(),
            lat: None,
            lng: None,
        };
        config.geo.prefixes = vec![entry.clone(), entry];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "duplicate geo prefix"));
    }

    #[test]
    fn out_of_range_offset_fails_validation() {
        let mut config = RosaryConfig::default();
        config.rosary.utc_offset_minutes = 24 * 60;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "utc_offset_minutes"));
    }

    #[test]
    fn bad_cookie_name_fails_validation() {
        let mut config = RosaryConfig::default();
        config.session.cookie_name = "rosary session;".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "cookie_name"));
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = RosaryConfig::default();
        config.server.host = "".to_string();
        config.storage.database_path = " ".to_string();
        config.geo.timeout_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
