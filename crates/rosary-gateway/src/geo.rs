// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Geolocation adapters: client address to coarse region.
//!
//! Lookups are best effort. [`locate_or_unknown`] turns every failure into
//! the `"Unknown"` region so presence tracking never fails a request.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use rosary_config::model::{GeoConfig, GeoPrefixConfig, GeoProvider};
use rosary_core::{AdapterType, GeoLocation, GeoLocator, HealthStatus, PluginAdapter, RosaryError};

/// Resolve `ip` through `locator`, degrading to `"Unknown"`.
///
/// Missing, private, loopback and link-local addresses are never looked up.
pub async fn locate_or_unknown(locator: &dyn GeoLocator, ip: Option<IpAddr>) -> GeoLocation {
    let Some(ip) = ip.filter(is_public) else {
        return GeoLocation::unknown();
    };
    match locator.locate(ip).await {
        Ok(location) => location,
        Err(e) => {
            debug!(%ip, locator = locator.name(), error = %e, "geolocation failed; using Unknown");
            GeoLocation::unknown()
        }
    }
}

fn is_public(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_public(&IpAddr::V4(mapped));
            }
            let first = v6.segments()[0];
            let unique_local = first & 0xfe00 == 0xfc00;
            let link_local = first & 0xffc0 == 0xfe80;
            !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
        }
    }
}

/// Build the locator selected by `[geo] provider`.
pub fn build_locator(config: &GeoConfig) -> Result<Arc<dyn GeoLocator>, RosaryError> {
    let locator: Arc<dyn GeoLocator> = match config.provider {
        GeoProvider::None => Arc::new(NoGeoLocator),
        GeoProvider::Static => Arc::new(StaticGeoLocator::new(config.prefixes.clone())),
        GeoProvider::Http => Arc::new(HttpGeoLocator::new(
            &config.url_template,
            Duration::from_millis(config.timeout_ms),
        )?),
    };
    Ok(locator)
}

/// Locator that never resolves anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGeoLocator;

#[async_trait]
impl PluginAdapter for NoGeoLocator {
    fn name(&self) -> &str {
        "none"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::GeoLocator
    }

    async fn health_check(&self) -> Result<HealthStatus, RosaryError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl GeoLocator for NoGeoLocator {
    async fn locate(&self, _ip: IpAddr) -> Result<GeoLocation, RosaryError> {
        Err(RosaryError::GeoLookup("geolocation is disabled".into()))
    }
}

/// Locator backed by a configured table of textual address prefixes.
///
/// The longest matching prefix wins.
#[derive(Debug, Clone)]
pub struct StaticGeoLocator {
    entries: Vec<GeoPrefixConfig>,
}

impl StaticGeoLocator {
    pub fn new(mut entries: Vec<GeoPrefixConfig>) -> Self {
        entries.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { entries }
    }
}

#[async_trait]
impl PluginAdapter for StaticGeoLocator {
    fn name(&self) -> &str {
        "static"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::GeoLocator
    }

    async fn health_check(&self) -> Result<HealthStatus, RosaryError> {
        if self.entries.is_empty() {
            return Ok(HealthStatus::Degraded("no prefixes configured".into()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl GeoLocator for StaticGeoLocator {
    async fn locate(&self, ip: IpAddr) -> Result<GeoLocation, RosaryError> {
        let text = ip.to_string();
        self.entries
            .iter()
            .find(|entry| text.starts_with(&entry.prefix))
            .map(|entry| GeoLocation {
                region: entry.region.clone(),
                lat: entry.lat,
                lng: entry.lng,
            })
            .ok_or_else(|| RosaryError::GeoLookup(format!("no prefix matches {ip}")))
    }
}

/// Locator that queries an HTTP lookup service.
///
/// The service answers with a JSON object carrying `regionName`, `region`
/// or `country` (first non-empty wins) and optional `lat` / `lon`.
#[derive(Debug, Clone)]
pub struct HttpGeoLocator {
    client: reqwest::Client,
    url_template: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "regionName")]
    region_name: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

impl HttpGeoLocator {
    pub fn new(url_template: &str, timeout: Duration) -> Result<Self, RosaryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RosaryError::Config(format!("failed to build geolocation client: {e}")))?;
        Ok(Self {
            client,
            url_template: url_template.to_string(),
        })
    }
}

#[async_trait]
impl PluginAdapter for HttpGeoLocator {
    fn name(&self) -> &str {
        "http"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::GeoLocator
    }

    async fn health_check(&self) -> Result<HealthStatus, RosaryError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl GeoLocator for HttpGeoLocator {
    async fn locate(&self, ip: IpAddr) -> Result<GeoLocation, RosaryError> {
        let url = self.url_template.replace("{ip}", &ip.to_string());
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RosaryError::GeoLookup(format!("lookup request failed: {e}")))?;
        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| RosaryError::GeoLookup(format!("malformed lookup response: {e}")))?;

        if body.status.as_deref() == Some("fail") {
            return Err(RosaryError::GeoLookup(
                body.message.unwrap_or_else(|| "lookup failed".into()),
            ));
        }
        let region = [body.region_name, body.region, body.country]
            .into_iter()
            .flatten()
            .map(|r| r.trim().to_string())
            .find(|r| !r.is_empty())
            .ok_or_else(|| RosaryError::GeoLookup(format!("no region for {ip}")))?;

        Ok(GeoLocation {
            region,
            lat: body.lat,
            lng: body.lon,
        })
    }
}
