// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Geolocation adapter trait for client IP → region lookups.

use std::net::IpAddr;

use async_trait::async_trait;

use crate::error::RosaryError;
use crate::traits::adapter::PluginAdapter;
use crate::types::GeoLocation;

/// Best-effort resolver from a client address to a coarse region.
///
/// Implementations return `RosaryError::GeoLookup` on any failure; callers
/// degrade to the `"Unknown"` region and never surface the error.
#[async_trait]
pub trait GeoLocator: PluginAdapter {
    /// Resolves `ip` to a region and, when known, coordinates.
    async fn locate(&self, ip: IpAddr) -> Result<GeoLocation, RosaryError>;
}
