// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Rosary tracker.
//!
//! This crate provides the error taxonomy, the content and presence domain
//! types, and the adapter traits implemented by the storage and geolocation
//! collaborators.

pub mod error;
pub mod regions;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::RosaryError;
pub use types::{
    AdapterType, Bead, ContentSnapshot, DayMatch, GeoLocation, HealthStatus, Mystery, MysterySet,
    Part, Prayer, PrayerSequence, Step,
};

pub use traits::{GeoLocator, PluginAdapter, StorageAdapter};
