// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `rosary-core::types` for use across
//! adapter trait boundaries. This module re-exports them for convenience
//! within the storage crate.

pub use rosary_core::types::{
    ActiveSummary, BucketCount, CompletionStats, ContentSnapshot, GeoLocation, Mystery,
    MysterySet, Prayer, PrayerSequence, RegionCount, Step,
    User, UserCredentials,
};
