// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across storage, the flow engine, and the gateway.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

/// Name of the prayer sequence recited before the mysteries.
pub const INTRO_SEQUENCE: &str = "Introductory Prayers";

/// Name of the prayer sequence recited after the mysteries.
pub const CONCLUSION_SEQUENCE: &str = "Concluding Prayers";

/// Region assigned when a client address cannot be resolved.
pub const UNKNOWN_REGION: &str = "Unknown";

/// Format a UTC instant the way every persisted timestamp is stored.
///
/// The fixed-width format sorts lexicographically in time order, which the
/// window queries rely on.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    GeoLocator,
}

/// How a weekday name is matched against a mystery set's day list.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DayMatch {
    /// Case-insensitive substring containment over the whole day-list string.
    #[default]
    Substring,
    /// Case-insensitive equality with one comma-separated token.
    Exact,
}

// --- Content model ---

/// A single prayer with its full text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prayer {
    pub id: i64,
    pub name: String,
    pub text: String,
}

/// One ordered step of a prayer sequence or a decade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Position within the parent; unique per parent, traversed ascending.
    pub order: u32,
    pub prayer_id: i64,
    /// Number of times the prayer is said; always at least 1.
    pub repeat: u32,
}

/// A named, flat block of prayers ("Introductory Prayers", "Concluding Prayers").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerSequence {
    pub id: i64,
    pub name: String,
    pub steps: Vec<Step>,
}

/// A named collection of mysteries assigned to weekdays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MysterySet {
    pub id: i64,
    pub name: String,
    /// Free-text, comma-separated weekday list, e.g. `"Monday, Saturday"`.
    pub days: String,
}

/// A themed meditation within a mystery set, with its decade steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mystery {
    pub id: i64,
    pub set_id: i64,
    pub title: String,
    pub scripture_reference: String,
    pub steps: Vec<Step>,
}

/// Everything the linearizer reads, loaded fresh for each request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSnapshot {
    pub prayers: BTreeMap<i64, Prayer>,
    pub sequences: Vec<PrayerSequence>,
    pub mystery_sets: Vec<MysterySet>,
    pub mysteries: Vec<Mystery>,
}

impl ContentSnapshot {
    /// Look up a prayer sequence by its unique name.
    pub fn sequence(&self, name: &str) -> Option<&PrayerSequence> {
        self.sequences.iter().find(|s| s.name == name)
    }

    /// Look up a mystery set by id.
    pub fn mystery_set(&self, id: i64) -> Option<&MysterySet> {
        self.mystery_sets.iter().find(|s| s.id == id)
    }

    /// Mysteries of a set in ascending id order.
    pub fn mysteries_of(&self, set_id: i64) -> Vec<&Mystery> {
        let mut mysteries: Vec<&Mystery> =
            self.mysteries.iter().filter(|m| m.set_id == set_id).collect();
        mysteries.sort_by_key(|m| m.id);
        mysteries
    }
}

// --- Linearized recitation ---

/// Structural position of a bead within the recitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Part {
    Intro,
    /// 1-based rank of the mystery within its set.
    Mystery(u32),
    Conclusion,
}

impl Part {
    pub fn is_mystery(&self) -> bool {
        matches!(self, Part::Mystery(_))
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Intro => write!(f, "intro"),
            Part::Mystery(n) => write!(f, "mystery-{n}"),
            Part::Conclusion => write!(f, "conclusion"),
        }
    }
}

impl FromStr for Part {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intro" => Ok(Part::Intro),
            "conclusion" => Ok(Part::Conclusion),
            other => other
                .strip_prefix("mystery-")
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|n| *n >= 1)
                .map(Part::Mystery)
                .ok_or_else(|| format!("unrecognized part label `{other}`")),
        }
    }
}

impl Serialize for Part {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Part {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One prayer occurrence in the flattened recitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bead {
    pub prayer: Prayer,
    pub part: Part,
    /// Mystery title for decade beads, `None` for intro and conclusion.
    pub group: Option<String>,
}

// --- Presence ---

/// Best-guess location of a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub region: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl GeoLocation {
    pub fn region(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            lat: None,
            lng: None,
        }
    }

    pub fn unknown() -> Self {
        Self::region(UNKNOWN_REGION)
    }
}

/// Presence within a trailing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSummary {
    pub count: u64,
    /// Distinct regions, sorted.
    pub regions: Vec<String>,
}

/// Number of active users in one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCount {
    pub region: String,
    pub count: u64,
}

/// One weighted heatmap point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatPoint {
    pub lat: f64,
    pub lng: f64,
    pub count: u64,
}

// --- Completion history ---

/// Completion count for one bucket (a day, a month, a mystery label).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCount {
    pub key: String,
    pub count: u64,
}

/// Completion statistics for one user plus global totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionStats {
    pub user_days: Vec<BucketCount>,
    pub user_months: Vec<BucketCount>,
    pub user_mysteries: Vec<BucketCount>,
    pub global_days: Vec<BucketCount>,
    pub global_months: Vec<BucketCount>,
}

// --- Accounts ---

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: String,
}

/// Stored credential material for password verification.
#[derive(Clone, PartialEq, Eq)]
pub struct UserCredentials {
    pub user: User,
    /// PHC-format Argon2id string; salt and cost parameters are embedded.
    pub password_hash: String,
}

impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials")
            .field("user", &self.user)
            .field("password_hash", &"[redacted]")
            .finish()
    }
}
