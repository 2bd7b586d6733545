// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recitation flow engine.
//!
//! Everything here is pure: the content snapshot and the session's
//! progress value are passed in, nothing is cached between calls.

pub mod heatmap;
pub mod linearize;
pub mod progress;
pub mod resolve;

pub use heatmap::heatmap_points;
pub use linearize::{PartCount, Run, decades, group_runs, linearize, part_position, sequence_summary};
pub use progress::{Advance, Progress};
pub use resolve::{resolve, today, weekday_name};
