// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use rosary_core::regions::region_coordinates;
use rosary_core::types::{HeatPoint, RegionCount};

/// Place each region's active count at the region's centroid.
///
/// Regions missing from the coordinate table land at (0, 0).
pub fn heatmap_points(histogram: &[RegionCount]) -> Vec<HeatPoint> {
    histogram
        .iter()
        .map(|entry| {
            let (lat, lng) = region_coordinates(&entry.region);
            HeatPoint {
                lat,
                lng,
                count: entry.count,
            }
        })
        .collect()
}
