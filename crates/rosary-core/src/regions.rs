// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static region → coordinate table used to place heatmap points.

/// Known regions with their approximate centroid (lat, lng).
pub const REGION_COORDINATES: &[(&str, f64, f64)] = &[
    ("California", 36.7783, -119.4179),
    ("England", 52.3555, -1.1743),
    ("Ontario", 51.2538, -85.3232),
    ("Nigeria", 9.0820, 8.6753),
    ("India", 20.5937, 78.9629),
    ("Brazil", -14.2350, -51.9253),
    ("Philippines", 13.4100, 122.5600),
    ("Poland", 51.9194, 19.1451),
    ("Vietnam", 14.0583, 108.2772),
    ("South Africa", -30.5595, 22.9375),
    ("Unknown", 0.0, 0.0),
];

/// Coordinates for `region`, or `(0.0, 0.0)` when the region is not in the table.
pub fn region_coordinates(region: &str) -> (f64, f64) {
    REGION_COORDINATES
        .iter()
        .find(|(name, _, _)| *name == region)
        .map(|(_, lat, lng)| (*lat, *lng))
        .unwrap_or((0.0, 0.0))
}
