// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end recitation over the canonical seeded content.

use rosary_core::{DayMatch, Part};
use rosary_flow::{Advance, Progress, decades, linearize, resolve, sequence_summary};
use rosary_storage::Database;
use rosary_storage::queries::content;
use rosary_storage::seed::seed_rosary_content;

async fn seeded_db() -> (Database, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("seeded.db");
    let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
    seed_rosary_content(&db).await.unwrap();
    (db, dir)
}

#[tokio::test]
async fn joyful_set_linearizes_to_seventy_six_beads() {
    let (db, _dir) = seeded_db().await;
    let snapshot = content::load_content(&db).await.unwrap();
    let joyful = resolve(&snapshot.mystery_sets, "Monday", DayMatch::Substring)
        .unwrap()
        .clone();
    assert_eq!(joyful.name, "Joyful");

    let beads = linearize(&snapshot, joyful.id).unwrap();
    // 8 intro beads over 6 steps, 5 decades of 13, 3 concluding beads.
    assert_eq!(beads.len(), 8 + 65 + 3);

    let summary = sequence_summary(&beads);
    assert_eq!(summary.len(), 7);
    assert_eq!(summary[0].part, Part::Intro);
    assert_eq!(summary[0].beads, 8);
    assert!(summary[1..6].iter().all(|c| c.beads == 13));
    assert_eq!(summary[6].beads, 3);

    let decades = decades(&beads);
    let titles: Vec<&str> = decades.iter().filter_map(|d| d.label.as_deref()).collect();
    assert_eq!(
        titles,
        [
            "The Annunciation",
            "The Visitation",
            "The Nativity",
            "The Presentation",
            "The Finding in the Temple",
        ]
    );

    assert_eq!(beads[0].prayer.name, "Sign of the Cross");
    assert_eq!(beads.last().unwrap().prayer.name, "Sign of the Cross");
    db.close().await.unwrap();
}

#[tokio::test]
async fn every_weekday_resolves_to_exactly_one_seeded_set() {
    let (db, _dir) = seeded_db().await;
    let sets = content::list_mystery_sets(&db).await.unwrap();
    for (day, expected) in [
        ("Monday", "Joyful"),
        ("Tuesday", "Sorrowful"),
        ("Wednesday", "Glorious"),
        ("Thursday", "Luminous"),
        ("Friday", "Sorrowful"),
        ("Saturday", "Joyful"),
        ("Sunday", "Glorious"),
    ] {
        for mode in [DayMatch::Substring, DayMatch::Exact] {
            assert_eq!(resolve(&sets, day, mode).unwrap().name, expected, "{day} / {mode}");
        }
    }
    db.close().await.unwrap();
}

#[tokio::test]
async fn full_recitation_completes_once() {
    let (db, _dir) = seeded_db().await;
    let snapshot = content::load_content(&db).await.unwrap();
    let set_id = snapshot.mystery_sets[1].id;
    let total = linearize(&snapshot, set_id).unwrap().len();

    let mut progress = Progress::default();
    progress.start(set_id);
    let mut completed = None;
    for _ in 0..total {
        if let Advance::Completed { mystery_set_id } = progress.advance(total).unwrap() {
            completed = Some(mystery_set_id);
        }
    }
    assert_eq!(completed, Some(set_id));
    assert!(!progress.is_active());
    db.close().await.unwrap();
}
