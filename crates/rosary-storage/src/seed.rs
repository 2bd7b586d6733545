// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical content seeding and demo presence seeding.
//!
//! Both seeders are idempotent: running them again updates rows in place
//! and never duplicates prayers, sets, mysteries or steps.

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use rosary_core::RosaryError;
use rosary_core::regions::REGION_COORDINATES;
use rosary_core::types::{CONCLUSION_SEQUENCE, GeoLocation, INTRO_SEQUENCE, UNKNOWN_REGION};
use rusqlite::{Transaction, params};
use tracing::info;

use crate::database::{Database, map_tr_err};
use crate::queries::{activity, users};

const PRAYERS: &[(&str, &str)] = &[
    (
        "Sign of the Cross",
        "In the name of the Father, and of the Son, and of the Holy Spirit. Amen.",
    ),
    (
        "Apostles' Creed",
        "I believe in God, the Father almighty, Creator of Heaven and earth. \
         And in Jesus Christ, His only Son, our Lord, Who was conceived by the Holy Spirit, \
         born of the Virgin Mary, suffered under Pontius Pilate; was crucified, died, and was buried. \
         He descended into Hell. The third day He rose again from the dead. He ascended into Heaven, \
         and sits at the right hand of God, the Father almighty. He shall come again to judge the living and the dead. \
         I believe in the Holy Spirit, the holy Catholic Church, the communion of saints, the forgiveness of sins, \
         the resurrection of the body, and life everlasting. Amen.",
    ),
    (
        "Our Father",
        "Our Father, Who art in Heaven, hallowed be Thy Name. Thy kingdom come, Thy will be done on earth as it is in Heaven. \
         Give us this day our daily bread, and forgive us our trespasses, as we forgive those who trespass against us. \
         And lead us not into temptation, but deliver us from evil. Amen.",
    ),
    (
        "Hail Mary",
        "Hail Mary, full of grace, the Lord is with thee. Blessed art thou among women, \
         and blessed is the fruit of thy womb, Jesus. Holy Mary, Mother of God, pray for us sinners, \
         now and at the hour of our death. Amen.",
    ),
    (
        "Glory Be",
        "Glory be to the Father, and to the Son, and to the Holy Spirit. \
         As it was in the beginning is now, and ever shall be, world without end. Amen.",
    ),
    (
        "Fatima Prayer",
        "O my Jesus, forgive us our sins, save us from the fires of Hell; lead all souls to Heaven, \
         especially those in most need of Thy mercy. Amen.",
    ),
    (
        "Hail Holy Queen",
        "Hail Holy Queen, mother of mercy; our life, our sweetness, and our hope. \
         To thee do we cry, poor banished children of Eve. To thee do we send up our sighs, \
         mourning and weeping in this vale of tears. Turn, then, most gracious advocate, thine eyes of mercy toward us. \
         And after this, our exile, show unto us the blessed fruit of thy womb, Jesus. \
         O clement, O loving, O sweet Virgin Mary. Pray for us, O holy Mother of God, \
         that we may be made worthy of the promises of Christ. Amen.",
    ),
    (
        "Closing Prayer",
        "O God, whose only-begotten Son by His life, death and resurrection, has purchased for us the rewards of eternal life; \
         grant, we beseech Thee, that by meditating upon these mysteries of the Most Holy Rosary of the Blessed Virgin Mary, \
         we may imitate what they contain and obtain what they promise, through the same Christ our Lord. Amen.",
    ),
];

struct SeedSet {
    name: &'static str,
    days: &'static str,
    mysteries: [(&'static str, &'static str); 5],
}

const MYSTERY_SETS: &[SeedSet] = &[
    SeedSet {
        name: "Joyful",
        days: "Monday, Saturday",
        mysteries: [
            ("The Annunciation", "Luke 1:26-38"),
            ("The Visitation", "Luke 1:39-56"),
            ("The Nativity", "Luke 2:1-21"),
            ("The Presentation", "Luke 2:22-38"),
            ("The Finding in the Temple", "Luke 2:41-52"),
        ],
    },
    SeedSet {
        name: "Sorrowful",
        days: "Tuesday, Friday",
        mysteries: [
            ("The Agony in the Garden", "Matthew 26:36-56"),
            ("The Scourging at the Pillar", "Matthew 27:26"),
            ("The Crowning with Thorns", "Matthew 27:27-31"),
            ("The Carrying of the Cross", "Matthew 27:32"),
            ("The Crucifixion", "Matthew 27:33-56"),
        ],
    },
    SeedSet {
        name: "Glorious",
        days: "Wednesday, Sunday",
        mysteries: [
            ("The Resurrection", "John 20:1-29"),
            ("The Ascension", "Luke 24:36-53"),
            ("The Descent of the Holy Spirit", "Acts 2:1-41"),
            ("The Assumption", ""),
            ("The Coronation of Mary", ""),
        ],
    },
    SeedSet {
        name: "Luminous",
        days: "Thursday",
        mysteries: [
            ("The Baptism of Jesus", "Matthew 3:13-16"),
            ("The Wedding at Cana", "John 2:1-11"),
            ("The Proclamation of the Kingdom", "Mark 1:14-15"),
            ("The Transfiguration", "Matthew 17:1-8"),
            ("The Institution of the Eucharist", "Matthew 26"),
        ],
    },
];

const DECADE: &[(&str, u32)] = &[
    ("Our Father", 1),
    ("Hail Mary", 10),
    ("Glory Be", 1),
    ("Fatima Prayer", 1),
];

const INTRO_STEPS: &[(&str, u32)] = &[
    ("Sign of the Cross", 1),
    ("Apostles' Creed", 1),
    ("Our Father", 1),
    ("Hail Mary", 3),
    ("Glory Be", 1),
    ("Fatima Prayer", 1),
];

const CONCLUSION_STEPS: &[(&str, u32)] = &[
    ("Hail Holy Queen", 1),
    ("Closing Prayer", 1),
    ("Sign of the Cross", 1),
];

/// Number of demo accounts created by [`seed_demo_activity`].
pub const DEMO_USER_COUNT: usize = 10;

/// Row counts after a content seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub prayers: usize,
    pub mystery_sets: usize,
    pub mysteries: usize,
}

/// Seed the canonical prayers, mystery sets, decades, and the introductory
/// and concluding sequences in one transaction.
pub async fn seed_rosary_content(db: &Database) -> Result<SeedReport, RosaryError> {
    let report = db
        .connection()
        .call(|conn| -> Result<SeedReport, rusqlite::Error> {
            let tx = conn.transaction()?;
            for (name, text) in PRAYERS {
                tx.execute(
                    "INSERT INTO prayers (name, text) VALUES (?1, ?2)
                     ON CONFLICT(name) DO NOTHING",
                    params![name, text],
                )?;
            }

            let mut mysteries = 0;
            for set in MYSTERY_SETS {
                tx.execute(
                    "INSERT INTO mystery_sets (name, days) VALUES (?1, ?2)
                     ON CONFLICT(name) DO NOTHING",
                    params![set.name, set.days],
                )?;
                let set_id: i64 = tx.query_row(
                    "SELECT id FROM mystery_sets WHERE name = ?1",
                    params![set.name],
                    |row| row.get(0),
                )?;
                for (title, reference) in &set.mysteries {
                    let mystery_id = ensure_mystery(&tx, set_id, title, reference)?;
                    for (order, (prayer, repeat)) in (1u32..).zip(DECADE) {
                        tx.execute(
                            "INSERT INTO decade_steps (mystery_id, step_order, prayer_id, repeat)
                             VALUES (?1, ?2, (SELECT id FROM prayers WHERE name = ?3), ?4)
                             ON CONFLICT(mystery_id, step_order) DO UPDATE SET
                                 prayer_id = excluded.prayer_id,
                                 repeat = excluded.repeat",
                            params![mystery_id, order, prayer, repeat],
                        )?;
                    }
                    mysteries += 1;
                }
            }

            seed_sequence(&tx, INTRO_SEQUENCE, INTRO_STEPS)?;
            seed_sequence(&tx, CONCLUSION_SEQUENCE, CONCLUSION_STEPS)?;
            tx.commit()?;

            Ok(SeedReport {
                prayers: PRAYERS.len(),
                mystery_sets: MYSTERY_SETS.len(),
                mysteries,
            })
        })
        .await
        .map_err(map_tr_err)?;

    info!(
        prayers = report.prayers,
        mystery_sets = report.mystery_sets,
        mysteries = report.mysteries,
        "rosary content seeded"
    );
    Ok(report)
}

fn ensure_mystery(
    tx: &Transaction<'_>,
    set_id: i64,
    title: &str,
    reference: &str,
) -> Result<i64, rusqlite::Error> {
    let existing = tx.query_row(
        "SELECT id FROM mysteries WHERE set_id = ?1 AND title = ?2",
        params![set_id, title],
        |row| row.get(0),
    );
    match existing {
        Ok(id) => Ok(id),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            tx.execute(
                "INSERT INTO mysteries (set_id, title, scripture_reference) VALUES (?1, ?2, ?3)",
                params![set_id, title, reference],
            )?;
            Ok(tx.last_insert_rowid())
        }
        Err(e) => Err(e),
    }
}

fn seed_sequence(
    tx: &Transaction<'_>,
    name: &str,
    steps: &[(&str, u32)],
) -> Result<(), rusqlite::Error> {
    tx.execute(
        "INSERT INTO prayer_sequences (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
        params![name],
    )?;
    let sequence_id: i64 = tx.query_row(
        "SELECT id FROM prayer_sequences WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    for (order, (prayer, repeat)) in (1u32..).zip(steps) {
        tx.execute(
            "INSERT INTO prayer_sequence_steps (sequence_id, step_order, prayer_id, repeat)
             VALUES (?1, ?2, (SELECT id FROM prayers WHERE name = ?3), ?4)
             ON CONFLICT(sequence_id, step_order) DO UPDATE SET
                 prayer_id = excluded.prayer_id,
                 repeat = excluded.repeat",
            params![sequence_id, order, prayer, repeat],
        )?;
    }
    Ok(())
}

/// Create `testuser1..testuser10` and place each in one demo region, active
/// between 1 and 14 minutes before `now`.
///
/// Demo accounts get the unusable password hash `!` and cannot log in.
pub async fn seed_demo_activity<R: Rng>(
    db: &Database,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<usize, RosaryError> {
    let regions = REGION_COORDINATES
        .iter()
        .filter(|(name, _, _)| *name != UNKNOWN_REGION)
        .take(DEMO_USER_COUNT);

    let mut seeded = 0;
    for (i, (region, lat, lng)) in regions.enumerate() {
        let username = format!("testuser{}", i + 1);
        let user = users::ensure_user(db, &username, "!", now).await?;
        let location = GeoLocation {
            region: (*region).to_string(),
            lat: Some(*lat),
            lng: Some(*lng),
        };
        let at = now - TimeDelta::minutes(rng.gen_range(1..=14));
        activity::record(db, user.id, &location, at).await?;
        seeded += 1;
    }

    info!(seeded, "demo prayer activity seeded");
    Ok(seeded)
}
