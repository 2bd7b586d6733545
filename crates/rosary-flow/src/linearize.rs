// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sequence linearizer: flattens the nested content model into beads.
//!
//! The bead list for a mystery set is the introductory sequence, then each
//! mystery's decade in ascending mystery id, then the concluding sequence.
//! Every step contributes `repeat` identical beads.

use rosary_core::types::{CONCLUSION_SEQUENCE, INTRO_SEQUENCE};
use rosary_core::{Bead, ContentSnapshot, Part, RosaryError, Step};
use serde::Serialize;
use tracing::warn;

/// Flatten the recitation for `mystery_set_id` into an ordered bead list.
///
/// Fails with [`RosaryError::ContentMissing`] when either named sequence is
/// absent, the set id is unknown, or a step references a missing prayer.
/// A known set without mysteries yields the intro and conclusion only.
pub fn linearize(
    content: &ContentSnapshot,
    mystery_set_id: i64,
) -> Result<Vec<Bead>, RosaryError> {
    let intro = content.sequence(INTRO_SEQUENCE).ok_or_else(|| {
        RosaryError::ContentMissing(format!("prayer sequence `{INTRO_SEQUENCE}`"))
    })?;
    let conclusion = content.sequence(CONCLUSION_SEQUENCE).ok_or_else(|| {
        RosaryError::ContentMissing(format!("prayer sequence `{CONCLUSION_SEQUENCE}`"))
    })?;
    let set = content.mystery_set(mystery_set_id).ok_or_else(|| {
        RosaryError::ContentMissing(format!("mystery set with id {mystery_set_id}"))
    })?;

    let mysteries = content.mysteries_of(set.id);
    if mysteries.is_empty() {
        warn!(mystery_set = %set.name, "mystery set has no mysteries; reciting intro and conclusion only");
    }

    let mut beads = Vec::new();
    expand(content, &intro.steps, Part::Intro, None, &mut beads)?;
    for (position, mystery) in (1u32..).zip(mysteries) {
        expand(
            content,
            &mystery.steps,
            Part::Mystery(position),
            Some(mystery.title.as_str()),
            &mut beads,
        )?;
    }
    expand(content, &conclusion.steps, Part::Conclusion, None, &mut beads)?;
    Ok(beads)
}

fn expand(
    content: &ContentSnapshot,
    steps: &[Step],
    part: Part,
    group: Option<&str>,
    out: &mut Vec<Bead>,
) -> Result<(), RosaryError> {
    let mut ordered: Vec<&Step> = steps.iter().collect();
    ordered.sort_by_key(|step| step.order);

    for step in ordered {
        let prayer = content.prayers.get(&step.prayer_id).ok_or_else(|| {
            RosaryError::ContentMissing(format!(
                "prayer with id {} referenced by {part}",
                step.prayer_id
            ))
        })?;
        for _ in 0..step.repeat {
            out.push(Bead {
                prayer: prayer.clone(),
                part,
                group: group.map(str::to_string),
            });
        }
    }
    Ok(())
}

/// A contiguous run of beads sharing a display group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Run {
    pub part: Part,
    /// Mystery title for decade runs.
    pub label: Option<String>,
    /// Index of the first bead of the run in the full list.
    pub start: usize,
    pub len: usize,
}

impl Run {
    /// Whether bead index `cursor` falls inside this run.
    pub fn contains(&self, cursor: usize) -> bool {
        cursor >= self.start && cursor < self.start + self.len
    }
}

/// Regroup beads into contiguous runs of equal `(part, group)`, in order.
pub fn group_runs(beads: &[Bead]) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for (index, bead) in beads.iter().enumerate() {
        match runs.last_mut() {
            Some(run) if run.part == bead.part && run.label == bead.group => run.len += 1,
            _ => runs.push(Run {
                part: bead.part,
                label: bead.group.clone(),
                start: index,
                len: 1,
            }),
        }
    }
    runs
}

/// Decade runs only: a new run starts whenever the group title changes
/// between adjacent mystery beads.
pub fn decades(beads: &[Bead]) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for (index, bead) in beads.iter().enumerate() {
        if !bead.part.is_mystery() {
            continue;
        }
        match runs.last_mut() {
            Some(run) if run.label == bead.group => run.len += 1,
            _ => runs.push(Run {
                part: bead.part,
                label: bead.group.clone(),
                start: index,
                len: 1,
            }),
        }
    }
    runs
}

/// Number of beads in one part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartCount {
    pub part: Part,
    pub beads: usize,
}

/// Bead counts per part, in recitation order.
pub fn sequence_summary(beads: &[Bead]) -> Vec<PartCount> {
    let mut counts: Vec<PartCount> = Vec::new();
    for bead in beads {
        match counts.last_mut() {
            Some(count) if count.part == bead.part => count.beads += 1,
            _ => counts.push(PartCount {
                part: bead.part,
                beads: 1,
            }),
        }
    }
    counts
}

/// 1-based position of bead `cursor` within its part, and that part's length.
pub fn part_position(beads: &[Bead], cursor: usize) -> Option<(usize, usize)> {
    let part = beads.get(cursor)?.part;
    let start = beads[..cursor]
        .iter()
        .rposition(|b| b.part != part)
        .map_or(0, |i| i + 1);
    let len = beads[start..].iter().take_while(|b| b.part == part).count();
    Some((cursor - start + 1, len))
}
