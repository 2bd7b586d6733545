// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session progress tracker.
//!
//! A recitation is a cursor into the bead list of one mystery set. The
//! value lives in the caller's session data and is passed in by `&mut`.

use rosary_core::RosaryError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Where a session is in its recitation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Progress {
    #[default]
    Absent,
    InProgress {
        cursor: usize,
        mystery_set_id: i64,
    },
}

/// Outcome of a successful [`Progress::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The cursor moved to the next bead.
    Moved { cursor: usize },
    /// The last bead was confirmed. Progress is now `Absent`.
    Completed { mystery_set_id: i64 },
}

impl Progress {
    /// Begin (or restart) a recitation at the first bead.
    pub fn start(&mut self, mystery_set_id: i64) {
        *self = Progress::InProgress {
            cursor: 0,
            mystery_set_id,
        };
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Progress::InProgress { .. })
    }

    pub fn clear(&mut self) {
        *self = Progress::Absent;
    }

    /// Confirm the current bead of a `total_len`-bead recitation.
    pub fn advance(&mut self, total_len: usize) -> Result<Advance, RosaryError> {
        let Progress::InProgress {
            cursor,
            mystery_set_id,
        } = *self
        else {
            return Err(RosaryError::SessionStateInvalid(
                "no recitation in progress".into(),
            ));
        };

        let next = cursor + 1;
        if next == total_len {
            self.clear();
            return Ok(Advance::Completed { mystery_set_id });
        }
        if next > total_len {
            self.clear();
            warn!(cursor, total_len, "recitation cursor beyond sequence; progress cleared");
            return Err(RosaryError::SessionStateInvalid(format!(
                "cursor {cursor} is beyond a sequence of {total_len} beads"
            )));
        }
        *self = Progress::InProgress {
            cursor: next,
            mystery_set_id,
        };
        Ok(Advance::Moved { cursor: next })
    }

    /// Put the final bead of a just-completed recitation back in front of
    /// the session, so a completion whose record could not be stored can be
    /// confirmed again. A recitation started in the meantime is left alone.
    pub fn reopen_last(&mut self, total_len: usize, mystery_set_id: i64) {
        if *self == Progress::Absent && total_len > 0 {
            *self = Progress::InProgress {
                cursor: total_len - 1,
                mystery_set_id,
            };
        }
    }

    /// Current `(cursor, mystery_set_id)` for a `total_len`-bead recitation.
    ///
    /// A cursor at or beyond the end means the content changed under the
    /// session; progress is cleared and the desync reported.
    pub fn view(&mut self, total_len: usize) -> Result<(usize, i64), RosaryError> {
        match *self {
            Progress::Absent => Err(RosaryError::SessionStateInvalid(
                "no recitation in progress".into(),
            )),
            Progress::InProgress {
                cursor,
                mystery_set_id,
            } if cursor < total_len => Ok((cursor, mystery_set_id)),
            Progress::InProgress { cursor, .. } => {
                self.clear();
                warn!(cursor, total_len, "recitation cursor beyond sequence; progress cleared");
                Err(RosaryError::SessionStateInvalid(format!(
                    "cursor {cursor} is beyond a sequence of {total_len} beads"
                )))
            }
        }
    }
}
