// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the content model, completion history, presence and accounts.

pub mod activity;
pub mod content;
pub mod prayer_sessions;
pub mod users;
