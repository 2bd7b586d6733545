// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Rosary tracker.
//!
//! An axum router over the storage and geolocation collaborators. Sessions
//! are kept in process and keyed by cookie; the recitation itself is
//! computed per request by `rosary-flow`.

pub mod auth;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod server;
pub mod session;

pub use error::ApiError;
pub use geo::{HttpGeoLocator, NoGeoLocator, StaticGeoLocator, build_locator, locate_or_unknown};
pub use server::{AppState, GatewaySettings, build_router, start_server};
pub use session::{SessionData, SessionHandle, SessionStore, SessionUser};
