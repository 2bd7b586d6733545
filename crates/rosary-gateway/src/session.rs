// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cookie-keyed, in-process session store.
//!
//! Each browser session owns one [`SessionData`] value, addressed by a
//! random UUID carried in an `HttpOnly` cookie. Entries are created on first
//! write, so requests that never touch the session never receive a cookie.
//! Entries idle for longer than the configured timeout are treated as absent
//! and pruned whenever a new session is created.

use std::sync::{Arc, OnceLock};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use rosary_flow::Progress;
use uuid::Uuid;

use crate::server::AppState;

/// The authenticated identity of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
}

/// Everything one browser session remembers between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub user: Option<SessionUser>,
    /// Mystery set chosen by `/start/`.
    pub mystery_set_id: Option<i64>,
    pub progress: Progress,
}

#[derive(Debug)]
struct StoredSession {
    data: SessionData,
    last_seen: DateTime<Utc>,
}

/// Shared map from session key to session data.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<DashMap<Uuid, StoredSession>>,
    idle_timeout: TimeDelta,
}

impl SessionStore {
    pub fn new(idle_timeout: TimeDelta) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            idle_timeout,
        }
    }

    fn expired(&self, entry: &StoredSession, now: DateTime<Utc>) -> bool {
        now - entry.last_seen > self.idle_timeout
    }

    /// The data stored under `key`, unless it has gone idle.
    pub fn get(&self, key: &Uuid, now: DateTime<Utc>) -> Option<SessionData> {
        self.inner
            .get(key)
            .filter(|entry| !self.expired(entry, now))
            .map(|entry| entry.data.clone())
    }

    /// Whether `key` names a live session; refreshes its idle timer if so.
    pub fn touch(&self, key: &Uuid, now: DateTime<Utc>) -> bool {
        match self.inner.get_mut(key) {
            Some(mut entry) if !self.expired(&entry, now) => {
                entry.last_seen = now;
                true
            }
            _ => false,
        }
    }

    /// Mutate the entry for `key`, creating it if absent.
    ///
    /// The shard lock is held only for the duration of `f`. Creating an
    /// entry first drops every idle one.
    pub fn update<R>(
        &self,
        key: Uuid,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut SessionData) -> R,
    ) -> R {
        if !self.inner.contains_key(&key) {
            self.prune(now);
        }
        let mut entry = self.inner.entry(key).or_insert_with(|| StoredSession {
            data: SessionData::default(),
            last_seen: now,
        });
        if self.expired(&entry, now) {
            entry.data = SessionData::default();
        }
        entry.last_seen = now;
        f(&mut entry.data)
    }

    /// Remove and return the live data under `key`.
    pub fn take(&self, key: &Uuid, now: DateTime<Utc>) -> Option<SessionData> {
        self.inner
            .remove(key)
            .filter(|(_, entry)| !self.expired(entry, now))
            .map(|(_, entry)| entry.data)
    }

    pub fn remove(&self, key: &Uuid) {
        self.inner.remove(key);
    }

    /// Drop every session idle for longer than the timeout.
    pub fn prune(&self, now: DateTime<Utc>) {
        let before = self.inner.len();
        self.inner.retain(|_, entry| now - entry.last_seen <= self.idle_timeout);
        let pruned = before.saturating_sub(self.inner.len());
        if pruned > 0 {
            tracing::debug!(pruned, "expired idle sessions");
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Per-request handle on the caller's session, installed by [`session_middleware`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    key: Uuid,
    /// Replacement key chosen by [`SessionHandle::rotate`].
    rotated: Arc<OnceLock<Uuid>>,
    store: SessionStore,
    now: DateTime<Utc>,
}

impl SessionHandle {
    pub fn new(key: Uuid, store: SessionStore, now: DateTime<Utc>) -> Self {
        Self {
            key,
            rotated: Arc::new(OnceLock::new()),
            store,
            now,
        }
    }

    /// The key the session lives under after this request.
    pub fn key(&self) -> Uuid {
        self.rotated.get().copied().unwrap_or(self.key)
    }

    /// A snapshot of the session's data (default when nothing was stored yet).
    pub fn data(&self) -> SessionData {
        self.store.get(&self.key(), self.now).unwrap_or_default()
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.data().user
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut SessionData) -> R) -> R {
        self.store.update(self.key(), self.now, f)
    }

    /// Move the session to a fresh key, then apply `f` to it.
    ///
    /// Used on login so a key handed out before authentication never
    /// carries an identity.
    pub fn rotate<R>(&self, f: impl FnOnce(&mut SessionData) -> R) -> R {
        let previous = self.key();
        let carried = self.store.take(&previous, self.now).unwrap_or_default();
        let fresh = Uuid::new_v4();
        let key = match self.rotated.set(fresh) {
            Ok(()) => fresh,
            Err(_) => previous,
        };
        self.store.update(key, self.now, |data| {
            *data = carried;
            f(data)
        })
    }

    /// Forget identity, chosen set and progress.
    pub fn clear(&self) {
        self.store.remove(&self.key());
    }
}

/// Resolve the session cookie into a [`SessionHandle`] request extension and
/// issue a cookie when the handler created or rotated the session.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let now = state.now();
    let cookie_name = state.settings.cookie_name.clone();
    let existing = jar
        .get(&cookie_name)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
        .filter(|key| state.sessions.touch(key, now));

    let handle = SessionHandle::new(
        existing.unwrap_or_else(Uuid::new_v4),
        state.sessions.clone(),
        now,
    );
    request.extensions_mut().insert(handle.clone());

    let response = next.run(request).await;

    let key = handle.key();
    if existing != Some(key) && state.sessions.touch(&key, now) {
        let cookie = Cookie::build((cookie_name, key.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(state.settings.secure_cookie)
            .build();
        return (jar.add(cookie), response).into_response();
    }
    response
}
