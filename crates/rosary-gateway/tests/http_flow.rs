// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router-level tests: real SQLite storage in a tempdir, requests driven
//! through `tower::ServiceExt::oneshot`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, Response, StatusCode};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rosary_config::model::{GeoPrefixConfig, StorageConfig};
use rosary_core::types::{ActiveSummary, CompletionStats, RegionCount, User, UserCredentials};
use rosary_core::{
    AdapterType, ContentSnapshot, GeoLocation, HealthStatus, MysterySet, PluginAdapter,
    RosaryError, StorageAdapter,
};
use rosary_gateway::{AppState, GatewaySettings, SessionStore, StaticGeoLocator, build_router};
use rosary_storage::SqliteStorage;
use rosary_storage::seed::{seed_demo_activity, seed_rosary_content};
use serde_json::{Value, json};
use tower::ServiceExt;

const PASSWORD: &str = "s3cretpass";

struct Harness {
    app: Router,
    storage: Arc<SqliteStorage>,
    sessions: SessionStore,
    /// While set, `record_completion` fails as if the disk were full.
    completions_fail: Arc<AtomicBool>,
    now: Arc<Mutex<DateTime<Utc>>>,
    _dir: tempfile::TempDir,
}

/// SQLite storage whose completion writes can be switched off.
struct SwitchableStorage {
    inner: Arc<SqliteStorage>,
    completions_fail: Arc<AtomicBool>,
}

#[async_trait]
impl PluginAdapter for SwitchableStorage {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn adapter_type(&self) -> AdapterType {
        self.inner.adapter_type()
    }

    async fn health_check(&self) -> Result<HealthStatus, RosaryError> {
        self.inner.health_check().await
    }
}

#[async_trait]
impl StorageAdapter for SwitchableStorage {
    async fn initialize(&self) -> Result<(), RosaryError> {
        self.inner.initialize().await
    }

    async fn close(&self) -> Result<(), RosaryError> {
        self.inner.close().await
    }

    async fn load_content(&self) -> Result<ContentSnapshot, RosaryError> {
        self.inner.load_content().await
    }

    async fn list_mystery_sets(&self) -> Result<Vec<MysterySet>, RosaryError> {
        self.inner.list_mystery_sets().await
    }

    async fn record_completion(
        &self,
        user_id: i64,
        mystery: &str,
        at: DateTime<Utc>,
    ) -> Result<i64, RosaryError> {
        if self.completions_fail.load(Ordering::SeqCst) {
            return Err(RosaryError::Storage {
                source: "database or disk is full".into(),
            });
        }
        self.inner.record_completion(user_id, mystery, at).await
    }

    async fn completion_stats(&self, user_id: i64) -> Result<CompletionStats, RosaryError> {
        self.inner.completion_stats(user_id).await
    }

    async fn record_activity(
        &self,
        user_id: i64,
        location: &GeoLocation,
        at: DateTime<Utc>,
    ) -> Result<(), RosaryError> {
        self.inner.record_activity(user_id, location, at).await
    }

    async fn count_active_since(
        &self,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<ActiveSummary, RosaryError> {
        self.inner.count_active_since(window, now).await
    }

    async fn region_histogram_since(
        &self,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<Vec<RegionCount>, RosaryError> {
        self.inner.region_histogram_since(window, now).await
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<User, RosaryError> {
        self.inner.create_user(username, password_hash, at).await
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, RosaryError> {
        self.inner.find_credentials(username).await
    }
}

/// Monday 2026-03-02, 09:00 UTC.
fn monday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

async fn harness(seeded: bool) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(SqliteStorage::new(StorageConfig {
        database_path: dir.path().join("rosary.db").to_string_lossy().into_owned(),
        wal_mode: false,
    }));
    storage.initialize().await.unwrap();
    if seeded {
        seed_rosary_content(storage.database().unwrap()).await.unwrap();
    }

    let geo = Arc::new(StaticGeoLocator::new(vec![GeoPrefixConfig {
        prefix: "203.0.113.".into(),
        region: "England".into(),
        lat: Some(52.3555),
        lng: Some(-1.1743),
    }]));

    let completions_fail = Arc::new(AtomicBool::new(false));
    let switchable = Arc::new(SwitchableStorage {
        inner: storage.clone(),
        completions_fail: completions_fail.clone(),
    });

    let now = Arc::new(Mutex::new(monday_morning()));
    let clock = now.clone();
    let state = AppState::new(switchable, geo, GatewaySettings::default())
        .with_clock(move || *clock.lock().unwrap());
    let sessions = state.sessions.clone();

    Harness {
        app: build_router(state),
        storage,
        sessions,
        completions_fail,
        now,
        _dir: dir,
    }
}

impl Harness {
    async fn send(&self, mut request: Request<Body>) -> Response<Body> {
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([203, 0, 113, 7], 40_000))));
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    fn advance_clock(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    async fn register(&self, username: &str) {
        let form = format!("username={username}&password1={PASSWORD}&password2={PASSWORD}");
        let response = self.post("/register/", &form, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/accounts/login/");
    }

    /// Log in and return the `name=value` session cookie.
    async fn login(&self, username: &str) -> String {
        let form = format!("username={username}&password={PASSWORD}");
        let response = self.post("/accounts/login/", &form, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/dashboard/");
        session_cookie(&response).expect("login issues a session cookie")
    }

    /// Walk `/start/` and `/pray/`, returning the cookie the recitation lives under.
    async fn begin_recitation(&self, cookie: Option<&str>) -> String {
        let response = self.get("/start/", cookie).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/pray/");
        let cookie = cookie
            .map(str::to_string)
            .or_else(|| session_cookie(&response))
            .expect("session cookie");

        let response = self.get("/pray/", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/pray/flow/");
        cookie
    }
}

fn session_cookie(response: &Response<Body>) -> Option<String> {
    let header = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    let pair = header.split(';').next()?.trim();
    pair.starts_with("rosary_session=").then(|| pair.to_string())
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn signed_in_recitation_is_recorded() {
    let h = harness(true).await;
    h.register("alice").await;
    let cookie = h.login("alice").await;
    let cookie = h.begin_recitation(Some(&cookie)).await;

    let view = body_json(h.get("/pray/flow/", Some(&cookie)).await).await;
    assert_eq!(view["view"], "flow");
    assert_eq!(view["mystery_set"], "Joyful");
    assert_eq!(view["current_index"], 1);
    assert_eq!(view["total_steps"], 76);
    assert_eq!(view["part"], "intro");
    assert_eq!(view["part_position"], 1);
    assert_eq!(view["part_length"], 8);
    assert_eq!(view["decades"].as_array().unwrap().len(), 5);
    assert_eq!(view["beads"].as_array().unwrap().len(), 76);

    for _ in 0..75 {
        let response = h.post("/pray/flow/", "", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/pray/flow/");
    }

    let view = body_json(h.get("/pray/flow/", Some(&cookie)).await).await;
    assert_eq!(view["current_index"], 76);
    assert_eq!(view["part"], "conclusion");
    assert_eq!(view["part_position"], 3);

    let response = h.post("/pray/flow/", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"view": "complete", "mystery": "Joyful", "recorded": true})
    );

    // Progress is gone after completion.
    let response = h.get("/pray/flow/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/dashboard/");

    let stats = body_json(h.get("/stats/", Some(&cookie)).await).await;
    assert_eq!(stats["username"], "alice");
    assert_eq!(stats["user_mysteries"], json!([{"key": "Joyful", "count": 1}]));
    assert_eq!(stats["user_days"], json!([{"key": "2026-03-02", "count": 1}]));
    assert_eq!(stats["global_months"], json!([{"key": "2026-03", "count": 1}]));
}

#[tokio::test]
async fn failed_completion_write_can_be_retried() {
    let h = harness(true).await;
    h.register("alice").await;
    let cookie = h.login("alice").await;
    let cookie = h.begin_recitation(Some(&cookie)).await;
    for _ in 0..75 {
        h.post("/pray/flow/", "", Some(&cookie)).await;
    }

    h.completions_fail.store(true, Ordering::SeqCst);
    let response = h.post("/pray/flow/", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // The last bead is still there to confirm again.
    let view = body_json(h.get("/pray/flow/", Some(&cookie)).await).await;
    assert_eq!(view["current_index"], 76);
    assert_eq!(view["mystery_set"], "Joyful");
    assert!(h.storage.completion_stats(1).await.unwrap().user_days.is_empty());

    h.completions_fail.store(false, Ordering::SeqCst);
    let response = h.post("/pray/flow/", "", Some(&cookie)).await;
    assert_eq!(
        body_json(response).await,
        json!({"view": "complete", "mystery": "Joyful", "recorded": true})
    );
    let stats = h.storage.completion_stats(1).await.unwrap();
    assert_eq!(stats.user_days.len(), 1);
}

#[tokio::test]
async fn anonymous_recitation_completes_without_a_record() {
    let h = harness(true).await;
    let cookie = h.begin_recitation(None).await;

    for _ in 0..75 {
        h.post("/pray/flow/", "", Some(&cookie)).await;
    }
    let response = h.post("/pray/flow/", "", Some(&cookie)).await;
    assert_eq!(
        body_json(response).await,
        json!({"view": "complete", "mystery": "Joyful", "recorded": false})
    );

    let summary = h.storage.completion_stats(1).await.unwrap();
    assert!(summary.global_days.is_empty());
}

#[tokio::test]
async fn restarting_resets_the_cursor() {
    let h = harness(true).await;
    let cookie = h.begin_recitation(None).await;
    for _ in 0..10 {
        h.post("/pray/flow/", "", Some(&cookie)).await;
    }
    let view = body_json(h.get("/pray/flow/", Some(&cookie)).await).await;
    assert_eq!(view["current_index"], 11);
    assert_eq!(view["part"], "mystery-1");
    assert_eq!(view["mystery_title"], "The Annunciation");

    h.get("/pray/", Some(&cookie)).await;
    let view = body_json(h.get("/pray/flow/", Some(&cookie)).await).await;
    assert_eq!(view["current_index"], 1);
}

#[tokio::test]
async fn flow_without_progress_goes_back_to_dashboard() {
    let h = harness(true).await;

    for response in [
        h.get("/pray/flow/", None).await,
        h.post("/pray/flow/", "", None).await,
        h.get("/pray/", None).await,
    ] {
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/dashboard/");
    }
}

#[tokio::test]
async fn day_without_a_set_renders_missing_mystery() {
    let h = harness(false).await;
    let response = h.get("/start/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"view": "missing_mystery", "day": "Monday"})
    );
}

#[tokio::test]
async fn missing_concluding_prayers_fail_loudly() {
    let h = harness(true).await;
    let cookie = h.begin_recitation(None).await;

    h.storage
        .database()
        .unwrap()
        .connection()
        .call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "DELETE FROM prayer_sequences WHERE name = 'Concluding Prayers'",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();

    let response = h.get("/pray/flow/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "content not seeded: prayer sequence `Concluding Prayers`"
    );
}

#[tokio::test]
async fn presence_follows_the_window() {
    let h = harness(true).await;
    h.register("alice").await;
    h.login("alice").await;

    let active = body_json(h.get("/active/", None).await).await;
    assert_eq!(active, json!({"count": 1, "regions": ["England"]}));

    let points = body_json(h.get("/map/data/", None).await).await;
    assert_eq!(points, json!([{"lat": 52.3555, "lng": -1.1743, "count": 1}]));

    h.advance_clock(TimeDelta::minutes(12));
    let active = body_json(h.get("/active/", None).await).await;
    assert_eq!(active["count"], 0);
    let points = body_json(h.get("/map/data/", None).await).await;
    assert_eq!(points.as_array().unwrap().len(), 1, "still inside the heatmap window");

    h.advance_clock(TimeDelta::minutes(8));
    let points = body_json(h.get("/map/data/", None).await).await;
    assert!(points.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn demo_activity_shows_up_and_demo_users_cannot_log_in() {
    let h = harness(true).await;
    let mut rng = StdRng::seed_from_u64(7);
    let seeded = seed_demo_activity(h.storage.database().unwrap(), monday_morning(), &mut rng)
        .await
        .unwrap();

    // Demo users were active 1..=14 minutes ago: all inside the heatmap
    // window, only some inside the presence window.
    let points = body_json(h.get("/map/data/", None).await).await;
    let total: u64 = points
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["count"].as_u64().unwrap())
        .sum();
    assert_eq!(total, seeded as u64);
    let active = body_json(h.get("/active/", None).await).await;
    assert!(active["count"].as_u64().unwrap() <= seeded as u64);

    let response = h
        .post("/accounts/login/", "username=testuser1&password=testpass123", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_reports_every_problem() {
    let h = harness(true).await;

    let response = h
        .post("/register/", "username=&password1=short&password2=other", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errors"].as_array().unwrap().len(), 3);

    h.register("alice").await;
    let form = format!("username=alice&password1={PASSWORD}&password2={PASSWORD}");
    let response = h.post("/register/", &form, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["errors"][0].as_str().unwrap().contains("already taken"));
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let h = harness(true).await;
    h.register("alice").await;
    let response = h
        .post("/accounts/login/", "username=alice&password=not-it-at-all", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());

    let response = h
        .post("/accounts/login/", "username=nobody&password=whatever1", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_issues_a_fresh_session_key() {
    let h = harness(true).await;
    h.register("alice").await;
    let before = h.begin_recitation(None).await;

    let form = format!("username=alice&password={PASSWORD}");
    let response = h.post("/accounts/login/", &form, Some(&before)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let after = session_cookie(&response).expect("login issues a session cookie");
    assert_ne!(after, before);

    // The old key no longer carries anything, not even the recitation.
    let response = h.get("/stats/", Some(&before)).await;
    assert_eq!(response.headers()[LOCATION], "/accounts/login/");
    let response = h.get("/pray/flow/", Some(&before)).await;
    assert_eq!(response.headers()[LOCATION], "/dashboard/");

    assert_eq!(h.get("/stats/", Some(&after)).await.status(), StatusCode::OK);
    let view = body_json(h.get("/pray/flow/", Some(&after)).await).await;
    assert_eq!(view["mystery_set"], "Joyful");
    assert_eq!(h.sessions.len(), 1);
}

#[tokio::test]
async fn abandoned_sessions_are_evicted() {
    let h = harness(true).await;
    for _ in 0..50 {
        let response = h.get("/start/", None).await;
        assert!(session_cookie(&response).is_some());
    }
    assert_eq!(h.sessions.len(), 50);

    h.advance_clock(TimeDelta::hours(3));
    let fresh = h.begin_recitation(None).await;
    assert_eq!(h.sessions.len(), 1);

    // Activity keeps a session alive past the idle timeout.
    h.advance_clock(TimeDelta::minutes(90));
    h.get("/pray/flow/", Some(&fresh)).await;
    h.advance_clock(TimeDelta::minutes(90));
    let view = body_json(h.get("/pray/flow/", Some(&fresh)).await).await;
    assert_eq!(view["current_index"], 1);
}

#[tokio::test]
async fn stats_need_a_login_and_logout_forgets_it() {
    let h = harness(true).await;
    let response = h.get("/stats/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/accounts/login/");

    h.register("alice").await;
    let cookie = h.login("alice").await;
    assert_eq!(h.get("/stats/", Some(&cookie)).await.status(), StatusCode::OK);

    let response = h.get("/logout/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/");

    let response = h.get("/stats/", Some(&cookie)).await;
    assert_eq!(response.headers()[LOCATION], "/accounts/login/");
}

#[tokio::test]
async fn dashboard_and_static_pages() {
    let h = harness(true).await;

    let view = body_json(h.get("/dashboard/", None).await).await;
    assert_eq!(
        view,
        json!({"view": "dashboard", "username": null, "today": "Monday", "recitation_in_progress": false})
    );

    let response = h.post("/dashboard/", "", None).await;
    assert_eq!(response.headers()[LOCATION], "/start/");

    for uri in ["/", "/map/"] {
        let response = h.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"), "{uri}: {content_type}");
    }

    let form = body_json(h.get("/register/", None).await).await;
    assert_eq!(form["fields"], json!(["username", "password1", "password2"]));
}

#[tokio::test]
async fn health_reports_storage() {
    let h = harness(true).await;
    let response = h.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "healthy");
    assert_eq!(h.storage.name(), "sqlite");
}
