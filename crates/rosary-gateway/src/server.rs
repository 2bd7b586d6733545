// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::{self as axum_middleware, Next};
use axum::Router;
use axum::response::Response;
use axum::routing::get;
use chrono::{DateTime, TimeDelta, Utc};
use rosary_config::model::RosaryConfig;
use rosary_core::{DayMatch, GeoLocator, RosaryError, StorageAdapter};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::geo::locate_or_unknown;
use crate::handlers;
use crate::session::{SessionHandle, SessionStore, session_middleware};

/// Source of "now" for handlers; swapped for a fixed instant in tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Request-path settings derived from [`RosaryConfig`].
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub day_match: DayMatch,
    pub utc_offset_minutes: i32,
    pub presence_window: TimeDelta,
    pub heatmap_window: TimeDelta,
    pub track_requests: bool,
    pub cookie_name: String,
    pub secure_cookie: bool,
    pub session_idle_timeout: TimeDelta,
}

impl GatewaySettings {
    pub fn from_config(config: &RosaryConfig) -> Self {
        Self {
            day_match: config.rosary.day_match,
            utc_offset_minutes: config.rosary.utc_offset_minutes,
            presence_window: TimeDelta::minutes(i64::from(
                config.activity.presence_window_minutes,
            )),
            heatmap_window: TimeDelta::minutes(i64::from(config.activity.heatmap_window_minutes)),
            track_requests: config.activity.track_requests,
            cookie_name: config.session.cookie_name.clone(),
            secure_cookie: config.session.secure_cookie,
            session_idle_timeout: TimeDelta::minutes(i64::from(
                config.session.idle_timeout_minutes,
            )),
        }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self::from_config(&RosaryConfig::default())
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageAdapter>,
    pub geo: Arc<dyn GeoLocator>,
    pub sessions: SessionStore,
    pub settings: Arc<GatewaySettings>,
    pub clock: Clock,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        geo: Arc<dyn GeoLocator>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            storage,
            geo,
            sessions: SessionStore::new(settings.session_idle_timeout),
            settings: Arc::new(settings),
            clock: Arc::new(Utc::now),
            start_time: Instant::now(),
        }
    }

    /// Replace the wall clock.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

/// Build the full route table.
///
/// The session layer is outermost so the activity layer can see who the
/// handler authenticated.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route(
            "/register/",
            get(handlers::register_form).post(handlers::register),
        )
        .route(
            "/accounts/login/",
            get(handlers::login_form).post(handlers::login),
        )
        .route("/logout/", get(handlers::logout))
        .route("/active/", get(handlers::active_users))
        .route("/stats/", get(handlers::stats))
        .route("/map/", get(handlers::heatmap_page))
        .route("/map/data/", get(handlers::heatmap_data))
        .route(
            "/dashboard/",
            get(handlers::dashboard).post(handlers::dashboard_submit),
        )
        .route("/start/", get(handlers::start))
        .route("/pray/", get(handlers::pray))
        .route(
            "/pray/flow/",
            get(handlers::flow).post(handlers::flow_advance),
        )
        .route("/health", get(handlers::health))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            activity_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Refresh the caller's presence row once the handler has run.
///
/// Only authenticated sessions are tracked. Geolocation and storage
/// failures are logged and never change the response.
pub async fn activity_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let session = request.extensions().get::<SessionHandle>().cloned();
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let response = next.run(request).await;

    if !state.settings.track_requests {
        return response;
    }
    let Some(user) = session.and_then(|s| s.user()) else {
        return response;
    };

    let location = locate_or_unknown(state.geo.as_ref(), ip).await;
    if let Err(e) = state
        .storage
        .record_activity(user.id, &location, state.now())
        .await
    {
        tracing::warn!(user_id = user.id, error = %e, "failed to record prayer activity");
    }
    response
}

/// Bind `host:port` and serve until `shutdown` resolves.
pub async fn start_server(
    host: &str,
    port: u16,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), RosaryError> {
    let app = build_router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RosaryError::Internal(format!("failed to bind {addr}: {e}")))?;

    tracing::info!("rosary listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|e| RosaryError::Internal(format!("server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn settings_follow_config() {
        let config: RosaryConfig = rosary_config::load_and_validate_str(
            r#"
[rosary]
day_match = "exact"
utc_offset_minutes = -300

[activity]
presence_window_minutes = 5
heatmap_window_minutes = 30

[session]
cookie_name = "beads"
idle_timeout_minutes = 45
"#,
        )
        .unwrap();
        let settings = GatewaySettings::from_config(&config);
        assert_eq!(settings.day_match, DayMatch::Exact);
        assert_eq!(settings.utc_offset_minutes, -300);
        assert_eq!(settings.presence_window, TimeDelta::minutes(5));
        assert_eq!(settings.heatmap_window, TimeDelta::minutes(30));
        assert_eq!(settings.cookie_name, "beads");
        assert_eq!(settings.session_idle_timeout, TimeDelta::minutes(45));
        assert!(settings.track_requests);
    }

    #[test]
    fn default_windows() {
        let settings = GatewaySettings::default();
        assert_eq!(settings.presence_window, TimeDelta::minutes(10));
        assert_eq!(settings.heatmap_window, TimeDelta::minutes(15));
        assert_eq!(settings.cookie_name, "rosary_session");
    }

    #[test]
    fn clock_is_replaceable() {
        let fixed = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let clock: Clock = Arc::new(move || fixed);
        assert_eq!(clock(), fixed);
    }
}
