// SPDX-FileCopyrightText: 2026 Rosary Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Views are JSON documents tagged with a `view` field, apart from the two
//! static HTML shells served at `/` and `/map/`.

use axum::Json;
use axum::extract::{Extension, Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use rosary_core::types::{ActiveSummary, CompletionStats, HeatPoint};
use rosary_core::{HealthStatus, Part, Prayer, RosaryError};
use rosary_flow::{
    Advance, PartCount, Progress, Run, decades, group_runs, heatmap_points, linearize,
    part_position, resolve, sequence_summary, today, weekday_name,
};
use secrecy::SecretString;
use serde::Serialize;

use crate::auth::{self, LoginForm, RegisterForm};
use crate::error::ApiError;
use crate::server::AppState;
use crate::session::{SessionHandle, SessionUser};

type ApiResult<T> = Result<T, ApiError>;

const HOME_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Rosary</title></head>
<body>
<h1>Pray the Rosary</h1>
<p><a href="/dashboard/">Dashboard</a> · <a href="/active/">Praying now</a> · <a href="/map/">Map</a></p>
<p><a href="/accounts/login/">Log in</a> or <a href="/register/">register</a> to keep your history.</p>
</body>
</html>
"#;

const HEATMAP_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Rosary heatmap</title></head>
<body>
<h1>Praying in the last minutes</h1>
<ul id="points"></ul>
<script>
fetch("/map/data/")
  .then((r) => r.json())
  .then((points) => {
    const list = document.getElementById("points");
    for (const p of points) {
      const item = document.createElement("li");
      item.textContent = `${p.count} at (${p.lat}, ${p.lng})`;
      list.appendChild(item);
    }
  });
</script>
</body>
</html>
"#;

// --- Static pages ---

/// GET /
pub async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

/// GET /map/
pub async fn heatmap_page() -> Html<&'static str> {
    Html(HEATMAP_PAGE)
}

// --- Accounts ---

/// Field list of an account form.
#[derive(Debug, Serialize)]
pub struct FormView {
    pub view: &'static str,
    pub action: &'static str,
    pub fields: &'static [&'static str],
}

/// Validation failures of a submitted form.
#[derive(Debug, Serialize)]
pub struct FormErrors {
    pub errors: Vec<String>,
}

/// GET /register/
pub async fn register_form() -> Json<FormView> {
    Json(FormView {
        view: "register",
        action: "/register/",
        fields: &["username", "password1", "password2"],
    })
}

/// POST /register/
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    let errors = form.validate();
    if !errors.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(FormErrors { errors })).into_response();
    }

    let username = form.username.trim().to_string();
    let result = async {
        let stored = hash_blocking(form.password1).await?;
        state
            .storage
            .create_user(&username, &stored, state.now())
            .await
    }
    .await;

    match result {
        Ok(user) => {
            tracing::info!(user_id = user.id, "account registered");
            Redirect::to("/accounts/login/").into_response()
        }
        Err(RosaryError::Validation(message)) => (
            StatusCode::BAD_REQUEST,
            Json(FormErrors {
                errors: vec![format!("username: {message}")],
            }),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

async fn hash_blocking(password: SecretString) -> Result<String, RosaryError> {
    tokio::task::spawn_blocking(move || auth::hash_password(&password))
        .await
        .map_err(|e| RosaryError::Internal(format!("password hashing task failed: {e}")))?
}

/// GET /accounts/login/
pub async fn login_form() -> Json<FormView> {
    Json(FormView {
        view: "login",
        action: "/accounts/login/",
        fields: &["username", "password"],
    })
}

/// POST /accounts/login/
pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Redirect> {
    let username = form.username.trim().to_string();
    let Some(credentials) = state.storage.find_credentials(&username).await? else {
        tracing::debug!("login for unknown username");
        return Err(RosaryError::Unauthorized.into());
    };

    let password = form.password;
    let stored = credentials.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || auth::verify_password(&password, &stored))
        .await
        .map_err(|e| RosaryError::Internal(format!("password check task failed: {e}")))?;
    if !verified {
        tracing::debug!(user_id = credentials.user.id, "login with wrong password");
        return Err(RosaryError::Unauthorized.into());
    }

    session.rotate(|data| {
        data.user = Some(SessionUser {
            id: credentials.user.id,
            username: credentials.user.username.clone(),
        });
    });
    tracing::info!(user_id = credentials.user.id, "logged in");
    Ok(Redirect::to("/dashboard/"))
}

/// GET /logout/
pub async fn logout(Extension(session): Extension<SessionHandle>) -> Redirect {
    session.clear();
    Redirect::to("/")
}

// --- Presence and statistics ---

/// GET /active/
pub async fn active_users(State(state): State<AppState>) -> ApiResult<Json<ActiveSummary>> {
    let summary = state
        .storage
        .count_active_since(state.settings.presence_window, state.now())
        .await?;
    Ok(Json(summary))
}

/// GET /map/data/
pub async fn heatmap_data(State(state): State<AppState>) -> ApiResult<Json<Vec<HeatPoint>>> {
    let histogram = state
        .storage
        .region_histogram_since(state.settings.heatmap_window, state.now())
        .await?;
    Ok(Json(heatmap_points(&histogram)))
}

#[derive(Debug, Serialize)]
pub struct StatsView {
    pub view: &'static str,
    pub username: String,
    #[serde(flatten)]
    pub stats: CompletionStats,
}

/// GET /stats/
pub async fn stats(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> ApiResult<Response> {
    let Some(user) = session.user() else {
        return Ok(Redirect::to("/accounts/login/").into_response());
    };
    let stats = state.storage.completion_stats(user.id).await?;
    Ok(Json(StatsView {
        view: "stats",
        username: user.username,
        stats,
    })
    .into_response())
}

// --- Recitation ---

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub view: &'static str,
    pub username: Option<String>,
    pub today: &'static str,
    pub recitation_in_progress: bool,
}

/// GET /dashboard/
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> Json<DashboardView> {
    let data = session.data();
    Json(DashboardView {
        view: "dashboard",
        username: data.user.map(|u| u.username),
        today: weekday_name(today(state.now(), state.settings.utc_offset_minutes)),
        recitation_in_progress: data.progress.is_active(),
    })
}

/// POST /dashboard/
pub async fn dashboard_submit() -> Redirect {
    Redirect::to("/start/")
}

/// GET /start/
///
/// Resolves today's mystery set and remembers it for the session.
pub async fn start(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> ApiResult<Redirect> {
    let day = weekday_name(today(state.now(), state.settings.utc_offset_minutes));
    let sets = state.storage.list_mystery_sets().await?;
    let Some(set) = resolve(&sets, day, state.settings.day_match) else {
        tracing::info!(day, "no mystery set assigned to today");
        return Err(RosaryError::NoMysteryToday { day: day.to_string() }.into());
    };

    tracing::debug!(day, mystery_set = %set.name, "resolved today's mysteries");
    let set_id = set.id;
    session.update(|data| data.mystery_set_id = Some(set_id));
    Ok(Redirect::to("/pray/"))
}

/// GET /pray/
pub async fn pray(Extension(session): Extension<SessionHandle>) -> Redirect {
    let started = session.update(|data| match data.mystery_set_id {
        Some(set_id) => {
            data.progress.start(set_id);
            true
        }
        None => false,
    });
    if started {
        Redirect::to("/pray/flow/")
    } else {
        Redirect::to("/dashboard/")
    }
}

/// One bead as listed in the flow view.
#[derive(Debug, Serialize)]
pub struct BeadView {
    pub prayer: String,
    pub part: Part,
    pub done: bool,
}

/// The current bead of a recitation plus the structure around it.
#[derive(Debug, Serialize)]
pub struct FlowView {
    pub view: &'static str,
    pub mystery_set: Option<String>,
    pub prayer: Prayer,
    pub part: Part,
    pub mystery_title: Option<String>,
    /// 1-based index of the current bead.
    pub current_index: usize,
    pub total_steps: usize,
    pub part_position: usize,
    pub part_length: usize,
    pub sections: Vec<Run>,
    pub decades: Vec<Run>,
    pub summary: Vec<PartCount>,
    pub beads: Vec<BeadView>,
}

#[derive(Debug, Serialize)]
pub struct CompleteView {
    pub view: &'static str,
    pub mystery: String,
    pub recorded: bool,
}

fn active_set_id(progress: &Progress) -> Result<i64, RosaryError> {
    match progress {
        Progress::InProgress { mystery_set_id, .. } => Ok(*mystery_set_id),
        Progress::Absent => Err(RosaryError::SessionStateInvalid(
            "no recitation in progress".into(),
        )),
    }
}

/// GET /pray/flow/
///
/// Content is loaded and linearized on every request so edits show up
/// immediately.
pub async fn flow(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> ApiResult<Json<FlowView>> {
    let set_id = active_set_id(&session.data().progress)?;
    let content = state.storage.load_content().await?;
    let beads = linearize(&content, set_id)?;

    let (cursor, _) = session.update(|data| data.progress.view(beads.len()))?;
    let Some(bead) = beads.get(cursor) else {
        return Err(RosaryError::SessionStateInvalid(format!("no bead at {cursor}")).into());
    };
    let (part_position, part_length) = part_position(&beads, cursor).unwrap_or((1, 1));

    Ok(Json(FlowView {
        view: "flow",
        mystery_set: content.mystery_set(set_id).map(|s| s.name.clone()),
        prayer: bead.prayer.clone(),
        part: bead.part,
        mystery_title: bead.group.clone(),
        current_index: cursor + 1,
        total_steps: beads.len(),
        part_position,
        part_length,
        sections: group_runs(&beads),
        decades: decades(&beads),
        summary: sequence_summary(&beads),
        beads: beads
            .iter()
            .enumerate()
            .map(|(index, b)| BeadView {
                prayer: b.prayer.name.clone(),
                part: b.part,
                done: index < cursor,
            })
            .collect(),
    }))
}

/// POST /pray/flow/
///
/// Confirms the current bead. The final confirmation renders the completion
/// view and, for signed-in users, stores the finished recitation. If that
/// store fails the last bead is reopened so the confirmation can be retried.
pub async fn flow_advance(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> ApiResult<Response> {
    let set_id = active_set_id(&session.data().progress)?;
    let content = state.storage.load_content().await?;
    let total = linearize(&content, set_id)?.len();

    let mystery_set_id = match session.update(|data| data.progress.advance(total))? {
        Advance::Moved { .. } => return Ok(Redirect::to("/pray/flow/").into_response()),
        Advance::Completed { mystery_set_id } => mystery_set_id,
    };

    // linearize() succeeded, so the set is present in this snapshot.
    let label = content
        .mystery_set(mystery_set_id)
        .map(|s| s.name.clone())
        .ok_or_else(|| RosaryError::ContentMissing(format!("mystery set {mystery_set_id}")))?;

    let recorded = match session.user() {
        Some(user) => {
            let stored = state
                .storage
                .record_completion(user.id, &label, state.now())
                .await;
            let id = match stored {
                Ok(id) => id,
                Err(e) => {
                    session.update(|data| data.progress.reopen_last(total, mystery_set_id));
                    tracing::error!(user_id = user.id, error = %e, "failed to record completion");
                    return Err(e.into());
                }
            };
            tracing::info!(user_id = user.id, record_id = id, mystery = %label, "recitation completed");
            true
        }
        None => {
            tracing::debug!(mystery = %label, "anonymous recitation completed");
            false
        }
    };

    Ok(Json(CompleteView {
        view: "complete",
        mystery: label,
        recorded,
    })
    .into_response())
}

// --- Health ---

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub storage: String,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, storage) = match state.storage.health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "healthy".to_string()),
        Ok(HealthStatus::Degraded(reason)) => (StatusCode::OK, format!("degraded: {reason}")),
        Ok(HealthStatus::Unhealthy(reason)) => {
            (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {reason}"))
        }
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {e}")),
    };
    let body = HealthResponse {
        status: if status == StatusCode::OK { "ok" } else { "unavailable" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        storage,
    };
    (status, Json(body))
}
