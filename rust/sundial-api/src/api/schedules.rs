//! Schedule management endpoints.
//!
//! All routes here sit behind the identity middleware and are scoped to
//! the authenticated owner.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::gateway::AuthenticatedUser;
use crate::scheduler::manager::{NewSchedule, ScheduleUpdate};
use crate::scheduler::{ExecutionInput, ExecutionReport, Frequency, Schedule, ScheduleSummary};
use crate::AppState;

/// Schedule routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/schedules",
            post(create_schedule).get(list_schedules),
        )
        .route(
            "/api/v1/schedules/{id}",
            put(update_schedule).delete(delete_schedule),
        )
        .route("/api/v1/schedules/{id}/toggle", post(toggle_schedule))
        .route("/api/v1/schedules/{id}/results", get(get_results))
        .route("/api/v1/schedules/{id}/run", post(run_schedule))
}

fn parse_frequency(raw: &str) -> Result<Frequency, ApiError> {
    match raw {
        "daily" => Ok(Frequency::Daily),
        "weekly" => Ok(Frequency::Weekly),
        "monthly" => Ok(Frequency::Monthly),
        _ => Err(ApiError::Validation(
            "Invalid frequency. Use: daily, weekly, monthly".to_string(),
        )),
    }
}

/// Request to create a new schedule.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    /// Prompt to execute.
    pub prompt: Option<String>,
    /// Cadence frequency: daily, weekly, or monthly.
    pub frequency: Option<String>,
    /// Time of day, 24-hour "HH:MM".
    pub time: Option<String>,
    /// Weekday names for weekly cadences.
    #[serde(default)]
    pub days: Option<Vec<String>>,
    /// Optional stop date.
    #[serde(default)]
    pub end_date: Option<chrono::NaiveDate>,
    /// Whether to email results (default true).
    #[serde(default)]
    pub notify_by_email: Option<bool>,
}

/// Created-schedule response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleResponse {
    message: String,
    schedule: Schedule,
}

/// Create a new schedule.
///
/// # Endpoint
///
/// `POST /api/v1/schedules`
pub async fn create_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(req): Json<CreateScheduleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(prompt), Some(frequency), Some(time)) = (req.prompt, req.frequency, req.time)
    else {
        return Err(ApiError::Validation(
            "Missing required fields: prompt, frequency, time".to_string(),
        ));
    };

    let schedule = state
        .manager
        .create(
            &user.user_id,
            user.email.clone(),
            NewSchedule {
                prompt,
                frequency: parse_frequency(&frequency)?,
                time,
                days: req.days.unwrap_or_default(),
                end_date: req.end_date,
                notify_by_email: req.notify_by_email.unwrap_or(true),
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateScheduleResponse {
            message: "Schedule created successfully".to_string(),
            schedule,
        }),
    ))
}

/// Schedule listing response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSchedulesResponse {
    schedules: Vec<Schedule>,
    count: usize,
}

/// List the caller's schedules.
///
/// # Endpoint
///
/// `GET /api/v1/schedules`
pub async fn list_schedules(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, ApiError> {
    let schedules = state.manager.list(&user.user_id).await?;
    let count = schedules.len();
    Ok(Json(ListSchedulesResponse { schedules, count }))
}

/// Request to update a schedule; only provided fields change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    /// New prompt.
    pub prompt: Option<String>,
    /// New frequency.
    pub frequency: Option<String>,
    /// New time of day.
    pub time: Option<String>,
    /// New weekday set.
    pub days: Option<Vec<String>>,
    /// New stop date.
    pub end_date: Option<chrono::NaiveDate>,
    /// New email preference.
    pub notify_by_email: Option<bool>,
}

/// Mutation acknowledgement.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    message: String,
    schedule_id: String,
}

/// Update a schedule.
///
/// # Endpoint
///
/// `PUT /api/v1/schedules/{id}`
pub async fn update_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(schedule_id): Path<String>,
    Json(req): Json<UpdateScheduleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let frequency = req.frequency.as_deref().map(parse_frequency).transpose()?;

    state
        .manager
        .update(
            &user.user_id,
            &schedule_id,
            ScheduleUpdate {
                prompt: req.prompt,
                frequency,
                time: req.time,
                days: req.days,
                end_date: req.end_date,
                notify_by_email: req.notify_by_email,
            },
        )
        .await?;

    Ok(Json(MutationResponse {
        message: "Schedule updated".to_string(),
        schedule_id,
    }))
}

/// Delete a schedule and its results.
///
/// # Endpoint
///
/// `DELETE /api/v1/schedules/{id}`
pub async fn delete_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(schedule_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.manager.delete(&user.user_id, &schedule_id).await?;

    Ok(Json(MutationResponse {
        message: "Schedule deleted".to_string(),
        schedule_id,
    }))
}

/// Toggle response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    message: String,
    schedule_id: String,
    is_active: bool,
}

/// Flip a schedule between active and paused.
///
/// # Endpoint
///
/// `POST /api/v1/schedules/{id}/toggle`
pub async fn toggle_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(schedule_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let is_active = state.manager.toggle(&user.user_id, &schedule_id).await?;

    Ok(Json(ToggleResponse {
        message: format!(
            "Schedule {}",
            if is_active { "activated" } else { "paused" }
        ),
        schedule_id,
        is_active,
    }))
}

/// Results paging query parameters.
#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    /// Page size (default 20).
    pub limit: Option<usize>,
    /// Opaque continuation token from a previous page.
    pub cursor: Option<String>,
}

/// Results page response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsResponse {
    results: Vec<crate::scheduler::ExecutionResult>,
    count: usize,
    schedule_summary: ScheduleSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

/// Page through a schedule's execution results, most recent first.
///
/// # Endpoint
///
/// `GET /api/v1/schedules/{id}/results?limit&cursor`
pub async fn get_results(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(schedule_id): Path<String>,
    Query(query): Query<ResultsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .pager
        .fetch(
            &user.user_id,
            &schedule_id,
            query.limit,
            query.cursor.as_deref(),
        )
        .await?;

    Ok(Json(ResultsResponse {
        count: page.results.len(),
        results: page.results,
        schedule_summary: page.schedule,
        next_cursor: page.next_cursor,
    }))
}

/// Run a schedule immediately.
///
/// Snapshots the stored schedule into an execution payload, exactly as a
/// trigger fire would. May race a scheduled fire; run accounting is safe
/// under that.
///
/// # Endpoint
///
/// `POST /api/v1/schedules/{id}/run`
pub async fn run_schedule(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(schedule_id): Path<String>,
) -> Result<Json<ExecutionReport>, ApiError> {
    let schedule = state.manager.get(&user.user_id, &schedule_id).await?;
    let report = state
        .engine
        .execute(ExecutionInput::from_schedule(&schedule))
        .await;
    Ok(Json(report))
}
