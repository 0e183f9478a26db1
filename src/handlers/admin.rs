use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    Appointment, AppointmentStatus, AvailabilityWindow, ContactSubmission, NewAvailabilityWindow,
};
use crate::services::booking;
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/appointments
#[derive(Deserialize)]
pub struct AppointmentsQuery {
    pub status: Option<String>,
    pub limit: Option<u32>,
}

pub async fn get_appointments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<AppointmentsQuery>, QueryRejection>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let Query(query) = query?;

    let status = match query.status.as_deref() {
        Some(s) => Some(AppointmentStatus::try_parse(s).ok_or_else(|| {
            AppError::BadRequest(format!(
                "status must be one of pending, confirmed, cancelled; got {s}"
            ))
        })?),
        None => None,
    };
    let limit = query.limit.unwrap_or(50).max(1);

    let appointments = {
        let db = state.db()?;
        queries::get_all_appointments(&db, status.as_ref().map(|s| s.as_str()), limit as i64)?
    };

    Ok(Json(appointments))
}

// POST /api/admin/appointments/:id/cancel
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let cancelled = {
        let mut db = state.db()?;
        booking::cancel_appointment(&mut db, &id)?
    };

    if cancelled {
        Ok(Json(serde_json::json!({"ok": true})))
    } else {
        Err(AppError::NotFound(format!("appointment {id}")))
    }
}

// POST /api/admin/availability
pub async fn create_window(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<NewAvailabilityWindow>, JsonRejection>,
) -> Result<(StatusCode, Json<AvailabilityWindow>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let Json(body) = body?;

    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let window = {
        let db = state.db()?;
        if queries::get_provider(&db, body.provider_id)?.is_none() {
            return Err(AppError::NotFound(format!("provider {}", body.provider_id)));
        }
        let id = queries::create_window(&db, &body)?;
        queries::get_window(&db, id)?
            .ok_or_else(|| AppError::NotFound(format!("availability window {id}")))?
    };

    tracing::info!(
        window_id = window.id,
        provider_id = window.provider_id,
        date = %window.date,
        "availability window created"
    );

    Ok((StatusCode::CREATED, Json(window)))
}

// GET /api/admin/contact
#[derive(Deserialize)]
pub struct ContactQuery {
    pub limit: Option<u32>,
}

pub async fn get_contact_submissions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<ContactQuery>, QueryRejection>,
) -> Result<Json<Vec<ContactSubmission>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let Query(query) = query?;

    let limit = query.limit.unwrap_or(100).max(1);
    let submissions = {
        let db = state.db()?;
        queries::list_contact_submissions(&db, limit as i64)?
    };

    Ok(Json(submissions))
}
