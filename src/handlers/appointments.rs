use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, AppointmentRequest};
use crate::services::booking;
use crate::state::AppState;

// POST /api/appointments
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let Json(body) = body?;
    let now = state.config.local_now();
    let appointment = {
        let mut db = state.db()?;
        booking::book_appointment(&mut db, &body, now)?
    };
    Ok((StatusCode::CREATED, Json(appointment)))
}

// GET /api/appointments/:id
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = {
        let db = state.db()?;
        queries::get_appointment_by_id(&db, &id)?
    };
    appointment
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("appointment {id}")))
}
