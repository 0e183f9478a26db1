use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Procedure, Provider, TimeSlot};
use crate::services::slots::generate_slots;
use crate::state::AppState;

// GET /api/providers
pub async fn get_providers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Provider>>, AppError> {
    let providers = {
        let db = state.db()?;
        queries::list_active_providers(&db)?
    };
    Ok(Json(providers))
}

// GET /api/procedures
pub async fn get_procedures(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Procedure>>, AppError> {
    let procedures = {
        let db = state.db()?;
        queries::list_procedures(&db)?
    };
    Ok(Json(procedures))
}

// GET /api/availability
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub provider_id: Option<i64>,
    pub procedure_id: Option<i64>,
    pub duration: Option<u32>,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<Json<Vec<TimeSlot>>, AppError> {
    let Query(query) = query?;
    let start = parse_date_param("start_date", query.start_date.as_deref())?;
    let end = parse_date_param("end_date", query.end_date.as_deref())?;

    if end < start {
        return Err(AppError::BadRequest(
            "end_date must not be before start_date".to_string(),
        ));
    }
    if (end - start).num_days() > state.config.max_range_days {
        return Err(AppError::BadRequest(format!(
            "date range may span at most {} days",
            state.config.max_range_days
        )));
    }
    if query.duration == Some(0) {
        return Err(AppError::BadRequest("duration must be positive".to_string()));
    }

    let windows = {
        let db = state.db()?;
        queries::get_eligible_windows(&db, &start, &end, query.provider_id, query.procedure_id)?
    };

    let slots = generate_slots(&windows, query.duration, state.config.local_now());
    tracing::debug!(
        windows = windows.len(),
        slots = slots.len(),
        %start,
        %end,
        "generated availability"
    );

    Ok(Json(slots))
}

fn parse_date_param(name: &str, value: Option<&str>) -> Result<NaiveDate, AppError> {
    let value = value.ok_or_else(|| AppError::BadRequest(format!("{name} is required")))?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("{name} must be YYYY-MM-DD, got {value}")))
}
