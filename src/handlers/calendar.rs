use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::db::queries;
use crate::errors::AppError;
use crate::services::calendar::generate_ics;
use crate::state::AppState;

// GET /calendar/:appointment_id
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    // Strip .ics suffix if present
    let appointment_id = raw_id.strip_suffix(".ics").unwrap_or(&raw_id);

    let (appointment, provider_name) = {
        let db = state.db()?;
        let appointment = queries::get_appointment_by_id(&db, appointment_id)?
            .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id}")))?;
        let provider_name = queries::get_provider(&db, appointment.provider_id)?
            .map(|p| p.full_name)
            .unwrap_or_else(|| "your provider".to_string());
        (appointment, provider_name)
    };

    let ics = generate_ics(&appointment, &state.config.clinic_name, &provider_name);
    let filename = format!("appointment-{appointment_id}.ics");

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response())
}
