use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::NewContactSubmission;
use crate::state::AppState;

// POST /api/contact
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewContactSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let Json(body) = body?;
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let id = {
        let db = state.db()?;
        queries::insert_contact_submission(&db, &body)?
    };
    tracing::info!(submission_id = id, "contact form submitted");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "ok": true, "id": id })),
    ))
}
