use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, AppointmentRequest, AppointmentStatus};
use crate::services::slots::DEFAULT_DURATION_MINUTES;

#[derive(Debug)]
pub enum BookingError {
    InvalidRequest(String),
    InThePast,
    UnknownProcedure(i64),
    ProcedureNotOffered,
    OutsideAvailability,
    FullyBooked,
    Database(anyhow::Error),
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingError::InvalidRequest(reason) => write!(f, "{reason}"),
            BookingError::InThePast => {
                write!(f, "That time has already passed. Please choose a later slot.")
            }
            BookingError::UnknownProcedure(id) => write!(f, "Unknown procedure: {id}"),
            BookingError::ProcedureNotOffered => {
                write!(f, "That provider does not offer the requested procedure.")
            }
            BookingError::OutsideAvailability => {
                write!(
                    f,
                    "The provider is not available at that time. Please pick one of the listed slots."
                )
            }
            BookingError::FullyBooked => {
                write!(
                    f,
                    "Sorry, that time slot is already booked. Could you pick a different time?"
                )
            }
            BookingError::Database(e) => write!(f, "database error: {e}"),
        }
    }
}

impl std::error::Error for BookingError {}

impl From<anyhow::Error> for BookingError {
    fn from(e: anyhow::Error) -> Self {
        BookingError::Database(e)
    }
}

impl From<rusqlite::Error> for BookingError {
    fn from(e: rusqlite::Error) -> Self {
        BookingError::Database(e.into())
    }
}

impl From<BookingError> for AppError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::InvalidRequest(_) | BookingError::UnknownProcedure(_) => {
                AppError::BadRequest(e.to_string())
            }
            BookingError::InThePast
            | BookingError::OutsideAvailability
            | BookingError::ProcedureNotOffered => {
                AppError::Unprocessable(e.to_string())
            }
            BookingError::FullyBooked => AppError::Conflict(e.to_string()),
            BookingError::Database(inner) => AppError::Internal(inner),
        }
    }
}

/// Books `request` into a window of the requested provider.
///
/// The window lookup, the capacity increment and the appointment insert run in
/// one transaction; capacity is taken with a conditional update so the
/// window's counter never exceeds its maximum.
pub fn book_appointment(
    conn: &mut Connection,
    request: &AppointmentRequest,
    now: NaiveDateTime,
) -> Result<Appointment, BookingError> {
    validate_request(request)?;

    let procedure = match request.procedure_id {
        Some(procedure_id) => {
            let procedure = queries::get_procedure(conn, procedure_id)?
                .ok_or(BookingError::UnknownProcedure(procedure_id))?;
            if !queries::provider_offers_procedure(conn, request.provider_id, procedure_id)? {
                return Err(BookingError::ProcedureNotOffered);
            }
            Some(procedure)
        }
        None => None,
    };

    let duration_minutes = request
        .duration_minutes
        .or(procedure.map(|p| p.duration_minutes))
        .unwrap_or(DEFAULT_DURATION_MINUTES);
    if duration_minutes == 0 {
        return Err(BookingError::InvalidRequest(
            "duration_minutes must be positive".to_string(),
        ));
    }

    let starts_at = request.date.and_time(request.start_time);
    if starts_at <= now {
        return Err(BookingError::InThePast);
    }

    let ends_at = starts_at + Duration::minutes(duration_minutes as i64);
    if ends_at.date() != request.date {
        return Err(BookingError::OutsideAvailability);
    }

    let tx = conn.transaction()?;

    let window = queries::find_containing_window(
        &tx,
        request.provider_id,
        &request.date,
        &request.start_time,
        &ends_at.time(),
    )?
    .ok_or(BookingError::OutsideAvailability)?;

    if !queries::reserve_window_capacity(&tx, window.id)? {
        return Err(BookingError::FullyBooked);
    }

    let created = chrono::Utc::now().naive_utc();
    let appointment = Appointment {
        id: uuid::Uuid::new_v4().to_string(),
        provider_id: request.provider_id,
        procedure_id: request.procedure_id,
        window_id: window.id,
        patient_name: request.patient_name.trim().to_string(),
        patient_email: request.patient_email.trim().to_string(),
        patient_phone: request.patient_phone.clone(),
        date: request.date,
        start_time: request.start_time,
        duration_minutes,
        status: AppointmentStatus::Confirmed,
        notes: request.notes.clone(),
        created_at: created,
        updated_at: created,
    };
    queries::create_appointment(&tx, &appointment)?;

    tx.commit()?;

    tracing::info!(
        appointment_id = %appointment.id,
        provider_id = appointment.provider_id,
        window_id = window.id,
        "appointment booked"
    );

    Ok(appointment)
}

/// Cancels an appointment and gives its capacity back to the window.
/// Returns false if the appointment is unknown or already cancelled.
pub fn cancel_appointment(conn: &mut Connection, id: &str) -> anyhow::Result<bool> {
    let tx = conn.transaction()?;

    let appointment = match queries::get_appointment_by_id(&tx, id)? {
        Some(a) if a.status != AppointmentStatus::Cancelled => a,
        _ => return Ok(false),
    };

    queries::update_appointment_status(&tx, id, &AppointmentStatus::Cancelled)?;
    queries::release_window_capacity(&tx, appointment.window_id)?;

    tx.commit()?;

    tracing::info!(appointment_id = %id, window_id = appointment.window_id, "appointment cancelled");
    Ok(true)
}

fn validate_request(request: &AppointmentRequest) -> Result<(), BookingError> {
    if request.patient_name.trim().is_empty() {
        return Err(BookingError::InvalidRequest(
            "patient_name is required".to_string(),
        ));
    }
    if !request.patient_email.contains('@') {
        return Err(BookingError::InvalidRequest(format!(
            "invalid email: {}",
            request.patient_email
        )));
    }
    Ok(())
}
