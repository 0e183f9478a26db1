use chrono::{Duration, NaiveDateTime};

use crate::models::{AvailabilityWindow, TimeSlot};

pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Subdivides each window into candidate slots and drops those that have
/// already started relative to `now`.
///
/// Every slot is `max(requested, window granularity)` long, but the cursor
/// advances by the window's own granularity, so a request longer than the
/// granularity yields overlapping candidates. Slots that would run past the
/// window's end are discarded rather than truncated.
///
/// `available` is a snapshot of the window's booking counter, not a
/// reservation. Output order follows input order, so windows sorted by
/// `(date, start_time)` produce slots sorted the same way.
pub fn generate_slots(
    windows: &[AvailabilityWindow],
    requested_duration_minutes: Option<u32>,
    now: NaiveDateTime,
) -> Vec<TimeSlot> {
    let requested = requested_duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);

    let mut slots: Vec<TimeSlot> = windows
        .iter()
        .flat_map(|window| subdivide(window, requested))
        .collect();

    slots.retain(|slot| slot.date.and_time(slot.start_time) > now);
    slots
}

fn subdivide(window: &AvailabilityWindow, requested: u32) -> Vec<TimeSlot> {
    let mut slots = vec![];

    // A zero granularity could never advance the cursor.
    if window.slot_duration_minutes == 0 {
        return slots;
    }

    let effective = Duration::minutes(requested.max(window.slot_duration_minutes) as i64);
    let step = Duration::minutes(window.slot_duration_minutes as i64);
    let window_end = window.date.and_time(window.end_time);
    let available = window.has_capacity();

    let mut cursor = window.date.and_time(window.start_time);
    while cursor + effective <= window_end {
        slots.push(TimeSlot {
            date: window.date,
            start_time: cursor.time(),
            end_time: (cursor + effective).time(),
            available,
            provider_id: window.provider_id,
            provider_name: window.provider_name.clone(),
            current_bookings: window.current_bookings,
            max_bookings: window.max_bookings,
        });
        cursor += step;
    }

    slots
}
