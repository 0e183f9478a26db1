use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A block of time on one date during which a provider accepts bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: i64,
    pub provider_id: i64,
    pub provider_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: u32,
    pub current_bookings: u32,
    pub max_bookings: u32,
    pub is_available: bool,
}

impl AvailabilityWindow {
    pub fn has_capacity(&self) -> bool {
        self.current_bookings < self.max_bookings
    }
}

/// One candidate bookable interval derived from a window. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub available: bool,
    pub provider_id: i64,
    pub provider_name: String,
    pub current_bookings: u32,
    pub max_bookings: u32,
}

/// Admin input for declaring a new window.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAvailabilityWindow {
    pub provider_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "default_slot_duration")]
    pub slot_duration_minutes: u32,
    #[serde(default = "default_max_bookings")]
    pub max_bookings: u32,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_slot_duration() -> u32 {
    60
}

fn default_max_bookings() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl NewAvailabilityWindow {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.end_time <= self.start_time {
            return Err(anyhow::anyhow!(
                "end_time {} must be after start_time {}",
                self.end_time,
                self.start_time
            ));
        }
        if self.slot_duration_minutes == 0 {
            return Err(anyhow::anyhow!("slot_duration_minutes must be positive"));
        }
        if self.max_bookings == 0 {
            return Err(anyhow::anyhow!("max_bookings must be positive"));
        }
        Ok(())
    }
}
