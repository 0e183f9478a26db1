pub mod availability;
pub mod booking;
pub mod contact;
pub mod provider;

pub use availability::{AvailabilityWindow, NewAvailabilityWindow, TimeSlot};
pub use booking::{Appointment, AppointmentRequest, AppointmentStatus};
pub use contact::{ContactSubmission, NewContactSubmission};
pub use provider::{Procedure, Provider};
