pub mod admin;
pub mod appointments;
pub mod availability;
pub mod calendar;
pub mod contact;
pub mod health;
