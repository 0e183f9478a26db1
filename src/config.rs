use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub clinic_name: String,
    /// Offset of the clinic's wall clock from UTC. Windows are stored in
    /// clinic-local time, so "now" is shifted by this before filtering slots.
    pub utc_offset_minutes: i32,
    pub max_range_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "clinic.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            clinic_name: env::var("CLINIC_NAME").unwrap_or_else(|_| "Clinic".to_string()),
            utc_offset_minutes: env::var("CLINIC_UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            max_range_days: env::var("MAX_RANGE_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(62),
        }
    }

    /// Current clinic-local time.
    pub fn local_now(&self) -> chrono::NaiveDateTime {
        chrono::Utc::now().naive_utc() + chrono::Duration::minutes(self.utc_offset_minutes as i64)
    }
}
