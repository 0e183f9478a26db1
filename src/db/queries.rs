use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Appointment, AppointmentStatus, AvailabilityWindow, ContactSubmission, NewAvailabilityWindow,
    NewContactSubmission, Procedure, Provider,
};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_date(d: &NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

fn fmt_time(t: &NaiveTime) -> String {
    t.format(TIME_FMT).to_string()
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT).with_context(|| format!("invalid stored date: {s}"))
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FMT).with_context(|| format!("invalid stored time: {s}"))
}

// ── Providers ──

pub fn create_provider(
    conn: &Connection,
    full_name: &str,
    title: Option<&str>,
    specialization: Option<&str>,
    active: bool,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO providers (full_name, title, specialization, active) VALUES (?1, ?2, ?3, ?4)",
        params![full_name, title, specialization, active as i32],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_active_providers(conn: &Connection) -> anyhow::Result<Vec<Provider>> {
    let mut stmt = conn.prepare(
        "SELECT id, full_name, title, specialization, active
         FROM providers WHERE active = 1 ORDER BY full_name ASC",
    )?;
    let rows = stmt.query_map([], parse_provider_row)?;

    let mut providers = vec![];
    for row in rows {
        providers.push(row?);
    }
    Ok(providers)
}

pub fn get_provider(conn: &Connection, id: i64) -> anyhow::Result<Option<Provider>> {
    let result = conn.query_row(
        "SELECT id, full_name, title, specialization, active FROM providers WHERE id = ?1",
        params![id],
        parse_provider_row,
    );

    match result {
        Ok(provider) => Ok(Some(provider)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn parse_provider_row(row: &rusqlite::Row) -> rusqlite::Result<Provider> {
    Ok(Provider {
        id: row.get(0)?,
        full_name: row.get(1)?,
        title: row.get(2)?,
        specialization: row.get(3)?,
        active: row.get::<_, i32>(4)? != 0,
    })
}

// ── Procedures ──

pub fn create_procedure(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
    duration_minutes: u32,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO procedures (name, description, duration_minutes) VALUES (?1, ?2, ?3)",
        params![name, description, duration_minutes],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_procedures(conn: &Connection) -> anyhow::Result<Vec<Procedure>> {
    let mut stmt = conn
        .prepare("SELECT id, name, description, duration_minutes FROM procedures ORDER BY name ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(Procedure {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            duration_minutes: row.get(3)?,
        })
    })?;

    let mut procedures = vec![];
    for row in rows {
        procedures.push(row?);
    }
    Ok(procedures)
}

pub fn get_procedure(conn: &Connection, id: i64) -> anyhow::Result<Option<Procedure>> {
    let result = conn.query_row(
        "SELECT id, name, description, duration_minutes FROM procedures WHERE id = ?1",
        params![id],
        |row| {
            Ok(Procedure {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                duration_minutes: row.get(3)?,
            })
        },
    );

    match result {
        Ok(procedure) => Ok(Some(procedure)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn link_provider_procedure(
    conn: &Connection,
    provider_id: i64,
    procedure_id: i64,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO provider_procedures (provider_id, procedure_id) VALUES (?1, ?2)",
        params![provider_id, procedure_id],
    )?;
    Ok(())
}

pub fn provider_offers_procedure(
    conn: &Connection,
    provider_id: i64,
    procedure_id: i64,
) -> anyhow::Result<bool> {
    let offered: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM provider_procedures WHERE provider_id = ?1 AND procedure_id = ?2",
        params![provider_id, procedure_id],
        |row| row.get(0),
    )?;
    Ok(offered)
}

// ── Availability Windows ──

const WINDOW_COLUMNS: &str = "w.id, w.provider_id, p.full_name, w.date, w.start_time, w.end_time, \
     w.slot_duration_minutes, w.current_bookings, w.max_bookings, w.is_available";

pub fn create_window(conn: &Connection, window: &NewAvailabilityWindow) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO availability_windows
            (provider_id, date, start_time, end_time, slot_duration_minutes, max_bookings, is_available)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            window.provider_id,
            fmt_date(&window.date),
            fmt_time(&window.start_time),
            fmt_time(&window.end_time),
            window.slot_duration_minutes,
            window.max_bookings,
            window.is_available as i32,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_window(conn: &Connection, id: i64) -> anyhow::Result<Option<AvailabilityWindow>> {
    let sql = format!(
        "SELECT {WINDOW_COLUMNS} FROM availability_windows w
         INNER JOIN providers p ON p.id = w.provider_id
         WHERE w.id = ?1"
    );
    let result = conn.query_row(&sql, params![id], |row| Ok(parse_window_row(row)));

    match result {
        Ok(window) => Ok(Some(window?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Windows a patient may book from: inside `[start, end]`, marked available,
/// owned by an active provider, optionally narrowed to one provider and to
/// providers offering `procedure_id`. Ordered by date, then start time.
pub fn get_eligible_windows(
    conn: &Connection,
    start: &NaiveDate,
    end: &NaiveDate,
    provider_id: Option<i64>,
    procedure_id: Option<i64>,
) -> anyhow::Result<Vec<AvailabilityWindow>> {
    let sql = format!(
        "SELECT {WINDOW_COLUMNS} FROM availability_windows w
         INNER JOIN providers p ON p.id = w.provider_id
         WHERE w.date >= ?1 AND w.date <= ?2
           AND w.is_available = 1
           AND p.active = 1
           AND (?3 IS NULL OR w.provider_id = ?3)
           AND (?4 IS NULL OR EXISTS (
               SELECT 1 FROM provider_procedures pp
               WHERE pp.provider_id = w.provider_id AND pp.procedure_id = ?4
           ))
         ORDER BY w.date ASC, w.start_time ASC, w.provider_id ASC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![fmt_date(start), fmt_date(end), provider_id, procedure_id],
        |row| Ok(parse_window_row(row)),
    )?;

    let mut windows = vec![];
    for row in rows {
        windows.push(row??);
    }
    Ok(windows)
}

/// The bookable window of `provider_id` that fully contains `[start, end)` on
/// `date`. Windows with spare capacity are preferred over full ones.
pub fn find_containing_window(
    conn: &Connection,
    provider_id: i64,
    date: &NaiveDate,
    start: &NaiveTime,
    end: &NaiveTime,
) -> anyhow::Result<Option<AvailabilityWindow>> {
    let sql = format!(
        "SELECT {WINDOW_COLUMNS} FROM availability_windows w
         INNER JOIN providers p ON p.id = w.provider_id
         WHERE w.provider_id = ?1 AND w.date = ?2
           AND w.start_time <= ?3 AND w.end_time >= ?4
           AND w.is_available = 1
           AND p.active = 1
         ORDER BY (w.current_bookings < w.max_bookings) DESC, w.start_time ASC
         LIMIT 1"
    );
    let result = conn.query_row(
        &sql,
        params![provider_id, fmt_date(date), fmt_time(start), fmt_time(end)],
        |row| Ok(parse_window_row(row)),
    );

    match result {
        Ok(window) => Ok(Some(window?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Takes one unit of capacity. Returns false when the window is already full.
pub fn reserve_window_capacity(conn: &Connection, window_id: i64) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE availability_windows SET current_bookings = current_bookings + 1
         WHERE id = ?1 AND current_bookings < max_bookings",
        params![window_id],
    )?;
    Ok(count > 0)
}

pub fn release_window_capacity(conn: &Connection, window_id: i64) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE availability_windows SET current_bookings = current_bookings - 1
         WHERE id = ?1 AND current_bookings > 0",
        params![window_id],
    )?;
    Ok(())
}

fn parse_window_row(row: &rusqlite::Row) -> anyhow::Result<AvailabilityWindow> {
    let date_str: String = row.get(3)?;
    let start_str: String = row.get(4)?;
    let end_str: String = row.get(5)?;

    Ok(AvailabilityWindow {
        id: row.get(0)?,
        provider_id: row.get(1)?,
        provider_name: row.get(2)?,
        date: parse_date(&date_str)?,
        start_time: parse_time(&start_str)?,
        end_time: parse_time(&end_str)?,
        slot_duration_minutes: row.get(6)?,
        current_bookings: row.get(7)?,
        max_bookings: row.get(8)?,
        is_available: row.get::<_, i32>(9)? != 0,
    })
}

// ── Appointments ──

const APPOINTMENT_COLUMNS: &str = "id, provider_id, procedure_id, window_id, patient_name, patient_email, \
     patient_phone, date, start_time, duration_minutes, status, notes, created_at, updated_at";

pub fn create_appointment(conn: &Connection, appt: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO appointments (id, provider_id, procedure_id, window_id, patient_name, patient_email,
            patient_phone, date, start_time, duration_minutes, status, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            appt.id,
            appt.provider_id,
            appt.procedure_id,
            appt.window_id,
            appt.patient_name,
            appt.patient_email,
            appt.patient_phone,
            fmt_date(&appt.date),
            fmt_time(&appt.start_time),
            appt.duration_minutes,
            appt.status.as_str(),
            appt.notes,
            appt.created_at.format(DATETIME_FMT).to_string(),
            appt.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_appointment_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Appointment>> {
    let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1");
    let result = conn.query_row(&sql, params![id], |row| Ok(parse_appointment_row(row)));

    match result {
        Ok(appt) => Ok(Some(appt?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_all_appointments(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Appointment>> {
    let sql = format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY date DESC, start_time DESC LIMIT ?2"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![status_filter, limit], |row| {
        Ok(parse_appointment_row(row))
    })?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &str,
    status: &AppointmentStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let date_str: String = row.get(7)?;
    let start_str: String = row.get(8)?;
    let status_str: String = row.get(10)?;
    let created_at_str: String = row.get(12)?;
    let updated_at_str: String = row.get(13)?;

    let created_at = NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Appointment {
        id: row.get(0)?,
        provider_id: row.get(1)?,
        procedure_id: row.get(2)?,
        window_id: row.get(3)?,
        patient_name: row.get(4)?,
        patient_email: row.get(5)?,
        patient_phone: row.get(6)?,
        date: parse_date(&date_str)?,
        start_time: parse_time(&start_str)?,
        duration_minutes: row.get(9)?,
        status: AppointmentStatus::parse(&status_str),
        notes: row.get(11)?,
        created_at,
        updated_at,
    })
}

// ── Contact Submissions ──

pub fn insert_contact_submission(
    conn: &Connection,
    submission: &NewContactSubmission,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO contact_submissions (name, email, phone, message) VALUES (?1, ?2, ?3, ?4)",
        params![
            submission.name.trim(),
            submission.email.trim(),
            submission.phone,
            submission.message
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_contact_submissions(
    conn: &Connection,
    limit: i64,
) -> anyhow::Result<Vec<ContactSubmission>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, phone, message, created_at
         FROM contact_submissions ORDER BY id DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        Ok(ContactSubmission {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            message: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;

    let mut submissions = vec![];
    for row in rows {
        submissions.push(row?);
    }
    Ok(submissions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FMT).unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, TIME_FMT).unwrap()
    }

    fn add_window(conn: &Connection, provider_id: i64, day: &str, available: bool) -> i64 {
        create_window(
            conn,
            &NewAvailabilityWindow {
                provider_id,
                date: date(day),
                start_time: time("09:00:00"),
                end_time: time("11:00:00"),
                slot_duration_minutes: 60,
                max_bookings: 1,
                is_available: available,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_list_active_providers_excludes_inactive() {
        let conn = setup_db();
        create_provider(&conn, "Dr. Ana Ruiz", Some("MD"), Some("Dermatology"), true).unwrap();
        create_provider(&conn, "Dr. Retired", None, None, false).unwrap();

        let providers = list_active_providers(&conn).unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].full_name, "Dr. Ana Ruiz");
        assert_eq!(providers[0].specialization.as_deref(), Some("Dermatology"));
    }

    #[test]
    fn test_eligible_windows_filters_range_and_flags() {
        let conn = setup_db();
        let active = create_provider(&conn, "Dr. Active", None, None, true).unwrap();
        let inactive = create_provider(&conn, "Dr. Inactive", None, None, false).unwrap();

        add_window(&conn, active, "2024-02-15", true);
        add_window(&conn, active, "2024-02-16", false);
        add_window(&conn, active, "2024-03-01", true);
        add_window(&conn, inactive, "2024-02-15", true);

        let windows =
            get_eligible_windows(&conn, &date("2024-02-14"), &date("2024-02-20"), None, None)
                .unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].provider_id, active);
        assert_eq!(windows[0].provider_name, "Dr. Active");
        assert_eq!(windows[0].start_time, time("09:00:00"));
        assert_eq!(windows[0].end_time, time("11:00:00"));
    }

    #[test]
    fn test_eligible_windows_by_provider_and_procedure() {
        let conn = setup_db();
        let a = create_provider(&conn, "Dr. A", None, None, true).unwrap();
        let b = create_provider(&conn, "Dr. B", None, None, true).unwrap();
        let botox = create_procedure(&conn, "Botox", None, 30).unwrap();
        link_provider_procedure(&conn, b, botox).unwrap();

        add_window(&conn, a, "2024-02-15", true);
        add_window(&conn, b, "2024-02-15", true);

        let range = (date("2024-02-15"), date("2024-02-15"));

        let all = get_eligible_windows(&conn, &range.0, &range.1, None, None).unwrap();
        assert_eq!(all.len(), 2);

        let only_a = get_eligible_windows(&conn, &range.0, &range.1, Some(a), None).unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].provider_id, a);

        let offering = get_eligible_windows(&conn, &range.0, &range.1, None, Some(botox)).unwrap();
        assert_eq!(offering.len(), 1);
        assert_eq!(offering[0].provider_id, b);
    }

    #[test]
    fn test_eligible_windows_ordered_by_date_then_start() {
        let conn = setup_db();
        let p = create_provider(&conn, "Dr. P", None, None, true).unwrap();
        add_window(&conn, p, "2024-02-16", true);
        create_window(
            &conn,
            &NewAvailabilityWindow {
                provider_id: p,
                date: date("2024-02-15"),
                start_time: time("13:00:00"),
                end_time: time("15:00:00"),
                slot_duration_minutes: 30,
                max_bookings: 2,
                is_available: true,
            },
        )
        .unwrap();
        add_window(&conn, p, "2024-02-15", true);

        let windows =
            get_eligible_windows(&conn, &date("2024-02-15"), &date("2024-02-16"), None, None)
                .unwrap();
        let keys: Vec<_> = windows.iter().map(|w| (w.date, w.start_time)).collect();
        assert_eq!(
            keys,
            vec![
                (date("2024-02-15"), time("09:00:00")),
                (date("2024-02-15"), time("13:00:00")),
                (date("2024-02-16"), time("09:00:00")),
            ]
        );
    }

    #[test]
    fn test_reserve_capacity_stops_at_max() {
        let conn = setup_db();
        let p = create_provider(&conn, "Dr. P", None, None, true).unwrap();
        let w = add_window(&conn, p, "2024-02-15", true);

        assert!(reserve_window_capacity(&conn, w).unwrap());
        assert!(!reserve_window_capacity(&conn, w).unwrap());
        assert_eq!(get_window(&conn, w).unwrap().unwrap().current_bookings, 1);

        release_window_capacity(&conn, w).unwrap();
        release_window_capacity(&conn, w).unwrap();
        assert_eq!(get_window(&conn, w).unwrap().unwrap().current_bookings, 0);
    }

    #[test]
    fn test_find_containing_window() {
        let conn = setup_db();
        let p = create_provider(&conn, "Dr. P", None, None, true).unwrap();
        let w = add_window(&conn, p, "2024-02-15", true);

        let found = find_containing_window(
            &conn,
            p,
            &date("2024-02-15"),
            &time("10:00:00"),
            &time("11:00:00"),
        )
        .unwrap();
        assert_eq!(found.map(|w| w.id), Some(w));

        let overflow = find_containing_window(
            &conn,
            p,
            &date("2024-02-15"),
            &time("10:30:00"),
            &time("11:30:00"),
        )
        .unwrap();
        assert!(overflow.is_none());
    }

    #[test]
    fn test_contact_submissions_newest_first() {
        let conn = setup_db();
        for name in ["First", "Second"] {
            insert_contact_submission(
                &conn,
                &NewContactSubmission {
                    name: name.to_string(),
                    email: "a@example.com".to_string(),
                    phone: None,
                    message: "Hello".to_string(),
                },
            )
            .unwrap();
        }

        let submissions = list_contact_submissions(&conn, 10).unwrap();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].name, "Second");
    }
}
