use crate::models::Appointment;

const ICS_FMT: &str = "%Y%m%dT%H%M%S";

pub fn generate_ics(appointment: &Appointment, clinic_name: &str, provider_name: &str) -> String {
    let dtstart = appointment.starts_at().format(ICS_FMT).to_string();
    let dtend = appointment.ends_at().format(ICS_FMT).to_string();
    let dtstamp = appointment.created_at.format(ICS_FMT).to_string();
    let uid = format!("{}@clinic", appointment.id);

    let summary = format!("Appointment with {provider_name} at {clinic_name}");
    let description = appointment
        .notes
        .as_deref()
        .unwrap_or("No additional notes");

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Clinic//Appointments//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}
