//! Doctor calendar: booked slots rendered as timed events.
//!
//! Slots are stored as a `D_M_YYYY` date and a 12-hour `hh:mm AM|PM` time in
//! the doctor's local time. Events are emitted in UTC.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::Appointment;

const EVENT_LENGTH_MINUTES: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub appointment_id: Uuid,
    pub patient_name: String,
    pub slot_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub extended_props: EventDetails,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SlotParseError {
    #[error("malformed slot date {0:?}")]
    Date(String),
    #[error("malformed slot time {0:?}")]
    Time(String),
    #[error("UTC offset of {0} minutes is out of range")]
    Offset(i32),
}

/// `"5_3_2025"` is 5 March 2025.
pub fn parse_slot_date(raw: &str) -> Result<NaiveDate, SlotParseError> {
    let err = || SlotParseError::Date(raw.to_string());
    let mut parts = raw.split('_').map(|p| p.trim().parse::<u32>());
    let (Some(Ok(day)), Some(Ok(month)), Some(Ok(year)), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(err());
    };
    let year = i32::try_from(year).map_err(|_| err())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(err)
}

/// `"09:30 PM"`, `"9:30 pm"` and `"09:30PM"` are all accepted.
pub fn parse_slot_time(raw: &str) -> Result<NaiveTime, SlotParseError> {
    let compact: String = raw.split_whitespace().collect::<String>().to_uppercase();
    NaiveTime::parse_from_str(&compact, "%I:%M%p")
        .map_err(|_| SlotParseError::Time(raw.to_string()))
}

/// UTC instant of a slot booked in a zone `utc_offset_minutes` east of UTC.
pub fn slot_start_utc(
    slot_date: &str,
    slot_time: &str,
    utc_offset_minutes: i32,
) -> Result<DateTime<Utc>, SlotParseError> {
    let offset = utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or(SlotParseError::Offset(utc_offset_minutes))?;
    let local = NaiveDateTime::new(parse_slot_date(slot_date)?, parse_slot_time(slot_time)?);
    // A fixed offset maps every local time to exactly one instant.
    local
        .and_local_timezone(offset)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(SlotParseError::Offset(utc_offset_minutes))
}

/// Build events for the doctor's appointments, skipping slots that do not parse.
pub fn calendar_events(
    appointments: &[Appointment],
    utc_offset_minutes: i32,
) -> Vec<CalendarEvent> {
    appointments
        .iter()
        .filter_map(|appt| {
            match slot_start_utc(&appt.slot_date, &appt.slot_time, utc_offset_minutes) {
                Ok(start) => Some(CalendarEvent {
                    title: format!("Appointment with {}", appt.user_data.name),
                    start,
                    end: start + Duration::minutes(EVENT_LENGTH_MINUTES),
                    all_day: false,
                    extended_props: EventDetails {
                        appointment_id: appt.id,
                        patient_name: appt.user_data.name.clone(),
                        slot_time: appt.slot_time.clone(),
                    },
                }),
                Err(e) => {
                    tracing::warn!(
                        appointment_id = %appt.id,
                        error = %e,
                        "Skipping unparseable slot"
                    );
                    None
                }
            }
        })
        .collect()
}
