use std::fmt;

use chrono::{NaiveDate, NaiveTime};

use super::patient::Patient;

/// A persisted appointment joined with the patient it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub id: i64,
    pub date: NaiveDate,
    pub start_at: NaiveTime,
    pub end_at: NaiveTime,
    pub patient: Patient,
    pub procedure: String,
}

impl Appointment {
    /// Column values of this record, for writing it back to the store.
    pub fn fields(&self) -> AppointmentFields {
        AppointmentFields {
            date: self.date,
            start_at: self.start_at,
            end_at: self.end_at,
            patient_id: self.patient.id,
            procedure: self.procedure.clone(),
        }
    }
}

/// `2026-10-19, [12:00 - 13:00] - john`
impl fmt::Display for Appointment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, [{} - {}] - {}",
            self.date,
            self.start_at.format("%H:%M"),
            self.end_at.format("%H:%M"),
            self.patient.username
        )
    }
}

/// Stored columns of an appointment, with the patient as a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentFields {
    pub date: NaiveDate,
    pub start_at: NaiveTime,
    pub end_at: NaiveTime,
    pub patient_id: i64,
    pub procedure: String,
}
