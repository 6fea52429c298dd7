use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

const APPOINTMENT_SELECT: &str = "SELECT a.id, a.date, a.start_at, a.end_at, a.procedure,
                p.id, p.username, p.email, p.first_name, p.last_name
         FROM appointments a
         JOIN patients p ON a.patient_id = p.id";

/// Raw row before date/time columns are parsed.
struct AppointmentRow {
    id: i64,
    date: String,
    start_at: String,
    end_at: String,
    procedure: String,
    patient: Patient,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        date: row.get(1)?,
        start_at: row.get(2)?,
        end_at: row.get(3)?,
        procedure: row.get(4)?,
        patient: Patient {
            id: row.get(5)?,
            username: row.get(6)?,
            email: row.get(7)?,
            first_name: row.get(8)?,
            last_name: row.get(9)?,
        },
    })
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| DatabaseError::InvalidValue {
        field: field.into(),
        value: value.into(),
    })
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime, DatabaseError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S%.f").map_err(|_| DatabaseError::InvalidValue {
        field: field.into(),
        value: value.into(),
    })
}

impl AppointmentRow {
    fn into_appointment(self) -> Result<Appointment, DatabaseError> {
        Ok(Appointment {
            id: self.id,
            date: parse_date("date", &self.date)?,
            start_at: parse_time("start_at", &self.start_at)?,
            end_at: parse_time("end_at", &self.end_at)?,
            patient: self.patient,
            procedure: self.procedure,
        })
    }
}

/// Inserts an appointment and returns its assigned id.
pub fn insert_appointment(
    conn: &Connection,
    fields: &AppointmentFields,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (date, start_at, end_at, patient_id, procedure)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            fields.date.to_string(),
            fields.start_at.to_string(),
            fields.end_at.to_string(),
            fields.patient_id,
            fields.procedure,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_appointment(conn: &Connection, id: i64) -> Result<Option<Appointment>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("{APPOINTMENT_SELECT} WHERE a.id = ?1"),
            params![id],
            read_row,
        )
        .optional()?;
    row.map(AppointmentRow::into_appointment).transpose()
}

/// All appointments in insertion order.
pub fn get_all_appointments(conn: &Connection) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{APPOINTMENT_SELECT} ORDER BY a.id ASC"))?;
    let rows = stmt.query_map([], read_row)?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(row?.into_appointment()?);
    }
    Ok(appointments)
}

/// Overwrites every stored column of an existing appointment.
pub fn update_appointment(
    conn: &Connection,
    id: i64,
    fields: &AppointmentFields,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments
         SET date = ?1, start_at = ?2, end_at = ?3, patient_id = ?4, procedure = ?5
         WHERE id = ?6",
        params![
            fields.date.to_string(),
            fields.start_at.to_string(),
            fields.end_at.to_string(),
            fields.patient_id,
            fields.procedure,
            id,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_appointment(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
