use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

const PATIENT_COLUMNS: &str = "id, username, email, first_name, last_name";

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
    })
}

pub fn insert_patient(conn: &Connection, new: &NewPatient) -> Result<Patient, DatabaseError> {
    let result = conn.execute(
        "INSERT INTO patients (username, email, first_name, last_name)
         VALUES (?1, ?2, ?3, ?4)",
        params![new.username, new.email, new.first_name, new.last_name],
    );

    match result {
        Ok(_) => Ok(Patient {
            id: conn.last_insert_rowid(),
            username: new.username.clone(),
            email: new.email.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
        }),
        Err(rusqlite::Error::SqliteFailure(err, msg))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(DatabaseError::ConstraintViolation(
                msg.unwrap_or_else(|| "patient already exists".into()),
            ))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
        params![id],
        patient_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Exact, case-sensitive email match.
pub fn get_patient_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<Patient>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE email = ?1"),
        params![email],
        patient_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn get_all_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map([], patient_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Removes a patient. Refused while any appointment still references it.
pub fn delete_patient(conn: &Connection, id: i64) -> Result<(), DatabaseError> {
    let referenced: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE patient_id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    if referenced > 0 {
        return Err(DatabaseError::Protected {
            entity_type: "Patient".into(),
            id: id.to_string(),
            referenced_by: format!("{referenced} appointment(s)"),
        });
    }

    let changed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
