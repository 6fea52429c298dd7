//! Repository layer — entity-scoped database operations.
//!
//! Free functions in the sub-modules take a `&Connection`. `SqliteStore`
//! owns one connection and exposes them through the `PatientDirectory` and
//! `AppointmentStore` traits, which is what the API layer is handed.

mod appointment;
mod patient;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use super::DatabaseError;
use crate::models::{Appointment, AppointmentFields, NewPatient, Patient};

pub use appointment::*;
pub use patient::*;

/// Identity records appointments refer to.
pub trait PatientDirectory: Send + Sync {
    fn insert_patient(&self, new: &NewPatient) -> Result<Patient, DatabaseError>;
    fn get_patient(&self, id: i64) -> Result<Option<Patient>, DatabaseError>;
    fn find_patient_by_email(&self, email: &str) -> Result<Option<Patient>, DatabaseError>;
    fn list_patients(&self) -> Result<Vec<Patient>, DatabaseError>;
    fn delete_patient(&self, id: i64) -> Result<(), DatabaseError>;
}

/// Keyed collection of appointments.
pub trait AppointmentStore: Send + Sync {
    fn insert_appointment(&self, fields: &AppointmentFields) -> Result<i64, DatabaseError>;
    fn get_appointment(&self, id: i64) -> Result<Option<Appointment>, DatabaseError>;
    fn list_appointments(&self) -> Result<Vec<Appointment>, DatabaseError>;
    fn update_appointment(&self, id: i64, fields: &AppointmentFields) -> Result<(), DatabaseError>;
    fn delete_appointment(&self, id: i64) -> Result<(), DatabaseError>;
}

/// Everything the scheduling API needs from persistence.
pub trait SchedulingStore: PatientDirectory + AppointmentStore {}

impl<T: PatientDirectory + AppointmentStore> SchedulingStore for T {}

/// SQLite-backed store. Access to the single connection is serialized.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open (or create) the database at `path` and run migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::new(super::open_database(path)?))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(super::open_memory_database()?))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }
}

impl PatientDirectory for SqliteStore {
    fn insert_patient(&self, new: &NewPatient) -> Result<Patient, DatabaseError> {
        insert_patient(&*self.conn()?, new)
    }

    fn get_patient(&self, id: i64) -> Result<Option<Patient>, DatabaseError> {
        get_patient(&*self.conn()?, id)
    }

    fn find_patient_by_email(&self, email: &str) -> Result<Option<Patient>, DatabaseError> {
        get_patient_by_email(&*self.conn()?, email)
    }

    fn list_patients(&self) -> Result<Vec<Patient>, DatabaseError> {
        get_all_patients(&*self.conn()?)
    }

    fn delete_patient(&self, id: i64) -> Result<(), DatabaseError> {
        delete_patient(&*self.conn()?, id)
    }
}

impl AppointmentStore for SqliteStore {
    fn insert_appointment(&self, fields: &AppointmentFields) -> Result<i64, DatabaseError> {
        insert_appointment(&*self.conn()?, fields)
    }

    fn get_appointment(&self, id: i64) -> Result<Option<Appointment>, DatabaseError> {
        get_appointment(&*self.conn()?, id)
    }

    fn list_appointments(&self) -> Result<Vec<Appointment>, DatabaseError> {
        get_all_appointments(&*self.conn()?)
    }

    fn update_appointment(&self, id: i64, fields: &AppointmentFields) -> Result<(), DatabaseError> {
        update_appointment(&*self.conn()?, id, fields)
    }

    fn delete_appointment(&self, id: i64) -> Result<(), DatabaseError> {
        delete_appointment(&*self.conn()?, id)
    }
}
