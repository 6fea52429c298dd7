//! Appointment scheduling core — payload decoding, patient resolution,
//! time-order validation and delegation to the store.
//!
//! Transport-agnostic: the axum handlers in `api::endpoints` are thin
//! wrappers over these functions, and tests drive them directly against
//! an in-memory `SqliteStore`.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::db::{DatabaseError, SchedulingStore};
use crate::models::{Appointment, AppointmentFields, NewPatient, Patient};

// ─── Types ────────────────────────────────────────────────────────────────────

/// Reference to a patient inside an appointment payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientRef {
    pub email: String,
}

/// Incoming appointment body. Every field is optional so one type serves
/// create, full update and partial update; requiredness is checked per
/// operation. An omitted field is `None`; an explicit `null` is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentPayload {
    #[serde(default, deserialize_with = "non_null")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "non_null")]
    pub start_at: Option<NaiveTime>,
    #[serde(default, deserialize_with = "non_null")]
    pub end_at: Option<NaiveTime>,
    #[serde(default, deserialize_with = "non_null")]
    pub patient: Option<PatientRef>,
    #[serde(default, deserialize_with = "non_null")]
    pub procedure: Option<String>,
}

/// Only called for keys present in the body, so `null` here was sent on purpose.
fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)?
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom("this field may not be null"))
}

/// Fields a create or full update must carry.
struct CompletePayload {
    date: NaiveDate,
    start_at: NaiveTime,
    end_at: NaiveTime,
    patient: PatientRef,
    procedure: Option<String>,
}

impl AppointmentPayload {
    fn require_complete(self) -> Result<CompletePayload, SchedulingError> {
        let mut missing = Vec::new();
        if self.date.is_none() {
            missing.push("date");
        }
        if self.start_at.is_none() {
            missing.push("start_at");
        }
        if self.end_at.is_none() {
            missing.push("end_at");
        }
        if self.patient.is_none() {
            missing.push("patient");
        }

        match (self.date, self.start_at, self.end_at, self.patient) {
            (Some(date), Some(start_at), Some(end_at), Some(patient)) => Ok(CompletePayload {
                date,
                start_at,
                end_at,
                patient,
                procedure: self.procedure,
            }),
            _ => Err(SchedulingError::Validation(format!(
                "Missing required field(s): {}.",
                missing.join(", ")
            ))),
        }
    }
}

/// PUT replaces the record and needs the full payload; PATCH applies
/// whatever is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    Full,
    Partial,
}

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    Protected(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

// ─── Validation ───────────────────────────────────────────────────────────────

/// The one business rule: an appointment starts strictly before it ends.
pub fn validate_time_order(start_at: NaiveTime, end_at: NaiveTime) -> Result<(), SchedulingError> {
    if start_at >= end_at {
        return Err(SchedulingError::Validation(
            "`start_at` must be earlier than `end_at`.".into(),
        ));
    }
    Ok(())
}

/// Looks the patient up by exact email.
pub fn resolve_patient(store: &dyn SchedulingStore, email: &str) -> Result<Patient, SchedulingError> {
    store
        .find_patient_by_email(email)?
        .ok_or_else(|| SchedulingError::Validation("Patient not found.".into()))
}

// ─── Appointments ─────────────────────────────────────────────────────────────

pub fn list_appointments(store: &dyn SchedulingStore) -> Result<Vec<Appointment>, SchedulingError> {
    Ok(store.list_appointments()?)
}

pub fn get_appointment(store: &dyn SchedulingStore, id: i64) -> Result<Appointment, SchedulingError> {
    store
        .get_appointment(id)?
        .ok_or(SchedulingError::NotFound {
            entity: "Appointment",
            id,
        })
}

/// Validates ordering, resolves the patient, persists and returns the
/// stored record.
pub fn create_appointment(
    store: &dyn SchedulingStore,
    payload: AppointmentPayload,
) -> Result<Appointment, SchedulingError> {
    let payload = payload.require_complete()?;
    validate_time_order(payload.start_at, payload.end_at)?;
    let patient = resolve_patient(store, &payload.patient.email)?;

    let fields = AppointmentFields {
        date: payload.date,
        start_at: payload.start_at,
        end_at: payload.end_at,
        patient_id: patient.id,
        procedure: payload.procedure.unwrap_or_default(),
    };
    let id = store.insert_appointment(&fields)?;
    let appointment = get_appointment(store, id)?;

    tracing::info!(id, appointment = %appointment, "Appointment created");
    Ok(appointment)
}

/// Applies the payload to an existing appointment, re-validates the combined
/// record and writes it back.
pub fn update_appointment(
    store: &dyn SchedulingStore,
    id: i64,
    payload: AppointmentPayload,
    mode: UpdateMode,
) -> Result<Appointment, SchedulingError> {
    let mut appointment = get_appointment(store, id)?;

    let payload = match mode {
        UpdateMode::Full => {
            let complete = payload.require_complete()?;
            AppointmentPayload {
                date: Some(complete.date),
                start_at: Some(complete.start_at),
                end_at: Some(complete.end_at),
                patient: Some(complete.patient),
                procedure: complete.procedure,
            }
        }
        UpdateMode::Partial => payload,
    };

    if let Some(date) = payload.date {
        appointment.date = date;
    }
    if let Some(start_at) = payload.start_at {
        appointment.start_at = start_at;
    }
    if let Some(end_at) = payload.end_at {
        appointment.end_at = end_at;
    }
    if let Some(procedure) = payload.procedure {
        appointment.procedure = procedure;
    }

    validate_time_order(appointment.start_at, appointment.end_at)?;

    if let Some(patient) = payload.patient {
        appointment.patient = resolve_patient(store, &patient.email)?;
    }

    store
        .update_appointment(id, &appointment.fields())
        .map_err(|e| match e {
            DatabaseError::NotFound { .. } => SchedulingError::NotFound {
                entity: "Appointment",
                id,
            },
            other => other.into(),
        })?;

    tracing::info!(id, ?mode, appointment = %appointment, "Appointment updated");
    Ok(appointment)
}

pub fn delete_appointment(store: &dyn SchedulingStore, id: i64) -> Result<(), SchedulingError> {
    store.delete_appointment(id).map_err(|e| match e {
        DatabaseError::NotFound { .. } => SchedulingError::NotFound {
            entity: "Appointment",
            id,
        },
        other => other.into(),
    })?;

    tracing::info!(id, "Appointment deleted");
    Ok(())
}

// ─── Patients ─────────────────────────────────────────────────────────────────

pub fn list_patients(store: &dyn SchedulingStore) -> Result<Vec<Patient>, SchedulingError> {
    Ok(store.list_patients()?)
}

pub fn get_patient(store: &dyn SchedulingStore, id: i64) -> Result<Patient, SchedulingError> {
    store
        .get_patient(id)?
        .ok_or(SchedulingError::NotFound { entity: "Patient", id })
}

/// Registers a patient. Username must be non-blank, email must look like
/// `local@domain`, and both must be unused.
pub fn register_patient(
    store: &dyn SchedulingStore,
    new: NewPatient,
) -> Result<Patient, SchedulingError> {
    let new = NewPatient {
        username: new.username.trim().to_string(),
        email: new.email.trim().to_string(),
        first_name: new.first_name.trim().to_string(),
        last_name: new.last_name.trim().to_string(),
    };

    if new.username.is_empty() {
        return Err(SchedulingError::Validation("`username` must not be blank.".into()));
    }
    if !is_plausible_email(&new.email) {
        return Err(SchedulingError::Validation("Enter a valid email address.".into()));
    }

    let patient = store.insert_patient(&new).map_err(|e| match e {
        DatabaseError::ConstraintViolation(_) => SchedulingError::Validation(
            "A patient with this username or email already exists.".into(),
        ),
        other => other.into(),
    })?;

    tracing::info!(id = patient.id, username = %patient.username, "Patient registered");
    Ok(patient)
}

/// Removes a patient. Blocked while any appointment references it.
pub fn remove_patient(store: &dyn SchedulingStore, id: i64) -> Result<(), SchedulingError> {
    store.delete_patient(id).map_err(|e| match e {
        DatabaseError::NotFound { .. } => SchedulingError::NotFound { entity: "Patient", id },
        DatabaseError::Protected { referenced_by, .. } => SchedulingError::Protected(format!(
            "Cannot delete patient {id}: referenced by {referenced_by}."
        )),
        other => other.into(),
    })?;

    tracing::info!(id, "Patient removed");
    Ok(())
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
