//! Shared types for the API layer: router state and response shapes.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::db::SchedulingStore;
use crate::models::{Appointment, Patient};

// ═══════════════════════════════════════════════════════════
// API context — shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn SchedulingStore>,
}

impl ApiContext {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }
}

// ═══════════════════════════════════════════════════════════
// Response shapes
// ═══════════════════════════════════════════════════════════

/// Patient as embedded in an appointment.
#[derive(Debug, Clone, Serialize)]
pub struct PatientSummary {
    pub email: String,
    pub full_name: String,
}

impl From<&Patient> for PatientSummary {
    fn from(patient: &Patient) -> Self {
        Self {
            email: patient.email.clone(),
            full_name: patient.full_name(),
        }
    }
}

/// List shape: no `procedure`.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentSummary {
    pub id: i64,
    pub date: NaiveDate,
    pub start_at: NaiveTime,
    pub end_at: NaiveTime,
    pub patient: PatientSummary,
}

impl From<&Appointment> for AppointmentSummary {
    fn from(appt: &Appointment) -> Self {
        Self {
            id: appt.id,
            date: appt.date,
            start_at: appt.start_at,
            end_at: appt.end_at,
            patient: PatientSummary::from(&appt.patient),
        }
    }
}

/// Detail shape returned by retrieve and by every write.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentDetail {
    #[serde(flatten)]
    pub summary: AppointmentSummary,
    pub procedure: String,
}

impl From<&Appointment> for AppointmentDetail {
    fn from(appt: &Appointment) -> Self {
        Self {
            summary: AppointmentSummary::from(appt),
            procedure: appt.procedure.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
}

impl From<&Patient> for PatientResponse {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            username: patient.username.clone(),
            email: patient.email.clone(),
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            full_name: patient.full_name(),
        }
    }
}

/// Parse a path id. Anything that is not an integer names no record.
pub fn parse_id(raw: &str, entity: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::NotFound(format!("{entity} not found")))
}
