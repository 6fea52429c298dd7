//! Patient endpoints.
//!
//! - `GET    /api/patients/`      — list
//! - `POST   /api/patients/`      — register
//! - `GET    /api/patients/:id/`  — retrieve
//! - `DELETE /api/patients/:id/`  — remove (409 while appointments exist)

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext, PatientResponse};
use crate::models::NewPatient;
use crate::scheduling;

const ENTITY: &str = "Patient";

/// `GET /api/patients/`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<PatientResponse>>, ApiError> {
    let patients = scheduling::list_patients(ctx.store.as_ref())?;
    Ok(Json(patients.iter().map(PatientResponse::from).collect()))
}

/// `GET /api/patients/:id/`
pub async fn retrieve(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<PatientResponse>, ApiError> {
    let id = parse_id(&id, ENTITY)?;
    let patient = scheduling::get_patient(ctx.store.as_ref(), id)?;
    Ok(Json(PatientResponse::from(&patient)))
}

/// `POST /api/patients/`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<NewPatient>, JsonRejection>,
) -> Result<(StatusCode, Json<PatientResponse>), ApiError> {
    let Json(new) = payload?;
    let patient = scheduling::register_patient(ctx.store.as_ref(), new)?;
    Ok((StatusCode::CREATED, Json(PatientResponse::from(&patient))))
}

/// `DELETE /api/patients/:id/`
pub async fn destroy(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, ENTITY)?;
    scheduling::remove_patient(ctx.store.as_ref(), id)?;
    Ok(StatusCode::NO_CONTENT)
}
