//! Appointment endpoints.
//!
//! - `GET    /api/appointments/`      — list (summary shape)
//! - `POST   /api/appointments/`      — create
//! - `GET    /api/appointments/:id/`  — retrieve (detail shape)
//! - `PUT    /api/appointments/:id/`  — full update
//! - `PATCH  /api/appointments/:id/`  — partial update
//! - `DELETE /api/appointments/:id/`  — delete

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{parse_id, ApiContext, AppointmentDetail, AppointmentSummary};
use crate::scheduling::{self, AppointmentPayload, UpdateMode};

const ENTITY: &str = "Appointment";

/// `GET /api/appointments/`
pub async fn list(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<AppointmentSummary>>, ApiError> {
    let appointments = scheduling::list_appointments(ctx.store.as_ref())?;
    Ok(Json(appointments.iter().map(AppointmentSummary::from).collect()))
}

/// `GET /api/appointments/:id/`
pub async fn retrieve(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<AppointmentDetail>, ApiError> {
    let id = parse_id(&id, ENTITY)?;
    let appointment = scheduling::get_appointment(ctx.store.as_ref(), id)?;
    Ok(Json(AppointmentDetail::from(&appointment)))
}

/// `POST /api/appointments/`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<AppointmentPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<AppointmentDetail>), ApiError> {
    let Json(payload) = payload?;
    let appointment = scheduling::create_appointment(ctx.store.as_ref(), payload)?;
    Ok((StatusCode::CREATED, Json(AppointmentDetail::from(&appointment))))
}

/// `PUT /api/appointments/:id/`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<AppointmentPayload>, JsonRejection>,
) -> Result<Json<AppointmentDetail>, ApiError> {
    apply_update(ctx, &id, payload, UpdateMode::Full)
}

/// `PATCH /api/appointments/:id/`
pub async fn partial_update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<AppointmentPayload>, JsonRejection>,
) -> Result<Json<AppointmentDetail>, ApiError> {
    apply_update(ctx, &id, payload, UpdateMode::Partial)
}

fn apply_update(
    ctx: ApiContext,
    raw_id: &str,
    payload: Result<Json<AppointmentPayload>, JsonRejection>,
    mode: UpdateMode,
) -> Result<Json<AppointmentDetail>, ApiError> {
    let id = parse_id(raw_id, ENTITY)?;
    let Json(payload) = payload?;
    let appointment = scheduling::update_appointment(ctx.store.as_ref(), id, payload, mode)?;
    Ok(Json(AppointmentDetail::from(&appointment)))
}

/// `DELETE /api/appointments/:id/`
pub async fn destroy(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, ENTITY)?;
    scheduling::delete_appointment(ctx.store.as_ref(), id)?;
    Ok(StatusCode::NO_CONTENT)
}
