//! API endpoint handlers.
//!
//! Handlers decode the request, call into `crate::scheduling`, and shape
//! the response. No business rules live here.

pub mod appointments;
pub mod health;
pub mod patients;

use crate::api::error::ApiError;

/// Fallback for unmatched routes, so clients always get the JSON error body.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("No such route".into())
}
