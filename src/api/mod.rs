//! Scheduling REST API.
//!
//! Exposes appointment and patient operations as HTTP endpoints under
//! `/api/`, with an access-logging middleware in front of every route.
//!
//! The router is composable — `scheduling_router()` returns a `Router`
//! that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::scheduling_router;
pub use server::{start_api_server, ApiServer, ApiSession, ServerError};
pub use types::ApiContext;
