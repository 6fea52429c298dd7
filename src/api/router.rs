//! Scheduling API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`, and every resource path answers both
//! with and without the trailing slash.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::db::SchedulingStore;

/// Build the scheduling API router over the given store.
pub fn scheduling_router(store: Arc<dyn SchedulingStore>) -> Router {
    build_router(ApiContext::new(store))
}

fn build_router(ctx: ApiContext) -> Router {
    use endpoints::{appointments, patients};

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/appointments",
            get(appointments::list).post(appointments::create),
        )
        .route(
            "/appointments/",
            get(appointments::list).post(appointments::create),
        )
        .route(
            "/appointments/:id",
            get(appointments::retrieve)
                .put(appointments::update)
                .patch(appointments::partial_update)
                .delete(appointments::destroy),
        )
        .route(
            "/appointments/:id/",
            get(appointments::retrieve)
                .put(appointments::update)
                .patch(appointments::partial_update)
                .delete(appointments::destroy),
        )
        .route("/patients", get(patients::list).post(patients::create))
        .route("/patients/", get(patients::list).post(patients::create))
        .route(
            "/patients/:id",
            get(patients::retrieve).delete(patients::destroy),
        )
        .route(
            "/patients/:id/",
            get(patients::retrieve).delete(patients::destroy),
        )
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .fallback(endpoints::not_found)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{Days, Local, NaiveDate, NaiveTime};
    use tower::ServiceExt;

    use crate::db::{AppointmentStore, PatientDirectory, SqliteStore};
    use crate::models::{AppointmentFields, NewPatient};

    /// One patient (john snow) and one appointment today, 10:00–12:00.
    fn seeded_store() -> (Arc<SqliteStore>, i64) {
        let store = SqliteStore::open_in_memory().unwrap();
        let patient = store
            .insert_patient(&NewPatient {
                username: "john".into(),
                email: "john@snow.com".into(),
                first_name: "john".into(),
                last_name: "snow".into(),
            })
            .unwrap();
        let id = store
            .insert_appointment(&AppointmentFields {
                date: today(),
                start_at: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                end_at: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
                patient_id: patient.id,
                procedure: String::new(),
            })
            .unwrap();
        (Arc::new(store), id)
    }

    fn app(store: &Arc<SqliteStore>) -> Router {
        scheduling_router(store.clone())
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    fn days_from_today(days: u64) -> String {
        (today() + Days::new(days)).to_string()
    }

    fn make_request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn response_json(response: axum::http::Response<Body>) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 65536)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn assert_john(json: &serde_json::Value) {
        assert_eq!(json["patient"]["email"], "john@snow.com");
        assert_eq!(json["patient"]["full_name"], "john snow");
    }

    // ── Appointments ─────────────────────────────────────────────

    #[tokio::test]
    async fn list_appointments() {
        let (store, id) = seeded_store();
        let response = app(&store)
            .oneshot(make_request("GET", "/api/appointments/", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], id);
        assert_eq!(items[0]["date"], today().to_string());
        assert_eq!(items[0]["start_at"], "10:00:00");
        assert_eq!(items[0]["end_at"], "12:00:00");
        assert!(items[0].get("procedure").is_none());
        assert_john(&items[0]);
    }

    #[tokio::test]
    async fn list_accepts_path_without_trailing_slash() {
        let (store, _) = seeded_store();
        let response = app(&store)
            .oneshot(make_request("GET", "/api/appointments", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn retrieve_appointment() {
        let (store, id) = seeded_store();
        let response = app(&store)
            .oneshot(make_request("GET", &format!("/api/appointments/{id}/"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["start_at"], "10:00:00");
        assert_eq!(json["procedure"], "");
        assert_john(&json);
    }

    #[tokio::test]
    async fn retrieve_unknown_appointment_returns_404() {
        let (store, _) = seeded_store();
        let response = app(&store)
            .oneshot(make_request("GET", "/api/appointments/999/", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn retrieve_non_numeric_id_returns_404() {
        let (store, _) = seeded_store();
        let response = app(&store)
            .oneshot(make_request("GET", "/api/appointments/abc/", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_appointment() {
        let (store, _) = seeded_store();
        let date = days_from_today(1);
        let body = serde_json::json!({
            "date": date,
            "start_at": "12:00:00",
            "end_at": "13:00:00",
            "patient": { "email": "john@snow.com" }
        });
        let response = app(&store)
            .oneshot(make_request("POST", "/api/appointments/", Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = response_json(response).await;
        assert_eq!(json["date"], date);
        assert_eq!(json["start_at"], "12:00:00");
        assert_eq!(json["end_at"], "13:00:00");
        assert_john(&json);
        assert_eq!(store.list_appointments().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn post_appointment_with_procedure() {
        let (store, _) = seeded_store();
        let body = serde_json::json!({
            "date": days_from_today(1),
            "start_at": "12:00:00",
            "end_at": "13:00:00",
            "patient": { "email": "john@snow.com" },
            "procedure": "Do this and that and so on"
        });
        let response = app(&store)
            .oneshot(make_request("POST", "/api/appointments/", Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = response_json(response).await;
        assert_eq!(json["procedure"], "Do this and that and so on");
        let id = json["id"].as_i64().unwrap();
        let stored = store.get_appointment(id).unwrap().unwrap();
        assert_eq!(stored.procedure, "Do this and that and so on");
    }

    #[tokio::test]
    async fn post_appointment_start_at_greater_than_end_at() {
        let (store, _) = seeded_store();
        let body = serde_json::json!({
            "date": days_from_today(1),
            "start_at": "13:00:00",
            "end_at": "12:00:00",
            "patient": { "email": "john@snow.com" }
        });
        let response = app(&store)
            .oneshot(make_request("POST", "/api/appointments/", Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(store.list_appointments().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn post_appointment_unknown_patient() {
        let (store, _) = seeded_store();
        let body = serde_json::json!({
            "date": days_from_today(1),
            "start_at": "12:00:00",
            "end_at": "13:00:00",
            "patient": { "email": "ghost@nowhere.com" }
        });
        let response = app(&store)
            .oneshot(make_request("POST", "/api/appointments/", Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"]["message"], "Patient not found.");
    }

    #[tokio::test]
    async fn post_appointment_missing_fields() {
        let (store, _) = seeded_store();
        let body = serde_json::json!({ "start_at": "12:00:00" });
        let response = app(&store)
            .oneshot(make_request("POST", "/api/appointments/", Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn post_appointment_malformed_json() {
        let (store, _) = seeded_store();
        let req = Request::builder()
            .method("POST")
            .uri("/api/appointments/")
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"date": "not-a-date""#))
            .unwrap();
        let response = app(&store).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn post_appointment_invalid_time_format() {
        let (store, _) = seeded_store();
        let body = serde_json::json!({
            "date": days_from_today(1),
            "start_at": "noon",
            "end_at": "13:00:00",
            "patient": { "email": "john@snow.com" }
        });
        let response = app(&store)
            .oneshot(make_request("POST", "/api/appointments/", Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn put_appointment() {
        let (store, id) = seeded_store();
        let date = days_from_today(2);
        let body = serde_json::json!({
            "date": date,
            "start_at": "10:00:00",
            "end_at": "12:00:00",
            "patient": { "email": "john@snow.com" },
            "procedure": "Do this and bla bla bla"
        });
        let response = app(&store)
            .oneshot(make_request("PUT", &format!("/api/appointments/{id}/"), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["date"], date);
        assert_eq!(json["procedure"], "Do this and bla bla bla");
        assert_john(&json);
    }

    #[tokio::test]
    async fn put_appointment_requires_full_payload() {
        let (store, id) = seeded_store();
        let body = serde_json::json!({ "date": days_from_today(2) });
        let response = app(&store)
            .oneshot(make_request("PUT", &format!("/api/appointments/{id}/"), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn put_unknown_appointment_returns_404() {
        let (store, _) = seeded_store();
        let body = serde_json::json!({
            "date": days_from_today(2),
            "start_at": "10:00:00",
            "end_at": "12:00:00",
            "patient": { "email": "john@snow.com" }
        });
        let response = app(&store)
            .oneshot(make_request("PUT", "/api/appointments/999/", Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patch_appointment_date() {
        let (store, id) = seeded_store();
        let date = days_from_today(10);
        let body = serde_json::json!({ "date": date });
        let response = app(&store)
            .oneshot(make_request("PATCH", &format!("/api/appointments/{id}/"), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["date"], date);
        assert_eq!(json["start_at"], "10:00:00");
        assert_eq!(json["end_at"], "12:00:00");
        assert_john(&json);
    }

    #[tokio::test]
    async fn patch_appointment_start_at_past_end_is_rejected() {
        let (store, id) = seeded_store();
        let body = serde_json::json!({ "start_at": "13:00:00" });
        let response = app(&store)
            .oneshot(make_request("PATCH", &format!("/api/appointments/{id}/"), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn patch_appointment_end_at() {
        let (store, id) = seeded_store();
        let body = serde_json::json!({ "end_at": "18:00:00" });
        let response = app(&store)
            .oneshot(make_request("PATCH", &format!("/api/appointments/{id}/"), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["start_at"], "10:00:00");
        assert_eq!(json["end_at"], "18:00:00");
    }

    #[tokio::test]
    async fn patch_appointment_procedure() {
        let (store, id) = seeded_store();
        let body = serde_json::json!({ "procedure": "Something" });
        let response = app(&store)
            .oneshot(make_request("PATCH", &format!("/api/appointments/{id}/"), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["procedure"], "Something");
        assert_eq!(json["date"], today().to_string());
        assert_eq!(json["start_at"], "10:00:00");
        assert_eq!(json["end_at"], "12:00:00");
        assert_john(&json);
    }

    #[tokio::test]
    async fn patch_appointment_patient() {
        let (store, id) = seeded_store();
        store
            .insert_patient(&NewPatient {
                username: "peter".into(),
                email: "peter@gunn.com".into(),
                first_name: String::new(),
                last_name: String::new(),
            })
            .unwrap();

        let body = serde_json::json!({ "patient": { "email": "peter@gunn.com" } });
        let response = app(&store)
            .oneshot(make_request("PATCH", &format!("/api/appointments/{id}/"), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["patient"]["email"], "peter@gunn.com");
    }

    #[tokio::test]
    async fn patch_appointment_null_patient_is_rejected() {
        let (store, id) = seeded_store();
        let body = serde_json::json!({ "patient": null });
        let response = app(&store)
            .oneshot(make_request("PATCH", &format!("/api/appointments/{id}/"), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let appt = store.get_appointment(id).unwrap().unwrap();
        assert_eq!(appt.patient.email, "john@snow.com");
    }

    #[tokio::test]
    async fn put_appointment_null_procedure_is_rejected() {
        let (store, id) = seeded_store();
        let body = serde_json::json!({
            "date": days_from_today(2),
            "start_at": "10:00:00",
            "end_at": "12:00:00",
            "patient": { "email": "john@snow.com" },
            "procedure": null
        });
        let response = app(&store)
            .oneshot(make_request("PUT", &format!("/api/appointments/{id}/"), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn delete_appointment() {
        let (store, id) = seeded_store();
        let uri = format!("/api/appointments/{id}/");

        let response = app(&store)
            .oneshot(make_request("DELETE", &uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());

        let response = app(&store)
            .oneshot(make_request("DELETE", &uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // ── Patients ─────────────────────────────────────────────────

    #[tokio::test]
    async fn register_and_list_patients() {
        let (store, _) = seeded_store();
        let body = serde_json::json!({
            "username": "peter",
            "email": "peter@gunn.com",
            "first_name": "Peter",
            "last_name": "Gunn"
        });
        let response = app(&store)
            .oneshot(make_request("POST", "/api/patients/", Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = response_json(response).await;
        assert_eq!(created["full_name"], "Peter Gunn");

        let response = app(&store)
            .oneshot(make_request("GET", "/api/patients/", None))
            .await
            .unwrap();
        let json = response_json(response).await;
        let emails: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["email"].as_str().unwrap())
            .collect();
        assert_eq!(emails, vec!["john@snow.com", "peter@gunn.com"]);
    }

    #[tokio::test]
    async fn register_duplicate_patient_returns_400() {
        let (store, _) = seeded_store();
        let body = serde_json::json!({ "username": "jon", "email": "john@snow.com" });
        let response = app(&store)
            .oneshot(make_request("POST", "/api/patients/", Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_patient_with_appointments_returns_409() {
        let (store, appointment_id) = seeded_store();
        let patient = store.find_patient_by_email("john@snow.com").unwrap().unwrap();
        let uri = format!("/api/patients/{}/", patient.id);

        let response = app(&store)
            .oneshot(make_request("DELETE", &uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(store.get_patient(patient.id).unwrap().is_some());

        store.delete_appointment(appointment_id).unwrap();
        let response = app(&store)
            .oneshot(make_request("DELETE", &uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app(&store)
            .oneshot(make_request("GET", &uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // ── Misc ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn health_reports_version() {
        let (store, _) = seeded_store();
        let response = app(&store)
            .oneshot(make_request("GET", "/api/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = response_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], crate::config::APP_VERSION);
    }

    #[tokio::test]
    async fn unknown_route_returns_json_404() {
        let (store, _) = seeded_store();
        let response = app(&store)
            .oneshot(make_request("GET", "/api/nonexistent", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }
}
