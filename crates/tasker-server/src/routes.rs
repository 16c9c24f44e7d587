//! Task routes.
//!
//! | Method | Path          | Handler       |
//! |--------|---------------|---------------|
//! | GET    | `/tasks`      | list          |
//! | POST   | `/tasks`      | create        |
//! | GET    | `/tasks/{id}` | fetch one     |
//! | PUT    | `/tasks/{id}` | partial update|
//! | DELETE | `/tasks/{id}` | delete        |
//!
//! Any other method on these paths is 405; any other path is 404.

use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use serde_json::Value;
use tasker_core::{Task, TaskId, validate_create, validate_update};
use tracing::{debug, info};

use crate::errors::ApiError;
use crate::server::AppState;

/// Routes for the task collection, before state is attached.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/tasks",
            get(list_tasks)
                .post(create_task)
                .fallback(method_not_allowed),
        )
        .route(
            "/tasks/{id}",
            get(get_task)
                .put(update_task)
                .delete(delete_task)
                .fallback(method_not_allowed),
        )
        .fallback(route_not_found)
}

/// GET /tasks
async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state.store.list().await?;
    debug!(count = tasks.len(), "listed tasks");
    Ok(Json(tasks))
}

/// GET /tasks/{id}
async fn get_task(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = task_id(id)?;
    Ok(Json(state.store.get(id).await?))
}

/// POST /tasks
async fn create_task(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let new_task = validate_create(&parse_body(body)?)?;
    let task = state.store.insert(new_task).await?;
    info!(task_id = %task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /tasks/{id}
async fn update_task(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = task_id(id)?;
    let patch = validate_update(&parse_body(body)?)?;
    let task = state.store.update(id, patch).await?;
    info!(task_id = %task.id, "task updated");
    Ok(Json(task))
}

/// DELETE /tasks/{id}
async fn delete_task(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = task_id(id)?;
    state.store.delete(id).await?;
    info!(task_id = %id, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}

fn task_id(raw: Result<Path<String>, PathRejection>) -> Result<TaskId, ApiError> {
    let Path(raw) = raw.map_err(|_| ApiError::InvalidId)?;
    raw.parse().map_err(|_| ApiError::InvalidId)
}

/// An unreadable body is reported like an unparseable one, except for the
/// size limit which gets its own status.
fn parse_body(body: Result<Bytes, BytesRejection>) -> Result<Value, ApiError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::InvalidJson
        }
    })?;
    serde_json::from_slice(&body).map_err(|_| ApiError::InvalidJson)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::json;
    use tasker_store::json_file::JsonFileStore;
    use tower::ServiceExt;

    struct Harness {
        app: Router,
        _dir: tempfile::TempDir,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let store = JsonFileStore::open(dir.path().join("tasks.json"));
            let app = router().with_state(AppState {
                store: Arc::new(store),
            });
            Self { app, _dir: dir }
        }

        async fn send(&self, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
            let mut req = Request::builder().method(method).uri(uri);
            if body.is_some() {
                req = req.header("content-type", "application/json");
            }
            let req = req
                .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
                .unwrap();
            let resp = self.app.clone().oneshot(req).await.unwrap();
            let status = resp.status();
            let bytes = axum::body::to_bytes(resp.into_body(), 100_000)
                .await
                .unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn create(&self, body: &str) -> (StatusCode, Value) {
            self.send(Method::POST, "/tasks", Some(body)).await
        }
    }

    #[tokio::test]
    async fn empty_store_lists_empty_array() {
        let h = Harness::new();
        let (status, body) = h.send(Method::GET, "/tasks", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn create_returns_201_with_assigned_id() {
        let h = Harness::new();
        let (status, body) = h.create(r#"{"title":"Test Task"}"#).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"id": 1, "title": "Test Task", "completed": false}));
    }

    #[tokio::test]
    async fn create_then_list_and_fetch() {
        let h = Harness::new();
        let _ = h.create(r#"{"title":"one"}"#).await;
        let _ = h.create(r#"{"title":"two","completed":true}"#).await;

        let (_, list) = h.send(Method::GET, "/tasks", None).await;
        let ids: Vec<_> = list.as_array().unwrap().iter().map(|t| t["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(2)]);

        let (status, task) = h.send(Method::GET, "/tasks/2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(task["title"], "two");
        assert_eq!(task["completed"], true);
    }

    #[tokio::test]
    async fn duplicate_title_is_rejected() {
        let h = Harness::new();
        let _ = h.create(r#"{"title":"Duplicate"}"#).await;
        let (status, body) = h.create(r#"{"title":"duplicate"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Task title must be unique"}));
    }

    #[tokio::test]
    async fn create_validation_failures() {
        let h = Harness::new();
        let cases = [
            ("{}", "Task must have a valid, non-empty title"),
            (r#"{"title":""}"#, "Task must have a valid, non-empty title"),
            (r#"{"title":42}"#, "Task must have a valid, non-empty title"),
            (r#"{"title":"x","completed":"yes"}"#, "Task completed must be a boolean"),
            (r#"[1,2]"#, "Task payload must be a JSON object"),
        ];
        for (payload, message) in cases {
            let (status, body) = h.create(payload).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
            assert_eq!(body["error"], message, "payload {payload}");
        }
    }

    #[tokio::test]
    async fn overlong_title_is_rejected() {
        let h = Harness::new();
        let payload = json!({"title": "a".repeat(101)}).to_string();
        let (status, body) = h.create(&payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Task title must be 100 characters or fewer");
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_json() {
        let h = Harness::new();
        let (status, body) = h.create("{ invalid json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid JSON"}));
    }

    #[tokio::test]
    async fn update_merges_supplied_fields() {
        let h = Harness::new();
        let _ = h.create(r#"{"title":"Original"}"#).await;

        let (status, body) = h
            .send(Method::PUT, "/tasks/1", Some(r#"{"completed":true}"#))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"id": 1, "title": "Original", "completed": true}));

        let (_, body) = h
            .send(Method::PUT, "/tasks/1", Some(r#"{"title":"Renamed"}"#))
            .await;
        assert_eq!(body, json!({"id": 1, "title": "Renamed", "completed": true}));
    }

    #[tokio::test]
    async fn update_missing_task_is_404() {
        let h = Harness::new();
        let (status, body) = h
            .send(Method::PUT, "/tasks/999", Some(r#"{"completed":true}"#))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Task not found"}));
    }

    #[tokio::test]
    async fn update_checks_id_before_body() {
        let h = Harness::new();
        let (status, body) = h.send(Method::PUT, "/tasks/abc", Some("{ nope")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid task ID");
    }

    #[tokio::test]
    async fn update_rejects_invalid_fields() {
        let h = Harness::new();
        let _ = h.create(r#"{"title":"keep"}"#).await;
        let (status, body) = h
            .send(Method::PUT, "/tasks/1", Some(r#"{"title":"  "}"#))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Task title must be a non-empty string");
    }

    #[tokio::test]
    async fn rename_onto_taken_title_is_rejected() {
        let h = Harness::new();
        let _ = h.create(r#"{"title":"first"}"#).await;
        let _ = h.create(r#"{"title":"second"}"#).await;
        let (status, body) = h
            .send(Method::PUT, "/tasks/2", Some(r#"{"title":"FIRST"}"#))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Task title must be unique");
    }

    #[tokio::test]
    async fn invalid_ids_are_rejected_before_store() {
        let h = Harness::new();
        let _ = h.create(r#"{"title":"untouched"}"#).await;
        for raw in ["abc", "-1", "0", "1.5", "%40%21", "1e3", "+1"] {
            for (method, body) in [
                (Method::GET, None),
                (Method::PUT, Some(r#"{"completed":true}"#)),
                (Method::DELETE, None),
            ] {
                let (status, resp) = h
                    .send(method.clone(), &format!("/tasks/{raw}"), body)
                    .await;
                assert_eq!(status, StatusCode::BAD_REQUEST, "{method} id {raw}");
                assert_eq!(resp, json!({"error": "Invalid task ID"}), "{method} id {raw}");
            }
        }
        let (_, list) = h.send(Method::GET, "/tasks", None).await;
        assert_eq!(list[0]["completed"], false);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn oversized_body_is_json_413() {
        let h = Harness::new();
        let padding = "x".repeat(3 * 1024 * 1024);
        let body = format!(r#"{{"title":"big","note":"{padding}"}}"#);
        for (method, uri) in [(Method::POST, "/tasks"), (Method::PUT, "/tasks/1")] {
            let (status, resp) = h.send(method.clone(), uri, Some(&body)).await;
            assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "{method} {uri}");
            assert_eq!(resp, json!({"error": "Request body too large"}));
        }
        let (_, list) = h.send(Method::GET, "/tasks", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn delete_then_fetch_is_404() {
        let h = Harness::new();
        let _ = h.create(r#"{"title":"short-lived"}"#).await;

        let (status, body) = h.send(Method::DELETE, "/tasks/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, body) = h.send(Method::GET, "/tasks/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Task not found"}));

        let (status, _) = h.send(Method::DELETE, "/tasks/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unsupported_method_is_405() {
        let h = Harness::new();
        for (method, uri) in [
            (Method::PATCH, "/tasks"),
            (Method::DELETE, "/tasks"),
            (Method::POST, "/tasks/1"),
            (Method::PATCH, "/tasks/1"),
        ] {
            let (status, body) = h.send(method.clone(), uri, None).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
            assert_eq!(body, json!({"error": "Method not allowed"}));
        }
    }

    #[tokio::test]
    async fn unknown_paths_are_404() {
        let h = Harness::new();
        for uri in ["/", "/unknown", "/task", "/tasks/1/extra"] {
            let (status, body) = h.send(Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "uri {uri}");
            assert_eq!(body, json!({"error": "Not found"}), "uri {uri}");
        }
    }
}
