use crate::case::api::{finish_test_case, get_test_case, start_test_case};
use crate::config::AppConfig;
use crate::persistence::repo::Repository;
use crate::run::api::{finish_run, get_run, list_runs, start_run};
use crate::step::api::{append_step, log_test_case_error};
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, FromRef};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<Repository>,
}

// support extracting the repository straight from the app state
impl FromRef<AppState> for Repository {
    fn from_ref(app_state: &AppState) -> Repository {
        app_state.repository.deref().clone()
    }
}

pub async fn build_api(config: &AppConfig) -> Router {
    tracing_subscriber::fmt::init();
    let repository = Repository::from_config(config).await;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app_state = AppState {
        repository: Arc::new(repository),
    };

    Router::new()
        .route("/api/executions/runs/start", post(start_run))
        .route(
            "/api/executions/runs/:run_id/test-cases/start",
            post(start_test_case),
        )
        .route(
            "/api/executions/runs/:run_id/test-cases/:test_case_id/step",
            post(append_step),
        )
        .route(
            "/api/executions/runs/:run_id/test-cases/:test_case_id/error",
            post(log_test_case_error),
        )
        .route(
            "/api/executions/runs/:run_id/test-cases/:test_case_id/finish",
            post(finish_test_case),
        )
        .route(
            "/api/executions/runs/:run_id/test-cases/:test_case_id",
            get(get_test_case),
        )
        .route("/api/executions/runs/:run_id/finish", post(finish_run))
        .route("/api/executions/runs/:run_id", get(get_run))
        .route("/api/executions/runs", get(list_runs))
        .route("/health", get(health))
        .layer(cors)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
        .with_state(app_state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "time": crate::timefmt::format(&chrono::Utc::now()),
    }))
}

/// Validate a required request field; an absent or empty value is a 400.
pub fn required(value: Option<String>, message: &str) -> Result<String, AppError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AppError::Validation(message.to_string())),
    }
}

pub struct ApiResponse<T>(pub T);

impl<T> ApiResponse<T> {
    pub fn from(result: Result<T, AppError>) -> Result<ApiResponse<T>, AppError> {
        match result {
            Ok(t) => Ok(ApiResponse(t)),
            Err(e) => Err(e),
        }
    }
    pub fn from_option(
        result: Result<Option<T>, AppError>,
        not_found: &str,
    ) -> Result<ApiResponse<T>, AppError> {
        match result {
            Ok(t) => match t {
                None => Err(AppError::NotFound(not_found.to_string())),
                Some(val) => Ok(ApiResponse(val)),
            },
            Err(e) => Err(e),
        }
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        match serde_json::to_string(&self.0) {
            Ok(json) => Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json")
                .body(json.into())
                .unwrap(),
            Err(_) => Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Failed to serialize response".into())
                .unwrap(),
        }
    }
}

/// Same as `ApiResponse` but answers 201, for the ingestion endpoints.
pub struct ApiCreated<T>(pub T);

impl<T> ApiCreated<T> {
    pub fn from(result: Result<T, AppError>) -> Result<ApiCreated<T>, AppError> {
        match result {
            Ok(t) => Ok(ApiCreated(t)),
            Err(e) => Err(e),
        }
    }
    pub fn from_option(
        result: Result<Option<T>, AppError>,
        not_found: &str,
    ) -> Result<ApiCreated<T>, AppError> {
        match result {
            Ok(t) => match t {
                None => Err(AppError::NotFound(not_found.to_string())),
                Some(val) => Ok(ApiCreated(val)),
            },
            Err(e) => Err(e),
        }
    }
}

impl<T> IntoResponse for ApiCreated<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        match serde_json::to_string(&self.0) {
            Ok(json) => Response::builder()
                .status(StatusCode::CREATED)
                .header("Content-Type", "application/json")
                .body(json.into())
                .unwrap(),
            Err(_) => Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Failed to serialize response".into())
                .unwrap(),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Validation(String),
    Internal(String),
}

#[derive(Deserialize, Serialize, Clone)]
pub struct ErrorBody {
    pub message: String,
}

impl Into<Body> for ErrorBody {
    fn into(self) -> Body {
        Body::from(serde_json::to_string(&self).unwrap())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(message) => Response::builder()
                .status(404)
                .header("Content-Type", "application/json")
                .body(ErrorBody { message }.into())
                .unwrap(),
            AppError::Validation(message) => Response::builder()
                .status(400)
                .header("Content-Type", "application/json")
                .body(ErrorBody { message }.into())
                .unwrap(),
            AppError::Internal(message) => {
                tracing::error!("{}", message);
                Response::builder()
                    .status(500)
                    .header("Content-Type", "application/json")
                    .body(
                        ErrorBody {
                            message: "Internal server error".to_string(),
                        }
                        .into(),
                    )
                    .unwrap()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_accepts_a_present_value() {
        let value = required(Some("chrome".to_string()), "browser is required").unwrap();
        assert_eq!(value, "chrome");
    }

    #[test]
    fn required_rejects_missing_and_empty_values() {
        for value in [None, Some(String::new())] {
            match required(value, "browser is required") {
                Err(AppError::Validation(message)) => {
                    assert_eq!(message, "browser is required")
                }
                other => panic!("expected a validation error, got {:?}", other.map(|_| ())),
            }
        }
    }
}
