use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;

use crate::director::Director;
use crate::output::AuditEntry;

/// HTTP-layer error, mapped to a JSON body with the matching status code.
#[derive(Debug)]
pub enum HttpServerError {
    StatePoisoned,
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::StatePoisoned => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "director state lock poisoned",
            ),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<crate::error::DirectorError> for HttpServerError {
    fn from(_: crate::error::DirectorError) -> Self {
        HttpServerError::StatePoisoned
    }
}

#[derive(Debug, Serialize)]
pub struct CalibrateResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub applied: bool,
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub entries: Vec<AuditEntry>,
}

pub fn build_router(director: Arc<Director>) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/calibrate/:mic_id", post(calibrate))
        .route("/api/apply/:mic_id", post(apply))
        .route("/api/audit", get(audit))
        .with_state(director)
}

async fn status(
    State(director): State<Arc<Director>>,
) -> Result<impl IntoResponse, HttpServerError> {
    Ok(Json(director.status()?))
}

async fn calibrate(
    State(director): State<Arc<Director>>,
    Path(mic_id): Path<String>,
) -> Result<impl IntoResponse, HttpServerError> {
    director.start_calibration(&mic_id)?;
    Ok(Json(CalibrateResponse { ok: true }))
}

async fn apply(
    State(director): State<Arc<Director>>,
    Path(mic_id): Path<String>,
) -> Result<impl IntoResponse, HttpServerError> {
    let applied = director.apply_calibration(&mic_id)?;
    Ok(Json(ApplyResponse { applied }))
}

async fn audit(State(director): State<Arc<Director>>) -> impl IntoResponse {
    Json(AuditResponse {
        entries: director.audit_log(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::LevelIntake;
    use crate::config::AppConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn make_router() -> Router {
        let director = Arc::new(Director::new(
            AppConfig::default(),
            None,
            Arc::new(LevelIntake::new()),
        ));
        build_router(director)
    }

    async fn response_json(response: Response) -> (StatusCode, serde_json::Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn status_returns_wide_on_fresh_director() {
        let (status_code, json) = response_json(
            make_router()
                .oneshot(
                    Request::builder()
                        .uri("/api/status")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(status_code, StatusCode::OK);
        assert_eq!(json["state"], "WIDE");
    }

    #[tokio::test]
    async fn calibrate_then_apply_without_result_is_not_applied() {
        let router = make_router();

        let (status_code, json) = response_json(
            router
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/calibrate/m1")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(status_code, StatusCode::OK);
        assert_eq!(json["ok"], true);

        let (status_code, json) = response_json(
            router
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/apply/m1")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(status_code, StatusCode::OK);
        assert_eq!(json["applied"], false);
    }

    #[tokio::test]
    async fn audit_starts_empty() {
        let (status_code, json) = response_json(
            make_router()
                .oneshot(
                    Request::builder()
                        .uri("/api/audit")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(status_code, StatusCode::OK);
        assert!(json["entries"].as_array().unwrap().is_empty());
    }
}
