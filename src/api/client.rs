//! HTTP client for the report API
//!
//! Talks JSON to the report service: one report document per id, updated in
//! place by save-progress requests and frozen by the submit request.

use super::traits::ReportApi;
use crate::config::WizardConfig;
use crate::state::{ReportData, SavePayload};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Header carrying a per-request id for correlating client and server logs
const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error("Report API request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Error bodies carry either `message` or `error`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn error_message(status: StatusCode, body: &str) -> String {
    let from_body = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty());
    if let Some(message) = from_body {
        return message;
    }
    match status {
        StatusCode::UNAUTHORIZED => "Your session has expired, sign in again".to_string(),
        StatusCode::TOO_MANY_REQUESTS => "Too many requests, try again shortly".to_string(),
        _ => format!("Request failed with status {status}"),
    }
}

/// Client for one report on the report API
#[derive(Debug, Clone)]
pub struct ReportClient {
    http: Client,
    base_url: String,
    report_id: String,
    token: Option<String>,
}

impl ReportClient {
    pub fn new(config: &WizardConfig, report_id: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_url().to_string(),
            report_id: report_id.into(),
            token: config.api_token.clone(),
        })
    }

    fn report_url(&self) -> String {
        format!("{}/api/reports/{}", self.base_url, self.report_id)
    }

    fn submit_url(&self) -> String {
        format!("{}/submit", self.report_url())
    }

    fn prepare(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        tracing::warn!(%status, error = %message, "report API returned an error");
        Err(ApiError::Status { status, message })
    }
}

#[async_trait]
impl ReportApi for ReportClient {
    async fn fetch_report(&self) -> Result<Option<ReportData>> {
        tracing::debug!(report_id = %self.report_id, "fetching report");
        let response = self
            .prepare(self.http.get(self.report_url()))
            .send()
            .await
            .map_err(ApiError::from)?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!(report_id = %self.report_id, "report does not exist yet");
            return Ok(None);
        }

        let report = Self::check(response)
            .await?
            .json::<ReportData>()
            .await
            .map_err(ApiError::from)?;
        Ok(Some(report))
    }

    async fn save_progress(&self, payload: SavePayload) -> Result<()> {
        tracing::debug!(report_id = %self.report_id, fields = payload.len(), "saving progress");
        let response = self
            .prepare(self.http.put(self.report_url()))
            .json(&payload)
            .send()
            .await
            .map_err(ApiError::from)?;
        Self::check(response).await?;
        Ok(())
    }

    async fn submit_report(&self, payload: SavePayload) -> Result<()> {
        tracing::info!(report_id = %self.report_id, "submitting report");
        let response = self
            .prepare(self.http.post(self.submit_url()))
            .json(&payload)
            .send()
            .await
            .map_err(ApiError::from)?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FieldValue;
    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tokio::{net::TcpListener, sync::Mutex};

    #[derive(Debug, Clone)]
    struct Recorded {
        path: String,
        authorization: Option<String>,
        request_id: Option<String>,
        body: Value,
    }

    #[derive(Clone, Default)]
    struct ServerState {
        requests: Arc<Mutex<Vec<Recorded>>>,
    }

    impl ServerState {
        async fn record(&self, path: String, headers: &HeaderMap, body: Value) {
            let header = |name: &str| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            self.requests.lock().await.push(Recorded {
                path,
                authorization: header("authorization"),
                request_id: header(REQUEST_ID_HEADER),
                body,
            });
        }
    }

    async fn get_report(Path(id): Path<String>) -> Response {
        match id.as_str() {
            "r1" => Json(json!({
                "id": "r1",
                "company_name": "Acme Ltd",
                "is_submitted": false,
                "sc_p4_essential_indicators": {"stakeholder_groups": {"value": "Investors"}}
            }))
            .into_response(),
            _ => (StatusCode::NOT_FOUND, Json(json!({"message": "Report not found"}))).into_response(),
        }
    }

    async fn put_report(
        State(state): State<ServerState>,
        Path(id): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Response {
        state.record(format!("/api/reports/{id}"), &headers, body).await;
        match id.as_str() {
            "fail" => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"message": "Database unavailable"})),
            )
                .into_response(),
            "locked" => StatusCode::UNAUTHORIZED.into_response(),
            _ => Json(json!({"success": true})).into_response(),
        }
    }

    async fn submit_report(
        State(state): State<ServerState>,
        Path(id): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> StatusCode {
        state
            .record(format!("/api/reports/{id}/submit"), &headers, body)
            .await;
        StatusCode::OK
    }

    async fn spawn_report_server() -> (String, ServerState) {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = ServerState::default();
        let app = Router::new()
            .route("/api/reports/:id", get(get_report).put(put_report))
            .route("/api/reports/:id/submit", post(submit_report))
            .with_state(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}"), state)
    }

    fn client(url: &str, report_id: &str, token: Option<&str>) -> ReportClient {
        let config = WizardConfig {
            api_url: Some(url.to_string()),
            api_token: token.map(str::to_string),
            ..Default::default()
        };
        ReportClient::new(&config, report_id).unwrap()
    }

    fn payload() -> SavePayload {
        let mut payload = SavePayload::new();
        payload.insert("sc_p4_essential_indicators".to_string(), FieldValue::empty_group());
        payload
    }

    mod messages {
        use super::*;

        #[test]
        fn test_message_from_body() {
            let msg = error_message(StatusCode::BAD_REQUEST, r#"{"message": "Invalid CIN"}"#);
            assert_eq!(msg, "Invalid CIN");
        }

        #[test]
        fn test_error_field_from_body() {
            let msg = error_message(StatusCode::BAD_REQUEST, r#"{"error": "Bad payload"}"#);
            assert_eq!(msg, "Bad payload");
        }

        #[test]
        fn test_fallback_by_status() {
            assert_eq!(
                error_message(StatusCode::UNAUTHORIZED, ""),
                "Your session has expired, sign in again"
            );
            assert_eq!(
                error_message(StatusCode::TOO_MANY_REQUESTS, "<html>"),
                "Too many requests, try again shortly"
            );
            assert_eq!(
                error_message(StatusCode::BAD_GATEWAY, r#"{"message": " "}"#),
                "Request failed with status 502 Bad Gateway"
            );
        }

        #[test]
        fn test_urls() {
            let client = client("http://localhost:5000/", "r1", None);
            assert_eq!(client.report_url(), "http://localhost:5000/api/reports/r1");
            assert_eq!(client.submit_url(), "http://localhost:5000/api/reports/r1/submit");
        }
    }

    #[tokio::test]
    async fn test_fetch_report() {
        let (url, _state) = spawn_report_server().await;
        let report = client(&url, "r1", None).fetch_report().await.unwrap().unwrap();
        assert_eq!(report.id, "r1");
        assert_eq!(report.company_name.as_deref(), Some("Acme Ltd"));
        assert!(report.fields.contains_key("sc_p4_essential_indicators"));
    }

    #[tokio::test]
    async fn test_fetch_missing_report_is_none() {
        let (url, _state) = spawn_report_server().await;
        let report = client(&url, "missing", None).fetch_report().await.unwrap();
        assert!(report.is_none());
    }

    #[tokio::test]
    async fn test_save_progress_sends_payload_and_headers() {
        let (url, state) = spawn_report_server().await;
        client(&url, "r1", Some("secret"))
            .save_progress(payload())
            .await
            .unwrap();

        let requests = state.requests.lock().await;
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.path, "/api/reports/r1");
        assert_eq!(request.authorization.as_deref(), Some("Bearer secret"));
        let request_id = request.request_id.as_deref().unwrap();
        assert!(Uuid::parse_str(request_id).is_ok());
        assert_eq!(request.body, json!({"sc_p4_essential_indicators": {}}));
    }

    #[tokio::test]
    async fn test_save_without_token_sends_no_authorization() {
        let (url, state) = spawn_report_server().await;
        client(&url, "r1", None).save_progress(payload()).await.unwrap();
        assert!(state.requests.lock().await[0].authorization.is_none());
    }

    #[tokio::test]
    async fn test_save_error_uses_server_message() {
        let (url, _state) = spawn_report_server().await;
        let err = client(&url, "fail", None)
            .save_progress(payload())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Database unavailable");
        let api_err = err.downcast_ref::<ApiError>().unwrap();
        assert!(matches!(
            api_err,
            ApiError::Status { status, .. } if *status == StatusCode::INTERNAL_SERVER_ERROR
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_save() {
        let (url, _state) = spawn_report_server().await;
        let err = client(&url, "locked", None)
            .save_progress(payload())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Your session has expired, sign in again");
    }

    #[tokio::test]
    async fn test_submit_posts_to_submit_route() {
        let (url, state) = spawn_report_server().await;
        client(&url, "r1", None).submit_report(payload()).await.unwrap();
        let requests = state.requests.lock().await;
        assert_eq!(requests[0].path, "/api/reports/r1/submit");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Nothing listens on port 9 locally
        let err = client("http://127.0.0.1:9", "r1", None)
            .fetch_report()
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::Transport(_))
        ));
    }
}
