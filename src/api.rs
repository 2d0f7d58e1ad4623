//! HTTP trigger layer. One authenticated POST runs the pipeline once and reports
//! how it went; a GET reports which required variables are missing.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::config::{missing_env_vars, AgentConfig, ConfigError};
use crate::pipeline::{DigestJob, NewsAgent, RunOutcome};

/// Literal header some schedulers send before substituting the secret.
const TEMPLATE_AUTH: &str = "Bearer ${CRON_SECRET}";
const AGENT_SETUP_FAILED: &str = "Failed to initialize news agent";

#[derive(Clone)]
pub struct AppState {
    job: Result<Arc<dyn DigestJob>, String>,
    cron_secret: Option<String>,
    dev_mode: bool,
}

impl AppState {
    pub fn new(job: Arc<dyn DigestJob>, cron_secret: Option<String>) -> Self {
        Self {
            job: Ok(job),
            cron_secret,
            dev_mode: false,
        }
    }

    /// State whose job could not be built; triggers answer 500 with `reason`.
    pub fn misconfigured(reason: impl Into<String>, cron_secret: Option<String>) -> Self {
        Self {
            job: Err(reason.into()),
            cron_secret,
            dev_mode: false,
        }
    }

    pub fn with_dev_mode(mut self, on: bool) -> Self {
        self.dev_mode = on;
        self
    }

    /// Build the production agent from the environment. Configuration problems do not
    /// stop the server; they are reported on every trigger instead.
    pub fn from_env() -> Self {
        Self::from_config(AgentConfig::from_env())
    }

    pub fn from_config(cfg: Result<AgentConfig, ConfigError>) -> Self {
        match cfg {
            Ok(cfg) => {
                let state = match NewsAgent::from_config(&cfg) {
                    Ok(agent) => Self::new(Arc::new(agent), cfg.cron_secret.clone()),
                    Err(e) => {
                        tracing::error!(target: "api", error = %format!("{e:#}"), "news agent setup failed");
                        Self::misconfigured(AGENT_SETUP_FAILED, cfg.cron_secret.clone())
                    }
                };
                state.with_dev_mode(cfg.dev_mode)
            }
            Err(e) => {
                tracing::error!(target: "api", error = %e, "configuration incomplete");
                let secret = std::env::var("CRON_SECRET").ok().filter(|s| !s.is_empty());
                let dev = std::env::var("APP_ENV").is_ok_and(|v| v.eq_ignore_ascii_case("development"));
                Self::misconfigured(e.to_string(), secret).with_dev_mode(dev)
            }
        }
    }

    /// The configured job, when it could be built.
    pub fn job(&self) -> Option<Arc<dyn DigestJob>> {
        self.job.as_ref().ok().cloned()
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(header) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
            tracing::info!(target: "api", "authorization header is missing");
            return false;
        };
        if self.dev_mode && header == TEMPLATE_AUTH {
            tracing::info!(target: "api", "development mode, accepting template authorization");
            return true;
        }
        let ok = self
            .cron_secret
            .as_deref()
            .is_some_and(|secret| header == format!("Bearer {secret}"));
        if !ok {
            tracing::info!(target: "api", "invalid authorization token provided");
        }
        ok
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/cron", get(method_not_allowed).post(cron))
        .route("/api/news", get(method_not_allowed).post(news))
        .route("/api/test", get(env_report))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn cron(State(state): State<AppState>, headers: HeaderMap) -> Response {
    trigger(&state, &headers, true).await
}

async fn news(State(state): State<AppState>, headers: HeaderMap) -> Response {
    trigger(&state, &headers, false).await
}

async fn trigger(state: &AppState, headers: &HeaderMap, with_details: bool) -> Response {
    tracing::info!(target: "api", "digest run triggered");
    if !state.authorized(headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response();
    }
    let job = match &state.job {
        Ok(job) => job,
        Err(reason) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": reason })),
            )
                .into_response()
        }
    };

    match job.run().await {
        Ok(outcome) => {
            let mut body = json!({
                "message": "News processing completed successfully",
                "distributed": outcome.distributed(),
            });
            if let RunOutcome::Empty { stage, .. } = outcome {
                body["skipped"] = json!(stage.as_str());
            }
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(failure) => {
            tracing::error!(
                target: "api",
                error = %failure.error,
                notified = failure.notified,
                "digest run failed"
            );
            let body = if with_details {
                json!({
                    "error": "Internal server error",
                    "details": failure.error.summary(),
                })
            } else {
                json!({ "error": "Internal server error" })
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
        .into_response()
}

async fn env_report() -> Response {
    let missing = missing_env_vars();
    if !missing.is_empty() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "error",
                "message": "Missing required environment variables",
                "missingVars": missing,
            })),
        )
            .into_response();
    }
    Json(json!({
        "status": "success",
        "message": "All required environment variables are set",
        "env": {
            "app_env": std::env::var("APP_ENV").ok(),
            "shuttle_env": std::env::var("SHUTTLE_ENV").ok(),
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
    .into_response()
}
