//! HTTP relay that summarises the current iteration of a work-tracking
//! service. Credentials come from the request body, the environment or a
//! config file, and the token never leaves the process.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub mod client;
pub mod config;
pub mod groups;

pub use client::{AzureDevOpsClient, UpstreamError, WorkItem, WorkTrackingApi};
pub use config::{ConfigSource, Credentials, ProxyConfigResolver, ResolvedConfig};
pub use groups::{GroupBy, ProgressGroup, aggregate_groups};

use client::{CURRENT_ITERATION_QUERY, WORK_ITEM_BATCH_SIZE, WORK_ITEM_FIELDS};
use groups::DEFAULT_COMPLETED_STATES;

pub const ACCEPT_INVALID_CERTS_ENV: &str = "AZDO_ACCEPT_INVALID_CERTS";

#[derive(Clone)]
pub struct AppState {
    api: Arc<dyn WorkTrackingApi>,
    resolver: Arc<ProxyConfigResolver>,
}

impl AppState {
    pub fn new(api: Arc<dyn WorkTrackingApi>, resolver: ProxyConfigResolver) -> Self {
        Self {
            api,
            resolver: Arc::new(resolver),
        }
    }

    /// Live client plus a resolver over the process environment.
    pub fn from_env() -> Result<Self, UpstreamError> {
        let accept_invalid_certs = std::env::var(ACCEPT_INVALID_CERTS_ENV)
            .map(|value| value.trim() == "1")
            .unwrap_or(false);
        let client = AzureDevOpsClient::new(accept_invalid_certs)?;
        Ok(Self::new(
            Arc::new(client),
            ProxyConfigResolver::from_process_env(),
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintProgressRequest {
    #[serde(default, alias = "orgUrl")]
    pub organization_url: Option<String>,
    #[serde(default, alias = "pat")]
    pub personal_access_token: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default, alias = "projectName", alias = "projectFilter")]
    pub project: Option<String>,
    #[serde(default)]
    pub group_by: Option<String>,
    #[serde(default)]
    pub completed_states: Option<Vec<String>>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl SprintProgressRequest {
    /// Body credentials win outright when either half is present.
    fn credentials(&self, default_api_version: String) -> Option<ResolvedConfig> {
        let org_url = non_empty(&self.organization_url);
        let pat = non_empty(&self.personal_access_token);
        if org_url.is_none() && pat.is_none() {
            return None;
        }
        Some(ResolvedConfig {
            org_url,
            pat,
            api_version: non_empty(&self.api_version).unwrap_or(default_api_version),
            project: non_empty(&self.project),
            source: ConfigSource::Body,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SprintProgressResponse {
    pub groups: Vec<ProgressGroup>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigSummary {
    org_url: Option<String>,
    api_version: String,
    project: Option<String>,
    source: ConfigSource,
}

impl From<&ResolvedConfig> for ConfigSummary {
    fn from(value: &ResolvedConfig) -> Self {
        Self {
            org_url: value.org_url.clone(),
            api_version: value.api_version.clone(),
            project: value.project.clone(),
            source: value.source,
        }
    }
}

const MISSING_CREDENTIALS: &str = "Missing organizationUrl or personalAccessToken. Set AZDO_ORG_URL and AZDO_PAT, create azdo.config.json, or POST { \"organizationUrl\": \"https://dev.azure.com/yourOrg\", \"personalAccessToken\": \"<pat>\" } to this endpoint.";

#[derive(Debug)]
enum ApiError {
    MissingCredentials {
        config: ConfigSummary,
        checked: Vec<String>,
    },
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingCredentials { config, checked } => {
                let body = Json(json!({
                    "error": MISSING_CREDENTIALS,
                    "config": config,
                    "checked": checked,
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::Upstream(message) => {
                let body = Json(json!({ "error": message }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

/// Sources consulted for credentials, highest priority first.
fn checked_sources(resolver: &ProxyConfigResolver) -> Vec<String> {
    let mut checked = vec!["body".to_string(), "env".to_string()];
    checked.extend(
        resolver
            .file_candidates()
            .iter()
            .map(|path| format!("file:{}", path.display())),
    );
    checked
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/azdo-config", get(azdo_config))
        .route("/api/sprint-progress", post(sprint_progress))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "sprint proxy listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn azdo_config(State(state): State<AppState>) -> impl IntoResponse {
    let resolved = state.resolver.resolve();
    Json(json!({
        "hasCredentials": resolved.has_credentials(),
        "orgUrl": resolved.org_url,
        "apiVersion": resolved.api_version,
        "project": resolved.project,
        "source": resolved.source,
    }))
}

async fn sprint_progress(
    State(state): State<AppState>,
    body: Option<Json<SprintProgressRequest>>,
) -> Result<Json<SprintProgressResponse>, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let resolved = request
        .credentials(state.resolver.default_api_version())
        .unwrap_or_else(|| state.resolver.resolve());
    let Some(credentials) = resolved.credentials() else {
        tracing::warn!(source = resolved.source.as_str(), "sprint progress requested without credentials");
        return Err(ApiError::MissingCredentials {
            config: ConfigSummary::from(&resolved),
            checked: checked_sources(&state.resolver),
        });
    };

    let project = non_empty(&request.project).or_else(|| resolved.project.clone());
    let group_by = request
        .group_by
        .as_deref()
        .map(GroupBy::from_label)
        .unwrap_or_default();
    let completed_states = request.completed_states.clone().unwrap_or_else(|| {
        DEFAULT_COMPLETED_STATES
            .iter()
            .map(|state| state.to_string())
            .collect()
    });

    let ids = state
        .api
        .query_work_item_ids(&credentials, project.as_deref(), CURRENT_ITERATION_QUERY)
        .await
        .map_err(|err| {
            tracing::error!(project = ?project, error = %err, "WIQL request failed");
            match &project {
                Some(project) => ApiError::Upstream(format!("WIQL failed for project '{project}': {err}")),
                None => ApiError::Upstream(format!("WIQL failed (no project specified): {err}")),
            }
        })?;
    if ids.is_empty() {
        return Ok(Json(SprintProgressResponse { groups: Vec::new() }));
    }

    let mut items = Vec::with_capacity(ids.len());
    for batch in ids.chunks(WORK_ITEM_BATCH_SIZE) {
        let fetched = state
            .api
            .fetch_work_items(&credentials, batch, WORK_ITEM_FIELDS)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "work item fetch failed");
                ApiError::Upstream(format!("Workitems fetch failed: {err}"))
            })?;
        items.extend(fetched);
    }

    let groups = aggregate_groups(&items, group_by, &completed_states);
    tracing::info!(items = items.len(), groups = groups.len(), source = resolved.source.as_str(), "sprint progress computed");
    Ok(Json(SprintProgressResponse { groups }))
}
