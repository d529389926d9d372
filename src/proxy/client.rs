use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

use super::config::Credentials;

pub const CURRENT_ITERATION_QUERY: &str =
    "SELECT [System.Id] FROM WorkItems WHERE [System.IterationPath] = @CurrentIteration";

pub const WORK_ITEM_FIELDS: &[&str] = &[
    "System.Id",
    "System.Title",
    "System.State",
    "System.AreaPath",
    "System.TeamProject",
    "Microsoft.VSTS.Scheduling.StoryPoints",
];

/// Upper bound on ids per work-item fetch.
pub const WORK_ITEM_BATCH_SIZE: usize = 200;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{status} {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid organization url '{0}'")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(value: reqwest::Error) -> Self {
        UpstreamError::Transport(value.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorkItem {
    pub id: i64,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl WorkItem {
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// The two upstream calls the relay makes.
#[async_trait]
pub trait WorkTrackingApi: Send + Sync {
    async fn query_work_item_ids(
        &self,
        credentials: &Credentials,
        project: Option<&str>,
        query: &str,
    ) -> Result<Vec<i64>, UpstreamError>;

    async fn fetch_work_items(
        &self,
        credentials: &Credentials,
        ids: &[i64],
        fields: &[&str],
    ) -> Result<Vec<WorkItem>, UpstreamError>;
}

#[derive(Debug, Deserialize)]
struct WiqlResponse {
    #[serde(default, rename = "workItems")]
    work_items: Vec<WorkItemRef>,
}

#[derive(Debug, Deserialize)]
struct WorkItemRef {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct WorkItemsResponse {
    #[serde(default)]
    value: Vec<WorkItem>,
}

/// Azure DevOps REST client authenticating with a personal access token.
#[derive(Debug, Clone)]
pub struct AzureDevOpsClient {
    http: reqwest::Client,
}

impl AzureDevOpsClient {
    pub fn new(accept_invalid_certs: bool) -> Result<Self, UpstreamError> {
        if accept_invalid_certs {
            tracing::warn!("TLS certificate verification disabled for upstream requests");
        }
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self { http })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

pub fn basic_auth_header(pat: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!(":{pat}")))
}

/// Appends `segments` to the organization url and sets `api-version`.
pub fn endpoint(
    org_url: &str,
    segments: &[&str],
    query: &[(&str, &str)],
) -> Result<Url, UpstreamError> {
    let mut url = Url::parse(org_url.trim())
        .map_err(|_| UpstreamError::InvalidUrl(org_url.to_string()))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| UpstreamError::InvalidUrl(org_url.to_string()))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

async fn read_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, UpstreamError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl WorkTrackingApi for AzureDevOpsClient {
    async fn query_work_item_ids(
        &self,
        credentials: &Credentials,
        project: Option<&str>,
        query: &str,
    ) -> Result<Vec<i64>, UpstreamError> {
        let mut segments: Vec<&str> = Vec::with_capacity(4);
        if let Some(project) = project {
            segments.push(project);
        }
        segments.extend(["_apis", "wit", "wiql"]);
        let url = endpoint(
            &credentials.org_url,
            &segments,
            &[("api-version", credentials.api_version.as_str())],
        )?;
        tracing::debug!(%url, "running WIQL query");
        let response = self
            .http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, basic_auth_header(&credentials.pat))
            .json(&json!({ "query": query }))
            .send()
            .await?;
        let wiql: WiqlResponse = read_json(response).await?;
        Ok(wiql.work_items.into_iter().map(|item| item.id).collect())
    }

    async fn fetch_work_items(
        &self,
        credentials: &Credentials,
        ids: &[i64],
        fields: &[&str],
    ) -> Result<Vec<WorkItem>, UpstreamError> {
        let ids = ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let fields = fields.join(",");
        let url = endpoint(
            &credentials.org_url,
            &["_apis", "wit", "workitems"],
            &[
                ("ids", ids.as_str()),
                ("fields", fields.as_str()),
                ("api-version", credentials.api_version.as_str()),
            ],
        )?;
        let response = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, basic_auth_header(&credentials.pat))
            .send()
            .await?;
        let items: WorkItemsResponse = read_json(response).await?;
        Ok(items.value)
    }
}
