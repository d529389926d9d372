use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_API_VERSION: &str = "6.0";
pub const CONFIG_FILE_NAME: &str = "azdo.config.json";
pub const CONFIG_PATH_ENV: &str = "AZDO_CONFIG_PATH";

const ENV_ORG_URL: &[&str] = &["VITE_AZDO_ORG_URL", "AZDO_ORG_URL", "AZDO_ORGURL", "AZDO_ORG"];
const ENV_PAT: &[&str] = &["VITE_AZDO_PAT", "AZDO_PAT", "AZDO_PERSONAL_ACCESS_TOKEN"];
const ENV_API_VERSION: &[&str] = &["VITE_AZDO_API_VERSION", "AZDO_API_VERSION"];
const ENV_PROJECT: &[&str] = &["AZDO_PROJECT", "VITE_AZDO_PROJECT"];

const FILE_ORG_URL: &[&str] = &["organizationUrl", "orgUrl", "AZDO_ORG_URL", "VITE_AZDO_ORG_URL"];
const FILE_PAT: &[&str] = &["personalAccessToken", "pat", "AZDO_PAT", "VITE_AZDO_PAT"];
const FILE_API_VERSION: &[&str] = &["apiVersion", "AZDO_API_VERSION"];
const FILE_PROJECT: &[&str] = &["project", "projectName", "projectKey", "projectFilter"];

/// Where the effective credentials came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigSource {
    Body,
    Env,
    File,
    EnvPartial,
    FilePartial,
    None,
}

impl ConfigSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::Body => "body",
            ConfigSource::Env => "env",
            ConfigSource::File => "file",
            ConfigSource::EnvPartial => "env-partial",
            ConfigSource::FilePartial => "file-partial",
            ConfigSource::None => "none",
        }
    }
}

/// Connection settings for the work-tracking service. The token is never
/// serialised.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    pub org_url: Option<String>,
    #[serde(skip)]
    pub pat: Option<String>,
    pub api_version: String,
    pub project: Option<String>,
    pub source: ConfigSource,
}

impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("org_url", &self.org_url)
            .field("pat", &self.pat.as_ref().map(|_| "<redacted>"))
            .field("api_version", &self.api_version)
            .field("project", &self.project)
            .field("source", &self.source)
            .finish()
    }
}

impl ResolvedConfig {
    pub fn has_credentials(&self) -> bool {
        self.org_url.is_some() && self.pat.is_some()
    }

    pub fn credentials(&self) -> Option<Credentials> {
        Some(Credentials {
            org_url: self.org_url.clone()?,
            pat: self.pat.clone()?,
            api_version: self.api_version.clone(),
        })
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub org_url: String,
    pub pat: String,
    pub api_version: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("org_url", &self.org_url)
            .field("pat", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[derive(Debug, Default)]
struct PartialConfig {
    org_url: Option<String>,
    pat: Option<String>,
    api_version: Option<String>,
    project: Option<String>,
}

impl PartialConfig {
    fn complete(&self) -> bool {
        self.org_url.is_some() && self.pat.is_some()
    }

    fn any_credential(&self) -> bool {
        self.org_url.is_some() || self.pat.is_some()
    }
}

/// Resolves credentials from an environment snapshot, then from the first
/// readable `azdo.config.json` among the candidate paths.
#[derive(Debug, Clone)]
pub struct ProxyConfigResolver {
    env: HashMap<String, String>,
    file_candidates: Vec<PathBuf>,
}

impl ProxyConfigResolver {
    pub fn new(env: HashMap<String, String>, file_candidates: Vec<PathBuf>) -> Self {
        Self {
            env,
            file_candidates,
        }
    }

    /// Snapshot of the process environment; config files are looked up at
    /// `$AZDO_CONFIG_PATH`, then in the working directory and its `server/`.
    pub fn from_process_env() -> Self {
        let env: HashMap<String, String> = std::env::vars().collect();
        let mut candidates = Vec::new();
        if let Some(path) = env.get(CONFIG_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            candidates.push(PathBuf::from(path));
        }
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(CONFIG_FILE_NAME));
            candidates.push(cwd.join("server").join(CONFIG_FILE_NAME));
        }
        Self::new(env, candidates)
    }

    pub fn file_candidates(&self) -> &[PathBuf] {
        &self.file_candidates
    }

    pub fn default_api_version(&self) -> String {
        self.env_value(ENV_API_VERSION)
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string())
    }

    fn env_value(&self, names: &[&str]) -> Option<String> {
        names
            .iter()
            .filter_map(|name| self.env.get(*name))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn from_env(&self) -> PartialConfig {
        PartialConfig {
            org_url: self.env_value(ENV_ORG_URL),
            pat: self.env_value(ENV_PAT),
            api_version: self.env_value(ENV_API_VERSION),
            project: self.env_value(ENV_PROJECT),
        }
    }

    fn from_file(&self) -> Option<PartialConfig> {
        for path in &self.file_candidates {
            if !path.is_file() {
                continue;
            }
            let parsed = fs::read_to_string(path)
                .map_err(|err| err.to_string())
                .and_then(|raw| serde_json::from_str::<Value>(&raw).map_err(|err| err.to_string()));
            match parsed {
                Ok(json) => {
                    tracing::info!(path = %path.display(), "loaded work-tracking config file");
                    return Some(PartialConfig {
                        org_url: json_string(&json, FILE_ORG_URL),
                        pat: json_string(&json, FILE_PAT),
                        api_version: json_string(&json, FILE_API_VERSION),
                        project: json_string(&json, FILE_PROJECT),
                    });
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "failed to read work-tracking config file");
                }
            }
        }
        tracing::info!(
            checked = ?self.file_candidates,
            "no {CONFIG_FILE_NAME} found"
        );
        None
    }

    /// Environment first, then config file. When neither is complete the
    /// parts are merged, environment values winning.
    pub fn resolve(&self) -> ResolvedConfig {
        let default_version = self.default_api_version();
        let env = self.from_env();
        if env.complete() {
            tracing::debug!("using work-tracking credentials from environment");
            return ResolvedConfig {
                org_url: env.org_url,
                pat: env.pat,
                api_version: env.api_version.unwrap_or(default_version),
                project: env.project,
                source: ConfigSource::Env,
            };
        }

        let file = self.from_file();
        if let Some(file) = file.as_ref().filter(|f| f.complete()) {
            return ResolvedConfig {
                org_url: file.org_url.clone(),
                pat: file.pat.clone(),
                api_version: file.api_version.clone().unwrap_or(default_version),
                project: file.project.clone(),
                source: ConfigSource::File,
            };
        }

        tracing::warn!(
            "missing work-tracking credentials; set AZDO_ORG_URL and AZDO_PAT or create {CONFIG_FILE_NAME}"
        );
        let file = file.unwrap_or_default();
        let source = if env.any_credential() {
            ConfigSource::EnvPartial
        } else if file.any_credential() {
            ConfigSource::FilePartial
        } else {
            ConfigSource::None
        };
        ResolvedConfig {
            org_url: env.org_url.or(file.org_url),
            pat: env.pat.or(file.pat),
            api_version: env
                .api_version
                .or(file.api_version)
                .unwrap_or(default_version),
            project: env.project.or(file.project),
            source,
        }
    }
}

fn json_string(json: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| json.get(*name))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
