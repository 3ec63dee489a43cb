//! Configuration for IssueMirror.
//!
//! A [`MirrorConfig`] can come from a TOML file, from the process
//! environment, or be assembled by the CLI from its flags. Tokens in a file
//! are referenced through `token_env` fields naming an environment variable;
//! the actual secrets are resolved at runtime via
//! [`MirrorConfig::resolve_env_vars`]. Whatever the source,
//! [`MirrorConfig::validate`] runs once before any network call.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;
use crate::gitlab::api_url_for_domain;

// Environment variable names shared by the env loader, the CLI flags, and
// validation messages.
pub const ENV_GITHUB_ORG: &str = "GITHUB_ORG";
pub const ENV_GITHUB_REPO: &str = "GITHUB_REPO";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_GITHUB_API_URL: &str = "GITHUB_API_URL";
pub const ENV_GITLAB_DOMAIN: &str = "GITLAB_DOMAIN";
pub const ENV_GITLAB_PROJECT: &str = "GITLAB_PROJECT";
pub const ENV_GITLAB_TOKEN: &str = "GITLAB_TOKEN";
pub const ENV_POLL_INTERVAL_SECS: &str = "POLL_INTERVAL_SECS";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration: one GitHub repository mirrored into one GitLab
/// project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Source repository and API settings.
    pub github: GitHubConfig,

    /// Destination project and API settings.
    pub gitlab: GitLabConfig,

    /// Periodic sync settings.
    #[serde(default)]
    pub daemon: DaemonConfig,
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

/// GitHub repository and API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API base URL (default `https://api.github.com`).
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Organization or user owning the repository.
    pub org: String,

    /// Repository name.
    pub repo: String,

    /// Environment variable holding the GitHub token.
    #[serde(default = "default_github_token_env")]
    pub token_env: String,

    /// Resolved token (populated by `resolve_env_vars` or set directly).
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_github_api_url() -> String {
    "https://api.github.com".into()
}
fn default_github_token_env() -> String {
    ENV_GITHUB_TOKEN.into()
}

// ---------------------------------------------------------------------------
// GitLab
// ---------------------------------------------------------------------------

/// GitLab project and API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// GitLab host (default `gitlab.com`). May carry an explicit scheme.
    #[serde(default = "default_gitlab_domain")]
    pub domain: String,

    /// Project id or `namespace/name` path.
    pub project: String,

    /// Environment variable holding the GitLab token.
    #[serde(default = "default_gitlab_token_env")]
    pub token_env: String,

    /// Resolved token (populated by `resolve_env_vars` or set directly).
    #[serde(skip)]
    pub token: Option<String>,
}

pub fn default_gitlab_domain() -> String {
    "gitlab.com".into()
}
fn default_gitlab_token_env() -> String {
    ENV_GITLAB_TOKEN.into()
}

impl GitLabConfig {
    /// The v4 API root for the configured domain.
    pub fn api_url(&self) -> String {
        api_url_for_domain(&self.domain)
    }
}

// ---------------------------------------------------------------------------
// Daemon
// ---------------------------------------------------------------------------

/// Periodic sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Seconds between sync cycles (default 7200, two hours).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_poll_interval() -> u64 {
    120 * 60
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            log_level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl MirrorConfig {
    /// Assemble a config from already-resolved values.
    pub fn new(
        github_org: impl Into<String>,
        github_repo: impl Into<String>,
        github_token: impl Into<String>,
        gitlab_domain: impl Into<String>,
        gitlab_project: impl Into<String>,
        gitlab_token: impl Into<String>,
    ) -> Self {
        Self {
            github: GitHubConfig {
                api_url: default_github_api_url(),
                org: github_org.into(),
                repo: github_repo.into(),
                token_env: default_github_token_env(),
                token: Some(github_token.into()),
            },
            gitlab: GitLabConfig {
                domain: gitlab_domain.into(),
                project: gitlab_project.into(),
                token_env: default_gitlab_token_env(),
                token: Some(gitlab_token.into()),
            },
            daemon: DaemonConfig::default(),
        }
    }

    /// Load a [`MirrorConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: MirrorConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Build a config entirely from environment variables.
    ///
    /// Missing variables become empty values so that
    /// [`validate`](Self::validate) can name the first one absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("loading configuration from environment");

        let mut config = Self::new(
            env_or_empty(ENV_GITHUB_ORG),
            env_or_empty(ENV_GITHUB_REPO),
            env_or_empty(ENV_GITHUB_TOKEN),
            std::env::var(ENV_GITLAB_DOMAIN)
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_gitlab_domain),
            env_or_empty(ENV_GITLAB_PROJECT),
            env_or_empty(ENV_GITLAB_TOKEN),
        );

        if let Ok(url) = std::env::var(ENV_GITHUB_API_URL) {
            if !url.is_empty() {
                config.github.api_url = url;
            }
        }
        if let Ok(raw) = std::env::var(ENV_POLL_INTERVAL_SECS) {
            config.daemon.poll_interval_secs =
                raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    field: "daemon.poll_interval_secs".into(),
                    detail: format!("'{raw}' is not a whole number of seconds"),
                })?;
        }
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            if !level.is_empty() {
                config.daemon.log_level = level;
            }
        }

        Ok(config)
    }

    /// Resolve the `token_env` fields from environment variables, keeping any
    /// token that was already set.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        info!("resolving environment variable references in config");

        if self.github.token.is_none() {
            self.github.token = resolve_optional_env(&self.github.token_env, "github.token_env");
        }
        if self.gitlab.token.is_none() {
            self.gitlab.token = resolve_optional_env(&self.gitlab.token_env, "gitlab.token_env");
        }

        debug!("environment variable resolution complete");
        Ok(())
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required: [(&str, &str, String); 6] = [
            ("github.org", self.github.org.as_str(), ENV_GITHUB_ORG.into()),
            ("github.repo", self.github.repo.as_str(), ENV_GITHUB_REPO.into()),
            (
                "github.token",
                self.github.token.as_deref().unwrap_or(""),
                self.github.token_env.clone(),
            ),
            ("gitlab.domain", self.gitlab.domain.as_str(), ENV_GITLAB_DOMAIN.into()),
            ("gitlab.project", self.gitlab.project.as_str(), ENV_GITLAB_PROJECT.into()),
            (
                "gitlab.token",
                self.gitlab.token.as_deref().unwrap_or(""),
                self.gitlab.token_env.clone(),
            ),
        ];
        for (field, value, env) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingValue {
                    field: field.into(),
                    env,
                });
            }
        }

        if self.github.api_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "github.api_url".into(),
                detail: "GitHub API URL must not be empty".into(),
            });
        }
        if self.daemon.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "daemon.poll_interval_secs".into(),
                detail: "poll interval must be > 0".into(),
            });
        }

        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// `org/repo` of the source repository.
    pub fn github_repo_slug(&self) -> String {
        format!("{}/{}", self.github.org, self.github.repo)
    }
}

fn env_or_empty(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
