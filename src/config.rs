//! Command-line and environment configuration.
//!
//! Every flag can also be given through the environment variable named in
//! its `env` attribute.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::build::TeamCityConfig;
use crate::orchestrator::{
    DEFAULT_LGTM_THRESHOLD, DEFAULT_STATUS_CONTEXT, OrchestratorConfig, WaitConfig,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the bot username must not be empty")]
    EmptyUsername,

    #[error("the LGTM threshold must be at least 1")]
    ZeroThreshold,

    #[error("--teamcity-server is set but {0} is missing")]
    IncompleteTeamCity(&'static str),
}

#[derive(Clone, Parser)]
#[command(
    name = "merge-gate",
    version,
    about = "Squash-merges pull requests on command once the build is green"
)]
pub struct Config {
    /// Address the webhook server listens on.
    #[arg(long, env = "MERGE_GATE_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Shared secret configured on the GitHub webhook.
    #[arg(long, env = "MERGE_GATE_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: String,

    /// Token of the bot's GitHub account.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: String,

    /// The bot's login. Commands are comments addressed to `@<username>`.
    #[arg(long, env = "MERGE_GATE_USERNAME")]
    pub username: String,

    /// Logins allowed to issue commands on every repository.
    #[arg(long, env = "MERGE_GATE_ALLOW", value_delimiter = ',')]
    pub allow: Vec<String>,

    /// SQLite database holding recorded approvals.
    #[arg(long, env = "MERGE_GATE_DB", default_value = "merge-gate.db")]
    pub db: PathBuf,

    /// `Name (login) <email>` lines used when a GitHub profile has no email.
    #[arg(long, env = "MERGE_GATE_AUTHORS_FILE")]
    pub authors_file: Option<PathBuf>,

    /// Parent directory of the working copies, laid out as `<owner>/<repo>`.
    #[arg(long, env = "MERGE_GATE_WORKDIR", default_value = "repos")]
    pub workdir: PathBuf,

    #[arg(long, env = "MERGE_GATE_LGTM_THRESHOLD", default_value_t = DEFAULT_LGTM_THRESHOLD)]
    pub lgtm_threshold: usize,

    /// Context of the commit statuses the bot posts.
    #[arg(long, env = "MERGE_GATE_STATUS_CONTEXT", default_value = DEFAULT_STATUS_CONTEXT)]
    pub status_context: String,

    /// Mirror every open PR to a `pr-<n>` branch on origin.
    #[arg(long, env = "MERGE_GATE_MANAGE_PR_BRANCHES")]
    pub manage_pr_branches: bool,

    /// TeamCity host name. Rebuilds are disabled without it.
    #[arg(long, env = "TEAMCITY_SERVER")]
    pub teamcity_server: Option<String>,

    #[arg(long, env = "TEAMCITY_USER")]
    pub teamcity_user: Option<String>,

    #[arg(long, env = "TEAMCITY_PASSWORD", hide_env_values = true)]
    pub teamcity_password: Option<String>,

    /// Build configuration ids queued by a rebuild.
    #[arg(long, env = "TEAMCITY_BUILD_IDS", value_delimiter = ',')]
    pub teamcity_build_ids: Vec<String>,
}

impl Config {
    /// Checks the values clap can't.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::EmptyUsername);
        }
        if self.lgtm_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        self.teamcity().map(|_| ())
    }

    /// The build trigger settings, or `None` when no server is configured.
    pub fn teamcity(&self) -> Result<Option<TeamCityConfig>, ConfigError> {
        let Some(server) = &self.teamcity_server else {
            return Ok(None);
        };
        let user = self
            .teamcity_user
            .clone()
            .ok_or(ConfigError::IncompleteTeamCity("--teamcity-user"))?;
        let password = self
            .teamcity_password
            .clone()
            .ok_or(ConfigError::IncompleteTeamCity("--teamcity-password"))?;
        let build_ids: Vec<String> = self
            .teamcity_build_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        if build_ids.is_empty() {
            return Err(ConfigError::IncompleteTeamCity("--teamcity-build-ids"));
        }
        Ok(Some(TeamCityConfig {
            server: server.clone(),
            user,
            password,
            build_ids,
        }))
    }

    /// Always-allowed logins, blanks removed.
    pub fn always_allowed(&self) -> Vec<String> {
        self.allow
            .iter()
            .map(|login| login.trim().to_string())
            .filter(|login| !login.is_empty())
            .collect()
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            username: self.username.clone(),
            lgtm_threshold: self.lgtm_threshold,
            status_context: self.status_context.clone(),
            authors_file: self.authors_file.clone(),
            manage_pr_branches: self.manage_pr_branches,
            wait: WaitConfig::from_env(),
        }
    }
}
