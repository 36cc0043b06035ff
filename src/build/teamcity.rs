//! TeamCity build queue client.

use reqwest::StatusCode;
use thiserror::Error;
use tracing::{info, warn};

use super::BuildTrigger;
use crate::types::PrNumber;

/// Connection details for a TeamCity server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamCityConfig {
    /// Host name, without scheme.
    pub server: String,
    pub user: String,
    pub password: String,
    /// Build configuration ids to queue.
    pub build_ids: Vec<String>,
}

#[derive(Debug, Error)]
pub enum BuildTriggerError {
    #[error("request to build server failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("build server rejected {build_id}: {status}")]
    Rejected { build_id: String, status: StatusCode },
}

/// The request body that queues `build_id` on `pull/<n>`.
pub fn build_request_xml(pr: PrNumber, build_id: &str) -> String {
    format!(
        "<build branchName=\"pull/{}\">\n\t<buildType id=\"{}\"/>\n\t<comment><text>Triggered by mergebot</text></comment>\n</build>",
        pr.0, build_id
    )
}

#[derive(Debug, Clone)]
pub struct TeamCityTrigger {
    http: reqwest::Client,
    base_url: String,
    config: TeamCityConfig,
}

impl TeamCityTrigger {
    pub fn new(config: TeamCityConfig) -> Self {
        let base_url = format!("https://{}", config.server);
        Self {
            http: reqwest::Client::new(),
            base_url,
            config,
        }
    }

    /// Talk to `base_url` (scheme included) instead of `https://<server>`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn queue_url(&self) -> String {
        format!("{}/httpAuth/app/rest/buildQueue", self.base_url)
    }

    async fn queue_build(&self, pr: PrNumber, build_id: &str) -> Result<(), BuildTriggerError> {
        let response = self
            .http
            .post(self.queue_url())
            .basic_auth(&self.config.user, Some(&self.config.password))
            .header(reqwest::header::CONTENT_TYPE, "application/xml")
            .body(build_request_xml(pr, build_id))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(BuildTriggerError::Rejected {
                build_id: build_id.to_string(),
                status,
            });
        }
        Ok(())
    }
}

impl BuildTrigger for TeamCityTrigger {
    type Error = BuildTriggerError;

    async fn trigger(&self, pr: PrNumber) -> Result<(), Self::Error> {
        let mut first_error = None;
        for build_id in &self.config.build_ids {
            match self.queue_build(pr, build_id).await {
                Ok(()) => info!(pr = %pr, build_id = %build_id, "queued build"),
                Err(e) => {
                    warn!(pr = %pr, build_id = %build_id, error = %e, "failed to queue build");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
