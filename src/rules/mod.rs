//! Firebase Security Rules download.
//!
//! Every release of the project points at a ruleset; each ruleset's source
//! files are classified as Firestore or Storage rules by the release or file
//! name.

pub mod models;

use reqwest_middleware::ClientWithMiddleware;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::core::middleware::AuthMiddleware;
use crate::core::{authorized_client, describe_failure};
use models::{ListReleasesResponse, Release, Ruleset};


const FIREBASE_RULES_V1_URL: &str = "https://firebaserules.googleapis.com/v1";

#[derive(Error, Debug)]
pub enum RulesError {
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),
}

/// Which local rules file a ruleset source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulesTarget {
    Firestore,
    Storage,
}

impl RulesTarget {
    pub fn classify(release_name: &str, file_name: &str) -> Option<Self> {
        let release_name = release_name.to_lowercase();
        let file_name = file_name.to_lowercase();
        if release_name.contains("firestore") || file_name.contains("firestore") {
            Some(RulesTarget::Firestore)
        } else if release_name.contains("storage") || file_name.contains("storage") {
            Some(RulesTarget::Storage)
        } else {
            None
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            RulesTarget::Firestore => "firestore.rules",
            RulesTarget::Storage => "storage.rules",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesFile {
    pub target: RulesTarget,
    pub release: String,
    pub content: String,
}

pub struct FirebaseRules {
    client: ClientWithMiddleware,
    base_url: String,
    project_id: String,
}

impl FirebaseRules {
    pub fn new(middleware: AuthMiddleware, project_id: &str) -> Self {
        Self {
            client: authorized_client(middleware),
            base_url: FIREBASE_RULES_V1_URL.to_string(),
            project_id: project_id.to_string(),
        }
    }

    #[allow(dead_code)]
    pub(crate) fn new_with_client(
        client: ClientWithMiddleware,
        base_url: String,
        project_id: &str,
    ) -> Self {
        Self {
            client,
            base_url,
            project_id: project_id.to_string(),
        }
    }

    pub async fn list_releases(
        &self,
        page_token: Option<&str>,
    ) -> Result<ListReleasesResponse, RulesError> {
        let mut url = Url::parse(&format!(
            "{}/projects/{}/releases",
            self.base_url, self.project_id
        ))?;
        if let Some(token) = page_token {
            url.query_pairs_mut().append_pair("pageToken", token);
        }

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(RulesError::ApiError(
                describe_failure(response, "List releases").await,
            ));
        }

        Ok(response.json().await?)
    }

    /// Follows `nextPageToken` until every release has been listed.
    pub async fn list_all_releases(&self) -> Result<Vec<Release>, RulesError> {
        let mut releases = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_releases(page_token.as_deref()).await?;
            releases.extend(page.releases);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(releases)
    }

    /// Fetches a ruleset by its full resource name.
    pub async fn get_ruleset(&self, ruleset_name: &str) -> Result<Ruleset, RulesError> {
        let url = format!("{}/{}", self.base_url, ruleset_name);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(RulesError::ApiError(
                describe_failure(response, "Get ruleset").await,
            ));
        }

        Ok(response.json().await?)
    }

    /// Downloads the source of every released ruleset that maps to a local rules file.
    pub async fn download(&self) -> Result<Vec<RulesFile>, RulesError> {
        let mut files = Vec::new();

        for release in self.list_all_releases().await? {
            if release.ruleset_name.is_empty() {
                continue;
            }

            let ruleset = self.get_ruleset(&release.ruleset_name).await?;
            let Some(source) = ruleset.source else {
                continue;
            };

            for file in source.files {
                match RulesTarget::classify(&release.name, &file.name) {
                    Some(target) => files.push(RulesFile {
                        target,
                        release: release.name.clone(),
                        content: file.content,
                    }),
                    None => debug!(release = %release.name, file = %file.name, "skipping unrecognized rules source"),
                }
            }
        }

        Ok(files)
    }
}
