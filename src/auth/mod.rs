pub mod models;
pub mod project_config;
pub mod project_config_impl;

use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use thiserror::Error;
use url::Url;

use crate::auth::models::ListUsersResponse;
use crate::core::middleware::AuthMiddleware;
use crate::core::{authorized_client, describe_failure};

pub use project_config_impl::ProjectConfig;

#[cfg(test)]
mod tests;

const IDENTITY_TOOLKIT_V1_URL: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Token exchange failed: {0}")]
    TokenError(String),
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),
}

impl AuthError {
    pub(crate) async fn from_response(response: reqwest::Response, op: &str) -> Self {
        AuthError::ApiError(describe_failure(response, op).await)
    }
}

/// Admin access to a project's Firebase Auth user accounts.
#[derive(Clone)]
pub struct FirebaseAuth {
    client: ClientWithMiddleware,
    base_url: String,
}

impl FirebaseAuth {
    pub fn new(middleware: AuthMiddleware, project_id: &str) -> Self {
        let client = authorized_client(middleware);
        let base_url = format!("{}/projects/{}", IDENTITY_TOOLKIT_V1_URL, project_id);
        Self { client, base_url }
    }

    #[allow(dead_code)]
    pub(crate) fn new_with_client(client: ClientWithMiddleware, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Lists one page of user accounts.
    pub async fn list_users(
        &self,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<ListUsersResponse, AuthError> {
        let mut url = Url::parse(&format!("{}/accounts:batchGet", self.base_url))?;
        {
            let mut query_pairs = url.query_pairs_mut();
            query_pairs.append_pair("maxResults", &max_results.to_string());
            if let Some(token) = page_token {
                query_pairs.append_pair("nextPageToken", token);
            }
        }

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AuthError::from_response(response, "List users").await);
        }

        let result: ListUsersResponse = response.json().await?;
        Ok(result)
    }
}

pub(crate) fn is_not_found(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND
}
