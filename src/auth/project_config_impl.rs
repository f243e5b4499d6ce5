//! Project-level sign-in configuration (Identity Platform admin API).

use reqwest_middleware::ClientWithMiddleware;
use tracing::debug;
use url::Url;

use crate::auth::project_config::{
    DefaultIdpConfigRequest, DefaultSupportedIdpConfig, IdentityPlatformConfig,
};
use crate::auth::{is_not_found, AuthError};
use crate::core::authorized_client;
use crate::core::middleware::{
    AuthMiddleware, CLOUD_PLATFORM_SCOPE, FIREBASE_SCOPE, IDENTITY_TOOLKIT_SCOPE,
};

const IDENTITY_TOOLKIT_ADMIN_URL: &str = "https://identitytoolkit.googleapis.com/admin/v2";

/// Reads and changes a project's sign-in providers.
#[derive(Clone)]
pub struct ProjectConfig {
    client: ClientWithMiddleware,
    base_url: String,
}

impl ProjectConfig {
    pub fn new(middleware: AuthMiddleware, project_id: &str) -> Self {
        let middleware = AuthMiddleware::with_scopes(
            middleware.key,
            &[CLOUD_PLATFORM_SCOPE, FIREBASE_SCOPE, IDENTITY_TOOLKIT_SCOPE],
        );
        let client = authorized_client(middleware);
        let base_url = format!("{}/projects/{}", IDENTITY_TOOLKIT_ADMIN_URL, project_id);
        Self { client, base_url }
    }

    #[allow(dead_code)]
    pub(crate) fn new_with_client(client: ClientWithMiddleware, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// Fetches the Identity Platform config; `None` when the project has none yet.
    pub async fn get_identity_config(&self) -> Result<Option<IdentityPlatformConfig>, AuthError> {
        let url = format!("{}/config", self.base_url);
        let response = self.client.get(&url).send().await?;

        if is_not_found(response.status()) {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AuthError::from_response(response, "Get Identity config").await);
        }

        Ok(Some(response.json().await?))
    }

    /// Fetches a default supported provider; `None` when it was never configured.
    pub async fn get_default_idp_config(
        &self,
        idp_id: &str,
    ) -> Result<Option<DefaultSupportedIdpConfig>, AuthError> {
        let url = format!("{}/defaultSupportedIdpConfigs/{}", self.base_url, idp_id);
        let response = self.client.get(&url).send().await?;

        if is_not_found(response.status()) {
            debug!(idp_id, "provider not configured");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AuthError::from_response(response, "Get provider config").await);
        }

        Ok(Some(response.json().await?))
    }

    pub async fn create_default_idp_config(
        &self,
        idp_id: &str,
        request: &DefaultIdpConfigRequest,
    ) -> Result<DefaultSupportedIdpConfig, AuthError> {
        let mut url = Url::parse(&format!("{}/defaultSupportedIdpConfigs", self.base_url))?;
        url.query_pairs_mut().append_pair("idpId", idp_id);

        let response = self.client.post(url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(AuthError::from_response(response, "Create provider config").await);
        }

        Ok(response.json().await?)
    }

    pub async fn update_default_idp_config(
        &self,
        idp_id: &str,
        request: &DefaultIdpConfigRequest,
    ) -> Result<DefaultSupportedIdpConfig, AuthError> {
        let mut url = Url::parse(&format!(
            "{}/defaultSupportedIdpConfigs/{}",
            self.base_url, idp_id
        ))?;
        url.query_pairs_mut()
            .append_pair("updateMask", &request.update_mask());

        let response = self.client.patch(url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(AuthError::from_response(response, "Update provider config").await);
        }

        Ok(response.json().await?)
    }
}
