//! Remote side of setup and verification, behind a trait so the procedure
//! can run against a fake.

use async_trait::async_trait;
use yup_oauth2::ServiceAccountKey;

use crate::auth::project_config::{DefaultSupportedIdpConfig, GOOGLE_IDP_ID};
use crate::auth::{AuthError, FirebaseAuth, ProjectConfig};
use crate::core::middleware::AuthMiddleware;
use crate::firebase_cli::{self, CliStatus};
use crate::rules::{FirebaseRules, RulesError, RulesFile};

/// Page size of the admin probe; only reachability matters.
const ADMIN_PROBE_PAGE: u32 = 1000;

#[async_trait]
pub trait ProjectBackend: Send + Sync {
    fn service_account(&self) -> &str;

    fn key_project_id(&self) -> Option<&str>;

    /// Exchanges the key for an access token.
    async fn verify_token(&self) -> Result<(), AuthError>;

    /// Lists one page of users through the admin API.
    async fn count_users(&self) -> Result<usize, AuthError>;

    async fn download_rules(&self) -> Result<Vec<RulesFile>, RulesError>;

    async fn google_provider(&self) -> Result<Option<DefaultSupportedIdpConfig>, AuthError>;

    fn firebase_cli(&self) -> CliStatus {
        firebase_cli::check()
    }
}

/// Talks to the real Google APIs with the service-account key.
pub struct FirebaseBackend {
    middleware: AuthMiddleware,
    auth: FirebaseAuth,
    rules: FirebaseRules,
    project_config: ProjectConfig,
}

impl FirebaseBackend {
    pub fn new(key: ServiceAccountKey, project_id: &str) -> Self {
        let middleware = AuthMiddleware::new(key);
        Self {
            auth: FirebaseAuth::new(middleware.clone(), project_id),
            rules: FirebaseRules::new(middleware.clone(), project_id),
            project_config: ProjectConfig::new(middleware.clone(), project_id),
            middleware,
        }
    }

    pub fn project_config(&self) -> &ProjectConfig {
        &self.project_config
    }
}

#[async_trait]
impl ProjectBackend for FirebaseBackend {
    fn service_account(&self) -> &str {
        self.middleware.service_account_email()
    }

    fn key_project_id(&self) -> Option<&str> {
        self.middleware.key_project_id()
    }

    async fn verify_token(&self) -> Result<(), AuthError> {
        self.middleware
            .access_token()
            .await
            .map(|_| ())
            .map_err(|e| AuthError::TokenError(format!("{:#}", e)))
    }

    async fn count_users(&self) -> Result<usize, AuthError> {
        let page = self.auth.list_users(ADMIN_PROBE_PAGE, None).await?;
        Ok(page.users.len())
    }

    async fn download_rules(&self) -> Result<Vec<RulesFile>, RulesError> {
        self.rules.download().await
    }

    async fn google_provider(&self) -> Result<Option<DefaultSupportedIdpConfig>, AuthError> {
        self.project_config.get_default_idp_config(GOOGLE_IDP_ID).await
    }
}
