//! Stand-alone diagnostics: project access and the Google sign-in provider.
//!
//! Neither check touches the sentinel; both only read the credentials file.

use tracing::{info, warn};

use crate::auth::project_config::{
    DefaultIdpConfigRequest, DefaultSupportedIdpConfig, IdentityPlatformConfig, GOOGLE_IDP_ID,
};
use crate::auth::{AuthError, ProjectConfig};
use crate::config::OAuthClient;
use crate::setup::backend::ProjectBackend;


const CLIENT_ID_DISPLAY_LEN: usize = 30;

/// Result of the two access checks; both always run.
#[derive(Debug)]
pub struct AccessReport {
    pub service_account: String,
    pub key_project_id: Option<String>,
    pub token: Result<(), AuthError>,
    pub admin: Result<usize, AuthError>,
}

impl AccessReport {
    pub fn passed(&self) -> bool {
        self.token.is_ok() && self.admin.is_ok()
    }
}

pub async fn verify_access<B: ProjectBackend + ?Sized>(backend: &B) -> AccessReport {
    let token = backend.verify_token().await;
    match &token {
        Ok(()) => info!("Google Auth: OK"),
        Err(e) => warn!(error = %e, "Google Auth check failed"),
    }

    let admin = backend.count_users().await;
    match &admin {
        Ok(count) => info!(users = count, "Firebase Admin SDK: OK"),
        Err(e) => warn!(error = %e, "Firebase Admin check failed"),
    }

    AccessReport {
        service_account: backend.service_account().to_string(),
        key_project_id: backend.key_project_id().map(str::to_string),
        token,
        admin,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    Enabled { client_id: Option<String> },
    Disabled { client_id: Option<String> },
    NotConfigured,
    /// The lookup itself failed with something other than "not found".
    Unknown(String),
}

impl ProviderStatus {
    pub fn from_config(config: Option<DefaultSupportedIdpConfig>) -> Self {
        match config {
            None => ProviderStatus::NotConfigured,
            Some(c) if c.is_enabled() => ProviderStatus::Enabled {
                client_id: c.client_id,
            },
            Some(c) => ProviderStatus::Disabled {
                client_id: c.client_id,
            },
        }
    }

    pub fn from_lookup(lookup: Result<Option<DefaultSupportedIdpConfig>, AuthError>) -> Self {
        match lookup {
            Ok(config) => Self::from_config(config),
            Err(e) => ProviderStatus::Unknown(e.to_string()),
        }
    }

    pub fn exists(&self) -> bool {
        matches!(
            self,
            ProviderStatus::Enabled { .. } | ProviderStatus::Disabled { .. }
        )
    }

    pub fn enabled(&self) -> bool {
        matches!(self, ProviderStatus::Enabled { .. })
    }

    pub fn client_id(&self) -> Option<&str> {
        match self {
            ProviderStatus::Enabled { client_id } | ProviderStatus::Disabled { client_id } => {
                client_id.as_deref().filter(|id| !id.is_empty())
            }
            _ => None,
        }
    }
}

/// Shortens an OAuth client id for display.
pub fn display_client_id(client_id: &str) -> String {
    if client_id.chars().count() > CLIENT_ID_DISPLAY_LEN {
        let head: String = client_id.chars().take(CLIENT_ID_DISPLAY_LEN).collect();
        format!("{}...", head)
    } else {
        client_id.to_string()
    }
}

#[derive(Debug)]
pub struct ProviderReport {
    pub identity: Option<IdentityPlatformConfig>,
    pub provider: ProviderStatus,
}

impl ProviderReport {
    pub fn passed(&self) -> bool {
        self.provider.enabled() || self.provider.exists()
    }
}

/// Read-only inspection of the sign-in configuration.
pub async fn inspect_google_provider(config: &ProjectConfig) -> Result<ProviderReport, AuthError> {
    let identity = config.get_identity_config().await?;
    if identity.is_none() {
        info!("Identity Platform not yet configured for this project");
    }
    let provider = ProviderStatus::from_lookup(config.get_default_idp_config(GOOGLE_IDP_ID).await);
    Ok(ProviderReport { identity, provider })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigureOutcome {
    AlreadyEnabled { client_id: Option<String> },
    Created,
    Updated,
    /// No OAuth client pair was available; nothing was changed.
    MissingOAuthClient { provider_exists: bool },
}

impl ConfigureOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            ConfigureOutcome::MissingOAuthClient { provider_exists } => *provider_exists,
            _ => true,
        }
    }
}

/// Enables Google sign-in.
///
/// `requested` holds values passed explicitly on the command line; `fallback`
/// holds the `GOOGLE_OAUTH_CLIENT_*` environment values. An already enabled
/// provider is left alone unless a client id was requested explicitly.
pub async fn configure_google_provider(
    config: &ProjectConfig,
    requested: &OAuthClient,
    fallback: &OAuthClient,
) -> Result<ConfigureOutcome, AuthError> {
    let current = config.get_default_idp_config(GOOGLE_IDP_ID).await?;
    let status = ProviderStatus::from_config(current);

    if status.enabled() && requested.client_id.is_none() {
        info!("Google Sign-In provider is already enabled");
        return Ok(ConfigureOutcome::AlreadyEnabled {
            client_id: status.client_id().map(str::to_string),
        });
    }

    let oauth = OAuthClient {
        client_id: requested.client_id.clone().or_else(|| fallback.client_id.clone()),
        client_secret: requested
            .client_secret
            .clone()
            .or_else(|| fallback.client_secret.clone()),
    };
    let Some((client_id, client_secret)) = oauth.complete() else {
        return Ok(ConfigureOutcome::MissingOAuthClient {
            provider_exists: status.exists(),
        });
    };

    let request = DefaultIdpConfigRequest {
        enabled: Some(true),
        client_id: Some(client_id.to_string()),
        client_secret: Some(client_secret.to_string()),
    };

    if status.exists() {
        config.update_default_idp_config(GOOGLE_IDP_ID, &request).await?;
        info!("Google Sign-In provider updated");
        Ok(ConfigureOutcome::Updated)
    } else {
        config.create_default_idp_config(GOOGLE_IDP_ID, &request).await?;
        info!("Google Sign-In provider created");
        Ok(ConfigureOutcome::Created)
    }
}
