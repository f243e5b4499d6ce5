use serde::{Deserialize, Serialize};

/// Identity provider id of Google sign-in.
pub const GOOGLE_IDP_ID: &str = "google.com";

/// A built-in ("default supported") identity provider such as Google sign-in.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DefaultSupportedIdpConfig {
    /// Format: "projects/{project-id}/defaultSupportedIdpConfigs/{idp-id}"
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    pub client_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl DefaultSupportedIdpConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }
}

/// Body for creating or updating a default supported provider.
#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DefaultIdpConfigRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl DefaultIdpConfigRequest {
    pub(crate) fn update_mask(&self) -> String {
        let mut mask_parts = Vec::new();
        if self.enabled.is_some() { mask_parts.push("enabled"); }
        if self.client_id.is_some() { mask_parts.push("clientId"); }
        if self.client_secret.is_some() { mask_parts.push("clientSecret"); }
        mask_parts.join(",")
    }
}

/// Project-wide Identity Platform configuration (only the parts we report).
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPlatformConfig {
    pub name: Option<String>,
    pub sign_in: Option<SignInConfig>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SignInConfig {
    pub email: Option<ToggleConfig>,
    pub anonymous: Option<ToggleConfig>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToggleConfig {
    #[serde(default)]
    pub enabled: bool,
}

impl SignInConfig {
    pub fn email_enabled(&self) -> bool {
        self.email.as_ref().map(|t| t.enabled).unwrap_or(false)
    }

    pub fn anonymous_enabled(&self) -> bool {
        self.anonymous.as_ref().map(|t| t.enabled).unwrap_or(false)
    }
}
