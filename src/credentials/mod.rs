//! Service-account credential materialization.
//!
//! Inline key content (from `GOOGLE_SERVICE_ACCOUNT_JSON`) is validated and
//! written verbatim to the fixed credentials path with owner-only permissions.
//! A key file path (from `GOOGLE_APPLICATION_CREDENTIALS`) is used in place.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use yup_oauth2::ServiceAccountKey;

use crate::config::{EnvSignal, CREDENTIALS_MODE, PRIVATE_DIR_MODE};
use crate::core::fs;


const REQUIRED_FIELDS: [&str; 4] = ["type", "project_id", "private_key", "client_email"];

#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("no credentials configured: set GOOGLE_SERVICE_ACCOUNT_JSON or GOOGLE_APPLICATION_CREDENTIALS")]
    NotConfigured,
    #[error("invalid service account JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid service account JSON: missing '{0}'")]
    MissingField(&'static str),
    #[error("JSON is not a service account key (type is {0:?})")]
    NotServiceAccount(String),
    #[error("credentials file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("could not access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Written from inline secret content.
    Inline,
    /// An existing key file named by the environment.
    File,
}

#[derive(Debug, Clone)]
pub struct ResolvedCredentials {
    pub path: PathBuf,
    pub source: CredentialSource,
    pub key: ServiceAccountKey,
}

impl ResolvedCredentials {
    pub fn project_id(&self) -> Option<&str> {
        self.key.project_id.as_deref()
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }
}

/// Resolves the credential named by `env`, preferring inline content.
///
/// Inline content that fails validation is an error; it does not fall back to
/// the file path.
pub fn resolve(env: &EnvSignal, target: &Path) -> Result<ResolvedCredentials, CredentialsError> {
    if let Some(json) = env.service_account_json.as_deref() {
        info!("Found GOOGLE_SERVICE_ACCOUNT_JSON secret");
        let key = materialize(json, target)?;
        return Ok(ResolvedCredentials {
            path: target.to_path_buf(),
            source: CredentialSource::Inline,
            key,
        });
    }

    if let Some(path) = env.application_credentials.as_deref() {
        let key = load(path)?;
        info!(path = %path.display(), "Credentials file found");
        return Ok(ResolvedCredentials {
            path: path.to_path_buf(),
            source: CredentialSource::File,
            key,
        });
    }

    Err(CredentialsError::NotConfigured)
}

/// Validates inline key content and writes it byte-for-byte to `target`.
///
/// The file mode is forced to 0600 as part of the write, before any caller can
/// use the key for a network call.
pub fn materialize(json: &str, target: &Path) -> Result<ServiceAccountKey, CredentialsError> {
    let key = parse_key(json)?;

    if let Some(dir) = target.parent() {
        fs::ensure_dir(dir, PRIVATE_DIR_MODE).map_err(|source| CredentialsError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    fs::write_with_mode(target, json.as_bytes(), CREDENTIALS_MODE).map_err(|source| {
        CredentialsError::Io {
            path: target.to_path_buf(),
            source,
        }
    })?;

    info!(
        path = %target.display(),
        project_id = key.project_id.as_deref().unwrap_or_default(),
        service_account = %key.client_email,
        "Created credentials file"
    );
    Ok(key)
}

/// Reads and validates an existing key file.
pub fn load(path: &Path) -> Result<ServiceAccountKey, CredentialsError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CredentialsError::NotFound(path.to_path_buf()))
        }
        Err(source) => {
            return Err(CredentialsError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_key(&contents)
}

/// Checks that `json` looks like a service-account key and parses it.
pub fn parse_key(json: &str) -> Result<ServiceAccountKey, CredentialsError> {
    let value: Value = serde_json::from_str(json)?;

    for field in REQUIRED_FIELDS {
        if value.get(field).is_none() {
            return Err(CredentialsError::MissingField(field));
        }
    }

    match value.get("type").and_then(Value::as_str) {
        Some("service_account") => {}
        other => {
            return Err(CredentialsError::NotServiceAccount(
                other.unwrap_or_default().to_string(),
            ))
        }
    }

    let key: ServiceAccountKey = serde_json::from_value(value)?;
    debug!(client_email = %key.client_email, "Parsed service account key");
    Ok(key)
}
