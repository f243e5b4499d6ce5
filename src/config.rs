//! Fixed locations and environment inputs shared by every command.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROJECT_ID: &str = "digital-workshop-hub";

pub const SERVICE_ACCOUNT_JSON_VAR: &str = "GOOGLE_SERVICE_ACCOUNT_JSON";
pub const APPLICATION_CREDENTIALS_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const OAUTH_CLIENT_ID_VAR: &str = "GOOGLE_OAUTH_CLIENT_ID";
pub const OAUTH_CLIENT_SECRET_VAR: &str = "GOOGLE_OAUTH_CLIENT_SECRET";

/// Owner read/write only. The guard compares against this with strict equality.
pub const CREDENTIALS_MODE: u32 = 0o600;
pub const PRIVATE_DIR_MODE: u32 = 0o700;

/// Filesystem layout, rooted at a home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub sentinel_file: PathBuf,
    pub credentials_file: PathBuf,
    pub project_dir: PathBuf,
}

impl Paths {
    pub fn under_home(home: &Path, project_id: &str) -> Self {
        Self {
            sentinel_file: home
                .join(".config")
                .join("dev-od-computer")
                .join("setup_complete"),
            credentials_file: home
                .join(".config")
                .join("gcloud")
                .join(format!("{}-credentials.json", project_id)),
            project_dir: home.join("repos").join(project_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub project_id: String,
    pub paths: Paths,
}

impl BootstrapConfig {
    pub fn new(project_id: impl Into<String>, home: &Path) -> Self {
        let project_id = project_id.into();
        let paths = Paths::under_home(home, &project_id);
        Self { project_id, paths }
    }

    pub fn console_providers_url(&self) -> String {
        format!(
            "https://console.firebase.google.com/project/{}/authentication/providers",
            self.project_id
        )
    }
}

/// Snapshot of the credential-bearing environment variables.
///
/// Taken once at process entry and passed down; empty values count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSignal {
    pub service_account_json: Option<String>,
    pub application_credentials: Option<PathBuf>,
}

impl EnvSignal {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let service_account_json = lookup(SERVICE_ACCOUNT_JSON_VAR)
            .and_then(|v| v.into_string().ok())
            .filter(|v| !v.trim().is_empty());
        let application_credentials = lookup(APPLICATION_CREDENTIALS_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            service_account_json,
            application_credentials,
        }
    }

    pub fn is_present(&self) -> bool {
        self.service_account_json.is_some() || self.application_credentials.is_some()
    }
}

/// OAuth client pair used when enabling the Google sign-in provider.
#[derive(Debug, Clone, Default)]
pub struct OAuthClient {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl OAuthClient {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Reads `GOOGLE_OAUTH_CLIENT_ID` / `GOOGLE_OAUTH_CLIENT_SECRET`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let read = |name: &str| {
            lookup(name)
                .and_then(|v| v.into_string().ok())
                .filter(|v| !v.is_empty())
        };
        Self {
            client_id: read(OAUTH_CLIENT_ID_VAR),
            client_secret: read(OAUTH_CLIENT_SECRET_VAR),
        }
    }

    pub fn complete(&self) -> Option<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_paths_follow_home_layout() {
        let paths = Paths::under_home(Path::new("/home/dev"), "demo");
        assert_eq!(
            paths.sentinel_file,
            PathBuf::from("/home/dev/.config/dev-od-computer/setup_complete")
        );
        assert_eq!(
            paths.credentials_file,
            PathBuf::from("/home/dev/.config/gcloud/demo-credentials.json")
        );
        assert_eq!(paths.project_dir, PathBuf::from("/home/dev/repos/demo"));
    }

    #[test]
    fn test_empty_variables_count_as_unset() {
        let env = EnvSignal::from_lookup(lookup(&[
            (SERVICE_ACCOUNT_JSON_VAR, "  "),
            (APPLICATION_CREDENTIALS_VAR, ""),
        ]));
        assert!(!env.is_present());
    }

    #[test]
    fn test_either_variable_is_a_signal() {
        let env = EnvSignal::from_lookup(lookup(&[(APPLICATION_CREDENTIALS_VAR, "/tmp/key.json")]));
        assert!(env.is_present());
        assert_eq!(env.application_credentials, Some(PathBuf::from("/tmp/key.json")));

        let env = EnvSignal::from_lookup(lookup(&[(SERVICE_ACCOUNT_JSON_VAR, "{}")]));
        assert!(env.is_present());
    }

    #[test]
    fn test_oauth_client_is_read_from_environment() {
        let client = OAuthClient::from_lookup(lookup(&[
            (OAUTH_CLIENT_ID_VAR, "1234.apps.googleusercontent.com"),
            (OAUTH_CLIENT_SECRET_VAR, "s3cret"),
        ]));
        assert_eq!(
            client.complete(),
            Some(("1234.apps.googleusercontent.com", "s3cret"))
        );

        let client = OAuthClient::from_lookup(lookup(&[(OAUTH_CLIENT_ID_VAR, "")]));
        assert!(client.client_id.is_none());
        assert!(client.complete().is_none());
    }

    #[test]
    fn test_oauth_client_requires_both_halves() {
        let partial = OAuthClient {
            client_id: Some("id".into()),
            client_secret: None,
        };
        assert!(partial.complete().is_none());

        let full = OAuthClient {
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
        };
        assert_eq!(full.complete(), Some(("id", "secret")));
    }
}
