//! The idempotent setup procedure.
//!
//! Steps run in order and the first failure aborts the run. Nothing is rolled
//! back: re-running is the recovery path. The credentials file is written and
//! locked down before any network call, and the sentinel is written last.

pub mod backend;

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::auth::AuthError;
use crate::config::{BootstrapConfig, EnvSignal};
use crate::credentials::{self, CredentialsError, ResolvedCredentials};
use crate::firebase_cli::CliStatus;
use crate::project::{ProjectError, ProjectTree};
use crate::rules::RulesError;
use crate::sentinel::{self, SentinelError, SentinelRecord};
use crate::verify::ProviderStatus;
use backend::{FirebaseBackend, ProjectBackend};

#[cfg(test)]
mod tests;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    #[error("Google Auth verification failed: {0}")]
    Authentication(#[source] AuthError),
    #[error("Firebase Admin verification failed (the service account may need additional IAM roles): {0}")]
    AdminAccess(#[source] AuthError),
    #[error("could not set up project directory: {0}")]
    Project(#[from] ProjectError),
    #[error("could not download Firebase rules: {0}")]
    Rules(#[from] RulesError),
    #[error("could not mark setup complete: {0}")]
    Sentinel(#[from] SentinelError),
}

impl SetupError {
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[derive(Debug)]
pub struct SetupReport {
    pub credentials: ResolvedCredentials,
    pub user_count: usize,
    pub project_dir: PathBuf,
    pub written: Vec<PathBuf>,
    pub google_provider: ProviderStatus,
    pub firebase_cli: CliStatus,
}

pub struct SetupProcedure<'a> {
    config: &'a BootstrapConfig,
    env: &'a EnvSignal,
}

impl<'a> SetupProcedure<'a> {
    pub fn new(config: &'a BootstrapConfig, env: &'a EnvSignal) -> Self {
        Self { config, env }
    }

    pub async fn run(&self) -> Result<SetupReport, SetupError> {
        let project_id = self.config.project_id.clone();
        self.run_with(move |credentials| FirebaseBackend::new(credentials.key.clone(), &project_id))
            .await
    }

    /// Runs the procedure against the backend built by `connect` once the
    /// credentials are on disk.
    pub async fn run_with<B, F>(&self, connect: F) -> Result<SetupReport, SetupError>
    where
        B: ProjectBackend,
        F: FnOnce(&ResolvedCredentials) -> B,
    {
        let paths = &self.config.paths;

        info!("Step 1: Checking Google credentials");
        let credentials = credentials::resolve(self.env, &paths.credentials_file)?;
        if let Some(key_project) = credentials.project_id() {
            if key_project != self.config.project_id {
                warn!(
                    key_project,
                    target_project = %self.config.project_id,
                    "service account belongs to a different project"
                );
            }
        }

        let backend = connect(&credentials);

        info!(service_account = backend.service_account(), "Step 2: Verifying Google Auth");
        backend
            .verify_token()
            .await
            .map_err(SetupError::Authentication)?;
        info!("Google Auth: OK");

        info!("Step 3: Verifying Firebase Admin access");
        let user_count = backend
            .count_users()
            .await
            .map_err(SetupError::AdminAccess)?;
        info!(users = user_count, "Firebase Admin SDK: OK");

        info!(dir = %paths.project_dir.display(), "Step 4: Downloading project configuration");
        let tree = ProjectTree::new(&paths.project_dir, &self.config.project_id);
        let mut written = tree.scaffold()?;
        let rules = backend.download_rules().await?;
        written.extend(tree.write_rules(&rules)?);

        info!("Step 5: Checking Google Sign-In provider and Firebase CLI");
        let google_provider = ProviderStatus::from_lookup(backend.google_provider().await);
        if !google_provider.enabled() {
            info!(status = ?google_provider, "Google Sign-In provider not enabled");
        }
        let firebase_cli = backend.firebase_cli();
        if !firebase_cli.is_installed() {
            info!(status = ?firebase_cli, "Firebase CLI not available");
        }

        info!("Step 6: Marking setup complete");
        let record = SentinelRecord::new(&credentials, &paths.project_dir);
        sentinel::write(&paths.sentinel_file, &record)?;

        Ok(SetupReport {
            credentials,
            user_count,
            project_dir: paths.project_dir.clone(),
            written,
            google_provider,
            firebase_cli,
        })
    }
}
