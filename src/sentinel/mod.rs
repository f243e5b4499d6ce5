//! Completion marker.
//!
//! Only the file's existence is ever checked. The JSON body records what the
//! completed setup used, for humans inspecting the machine.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{CREDENTIALS_MODE, PRIVATE_DIR_MODE};
use crate::core::fs;
use crate::credentials::ResolvedCredentials;

#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("could not write sentinel {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not encode sentinel: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentinelRecord {
    pub setup_complete: bool,
    pub project_id: Option<String>,
    pub client_email: String,
    pub private_key_id: Option<String>,
    pub credentials_file: PathBuf,
    pub firebase_project_dir: PathBuf,
    pub setup_timestamp: DateTime<Utc>,
}

impl SentinelRecord {
    pub fn new(credentials: &ResolvedCredentials, project_dir: &Path) -> Self {
        Self {
            setup_complete: true,
            project_id: credentials.key.project_id.clone(),
            client_email: credentials.key.client_email.clone(),
            private_key_id: credentials.key.private_key_id.clone(),
            credentials_file: credentials.path.clone(),
            firebase_project_dir: project_dir.to_path_buf(),
            setup_timestamp: Utc::now(),
        }
    }
}

pub fn exists(path: &Path) -> bool {
    path.is_file()
}

pub fn write(path: &Path, record: &SentinelRecord) -> Result<(), SentinelError> {
    let io_err = |source| SentinelError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent() {
        fs::ensure_dir(dir, PRIVATE_DIR_MODE).map_err(io_err)?;
    }
    let body = serde_json::to_vec_pretty(record)?;
    fs::write_with_mode(path, &body, CREDENTIALS_MODE).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{parse_key, tests::SAMPLE_KEY, CredentialSource};

    #[test]
    fn test_write_records_setup_metadata() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join(".config/dev-od-computer/setup_complete");
        let credentials = ResolvedCredentials {
            path: home.path().join("creds.json"),
            source: CredentialSource::Inline,
            key: parse_key(SAMPLE_KEY).unwrap(),
        };
        assert!(!exists(&path));

        let record = SentinelRecord::new(&credentials, &home.path().join("repos/test-project"));
        write(&path, &record).unwrap();

        assert!(exists(&path));
        let stored: SentinelRecord =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(stored, record);
        assert_eq!(stored.project_id.as_deref(), Some("test-project"));
        assert_eq!(stored.private_key_id.as_deref(), Some("abc123"));
        #[cfg(unix)]
        assert_eq!(fs::file_mode(&path).unwrap(), Some(0o600));
    }
}
