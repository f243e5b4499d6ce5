//! Local Firebase project tree under `~/repos/<project>`.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;

use crate::rules::RulesFile;


#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not encode {file}: {source}")]
    Encode {
        file: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub struct ProjectTree {
    dir: PathBuf,
    project_id: String,
}

impl ProjectTree {
    pub fn new(dir: impl Into<PathBuf>, project_id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            project_id: project_id.into(),
        }
    }

    /// Writes the deploy configuration files.
    ///
    /// `firebase.json` and `.firebaserc` are regenerated every time;
    /// `firestore.indexes.json` is only created when absent so local index
    /// edits survive a re-run.
    pub fn scaffold(&self) -> Result<Vec<PathBuf>, ProjectError> {
        self.create_dir(&self.dir)?;
        let mut written = Vec::new();

        written.push(self.write_json("firebase.json", &firebase_json())?);
        written.push(self.write_json(".firebaserc", &firebaserc(&self.project_id))?);

        let indexes = self.dir.join("firestore.indexes.json");
        if !indexes.exists() {
            written.push(self.write_json("firestore.indexes.json", &empty_indexes())?);
        }

        let public = self.dir.join("public");
        self.create_dir(&public)?;
        written.push(public);

        info!(dir = %self.dir.display(), "Project directory ready");
        Ok(written)
    }

    /// Writes downloaded rules sources to `firestore.rules` / `storage.rules`.
    pub fn write_rules(&self, files: &[RulesFile]) -> Result<Vec<PathBuf>, ProjectError> {
        let mut written = Vec::new();
        for file in files {
            let path = self.dir.join(file.target.file_name());
            std::fs::write(&path, &file.content).map_err(|source| ProjectError::Io {
                path: path.clone(),
                source,
            })?;
            info!(file = file.target.file_name(), release = %file.release, "Downloaded rules");
            written.push(path);
        }
        Ok(written)
    }

    fn create_dir(&self, dir: &Path) -> Result<(), ProjectError> {
        std::fs::create_dir_all(dir).map_err(|source| ProjectError::Io {
            path: dir.to_path_buf(),
            source,
        })
    }

    fn write_json(&self, file: &'static str, value: &Value) -> Result<PathBuf, ProjectError> {
        let path = self.dir.join(file);
        let body = serde_json::to_string_pretty(value)
            .map_err(|source| ProjectError::Encode { file, source })?;
        std::fs::write(&path, body).map_err(|source| ProjectError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

fn firebase_json() -> Value {
    json!({
        "firestore": {
            "rules": "firestore.rules",
            "indexes": "firestore.indexes.json"
        },
        "hosting": {
            "public": "public",
            "ignore": ["firebase.json", "**/.*", "**/node_modules/**"]
        },
        "storage": {
            "rules": "storage.rules"
        }
    })
}

fn firebaserc(project_id: &str) -> Value {
    json!({ "projects": { "default": project_id } })
}

fn empty_indexes() -> Value {
    json!({ "indexes": [], "fieldOverrides": [] })
}
