use super::backend::fake::FakeBackend;
use super::*;
use crate::core::fs::file_mode;
use crate::credentials::tests::SAMPLE_KEY;
use crate::rules::{RulesFile, RulesTarget};

fn firestore_rules() -> Vec<RulesFile> {
    vec![RulesFile {
        target: RulesTarget::Firestore,
        release: "projects/test-project/releases/cloud.firestore".into(),
        content: "rules_version = '2';".into(),
    }]
}

fn inline_env() -> EnvSignal {
    EnvSignal {
        service_account_json: Some(SAMPLE_KEY.to_string()),
        application_credentials: None,
    }
}

#[tokio::test]
async fn test_setup_materializes_credentials_and_marks_complete() {
    let home = tempfile::tempdir().unwrap();
    let config = BootstrapConfig::new("test-project", home.path());
    let env = inline_env();

    let report = SetupProcedure::new(&config, &env)
        .run_with(|_| FakeBackend::healthy(firestore_rules()))
        .await
        .unwrap();

    let paths = &config.paths;
    assert_eq!(std::fs::read_to_string(&paths.credentials_file).unwrap(), SAMPLE_KEY);
    #[cfg(unix)]
    assert_eq!(file_mode(&paths.credentials_file).unwrap(), Some(0o600));
    assert!(paths.sentinel_file.is_file());
    assert_eq!(
        std::fs::read_to_string(paths.project_dir.join("firestore.rules")).unwrap(),
        "rules_version = '2';"
    );
    assert!(paths.project_dir.join(".firebaserc").is_file());
    assert_eq!(report.user_count, 3);
    assert_eq!(report.google_provider, ProviderStatus::NotConfigured);
    assert_eq!(report.firebase_cli, CliStatus::Missing);
    assert!(report.written.contains(&paths.project_dir.join("firestore.rules")));
    assert!(report.written.contains(&paths.project_dir.join("public")));
}

#[tokio::test]
async fn test_setup_twice_is_idempotent() {
    let home = tempfile::tempdir().unwrap();
    let config = BootstrapConfig::new("test-project", home.path());
    let env = inline_env();
    let setup = SetupProcedure::new(&config, &env);

    setup.run_with(|_| FakeBackend::healthy(firestore_rules())).await.unwrap();
    let first_rc = std::fs::read(config.paths.project_dir.join(".firebaserc")).unwrap();
    setup.run_with(|_| FakeBackend::healthy(firestore_rules())).await.unwrap();

    assert_eq!(std::fs::read_to_string(&config.paths.credentials_file).unwrap(), SAMPLE_KEY);
    #[cfg(unix)]
    assert_eq!(file_mode(&config.paths.credentials_file).unwrap(), Some(0o600));
    assert_eq!(std::fs::read(config.paths.project_dir.join(".firebaserc")).unwrap(), first_rc);
    assert!(config.paths.sentinel_file.is_file());
}

#[tokio::test]
async fn test_unauthorized_key_aborts_before_sentinel() {
    let home = tempfile::tempdir().unwrap();
    let config = BootstrapConfig::new("test-project", home.path());
    let env = inline_env();

    let err = SetupProcedure::new(&config, &env)
        .run_with(|_| FakeBackend {
            token_ok: false,
            ..FakeBackend::healthy(vec![])
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SetupError::Authentication(_)));
    assert_eq!(err.exit_code(), 1);
    assert!(!config.paths.sentinel_file.exists());
    #[cfg(unix)]
    assert_eq!(file_mode(&config.paths.credentials_file).unwrap(), Some(0o600));
}

#[tokio::test]
async fn test_missing_admin_access_aborts() {
    let home = tempfile::tempdir().unwrap();
    let config = BootstrapConfig::new("test-project", home.path());
    let env = inline_env();

    let err = SetupProcedure::new(&config, &env)
        .run_with(|_| FakeBackend {
            users: None,
            ..FakeBackend::healthy(vec![])
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SetupError::AdminAccess(_)));
    assert!(!config.paths.sentinel_file.exists());
    assert!(!config.paths.project_dir.exists());
}

#[tokio::test]
async fn test_rules_download_failure_aborts() {
    let home = tempfile::tempdir().unwrap();
    let config = BootstrapConfig::new("test-project", home.path());
    let env = inline_env();

    let err = SetupProcedure::new(&config, &env)
        .run_with(|_| FakeBackend {
            rules: None,
            ..FakeBackend::healthy(vec![])
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SetupError::Rules(_)));
    assert!(!config.paths.sentinel_file.exists());
}

#[tokio::test]
async fn test_invalid_inline_json_never_connects() {
    let home = tempfile::tempdir().unwrap();
    let config = BootstrapConfig::new("test-project", home.path());
    let env = EnvSignal {
        service_account_json: Some(r#"{"type":"service_account"}"#.to_string()),
        application_credentials: None,
    };

    let mut connected = false;
    let err = SetupProcedure::new(&config, &env)
        .run_with(|_| {
            connected = true;
            FakeBackend::healthy(vec![])
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SetupError::Credentials(CredentialsError::MissingField("project_id"))
    ));
    assert!(!connected);
    assert!(!config.paths.credentials_file.exists());
    assert!(!config.paths.sentinel_file.exists());
}

#[tokio::test]
async fn test_file_credentials_are_recorded_in_sentinel() {
    let home = tempfile::tempdir().unwrap();
    let config = BootstrapConfig::new("test-project", home.path());
    let key_path = home.path().join("downloaded-key.json");
    std::fs::write(&key_path, SAMPLE_KEY).unwrap();
    let env = EnvSignal {
        service_account_json: None,
        application_credentials: Some(key_path.clone()),
    };

    let report = SetupProcedure::new(&config, &env)
        .run_with(|_| FakeBackend::healthy(vec![]))
        .await
        .unwrap();

    assert_eq!(report.credentials.path, key_path);
    let record: SentinelRecord =
        serde_json::from_slice(&std::fs::read(&config.paths.sentinel_file).unwrap()).unwrap();
    assert_eq!(record.credentials_file, key_path);
    assert!(!config.paths.credentials_file.exists());
}
