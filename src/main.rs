use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use firebase_first_run::config::{DEFAULT_PROJECT_ID, OAUTH_CLIENT_ID_VAR, OAUTH_CLIENT_SECRET_VAR};
use firebase_first_run::credentials::{self, CredentialsError};
use firebase_first_run::firebase_cli::CliStatus;
use firebase_first_run::setup::backend::FirebaseBackend;
use firebase_first_run::verify::{self, display_client_id, ConfigureOutcome, ProviderStatus};
use firebase_first_run::{
    BootstrapConfig, EnvSignal, Guard, OAuthClient, SetupError, SetupProcedure, SubprocessSetup,
};

const RULE: &str = "==================================================";

#[derive(Parser)]
#[command(
    name = "first-run",
    about = "Bootstrap Firebase credentials and project files for a new development session",
    version
)]
struct Cli {
    /// Firebase project to bootstrap
    #[arg(long, global = true, env = "FIRST_RUN_PROJECT_ID", default_value = DEFAULT_PROJECT_ID)]
    project_id: String,

    /// Home directory that the sentinel, credentials and project paths live under
    #[arg(long, global = true, env = "FIRST_RUN_HOME")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run setup once per machine if a credential is available (default; silent when there is nothing to do)
    Guard,

    /// Materialize credentials, verify access, download the project and mark setup complete
    Setup,

    /// Check that the credentials can authenticate and reach the Firebase Admin API
    Verify,

    /// Inspect or enable the Google sign-in provider
    GoogleAuth {
        /// Only report the current configuration
        #[arg(long)]
        verify: bool,

        /// OAuth client ID (defaults to GOOGLE_OAUTH_CLIENT_ID)
        #[arg(long)]
        client_id: Option<String>,

        /// OAuth client secret (defaults to GOOGLE_OAUTH_CLIENT_SECRET)
        #[arg(long)]
        client_secret: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Guard);

    let default_level = match command {
        Commands::Guard => tracing::Level::WARN,
        _ => tracing::Level::INFO,
    };

    // RUST_LOG wins when set; otherwise the per-command default applies.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = run(command, &cli.project_id, cli.home);
    match result {
        Ok(code) => exit_code(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, project_id: &str, home: Option<PathBuf>) -> anyhow::Result<i32> {
    let home = match home {
        Some(h) => h,
        None => home::home_dir().context("could not determine the home directory")?,
    };
    let config = BootstrapConfig::new(project_id, &home);
    let env = EnvSignal::from_env();
    let oauth_env = OAuthClient::from_env();

    match command {
        Commands::Guard => run_guard(&config, &env, &home),
        Commands::Setup => runtime()?.block_on(run_setup(&config, &env)),
        Commands::Verify => runtime()?.block_on(run_verify(&config, &env)),
        Commands::GoogleAuth {
            verify,
            client_id,
            client_secret,
        } => {
            let requested = OAuthClient {
                client_id,
                client_secret,
            };
            runtime()?.block_on(run_google_auth(&config, &env, verify, requested, oauth_env))
        }
    }
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("could not start the async runtime")
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn run_guard(config: &BootstrapConfig, env: &EnvSignal, home: &Path) -> anyhow::Result<i32> {
    let args: Vec<OsString> = vec![
        "--project-id".into(),
        config.project_id.clone().into(),
        "--home".into(),
        home.as_os_str().to_owned(),
        "setup".into(),
    ];
    let runner = SubprocessSetup::current_exe(args)?;
    let stdout = std::io::stdout();
    let mut guard = Guard::new(&config.paths, env, runner, stdout.lock());

    let outcome = guard.run()?;
    tracing::debug!(?outcome, noop = outcome.is_noop(), "guard finished");
    Ok(outcome.exit_code())
}

fn print_header(title: &str) {
    println!("{}", RULE);
    println!("{}", title);
    println!("{}", RULE);
}

async fn run_setup(config: &BootstrapConfig, env: &EnvSignal) -> anyhow::Result<i32> {
    print_header("DEV-OD-Computer First Run Setup");
    println!("Project: {}", config.project_id);
    println!("Project directory: {}", config.paths.project_dir.display());
    println!();

    let report = match SetupProcedure::new(config, env).run().await {
        Ok(report) => report,
        Err(e) => {
            println!();
            println!("[FAILED] {}", e);
            if matches!(e, SetupError::Credentials(CredentialsError::NotConfigured)) {
                print_credential_hint();
            }
            return Ok(e.exit_code());
        }
    };

    println!();
    print_header("Setup Complete!");
    println!("Credentials: {}", report.credentials.path.display());
    println!("Service account: {}", report.credentials.client_email());
    println!("Users visible to Admin API: {}", report.user_count);
    println!();
    println!("Firebase project ready at: {}", report.project_dir.display());
    for path in &report.written {
        println!("  wrote {}", path.display());
    }
    println!();
    println!("You can now:");
    println!("  1. cd {}", report.project_dir.display());
    println!("  2. Edit firestore.rules, storage.rules, etc.");
    println!("  3. Deploy with: firebase deploy --project {}", config.project_id);

    if !report.google_provider.enabled() {
        println!();
        println!("[INFO] Google Sign-In provider is not enabled.");
        println!("Run 'first-run google-auth' to configure it.");
    }
    match &report.firebase_cli {
        CliStatus::Installed { version } => println!("\nFirebase CLI version: {}", version),
        CliStatus::Broken => println!("\n[INFO] Firebase CLI found but not working properly."),
        CliStatus::Missing => {
            println!("\n[INFO] Firebase CLI not installed: npm install -g firebase-tools")
        }
    }

    Ok(0)
}

fn print_credential_hint() {
    println!();
    println!("To fix this, set one of the following:");
    println!("1. GOOGLE_SERVICE_ACCOUNT_JSON - The JSON content of your service account key");
    println!("2. GOOGLE_APPLICATION_CREDENTIALS - Path to your service account JSON file");
}

/// The file the auxiliary checks read: an explicit path wins over the
/// materialized one.
fn credentials_path(config: &BootstrapConfig, env: &EnvSignal) -> PathBuf {
    env.application_credentials
        .clone()
        .unwrap_or_else(|| config.paths.credentials_file.clone())
}

async fn run_verify(config: &BootstrapConfig, env: &EnvSignal) -> anyhow::Result<i32> {
    print_header("Firebase Setup Verification");

    let path = credentials_path(config, env);
    let key = match credentials::load(&path) {
        Ok(key) => key,
        Err(e) => {
            println!("  ERROR: {}", e);
            return Ok(1);
        }
    };

    let backend = FirebaseBackend::new(key, &config.project_id);
    let report = verify::verify_access(&backend).await;

    println!("Service Account: {}", report.service_account);
    println!(
        "Project ID: {}",
        report.key_project_id.as_deref().unwrap_or("(none)")
    );
    match &report.token {
        Ok(()) => println!("  Google Auth: OK"),
        Err(e) => println!("  Google Auth: ERROR: {}", e),
    }
    match &report.admin {
        Ok(count) => println!("  Firebase Admin SDK: OK ({} users found)", count),
        Err(e) => println!("  Firebase Admin SDK: ERROR: {}", e),
    }

    println!();
    println!("{}", RULE);
    if report.passed() {
        println!("All checks passed!");
        Ok(0)
    } else {
        println!("Some checks failed. Please review the errors above.");
        Ok(1)
    }
}

async fn run_google_auth(
    config: &BootstrapConfig,
    env: &EnvSignal,
    verify_only: bool,
    requested: OAuthClient,
    fallback: OAuthClient,
) -> anyhow::Result<i32> {
    let path = credentials_path(config, env);
    let key = match credentials::load(&path) {
        Ok(key) => key,
        Err(e) => {
            println!("ERROR: {}", e);
            return Ok(1);
        }
    };
    let backend = FirebaseBackend::new(key, &config.project_id);
    let project_config = backend.project_config();

    if verify_only {
        print_header("Google Authentication Setup Verification");
        let report = match verify::inspect_google_provider(project_config).await {
            Ok(report) => report,
            Err(e) => {
                println!("ERROR: {}", e);
                return Ok(1);
            }
        };

        println!("Project: {}", config.project_id);
        if let Some(sign_in) = report.identity.as_ref().and_then(|i| i.sign_in.as_ref()) {
            println!("  Email sign-in enabled: {}", sign_in.email_enabled());
            println!("  Anonymous sign-in enabled: {}", sign_in.anonymous_enabled());
        }
        print_provider_status(&report.provider);
        return Ok(if report.passed() { 0 } else { 1 });
    }

    print_header("Google Authentication Setup");
    println!("Project: {}", config.project_id);
    println!();

    let outcome =
        match verify::configure_google_provider(project_config, &requested, &fallback).await {
            Ok(outcome) => outcome,
            Err(e) => {
                println!("ERROR: Could not enable Google provider: {}", e);
                return Ok(1);
            }
        };

    match &outcome {
        ConfigureOutcome::AlreadyEnabled { client_id } => {
            println!("Google Sign-In provider is already enabled");
            if let Some(id) = client_id {
                println!("  Client ID: {}", display_client_id(id));
            }
        }
        ConfigureOutcome::Created | ConfigureOutcome::Updated => {
            println!("Google Sign-In provider enabled successfully!");
        }
        ConfigureOutcome::MissingOAuthClient { provider_exists } => {
            println!("To enable Google Sign-In with custom OAuth credentials:");
            println!("  1. Go to Google Cloud Console > APIs & Services > Credentials");
            println!("  2. Create an OAuth 2.0 Client ID (Web application)");
            println!("  3. Set {} and {}", OAUTH_CLIENT_ID_VAR, OAUTH_CLIENT_SECRET_VAR);
            println!();
            println!("Alternatively, enable Google Sign-In in Firebase Console:");
            println!("  {}", config.console_providers_url());
            if *provider_exists {
                println!();
                println!("Note: Google provider exists but may need OAuth configuration");
            }
        }
    }

    if outcome.is_success() {
        println!();
        println!("Users can sign in with Google at:");
        println!("  https://{}.firebaseapp.com", config.project_id);
        println!("  https://{}.web.app", config.project_id);
        Ok(0)
    } else {
        Ok(1)
    }
}

fn print_provider_status(status: &ProviderStatus) {
    if let ProviderStatus::Unknown(e) = status {
        println!("  Warning: could not check Google provider: {}", e);
    }
    println!("  Provider exists: {}", status.exists());
    println!("  Provider enabled: {}", status.enabled());
    if let Some(id) = status.client_id() {
        println!("  OAuth Client ID: {}", display_client_id(id));
    }
}
