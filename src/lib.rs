//! First-run bootstrapper for Firebase development sessions.
//!
//! A shell profile calls `first-run guard` on every login. The guard is a
//! silent no-op once the machine is set up, or when no service-account secret
//! is configured. Otherwise it runs `first-run setup`, which materializes the
//! credentials file, proves the key can reach the project, downloads the
//! project's rules into `~/repos/<project>` and writes a sentinel.

pub mod auth;
pub mod config;
pub mod core;
pub mod credentials;
pub mod firebase_cli;
pub mod guard;
pub mod project;
pub mod rules;
pub mod sentinel;
pub mod setup;
pub mod verify;

pub use config::{BootstrapConfig, EnvSignal, OAuthClient, Paths};
pub use guard::{Guard, GuardOutcome, SubprocessSetup};
pub use setup::{SetupError, SetupProcedure, SetupReport};
