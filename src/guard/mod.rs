//! Session-start guard.
//!
//! Decides cheaply whether this machine still needs setup and, if a
//! credential is available, hands off to the setup procedure in a child
//! process. Every "nothing to do" path is silent and exits 0.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

use crate::config::{EnvSignal, Paths, CREDENTIALS_MODE};
use crate::core::fs;
use crate::sentinel;


const BANNER_RULE: &str = "==================================================";

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("could not launch setup: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("could not locate the current executable: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("could not write to terminal: {0}")]
    Output(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The guard already ran in this process.
    AlreadyRan,
    /// Sentinel present and credentials locked down.
    AlreadyConfigured,
    /// Nothing to set up with; a no-op, not a failure.
    NoCredentials,
    SetupSucceeded,
    SetupFailed(i32),
}

impl GuardOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            GuardOutcome::SetupFailed(code) => *code,
            _ => 0,
        }
    }

    /// True for the outcomes where no setup was attempted.
    pub fn is_noop(&self) -> bool {
        matches!(
            self,
            GuardOutcome::AlreadyRan | GuardOutcome::AlreadyConfigured | GuardOutcome::NoCredentials
        )
    }
}

/// Launches the setup procedure and reports its exit code.
pub trait SetupRunner {
    fn run_setup(&self) -> Result<i32, GuardError>;
}

/// Runs setup as a child process that shares this terminal.
pub struct SubprocessSetup {
    program: PathBuf,
    args: Vec<OsString>,
}

impl SubprocessSetup {
    pub fn new(program: impl Into<PathBuf>, args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Re-invokes the running binary with `args`.
    pub fn current_exe(args: Vec<OsString>) -> Result<Self, GuardError> {
        let program = std::env::current_exe().map_err(GuardError::CurrentExe)?;
        Ok(Self::new(program, args))
    }
}

impl SetupRunner for SubprocessSetup {
    fn run_setup(&self) -> Result<i32, GuardError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .map_err(GuardError::Spawn)?;
        // Killed by a signal: no code to propagate.
        Ok(status.code().unwrap_or(1))
    }
}

pub struct Guard<'a, R, W> {
    paths: &'a Paths,
    env: &'a EnvSignal,
    runner: R,
    out: W,
    already_ran: bool,
}

impl<'a, R: SetupRunner, W: Write> Guard<'a, R, W> {
    pub fn new(paths: &'a Paths, env: &'a EnvSignal, runner: R, out: W) -> Self {
        Self {
            paths,
            env,
            runner,
            out,
            already_ran: false,
        }
    }

    /// The credentials file setup leaves behind: the fixed path, unless only a
    /// key file path is configured, in which case setup uses that file in place.
    pub fn credentials_file(&self) -> &Path {
        match (&self.env.service_account_json, &self.env.application_credentials) {
            (None, Some(path)) => path,
            _ => &self.paths.credentials_file,
        }
    }

    /// Sentinel exists and the credentials file has exactly the required mode.
    ///
    /// Any other mode, tighter or looser, means "not configured".
    pub fn is_configured(&self) -> bool {
        if !sentinel::exists(&self.paths.sentinel_file) {
            debug!(sentinel = %self.paths.sentinel_file.display(), "setup needed: no sentinel");
            return false;
        }
        let credentials = self.credentials_file();
        match fs::file_mode(credentials) {
            Ok(Some(mode)) if mode == CREDENTIALS_MODE => true,
            Ok(Some(mode)) => {
                debug!(
                    path = %credentials.display(),
                    mode = %format!("{:o}", mode),
                    "setup needed: credentials mode is not 600"
                );
                false
            }
            Ok(None) => {
                debug!(path = %credentials.display(), "setup needed: no credentials file");
                false
            }
            Err(e) => {
                debug!(path = %credentials.display(), error = %e, "setup needed: cannot stat credentials file");
                false
            }
        }
    }

    pub fn run(&mut self) -> Result<GuardOutcome, GuardError> {
        if self.already_ran {
            return Ok(GuardOutcome::AlreadyRan);
        }
        self.already_ran = true;

        if self.is_configured() {
            return Ok(GuardOutcome::AlreadyConfigured);
        }

        if !self.env.is_present() {
            return Ok(GuardOutcome::NoCredentials);
        }

        writeln!(self.out, "{}", BANNER_RULE)?;
        writeln!(self.out, "First run detected - running setup...")?;
        writeln!(self.out, "{}", BANNER_RULE)?;
        self.out.flush()?;

        let code = self.runner.run_setup()?;
        if code != 0 {
            return Ok(GuardOutcome::SetupFailed(code));
        }

        writeln!(self.out, "{}", BANNER_RULE)?;
        writeln!(self.out, "Setup complete. Firebase project ready.")?;
        writeln!(self.out, "{}", BANNER_RULE)?;
        Ok(GuardOutcome::SetupSucceeded)
    }
}
