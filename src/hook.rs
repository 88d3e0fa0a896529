// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Post-update command execution
//!
//! After the zone file has been rewritten, an optional command (typically
//! `rndc reload <zone>`) is run so the nameserver picks up the change. The
//! command runs in the background, bounded by a timeout, and never affects
//! the HTTP response.
//!
//! The command receives these environment variables:
//! - `DYNDNSD_ZONE_FILE`: path of the zone file that was written
//! - `DYNDNSD_DOMAIN`: the managed domain
//! - `DYNDNSD_HOSTNAME`: the hostname that was updated

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::metrics;

pub const ZONE_FILE_ENV: &str = "DYNDNSD_ZONE_FILE";
pub const DOMAIN_ENV: &str = "DYNDNSD_DOMAIN";
pub const HOSTNAME_ENV: &str = "DYNDNSD_HOSTNAME";

/// A configured post-update command
#[derive(Debug, Clone)]
pub struct HookRunner {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    zone_file: PathBuf,
    domain: String,
}

impl HookRunner {
    /// Build a runner from a whitespace-separated command line
    ///
    /// Returns `None` for a missing or blank command.
    pub fn from_command(
        command: Option<&str>,
        timeout: Duration,
        zone_file: PathBuf,
        domain: &str,
    ) -> Option<Self> {
        let mut words = command?.split_whitespace().map(str::to_string);
        let program = words.next()?;

        Some(Self {
            program,
            args: words.collect(),
            timeout,
            zone_file,
            domain: domain.to_string(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run the command to completion and return its standard output
    ///
    /// # Errors
    ///
    /// Fails if the command cannot be started, exceeds the timeout (it is
    /// killed), or exits unsuccessfully.
    pub async fn run(&self, hostname: &str) -> Result<String> {
        debug!("running post-update command: {} {:?}", self.program, self.args);

        let child = Command::new(&self.program)
            .args(&self.args)
            .env(ZONE_FILE_ENV, &self.zone_file)
            .env(DOMAIN_ENV, &self.domain)
            .env(HOSTNAME_ENV, hostname)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start {}", self.program))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .with_context(|| {
                format!("{} timed out after {:?}", self.program, self.timeout)
            })?
            .with_context(|| format!("failed to wait for {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} failed with {}: {}", self.program, output.status, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run the command in the background, logging and counting the outcome
    pub fn spawn(&self, hostname: &str) -> JoinHandle<()> {
        let runner = self.clone();
        let hostname = hostname.to_string();

        tokio::spawn(async move {
            match runner.run(&hostname).await {
                Ok(stdout) => {
                    info!("post-update command {} succeeded: {}", runner.program, stdout);
                    metrics::record_hook_execution(true);
                }
                Err(e) => {
                    error!("post-update command failed: {:#}", e);
                    metrics::record_hook_execution(false);
                }
            }
        })
    }
}
