// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone file updater
//!
//! Applies an [`UpdateRequest`] to the zone file on disk. Each update reads
//! the file, folds the new addresses into it, and writes it back. Updates are
//! serialized by a lock held across the whole read-modify-write cycle, and the
//! file is replaced atomically so readers never see a partial zone.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    config::ZoneFileParams,
    hook::HookRunner,
    metrics,
    resolver::UpdateRequest,
    zones::{RecordChange, Zone, ZoneError},
};

/// Result of a successful update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// True when no zone file existed and a new zone was synthesized
    pub created: bool,
    pub serial: u32,
    pub serial_advanced: bool,
    pub a: RecordChange,
    pub aaaa: RecordChange,
    /// Duplicate A/AAAA records for the hostname that were removed
    pub duplicates_dropped: usize,
}

/// Keeps one zone file in step with address updates
#[derive(Debug)]
pub struct ZoneFileUpdater {
    domain: String,
    params: ZoneFileParams,
    lock: Mutex<()>,
    hook: Option<HookRunner>,
}

fn io_error(path: &Path, source: std::io::Error) -> ZoneError {
    ZoneError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl ZoneFileUpdater {
    pub fn new(domain: &str, params: ZoneFileParams) -> Self {
        let domain = domain.trim().trim_end_matches('.').to_string();
        let hook = HookRunner::from_command(
            params.command.as_deref(),
            Duration::from_secs(params.command_timeout_secs),
            params.zone_file.clone(),
            &domain,
        );

        Self {
            domain,
            params,
            lock: Mutex::new(()),
            hook,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn zone_file(&self) -> &Path {
        &self.params.zone_file
    }

    /// Read and parse the zone file
    ///
    /// Returns `Ok(None)` when the file does not exist. Malformed entries are
    /// skipped and logged by the parser.
    pub async fn read_zone(&self) -> Result<Option<Zone>, ZoneError> {
        let path = self.zone_file();
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(path, e)),
        };

        let (zone, errors) = Zone::parse(&content, &self.domain);
        if !errors.is_empty() {
            warn!(
                "{} malformed entries skipped in {}",
                errors.len(),
                path.display()
            );
        }

        Ok(Some(zone))
    }

    /// Replace the zone file with `zone` via a temporary file and a rename
    async fn write_zone(&self, zone: &Zone) -> Result<(), ZoneError> {
        let path = self.zone_file();
        let tmp = temp_path(path);

        tokio::fs::write(&tmp, zone.to_zone_file())
            .await
            .map_err(|e| io_error(&tmp, e))?;

        if let Err(e) = copy_metadata(path, &tmp).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_error(path, e));
        }

        debug!("wrote {} records to {}", zone.records.len(), path.display());
        Ok(())
    }

    /// Apply an update at the current time
    pub async fn apply(&self, update: &UpdateRequest) -> Result<UpdateOutcome, ZoneError> {
        self.apply_at(update, Utc::now()).await
    }

    /// Apply an update as of `now`
    ///
    /// # Errors
    ///
    /// Returns an error if the zone file cannot be read or written, if an
    /// existing zone has no SOA record, or if a new zone cannot be given a
    /// serial. The file is left untouched in every error case.
    pub async fn apply_at(
        &self,
        update: &UpdateRequest,
        now: DateTime<Utc>,
    ) -> Result<UpdateOutcome, ZoneError> {
        let result = {
            let _guard = self.lock.lock().await;
            self.update_locked(update, now).await
        };

        match &result {
            Ok(outcome) => {
                metrics::record_zone_update(outcome.created, true);
                metrics::set_zone_serial(outcome.serial);
                info!(
                    hostname = %update.hostname,
                    serial = outcome.serial,
                    duplicates_dropped = outcome.duplicates_dropped,
                    "zone {} updated (A {}, AAAA {})",
                    self.domain,
                    outcome.a,
                    outcome.aaaa
                );
                if let Some(hook) = &self.hook {
                    hook.spawn(&update.hostname);
                }
            }
            Err(e) => {
                metrics::record_zone_update(false, false);
                error!(hostname = %update.hostname, "zone {} update failed: {}", self.domain, e);
            }
        }

        result
    }

    async fn update_locked(
        &self,
        update: &UpdateRequest,
        now: DateTime<Utc>,
    ) -> Result<UpdateOutcome, ZoneError> {
        let policy = self.params.serial_incrementer;

        let (zone, report, created) = match self.read_zone().await? {
            Some(zone) => {
                let (zone, report) = zone.reconcile(update, policy, self.params.ttl, now)?;
                (zone, report, false)
            }
            None => {
                info!(
                    "zone file {} not found, creating zone {}",
                    self.zone_file().display(),
                    self.domain
                );
                let (zone, report) = Zone::bootstrap(&self.domain, &self.params, update, now)?;
                (zone, report, true)
            }
        };

        self.write_zone(&zone).await?;

        Ok(UpdateOutcome {
            created,
            serial: report.serial,
            serial_advanced: report.serial_advanced,
            a: report.a,
            aaaa: report.aaaa,
            duplicates_dropped: report.duplicates_dropped,
        })
    }
}

/// Carry the existing zone file's mode and ownership over to its replacement
async fn copy_metadata(path: &Path, tmp: &Path) -> Result<(), ZoneError> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(io_error(path, e)),
    };

    tokio::fs::set_permissions(tmp, meta.permissions())
        .await
        .map_err(|e| io_error(tmp, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;

        // needs privileges unless the owner already matches
        if let Err(e) = std::os::unix::fs::chown(tmp, Some(meta.uid()), Some(meta.gid())) {
            debug!("could not copy owner of {} to {}: {}", path.display(), tmp.display(), e);
        }
    }

    Ok(())
}

/// Sibling path used while writing the zone file
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
