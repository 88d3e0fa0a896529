// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone reconciliation
//!
//! This module holds the in-memory zone and the logic that folds an address
//! update into it:
//! - Rewriting the hostname's A/AAAA records in place
//! - Appending A/AAAA records the hostname does not have yet
//! - Advancing the SOA serial
//! - Synthesizing a fresh zone when no zone file exists
//! - Rendering the zone back to master file text

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    config::ZoneFileParams,
    metrics,
    records::{fqdn, names_match, ResourceRecord, SoaRecord},
    resolver::UpdateRequest,
    serial::{SerialError, SerialPolicy},
    zone_parser::{self, ZoneParseError},
};

/// Zone errors
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("zone {0} has no SOA record")]
    MissingSoa(String),

    #[error("serial error: {0}")]
    Serial(#[from] SerialError),

    #[error("zone file I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to one of the hostname's address records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordChange {
    /// No such record and no address for it
    #[default]
    Absent,
    /// Present and left with its current address
    Unchanged,
    /// Present and given the new address
    Rewritten,
    /// Not present, appended with the new address
    Appended,
}

impl RecordChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordChange::Absent => "absent",
            RecordChange::Unchanged => "unchanged",
            RecordChange::Rewritten => "rewritten",
            RecordChange::Appended => "appended",
        }
    }
}

impl fmt::Display for RecordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    /// Serial the zone carries after the update
    pub serial: u32,
    /// False when the serial policy could not move the serial forward
    pub serial_advanced: bool,
    pub a: RecordChange,
    pub aaaa: RecordChange,
    /// A/AAAA records for the hostname removed as duplicates
    pub duplicates_dropped: usize,
}

/// An ordered record set for one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Fully-qualified zone origin
    pub origin: String,
    pub records: Vec<ResourceRecord>,
}

/// Apply the serial policy, keeping the old serial when it cannot advance
fn advance_serial(policy: SerialPolicy, current: u32, now: DateTime<Utc>) -> (u32, bool) {
    match policy.next_at(current, now) {
        Ok(next) => (next, next != current),
        Err(e) => {
            warn!(serial = current, "serial left unchanged: {}", e);
            metrics::record_serial_overflow();
            (current, false)
        }
    }
}

impl Zone {
    pub fn new(origin: &str, records: Vec<ResourceRecord>) -> Self {
        Self {
            origin: fqdn(origin),
            records,
        }
    }

    /// Parse zone file text, returning the zone and the entries that were skipped
    pub fn parse(content: &str, origin: &str) -> (Self, Vec<ZoneParseError>) {
        let parsed = zone_parser::parse_zone(content, origin);
        (Self::new(origin, parsed.records), parsed.errors)
    }

    /// The zone's SOA record, if any
    pub fn soa(&self) -> Option<&SoaRecord> {
        self.records.iter().find_map(|record| match record {
            ResourceRecord::Soa(soa) => Some(soa),
            _ => None,
        })
    }

    /// Synthesize a new zone for `origin`: SOA, NS, then the hostname's
    /// A and/or AAAA record
    ///
    /// The SOA serial is the policy's successor of 0.
    pub fn bootstrap(
        origin: &str,
        params: &ZoneFileParams,
        update: &UpdateRequest,
        now: DateTime<Utc>,
    ) -> Result<(Self, ReconcileReport), ZoneError> {
        let apex = fqdn(origin);
        let serial = params.serial_incrementer.next_at(0, now)?;

        let mut records = vec![
            ResourceRecord::Soa(SoaRecord {
                name: apex.clone(),
                ttl: params.soattl,
                mname: fqdn(&params.dns),
                rname: fqdn(&params.email_addr),
                serial,
                refresh: params.refresh,
                retry: params.retry,
                expire: params.expire,
                minimum: params.negttl,
            }),
            ResourceRecord::Ns {
                name: apex,
                ttl: params.nsttl,
                nameserver: fqdn(&params.dns),
            },
        ];

        let mut report = ReconcileReport {
            serial,
            serial_advanced: true,
            ..Default::default()
        };

        if let Some(address) = update.ip4 {
            records.push(ResourceRecord::A {
                name: update.hostname.clone(),
                ttl: params.ttl,
                address,
            });
            report.a = RecordChange::Appended;
        }

        if let Some(address) = update.ip6 {
            records.push(ResourceRecord::Aaaa {
                name: update.hostname.clone(),
                ttl: params.ttl,
                address,
            });
            report.aaaa = RecordChange::Appended;
        }

        Ok((Self::new(origin, records), report))
    }

    /// Fold `update` into the zone
    ///
    /// Records keep their order. The first SOA gets the next serial, the
    /// hostname's first A/AAAA record gets the new address in place, and
    /// missing A/AAAA records are appended with `default_ttl`. Further
    /// A/AAAA records for the hostname are dropped when a new address of
    /// that family is supplied. Everything else passes through untouched.
    ///
    /// # Errors
    ///
    /// [`ZoneError::MissingSoa`] if the zone has no SOA record.
    pub fn reconcile(
        self,
        update: &UpdateRequest,
        policy: SerialPolicy,
        default_ttl: u32,
        now: DateTime<Utc>,
    ) -> Result<(Self, ReconcileReport), ZoneError> {
        let mut report = ReconcileReport::default();
        let mut soa_found = false;
        let mut a_found = false;
        let mut aaaa_found = false;
        let mut records = Vec::with_capacity(self.records.len() + 2);

        for record in self.records {
            match record {
                ResourceRecord::Soa(mut soa) if !soa_found => {
                    soa_found = true;
                    let (serial, advanced) = advance_serial(policy, soa.serial, now);
                    soa.serial = serial;
                    report.serial = serial;
                    report.serial_advanced = advanced;
                    records.push(ResourceRecord::Soa(soa));
                }
                ResourceRecord::Soa(soa) => {
                    warn!("zone {} has more than one SOA record, leaving {} as is", self.origin, soa.name);
                    records.push(ResourceRecord::Soa(soa));
                }
                ResourceRecord::A { name, ttl, address }
                    if names_match(&name, &update.hostname) =>
                {
                    if a_found {
                        if update.ip4.is_some() {
                            warn!("dropping duplicate A record {} -> {}", name, address);
                            report.duplicates_dropped += 1;
                            continue;
                        }
                        records.push(ResourceRecord::A { name, ttl, address });
                        continue;
                    }
                    a_found = true;
                    let address = match update.ip4 {
                        Some(new) if new != address => {
                            report.a = RecordChange::Rewritten;
                            new
                        }
                        _ => {
                            report.a = RecordChange::Unchanged;
                            address
                        }
                    };
                    records.push(ResourceRecord::A { name, ttl, address });
                }
                ResourceRecord::Aaaa { name, ttl, address }
                    if names_match(&name, &update.hostname) =>
                {
                    if aaaa_found {
                        if update.ip6.is_some() {
                            warn!("dropping duplicate AAAA record {} -> {}", name, address);
                            report.duplicates_dropped += 1;
                            continue;
                        }
                        records.push(ResourceRecord::Aaaa { name, ttl, address });
                        continue;
                    }
                    aaaa_found = true;
                    let address = match update.ip6 {
                        Some(new) if new != address => {
                            report.aaaa = RecordChange::Rewritten;
                            new
                        }
                        _ => {
                            report.aaaa = RecordChange::Unchanged;
                            address
                        }
                    };
                    records.push(ResourceRecord::Aaaa { name, ttl, address });
                }
                other => records.push(other),
            }
        }

        if !soa_found {
            return Err(ZoneError::MissingSoa(self.origin));
        }

        if let (false, Some(address)) = (a_found, update.ip4) {
            info!("adding new A record {} -> {}", update.hostname, address);
            records.push(ResourceRecord::A {
                name: update.hostname.clone(),
                ttl: default_ttl,
                address,
            });
            report.a = RecordChange::Appended;
        }

        if let (false, Some(address)) = (aaaa_found, update.ip6) {
            info!("adding new AAAA record {} -> {}", update.hostname, address);
            records.push(ResourceRecord::Aaaa {
                name: update.hostname.clone(),
                ttl: default_ttl,
                address,
            });
            report.aaaa = RecordChange::Appended;
        }

        Ok((
            Self {
                origin: self.origin,
                records,
            },
            report,
        ))
    }

    /// Generate master file text, one record per line
    ///
    /// Owner names are written fully qualified. An `$ORIGIN` line is emitted
    /// only ahead of opaque records read under a different origin, so that
    /// relative names in their data keep their meaning.
    pub fn to_zone_file(&self) -> String {
        let mut zone_file = String::new();
        let mut origin = self.origin.as_str();

        for record in &self.records {
            if let ResourceRecord::Opaque(opaque) = record {
                if !names_match(&opaque.origin, origin) {
                    zone_file.push_str(&format!("$ORIGIN {}\n", opaque.origin));
                    origin = &opaque.origin;
                }
            }
            zone_file.push_str(&record.to_string());
            zone_file.push('\n');
        }

        zone_file
    }
}
