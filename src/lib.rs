// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! dyndnsd - dynamic DNS updates for a master zone file
//!
//! A lightweight library and server that accepts dyndns2-style update
//! requests and folds them into a zone file on disk, ready to be served by an
//! authoritative nameserver such as BIND9.
//!
//! # Features
//!
//! - `GET /nic/update` with `hostname`, `myip` and `myip6` parameters
//! - Client address fallback from `X-Forwarded-For` or the connection
//! - Tolerant zone file parsing that preserves unrelated records
//! - SOA serial policies: Unix epoch seconds or `YYYYMMDDnn`
//! - Zone synthesis when no zone file exists yet
//! - Serialized, atomic zone file updates
//! - Optional post-update command (e.g. `rndc reload`)
//! - Prometheus metrics integration
//!
//! # Usage
//!
//! ## As a Library
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use dyndnsd::{SerialPolicy, UpdateRequest, Zone};
//!
//! let content = "\
//! $ORIGIN zig.zag.
//! @ 1800 IN SOA ns.zig.zag. hostmaster.zig.zag. 2024060100 900 300 86400 900
//! home 300 IN A 192.0.2.1
//! ";
//!
//! let (zone, errors) = Zone::parse(content, "zig.zag");
//! assert!(errors.is_empty());
//!
//! let update = UpdateRequest {
//!     hostname: "home.zig.zag.".to_string(),
//!     ip4: Some("198.51.100.7".parse().unwrap()),
//!     ip6: None,
//! };
//! let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
//! let (zone, report) = zone
//!     .reconcile(&update, SerialPolicy::DateCounter, 300, now)
//!     .unwrap();
//!
//! assert_eq!(report.serial, 2024060101);
//! assert!(zone.to_zone_file().contains("198.51.100.7"));
//! ```
//!
//! ## As a Binary
//!
//! ```bash
//! cargo install dyndnsd
//! DYNDNSD_CONFIG=/etc/dyndnsd/config.toml dyndnsd
//! ```

pub mod config;
pub mod hook;
pub mod metrics;
pub mod middleware;
pub mod nic;
pub mod records;
pub mod resolver;
pub mod serial;
pub mod types;
pub mod updater;
pub mod zone_parser;
pub mod zones;

// Re-export commonly used types

// Configuration
pub use config::{Config, ConfigError, ZoneFileParams};

// Error types
pub use types::{ApiError, AppState, ErrorResponse};

// Zone model
pub use records::{DnsClass, ResourceRecord, SoaRecord};
pub use serial::{SerialError, SerialPolicy};
pub use zones::{ReconcileReport, RecordChange, Zone, ZoneError};

// Update pipeline
pub use resolver::{ResolveError, UpdateRequest};
pub use updater::{UpdateOutcome, ZoneFileUpdater};

#[cfg(test)]
mod records_test;
#[cfg(test)]
mod types_test;
#[cfg(test)]
mod zones_test;
