// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Resource record types handled by the zone engine
//!
//! Only the record kinds the updater actively manages are typed:
//! SOA, NS, A and AAAA in class IN. Everything else found in a zone file is
//! kept as an [`OpaqueRecord`] and written back with the same owner, type and
//! data.
//!
//! The [`std::fmt::Display`] implementation of [`ResourceRecord`] is the
//! canonical zone-file line used when a zone is written to disk.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// DNS class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DnsClass {
    #[default]
    IN, // Internet
    CS, // CSNET
    CH, // Chaos
    HS, // Hesiod
}

impl DnsClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DnsClass::IN => "IN",
            DnsClass::CS => "CS",
            DnsClass::CH => "CH",
            DnsClass::HS => "HS",
        }
    }

    /// Parse a class mnemonic, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "IN" => Some(DnsClass::IN),
            "CS" => Some(DnsClass::CS),
            "CH" => Some(DnsClass::CH),
            "HS" => Some(DnsClass::HS),
            _ => None,
        }
    }
}

impl fmt::Display for DnsClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start of Authority record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoaRecord {
    /// Owner name (the zone apex)
    pub name: String,
    pub ttl: u32,
    /// Primary nameserver
    pub mname: String,
    /// Admin mailbox in domain-name form (e.g., "hostmaster.example.com.")
    pub rname: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    /// Negative caching TTL
    pub minimum: u32,
}

/// A record of a type (or class) the updater never interprets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueRecord {
    pub name: String,
    pub ttl: u32,
    pub class: DnsClass,
    /// Upper-cased type mnemonic (e.g., "MX", "TXT", "TYPE65534")
    pub rtype: String,
    /// Record data tokens, joined with single spaces
    pub rdata: String,
    /// `$ORIGIN` in force where the record was read; relative names in
    /// `rdata` are relative to this
    pub origin: String,
}

/// A single resource record of a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRecord {
    Soa(SoaRecord),
    Ns {
        name: String,
        ttl: u32,
        nameserver: String,
    },
    A {
        name: String,
        ttl: u32,
        address: Ipv4Addr,
    },
    Aaaa {
        name: String,
        ttl: u32,
        address: Ipv6Addr,
    },
    Opaque(OpaqueRecord),
}

impl ResourceRecord {
    /// Fully-qualified owner name
    pub fn name(&self) -> &str {
        match self {
            ResourceRecord::Soa(soa) => &soa.name,
            ResourceRecord::Ns { name, .. }
            | ResourceRecord::A { name, .. }
            | ResourceRecord::Aaaa { name, .. } => name,
            ResourceRecord::Opaque(record) => &record.name,
        }
    }

    pub fn ttl(&self) -> u32 {
        match self {
            ResourceRecord::Soa(soa) => soa.ttl,
            ResourceRecord::Ns { ttl, .. }
            | ResourceRecord::A { ttl, .. }
            | ResourceRecord::Aaaa { ttl, .. } => *ttl,
            ResourceRecord::Opaque(record) => record.ttl,
        }
    }

    /// Type mnemonic
    pub fn rtype(&self) -> &str {
        match self {
            ResourceRecord::Soa(_) => "SOA",
            ResourceRecord::Ns { .. } => "NS",
            ResourceRecord::A { .. } => "A",
            ResourceRecord::Aaaa { .. } => "AAAA",
            ResourceRecord::Opaque(record) => &record.rtype,
        }
    }

    /// True if the record's owner is `hostname` (DNS names compare case-insensitively)
    pub fn is_owned_by(&self, hostname: &str) -> bool {
        names_match(self.name(), hostname)
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRecord::Soa(soa) => write!(
                f,
                "{}\t{}\tIN\tSOA\t{} {} {} {} {} {} {}",
                soa.name,
                soa.ttl,
                soa.mname,
                soa.rname,
                soa.serial,
                soa.refresh,
                soa.retry,
                soa.expire,
                soa.minimum
            ),
            ResourceRecord::Ns {
                name,
                ttl,
                nameserver,
            } => write!(f, "{}\t{}\tIN\tNS\t{}", name, ttl, nameserver),
            ResourceRecord::A { name, ttl, address } => {
                write!(f, "{}\t{}\tIN\tA\t{}", name, ttl, address)
            }
            ResourceRecord::Aaaa { name, ttl, address } => {
                write!(f, "{}\t{}\tIN\tAAAA\t{}", name, ttl, address)
            }
            ResourceRecord::Opaque(record) => {
                write!(
                    f,
                    "{}\t{}\t{}\t{}",
                    record.name, record.ttl, record.class, record.rtype
                )?;
                if !record.rdata.is_empty() {
                    write!(f, "\t{}", record.rdata)?;
                }
                Ok(())
            }
        }
    }
}

/// Append the root label if `name` is not already fully qualified
pub fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// Compare two domain names, ignoring ASCII case and a trailing root dot
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}
