// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for records module

use super::records::*;

fn soa() -> SoaRecord {
    SoaRecord {
        name: "zig.zag.".to_string(),
        ttl: 1800,
        mname: "ns.zig.zag.".to_string(),
        rname: "hostmaster.zig.zag.".to_string(),
        serial: 2024060100,
        refresh: 900,
        retry: 300,
        expire: 86400,
        minimum: 900,
    }
}

#[test]
fn test_dns_class_parse() {
    assert_eq!(DnsClass::parse("IN"), Some(DnsClass::IN));
    assert_eq!(DnsClass::parse("in"), Some(DnsClass::IN));
    assert_eq!(DnsClass::parse("Ch"), Some(DnsClass::CH));
    assert_eq!(DnsClass::parse("HS"), Some(DnsClass::HS));
    assert_eq!(DnsClass::parse("A"), None);
    assert_eq!(DnsClass::default(), DnsClass::IN);
}

#[test]
fn test_soa_display() {
    let record = ResourceRecord::Soa(soa());
    assert_eq!(
        record.to_string(),
        "zig.zag.\t1800\tIN\tSOA\tns.zig.zag. hostmaster.zig.zag. 2024060100 900 300 86400 900"
    );
}

#[test]
fn test_address_display() {
    let a = ResourceRecord::A {
        name: "home.zig.zag.".to_string(),
        ttl: 300,
        address: "198.51.100.7".parse().unwrap(),
    };
    assert_eq!(a.to_string(), "home.zig.zag.\t300\tIN\tA\t198.51.100.7");

    let aaaa = ResourceRecord::Aaaa {
        name: "home.zig.zag.".to_string(),
        ttl: 300,
        address: "2001:db8::7".parse().unwrap(),
    };
    assert_eq!(aaaa.to_string(), "home.zig.zag.\t300\tIN\tAAAA\t2001:db8::7");
}

#[test]
fn test_ns_display() {
    let ns = ResourceRecord::Ns {
        name: "zig.zag.".to_string(),
        ttl: 1800,
        nameserver: "ns.zig.zag.".to_string(),
    };
    assert_eq!(ns.to_string(), "zig.zag.\t1800\tIN\tNS\tns.zig.zag.");
}

#[test]
fn test_opaque_display() {
    let mx = ResourceRecord::Opaque(OpaqueRecord {
        name: "zig.zag.".to_string(),
        ttl: 3600,
        class: DnsClass::IN,
        rtype: "MX".to_string(),
        rdata: "10 mail".to_string(),
        origin: "zig.zag.".to_string(),
    });
    assert_eq!(mx.to_string(), "zig.zag.\t3600\tIN\tMX\t10 mail");

    let empty = ResourceRecord::Opaque(OpaqueRecord {
        name: "x.zig.zag.".to_string(),
        ttl: 60,
        class: DnsClass::CH,
        rtype: "TYPE65534".to_string(),
        rdata: String::new(),
        origin: "zig.zag.".to_string(),
    });
    assert_eq!(empty.to_string(), "x.zig.zag.\t60\tCH\tTYPE65534");
}

#[test]
fn test_record_accessors() {
    let record = ResourceRecord::Soa(soa());
    assert_eq!(record.name(), "zig.zag.");
    assert_eq!(record.ttl(), 1800);
    assert_eq!(record.rtype(), "SOA");

    let a = ResourceRecord::A {
        name: "Home.Zig.Zag.".to_string(),
        ttl: 300,
        address: "192.0.2.1".parse().unwrap(),
    };
    assert_eq!(a.rtype(), "A");
    assert!(a.is_owned_by("home.zig.zag."));
    assert!(a.is_owned_by("home.zig.zag"));
    assert!(!a.is_owned_by("office.zig.zag."));
}

#[test]
fn test_fqdn() {
    assert_eq!(fqdn("zig.zag"), "zig.zag.");
    assert_eq!(fqdn("zig.zag."), "zig.zag.");
}

#[test]
fn test_names_match() {
    assert!(names_match("HOME.zig.zag.", "home.ZIG.zag"));
    assert!(!names_match("home.zig.zag.", "home.zig.zag.example."));
}
