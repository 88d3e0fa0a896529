// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for zones module

use super::zones::*;
use crate::config::ZoneFileParams;
use crate::records::ResourceRecord;
use crate::resolver::UpdateRequest;
use crate::serial::SerialPolicy;
use chrono::{DateTime, TimeZone, Utc};

const ZONE: &str = "\
$ORIGIN zig.zag.
$TTL 3600
@       IN SOA ns.zig.zag. hostmaster.zig.zag. 2024060100 900 300 86400 900
@       IN NS  ns.zig.zag.
@       IN MX  10 mail
home    300 IN A 192.0.2.1
office  300 IN A 192.0.2.2
www     IN CNAME home
";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn zone() -> Zone {
    let (zone, errors) = Zone::parse(ZONE, "zig.zag");
    assert!(errors.is_empty(), "errors: {:?}", errors);
    zone
}

fn update(ip4: Option<&str>, ip6: Option<&str>) -> UpdateRequest {
    UpdateRequest {
        hostname: "home.zig.zag.".to_string(),
        ip4: ip4.map(|ip| ip.parse().unwrap()),
        ip6: ip6.map(|ip| ip.parse().unwrap()),
    }
}

fn reconcile(zone: Zone, update: &UpdateRequest) -> (Zone, ReconcileReport) {
    zone.reconcile(update, SerialPolicy::DateCounter, 300, now())
        .unwrap()
}

#[test]
fn test_reconcile_rewrites_in_place() {
    let before = zone();
    let (after, report) = reconcile(before.clone(), &update(Some("198.51.100.7"), None));

    assert_eq!(report.serial, 2024060101);
    assert!(report.serial_advanced);
    assert_eq!(report.a, RecordChange::Rewritten);
    assert_eq!(report.aaaa, RecordChange::Absent);

    assert_eq!(after.records.len(), before.records.len());
    assert_eq!(
        after.records[3],
        ResourceRecord::A {
            name: "home.zig.zag.".to_string(),
            ttl: 300,
            address: "198.51.100.7".parse().unwrap(),
        }
    );
    // everything but the SOA and the updated record is untouched
    for index in [1, 2, 4, 5] {
        assert_eq!(after.records[index], before.records[index]);
    }
    assert_eq!(after.soa().unwrap().serial, 2024060101);
}

#[test]
fn test_reconcile_is_idempotent() {
    let before = zone();
    let (after, report) = reconcile(before.clone(), &update(Some("192.0.2.1"), None));

    assert_eq!(report.a, RecordChange::Unchanged);
    assert_eq!(after.records.len(), before.records.len());
    for (index, (old, new)) in before.records.iter().zip(&after.records).enumerate() {
        if index == 0 {
            assert_ne!(old, new);
        } else {
            assert_eq!(old, new);
        }
    }
}

#[test]
fn test_reconcile_appends_missing_family() {
    let before = zone();
    let (after, report) = reconcile(before.clone(), &update(None, Some("2001:db8::7")));

    assert_eq!(report.a, RecordChange::Unchanged);
    assert_eq!(report.aaaa, RecordChange::Appended);
    assert_eq!(after.records.len(), before.records.len() + 1);
    assert_eq!(after.records[3], before.records[3]);
    assert_eq!(
        after.records.last(),
        Some(&ResourceRecord::Aaaa {
            name: "home.zig.zag.".to_string(),
            ttl: 300,
            address: "2001:db8::7".parse().unwrap(),
        })
    );
}

#[test]
fn test_reconcile_appends_new_host() {
    let mut request = update(Some("198.51.100.9"), Some("2001:db8::9"));
    request.hostname = "laptop.zig.zag.".to_string();

    let (after, report) = reconcile(zone(), &request);
    assert_eq!(report.a, RecordChange::Appended);
    assert_eq!(report.aaaa, RecordChange::Appended);

    let tail: Vec<&str> = after.records[6..].iter().map(|r| r.rtype()).collect();
    assert_eq!(tail, vec!["A", "AAAA"]);
    assert!(after.records[6..].iter().all(|r| r.name() == "laptop.zig.zag."));
}

#[test]
fn test_reconcile_matches_owner_case_insensitively() {
    let mut request = update(Some("198.51.100.7"), None);
    request.hostname = "HOME.Zig.Zag.".to_string();

    let (after, report) = reconcile(zone(), &request);
    assert_eq!(report.a, RecordChange::Rewritten);
    assert_eq!(after.records.len(), 6);
}

#[test]
fn test_reconcile_serial_overflow_keeps_serial() {
    let text = ZONE.replace("2024060100", "2024060199");
    let (zone, _) = Zone::parse(&text, "zig.zag");

    let (after, report) = reconcile(zone, &update(Some("198.51.100.7"), None));
    assert_eq!(report.serial, 2024060199);
    assert!(!report.serial_advanced);
    assert_eq!(report.a, RecordChange::Rewritten);
    assert_eq!(after.soa().unwrap().serial, 2024060199);
}

#[test]
fn test_reconcile_new_day_resets_counter() {
    let text = ZONE.replace("2024060100", "2024053199");
    let (zone, _) = Zone::parse(&text, "zig.zag");

    let (_, report) = reconcile(zone, &update(Some("198.51.100.7"), None));
    assert_eq!(report.serial, 2024060100);
    assert!(report.serial_advanced);
}

#[test]
fn test_reconcile_epoch_serial() {
    let (_, report) = zone()
        .reconcile(&update(Some("198.51.100.7"), None), SerialPolicy::Epoch, 300, now())
        .unwrap();
    assert_eq!(report.serial, now().timestamp() as u32);
}

#[test]
fn test_reconcile_requires_soa() {
    let (zone, _) = Zone::parse("home 300 IN A 192.0.2.1\n", "zig.zag");
    let err = zone
        .reconcile(&update(Some("198.51.100.7"), None), SerialPolicy::Epoch, 300, now())
        .unwrap_err();
    assert!(matches!(err, ZoneError::MissingSoa(ref origin) if origin == "zig.zag."));
}

#[test]
fn test_reconcile_only_first_soa_managed() {
    let text = format!(
        "{}@ IN SOA ns2.zig.zag. hostmaster.zig.zag. 7 900 300 86400 900\n",
        ZONE
    );
    let (zone, _) = Zone::parse(&text, "zig.zag");

    let (after, _) = reconcile(zone, &update(Some("198.51.100.7"), None));
    match after.records.last() {
        Some(ResourceRecord::Soa(soa)) => assert_eq!(soa.serial, 7),
        other => panic!("expected second SOA, got {:?}", other),
    }
    assert_eq!(after.soa().unwrap().serial, 2024060101);
}

#[test]
fn test_reconcile_drops_duplicate_addresses() {
    let text = format!("{}home 300 IN A 192.0.2.99\n", ZONE);
    let (zone, _) = Zone::parse(&text, "zig.zag");
    let count = zone.records.len();

    // without a new IPv4 address, duplicates are kept
    let (kept, report) = reconcile(zone.clone(), &update(None, Some("2001:db8::7")));
    assert_eq!(kept.records.len(), count + 1);
    assert_eq!(report.duplicates_dropped, 0);

    let (after, report) = reconcile(zone, &update(Some("198.51.100.7"), None));
    assert_eq!(after.records.len(), count - 1);
    assert_eq!(report.duplicates_dropped, 1);
    let home_a: Vec<_> = after
        .records
        .iter()
        .filter(|r| r.rtype() == "A" && r.is_owned_by("home.zig.zag."))
        .collect();
    assert_eq!(home_a.len(), 1);
}

#[test]
fn test_bootstrap_zone() {
    let params = ZoneFileParams {
        dns: "ns.zig.zag".to_string(),
        email_addr: "hostmaster.zig.zag.".to_string(),
        serial_incrementer: SerialPolicy::DateCounter,
        ..Default::default()
    };

    let (zone, report) =
        Zone::bootstrap("zig.zag", &params, &update(Some("203.0.113.5"), None), now()).unwrap();

    assert_eq!(report.serial, 2024060100);
    assert!(report.serial_advanced);
    assert_eq!(report.a, RecordChange::Appended);
    assert_eq!(report.aaaa, RecordChange::Absent);

    assert_eq!(zone.origin, "zig.zag.");
    assert_eq!(zone.records.len(), 3);

    match &zone.records[0] {
        ResourceRecord::Soa(soa) => {
            assert_eq!(soa.name, "zig.zag.");
            assert_eq!(soa.ttl, 1800);
            assert_eq!(soa.mname, "ns.zig.zag.");
            assert_eq!(soa.rname, "hostmaster.zig.zag.");
            assert_eq!(soa.serial, 2024060100);
            assert_eq!(soa.refresh, 900);
            assert_eq!(soa.retry, 300);
            assert_eq!(soa.expire, 86400);
            assert_eq!(soa.minimum, 900);
        }
        other => panic!("expected SOA, got {:?}", other),
    }
    assert_eq!(
        zone.records[1],
        ResourceRecord::Ns {
            name: "zig.zag.".to_string(),
            ttl: 1800,
            nameserver: "ns.zig.zag.".to_string(),
        }
    );
    assert_eq!(
        zone.records[2],
        ResourceRecord::A {
            name: "home.zig.zag.".to_string(),
            ttl: 300,
            address: "203.0.113.5".parse().unwrap(),
        }
    );
}

#[test]
fn test_bootstrap_epoch_serial() {
    let params = ZoneFileParams::default();
    let (zone, report) = Zone::bootstrap(
        "zig.zag",
        &params,
        &update(Some("203.0.113.5"), Some("2001:db8::5")),
        now(),
    )
    .unwrap();

    assert_eq!(report.serial, now().timestamp() as u32);
    let types: Vec<&str> = zone.records.iter().map(|r| r.rtype()).collect();
    assert_eq!(types, vec!["SOA", "NS", "A", "AAAA"]);
}

#[test]
fn test_round_trip() {
    let params = ZoneFileParams::default();
    let (zone, _) = Zone::bootstrap(
        "zig.zag",
        &params,
        &update(Some("203.0.113.5"), Some("2001:db8::5")),
        now(),
    )
    .unwrap();

    let text = zone.to_zone_file();
    let (reparsed, errors) = Zone::parse(&text, "zig.zag");
    assert!(errors.is_empty());
    assert_eq!(reparsed.records, zone.records);
    assert_eq!(reparsed.to_zone_file(), text);
}

#[test]
fn test_to_zone_file_canonical_lines() {
    let text = zone().to_zone_file();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(
        lines[0],
        "zig.zag.\t3600\tIN\tSOA\tns.zig.zag. hostmaster.zig.zag. 2024060100 900 300 86400 900"
    );
    assert_eq!(lines[3], "home.zig.zag.\t300\tIN\tA\t192.0.2.1");
    // relative data of opaque records stays under the zone origin
    assert_eq!(lines[2], "zig.zag.\t3600\tIN\tMX\t10 mail");
    assert!(!text.contains("$ORIGIN"));
}

#[test]
fn test_to_zone_file_reemits_origin() {
    let text = "\
@ 1800 IN SOA ns hostmaster 1 900 300 86400 900
$ORIGIN lab.zig.zag.
www IN CNAME host
";
    let (zone, _) = Zone::parse(text, "zig.zag");
    let written = zone.to_zone_file();

    assert!(written.contains("$ORIGIN lab.zig.zag.\nwww.lab.zig.zag.\t1800\tIN\tCNAME\thost\n"));

    // the written text reads back to the same records
    let (reparsed, errors) = Zone::parse(&written, "zig.zag");
    assert!(errors.is_empty());
    assert_eq!(reparsed.records, zone.records);
}

#[test]
fn test_record_change_display() {
    assert_eq!(RecordChange::Absent.to_string(), "absent");
    assert_eq!(RecordChange::Unchanged.to_string(), "unchanged");
    assert_eq!(RecordChange::Rewritten.to_string(), "rewritten");
    assert_eq!(RecordChange::Appended.to_string(), "appended");
}
