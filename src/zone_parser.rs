// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone file parser
//!
//! This module reads RFC 1035 master file text into an ordered list of
//! [`ResourceRecord`]s. Lexing is done with nom; record interpretation is a
//! small hand-written pass over the tokens of each logical entry.
//!
//! Parsing is tolerant: a malformed entry is logged, reported in
//! [`ParsedZone::errors`] and skipped, and parsing carries on with the next one.
//!
//! # Examples
//!
//! ```rust
//! use dyndnsd::zone_parser::parse_zone;
//!
//! let text = "@ 1800 IN SOA ns.zig.zag. hostmaster.zig.zag. 1 900 300 86400 900\n\
//!             home 300 IN A 203.0.113.5\n";
//! let parsed = parse_zone(text, "zig.zag");
//! assert_eq!(parsed.records.len(), 2);
//! assert_eq!(parsed.records[1].name(), "home.zig.zag.");
//! ```

use std::net::{Ipv4Addr, Ipv6Addr};

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, none_of, one_of},
    combinator::{all_consuming, map, recognize, value},
    multi::{many0, many1},
    sequence::{delimited, pair, preceded},
    IResult,
};
use thiserror::Error;
use tracing::warn;

use crate::metrics;
use crate::records::{fqdn, DnsClass, OpaqueRecord, ResourceRecord, SoaRecord};

/// TTL applied when neither `$TTL` nor an earlier record supplies one
pub const DEFAULT_TTL: u32 = 3600;

/// A malformed zone file entry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ZoneParseError {
    /// Line on which the entry starts
    pub line: usize,
    pub message: String,
}

/// Result of parsing a zone file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedZone {
    /// Records in file order
    pub records: Vec<ResourceRecord>,
    /// Entries that were skipped
    pub errors: Vec<ZoneParseError>,
}

// ========== Lexer ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    Open,
    Close,
    Newline,
}

/// Skip blanks and `;` comments, stopping at the end of the line
fn blank(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((
            value((), take_while1(|c: char| c == ' ' || c == '\t' || c == '\r')),
            value((), pair(char(';'), take_while(|c: char| c != '\n'))),
        ))),
    )(input)
}

/// Parse a quoted string, keeping the quotes: "v=spf1 -all"
///
/// A quoted string ends at the line: an unescaped newline before the
/// closing quote makes it unterminated.
pub(crate) fn quoted(input: &str) -> IResult<&str, &str> {
    recognize(delimited(
        char('"'),
        many0(alt((preceded(char('\\'), none_of("\n")), none_of("\\\"\n")))),
        char('"'),
    ))(input)
}

/// Parse an unquoted word, honoring backslash escapes
pub(crate) fn bare(input: &str) -> IResult<&str, &str> {
    recognize(many1(alt((
        recognize(preceded(char('\\'), none_of("\n"))),
        take_while1(|c: char| {
            !c.is_whitespace() && !matches!(c, '"' | '(' | ')' | ';' | '\\')
        }),
    ))))(input)
}

fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        value(Token::Newline, char('\n')),
        value(Token::Open, char('(')),
        value(Token::Close, char(')')),
        map(quoted, Token::Word),
        map(bare, Token::Word),
    ))(input)
}

/// One logical zone file entry: a directive or a record, possibly spanning
/// several physical lines inside parentheses
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry<'a> {
    line: usize,
    /// The entry started with whitespace, so it has no owner field
    indented: bool,
    tokens: Vec<&'a str>,
    error: Option<String>,
}

impl<'a> Entry<'a> {
    fn new(line: usize, rest: &str) -> Self {
        Self {
            line,
            indented: rest.starts_with([' ', '\t']),
            tokens: Vec::new(),
            error: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.error.is_none()
    }

    fn fail(&mut self, message: &str) {
        if self.error.is_none() {
            self.error = Some(message.to_string());
        }
    }
}

/// Split zone text into logical entries
fn split_entries(content: &str) -> Vec<Entry<'_>> {
    let mut entries = Vec::new();
    let mut line = 1;
    let mut depth = 0usize;
    let mut current = Entry::new(line, content);
    let mut input = content;

    loop {
        if let Ok((rest, ())) = blank(input) {
            input = rest;
        }
        if input.is_empty() {
            break;
        }

        match token(input) {
            Ok((rest, Token::Newline)) => {
                input = rest;
                line += 1;
                if depth == 0 {
                    let finished = std::mem::replace(&mut current, Entry::new(line, rest));
                    if !finished.is_empty() {
                        entries.push(finished);
                    }
                }
            }
            Ok((rest, Token::Open)) => {
                depth += 1;
                input = rest;
            }
            Ok((rest, Token::Close)) => {
                if depth == 0 {
                    current.fail("unbalanced ')'");
                } else {
                    depth -= 1;
                }
                input = rest;
            }
            Ok((rest, Token::Word(word))) => {
                current.tokens.push(word);
                input = rest;
            }
            Err(_) => {
                if input.starts_with('"') {
                    current.fail("unterminated quoted string");
                } else {
                    current.fail("dangling escape character");
                }
                input = input.split_once('\n').map_or("", |(_, rest)| rest);
                line += 1;
                depth = 0;
                let finished = std::mem::replace(&mut current, Entry::new(line, input));
                entries.push(finished);
            }
        }
    }

    if depth > 0 {
        current.fail("unbalanced '('");
    }
    if !current.is_empty() {
        entries.push(current);
    }

    entries
}

// ========== Field Parsers ==========

/// Parse a TTL, with or without unit suffixes: 3600, 1h, 1h30m, 2W
pub fn parse_ttl(s: &str) -> Option<u32> {
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse().ok();
    }

    let units: IResult<&str, Vec<(&str, char)>> =
        all_consuming(many1(pair(digit1, one_of("sSmMhHdDwW"))))(s);
    let (_, units) = units.ok()?;

    units.into_iter().try_fold(0u32, |total, (digits, unit)| {
        let amount: u32 = digits.parse().ok()?;
        let scale = match unit.to_ascii_lowercase() {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            'd' => 86_400,
            _ => 604_800,
        };
        total.checked_add(amount.checked_mul(scale)?)
    })
}

/// Make `name` absolute relative to `origin` (which must end with a dot)
pub fn absolute_name(name: &str, origin: &str) -> String {
    if name == "@" {
        origin.to_string()
    } else if name.ends_with('.') && !name.ends_with("\\.") {
        name.to_string()
    } else if origin == "." {
        format!("{}.", name)
    } else {
        format!("{}.{}", name, origin)
    }
}

fn is_type_mnemonic(token: &str) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

// ========== Record Parser ==========

struct ParserState {
    origin: String,
    /// Value of the last `$TTL` directive
    default_ttl: Option<u32>,
    /// Last TTL given explicitly on a record
    last_ttl: Option<u32>,
    last_owner: Option<String>,
}

impl ParserState {
    fn ttl_or_default(&self, explicit: Option<u32>) -> u32 {
        explicit
            .or(self.default_ttl)
            .or(self.last_ttl)
            .unwrap_or(DEFAULT_TTL)
    }
}

fn parse_directive(tokens: &[&str], state: &mut ParserState) -> Result<(), String> {
    let directive = tokens[0].to_ascii_uppercase();
    match directive.as_str() {
        "$ORIGIN" => {
            let name = tokens.get(1).ok_or("$ORIGIN requires a domain name")?;
            state.origin = fqdn(&absolute_name(name, &state.origin));
            Ok(())
        }
        "$TTL" => {
            let ttl = tokens.get(1).ok_or("$TTL requires a value")?;
            state.default_ttl = Some(parse_ttl(ttl).ok_or_else(|| format!("invalid TTL: {}", ttl))?);
            Ok(())
        }
        _ => Err(format!("unsupported directive: {}", tokens[0])),
    }
}

fn parse_soa(name: String, ttl: u32, rdata: &[&str], origin: &str) -> Result<ResourceRecord, String> {
    if rdata.len() != 7 {
        return Err(format!("SOA record needs 7 fields, found {}", rdata.len()));
    }

    let serial = rdata[2]
        .parse::<u32>()
        .map_err(|_| format!("invalid SOA serial: {}", rdata[2]))?;
    let timer = |value: &str, field: &str| {
        parse_ttl(value).ok_or_else(|| format!("invalid SOA {}: {}", field, value))
    };

    Ok(ResourceRecord::Soa(SoaRecord {
        name,
        ttl,
        mname: absolute_name(rdata[0], origin),
        rname: absolute_name(rdata[1], origin),
        serial,
        refresh: timer(rdata[3], "refresh")?,
        retry: timer(rdata[4], "retry")?,
        expire: timer(rdata[5], "expire")?,
        minimum: timer(rdata[6], "minimum")?,
    }))
}

fn single_field<'a>(rtype: &str, rdata: &[&'a str]) -> Result<&'a str, String> {
    match rdata {
        [value] => Ok(*value),
        _ => Err(format!(
            "{} record needs exactly 1 field, found {}",
            rtype,
            rdata.len()
        )),
    }
}

fn parse_record(entry: &Entry<'_>, state: &mut ParserState) -> Result<ResourceRecord, String> {
    let (owner, mut rest) = if entry.indented {
        let owner = state
            .last_owner
            .clone()
            .ok_or("record has no owner and no previous owner to inherit")?;
        (owner, entry.tokens.as_slice())
    } else {
        (
            absolute_name(entry.tokens[0], &state.origin),
            &entry.tokens[1..],
        )
    };

    // TTL and class are both optional and may come in either order
    let mut ttl = None;
    let mut class = None;
    while let Some(field) = rest.first() {
        if ttl.is_none() && field.starts_with(|c: char| c.is_ascii_digit()) {
            ttl = Some(parse_ttl(field).ok_or_else(|| format!("invalid TTL: {}", field))?);
        } else if class.is_none() && DnsClass::parse(field).is_some() {
            class = DnsClass::parse(field);
        } else {
            break;
        }
        rest = &rest[1..];
    }

    let (rtype, rdata) = rest.split_first().ok_or("missing record type")?;
    if !is_type_mnemonic(rtype) {
        return Err(format!("invalid record type: {}", rtype));
    }
    let rtype = rtype.to_ascii_uppercase();

    if ttl.is_some() {
        state.last_ttl = ttl;
    }
    let ttl = state.ttl_or_default(ttl);
    let class = class.unwrap_or_default();
    state.last_owner = Some(owner.clone());

    let origin = state.origin.as_str();
    let record = match (class, rtype.as_str()) {
        (DnsClass::IN, "SOA") => parse_soa(owner, ttl, rdata, origin)?,
        (DnsClass::IN, "NS") => ResourceRecord::Ns {
            name: owner,
            ttl,
            nameserver: absolute_name(single_field("NS", rdata)?, origin),
        },
        (DnsClass::IN, "A") => {
            let value = single_field("A", rdata)?;
            ResourceRecord::A {
                name: owner,
                ttl,
                address: value
                    .parse::<Ipv4Addr>()
                    .map_err(|_| format!("invalid IPv4 address: {}", value))?,
            }
        }
        (DnsClass::IN, "AAAA") => {
            let value = single_field("AAAA", rdata)?;
            ResourceRecord::Aaaa {
                name: owner,
                ttl,
                address: value
                    .parse::<Ipv6Addr>()
                    .map_err(|_| format!("invalid IPv6 address: {}", value))?,
            }
        }
        _ => ResourceRecord::Opaque(OpaqueRecord {
            name: owner,
            ttl,
            class,
            rtype,
            rdata: rdata.join(" "),
            origin: state.origin.clone(),
        }),
    };

    Ok(record)
}

/// Parse zone file text for the zone `origin`
///
/// Every malformed entry is logged at `warn` and collected in
/// [`ParsedZone::errors`]; it never aborts the parse.
pub fn parse_zone(content: &str, origin: &str) -> ParsedZone {
    let mut state = ParserState {
        origin: fqdn(origin),
        default_ttl: None,
        last_ttl: None,
        last_owner: None,
    };
    let mut parsed = ParsedZone::default();

    for entry in split_entries(content) {
        let result = match &entry.error {
            Some(message) => Err(message.clone()),
            None if entry.tokens.is_empty() => continue,
            None if !entry.indented && entry.tokens[0].starts_with('$') => {
                parse_directive(&entry.tokens, &mut state).map(|()| None)
            }
            None => parse_record(&entry, &mut state).map(Some),
        };

        match result {
            Ok(Some(record)) => parsed.records.push(record),
            Ok(None) => {}
            Err(message) => {
                warn!(line = entry.line, "skipping malformed zone entry: {}", message);
                metrics::record_parse_error();
                parsed.errors.push(ZoneParseError {
                    line: entry.line,
                    message,
                });
            }
        }
    }

    parsed
}
