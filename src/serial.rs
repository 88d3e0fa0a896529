// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! SOA serial number policies
//!
//! Two numbering schemes are supported, selected once at startup:
//!
//! - `epoch_s`: the serial is the current Unix time in seconds, truncated to 32 bits
//! - `iso8601`: the serial is `YYYYMMDDnn`, a UTC date followed by a two digit
//!   counter that restarts at `00` every day
//!
//! # Examples
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use dyndnsd::serial::SerialPolicy;
//!
//! let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
//! assert_eq!(SerialPolicy::DateCounter.next_at(2024060100, now).unwrap(), 2024060101);
//! assert_eq!(SerialPolicy::DateCounter.next_at(2024053199, now).unwrap(), 2024060100);
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Serial policy errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerialError {
    #[error("cannot increment iso8601 serial {0} past 99")]
    CounterExhausted(u32),

    #[error("date serial {0} does not fit in 32 bits")]
    OutOfRange(String),

    #[error("unknown serial incrementer: {0}")]
    UnknownPolicy(String),
}

/// Serial numbering scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum SerialPolicy {
    /// Unix timestamp in seconds
    #[default]
    #[serde(rename = "epoch_s")]
    Epoch,

    /// `YYYYMMDDnn` date plus daily counter
    #[serde(rename = "iso8601")]
    DateCounter,
}

impl SerialPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SerialPolicy::Epoch => "epoch_s",
            SerialPolicy::DateCounter => "iso8601",
        }
    }

    /// Compute the serial that follows `current`, using the current time
    pub fn next(&self, current: u32) -> Result<u32, SerialError> {
        self.next_at(current, Utc::now())
    }

    /// Compute the serial that follows `current` as of `now`
    ///
    /// # Errors
    ///
    /// - [`SerialError::CounterExhausted`] when an `iso8601` serial dated today
    ///   already ends in `99`; callers keep the old serial in that case
    /// - [`SerialError::OutOfRange`] when today's `YYYYMMDD00` exceeds `u32`
    pub fn next_at(&self, current: u32, now: DateTime<Utc>) -> Result<u32, SerialError> {
        match self {
            SerialPolicy::Epoch => Ok(now.timestamp() as u32),
            SerialPolicy::DateCounter => {
                let today = now.format("%Y%m%d").to_string();
                let serial = current.to_string();

                if !serial.starts_with(&today) {
                    let fresh = format!("{}00", today);
                    return fresh.parse().map_err(|_| SerialError::OutOfRange(fresh));
                }

                if serial.ends_with("99") {
                    return Err(SerialError::CounterExhausted(current));
                }

                current
                    .checked_add(1)
                    .ok_or_else(|| SerialError::OutOfRange(serial))
            }
        }
    }
}

impl fmt::Display for SerialPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SerialPolicy {
    type Err = SerialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "epoch_s" => Ok(SerialPolicy::Epoch),
            "iso8601" => Ok(SerialPolicy::DateCounter),
            other => Err(SerialError::UnknownPolicy(other.to_string())),
        }
    }
}
