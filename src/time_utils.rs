// SPDX-License-Identifier: MIT

//! Shared helpers for date/time handling.

use chrono::{NaiveDate, NaiveTime, SecondsFormat, Utc};

/// Current UTC timestamp as RFC3339 with a `Z` suffix.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Today's calendar date in UTC. Trip date guards compare at day
/// granularity, so this is the only clock the state machine sees.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Check a departure time string against the "HH:MM" wire format.
pub fn is_valid_departure_time(value: &str) -> bool {
    value.len() == 5 && NaiveTime::parse_from_str(value, "%H:%M").is_ok()
}
