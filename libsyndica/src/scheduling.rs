//! Schedule-time parsing for post scheduling
//!
//! Accepts relative durations ("30m", "2 hours"), natural language
//! ("tomorrow", "next friday 10am") and absolute RFC 3339 timestamps
//! ("2026-09-01T10:00:00Z").

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};

use crate::error::{Result, SyndicaError};

/// Parse a schedule string into a UTC instant.
///
/// # Errors
///
/// Returns an error if the string is empty or matches no supported format.
pub fn parse_schedule(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(SyndicaError::InvalidInput(
            "Schedule string cannot be empty".to_string(),
        ));
    }

    if let Ok(dt) = parse_absolute(input) {
        return Ok(dt);
    }

    if let Ok(duration) = parse_duration(input) {
        return Ok(Utc::now() + duration);
    }

    if let Ok(dt) = parse_natural_language(input) {
        return Ok(dt);
    }

    Err(SyndicaError::InvalidInput(format!(
        "Could not parse schedule string: {}",
        input
    )))
}

/// Parse and require a future instant, as scheduling demands.
pub fn parse_future_schedule(input: &str) -> Result<DateTime<Utc>> {
    let dt = parse_schedule(input)?;
    if dt <= Utc::now() {
        return Err(SyndicaError::InvalidInput(format!(
            "Scheduled time must be in the future: {}",
            dt.to_rfc3339()
        )));
    }
    Ok(dt)
}

fn parse_absolute(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Naive "YYYY-MM-DD HH:MM[:SS]" is interpreted as UTC
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(SyndicaError::InvalidInput(format!(
        "Not an absolute timestamp: {}",
        input
    )))
}

fn parse_duration(input: &str) -> Result<Duration> {
    if let Ok(std_duration) = humantime::parse_duration(input) {
        let seconds = std_duration.as_secs() as i64;
        return Duration::try_seconds(seconds)
            .ok_or_else(|| SyndicaError::InvalidInput("Duration out of range".to_string()));
    }

    Err(SyndicaError::InvalidInput(format!(
        "Could not parse duration: {}",
        input
    )))
}

fn parse_natural_language(input: &str) -> Result<DateTime<Utc>> {
    chrono_english::parse_date_string(input, Utc::now(), chrono_english::Dialect::Us)
        .map_err(|e| SyndicaError::InvalidInput(format!("Could not parse time: {}", e)))
}
