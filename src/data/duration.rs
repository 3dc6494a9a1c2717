use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Suffix to nanoseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
];

/// Uptime units, most significant first.
const UPTIME_UNITS: &[(&str, u64)] = &[("days", 86_400), ("hours", 3_600), ("m", 60), ("s", 1)];

/// Number of nonzero uptime units kept in the display string.
const UPTIME_GRANULARITY: usize = 3;

/// Parse interval strings like "2", "2.5s", "500ms".
///
/// A bare number is read as seconds.
pub fn parse_interval(s: &str) -> Result<Duration> {
    let s = s.trim();

    if let Ok(secs) = s.parse::<f64>() {
        return secs_to_duration(s, secs);
    }

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.trim().parse()?;
            return secs_to_duration(s, val * multiplier / 1_000_000_000.0);
        }
    }

    bail!("Unknown interval format: {}", s)
}

fn secs_to_duration(raw: &str, secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        bail!("Interval must be a non-negative number: {}", raw);
    }
    Duration::try_from_secs_f64(secs).with_context(|| format!("Interval out of range: {}", raw))
}

/// Format an uptime in seconds for display, e.g. `90125` -> `"1 day, 1 hour, 2 m"`.
///
/// Zero-valued units are skipped and a unit name is singular only when its
/// value is exactly 1. A zero uptime yields an empty string.
pub fn format_uptime(seconds: u64) -> String {
    let mut remaining = seconds;
    let mut parts = Vec::new();

    for (name, unit) in UPTIME_UNITS {
        let value = remaining / unit;
        if value == 0 {
            continue;
        }
        remaining -= value * unit;

        let name = if value == 1 && name.len() > 1 {
            name.strip_suffix('s').unwrap_or(name)
        } else {
            name
        };
        parts.push(format!("{} {}", value, name));
    }

    parts.truncate(UPTIME_GRANULARITY);
    parts.join(", ")
}
