// ABOUTME: Parses time and memory limits out of free-form limit labels.
// ABOUTME: "2 seconds" becomes 2000 ms, "256 megabytes" becomes 262144 KB.

use once_cell::sync::Lazy;
use regex::Regex;

static TIME_LIMIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?|\.\d+)\s*(?:seconds?|secs?|s)\b").expect("valid regex")
});

static MEMORY_LIMIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:megabytes?|mib|mb)\b").expect("valid regex")
});

/// Parses a time limit label into milliseconds.
///
/// Looks for a decimal number followed by a seconds unit ("s", "sec",
/// "seconds", any case) and returns `round(value * 1000)`.
/// Returns None when nothing matches.
pub fn parse_time_limit_ms(label: &str) -> Option<u32> {
    let caps = TIME_LIMIT.captures(label)?;
    let seconds: f64 = caps.get(1)?.as_str().parse().ok()?;
    let millis = (seconds * 1000.0).round();
    if millis.is_finite() && millis >= 0.0 && millis <= f64::from(u32::MAX) {
        Some(millis as u32)
    } else {
        None
    }
}

/// Parses a memory limit label into kilobytes.
///
/// Looks for an integer followed by a megabytes unit ("mb", "megabytes",
/// "MiB", any case) and returns `value * 1024`.
/// Returns None when nothing matches or the value overflows.
pub fn parse_memory_limit_kb(label: &str) -> Option<u64> {
    let caps = MEMORY_LIMIT.captures(label)?;
    let megabytes: u64 = caps.get(1)?.as_str().parse().ok()?;
    megabytes.checked_mul(1024)
}
