//! TTL short-form parsing: plain integer seconds, or `<n><unit>` with
//! unit in `s`/`m`/`h`/`d`.

use crate::error::{Error, Result};
use std::time::Duration;

/// Parse a TTL expression into a [`Duration`].
///
/// Accepts a bare integer (seconds) or a short form: `30s`, `5m`, `2h`,
/// `1d`.
pub fn parse_ttl(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::Validation("ttl cannot be empty".to_string()));
    }
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    let (digits, unit) = raw.split_at(raw.len() - 1);
    let n: u64 = digits
        .parse()
        .map_err(|_| Error::Validation(format!("invalid ttl: {raw:?}")))?;
    let secs = match unit {
        "s" => n,
        "m" => n * 60,
        "h" => n * 3600,
        "d" => n * 86_400,
        _ => return Err(Error::Validation(format!("invalid ttl unit in {raw:?}"))),
    };
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_seconds() {
        assert_eq!(parse_ttl("30").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn parses_short_forms() {
        assert_eq!(parse_ttl("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_ttl("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_ttl("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_ttl("1d").unwrap(), Duration::from_secs(86_400));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_ttl("").is_err());
        assert!(parse_ttl("five minutes").is_err());
        assert!(parse_ttl("10x").is_err());
    }
}
