//! Authoritative server clock access

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

/// Source of the authoritative server wall-clock time.
///
/// This is the single I/O seam of the timer core: it is consulted once per
/// process to measure the clock offset, after which all reads are served
/// from the cached offset.
#[async_trait]
pub trait ServerClock: Send + Sync {
    /// Fetch the server's current time, normalized to UTC
    async fn server_time(&self) -> Result<DateTime<Utc>, String>;
}

/// Server clock fetched from an upstream HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpServerClock {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpServerClock {
    /// Create a clock that queries the given endpoint URL
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ServerClock for HttpServerClock {
    async fn server_time(&self) -> Result<DateTime<Utc>, String> {
        debug!("Fetching server time from {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| format!("Server time request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!(
                "Server time endpoint returned status {}",
                response.status()
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read server time response: {}", e))?;

        parse_server_time(&body)
    }
}

/// Local fallback clock, used when no upstream endpoint is configured.
/// The measured offset is then effectively zero.
#[derive(Debug, Clone, Default)]
pub struct SystemServerClock;

#[async_trait]
impl ServerClock for SystemServerClock {
    async fn server_time(&self) -> Result<DateTime<Utc>, String> {
        Ok(Utc::now())
    }
}

/// Parse a server-supplied datetime string as UTC.
///
/// Accepts RFC 3339 or the bare `YYYY-MM-DD HH:MM:SS[.fff]` form, with or
/// without surrounding JSON quotes.
pub fn parse_server_time(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim().trim_matches('"');

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("Unrecognized server time '{}': {}", trimmed, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_rfc3339_with_timezone() {
        let parsed = parse_server_time("2026-08-23T10:15:30+02:00").unwrap();
        assert_eq!(parsed.hour(), 8);
        assert_eq!(parsed.minute(), 15);
    }

    #[test]
    fn parses_bare_datetime_as_utc() {
        let parsed = parse_server_time("2026-08-23 10:15:30").unwrap();
        assert_eq!(parsed.hour(), 10);
        assert_eq!(parsed.second(), 30);
    }

    #[test]
    fn parses_json_quoted_datetime() {
        let parsed = parse_server_time("\"2026-08-23 10:15:30.250\"").unwrap();
        assert_eq!(parsed.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_server_time("not a time").is_err());
    }

    #[tokio::test]
    async fn system_clock_tracks_local_now() {
        let clock = SystemServerClock;
        let fetched = clock.server_time().await.unwrap();
        let gap = (Utc::now() - fetched).num_milliseconds().abs();
        assert!(gap < 1000);
    }
}
