//! The per-invocation run context.
//!
//! Every report header reads its `RUN_ID` and `STARTED_AT` from a
//! [`RunContext`] passed in by the caller. Nothing reads a process-wide
//! "current run" value.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Identity and start time of one ledger invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    run_id: String,
    started_at: DateTime<Utc>,
}

impl RunContext {
    /// A fresh context: now, with a random `run-YYYYMMDDTHHMMSSZ-xxxxxxxx` id.
    pub fn new() -> Self {
        Self::started_at(Utc::now())
    }

    /// A context starting at `started_at` with a random id suffix.
    pub fn started_at(started_at: DateTime<Utc>) -> Self {
        let suffix: u32 = rand::random();
        Self {
            run_id: format!("run-{}-{suffix:08x}", started_at.format("%Y%m%dT%H%M%SZ")),
            started_at,
        }
    }

    /// A fully caller-specified context, for reproducible reports.
    pub fn fixed(run_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn started_at_time(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// `STARTED_AT` as RFC 3339 with second precision and a `Z` suffix.
    pub fn started_at_str(&self) -> String {
        self.started_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// The `RUN_ID:` and `STARTED_AT:` header lines every report begins with.
    pub fn header_lines(&self) -> String {
        format!("RUN_ID: {}\nSTARTED_AT: {}\n", self.run_id, self.started_at_str())
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use evidence_ledger_core::RuleSet;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_run_id_format() {
        let ctx = RunContext::started_at(at());
        let id = ctx.run_id();
        assert!(id.starts_with("run-20260114T120000Z-"), "{id}");
        assert_eq!(id.len(), "run-20260114T120000Z-".len() + 8);
        assert!(id[id.len() - 8..].bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(ctx.started_at_str(), "2026-01-14T12:00:00Z");
    }

    #[test]
    fn test_headers_normalize_away() {
        let rules = RuleSet::standard().unwrap();
        let a = RunContext::started_at(at()).header_lines();
        let b = RunContext::new().header_lines();
        assert_ne!(a, b);
        assert_eq!(rules.normalize(&a), rules.normalize(&b));
    }

    #[test]
    fn test_fixed_context() {
        let ctx = RunContext::fixed("run-20260114T120000Z-0badcafe", at());
        assert_eq!(
            ctx.header_lines(),
            "RUN_ID: run-20260114T120000Z-0badcafe\nSTARTED_AT: 2026-01-14T12:00:00Z\n"
        );
    }
}
