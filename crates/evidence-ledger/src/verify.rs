//! The integrity verifier.
//!
//! Recomputes the three aggregates and compares each, as a case-sensitive
//! string, to its anchored value. The verdict is `PASS` only when all three
//! match. Per-file drift against the prior checksums report is reported
//! alongside the checks but never changes the verdict.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::anchor::{Anchors, CheckId, PriorChecksums};
use crate::context::RunContext;
use crate::error::{Outcome, ReasonCode, Verdict};
use crate::snapshot::LedgerSnapshot;

/// Result of one integrity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityCheckResult {
    pub check_id: CheckId,
    /// The anchored value, if one was found.
    pub anchored: Option<String>,
    pub computed: String,
    pub matches: bool,
    pub reason_code: Option<ReasonCode>,
    pub note: String,
}

/// Compare every check's anchor against `snapshot`.
///
/// Pure: reads nothing, writes nothing.
pub fn verify(anchors: &Anchors, snapshot: &LedgerSnapshot) -> Vec<IntegrityCheckResult> {
    CheckId::ALL
        .iter()
        .map(|&check| check_one(anchors, check, snapshot.aggregate(check)))
        .collect()
}

fn check_one(anchors: &Anchors, check: CheckId, computed: String) -> IntegrityCheckResult {
    let anchored = anchors.get(check).map(str::to_string);

    let (matches, reason_code, note) = match anchored.as_deref() {
        None => (
            false,
            Some(ReasonCode::MissingAnchor),
            anchors.problem(check).unwrap_or("no anchored value").to_string(),
        ),
        Some(value) => match check.validate(value) {
            Err(e) => (
                false,
                Some(ReasonCode::MissingAnchor),
                format!("unparsable anchor: {e}"),
            ),
            Ok(()) if value == computed => (true, None, String::new()),
            Ok(()) => (
                false,
                Some(ReasonCode::Mismatch),
                "recomputed value differs from anchor".to_string(),
            ),
        },
    };

    if !matches {
        warn!(
            check = %check,
            anchored = anchored.as_deref().unwrap_or("<none>"),
            computed = %computed,
            note = %note,
            "integrity check failed"
        );
    }

    IntegrityCheckResult {
        check_id: check,
        anchored,
        computed,
        matches,
        reason_code,
        note,
    }
}

/// What kind of per-file drift a finding describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingKind {
    /// In scope now, not in the prior report.
    Added,
    /// In the prior report, gone from scope now.
    Removed,
    /// Normalized content changed.
    ContentChanged,
    /// Raw bytes changed but normalized content did not.
    VolatileOnly,
    /// The normalization rule table changed since the prior report.
    RulesChanged,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::Added => "ADDED",
            FindingKind::Removed => "REMOVED",
            FindingKind::ContentChanged => "CONTENT_CHANGED",
            FindingKind::VolatileOnly => "VOLATILE_ONLY",
            FindingKind::RulesChanged => "RULES_CHANGED",
        }
    }
}

/// Informational drift relative to the prior checksums report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub path: Option<String>,
    pub reason_code: Option<ReasonCode>,
    pub detail: String,
}

/// Per-file differences between `prior` and `snapshot`, sorted by path.
pub fn drift_findings(prior: &PriorChecksums, snapshot: &LedgerSnapshot) -> Vec<Finding> {
    let mut findings = Vec::new();

    let current_sha = snapshot.rules_sha().to_hex();
    if let Some(prior_sha) = prior.rules_sha.as_deref() {
        if prior_sha != current_sha {
            findings.push(Finding {
                kind: FindingKind::RulesChanged,
                path: None,
                reason_code: None,
                detail: format!(
                    "norm_rules_sha changed from {prior_sha} ({}) to {current_sha} ({}); re-anchor after review",
                    prior.rules_version.as_deref().unwrap_or("unknown"),
                    snapshot.rules_version()
                ),
            });
        }
    }

    let paths: BTreeSet<&str> = prior
        .records
        .keys()
        .map(String::as_str)
        .chain(snapshot.records().iter().map(|r| r.path.as_str()))
        .collect();

    for path in paths {
        let finding = match (prior.record(path), snapshot.record(path)) {
            (None, Some(_)) => Finding {
                kind: FindingKind::Added,
                path: Some(path.to_string()),
                reason_code: None,
                detail: "not in prior checksums".to_string(),
            },
            (Some(_), None) => Finding {
                kind: FindingKind::Removed,
                path: Some(path.to_string()),
                reason_code: Some(ReasonCode::MissingSourceFile),
                detail: "anchored file is no longer in scope".to_string(),
            },
            (Some(before), Some(now)) if before.sha256_norm() != now.sha256_norm() => Finding {
                kind: FindingKind::ContentChanged,
                path: Some(path.to_string()),
                reason_code: Some(ReasonCode::Mismatch),
                detail: format!(
                    "sha256_norm {} -> {}",
                    before.sha256_norm(),
                    now.sha256_norm()
                ),
            },
            (Some(before), Some(now)) if before.sha256_raw() != now.sha256_raw() => Finding {
                kind: FindingKind::VolatileOnly,
                path: Some(path.to_string()),
                reason_code: None,
                detail: "raw bytes changed in volatile fields only".to_string(),
            },
            _ => continue,
        };
        findings.push(finding);
    }

    findings
}

/// Full result of a verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub run_id: String,
    pub started_at: String,
    pub verdict: Verdict,
    pub reason_code: Option<ReasonCode>,
    pub next_action: Option<String>,
    pub checks: Vec<IntegrityCheckResult>,
    pub findings: Vec<Finding>,
}

impl IntegrityReport {
    /// Assemble a report. The verdict depends on `checks` alone.
    pub fn new(ctx: &RunContext, checks: Vec<IntegrityCheckResult>, findings: Vec<Finding>) -> Self {
        // No checks is not a pass.
        let failed = checks.iter().find(|c| !c.matches);
        let (verdict, reason_code) = match failed {
            None if !checks.is_empty() => (Verdict::Pass, None),
            None => (Verdict::Blocked, Some(ReasonCode::MissingAnchor)),
            Some(check) => (
                Verdict::Blocked,
                Some(check.reason_code.unwrap_or(ReasonCode::Mismatch)),
            ),
        };

        let report = Self {
            run_id: ctx.run_id().to_string(),
            started_at: ctx.started_at_str(),
            verdict,
            reason_code,
            next_action: reason_code.map(|code| code.next_action().to_string()),
            checks,
            findings,
        };
        info!(
            run_id = %report.run_id,
            verdict = %report.verdict,
            failed = report.failed_checks().count(),
            findings = report.findings.len(),
            "integrity verification complete"
        );
        report
    }

    pub fn is_pass(&self) -> bool {
        self.verdict.is_pass()
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &IntegrityCheckResult> {
        self.checks.iter().filter(|c| !c.matches)
    }

    pub fn check(&self, check: CheckId) -> Option<&IntegrityCheckResult> {
        self.checks.iter().find(|c| c.check_id == check)
    }

    /// Collapse into the structured outcome.
    pub fn outcome(&self) -> Outcome {
        match self.reason_code {
            None => Outcome::pass(format!("{} integrity checks match their anchors", self.checks.len())),
            Some(code) => {
                let failed: Vec<&str> = self.failed_checks().map(|c| c.check_id.as_str()).collect();
                Outcome::blocked(code, format!("integrity checks failed: {}", failed.join(", ")))
            }
        }
    }
}
