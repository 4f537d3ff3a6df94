//! Self-test for the normalization rule table.
//!
//! Normalization is only safe if it removes noise and nothing else. The
//! guard runs the rule table over designated canary pairs before any
//! evidence is hashed:
//!
//! - [`CanaryExpectation::Distinct`] pairs differ in one piece of meaningful
//!   text (a status word, a count). They must still differ after
//!   normalization, or the rules would hide a real change.
//! - [`CanaryExpectation::Equivalent`] pairs differ only in volatile fields.
//!   They must normalize to the same text, or the rules would let run-to-run
//!   noise break reproducibility.
//!
//! Every canary side must also be idempotent under the rules. A failing
//! guard is fatal: every downstream `sha256_norm` would be unreliable.

use tracing::debug;

use crate::error::{CoreError, Result};
use crate::hash::Sha256Hash;
use crate::normalize::RuleSet;

/// What a canary pair must look like after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanaryExpectation {
    /// Semantically different: normalized texts must differ.
    Distinct,
    /// Differ only in volatile fields: normalized texts must be equal.
    Equivalent,
}

/// A pair of sample reports with an expected normalization outcome.
#[derive(Debug, Clone)]
pub struct Canary {
    pub name: String,
    pub left: String,
    pub right: String,
    pub expect: CanaryExpectation,
}

impl Canary {
    pub fn distinct(name: &str, left: &str, right: &str) -> Self {
        Self {
            name: name.to_string(),
            left: left.to_string(),
            right: right.to_string(),
            expect: CanaryExpectation::Distinct,
        }
    }

    pub fn equivalent(name: &str, left: &str, right: &str) -> Self {
        Self {
            name: name.to_string(),
            left: left.to_string(),
            right: right.to_string(),
            expect: CanaryExpectation::Equivalent,
        }
    }
}

/// Summary of a passing guard run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardReport {
    pub canaries_checked: usize,
    pub rules_sha: Sha256Hash,
}

const REPORT_HEAD: &str = "# Gate report\nRUN_ID: run-20260114T120000Z-0badcafe\nSTARTED_AT: 2026-01-14T12:00:00Z\n";
const REPORT_HEAD_RERUN: &str = "# Gate report\nRUN_ID: run-20260115T093010Z-5eed5eed\nSTARTED_AT: 2026-01-15T09:30:10.125Z\n";

/// The designated canaries for the `ledger-norm/v1` table.
pub fn standard_canaries() -> Vec<Canary> {
    vec![
        Canary::distinct(
            "status_flip",
            &format!("{REPORT_HEAD}STATUS: PASS\nCOMPLETED_AT: 2026-01-14T12:01:00Z\n"),
            &format!("{REPORT_HEAD}STATUS: FAIL\nCOMPLETED_AT: 2026-01-14T12:01:00Z\n"),
        ),
        Canary::distinct(
            "count_change",
            &format!("{REPORT_HEAD}checks_passed: 12\n"),
            &format!("{REPORT_HEAD}checks_passed: 13\n"),
        ),
        Canary::distinct(
            "plain_timestamp_value",
            "deadline: 2026-01-01T00:00:00Z\n",
            "deadline: 2026-01-02T00:00:00Z\n",
        ),
        Canary::distinct(
            "unmarked_fence",
            "```text\nverdict PASS\n```\n",
            "```text\nverdict FAIL\n```\n",
        ),
        Canary::distinct(
            "text_after_volatile_fence",
            "<!-- ledger:volatile -->\n```diff\n+x\n```\nVERDICT: PASS\n```\ntail\n```\n",
            "<!-- ledger:volatile -->\n```diff\n+x\n```\nVERDICT: FAIL\n```\ntail\n```\n",
        ),
        Canary::equivalent(
            "rerun_same_verdict",
            &format!(
                "{REPORT_HEAD}STATUS: PASS\n<!-- ledger:volatile -->\n```diff\n-1\n+2\n```\n"
            ),
            &format!(
                "{REPORT_HEAD_RERUN}STATUS: PASS\n<!-- ledger:volatile -->\n```diff\n-7\n+9\n@@ hunk @@\n```\n"
            ),
        ),
        Canary::equivalent(
            "line_endings",
            "STATUS: PASS\r\ncount: 3\r\n",
            "STATUS: PASS\ncount: 3\n",
        ),
    ]
}

/// Run the guard over `canaries`.
///
/// # Errors
///
/// Returns [`CoreError::NormalizationGuard`] naming the first failing canary.
pub fn run_guard(rules: &RuleSet, canaries: &[Canary]) -> Result<GuardReport> {
    for canary in canaries {
        let left = rules.normalize(&canary.left);
        let right = rules.normalize(&canary.right);

        for (side, text) in [("left", &left), ("right", &right)] {
            if rules.normalize(text) != *text {
                return Err(guard_failure(canary, &format!("{side} side is not idempotent")));
            }
        }

        match canary.expect {
            CanaryExpectation::Distinct if left == right => {
                return Err(guard_failure(
                    canary,
                    "semantically different reports collapsed to the same normalized text",
                ));
            }
            CanaryExpectation::Equivalent if left != right => {
                return Err(guard_failure(
                    canary,
                    "reports differing only in volatile fields normalized differently",
                ));
            }
            _ => {}
        }
        debug!(canary = %canary.name, "normalization canary ok");
    }

    Ok(GuardReport {
        canaries_checked: canaries.len(),
        rules_sha: rules.rules_sha(),
    })
}

fn guard_failure(canary: &Canary, reason: &str) -> CoreError {
    CoreError::NormalizationGuard {
        canary: canary.name.clone(),
        reason: reason.to_string(),
    }
}
