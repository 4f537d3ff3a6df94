//! Proptest generators for property-based testing.

use proptest::prelude::*;

use evidence_ledger_core::Sha256Hash;

/// Generate a random Sha256Hash.
pub fn sha256_hash() -> impl Strategy<Value = Sha256Hash> {
    any::<[u8; 32]>().prop_map(Sha256Hash)
}

/// Generate an ISO-8601 UTC timestamp, sometimes with a fraction.
pub fn timestamp() -> impl Strategy<Value = String> {
    (
        2000u32..2100,
        1u32..=12,
        1u32..=28,
        0u32..24,
        0u32..60,
        0u32..60,
        prop::option::of(0u32..1000),
    )
        .prop_map(|(y, mo, d, h, mi, s, frac)| match frac {
            Some(ms) => format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}.{ms:03}Z"),
            None => format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}Z"),
        })
}

/// Generate a run identifier `run-YYYYMMDDTHHMMSSZ-xxxxxxxx`.
pub fn run_id() -> impl Strategy<Value = String> {
    (timestamp(), any::<u32>()).prop_map(|(ts, suffix)| {
        let compact: String = ts[..19].chars().filter(|c| *c != '-' && *c != ':').collect();
        format!("run-{compact}Z-{suffix:08x}")
    })
}

/// Generate a plain report line with no volatile content.
pub fn plain_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z][A-Za-z ]{0,30}".prop_map(String::from),
        (prop_oneof![Just("PASS"), Just("FAIL"), Just("SKIP")])
            .prop_map(|s| format!("STATUS: {s}")),
        (0u32..1000).prop_map(|n| format!("checks_passed: {n}")),
    ]
}

/// Generate one line of a gate report, including volatile fields.
pub fn report_line() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => plain_line(),
        1 => timestamp().prop_map(|t| format!("STARTED_AT: {t}")),
        1 => timestamp().prop_map(|t| format!("COMPLETED_AT: {t}")),
        1 => timestamp().prop_map(|t| format!("- updated_at: {t}")),
        1 => run_id().prop_map(|r| format!("RUN_ID: {r}")),
        1 => run_id().prop_map(|r| format!("see {r} for details")),
        1 => (plain_line(), plain_line()).prop_map(|(a, b)| format!("{a}\r{b}")),
        1 => (plain_line(), r"\r{1,3}").prop_map(|(line, crs)| format!("{line}{crs}")),
    ]
}

/// Generate a volatile fenced block, sometimes with stray CRs after the
/// marker line.
pub fn volatile_block() -> impl Strategy<Value = String> {
    (
        r"\r{0,2}",
        prop::collection::vec("[-+ ][a-z0-9 ]{0,20}", 0..6),
    )
        .prop_map(|(crs, body)| {
            let mut block = format!("<!-- ledger:volatile -->{crs}\n```diff\n");
            for line in body {
                block.push_str(&line);
                block.push('\n');
            }
            block.push_str("```");
            block
        })
}

/// Generate a whole report text with LF, CRLF or CR-run line endings.
pub fn report_text() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(
            prop_oneof![4 => report_line(), 1 => volatile_block()],
            0..20,
        ),
        prop_oneof![Just("\n"), Just("\r\n"), Just("\r\r\n")],
    )
        .prop_map(|(lines, eol)| {
            let mut text = String::new();
            for line in lines {
                text.push_str(&line.replace('\n', eol));
                text.push_str(eol);
            }
            text
        })
}

/// Generate a root-relative evidence path.
pub fn evidence_path() -> impl Strategy<Value = String> {
    (
        prop::collection::vec("[a-z][a-z0-9_]{0,7}", 0..3),
        "[A-Za-z][A-Za-z0-9_-]{0,11}",
        prop_oneof![Just("md"), Just("json"), Just("txt")],
    )
        .prop_map(|(dirs, stem, ext)| {
            let mut path = dirs.join("/");
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(&format!("{stem}.{ext}"));
            path
        })
}

/// Generate a scope: distinct paths with report contents.
pub fn evidence_tree(max_files: usize) -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map(evidence_path(), report_text(), 0..=max_files)
        .prop_map(|files| files.into_iter().collect())
}
