//! Canonicalization of evidence text.
//!
//! Reports written by pipeline steps carry fields that change on every run
//! without changing what the report *says*: start/finish timestamps, run
//! identifiers, and embedded diffs or logs. The [`RuleSet`] strips those
//! fields so that the normalized text of a report is byte-identical across
//! repeated runs over the same evidence.
//!
//! The rule table is ordered and versioned. Changing a pattern, a
//! replacement, or the order changes every `sha256_norm` in the ledger, so
//! the table has a canonical textual [definition](RuleSet::definition)
//! whose digest ([`RuleSet::rules_sha`]) is anchored next to the file hashes.
//!
//! Invariant: `normalize(normalize(x)) == normalize(x)` for every input.
//! Every replacement is chosen so that it is not itself matched by any rule.

use regex::Regex;
use std::borrow::Cow;

use crate::error::{CoreError, Result};
use crate::hash::Sha256Hash;

/// Version tag of the built-in rule table.
pub const RULES_VERSION: &str = "ledger-norm/v1";

/// Placeholder substituted for ISO-8601 timestamps.
pub const TIMESTAMP_PLACEHOLDER: &str = "<TIMESTAMP>";

/// Placeholder substituted for run identifiers.
pub const RUN_ID_PLACEHOLDER: &str = "<RUN_ID>";

/// Placeholder substituted for the body of a volatile fenced block.
pub const VOLATILE_BLOCK_PLACEHOLDER: &str = "<VOLATILE_BLOCK>";

/// Marker line that flags the fenced block directly below it as volatile.
pub const VOLATILE_MARKER: &str = "<!-- ledger:volatile -->";

/// ISO-8601 date-time, with optional fraction and offset.
const ISO_8601: &str = r"[0-9]{4}-[0-9]{2}-[0-9]{2}[T ][0-9]{2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]+)?(?:Z|[+-][0-9]{2}:?[0-9]{2})?";

/// Optional indentation and list bullet in front of a `KEY:` line.
const LINE_LEAD: &str = r"[ \t]*(?:[-*][ \t]+)?";

/// The uncompiled form of one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    /// Stable identifier, part of the rule definition.
    pub id: String,
    /// Pattern in `regex` crate syntax.
    pub pattern: String,
    /// Replacement in `regex` crate syntax (`${1}` for groups).
    pub replacement: String,
}

impl RuleSpec {
    pub fn new(id: impl Into<String>, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// The `ledger-norm/v1` table, in application order.
pub fn standard_rule_specs() -> Vec<RuleSpec> {
    vec![
        RuleSpec::new("crlf", r"\r+\n", "\n"),
        RuleSpec::new(
            "started_at",
            format!(r"(?m)^({LINE_LEAD}STARTED_AT:[ \t]*){ISO_8601}"),
            format!("${{1}}{TIMESTAMP_PLACEHOLDER}"),
        ),
        RuleSpec::new(
            "completed_at",
            format!(r"(?m)^({LINE_LEAD}COMPLETED_AT:[ \t]*){ISO_8601}"),
            format!("${{1}}{TIMESTAMP_PLACEHOLDER}"),
        ),
        RuleSpec::new(
            "generic_at",
            format!(
                r#"(?m)^({LINE_LEAD}"?[A-Za-z][A-Za-z0-9_]*_(?:at|AT)"?[ \t]*[:=][ \t]*"?){ISO_8601}"#
            ),
            format!("${{1}}{TIMESTAMP_PLACEHOLDER}"),
        ),
        RuleSpec::new(
            "run_id_line",
            format!(r"(?m)^({LINE_LEAD}RUN_ID:[ \t]*)[^\s<]\S*"),
            format!("${{1}}{RUN_ID_PLACEHOLDER}"),
        ),
        RuleSpec::new(
            "run_id_token",
            r"\brun-[0-9]{8}T[0-9]{6}Z-[0-9a-f]{8}\b",
            RUN_ID_PLACEHOLDER,
        ),
        RuleSpec::new(
            "volatile_fence",
            r"(?ms)^(<!-- ledger:volatile -->[ \t]*\n[ \t]*```[^\n]*\n)(.*?)^([ \t]*```)[ \t]*$",
            format!("${{1}}{VOLATILE_BLOCK_PLACEHOLDER}\n${{3}}"),
        ),
    ]
}

/// A compiled normalization rule.
#[derive(Debug, Clone)]
pub struct NormalizationRule {
    spec: RuleSpec,
    regex: Regex,
}

impl NormalizationRule {
    /// Compile a rule.
    pub fn compile(spec: RuleSpec) -> Result<Self> {
        if spec.id.trim().is_empty() {
            return Err(CoreError::InvalidRule {
                id: spec.id,
                reason: "empty rule id".into(),
            });
        }
        let regex = Regex::new(&spec.pattern).map_err(|e| CoreError::InvalidRule {
            id: spec.id.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { spec, regex })
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn spec(&self) -> &RuleSpec {
        &self.spec
    }

    fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.regex.replace_all(text, self.spec.replacement.as_str())
    }
}

/// An ordered, versioned normalization rule table.
#[derive(Debug, Clone)]
pub struct RuleSet {
    version: String,
    rules: Vec<NormalizationRule>,
}

impl RuleSet {
    /// The built-in `ledger-norm/v1` table.
    pub fn standard() -> Result<Self> {
        Self::new(RULES_VERSION, standard_rule_specs())
    }

    /// Compile a custom rule table.
    ///
    /// Rule ids must be unique; the version must be non-empty.
    pub fn new(version: impl Into<String>, specs: Vec<RuleSpec>) -> Result<Self> {
        let version = version.into();
        if version.trim().is_empty() {
            return Err(CoreError::InvalidRule {
                id: String::new(),
                reason: "empty rule table version".into(),
            });
        }

        let mut rules: Vec<NormalizationRule> = Vec::with_capacity(specs.len());
        for spec in specs {
            if rules.iter().any(|r| r.id() == spec.id) {
                return Err(CoreError::InvalidRule {
                    id: spec.id,
                    reason: "duplicate rule id".into(),
                });
            }
            rules.push(NormalizationRule::compile(spec)?);
        }

        Ok(Self { version, rules })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn rules(&self) -> &[NormalizationRule] {
        &self.rules
    }

    /// Apply every rule, in order, to `raw`.
    pub fn normalize(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        for rule in &self.rules {
            if let Cow::Owned(replaced) = rule.apply(&text) {
                text = replaced;
            }
        }
        text
    }

    /// Decode `raw` as UTF-8 and normalize it.
    ///
    /// Invalid sequences decode to U+FFFD. The substitution is deterministic,
    /// so binary evidence still gets a stable `sha256_norm`.
    pub fn normalize_bytes(&self, raw: &[u8]) -> String {
        self.normalize(&String::from_utf8_lossy(raw))
    }

    /// Canonical textual definition of the table.
    ///
    /// Line 1 is the version; each further line is
    /// `<position>\t<id>\t<pattern>\t<replacement>` with control characters
    /// escaped.
    pub fn definition(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.version);
        out.push('\n');
        for (position, rule) in self.rules.iter().enumerate() {
            let spec = rule.spec();
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\n",
                position + 1,
                escape_field(&spec.id),
                escape_field(&spec.pattern),
                escape_field(&spec.replacement),
            ));
        }
        out
    }

    /// `norm_rules_sha`: digest of [`definition`](Self::definition).
    pub fn rules_sha(&self) -> Sha256Hash {
        Sha256Hash::hash(self.definition().as_bytes())
    }
}

fn escape_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}
