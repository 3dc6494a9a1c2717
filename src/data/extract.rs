//! Field extraction from Prometheus-style telemetry text.
//!
//! Every tracked field is described by a row in [`TRACKED_FIELDS`]: the rule
//! used to locate it in the exposition text, what to do when it is missing,
//! and whether its readings feed a chart. Extraction of one field never
//! affects another, and a missing metric is a normal outcome (`None`), not an
//! error.
//!
//! ```
//! use walrus_dashboard::data::extract::{scalar, state_scalar};
//!
//! let text = "checkpoint_downloader_checkpoint_lag 3\n\
//!             walrus_event_cursor_progress{state=\"pending\"} 12\n";
//! assert_eq!(scalar(text, "checkpoint_downloader_checkpoint_lag"), Some(3));
//! assert_eq!(state_scalar(text, "walrus_event_cursor_progress", "pending"), Some(12));
//! assert_eq!(state_scalar(text, "walrus_event_cursor_progress", "persisted"), None);
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Characters that may not directly precede a metric name.
const NAME_BOUNDARY: &str = r"(?m)(?:^|[^A-Za-z0-9_:])";

/// A sample value token: digits, optionally in float or exponent notation.
const VALUE: &str = r"[ \t]+([0-9][0-9.eE+\-]*)";

/// A value tracked by the dashboard, extracted from the telemetry endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Field {
    Epoch,
    ShardsOwned,
    LatestCheckpoint,
    DownloadedCheckpoints,
    CheckpointLag,
    DownloaderWorkers,
    ConfirmationsIssued,
    PendingEvents,
    PersistedEvents,
    HighestFinishedEvent,
    BacklogQueued,
    BacklogInProgress,
    Uptime,
    BuildVersion,
    ChainIdentifier,
}

impl Field {
    /// Returns the display label for this field.
    pub fn label(&self) -> &'static str {
        match self {
            Field::Epoch => "Epoch",
            Field::ShardsOwned => "Shards Owned",
            Field::LatestCheckpoint => "Latest Checkpoint",
            Field::DownloadedCheckpoints => "Downloaded Checkpoints",
            Field::CheckpointLag => "Checkpoints Lag",
            Field::DownloaderWorkers => "Workers",
            Field::ConfirmationsIssued => "Confirmations",
            Field::PendingEvents => "Pending Events",
            Field::PersistedEvents => "Persisted Events",
            Field::HighestFinishedEvent => "Highest Finished Event",
            Field::BacklogQueued => "Recovery Backlog",
            Field::BacklogInProgress => "Recovering",
            Field::Uptime => "Uptime",
            Field::BuildVersion => "Version",
            Field::ChainIdentifier => "Chain",
        }
    }

    /// Look up the table row describing this field.
    pub fn spec(&self) -> &'static FieldSpec {
        TRACKED_FIELDS
            .iter()
            .find(|spec| spec.field == *self)
            .unwrap_or(&TRACKED_FIELDS[0])
    }
}

/// How a field is located in the exposition text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// `name value`
    Scalar(&'static str),
    /// `name{...} value`, whatever the labels are.
    ScalarAnyLabels(&'static str),
    /// `name{state="X"} value` for one state label.
    State {
        metric: &'static str,
        state: &'static str,
    },
    /// The quoted value of `label` on the `name{...}` series.
    Label {
        metric: &'static str,
        label: &'static str,
    },
    /// The quoted value of `label` on whichever series carries it first.
    LabelAnywhere(&'static str),
}

/// What happens to a field when a fresh fetch no longer reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsencePolicy {
    /// Keep showing the last known value; the chart does not grow.
    KeepLast,
    /// Show the field as unavailable.
    NotAvailable,
    /// Treat the missing reading as zero and record it (logged as a warning).
    Zero,
}

/// One row of the extraction table.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    pub rule: Rule,
    pub absence: AbsencePolicy,
    /// Whether readings are kept in a rolling window for charting.
    pub chart: bool,
}

const fn row(field: Field, rule: Rule, absence: AbsencePolicy, chart: bool) -> FieldSpec {
    FieldSpec {
        field,
        rule,
        absence,
        chart,
    }
}

const EVENT_CURSOR: &str = "walrus_event_cursor_progress";
const RECOVER_BACKLOG: &str = "walrus_recover_blob_backlog";

/// Every field the dashboard extracts from the telemetry endpoint.
pub const TRACKED_FIELDS: &[FieldSpec] = {
    use AbsencePolicy::*;
    use Field::*;
    &[
        row(Epoch, Rule::Scalar("walrus_current_epoch"), KeepLast, false),
        row(ShardsOwned, Rule::Scalar("walrus_shards_owned"), KeepLast, false),
        row(
            LatestCheckpoint,
            Rule::Scalar("event_processor_latest_downloaded_checkpoint"),
            KeepLast,
            true,
        ),
        row(
            DownloadedCheckpoints,
            Rule::Scalar("event_processor_total_downloaded_checkpoints"),
            KeepLast,
            false,
        ),
        row(
            CheckpointLag,
            Rule::Scalar("checkpoint_downloader_checkpoint_lag"),
            KeepLast,
            true,
        ),
        row(
            DownloaderWorkers,
            Rule::Scalar("checkpoint_downloader_num_workers"),
            NotAvailable,
            false,
        ),
        row(
            ConfirmationsIssued,
            Rule::Scalar("walrus_storage_confirmations_issued_total"),
            KeepLast,
            true,
        ),
        row(
            PendingEvents,
            Rule::State {
                metric: EVENT_CURSOR,
                state: "pending",
            },
            KeepLast,
            true,
        ),
        row(
            PersistedEvents,
            Rule::State {
                metric: EVENT_CURSOR,
                state: "persisted",
            },
            KeepLast,
            true,
        ),
        row(
            HighestFinishedEvent,
            Rule::State {
                metric: EVENT_CURSOR,
                state: "highest_finished",
            },
            KeepLast,
            true,
        ),
        // The queued backlog is a running total: a missing reading counts as
        // an empty queue. The in-progress sibling keeps its last value and is
        // not charted.
        row(
            BacklogQueued,
            Rule::State {
                metric: RECOVER_BACKLOG,
                state: "queued",
            },
            Zero,
            true,
        ),
        row(
            BacklogInProgress,
            Rule::State {
                metric: RECOVER_BACKLOG,
                state: "in-progress",
            },
            KeepLast,
            false,
        ),
        row(Uptime, Rule::ScalarAnyLabels("uptime"), NotAvailable, false),
        row(
            BuildVersion,
            Rule::Label {
                metric: "walrus_build_info",
                label: "version",
            },
            NotAvailable,
            false,
        ),
        row(
            ChainIdentifier,
            Rule::LabelAnywhere("chain_identifier"),
            NotAvailable,
            false,
        ),
    ]
};

/// A value extracted for a [`Field`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Count(u64),
    Text(String),
}

impl FieldValue {
    pub fn as_count(&self) -> Option<u64> {
        match self {
            FieldValue::Count(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Count(_) => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Count(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// The raw text of one successful telemetry fetch.
#[derive(Debug, Clone)]
pub struct TelemetrySnapshot {
    text: String,
}

impl TelemetrySnapshot {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Run every rule of [`TRACKED_FIELDS`] against this blob.
    pub fn extract(&self) -> Extraction {
        Extraction::from_text(&self.text)
    }
}

/// Result of running the extraction table over one telemetry blob.
///
/// Holds an entry for every tracked field; `None` marks an absent metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    values: BTreeMap<Field, Option<FieldValue>>,
}

impl Extraction {
    /// Extract every tracked field from `text`.
    pub fn from_text(text: &str) -> Self {
        let values = TRACKED_FIELDS
            .iter()
            .zip(MATCHERS.iter())
            .map(|(spec, (_, re))| {
                let value = first_capture(re, text).and_then(|raw| spec.rule.convert(raw));
                (spec.field, value)
            })
            .collect();
        Self { values }
    }

    /// The value found for `field`, or `None` if the metric was absent.
    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.values.get(&field).and_then(Option::as_ref)
    }

    pub fn count(&self, field: Field) -> Option<u64> {
        self.get(field).and_then(FieldValue::as_count)
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    /// Fields that were not found in the blob.
    pub fn absent(&self) -> impl Iterator<Item = Field> + '_ {
        self.values.iter().filter(|(_, v)| v.is_none()).map(|(f, _)| *f)
    }
}

/// Compiled matcher of every tracked field, in table order.
static MATCHERS: LazyLock<Vec<(Field, Regex)>> = LazyLock::new(|| {
    TRACKED_FIELDS
        .iter()
        .map(|spec| {
            let re = Regex::new(&spec.rule.pattern()).expect("tracked field pattern is valid");
            (spec.field, re)
        })
        .collect()
});

impl Rule {
    /// Regex locating the rule's value; group 1 is the raw token.
    fn pattern(&self) -> String {
        match *self {
            Rule::Scalar(name) => scalar_pattern(name),
            Rule::ScalarAnyLabels(name) => any_labels_pattern(name),
            Rule::State { metric, state } => state_pattern(metric, state),
            Rule::Label { metric, label } => label_pattern(metric, label),
            Rule::LabelAnywhere(label) => label_anywhere_pattern(label),
        }
    }

    /// Whether the rule yields a count rather than a label value.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Rule::Scalar(_) | Rule::ScalarAnyLabels(_) | Rule::State { .. }
        )
    }

    /// Turn a captured token into a value.
    ///
    /// `ScalarAnyLabels` keeps a token that is not a count as text, so the
    /// caller can report the unusable reading instead of treating it as absent.
    fn convert(&self, raw: &str) -> Option<FieldValue> {
        match self {
            Rule::Scalar(_) | Rule::State { .. } => parse_count(raw).map(FieldValue::Count),
            Rule::ScalarAnyLabels(_) => Some(
                parse_count(raw)
                    .map(FieldValue::Count)
                    .unwrap_or_else(|| FieldValue::Text(raw.to_string())),
            ),
            Rule::Label { .. } | Rule::LabelAnywhere(_) => {
                Some(raw).filter(|s| !s.is_empty()).map(|s| FieldValue::Text(s.to_string()))
            }
        }
    }
}

fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn scalar_pattern(name: &str) -> String {
    format!("{}{}{}", NAME_BOUNDARY, regex::escape(name), VALUE)
}

fn any_labels_pattern(name: &str) -> String {
    format!(r"{}{}\{{[^}}]*\}}{}", NAME_BOUNDARY, regex::escape(name), VALUE)
}

fn state_pattern(name: &str, state: &str) -> String {
    format!(
        r#"{}{}\{{[^}}]*\bstate="{}"[^}}]*\}}{}"#,
        NAME_BOUNDARY,
        regex::escape(name),
        regex::escape(state),
        VALUE
    )
}

fn label_pattern(name: &str, label_name: &str) -> String {
    format!(
        r#"{}{}\{{[^}}]*\b{}="([^"]*)""#,
        NAME_BOUNDARY,
        regex::escape(name),
        regex::escape(label_name)
    )
}

fn label_anywhere_pattern(label_name: &str) -> String {
    format!(r#"\b{}="([^"]*)""#, regex::escape(label_name))
}

/// Value of the unlabeled sample `name value`; first match wins.
pub fn scalar(text: &str, name: &str) -> Option<u64> {
    capture(text, &scalar_pattern(name)).and_then(|raw| parse_count(&raw))
}

/// Value of the sample `name{...} value`, ignoring its labels.
pub fn scalar_any_labels(text: &str, name: &str) -> Option<u64> {
    capture(text, &any_labels_pattern(name)).and_then(|raw| parse_count(&raw))
}

/// Value of the sample `name{state="<state>"} value`.
pub fn state_scalar(text: &str, name: &str, state: &str) -> Option<u64> {
    capture(text, &state_pattern(name, state)).and_then(|raw| parse_count(&raw))
}

/// The quoted value of `label_name` on the `name{...}` series.
pub fn label(text: &str, name: &str, label_name: &str) -> Option<String> {
    capture(text, &label_pattern(name, label_name)).filter(|s| !s.is_empty())
}

/// The quoted value of the first `label_name="..."` pair in the text.
pub fn label_anywhere(text: &str, label_name: &str) -> Option<String> {
    capture(text, &label_anywhere_pattern(label_name)).filter(|s| !s.is_empty())
}

/// One-off match for the ad-hoc lookups above. Names are escaped, so the
/// pattern always compiles.
fn capture(text: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    first_capture(&re, text).map(str::to_string)
}

/// Parse a sample value as a non-negative integer.
///
/// Integral floats such as `1.2e3` are accepted; fractional, negative or
/// out-of-range values are treated as missing.
fn parse_count(raw: &str) -> Option<u64> {
    if let Ok(n) = raw.parse::<u64>() {
        return Some(n);
    }
    let value: f64 = raw.parse().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}
