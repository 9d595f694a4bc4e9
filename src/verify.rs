//! Verification of captured record streams
//!
//! Reads JSON lines as produced by `synthlog run` and checks each record for
//! sequence continuity, a known level, a message shaped for its level, and
//! optional fields in range.

use eyre::{Context, Result};
use lazy_regex::regex_captures;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::io::BufRead;

use crate::generator::Severity;
use crate::generator::message::{ACTIONS, ERRORS, USERS};
use crate::generator::record::{DURATION_HUNDREDTHS_LIMIT, REQUEST_ID_LIMIT};

/// A single problem found in the stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// 1-based line number in the input
    pub line: usize,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// Line is not a JSON object
    Unparseable { error: String },
    /// A required field is absent or has the wrong type
    MissingField { field: &'static str },
    UnknownLevel { level: String },
    SequenceGap { expected: u64, found: u64 },
    MessageShape { level: Severity, msg: String },
    RequestIdOutOfRange { request_id: i64 },
    DurationOutOfRange { duration_ms: f64 },
    DurationPrecision { duration_ms: f64 },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Unparseable { error } => write!(f, "unparseable line: {}", error),
            ViolationKind::MissingField { field } => write!(f, "missing or invalid field '{}'", field),
            ViolationKind::UnknownLevel { level } => write!(f, "unknown level {:?}", level),
            ViolationKind::SequenceGap { expected, found } => {
                write!(f, "sequence gap: expected seq={}, found seq={}", expected, found)
            }
            ViolationKind::MessageShape { level, msg } => write!(f, "message {:?} does not fit level {}", msg, level),
            ViolationKind::RequestIdOutOfRange { request_id } => {
                write!(f, "request_id {} outside 0..{}", request_id, REQUEST_ID_LIMIT)
            }
            ViolationKind::DurationOutOfRange { duration_ms } => {
                write!(f, "duration_ms {} outside 0..{}", duration_ms, DURATION_HUNDREDTHS_LIMIT / 100.0)
            }
            ViolationKind::DurationPrecision { duration_ms } => {
                write!(f, "duration_ms {} has more than two decimals", duration_ms)
            }
        }
    }
}

/// Summary of a verified stream
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub records: usize,
    pub levels: BTreeMap<Severity, usize>,
    pub with_request_id: usize,
    pub with_duration: usize,
    pub violations: Vec<Violation>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Fraction of records carrying a request id
    pub fn request_id_rate(&self) -> f64 {
        ratio(self.with_request_id, self.records)
    }

    /// Fraction of records carrying a duration
    pub fn duration_rate(&self) -> f64 {
        ratio(self.with_duration, self.records)
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 { 0.0 } else { part as f64 / whole as f64 }
}

/// Check every line of `reader`, skipping blank lines
pub fn verify<R: BufRead>(reader: R) -> Result<Report> {
    let mut report = Report::default();
    let mut last_seq: Option<u64> = None;

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let mut problems = Vec::new();
        check_line(&line, &mut last_seq, &mut report, &mut problems);
        report
            .violations
            .extend(problems.into_iter().map(|kind| Violation { line: line_no, kind }));
    }

    log::debug!(
        "Verified {} records with {} violations",
        report.records,
        report.violations.len()
    );
    Ok(report)
}

fn check_line(line: &str, last_seq: &mut Option<u64>, report: &mut Report, problems: &mut Vec<ViolationKind>) {
    let value: Value = match serde_json::from_str(line) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) => {
            problems.push(ViolationKind::Unparseable {
                error: "not a JSON object".to_string(),
            });
            return;
        }
        Err(e) => {
            problems.push(ViolationKind::Unparseable { error: e.to_string() });
            return;
        }
    };
    report.records += 1;

    for field in ["time", "language"] {
        if !value.get(field).is_some_and(Value::is_string) {
            problems.push(ViolationKind::MissingField { field });
        }
    }

    match value.get("seq").and_then(Value::as_u64) {
        Some(seq) => {
            let expected = last_seq.map_or(1, |prev| prev + 1);
            if seq != expected {
                problems.push(ViolationKind::SequenceGap { expected, found: seq });
            }
            *last_seq = Some(seq);
        }
        None => problems.push(ViolationKind::MissingField { field: "seq" }),
    }

    let level = match value.get("level").and_then(Value::as_str) {
        Some(raw) => match raw.parse::<Severity>() {
            Ok(level) => {
                *report.levels.entry(level).or_default() += 1;
                Some(level)
            }
            Err(_) => {
                problems.push(ViolationKind::UnknownLevel { level: raw.to_string() });
                None
            }
        },
        None => {
            problems.push(ViolationKind::MissingField { field: "level" });
            None
        }
    };

    match value.get("msg").and_then(Value::as_str) {
        Some(msg) => {
            if let Some(level) = level
                && !message_fits(level, msg)
            {
                problems.push(ViolationKind::MessageShape {
                    level,
                    msg: msg.to_string(),
                });
            }
        }
        None => problems.push(ViolationKind::MissingField { field: "msg" }),
    }

    if let Some(raw) = value.get("request_id") {
        report.with_request_id += 1;
        match raw.as_i64() {
            Some(id) if (0..i64::from(REQUEST_ID_LIMIT)).contains(&id) => {}
            Some(id) => problems.push(ViolationKind::RequestIdOutOfRange { request_id: id }),
            None => problems.push(ViolationKind::MissingField { field: "request_id" }),
        }
    }

    if let Some(raw) = value.get("duration_ms") {
        report.with_duration += 1;
        match raw.as_f64() {
            Some(d) => {
                if !(0.0..DURATION_HUNDREDTHS_LIMIT / 100.0).contains(&d) {
                    problems.push(ViolationKind::DurationOutOfRange { duration_ms: d });
                } else if !has_two_decimals_at_most(d) {
                    problems.push(ViolationKind::DurationPrecision { duration_ms: d });
                }
            }
            None => problems.push(ViolationKind::MissingField { field: "duration_ms" }),
        }
    }
}

fn has_two_decimals_at_most(value: f64) -> bool {
    let scaled = value * 100.0;
    (scaled - scaled.round()).abs() < 1e-6
}

/// Whether `msg` has the shape generated for `level`
pub fn message_fits(level: Severity, msg: &str) -> bool {
    match level {
        Severity::Trace => regex_captures!(r"^trace (.+)$", msg).is_some_and(|(_, action)| ACTIONS.contains(&action)),
        Severity::Debug => regex_captures!(r"^debug (.+)$", msg).is_some_and(|(_, action)| ACTIONS.contains(&action)),
        Severity::Info => regex_captures!(r"^info (.+) user=(\S+)$", msg)
            .is_some_and(|(_, action, user)| ACTIONS.contains(&action) && USERS.contains(&user)),
        Severity::Warn => regex_captures!(r"^warn possible issue action=(.+)$", msg)
            .is_some_and(|(_, action)| ACTIONS.contains(&action)),
        Severity::Error | Severity::Critical | Severity::Fatal => regex_captures!(r"^error (.+) user=(\S+)$", msg)
            .is_some_and(|(_, error, user)| ERRORS.contains(&error) && USERS.contains(&user)),
    }
}
