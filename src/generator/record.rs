//! A single synthetic log record

use chrono::{DateTime, SecondsFormat, Utc};
use colored::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Severity, build_message};

/// Request ids are drawn from `0..REQUEST_ID_LIMIT`
pub const REQUEST_ID_LIMIT: u32 = 10_000;
/// Durations are drawn as hundredths of a millisecond from `0..DURATION_HUNDREDTHS_LIMIT`
pub const DURATION_HUNDREDTHS_LIMIT: f64 = 100_000.0;

const REQUEST_ID_PROBABILITY: f64 = 0.5;
const DURATION_PROBABILITY: f64 = 0.3;

/// One generated log event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// UTC timestamp, RFC 3339 with nanoseconds
    pub time: String,
    pub level: Severity,
    pub msg: String,
    /// Tag identifying the generator implementation
    pub language: String,
    pub seq: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

impl Record {
    /// Generate the record for sequence number `seq`, stamped with the current time
    pub fn generate<R: Rng>(seq: u64, language: &str, rng: &mut R) -> Self {
        Self::generate_at(Utc::now(), seq, language, rng)
    }

    /// Generate a record with an explicit timestamp
    pub fn generate_at<R: Rng>(now: DateTime<Utc>, seq: u64, language: &str, rng: &mut R) -> Self {
        let level = Severity::random(rng);
        let msg = build_message(level, rng);

        let request_id = rng
            .gen_bool(REQUEST_ID_PROBABILITY)
            .then(|| rng.gen_range(0..REQUEST_ID_LIMIT));

        // Truncate to whole hundredths so the value carries at most two decimals
        let duration_ms = rng.gen_bool(DURATION_PROBABILITY).then(|| {
            let hundredths = rng.gen_range(0.0..DURATION_HUNDREDTHS_LIMIT) as u32;
            f64::from(hundredths) / 100.0
        });

        Self {
            time: now.to_rfc3339_opts(SecondsFormat::Nanos, true),
            level,
            msg,
            language: language.to_string(),
            seq,
            request_id,
            duration_ms,
        }
    }

    /// Serialize as a single JSON line (no trailing newline)
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Format as a logfmt-style line with a colorized level
    pub fn format_text(&self) -> String {
        let level = match self.level {
            Severity::Trace => self.level.as_str().dimmed(),
            Severity::Debug => self.level.as_str().blue(),
            Severity::Info => self.level.as_str().green(),
            Severity::Warn => self.level.as_str().yellow(),
            Severity::Error => self.level.as_str().red(),
            Severity::Critical | Severity::Fatal => self.level.as_str().red().bold(),
        };

        let mut parts = vec![
            format!("time={}", self.time),
            format!("level={}", level),
            format!("language={}", self.language),
            format!("seq={}", self.seq),
        ];

        if let Some(id) = self.request_id {
            parts.push(format!("request_id={}", id));
        }

        if let Some(duration) = self.duration_ms {
            parts.push(format!("duration_ms={:.2}", duration));
        }

        parts.push(format!("msg={:?}", self.msg));
        parts.join(" ")
    }
}
