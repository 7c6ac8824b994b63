//! Validation of raw session records.
//!
//! A raw record is eligible only when it carries a parseable timestamp and
//! exactly three numeric answers. Anything else is excluded silently, but
//! the exclusions are counted.

use crate::models::SessionRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, info};

const TIMESTAMP_FIELDS: [&str; 2] = ["updatedAt", "updated_at"];
const ANSWER_FIELDS: [&str; 2] = ["formAnswer", "form_answer"];

/// Number of answers in a questionnaire: stress, focus, control.
pub const ANSWER_ARITY: usize = 3;

/// Outcome of normalizing a whole session-history payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub records: Vec<SessionRecord>,
    pub excluded: usize,
}

/// Validate one raw record. Returns `None` when it must be excluded.
pub fn normalize(raw: &Value) -> Option<SessionRecord> {
    let object = raw.as_object()?;

    let updated_at = TIMESTAMP_FIELDS
        .iter()
        .find_map(|f| object.get(*f))
        .and_then(parse_timestamp_value)?;

    let answers = ANSWER_FIELDS
        .iter()
        .find_map(|f| object.get(*f))
        .and_then(Value::as_array)?;

    if answers.len() != ANSWER_ARITY {
        return None;
    }

    let mut scores = [0.0f64; ANSWER_ARITY];
    for (slot, answer) in scores.iter_mut().zip(answers) {
        *slot = answer.as_f64().filter(|v| v.is_finite())?;
    }

    Some(SessionRecord {
        updated_at,
        stress: scores[0],
        focus: scores[1],
        control: scores[2],
    })
}

/// Normalize every raw record, counting the ones dropped.
pub fn normalize_all<'a, I>(raw_records: I) -> Normalized
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut normalized = Normalized::default();

    for raw in raw_records {
        match normalize(raw) {
            Some(record) => normalized.records.push(record),
            None => {
                normalized.excluded += 1;
                debug!("Excluded malformed session record: {}", raw);
            }
        }
    }

    if normalized.excluded > 0 {
        info!(
            "Excluded {} of {} session records",
            normalized.excluded,
            normalized.excluded + normalized.records.len()
        );
    }

    normalized
}

fn parse_timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        // Integer timestamps are epoch milliseconds.
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// Parse the timestamp formats the service is known to emit.
///
/// Offset-free forms are read as UTC.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
