//! Recency boosting.
//!
//! Extracts a document date from payload fields (`date`, `start`, `finish`,
//! `meta_date`) or from the text via regex, computes
//! `freshness = exp(-decay_rate · Δdays)` against now, and rescales the
//! min-max-normalized score by `exp(weight · (freshness − 0.5))`. Documents
//! without a date get a neutral freshness of 0.5.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde_json::Value;

use vortex_domain::constants::search::SCORE_EPSILON;
use vortex_domain::value_objects::{Payload, ScoredDocument};

/// Payload keys checked for a document date, in order.
const DATE_FIELDS: [&str; 4] = ["date", "finish", "start", "meta_date"];
/// Text fields scanned for an inline date.
const TEXT_FIELDS: [&str; 3] = ["content", "_text", "title"];

fn full_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{4})[-./](\d{1,2})[-./](\d{1,2})").expect("static pattern compiles")
    })
}

fn year_month_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})[-./](\d{1,2})").expect("static pattern compiles"))
}

/// Extract the first recognizable date from free text.
#[must_use]
pub fn extract_date_from_text(text: &str) -> Option<DateTime<Utc>> {
    if let Some(caps) = full_date_regex().captures(text) {
        let ymd = (
            caps[1].parse::<i32>().ok()?,
            caps[2].parse::<u32>().ok()?,
            caps[3].parse::<u32>().ok()?,
        );
        if let Some(date) = NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    if let Some(caps) = year_month_regex().captures(text) {
        let year = caps[1].parse::<i32>().ok()?;
        let month = caps[2].parse::<u32>().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

fn parse_date_value(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    extract_date_from_text(s)
}

/// Best-known date for a payload: explicit fields first, then inline text.
/// Returns the most recent candidate.
#[must_use]
pub fn extract_document_date(payload: &Payload) -> Option<DateTime<Utc>> {
    let mut candidates: Vec<DateTime<Utc>> = DATE_FIELDS
        .iter()
        .filter_map(|field| payload.get(*field))
        .filter_map(parse_date_value)
        .collect();

    if candidates.is_empty() {
        for field in TEXT_FIELDS {
            if let Some(Value::String(text)) = payload.get(field)
                && let Some(date) = extract_date_from_text(text)
            {
                candidates.push(date);
            }
        }
    }

    candidates.into_iter().max()
}

/// Apply the recency boost in place and re-sort by the boosted score.
pub fn apply_date_boost(
    results: &mut Vec<ScoredDocument>,
    decay_rate: f64,
    weight: f64,
    now: DateTime<Utc>,
) {
    if results.is_empty() {
        return;
    }

    let min = results
        .iter()
        .map(|r| r.score)
        .fold(f64::INFINITY, f64::min);
    let max = results
        .iter()
        .map(|r| r.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let spread = max - min;

    for doc in results.iter_mut() {
        let normalized = if spread < SCORE_EPSILON {
            0.5
        } else {
            (doc.score - min) / spread
        };

        let freshness = match extract_document_date(&doc.payload) {
            Some(date) => {
                let delta_days = (now - date).num_days().abs() as f64;
                (-decay_rate * delta_days).exp()
            }
            None => 0.5,
        };

        doc.score = normalized * (weight * (freshness - 0.5)).exp();
    }

    results.sort_by(|a, b| b.score.total_cmp(&a.score));
}
