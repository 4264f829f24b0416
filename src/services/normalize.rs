use crate::constants::search;
use crate::services::jsearch::{RawResponse, SearchQuery};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub job_id: Option<String>,
    pub title: String,
    pub company: String,
    pub url: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub platform: Option<String>,
    pub salary: Option<String>,
    pub posted_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub records: Vec<JobRecord>,
    pub requested: usize,
    pub returned: usize,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated_reason: Option<String>,
    pub skipped: usize,
}

pub fn normalize(raw: &RawResponse, query: &SearchQuery) -> SearchResult {
    let listings = raw
        .body
        .get("data")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let mut records = Vec::new();
    let mut skipped = 0;
    for listing in &listings {
        if records.len() >= query.num_results {
            break;
        }
        match extract_record(listing) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    let returned = records.len();
    let supply_short = listings.len() < query.num_results;
    let truncated = supply_short || query.capped();
    let truncated_reason = if supply_short {
        Some("upstream_exhausted".to_string())
    } else if query.capped() {
        Some("capped".to_string())
    } else {
        None
    };

    SearchResult {
        records,
        requested: query.requested,
        returned,
        truncated,
        truncated_reason,
        skipped,
    }
}

fn extract_record(listing: &Value) -> Option<JobRecord> {
    let title = required_str(listing, "job_title")?;
    let company = required_str(listing, "employer_name")?;
    let url = required_str(listing, "job_apply_link")?;

    Some(JobRecord {
        job_id: optional_str(listing, "job_id"),
        title,
        company,
        url,
        location: build_location(listing),
        description: optional_str(listing, "job_description").map(|text| snippet(&text)),
        platform: optional_str(listing, "job_publisher"),
        salary: build_salary(listing),
        posted_at: build_posted_at(listing),
    })
}

fn required_str(listing: &Value, key: &str) -> Option<String> {
    listing
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn optional_str(listing: &Value, key: &str) -> Option<String> {
    required_str(listing, key)
}

fn build_location(listing: &Value) -> Option<String> {
    let parts: Vec<String> = ["job_city", "job_state", "job_country"]
        .iter()
        .filter_map(|key| optional_str(listing, key))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn build_salary(listing: &Value) -> Option<String> {
    let min = listing.get("job_min_salary").and_then(|v| v.as_f64());
    let max = listing.get("job_max_salary").and_then(|v| v.as_f64());
    let range = match (min, max) {
        (Some(min), Some(max)) => format!("{}-{}", fmt_amount(min), fmt_amount(max)),
        (Some(min), None) => format!("from {}", fmt_amount(min)),
        (None, Some(max)) => format!("up to {}", fmt_amount(max)),
        (None, None) => return None,
    };
    let mut out = range;
    if let Some(currency) = optional_str(listing, "job_salary_currency") {
        out.push(' ');
        out.push_str(&currency);
    }
    if let Some(period) = optional_str(listing, "job_salary_period") {
        out.push_str(" per ");
        out.push_str(&period.to_lowercase());
    }
    Some(out)
}

fn fmt_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

fn build_posted_at(listing: &Value) -> Option<String> {
    if let Some(text) = optional_str(listing, "job_posted_at_datetime_utc") {
        return Some(text);
    }
    listing
        .get("job_posted_at_timestamp")
        .and_then(|v| v.as_i64())
        .and_then(|seconds| chrono::DateTime::from_timestamp(seconds, 0))
        .map(|dt| dt.to_rfc3339())
}

fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= search::SNIPPET_MAX_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(search::SNIPPET_MAX_CHARS).collect();
    out.push_str("...");
    out
}
