//! Job-board ingestion: fetch keyless public feeds, normalize, insert new postings.
//!
//! Each board is a `JobSource`. Normalization is pure and unit-tested against
//! recorded payload shapes; only `fetch` touches the network.

pub mod handlers;
pub mod sources;

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;

use crate::errors::IngestError;
use crate::models::job::{NewJob, SalaryRange};

#[async_trait]
pub trait JobSource: Send + Sync {
    /// Stable lowercase name, also the `:source` path segment.
    fn name(&self) -> &'static str;

    /// Fetches the current feed and returns normalized postings.
    async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<NewJob>, IngestError>;
}

/// Inserts postings whose `external_id` is new; existing rows are left untouched.
/// Returns the number of rows inserted.
pub async fn insert_new_jobs(pool: &PgPool, jobs: &[NewJob]) -> Result<u64, IngestError> {
    let mut inserted = 0;
    for job in jobs {
        let result = sqlx::query(
            r#"
            INSERT INTO jobs
                (external_id, title, company, location, description,
                 skills_required, salary_range, source, source_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (external_id) DO NOTHING
            "#,
        )
        .bind(&job.external_id)
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.description)
        .bind(&job.skills_required)
        .bind(job.salary_range.clone().map(sqlx::types::Json))
        .bind(&job.source)
        .bind(&job.source_url)
        .execute(pool)
        .await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

/// Fetches from `source` and stores what is new.
pub async fn run_ingestion(
    pool: &PgPool,
    client: &reqwest::Client,
    source: &dyn JobSource,
) -> Result<IngestionReport, IngestError> {
    let jobs = source.fetch(client).await?;
    let fetched = jobs.len();
    let inserted = insert_new_jobs(pool, &jobs).await?;

    info!(
        source = source.name(),
        fetched, inserted, "Ingestion finished"
    );
    Ok(IngestionReport {
        source: source.name(),
        fetched,
        inserted,
    })
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct IngestionReport {
    pub source: &'static str,
    pub fetched: usize,
    pub inserted: u64,
}

// ────────────────────────────────────────────────────────────────────────────
// Normalization helpers shared by the sources
// ────────────────────────────────────────────────────────────────────────────

fn markup_pattern() -> &'static Regex {
    static MARKUP: OnceLock<Regex> = OnceLock::new();
    MARKUP.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid markup regex"))
}

/// Drops HTML tags, decodes the common entities and collapses whitespace.
pub fn clean_html(raw: &str) -> String {
    let without_tags = markup_pattern().replace_all(raw, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trims tags, drops empties and case-insensitive duplicates, keeps first spelling.
pub fn clean_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

/// A salary bound from a loosely typed feed field. Zero, empty and junk mean "unspecified".
pub fn salary_bound(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }?;
    (parsed.is_finite() && parsed > 0.0).then_some(parsed)
}

/// Builds a range only when at least one bound is known and the pair is sane.
pub fn salary_range(min: Option<f64>, max: Option<f64>, currency: Option<String>) -> Option<SalaryRange> {
    if min.is_none() && max.is_none() {
        return None;
    }
    let range = SalaryRange { min, max, currency };
    range.validate().ok().map(|_| range)
}

fn salary_text_pattern() -> &'static Regex {
    static SALARY: OnceLock<Regex> = OnceLock::new();
    SALARY.get_or_init(|| {
        Regex::new(r"(?i)(\d{1,3}(?:[,.]\d{3})+|\d+(?:\.\d+)?)\s*(k)?").expect("valid salary regex")
    })
}

/// Parses free-text pay such as "$100k - $120k" or "USD 90,000 per year".
pub fn parse_salary_text(text: &str) -> Option<SalaryRange> {
    let amounts: Vec<f64> = salary_text_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let digits = caps.get(1)?.as_str().replace(',', "");
            // "90.000" style thousands separators
            let digits = if digits.matches('.').count() == 1 && digits.len() - digits.find('.')? == 4
            {
                digits.replace('.', "")
            } else {
                digits
            };
            let value: f64 = digits.parse().ok()?;
            let value = if caps.get(2).is_some() { value * 1000.0 } else { value };
            (value >= 1000.0).then_some(value)
        })
        .take(2)
        .collect();

    let currency = if text.contains('$') || text.to_uppercase().contains("USD") {
        Some("USD".to_string())
    } else if text.contains('€') || text.to_uppercase().contains("EUR") {
        Some("EUR".to_string())
    } else {
        None
    };

    match amounts.as_slice() {
        [min, max] => salary_range(Some(min.min(*max)), Some(min.max(*max)), currency),
        [only] => salary_range(Some(*only), None, currency),
        _ => None,
    }
}
