use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Advertised pay band. Absent bounds mean "unspecified", never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<String>,
}

impl SalaryRange {
    /// Closed `(min, max)` interval; a single known bound becomes a point range.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Some((min, max)),
            (Some(v), None) | (None, Some(v)) => Some((v, v)),
            (None, None) => None,
        }
    }

    /// Rejects negative bounds and inverted ranges.
    pub fn validate(&self) -> Result<(), String> {
        if self.min.is_some_and(|v| v < 0.0) || self.max.is_some_and(|v| v < 0.0) {
            return Err("salary bounds must be non-negative".to_string());
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(format!("salary min ({min}) exceeds max ({max})"));
            }
        }
        Ok(())
    }
}

/// Canonical job posting as consumed by the corpus builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub external_id: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: String,
    pub skills_required: Vec<String>,
    pub salary_range: Option<SalaryRange>,
    pub source: String,
    pub source_url: Option<String>,
    pub ingested_at: DateTime<Utc>,
}

/// A posting as supplied by a client or a job board, before the database assigns
/// `id` and `ingested_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    pub external_id: String,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skills_required: Vec<String>,
    #[serde(default)]
    pub salary_range: Option<SalaryRange>,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub source_url: Option<String>,
}

fn default_source() -> String {
    "manual".to_string()
}

impl NewJob {
    pub fn validate(&self) -> Result<(), String> {
        if self.external_id.trim().is_empty() {
            return Err("external_id cannot be empty".to_string());
        }
        if self.title.trim().is_empty() {
            return Err("title cannot be empty".to_string());
        }
        match &self.salary_range {
            Some(range) => range.validate(),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub external_id: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: String,
    pub skills_required: Vec<String>,
    pub salary_range: Option<Json<SalaryRange>>,
    pub source: String,
    pub source_url: Option<String>,
    pub ingested_at: DateTime<Utc>,
}

impl From<JobRow> for JobRecord {
    fn from(row: JobRow) -> Self {
        JobRecord {
            id: row.id,
            external_id: row.external_id,
            title: row.title,
            company: row.company,
            location: row.location,
            description: row.description,
            skills_required: row.skills_required,
            salary_range: row.salary_range.map(|Json(range)| range),
            source: row.source,
            source_url: row.source_url,
            ingested_at: row.ingested_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_full_range() {
        let range = SalaryRange {
            min: Some(100_000.0),
            max: Some(150_000.0),
            currency: Some("USD".to_string()),
        };
        assert_eq!(range.bounds(), Some((100_000.0, 150_000.0)));
    }

    #[test]
    fn test_bounds_single_side_is_point_range() {
        let only_min = SalaryRange {
            min: Some(90_000.0),
            ..Default::default()
        };
        let only_max = SalaryRange {
            max: Some(120_000.0),
            ..Default::default()
        };
        assert_eq!(only_min.bounds(), Some((90_000.0, 90_000.0)));
        assert_eq!(only_max.bounds(), Some((120_000.0, 120_000.0)));
    }

    #[test]
    fn test_bounds_unspecified() {
        assert_eq!(SalaryRange::default().bounds(), None);
    }

    #[test]
    fn test_inverted_salary_rejected() {
        let range = SalaryRange {
            min: Some(150_000.0),
            max: Some(80_000.0),
            currency: None,
        };
        assert!(range.validate().is_err());
    }

    #[test]
    fn test_new_job_defaults_and_validation() {
        let job: NewJob = serde_json::from_value(serde_json::json!({
            "external_id": "job-123",
            "title": "Analyst",
            "company": "Finance Corp"
        }))
        .unwrap();
        assert_eq!(job.source, "manual");
        assert!(job.skills_required.is_empty());
        assert!(job.validate().is_ok());

        let blank = NewJob {
            title: "  ".to_string(),
            ..job
        };
        assert!(blank.validate().is_err());
    }
}
