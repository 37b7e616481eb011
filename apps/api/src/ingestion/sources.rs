//! Keyless public job boards: Remotive, Arbeitnow, RemoteOK, Jobicy.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::IngestError;
use crate::ingestion::{clean_html, clean_tags, parse_salary_text, salary_bound, salary_range, JobSource};
use crate::models::job::NewJob;

pub const SOURCE_NAMES: [&str; 4] = ["remotive", "arbeitnow", "remoteok", "jobicy"];

/// Looks a source up by its path name.
pub fn source_by_name(name: &str) -> Result<Box<dyn JobSource>, IngestError> {
    match name.to_ascii_lowercase().as_str() {
        "remotive" => Ok(Box::new(Remotive::default())),
        "arbeitnow" => Ok(Box::new(Arbeitnow::default())),
        "remoteok" => Ok(Box::new(RemoteOk)),
        "jobicy" => Ok(Box::new(Jobicy::default())),
        other => Err(IngestError::UnknownSource(other.to_string())),
    }
}

async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    source_name: &'static str,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, IngestError> {
    debug!(source = source_name, url, "Fetching job feed");
    let response = client.get(url).query(query).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(IngestError::Api {
            source_name,
            status: status.as_u16(),
        });
    }
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Feed ids arrive as numbers or strings depending on the board.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Remotive
// ────────────────────────────────────────────────────────────────────────────

pub struct Remotive {
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
}

impl Default for Remotive {
    fn default() -> Self {
        Self {
            category: Some("software-dev".to_string()),
            search: Some("Software Engineer".to_string()),
            limit: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RemotiveFeed {
    #[serde(default)]
    pub jobs: Vec<RemotiveJob>,
}

#[derive(Debug, Deserialize)]
pub struct RemotiveJob {
    pub id: Value,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub candidate_required_location: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub description: String,
}

pub fn normalize_remotive(job: RemotiveJob) -> Option<NewJob> {
    let id = id_string(&job.id)?;
    let title = job.title.trim().to_string();
    if title.is_empty() {
        return None;
    }
    Some(NewJob {
        external_id: format!("remotive-{id}"),
        title,
        company: job.company_name.trim().to_string(),
        location: non_empty(job.candidate_required_location).or_else(|| Some("Remote".to_string())),
        description: clean_html(&job.description),
        skills_required: clean_tags(&job.tags),
        salary_range: job.salary.as_deref().and_then(parse_salary_text),
        source: "Remotive".to_string(),
        source_url: non_empty(job.url),
    })
}

#[async_trait]
impl JobSource for Remotive {
    fn name(&self) -> &'static str {
        "remotive"
    }

    async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<NewJob>, IngestError> {
        let mut query = Vec::new();
        if let Some(category) = &self.category {
            query.push(("category", category.clone()));
        }
        if let Some(search) = &self.search {
            query.push(("search", search.clone()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        let feed: RemotiveFeed =
            get_json(client, self.name(), "https://remotive.com/api/remote-jobs", &query).await?;
        Ok(feed.jobs.into_iter().filter_map(normalize_remotive).collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Arbeitnow
// ────────────────────────────────────────────────────────────────────────────

pub struct Arbeitnow {
    pub page: Option<u32>,
    pub remote_only: bool,
    /// Case-insensitive title filter; the feed itself has no search parameter.
    pub keywords: Option<String>,
}

impl Default for Arbeitnow {
    fn default() -> Self {
        Self {
            page: None,
            remote_only: true,
            keywords: Some("Software Engineer".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ArbeitnowFeed {
    #[serde(default)]
    pub data: Vec<ArbeitnowJob>,
}

#[derive(Debug, Deserialize)]
pub struct ArbeitnowJob {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub salary_min: Option<Value>,
    #[serde(default)]
    pub salary_max: Option<Value>,
}

impl Arbeitnow {
    fn keep(&self, job: &ArbeitnowJob) -> bool {
        if self.remote_only && !job.remote {
            return false;
        }
        match &self.keywords {
            Some(keywords) => job.title.to_lowercase().contains(&keywords.to_lowercase()),
            None => true,
        }
    }
}

pub fn normalize_arbeitnow(job: ArbeitnowJob) -> Option<NewJob> {
    let id = non_empty(job.slug).or_else(|| job.id.as_ref().and_then(id_string))?;
    let title = job.title.trim().to_string();
    if title.is_empty() {
        return None;
    }
    Some(NewJob {
        external_id: format!("arbeitnow-{id}"),
        title,
        company: job.company_name.trim().to_string(),
        location: non_empty(job.location).or_else(|| Some("Remote".to_string())),
        description: clean_html(&job.description),
        skills_required: clean_tags(&job.tags),
        salary_range: salary_range(
            salary_bound(job.salary_min.as_ref()),
            salary_bound(job.salary_max.as_ref()),
            None,
        ),
        source: "Arbeitnow".to_string(),
        source_url: non_empty(job.url),
    })
}

#[async_trait]
impl JobSource for Arbeitnow {
    fn name(&self) -> &'static str {
        "arbeitnow"
    }

    async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<NewJob>, IngestError> {
        let query: Vec<(&str, String)> = self
            .page
            .map(|page| vec![("page", page.to_string())])
            .unwrap_or_default();
        let feed: ArbeitnowFeed = get_json(
            client,
            self.name(),
            "https://www.arbeitnow.com/api/job-board-api",
            &query,
        )
        .await?;
        Ok(feed
            .data
            .into_iter()
            .filter(|job| self.keep(job))
            .filter_map(normalize_arbeitnow)
            .collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RemoteOK
// ────────────────────────────────────────────────────────────────────────────

pub struct RemoteOk;

#[derive(Debug, Deserialize)]
pub struct RemoteOkJob {
    /// Absent on the leading legal-notice element of the feed.
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary_min: Option<Value>,
    #[serde(default)]
    pub salary_max: Option<Value>,
    #[serde(default)]
    pub url: Option<String>,
}

pub fn normalize_remoteok(job: RemoteOkJob) -> Option<NewJob> {
    let id = job.id.as_ref().and_then(id_string)?;
    let title = job.position.trim().to_string();
    if title.is_empty() {
        return None;
    }
    Some(NewJob {
        external_id: format!("remoteok-{id}"),
        title,
        company: job.company.trim().to_string(),
        location: non_empty(job.location).or_else(|| Some("Remote".to_string())),
        description: clean_html(&job.description),
        skills_required: clean_tags(&job.tags),
        salary_range: salary_range(
            salary_bound(job.salary_min.as_ref()),
            salary_bound(job.salary_max.as_ref()),
            Some("USD".to_string()),
        ),
        source: "RemoteOK".to_string(),
        source_url: non_empty(job.url),
    })
}

#[async_trait]
impl JobSource for RemoteOk {
    fn name(&self) -> &'static str {
        "remoteok"
    }

    async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<NewJob>, IngestError> {
        let feed: Vec<RemoteOkJob> =
            get_json(client, self.name(), "https://remoteok.com/api", &[]).await?;
        Ok(feed.into_iter().filter_map(normalize_remoteok).collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Jobicy
// ────────────────────────────────────────────────────────────────────────────

pub struct Jobicy {
    pub count: u32,
    pub tag: Option<String>,
    pub geo: Option<String>,
    pub industry: Option<String>,
}

impl Default for Jobicy {
    fn default() -> Self {
        Self {
            count: 100,
            tag: Some("Software Engineer".to_string()),
            geo: None,
            industry: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JobicyFeed {
    #[serde(default)]
    pub jobs: Vec<JobicyJob>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobicyJob {
    pub id: Value,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub job_industry: Vec<String>,
    #[serde(default)]
    pub job_geo: Option<String>,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub annual_salary_min: Option<Value>,
    #[serde(default)]
    pub annual_salary_max: Option<Value>,
    #[serde(default)]
    pub salary_currency: Option<String>,
}

pub fn normalize_jobicy(job: JobicyJob) -> Option<NewJob> {
    let id = id_string(&job.id)?;
    let title = clean_html(&job.job_title);
    if title.is_empty() {
        return None;
    }
    Some(NewJob {
        external_id: format!("jobicy-{id}"),
        title,
        company: job.company_name.trim().to_string(),
        location: non_empty(job.job_geo).or_else(|| Some("Remote".to_string())),
        description: clean_html(&job.job_description),
        skills_required: clean_tags(job.job_industry.iter().map(|i| clean_html(i))),
        salary_range: salary_range(
            salary_bound(job.annual_salary_min.as_ref()),
            salary_bound(job.annual_salary_max.as_ref()),
            non_empty(job.salary_currency),
        ),
        source: "Jobicy".to_string(),
        source_url: non_empty(job.url),
    })
}

#[async_trait]
impl JobSource for Jobicy {
    fn name(&self) -> &'static str {
        "jobicy"
    }

    async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<NewJob>, IngestError> {
        let mut query = vec![("count", self.count.to_string())];
        if let Some(tag) = &self.tag {
            query.push(("tag", tag.clone()));
        }
        if let Some(geo) = &self.geo {
            query.push(("geo", geo.clone()));
        }
        if let Some(industry) = &self.industry {
            query.push(("industry", industry.clone()));
        }
        let feed: JobicyFeed =
            get_json(client, self.name(), "https://jobicy.com/api/v2/remote-jobs", &query).await?;
        Ok(feed.jobs.into_iter().filter_map(normalize_jobicy).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_lookup() {
        for name in SOURCE_NAMES {
            assert_eq!(source_by_name(name).unwrap().name(), name);
        }
        assert!(matches!(
            source_by_name("adzuna"),
            Err(IngestError::UnknownSource(_))
        ));
    }

    #[test]
    fn test_remotive_normalization() {
        let job: RemotiveJob = serde_json::from_value(json!({
            "id": 1911830,
            "url": "https://remotive.com/remote-jobs/software-dev/rust-1911830",
            "title": "Senior Rust Engineer ",
            "company_name": "Ferrous",
            "tags": ["rust", "tokio", "Rust"],
            "candidate_required_location": "",
            "salary": "$140k - $170k",
            "description": "<p>Build <strong>async</strong> services.</p>"
        }))
        .unwrap();
        let normalized = normalize_remotive(job).unwrap();
        assert_eq!(normalized.external_id, "remotive-1911830");
        assert_eq!(normalized.title, "Senior Rust Engineer");
        assert_eq!(normalized.location.as_deref(), Some("Remote"));
        assert_eq!(normalized.description, "Build async services.");
        assert_eq!(normalized.skills_required, vec!["rust", "tokio"]);
        let salary = normalized.salary_range.unwrap();
        assert_eq!(salary.bounds(), Some((140_000.0, 170_000.0)));
    }

    #[test]
    fn test_arbeitnow_filters_and_normalizes() {
        let feed: ArbeitnowFeed = serde_json::from_value(json!({
            "data": [
                {"slug": "se-berlin-123", "title": "Software Engineer (Backend)", "company_name": "Acme",
                 "remote": true, "tags": ["Go"], "description": "Go &amp; gRPC", "location": "Berlin"},
                {"slug": "onsite-1", "title": "Software Engineer", "company_name": "Acme",
                 "remote": false, "tags": [], "description": ""},
                {"slug": "pm-1", "title": "Product Manager", "company_name": "Acme",
                 "remote": true, "tags": [], "description": ""}
            ]
        }))
        .unwrap();
        let source = Arbeitnow::default();
        let kept: Vec<NewJob> = feed
            .data
            .into_iter()
            .filter(|job| source.keep(job))
            .filter_map(normalize_arbeitnow)
            .collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].external_id, "arbeitnow-se-berlin-123");
        assert_eq!(kept[0].description, "Go & gRPC");
        assert_eq!(kept[0].salary_range, None);
    }

    #[test]
    fn test_remoteok_skips_legal_notice_and_zero_salary() {
        let feed: Vec<RemoteOkJob> = serde_json::from_value(json!([
            {"legal": "API terms"},
            {"id": "98765", "position": "Platform Engineer", "company": "Cloudy",
             "tags": ["kubernetes", "aws"], "description": "<div>K8s</div>",
             "salary_min": 0, "salary_max": 0},
            {"id": 5, "position": "Data Engineer", "company": "Datum",
             "salary_min": 90000, "salary_max": 120000}
        ]))
        .unwrap();
        let jobs: Vec<NewJob> = feed.into_iter().filter_map(normalize_remoteok).collect();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].external_id, "remoteok-98765");
        assert_eq!(jobs[0].salary_range, None);
        assert_eq!(
            jobs[1].salary_range.as_ref().and_then(|r| r.bounds()),
            Some((90_000.0, 120_000.0))
        );
    }

    #[test]
    fn test_jobicy_normalization() {
        let job: JobicyJob = serde_json::from_value(json!({
            "id": 112233,
            "url": "https://jobicy.com/jobs/112233",
            "jobTitle": "Backend Developer &amp; SRE",
            "companyName": "Jobly",
            "jobIndustry": ["Programming &amp; Development", "DevOps"],
            "jobGeo": "USA",
            "jobDescription": "<p>Python and Kubernetes</p>",
            "annualSalaryMin": "80000",
            "annualSalaryMax": 110000,
            "salaryCurrency": "USD"
        }))
        .unwrap();
        let normalized = normalize_jobicy(job).unwrap();
        assert_eq!(normalized.title, "Backend Developer & SRE");
        assert_eq!(
            normalized.skills_required,
            vec!["Programming & Development", "DevOps"]
        );
        let salary = normalized.salary_range.unwrap();
        assert_eq!(salary.bounds(), Some((80_000.0, 110_000.0)));
        assert_eq!(salary.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_entries_without_id_or_title_dropped() {
        let job: RemotiveJob =
            serde_json::from_value(json!({"id": null, "title": "Engineer"})).unwrap();
        assert!(normalize_remotive(job).is_none());

        let job: RemoteOkJob = serde_json::from_value(json!({"id": 1, "position": " "})).unwrap();
        assert!(normalize_remoteok(job).is_none());
    }
}
