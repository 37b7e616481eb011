//! Semantic Matcher: salary pre-filter, embedding cosine ranking, structured skill gaps.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::errors::MatchError;
use crate::matching::artifact::{load_artifact, CorpusEntry, SemanticArtifact};
use crate::matching::encoder::SentenceEncoder;
use crate::matching::normalizer::Normalizer;
use crate::matching::profile::UserProfile;
use crate::matching::{
    round_score, top_candidates, JobMatcher, MatchResult, ModelChoice, MAX_MISSING_SKILLS,
};
use crate::models::job::SalaryRange;

/// Embedding similarities run denser than TF-IDF, so the floor sits higher.
pub const SEMANTIC_SCORE_FLOOR: f32 = 0.20;

/// Whether a job's advertised pay band overlaps the user's requested band.
///
/// A user with no bounds accepts everything; a job with no salary data fails any
/// active user bound.
pub fn salary_matches(
    job: Option<&SalaryRange>,
    user_min: Option<f64>,
    user_max: Option<f64>,
) -> bool {
    if user_min.is_none() && user_max.is_none() {
        return true;
    }
    let Some((job_min, job_max)) = job.and_then(SalaryRange::bounds) else {
        return false;
    };
    user_min.map_or(true, |min| job_max >= min) && user_max.map_or(true, |max| job_min <= max)
}

pub struct SemanticMatcher {
    artifact: SemanticArtifact,
    encoder: Arc<dyn SentenceEncoder>,
    normalizer: Arc<Normalizer>,
}

impl SemanticMatcher {
    pub fn load(
        path: &Path,
        encoder: Arc<dyn SentenceEncoder>,
        normalizer: Arc<Normalizer>,
    ) -> Result<Self, MatchError> {
        let artifact: SemanticArtifact = load_artifact(path)?;
        Self::from_artifact(artifact, encoder, normalizer).map_err(|reason| {
            MatchError::IncompatibleArtifact {
                path: path.to_path_buf(),
                reason,
            }
        })
    }

    /// Wraps an in-memory artifact after checking it was built by this encoder.
    pub fn from_artifact(
        artifact: SemanticArtifact,
        encoder: Arc<dyn SentenceEncoder>,
        normalizer: Arc<Normalizer>,
    ) -> Result<Self, String> {
        if artifact.model_id != encoder.model_id() || artifact.dim != encoder.dim() {
            return Err(format!(
                "built with {} ({} dims), loaded encoder is {} ({} dims)",
                artifact.model_id,
                artifact.dim,
                encoder.model_id(),
                encoder.dim()
            ));
        }
        if artifact.embeddings.len() != artifact.corpus.len() {
            return Err(format!(
                "{} embeddings for {} corpus entries",
                artifact.embeddings.len(),
                artifact.corpus.len()
            ));
        }
        Ok(Self {
            artifact,
            encoder,
            normalizer,
        })
    }

    pub fn corpus_len(&self) -> usize {
        self.artifact.corpus.len()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Job skills the user lacks, compared case- and whitespace-insensitively, in job order.
fn missing_skills(entry: &CorpusEntry, user_skills: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    entry
        .skills_required
        .iter()
        .map(|skill| skill.trim().to_lowercase())
        .filter(|skill| !skill.is_empty() && !user_skills.contains(skill))
        .filter(|skill| seen.insert(skill.clone()))
        .take(MAX_MISSING_SKILLS)
        .collect()
}

impl JobMatcher for SemanticMatcher {
    fn kind(&self) -> ModelChoice {
        ModelChoice::Semantic
    }

    fn recommend(
        &self,
        profile: &UserProfile,
        top_n: usize,
    ) -> Result<Vec<MatchResult>, MatchError> {
        let eligible: Vec<usize> = self
            .artifact
            .corpus
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                salary_matches(
                    entry.salary_range.as_ref(),
                    profile.salary_min,
                    profile.salary_max,
                )
            })
            .map(|(row, _)| row)
            .collect();
        if eligible.is_empty() {
            return Ok(Vec::new());
        }

        let text = self.normalizer.normalize_for_semantic(&profile.semantic_text());
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let user_vec = self
            .encoder
            .encode(&[text.as_str()])?
            .into_iter()
            .next()
            .ok_or_else(|| MatchError::Encoder("encoder returned no vector".to_string()))?;

        let scored: Vec<(usize, f32)> = eligible
            .into_iter()
            .map(|row| (row, cosine(&user_vec, &self.artifact.embeddings[row])))
            .collect();

        let user_skills: HashSet<String> = profile
            .skills
            .iter()
            .map(|s| s.trim().to_lowercase())
            .collect();

        let results = top_candidates(scored, top_n)
            .into_iter()
            .filter(|&(_, similarity)| similarity >= SEMANTIC_SCORE_FLOOR)
            .map(|(row, similarity)| {
                let entry = &self.artifact.corpus[row];
                MatchResult {
                    job_id: entry.job_id,
                    score: round_score(similarity),
                    missing_skills: missing_skills(entry, &user_skills),
                    title: entry.title.clone(),
                    company: entry.company.clone(),
                }
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::artifact::save_artifact;
    use crate::matching::corpus::build_semantic_index;
    use crate::matching::corpus::fixtures::job;
    use crate::matching::encoder::testing::KeywordEncoder;
    use crate::models::job::JobRecord;

    const KEYWORDS: &[&str] = &["rust", "python", "kubernetes", "react"];

    fn range(min: Option<f64>, max: Option<f64>) -> SalaryRange {
        SalaryRange {
            min,
            max,
            currency: Some("USD".to_string()),
        }
    }

    fn matcher(jobs: &[JobRecord]) -> SemanticMatcher {
        let encoder: Arc<dyn SentenceEncoder> = Arc::new(KeywordEncoder::new(KEYWORDS));
        let normalizer = Arc::new(Normalizer::new());
        let artifact = build_semantic_index(jobs, &normalizer, encoder.as_ref()).unwrap();
        SemanticMatcher::from_artifact(artifact, encoder, normalizer).unwrap()
    }

    fn profile(skills: &[&str], min: Option<f64>, max: Option<f64>) -> UserProfile {
        UserProfile {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            salary_min: min,
            salary_max: max,
            ..Default::default()
        }
    }

    #[test]
    fn test_salary_no_user_bounds_passes_everything() {
        assert!(salary_matches(None, None, None));
        assert!(salary_matches(Some(&range(Some(1.0), Some(2.0))), None, None));
    }

    #[test]
    fn test_salary_missing_job_data_fails_active_filter() {
        assert!(!salary_matches(None, Some(50_000.0), Some(100_000.0)));
        assert!(!salary_matches(Some(&range(None, None)), Some(50_000.0), None));
    }

    #[test]
    fn test_salary_disjoint_ranges_excluded() {
        let job = range(Some(150_000.0), Some(180_000.0));
        assert!(!salary_matches(Some(&job), Some(50_000.0), Some(100_000.0)));
    }

    #[test]
    fn test_salary_overlap_and_single_bounds() {
        let job = range(Some(90_000.0), Some(120_000.0));
        assert!(salary_matches(Some(&job), Some(100_000.0), Some(200_000.0)));
        assert!(salary_matches(Some(&job), None, Some(90_000.0)));
        assert!(!salary_matches(Some(&job), Some(120_001.0), None));

        let point = range(Some(80_000.0), None);
        assert!(salary_matches(Some(&point), Some(70_000.0), Some(80_000.0)));
        assert!(!salary_matches(Some(&point), Some(80_001.0), None));
    }

    #[test]
    fn test_salary_ineligible_job_never_recommended() {
        let jobs = vec![
            job("Rich", "Rust systems work", &[], Some(range(Some(150_000.0), Some(180_000.0)))),
            job("Fit", "Rust and Python services", &[], Some(range(Some(60_000.0), Some(90_000.0)))),
        ];
        let results = matcher(&jobs)
            .recommend(&profile(&["Rust"], Some(50_000.0), Some(100_000.0)), 5)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].job_id, jobs[1].id);
    }

    #[test]
    fn test_no_eligible_jobs_returns_empty() {
        let jobs = vec![job("Unpaid", "Rust work", &[], None)];
        let results = matcher(&jobs)
            .recommend(&profile(&["Rust"], Some(50_000.0), None), 5)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_empty_profile_yields_no_matches() {
        let jobs = vec![
            job("Rust", "Rust services", &["Rust"], None),
            job("Frontend", "React dashboards", &["React"], None),
        ];
        let matcher = matcher(&jobs);
        assert!(matcher.recommend(&UserProfile::default(), 5).unwrap().is_empty());

        let level_only = UserProfile {
            experience_level: Some("senior".to_string()),
            ..Default::default()
        };
        assert!(matcher.recommend(&level_only, 5).unwrap().is_empty());
    }

    #[test]
    fn test_scores_bounded_and_floor_applied() {
        let jobs = vec![
            job("Rust", "Rust Rust Rust", &[], None),
            job("Mixed", "Rust Python Kubernetes React", &[], None),
            job("Frontend", "React only", &[], None),
        ];
        let results = matcher(&jobs).recommend(&profile(&["Rust"], None, None), 5).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].job_id, jobs[0].id);
        assert_eq!(results[0].score, 1.0);
        assert_eq!(results[1].score, 0.5);
        for r in &results {
            assert!(r.score >= 0.20 && r.score <= 1.0);
        }

        let top_one = matcher(&jobs).recommend(&profile(&["Rust"], None, None), 1).unwrap();
        assert_eq!(top_one.len(), 1);
    }

    #[test]
    fn test_missing_skills_structured_difference() {
        let jobs = vec![job(
            "Stack",
            "Rust backend",
            &[" Rust ", "Tokio", "tokio", "Postgres", "Redis", "Kafka", "Docker", "AWS"],
            None,
        )];
        let results = matcher(&jobs)
            .recommend(&profile(&["rust", "DOCKER"], None, None), 5)
            .unwrap();
        assert_eq!(
            results[0].missing_skills,
            vec!["tokio", "postgres", "redis", "kafka", "aws"]
        );
    }

    #[test]
    fn test_job_without_skills_reports_no_gap() {
        let jobs = vec![job("Bare", "Rust backend", &[], None)];
        let results = matcher(&jobs).recommend(&profile(&["Go", "Rust"], None, None), 5).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].missing_skills.is_empty());
    }

    #[test]
    fn test_experience_level_ignored_for_embedding() {
        let jobs = vec![job("Rust", "Rust work", &[], None)];
        let m = matcher(&jobs);
        let mut with_level = profile(&["Rust"], None, None);
        with_level.experience_level = Some("Senior React".to_string());
        let a = m.recommend(&with_level, 5).unwrap();
        let b = m.recommend(&profile(&["Rust"], None, None), 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_cosine_zero_vector_is_zero() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_load_rejects_other_encoder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semantic.bin");
        let normalizer = Arc::new(Normalizer::new());
        let jobs = vec![job("Rust", "Rust work", &[], None)];
        let artifact =
            build_semantic_index(&jobs, &normalizer, &KeywordEncoder::new(KEYWORDS)).unwrap();
        save_artifact(&path, &artifact).unwrap();

        let narrower: Arc<dyn SentenceEncoder> = Arc::new(KeywordEncoder::new(&["rust"]));
        let err = SemanticMatcher::load(&path, narrower, normalizer.clone())
            .err()
            .unwrap();
        assert!(matches!(err, MatchError::IncompatibleArtifact { .. }));

        let same: Arc<dyn SentenceEncoder> = Arc::new(KeywordEncoder::new(KEYWORDS));
        let loaded = SemanticMatcher::load(&path, same, normalizer).unwrap();
        assert_eq!(loaded.corpus_len(), 1);
    }
}
