//! Retrain: build from a loaded corpus, atomic save, reload, swap.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::errors::MatchError;
use crate::matching::artifact::{save_artifact, Artifact};
use crate::matching::corpus::{build_lexical_index, build_semantic_index};
use crate::matching::registry::MatcherRegistry;
use crate::matching::ModelChoice;
use crate::models::job::JobRecord;

#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    pub model: ModelChoice,
    pub documents: usize,
    pub artifact_path: String,
    pub built_at: DateTime<Utc>,
}

/// Builds `kind` from a loaded corpus and installs the result.
/// Builds on one registry never overlap.
pub async fn train_on(
    jobs: Vec<JobRecord>,
    registry: &Arc<MatcherRegistry>,
    kind: ModelChoice,
) -> Result<TrainReport, MatchError> {
    let _guard = registry.build_lock().lock().await;
    info!(model = %kind, documents = jobs.len(), "Training matcher");

    let reg = registry.clone();
    let (documents, built_at) =
        tokio::task::spawn_blocking(move || build_and_save(&reg, &jobs, kind)).await??;

    // Reload from disk so the live matcher is exactly what a restart would serve.
    let reg = registry.clone();
    tokio::task::spawn_blocking(move || reg.reload(kind)).await??;

    Ok(TrainReport {
        model: kind,
        documents,
        artifact_path: registry.artifact_path(kind).display().to_string(),
        built_at,
    })
}

fn build_and_save(
    registry: &MatcherRegistry,
    jobs: &[JobRecord],
    kind: ModelChoice,
) -> Result<(usize, DateTime<Utc>), MatchError> {
    let path = registry.artifact_path(kind);
    match kind {
        ModelChoice::Lexical => {
            let artifact = build_lexical_index(jobs, registry.normalizer())?;
            save_artifact(path, &artifact)?;
            Ok((artifact.rows(), artifact.built_at()))
        }
        ModelChoice::Semantic => {
            let encoder = registry.encoder()?;
            let artifact = build_semantic_index(jobs, registry.normalizer(), encoder.as_ref())?;
            save_artifact(path, &artifact)?;
            Ok((artifact.rows(), artifact.built_at()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::corpus::fixtures::job;
    use crate::matching::encoder::testing::KeywordEncoder;
    use crate::matching::encoder::SentenceEncoder;
    use crate::matching::normalizer::Normalizer;
    use crate::matching::profile::UserProfile;

    fn registry(dir: &std::path::Path) -> Arc<MatcherRegistry> {
        let encoder: Arc<dyn SentenceEncoder> = Arc::new(KeywordEncoder::new(&["rust", "python"]));
        Arc::new(MatcherRegistry::new(
            Arc::new(Normalizer::new()),
            Some(encoder),
            dir.join("models").join("lexical.bin"),
            dir.join("models").join("semantic.bin"),
        ))
    }

    #[tokio::test]
    async fn test_train_writes_artifact_and_swaps_matcher() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        let jobs = vec![
            job("A", "Rust Tokio services", &["Rust"], None),
            job("B", "Rust Tokio pipelines", &["Rust"], None),
            job("C", "Python Django", &["Python"], None),
        ];

        for kind in ModelChoice::ALL {
            let report = train_on(jobs.clone(), &reg, kind).await.unwrap();
            assert_eq!(report.documents, 3);
            assert!(reg.artifact_path(kind).is_file());
            assert!(reg.is_loaded(kind));
        }

        let profile = UserProfile {
            skills: vec!["Rust".to_string()],
            ..Default::default()
        };
        let semantic = reg.get(ModelChoice::Semantic).unwrap();
        let results = semantic.recommend(&profile, 5).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_corpus_leaves_registry_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        let err = train_on(Vec::new(), &reg, ModelChoice::Lexical)
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::EmptyCorpus));
        assert!(!reg.is_loaded(ModelChoice::Lexical));
        assert!(!reg.artifact_path(ModelChoice::Lexical).exists());
    }

    #[tokio::test]
    async fn test_semantic_training_requires_encoder() {
        let dir = tempfile::tempdir().unwrap();
        let reg = Arc::new(MatcherRegistry::new(
            Arc::new(Normalizer::new()),
            None,
            dir.path().join("lexical.bin"),
            dir.path().join("semantic.bin"),
        ));
        let jobs = vec![job("A", "Rust", &[], None)];
        let err = train_on(jobs, &reg, ModelChoice::Semantic).await.unwrap_err();
        assert!(matches!(err, MatchError::EncoderUnavailable));
    }
}
