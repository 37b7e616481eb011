//! Corpus Builder: fits lexical and semantic models over the full job collection.
//!
//! Batch work: every build recomputes the whole corpus frame from scratch.

use std::time::Instant;

use chrono::Utc;
use sqlx::PgPool;
use tracing::info;

use crate::errors::MatchError;
use crate::matching::artifact::{CorpusEntry, LexicalArtifact, SemanticArtifact, ARTIFACT_VERSION};
use crate::matching::encoder::SentenceEncoder;
use crate::matching::normalizer::Normalizer;
use crate::matching::tfidf::{TfidfParams, TfidfVectorizer};
use crate::matching::ModelChoice;
use crate::models::job::{JobRecord, JobRow};

/// Texts encoded per encoder call while building the semantic index.
const ENCODE_BATCH_SIZE: usize = 32;

/// Full-collection scan of postings, in a stable order.
pub async fn load_corpus(pool: &PgPool) -> Result<Vec<JobRecord>, MatchError> {
    let rows = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT id, external_id, title, company, location, description,
               skills_required, salary_range, source, source_url, ingested_at
        FROM jobs
        ORDER BY ingested_at, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(JobRecord::from).collect())
}

fn corpus_entry(job: &JobRecord, processed_text: String) -> CorpusEntry {
    CorpusEntry {
        job_id: job.id,
        external_id: job.external_id.clone(),
        title: job.title.clone(),
        company: job.company.clone(),
        skills_required: job.skills_required.clone(),
        salary_range: job.salary_range.clone(),
        processed_text,
    }
}

/// Lemmatizes every description and fits the TF-IDF space over the joined lemmas.
pub fn build_lexical_index(
    jobs: &[JobRecord],
    normalizer: &Normalizer,
) -> Result<LexicalArtifact, MatchError> {
    if jobs.is_empty() {
        return Err(MatchError::EmptyCorpus);
    }
    let started = Instant::now();

    let corpus: Vec<CorpusEntry> = jobs
        .iter()
        .map(|job| {
            let processed = normalizer.normalize_for_lexical(&job.description).join(" ");
            corpus_entry(job, processed)
        })
        .collect();
    let documents: Vec<String> = corpus.iter().map(|e| e.processed_text.clone()).collect();

    let (vectorizer, matrix) = TfidfVectorizer::fit_transform(&documents, TfidfParams::default());

    info!(
        documents = corpus.len(),
        vocabulary = vectorizer.vocabulary_len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Built lexical index"
    );

    Ok(LexicalArtifact {
        version: ARTIFACT_VERSION,
        kind: ModelChoice::Lexical,
        built_at: Utc::now(),
        vectorizer,
        matrix,
        corpus,
    })
}

/// Encodes every lightly normalized description with the sentence encoder.
pub fn build_semantic_index(
    jobs: &[JobRecord],
    normalizer: &Normalizer,
    encoder: &dyn SentenceEncoder,
) -> Result<SemanticArtifact, MatchError> {
    if jobs.is_empty() {
        return Err(MatchError::EmptyCorpus);
    }
    let started = Instant::now();

    let corpus: Vec<CorpusEntry> = jobs
        .iter()
        .map(|job| corpus_entry(job, normalizer.normalize_for_semantic(&job.description)))
        .collect();

    let mut embeddings = Vec::with_capacity(corpus.len());
    for chunk in corpus.chunks(ENCODE_BATCH_SIZE) {
        let texts: Vec<&str> = chunk.iter().map(|e| e.processed_text.as_str()).collect();
        let batch = encoder.encode(&texts)?;
        if batch.len() != texts.len() {
            return Err(MatchError::Encoder(format!(
                "encoder returned {} vectors for {} texts",
                batch.len(),
                texts.len()
            )));
        }
        if let Some(bad) = batch.iter().find(|v| v.len() != encoder.dim()) {
            return Err(MatchError::Encoder(format!(
                "encoder returned a {}-dim vector, expected {}",
                bad.len(),
                encoder.dim()
            )));
        }
        embeddings.extend(batch);
    }

    info!(
        documents = corpus.len(),
        dim = encoder.dim(),
        model = encoder.model_id(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Built semantic index"
    );

    Ok(SemanticArtifact {
        version: ARTIFACT_VERSION,
        kind: ModelChoice::Semantic,
        built_at: Utc::now(),
        model_id: encoder.model_id().to_string(),
        dim: encoder.dim(),
        embeddings,
        corpus,
    })
}
