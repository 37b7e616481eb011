//! Fitted model artifacts and their on-disk format.
//!
//! Each artifact is one bincode bundle: fitted transform state, the row matrix,
//! and the corpus frame the rows point back into. Writes go to a temp file in the
//! target directory and are renamed over the old artifact, so a concurrent reader
//! sees either the previous bundle or the new one.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::errors::MatchError;
use crate::matching::tfidf::{SparseVec, TfidfVectorizer};
use crate::matching::ModelChoice;
use crate::models::job::SalaryRange;

/// Bumped whenever the layout of either artifact changes.
pub const ARTIFACT_VERSION: u32 = 1;

/// One row of the corpus frame. Row `i` of a matrix belongs to entry `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub job_id: Uuid,
    pub external_id: String,
    pub title: String,
    pub company: String,
    pub skills_required: Vec<String>,
    pub salary_range: Option<SalaryRange>,
    pub processed_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalArtifact {
    pub version: u32,
    pub kind: ModelChoice,
    pub built_at: DateTime<Utc>,
    pub vectorizer: TfidfVectorizer,
    pub matrix: Vec<SparseVec>,
    pub corpus: Vec<CorpusEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticArtifact {
    pub version: u32,
    pub kind: ModelChoice,
    pub built_at: DateTime<Utc>,
    /// Encoder that produced `embeddings`; queries must use the same one.
    pub model_id: String,
    pub dim: usize,
    pub embeddings: Vec<Vec<f32>>,
    pub corpus: Vec<CorpusEntry>,
}

/// Leading fields shared by every artifact, decoded before the full bundle.
#[derive(Debug, Deserialize)]
struct ArtifactHeader {
    version: u32,
    kind: ModelChoice,
}

pub trait Artifact: Serialize + DeserializeOwned {
    const KIND: ModelChoice;

    fn rows(&self) -> usize;
    fn built_at(&self) -> DateTime<Utc>;
}

impl Artifact for LexicalArtifact {
    const KIND: ModelChoice = ModelChoice::Lexical;

    fn rows(&self) -> usize {
        self.matrix.len()
    }

    fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

impl Artifact for SemanticArtifact {
    const KIND: ModelChoice = ModelChoice::Semantic;

    fn rows(&self) -> usize {
        self.embeddings.len()
    }

    fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

/// Serializes `artifact` to `path`, replacing any previous file atomically.
pub fn save_artifact<A: Artifact>(path: &Path, artifact: &A) -> Result<(), MatchError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        bincode::serialize_into(&mut writer, artifact)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| MatchError::Io(e.error))?;

    tracing::info!(
        path = %path.display(),
        kind = %A::KIND,
        rows = artifact.rows(),
        "Saved model artifact"
    );
    Ok(())
}

/// Reads an artifact, checking format version and model kind before decoding the payload.
pub fn load_artifact<A: Artifact>(path: &Path) -> Result<A, MatchError> {
    if !path.is_file() {
        return Err(MatchError::ModelNotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path)?;

    let header: ArtifactHeader =
        bincode::deserialize(&bytes).map_err(|e| MatchError::IncompatibleArtifact {
            path: path.to_path_buf(),
            reason: format!("unreadable header: {e}"),
        })?;
    if header.version != ARTIFACT_VERSION {
        return Err(MatchError::IncompatibleArtifact {
            path: path.to_path_buf(),
            reason: format!(
                "format version {} (expected {ARTIFACT_VERSION})",
                header.version
            ),
        });
    }
    if header.kind != A::KIND {
        return Err(MatchError::IncompatibleArtifact {
            path: path.to_path_buf(),
            reason: format!("holds a {} model, expected {}", header.kind, A::KIND),
        });
    }

    let artifact: A = bincode::deserialize(&bytes)?;
    tracing::info!(
        path = %path.display(),
        kind = %A::KIND,
        rows = artifact.rows(),
        built_at = %artifact.built_at(),
        "Loaded model artifact"
    );
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::tfidf::TfidfParams;

    fn entry(title: &str) -> CorpusEntry {
        CorpusEntry {
            job_id: Uuid::new_v4(),
            external_id: format!("ext-{title}"),
            title: title.to_string(),
            company: "Acme".to_string(),
            skills_required: vec!["rust".to_string()],
            salary_range: None,
            processed_text: "rust tokio".to_string(),
        }
    }

    fn semantic(version: u32) -> SemanticArtifact {
        SemanticArtifact {
            version,
            kind: ModelChoice::Semantic,
            built_at: Utc::now(),
            model_id: "fake".to_string(),
            dim: 2,
            embeddings: vec![vec![1.0, 0.0]],
            corpus: vec![entry("a")],
        }
    }

    #[test]
    fn test_missing_file_is_model_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_artifact::<LexicalArtifact>(&dir.path().join("nope.bin")).unwrap_err();
        assert!(matches!(err, MatchError::ModelNotFound(_)));
    }

    #[test]
    fn test_lexical_artifact_reloads_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("lexical.bin");
        let docs = vec!["rust tokio".to_string(), "rust tokio axum".to_string()];
        let (vectorizer, matrix) = TfidfVectorizer::fit_transform(&docs, TfidfParams::default());
        let artifact = LexicalArtifact {
            version: ARTIFACT_VERSION,
            kind: ModelChoice::Lexical,
            built_at: Utc::now(),
            vectorizer,
            matrix,
            corpus: vec![entry("a"), entry("b")],
        };

        save_artifact(&path, &artifact).unwrap();
        let loaded: LexicalArtifact = load_artifact(&path).unwrap();
        assert_eq!(loaded.corpus, artifact.corpus);
        assert_eq!(loaded.matrix, artifact.matrix);
        // The token regex is rebuilt on load.
        assert_eq!(
            loaded.vectorizer.transform("tokio"),
            artifact.vectorizer.transform("tokio")
        );
    }

    #[test]
    fn test_save_replaces_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semantic.bin");
        save_artifact(&path, &semantic(ARTIFACT_VERSION)).unwrap();

        let mut second = semantic(ARTIFACT_VERSION);
        second.model_id = "replacement".to_string();
        save_artifact(&path, &second).unwrap();

        let loaded: SemanticArtifact = load_artifact(&path).unwrap();
        assert_eq!(loaded.model_id, "replacement");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_version_mismatch_is_incompatible() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("semantic.bin");
        save_artifact(&path, &semantic(ARTIFACT_VERSION + 1)).unwrap();
        let err = load_artifact::<SemanticArtifact>(&path).unwrap_err();
        assert!(matches!(err, MatchError::IncompatibleArtifact { .. }));
    }

    #[test]
    fn test_wrong_kind_is_incompatible() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        save_artifact(&path, &semantic(ARTIFACT_VERSION)).unwrap();
        let err = load_artifact::<LexicalArtifact>(&path).unwrap_err();
        assert!(matches!(err, MatchError::IncompatibleArtifact { .. }));
    }

    #[test]
    fn test_garbage_file_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexical.bin");
        fs::write(&path, b"\x01").unwrap();
        assert!(load_artifact::<LexicalArtifact>(&path).is_err());
    }
}
