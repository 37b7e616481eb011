//! Live matchers, one slot per model kind.
//!
//! Requests clone the slot's `Arc` under a brief read lock and then score without
//! any lock held. A retrain loads the new artifact off to the side and installs it
//! with a single write, so in-flight requests finish on the matcher they started with.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use crate::errors::MatchError;
use crate::matching::encoder::SentenceEncoder;
use crate::matching::lexical::LexicalMatcher;
use crate::matching::normalizer::Normalizer;
use crate::matching::semantic::SemanticMatcher;
use crate::matching::{JobMatcher, ModelChoice};

type Slot = RwLock<Option<Arc<dyn JobMatcher>>>;

pub struct MatcherRegistry {
    normalizer: Arc<Normalizer>,
    encoder: Option<Arc<dyn SentenceEncoder>>,
    lexical_path: PathBuf,
    semantic_path: PathBuf,
    lexical: Slot,
    semantic: Slot,
    /// Serializes corpus builds so two retrains never race on one artifact file.
    build_lock: tokio::sync::Mutex<()>,
}

impl MatcherRegistry {
    pub fn new(
        normalizer: Arc<Normalizer>,
        encoder: Option<Arc<dyn SentenceEncoder>>,
        lexical_path: PathBuf,
        semantic_path: PathBuf,
    ) -> Self {
        Self {
            normalizer,
            encoder,
            lexical_path,
            semantic_path,
            lexical: RwLock::new(None),
            semantic: RwLock::new(None),
            build_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn normalizer(&self) -> &Arc<Normalizer> {
        &self.normalizer
    }

    pub fn encoder(&self) -> Result<&Arc<dyn SentenceEncoder>, MatchError> {
        self.encoder.as_ref().ok_or(MatchError::EncoderUnavailable)
    }

    pub fn artifact_path(&self, kind: ModelChoice) -> &Path {
        match kind {
            ModelChoice::Lexical => &self.lexical_path,
            ModelChoice::Semantic => &self.semantic_path,
        }
    }

    /// Kinds this process is able to build and serve.
    pub fn buildable(&self) -> Vec<ModelChoice> {
        ModelChoice::ALL
            .into_iter()
            .filter(|kind| *kind != ModelChoice::Semantic || self.encoder.is_some())
            .collect()
    }

    pub(crate) fn build_lock(&self) -> &tokio::sync::Mutex<()> {
        &self.build_lock
    }

    fn slot(&self, kind: ModelChoice) -> &Slot {
        match kind {
            ModelChoice::Lexical => &self.lexical,
            ModelChoice::Semantic => &self.semantic,
        }
    }

    /// The live matcher for `kind`, or the reason none is loaded.
    pub fn get(&self, kind: ModelChoice) -> Result<Arc<dyn JobMatcher>, MatchError> {
        let current = self
            .slot(kind)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match current {
            Some(matcher) => Ok(matcher),
            None if kind == ModelChoice::Semantic && self.encoder.is_none() => {
                Err(MatchError::EncoderUnavailable)
            }
            None => Err(MatchError::ModelNotFound(self.artifact_path(kind).to_path_buf())),
        }
    }

    pub fn is_loaded(&self, kind: ModelChoice) -> bool {
        self.slot(kind)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replaces the live matcher of the matcher's own kind.
    pub fn install(&self, matcher: Arc<dyn JobMatcher>) {
        let kind = matcher.kind();
        *self.slot(kind).write().unwrap_or_else(PoisonError::into_inner) = Some(matcher);
        info!(model = %kind, "Installed matcher");
    }

    /// Loads the artifact for `kind` from disk and swaps it in.
    /// On failure the previously installed matcher, if any, stays live.
    pub fn reload(&self, kind: ModelChoice) -> Result<(), MatchError> {
        let path = self.artifact_path(kind);
        let matcher: Arc<dyn JobMatcher> = match kind {
            ModelChoice::Lexical => Arc::new(LexicalMatcher::load(path, self.normalizer.clone())?),
            ModelChoice::Semantic => Arc::new(SemanticMatcher::load(
                path,
                self.encoder()?.clone(),
                self.normalizer.clone(),
            )?),
        };
        self.install(matcher);
        Ok(())
    }

    /// Startup load of every artifact. Missing or stale artifacts are logged, not fatal.
    pub fn load_all(&self) {
        for kind in ModelChoice::ALL {
            if let Err(e) = self.reload(kind) {
                warn!(model = %kind, "Matcher not loaded: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::artifact::save_artifact;
    use crate::matching::corpus::build_lexical_index;
    use crate::matching::corpus::fixtures::job;
    use crate::matching::encoder::testing::KeywordEncoder;

    fn registry(dir: &Path, encoder: Option<Arc<dyn SentenceEncoder>>) -> MatcherRegistry {
        MatcherRegistry::new(
            Arc::new(Normalizer::new()),
            encoder,
            dir.join("lexical.bin"),
            dir.join("semantic.bin"),
        )
    }

    #[test]
    fn test_get_before_load_reports_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let encoder: Arc<dyn SentenceEncoder> = Arc::new(KeywordEncoder::new(&["rust"]));
        let reg = registry(dir.path(), Some(encoder));
        reg.load_all();
        assert!(matches!(
            reg.get(ModelChoice::Lexical),
            Err(MatchError::ModelNotFound(_))
        ));
        assert!(matches!(
            reg.get(ModelChoice::Semantic),
            Err(MatchError::ModelNotFound(_))
        ));
    }

    #[test]
    fn test_semantic_without_encoder_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path(), None);
        assert!(matches!(
            reg.get(ModelChoice::Semantic),
            Err(MatchError::EncoderUnavailable)
        ));
        assert_eq!(reg.buildable(), vec![ModelChoice::Lexical]);
    }

    #[test]
    fn test_reload_installs_and_failed_reload_keeps_previous() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path(), None);
        let jobs = vec![
            job("A", "Rust Tokio", &[], None),
            job("B", "Rust Tokio", &[], None),
        ];
        let artifact = build_lexical_index(&jobs, reg.normalizer()).unwrap();
        save_artifact(reg.artifact_path(ModelChoice::Lexical), &artifact).unwrap();

        reg.reload(ModelChoice::Lexical).unwrap();
        let before = reg.get(ModelChoice::Lexical).unwrap();

        std::fs::remove_file(reg.artifact_path(ModelChoice::Lexical)).unwrap();
        assert!(reg.reload(ModelChoice::Lexical).is_err());
        let after = reg.get(ModelChoice::Lexical).unwrap();
        assert!(Arc::ptr_eq(&before, &after));
    }
}
