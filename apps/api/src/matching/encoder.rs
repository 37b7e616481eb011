//! Sentence encoder seam used by the semantic corpus build and matcher.
//!
//! The ONNX Runtime implementation (all-MiniLM-L6-v2, 384 dimensions) lives behind
//! the `onnx` cargo feature. The model directory must contain `model.onnx` and
//! `tokenizer.json`.

use crate::errors::MatchError;

/// Produces one L2-normalized embedding per input text.
pub trait SentenceEncoder: Send + Sync {
    /// Identifier recorded in semantic artifacts; a mismatch at load time is fatal.
    fn model_id(&self) -> &str;

    fn dim(&self) -> usize;

    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, MatchError>;
}

/// L2-normalize a vector in place.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Averages each row's unmasked token vectors out of a flat `[rows, width, dim]`
/// buffer, then L2-normalizes. A row with no unmasked tokens stays zero.
#[cfg_attr(not(feature = "onnx"), allow(dead_code))]
pub(crate) fn mean_pool(hidden: &[f32], mask: &[i64], width: usize, dim: usize) -> Vec<Vec<f32>> {
    let row_stride = width * dim;
    mask.chunks(width.max(1))
        .zip(hidden.chunks(row_stride.max(1)))
        .map(|(row_mask, row_hidden)| {
            let mut pooled = vec![0.0f32; dim];
            let mut kept = 0usize;
            for (token, _) in row_hidden
                .chunks(dim)
                .zip(row_mask)
                .filter(|(_, m)| **m > 0)
            {
                pooled.iter_mut().zip(token).for_each(|(p, v)| *p += v);
                kept += 1;
            }
            if kept > 0 {
                pooled.iter_mut().for_each(|p| *p /= kept as f32);
            }
            l2_normalize(&mut pooled);
            pooled
        })
        .collect()
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxEncoder;

#[cfg(feature = "onnx")]
mod onnx {
    use std::path::Path;
    use std::sync::Mutex;

    use ort::session::Session;
    use ort::value::Tensor;
    use tokenizers::Tokenizer;
    use tracing::info;

    use super::{mean_pool, SentenceEncoder};
    use crate::errors::MatchError;

    const MAX_SEQUENCE_LENGTH: usize = 256;
    /// all-MiniLM-L6-v2 output width, used when the graph leaves it symbolic.
    const DEFAULT_DIM: usize = 384;

    /// Mean-pooled sentence embeddings over an ONNX transformer.
    ///
    /// `Session::run` needs `&mut`, so the session sits behind a mutex; only the
    /// query encode of a request holds it, never the similarity scan.
    pub struct OnnxEncoder {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        model_id: String,
        dim: usize,
    }

    impl OnnxEncoder {
        pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
            anyhow::ensure!(
                tokenizer_path.exists(),
                "tokenizer.json not found in {model_dir:?}"
            );

            let session = Session::builder()?.commit_from_file(&model_path)?;
            let dim = match session.outputs()[0].dtype() {
                ort::value::ValueType::Tensor { shape, .. } => shape
                    .last()
                    .copied()
                    .filter(|&d| d > 0)
                    .map_or(DEFAULT_DIM, |d| d as usize),
                _ => DEFAULT_DIM,
            };

            let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
            tokenizer
                .with_truncation(Some(tokenizers::TruncationParams {
                    max_length: MAX_SEQUENCE_LENGTH,
                    ..Default::default()
                }))
                .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
            tokenizer.with_padding(Some(tokenizers::PaddingParams::default()));

            let model_id = model_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "sentence-encoder".to_string());

            info!(dim, model = %model_path.display(), "Loaded sentence encoder");
            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                model_id,
                dim,
            })
        }

        fn run(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
            let encodings = self
                .tokenizer
                .encode_batch(texts.to_vec(), true)
                .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;
            let batch = PaddedBatch::from_encodings(&encodings);
            let shape = [batch.rows as i64, batch.width as i64];
            let ids = Tensor::from_array((shape, batch.ids.into_boxed_slice()))?;
            let mask = Tensor::from_array((shape, batch.mask.clone().into_boxed_slice()))?;
            let type_ids = Tensor::from_array((shape, batch.type_ids.into_boxed_slice()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow::anyhow!("encoder session poisoned"))?;
            let outputs = session.run(ort::inputs![
                "input_ids" => ids,
                "attention_mask" => mask,
                "token_type_ids" => type_ids,
            ])?;

            let (out_shape, hidden) = outputs[0].try_extract_tensor::<f32>()?;
            let dims: &[i64] = out_shape;
            match dims {
                [rows, width, dim]
                    if *rows as usize == batch.rows
                        && *width as usize == batch.width
                        && *dim as usize == self.dim => {}
                other => anyhow::bail!(
                    "encoder returned shape {other:?} for a {}x{} batch of dim {}",
                    batch.rows,
                    batch.width,
                    self.dim
                ),
            }
            Ok(mean_pool(hidden, &batch.mask, batch.width, self.dim))
        }
    }

    /// Token ids, mask and type ids right-padded with zeros to the longest encoding.
    struct PaddedBatch {
        rows: usize,
        width: usize,
        ids: Vec<i64>,
        mask: Vec<i64>,
        type_ids: Vec<i64>,
    }

    impl PaddedBatch {
        fn from_encodings(encodings: &[tokenizers::Encoding]) -> Self {
            let rows = encodings.len();
            let width = encodings.iter().map(|e| e.len()).max().unwrap_or(0);
            let mut batch = Self {
                rows,
                width,
                ids: vec![0; rows * width],
                mask: vec![0; rows * width],
                type_ids: vec![0; rows * width],
            };
            for (row, encoding) in encodings.iter().enumerate() {
                let at = row * width;
                let n = encoding.len();
                let widen = |src: &[u32], dst: &mut [i64]| {
                    dst.iter_mut().zip(src).for_each(|(d, &s)| *d = i64::from(s));
                };
                widen(encoding.get_ids(), &mut batch.ids[at..at + n]);
                widen(encoding.get_attention_mask(), &mut batch.mask[at..at + n]);
                widen(encoding.get_type_ids(), &mut batch.type_ids[at..at + n]);
            }
            batch
        }
    }

    impl SentenceEncoder for OnnxEncoder {
        fn model_id(&self) -> &str {
            &self.model_id
        }

        fn dim(&self) -> usize {
            self.dim
        }

        fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, MatchError> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            self.run(texts)
                .map_err(|e| MatchError::Encoder(format!("{e:#}")))
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Deterministic bag-of-keywords encoder: one axis per keyword, L2-normalized.
    /// Text with none of the keywords encodes to the zero vector.
    pub struct KeywordEncoder {
        keywords: Vec<&'static str>,
    }

    impl KeywordEncoder {
        pub fn new(keywords: &[&'static str]) -> Self {
            Self {
                keywords: keywords.to_vec(),
            }
        }
    }

    impl SentenceEncoder for KeywordEncoder {
        fn model_id(&self) -> &str {
            "keyword-test"
        }

        fn dim(&self) -> usize {
            self.keywords.len()
        }

        fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, MatchError> {
            Ok(texts
                .iter()
                .map(|text| {
                    let lowered = text.to_lowercase();
                    let mut v: Vec<f32> = self
                        .keywords
                        .iter()
                        .map(|k| lowered.matches(k).count() as f32)
                        .collect();
                    l2_normalize(&mut v);
                    v
                })
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::KeywordEncoder;
    use super::*;

    #[test]
    fn test_l2_normalize_unit_and_zero() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6 && (v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[test]
    fn test_mean_pool_ignores_padding() {
        // two rows, width 3, dim 2; the second row's last two tokens are padding
        let hidden = [
            1.0, 0.0, 3.0, 0.0, 2.0, 0.0, //
            0.0, 5.0, 9.0, 9.0, 9.0, 9.0,
        ];
        let mask = [1, 1, 1, 1, 0, 0];
        let pooled = mean_pool(&hidden, &mask, 3, 2);
        assert_eq!(pooled, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_mean_pool_fully_masked_row_is_zero() {
        let pooled = mean_pool(&[4.0, 4.0], &[0], 1, 2);
        assert_eq!(pooled, vec![vec![0.0, 0.0]]);
    }

    #[test]
    fn test_keyword_encoder_shapes() {
        let encoder = KeywordEncoder::new(&["rust", "python"]);
        let out = encoder.encode(&["Rust rust", "nothing"]).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], vec![1.0, 0.0]);
        assert_eq!(out[1], vec![0.0, 0.0]);
    }
}
