//! Transformer sentence embeddings through ONNX Runtime.
//!
//! Text longer than the model window is split into token windows, each
//! window is mean-pooled over its attention mask, and the window vectors
//! are averaged into one unit-length document vector.

use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use onnxruntime::environment::Environment;
use onnxruntime::ndarray::{Array, Array2};
use onnxruntime::session::Session;
use rustc_hash::FxHashMap;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::nlp::embedding::l2_normalize_in_place;
use crate::nlp::AnalysisError;

pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 256;

static ORT_ENV: OnceCell<Environment> = OnceCell::new();

thread_local! {
    // `Session::run` needs `&mut`, so every blocking worker opens its own.
    static SESSIONS: RefCell<FxHashMap<PathBuf, Session<'static>>> =
        RefCell::new(FxHashMap::default());
}

/// Files of an exported sentence-embedding model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAssets {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub max_sequence_length: usize,
}

pub struct OnnxEmbedder {
    tokenizer: Tokenizer,
    model_path: PathBuf,
    max_sequence_length: usize,
}

struct EncodedWindow {
    ids: Vec<i64>,
    mask: Vec<i64>,
}

impl OnnxEmbedder {
    /// Loads the tokenizer and opens one session on the calling thread, so a
    /// missing or broken model fails here rather than on the first request.
    pub fn load(assets: &ModelAssets) -> Result<Self, AnalysisError> {
        if assets.max_sequence_length < 3 {
            return Err(unavailable(format!(
                "max sequence length {} leaves no room for content tokens",
                assets.max_sequence_length
            )));
        }
        let tokenizer = Tokenizer::from_file(&assets.tokenizer_path).map_err(|e| {
            unavailable(format!(
                "cannot load tokenizer {}: {e}",
                assets.tokenizer_path.display()
            ))
        })?;

        let embedder = Self {
            tokenizer,
            model_path: assets.model_path.clone(),
            max_sequence_length: assets.max_sequence_length,
        };
        embedder.with_session(|_| Ok(()))?;
        info!(
            "ONNX embedding model loaded from {} (window {} tokens)",
            assets.model_path.display(),
            assets.max_sequence_length
        );
        Ok(embedder)
    }

    /// Unit-length document vector; `None` for text without tokens.
    pub fn embed(&self, text: &str) -> Result<Option<Vec<f32>>, AnalysisError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let windows = self.encode_windows(text)?;
        if windows.is_empty() {
            return Ok(None);
        }
        let masks: Vec<Vec<i64>> = windows.iter().map(|w| w.mask.clone()).collect();
        let (input_ids, attention_mask) = padded_batch(windows)?;

        let (shape, flat) =
            self.with_session(|session| run_session(session, input_ids, attention_mask))?;
        let pooled = mean_pool(&flat, &shape, &masks)?;
        debug!("Embedded {} chars as {} window(s)", text.len(), pooled.len());
        Ok(average(&pooled))
    }

    fn encode_windows(&self, text: &str) -> Result<Vec<EncodedWindow>, AnalysisError> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| unavailable(format!("tokenization failed: {e}")))?;
        let ids = encoding.get_ids();
        // Two slots stay free for the special tokens added on re-encoding.
        let window = self.max_sequence_length - 2;

        let mut windows = Vec::new();
        for chunk in ids.chunks(window) {
            let piece = self
                .tokenizer
                .decode(chunk, true)
                .map_err(|e| unavailable(format!("detokenization failed: {e}")))?;
            if piece.trim().is_empty() {
                continue;
            }
            let encoded = self
                .tokenizer
                .encode(piece.as_str(), true)
                .map_err(|e| unavailable(format!("tokenization failed: {e}")))?;
            let mut ids: Vec<i64> = encoded.get_ids().iter().map(|&x| x as i64).collect();
            let mut mask: Vec<i64> = encoded
                .get_attention_mask()
                .iter()
                .map(|&x| x as i64)
                .collect();
            ids.truncate(self.max_sequence_length);
            mask.truncate(self.max_sequence_length);
            windows.push(EncodedWindow { ids, mask });
        }
        Ok(windows)
    }

    fn with_session<R>(
        &self,
        f: impl FnOnce(&mut Session<'static>) -> Result<R, AnalysisError>,
    ) -> Result<R, AnalysisError> {
        SESSIONS.with(|sessions| {
            let mut sessions = sessions.borrow_mut();
            let session = match sessions.entry(self.model_path.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(open_session(&self.model_path)?),
            };
            f(session)
        })
    }
}

fn unavailable(message: impl Into<String>) -> AnalysisError {
    AnalysisError::Unavailable(message.into())
}

fn open_session(model_path: &Path) -> Result<Session<'static>, AnalysisError> {
    let env = ORT_ENV
        .get_or_try_init(|| Environment::builder().with_name("matcher").build())
        .map_err(|e| unavailable(format!("onnx runtime init failed: {e}")))?;
    debug!("Opening ONNX session for {}", model_path.display());
    env.new_session_builder()
        .map_err(|e| unavailable(format!("onnx session builder failed: {e}")))?
        .with_model_from_file(model_path.to_path_buf())
        .map_err(|e| unavailable(format!("cannot load model {}: {e}", model_path.display())))
}

fn padded_batch(
    windows: Vec<EncodedWindow>,
) -> Result<(Array2<i64>, Array2<i64>), AnalysisError> {
    let batch = windows.len();
    let seq_len = windows.iter().map(|w| w.ids.len()).max().unwrap_or(0).max(1);
    let mut id_storage = Vec::with_capacity(batch * seq_len);
    let mut mask_storage = Vec::with_capacity(batch * seq_len);

    for EncodedWindow { mut ids, mut mask } in windows {
        if ids.len() != mask.len() {
            return Err(unavailable("tokenizer produced mismatched id/mask lengths"));
        }
        ids.resize(seq_len, 0);
        mask.resize(seq_len, 0);
        id_storage.extend(ids);
        mask_storage.extend(mask);
    }

    let input_ids = Array::from_shape_vec((batch, seq_len), id_storage)
        .map_err(|e| unavailable(e.to_string()))?;
    let attention_mask = Array::from_shape_vec((batch, seq_len), mask_storage)
        .map_err(|e| unavailable(e.to_string()))?;
    Ok((input_ids, attention_mask))
}

fn run_session(
    session: &mut Session<'static>,
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
) -> Result<(Vec<usize>, Vec<f32>), AnalysisError> {
    let (batch, seq_len) = input_ids.dim();
    let mut input_ids = Some(input_ids);
    let mut attention_mask = Some(attention_mask);
    let mut inputs = Vec::with_capacity(session.inputs.len());

    for input in &session.inputs {
        let tensor = match input.name.as_str() {
            "input_ids" => input_ids.take(),
            "attention_mask" => attention_mask.take(),
            "token_type_ids" => Some(Array::from_elem((batch, seq_len), 0_i64)),
            other => return Err(unavailable(format!("unsupported model input '{other}'"))),
        }
        .ok_or_else(|| unavailable(format!("model requested '{}' twice", input.name)))?;
        inputs.push(tensor.into_dyn());
    }
    if inputs.is_empty() {
        return Err(unavailable("model did not declare any inputs"));
    }

    let outputs = session
        .run::<i64, f32, _>(inputs)
        .map_err(|e| unavailable(format!("inference failed: {e}")))?;
    let output = outputs
        .into_iter()
        .next()
        .ok_or_else(|| unavailable("model returned no outputs"))?;
    let shape = output.shape().to_vec();
    let flat: Vec<f32> = output.iter().copied().collect();
    Ok((shape, flat))
}

/// One vector per batch row. Token-level output (`[batch, seq, hidden]`) is
/// averaged over positions whose mask is set; sentence-level output
/// (`[batch, hidden]`) is taken as is.
fn mean_pool(
    flat: &[f32],
    shape: &[usize],
    masks: &[Vec<i64>],
) -> Result<Vec<Vec<f32>>, AnalysisError> {
    if shape.iter().product::<usize>() != flat.len() {
        return Err(unavailable(format!(
            "model output of {} values does not match shape {shape:?}",
            flat.len()
        )));
    }
    match *shape {
        [batch, seq, hidden] => Ok((0..batch)
            .map(|b| {
                let mut acc = vec![0f32; hidden];
                let mut count = 0usize;
                for t in 0..seq {
                    let active = masks
                        .get(b)
                        .and_then(|m| m.get(t))
                        .is_some_and(|&m| m > 0);
                    if !active {
                        continue;
                    }
                    let start = (b * seq + t) * hidden;
                    for (a, x) in acc.iter_mut().zip(&flat[start..start + hidden]) {
                        *a += x;
                    }
                    count += 1;
                }
                if count > 0 {
                    let inv = 1.0 / count as f32;
                    acc.iter_mut().for_each(|a| *a *= inv);
                }
                acc
            })
            .collect()),
        [_, hidden] if hidden > 0 => Ok(flat.chunks(hidden).map(<[f32]>::to_vec).collect()),
        _ => Err(unavailable(format!("unsupported model output shape {shape:?}"))),
    }
}

/// Mean of the window vectors, L2-normalized.
fn average(vectors: &[Vec<f32>]) -> Option<Vec<f32>> {
    let first = vectors.first()?;
    let mut acc = vec![0f32; first.len()];
    for v in vectors {
        for (a, x) in acc.iter_mut().zip(v) {
            *a += x;
        }
    }
    l2_normalize_in_place(&mut acc);
    Some(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_pool_ignores_padding_positions() {
        // batch 1, seq 3, hidden 2; last position is padding.
        let flat = [1.0, 2.0, 3.0, 4.0, 100.0, 100.0];
        let pooled = mean_pool(&flat, &[1, 3, 2], &[vec![1, 1, 0]]).unwrap();
        assert_eq!(pooled, vec![vec![2.0, 3.0]]);
    }

    #[test]
    fn test_mean_pool_sentence_level_output() {
        let flat = [1.0, 0.0, 0.0, 1.0];
        let pooled = mean_pool(&flat, &[2, 2], &[vec![1], vec![1]]).unwrap();
        assert_eq!(pooled, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_mean_pool_rejects_mismatched_shape() {
        assert!(mean_pool(&[1.0, 2.0, 3.0], &[1, 2, 2], &[vec![1, 1]]).is_err());
        assert!(mean_pool(&[1.0], &[1], &[vec![1]]).is_err());
    }

    #[test]
    fn test_average_is_unit_length() {
        let v = average(&[vec![3.0, 0.0], vec![0.0, 4.0]]).unwrap();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!(average(&[]).is_none());
    }

    #[test]
    fn test_padded_batch_pads_to_longest_window() {
        let windows = vec![
            EncodedWindow {
                ids: vec![101, 7, 102],
                mask: vec![1, 1, 1],
            },
            EncodedWindow {
                ids: vec![101, 102],
                mask: vec![1, 1],
            },
        ];
        let (ids, mask) = padded_batch(windows).unwrap();
        assert_eq!(ids.dim(), (2, 3));
        assert_eq!(ids[[1, 2]], 0);
        assert_eq!(mask[[1, 2]], 0);
        assert_eq!(mask[[0, 2]], 1);
    }

    #[test]
    fn test_load_fails_on_missing_tokenizer() {
        let assets = ModelAssets {
            model_path: PathBuf::from("/nonexistent/model.onnx"),
            tokenizer_path: PathBuf::from("/nonexistent/tokenizer.json"),
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
        };
        let err = OnnxEmbedder::load(&assets).err().unwrap();
        assert!(matches!(err, AnalysisError::Unavailable(msg) if msg.contains("tokenizer")));
    }

    #[test]
    fn test_load_fails_on_corrupt_tokenizer() {
        let dir = tempfile::tempdir().unwrap();
        let tokenizer_path = dir.path().join("tokenizer.json");
        std::fs::write(&tokenizer_path, "{ not a tokenizer").unwrap();
        let assets = ModelAssets {
            model_path: dir.path().join("model.onnx"),
            tokenizer_path,
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
        };
        assert!(matches!(
            OnnxEmbedder::load(&assets),
            Err(AnalysisError::Unavailable(_))
        ));
    }

    #[test]
    fn test_load_rejects_tiny_window() {
        let assets = ModelAssets {
            model_path: PathBuf::from("model.onnx"),
            tokenizer_path: PathBuf::from("tokenizer.json"),
            max_sequence_length: 2,
        };
        assert!(OnnxEmbedder::load(&assets).is_err());
    }
}
