//! Feature-hashed word vectors.
//!
//! Each word maps to the signed sum of its character trigrams (with `<` `>`
//! boundary markers) hashed into `dim` buckets, then L2-normalized. Words
//! sharing morphology ("deploy", "deployment") land close together without
//! any trained model. A document vector is the mean of its word vectors.

use std::hash::Hasher;

use rustc_hash::FxHasher;

pub const DEFAULT_DIM: usize = 300;
const NGRAM: usize = 3;

#[derive(Debug, Clone)]
pub struct HashedEmbedder {
    dim: usize,
}

impl HashedEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Unit-length vector for a single word (zero vector for an empty word).
    pub fn word_vector(&self, word: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let marked: Vec<char> = std::iter::once('<')
            .chain(word.to_lowercase().chars())
            .chain(std::iter::once('>'))
            .collect();
        if marked.len() <= 2 {
            return v;
        }

        // Whole-word feature plus every trigram window.
        self.add_feature(&mut v, &marked);
        for window in marked.windows(NGRAM) {
            self.add_feature(&mut v, window);
        }
        l2_normalize_in_place(&mut v);
        v
    }

    /// Mean of the word vectors; `None` when `words` yields nothing.
    pub fn document_vector<'a, I>(&self, words: I) -> Option<Vec<f32>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut acc = vec![0f32; self.dim];
        let mut count = 0usize;
        for word in words {
            for (a, w) in acc.iter_mut().zip(self.word_vector(word)) {
                *a += w;
            }
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let inv = 1.0 / count as f32;
        acc.iter_mut().for_each(|a| *a *= inv);
        Some(acc)
    }

    fn add_feature(&self, v: &mut [f32], chars: &[char]) {
        let mut hasher = FxHasher::default();
        for c in chars {
            hasher.write_u32(*c as u32);
        }
        let h = hasher.finish();
        let idx = (h % self.dim as u64) as usize;
        let sign = if (h >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        v[idx] += sign;
    }
}

/// Cosine similarity; 0 when either vector has no magnitude.
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0f64;
    let mut na = 0f64;
    let mut nb = 0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

pub(crate) fn l2_normalize_in_place(v: &mut [f32]) {
    let norm = v.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm > 0.0 {
        let inv = 1.0 / norm as f32;
        for x in v.iter_mut() {
            *x *= inv;
        }
    }
}
