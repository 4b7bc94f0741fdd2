use crate::embedding::{EmbeddingError, EmbeddingProvider};

/// Deterministic bag-of-words embedder.
///
/// Each word is hashed (FNV-1a) into one of `dim` buckets and counted.
/// Identical word bags give similarity 1.0 and disjoint ones give ~0.0, which
/// is enough to exercise the classifier without a model download.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(2) }
    }

    fn bucket(&self, word: &str) -> usize {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        for b in word.as_bytes() {
            h ^= u64::from(*b);
            h = h.wrapping_mul(0x0000_0100_0000_01b3);
        }
        // Last bucket is reserved for text without any word.
        (h % (self.dim as u64 - 1)) as usize
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; self.dim];
        let mut words = 0;
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            v[self.bucket(&word.to_lowercase())] += 1.0;
            words += 1;
        }
        if words == 0 {
            v[self.dim - 1] = 1.0;
        }
        v
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing-bow"
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::embed_normalized;

    #[test]
    fn same_words_same_vector() {
        let e = HashingEmbedder::default();
        let a = embed_normalized(&e, "rẽ trái").unwrap();
        let b = embed_normalized(&e, "trái  rẽ!").unwrap();
        assert!((a.cosine(&b).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn partial_overlap_scores_between() {
        let e = HashingEmbedder::default();
        let a = embed_normalized(&e, "tiến lên").unwrap();
        let b = embed_normalized(&e, "tiến lên 3 bước").unwrap();
        let s = a.cosine(&b).unwrap();
        assert!(s > 0.6 && s < 0.8, "score {s}");
    }

    #[test]
    fn empty_text_still_embeds() {
        let e = HashingEmbedder::default();
        assert!(embed_normalized(&e, "   ").is_ok());
    }
}
