//! Sentence embeddings and the provider seam

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding model unavailable: {0}")]
    Unavailable(String),
    #[error("embedding model failed: {0}")]
    Model(String),
    #[error("model returned {got} embeddings for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("embedding has zero norm")]
    ZeroNorm,
}

/// A unit-length embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// L2-normalize `values`. Zero or non-finite vectors are rejected.
    pub fn normalized(mut values: Vec<f32>) -> Result<Self, EmbeddingError> {
        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return Err(EmbeddingError::ZeroNorm);
        }
        for v in &mut values {
            *v /= norm;
        }
        Ok(Self(values))
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Cosine similarity; both sides are unit length so this is a dot product.
    pub fn cosine(&self, other: &Embedding) -> Result<f32, EmbeddingError> {
        if self.dim() != other.dim() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dim(),
                got: other.dim(),
            });
        }
        Ok(self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum())
    }
}

/// Anything that turns text into embeddings.
///
/// Implementations may return unnormalized vectors; callers normalize through
/// [`embed_normalized`] / [`embed_batch_normalized`].
pub trait EmbeddingProvider: Send + Sync {
    /// Short model name for logs.
    fn name(&self) -> &str;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut out = self.embed_batch(&[text])?;
        match out.len() {
            1 => Ok(out.remove(0)),
            got => Err(EmbeddingError::CountMismatch { expected: 1, got }),
        }
    }
}

pub fn embed_normalized(
    provider: &dyn EmbeddingProvider,
    text: &str,
) -> Result<Embedding, EmbeddingError> {
    Embedding::normalized(provider.embed(text)?)
}

pub fn embed_batch_normalized(
    provider: &dyn EmbeddingProvider,
    texts: &[&str],
) -> Result<Vec<Embedding>, EmbeddingError> {
    let raw = provider.embed_batch(texts)?;
    if raw.len() != texts.len() {
        return Err(EmbeddingError::CountMismatch {
            expected: texts.len(),
            got: raw.len(),
        });
    }
    raw.into_iter().map(Embedding::normalized).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_to_unit_length() {
        let e = Embedding::normalized(vec![3.0, 4.0]).unwrap();
        assert!((e.as_slice()[0] - 0.6).abs() < 1e-6);
        assert!((e.as_slice()[1] - 0.8).abs() < 1e-6);
        assert!((e.cosine(&e).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_zero_vector() {
        assert!(matches!(
            Embedding::normalized(vec![0.0; 4]),
            Err(EmbeddingError::ZeroNorm)
        ));
    }

    #[test]
    fn cosine_of_orthogonal_and_opposite() {
        let x = Embedding::normalized(vec![1.0, 0.0]).unwrap();
        let y = Embedding::normalized(vec![0.0, 2.0]).unwrap();
        let nx = Embedding::normalized(vec![-5.0, 0.0]).unwrap();
        assert!(x.cosine(&y).unwrap().abs() < 1e-6);
        assert!((x.cosine(&nx).unwrap() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_rejects_dimension_mismatch() {
        let a = Embedding::normalized(vec![1.0, 0.0]).unwrap();
        let b = Embedding::normalized(vec![1.0, 0.0, 0.0]).unwrap();
        assert!(matches!(
            a.cosine(&b),
            Err(EmbeddingError::DimensionMismatch { expected: 2, got: 3 })
        ));
    }
}
