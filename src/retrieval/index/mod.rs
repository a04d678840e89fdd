#[cfg(test)]
mod tests;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("Vector {row} has dimension {actual}, index expects {expected}")]
    RowDimensionMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Query vector has dimension {actual}, index expects {expected}")]
    QueryDimensionMismatch { expected: usize, actual: usize },
}

/// One search hit: position in the indexed corpus and squared L2 distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

/// Exact nearest-neighbour index over squared Euclidean distance.
///
/// Vectors are stored row-major in a single buffer. The index is built once and
/// never modified, so it can be shared between threads without locking.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    len: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    /// Index with no vectors; every search returns nothing
    #[inline]
    pub fn empty(dimension: usize) -> Self {
        Self {
            dimension,
            len: 0,
            data: Vec::new(),
        }
    }

    #[inline]
    pub fn build(dimension: usize, vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let mut data = Vec::with_capacity(vectors.len() * dimension);

        for (row, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(IndexError::RowDimensionMismatch {
                    row,
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(vector);
        }

        debug!(
            "Built vector index with {} vectors of dimension {}",
            vectors.len(),
            dimension
        );

        Ok(Self {
            dimension,
            len: vectors.len(),
            data,
        })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The `k` nearest vectors to `query`, nearest first.
    ///
    /// Returns fewer than `k` hits only when the index holds fewer vectors.
    /// Equal distances keep index order.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::QueryDimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = (0..self.len)
            .map(|index| Neighbor {
                index,
                distance: squared_l2(self.row(index), query),
            })
            .collect();

        // Stable sort keeps ties in index order
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        neighbors.truncate(k);

        Ok(neighbors)
    }

    fn row(&self, index: usize) -> &[f32] {
        let start = index * self.dimension;
        self.data.get(start..start + self.dimension).unwrap_or(&[])
    }
}

/// Squared Euclidean distance between two equal-length vectors
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
