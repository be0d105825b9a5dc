//! Exact L2 nearest-neighbour index over review embeddings.

pub mod persist;

use std::cmp::Ordering;

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// A k-NN hit: row position in insertion order and its L2 distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Brute-force index; position `i` is the `i`-th inserted vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatL2Index {
    vectors: Array2<f32>,
}

impl FlatL2Index {
    /// Bulk-insert `vectors`; the first vector fixes the dimension.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self, IndexError> {
        let dim = vectors.first().ok_or(IndexError::EmptyDataset)?.len();
        let mut flat = Vec::with_capacity(vectors.len() * dim);
        for (row, vector) in vectors.iter().enumerate() {
            if vector.len() != dim {
                return Err(IndexError::DimensionMismatch {
                    row,
                    expected: dim,
                    found: vector.len(),
                });
            }
            flat.extend_from_slice(vector);
        }
        let vectors = Array2::from_shape_vec((vectors.len(), dim), flat)
            .map_err(|err| IndexError::AlignmentMismatch(err.to_string()))?;
        Ok(Self { vectors })
    }

    pub fn dim(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn vectors(&self) -> &Array2<f32> {
        &self.vectors
    }

    /// The `k` closest rows to `query`, nearest first; ties go to the lower position.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dim() {
            return Err(IndexError::DimensionMismatch {
                row: 0,
                expected: self.dim(),
                found: query.len(),
            });
        }
        let query = ArrayView1::from(query);
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .axis_iter(Axis(0))
            .enumerate()
            .map(|(position, row)| {
                let diff = &row - &query;
                (position, diff.dot(&diff))
            })
            .collect();
        scored.sort_by(|a, b| match a.1.total_cmp(&b.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(position, squared)| Neighbor {
                position,
                distance: squared.sqrt(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<Vec<f32>> {
        (0..8).map(|i| vec![i as f32, 0.0]).collect()
    }

    #[test]
    fn identical_vector_is_first_then_lower_index_tie() {
        let index = FlatL2Index::build(&grid()).unwrap();
        let hits = index.search(&[5.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].position, 5);
        assert_eq!(hits[0].distance, 0.0);
        // rows 4 and 6 are both at distance 1
        assert_eq!(hits[1].position, 4);
        assert_eq!(hits[1].distance, 1.0);
    }

    #[test]
    fn duplicate_vectors_resolve_by_insertion_order() {
        let index = FlatL2Index::build(&[vec![1.0], vec![0.0], vec![1.0], vec![1.0]]).unwrap();
        let positions: Vec<usize> = index
            .search(&[1.0], 3)
            .unwrap()
            .into_iter()
            .map(|n| n.position)
            .collect();
        assert_eq!(positions, vec![0, 2, 3]);
    }

    #[test]
    fn k_larger_than_index_returns_everything() {
        let index = FlatL2Index::build(&grid()).unwrap();
        assert_eq!(index.search(&[0.0, 0.0], 100).unwrap().len(), 8);
        assert!(index.search(&[0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn mismatched_dimension_is_fatal() {
        let err = FlatL2Index::build(&[vec![0.0, 1.0], vec![1.0]]).unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                row: 1,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            FlatL2Index::build(&[]).unwrap_err(),
            IndexError::EmptyDataset
        ));
    }

    #[test]
    fn query_dimension_is_checked() {
        let index = FlatL2Index::build(&grid()).unwrap();
        assert!(index.search(&[1.0], 1).is_err());
    }
}
