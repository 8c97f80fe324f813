// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors and conversion to the native extent format.

use crate::{DType, PtensorError, Result};
use ptensor_sys::P10_MAX_SHAPE;
use std::fmt;

/// The extents of a tensor, outermost first.
///
/// Row-major order is implied everywhere: the last dimension varies fastest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use ptensor::Shape;
    /// let s = Shape::new(vec![2, 3, 4]);
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), 24);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a scalar shape (rank 0).
    pub fn scalar() -> Self {
        Self { dims: vec![] }
    }

    /// Creates a 1-D shape.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Creates a 2-D shape (matrix).
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![rows, cols],
        }
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    ///
    /// A scalar holds one element; any zero extent makes the total zero.
    ///
    /// Wraps on overflow in release builds; use
    /// [`checked_num_elements`](Shape::checked_num_elements) for extents that
    /// have not been validated.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the total number of elements, or `None` on overflow.
    ///
    /// Any zero extent yields `Some(0)` regardless of the other extents.
    pub fn checked_num_elements(&self) -> Option<usize> {
        if self.dims.contains(&0) {
            return Some(0);
        }
        self.dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the size of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Byte length of a buffer holding this shape of `dtype`, or `None` on overflow.
    pub fn checked_size_bytes(&self, dtype: DType) -> Option<usize> {
        self.checked_num_elements()?.checked_mul(dtype.size_bytes())
    }

    /// Converts to the signed extents the native library takes.
    ///
    /// Rejects shapes with more than [`P10_MAX_SHAPE`] dimensions or extents
    /// that do not fit in `i64`.
    pub fn to_native(&self) -> Result<Vec<i64>> {
        if self.rank() > P10_MAX_SHAPE {
            return Err(PtensorError::InvalidArgument(format!(
                "{} dimensions exceed the native maximum of {P10_MAX_SHAPE}",
                self.rank()
            )));
        }
        self.dims
            .iter()
            .map(|&d| {
                i64::try_from(d).map_err(|_| {
                    PtensorError::InvalidArgument(format!("extent {d} does not fit in i64"))
                })
            })
            .collect()
    }

    /// Builds a shape from extents reported by the native library.
    pub fn from_native(extents: &[i64]) -> Result<Self> {
        extents
            .iter()
            .map(|&d| {
                usize::try_from(d).map_err(|_| {
                    PtensorError::InvalidOperation(format!("native library reported extent {d}"))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Self::new)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// Convenience: `Shape::from(vec![2, 3])`.
impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

/// Convenience: `Shape::from(&[2, 3][..])`.
impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_shape() {
        let s = Shape::scalar();
        assert_eq!(s.rank(), 0);
        assert_eq!(s.num_elements(), 1);
        assert_eq!(s.checked_size_bytes(DType::Int64), Some(8));
    }

    #[test]
    fn test_matrix_shape() {
        let s = Shape::matrix(2, 5);
        assert_eq!(s.rank(), 2);
        assert_eq!(s.num_elements(), 10);
        assert_eq!(s.dim(1), Some(5));
        assert_eq!(s.dim(2), None);
        assert_eq!(s.checked_size_bytes(DType::Float32), Some(40));
    }

    #[test]
    fn test_zero_extent() {
        let s = Shape::new(vec![3, 0, 2]);
        assert_eq!(s.num_elements(), 0);
        assert_eq!(s.checked_size_bytes(DType::Float64), Some(0));
    }

    #[test]
    fn test_size_overflow() {
        let s = Shape::new(vec![usize::MAX, 2]);
        assert_eq!(s.checked_num_elements(), None);
        assert_eq!(s.checked_size_bytes(DType::Uint8), None);
        let s = Shape::new(vec![usize::MAX / 2, 1]);
        assert_eq!(s.checked_num_elements(), Some(usize::MAX / 2));
        assert_eq!(s.checked_size_bytes(DType::Float32), None);
    }

    #[test]
    fn test_zero_extent_after_large_extents() {
        let s = Shape::new(vec![1 << 62, 0]);
        assert_eq!(s.checked_num_elements(), Some(0));
        assert_eq!(s.checked_size_bytes(DType::Float32), Some(0));
        let s = Shape::new(vec![usize::MAX, usize::MAX, 0]);
        assert_eq!(s.checked_size_bytes(DType::Int64), Some(0));
    }

    #[test]
    fn test_to_native() {
        assert_eq!(Shape::matrix(2, 5).to_native().unwrap(), vec![2, 5]);
        assert!(Shape::scalar().to_native().unwrap().is_empty());
    }

    #[test]
    fn test_to_native_rank_limit() {
        assert!(Shape::new(vec![1; P10_MAX_SHAPE]).to_native().is_ok());
        let err = Shape::new(vec![1; P10_MAX_SHAPE + 1]).to_native().unwrap_err();
        assert!(matches!(err, PtensorError::InvalidArgument(_)));
    }

    #[test]
    fn test_from_native_rejects_negative() {
        assert_eq!(Shape::from_native(&[4, 1]).unwrap(), Shape::matrix(4, 1));
        let err = Shape::from_native(&[2, -1]).unwrap_err();
        assert!(matches!(err, PtensorError::InvalidOperation(_)));
    }

    #[test]
    fn test_display() {
        let s = Shape::new(vec![2, 3, 4]);
        assert_eq!(format!("{s}"), "[2, 3, 4]");
        assert_eq!(Shape::scalar().to_string(), "[]");
    }

    #[test]
    fn test_from_conversions() {
        let s1: Shape = vec![2, 3].into();
        let s2: Shape = (&[2, 3][..]).into();
        assert_eq!(s1, s2);
    }
}
