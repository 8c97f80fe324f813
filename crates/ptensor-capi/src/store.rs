// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The native-side tensor object a `P10Tensor` points to.

use ptensor_sys::*;

/// A tensor owned by the native side: dtype tag, extents, and a copy of the
/// caller's bytes in row-major order.
#[derive(Debug)]
pub(crate) struct NativeTensor {
    pub(crate) dtype: P10DTypeEnum,
    pub(crate) shape: Vec<i64>,
    pub(crate) data: Vec<u8>,
}

impl NativeTensor {
    /// Number of elements. A zero-dimensional tensor holds one element.
    pub(crate) fn size(&self) -> usize {
        self.shape.iter().map(|&d| d as usize).product()
    }
}

/// Byte width of one element, or `None` for an unknown tag.
pub(crate) fn element_size(dtype: P10DTypeEnum) -> Option<usize> {
    match dtype {
        P10_DTYPE_UINT8 | P10_DTYPE_INT8 => Some(1),
        P10_DTYPE_FLOAT16 | P10_DTYPE_UINT16 | P10_DTYPE_INT16 => Some(2),
        P10_DTYPE_FLOAT32 | P10_DTYPE_UINT32 | P10_DTYPE_INT32 => Some(4),
        P10_DTYPE_FLOAT64 | P10_DTYPE_INT64 => Some(8),
        _ => None,
    }
}

/// Checked byte length for `shape` of `dtype`.
pub(crate) fn byte_len(shape: &[i64], elem_size: usize) -> Option<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(usize::try_from(d).ok()?))?
        .checked_mul(elem_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_sizes() {
        assert_eq!(element_size(P10_DTYPE_FLOAT16), Some(2));
        assert_eq!(element_size(P10_DTYPE_INT64), Some(8));
        assert_eq!(element_size(P10_DTYPE_LAST + 1), None);
        assert_eq!(element_size(-1), None);
    }

    #[test]
    fn test_byte_len() {
        assert_eq!(byte_len(&[2, 5], 4), Some(40));
        assert_eq!(byte_len(&[], 8), Some(8));
        assert_eq!(byte_len(&[3, 0], 4), Some(0));
        assert_eq!(byte_len(&[-1], 4), None);
        assert_eq!(byte_len(&[i64::MAX, i64::MAX], 4), None);
    }

    #[test]
    fn test_scalar_size() {
        let t = NativeTensor {
            dtype: P10_DTYPE_FLOAT32,
            shape: vec![],
            data: vec![0; 4],
        };
        assert_eq!(t.size(), 1);
    }
}
