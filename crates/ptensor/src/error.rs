// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error codes and the error type raised by the bindings.

use ptensor_sys::*;
use std::fmt;
use std::os::raw::c_int;

/// Status codes reported by the native library.
///
/// [`ErrorCode::Ok`] is the only non-error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorCode {
    Ok,
    Unknown,
    Assertion,
    InvalidArgument,
    InvalidOperation,
    OutOfMemory,
    OutOfRange,
    NotImplemented,
    Os,
    Io,
}

impl ErrorCode {
    /// Maps a raw status. Values outside the known range become [`ErrorCode::Unknown`].
    pub fn from_raw(raw: c_int) -> Self {
        match raw {
            P10_OK => ErrorCode::Ok,
            P10_ASSERTION_ERROR => ErrorCode::Assertion,
            P10_INVALID_ARGUMENT => ErrorCode::InvalidArgument,
            P10_INVALID_OPERATION => ErrorCode::InvalidOperation,
            P10_OUT_OF_MEMORY => ErrorCode::OutOfMemory,
            P10_OUT_OF_RANGE => ErrorCode::OutOfRange,
            P10_NOT_IMPLEMENTED => ErrorCode::NotImplemented,
            P10_OS_ERROR => ErrorCode::Os,
            P10_IO_ERROR => ErrorCode::Io,
            _ => ErrorCode::Unknown,
        }
    }

    /// Returns the raw status value.
    pub fn to_raw(self) -> c_int {
        match self {
            ErrorCode::Ok => P10_OK,
            ErrorCode::Unknown => P10_UNKNOWN_ERROR,
            ErrorCode::Assertion => P10_ASSERTION_ERROR,
            ErrorCode::InvalidArgument => P10_INVALID_ARGUMENT,
            ErrorCode::InvalidOperation => P10_INVALID_OPERATION,
            ErrorCode::OutOfMemory => P10_OUT_OF_MEMORY,
            ErrorCode::OutOfRange => P10_OUT_OF_RANGE,
            ErrorCode::NotImplemented => P10_NOT_IMPLEMENTED,
            ErrorCode::Os => P10_OS_ERROR,
            ErrorCode::Io => P10_IO_ERROR,
        }
    }

    pub fn is_ok(self) -> bool {
        self == ErrorCode::Ok
    }

    /// Generic description, used when the library has no message to offer.
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::Ok => "success",
            ErrorCode::Unknown => "unknown error",
            ErrorCode::Assertion => "assertion failed",
            ErrorCode::InvalidArgument => "invalid argument",
            ErrorCode::InvalidOperation => "invalid operation",
            ErrorCode::OutOfMemory => "out of memory",
            ErrorCode::OutOfRange => "out of range",
            ErrorCode::NotImplemented => "not implemented",
            ErrorCode::Os => "operating system error",
            ErrorCode::Io => "input/output error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Errors raised by the bindings.
///
/// Every failure surfaces as exactly one of these; no operation returns a
/// partial result alongside an error.
#[derive(Debug, thiserror::Error)]
pub enum PtensorError {
    /// A native call returned a non-OK status.
    ///
    /// `message` is the library's last-error text, fetched right after the
    /// failing call, or the code's generic description if none was recorded.
    #[error("{op} failed ({code}): {message}")]
    Native {
        op: &'static str,
        code: ErrorCode,
        message: String,
    },

    /// Input rejected before crossing the boundary.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The native side returned something the bindings cannot use.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The shared library could not be located or bound.
    #[error("failed to load native library: {0}")]
    Load(#[from] ptensor_sys::LoadError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PtensorError {
    /// The [`ErrorCode`] this error corresponds to.
    pub fn code(&self) -> ErrorCode {
        match self {
            PtensorError::Native { code, .. } => *code,
            PtensorError::InvalidArgument(_) | PtensorError::Config(_) => {
                ErrorCode::InvalidArgument
            }
            PtensorError::InvalidOperation(_) => ErrorCode::InvalidOperation,
            PtensorError::Load(_) => ErrorCode::Os,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, PtensorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_roundtrip() {
        for raw in P10_OK..=P10_IO_ERROR {
            assert_eq!(ErrorCode::from_raw(raw).to_raw(), raw);
        }
    }

    #[test]
    fn test_unknown_raw() {
        assert_eq!(ErrorCode::from_raw(99), ErrorCode::Unknown);
        assert_eq!(ErrorCode::from_raw(-3), ErrorCode::Unknown);
    }

    #[test]
    fn test_only_ok_is_ok() {
        assert!(ErrorCode::Ok.is_ok());
        for raw in P10_UNKNOWN_ERROR..=P10_IO_ERROR {
            assert!(!ErrorCode::from_raw(raw).is_ok());
        }
    }

    #[test]
    fn test_native_display() {
        let err = PtensorError::Native {
            op: "p10_from_data",
            code: ErrorCode::OutOfRange,
            message: "Out of range: 9 dimensions".into(),
        };
        assert_eq!(
            err.to_string(),
            "p10_from_data failed (out of range): Out of range: 9 dimensions"
        );
        assert_eq!(err.code(), ErrorCode::OutOfRange);
    }

    #[test]
    fn test_binding_errors_map_to_codes() {
        assert_eq!(
            PtensorError::InvalidArgument("x".into()).code(),
            ErrorCode::InvalidArgument
        );
        assert_eq!(
            PtensorError::InvalidOperation("x".into()).code(),
            ErrorCode::InvalidOperation
        );
    }
}
