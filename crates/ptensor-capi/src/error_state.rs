// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The last-error slot behind `p10_get_last_error_message`.
//!
//! The slot is thread-local and is overwritten by the next failing call on
//! the same thread. The pointer handed out stays valid until then.

use ptensor_sys::*;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Records `message` for `code` and returns `code`, so failing entry points
/// can `return fail(..)`.
pub(crate) fn fail(code: P10ErrorEnum, message: &str) -> P10ErrorEnum {
    let text = format!("{}: {message}", describe(code));
    let text = CString::new(text).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(text));
    code
}

/// Pointer to the current message, or null if nothing failed on this thread.
pub(crate) fn last_message() -> *const c_char {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map_or(ptr::null(), |m| m.as_ptr()))
}

fn describe(code: P10ErrorEnum) -> &'static str {
    match code {
        P10_OK => "No error",
        P10_UNKNOWN_ERROR => "Unknown error",
        P10_ASSERTION_ERROR => "Assertion error",
        P10_INVALID_ARGUMENT => "Invalid argument",
        P10_INVALID_OPERATION => "Invalid operation",
        P10_OUT_OF_MEMORY => "Out of memory",
        P10_OUT_OF_RANGE => "Out of range",
        P10_NOT_IMPLEMENTED => "Not implemented",
        P10_OS_ERROR => "OS error",
        P10_IO_ERROR => "IO error",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_fail_records_prefixed_message() {
        assert_eq!(fail(P10_INVALID_ARGUMENT, "bad dtype"), P10_INVALID_ARGUMENT);
        let msg = unsafe { CStr::from_ptr(last_message()) };
        assert_eq!(msg.to_str().unwrap(), "Invalid argument: bad dtype");
    }

    #[test]
    fn test_slot_is_overwritten() {
        fail(P10_OUT_OF_RANGE, "first");
        fail(P10_IO_ERROR, "second");
        let msg = unsafe { CStr::from_ptr(last_message()) };
        assert_eq!(msg.to_str().unwrap(), "IO error: second");
    }

    #[test]
    fn test_empty_slot_is_null() {
        let handle = std::thread::spawn(|| last_message().is_null());
        assert!(handle.join().unwrap());
    }
}
