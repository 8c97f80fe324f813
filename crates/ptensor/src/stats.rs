// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Handle and copy accounting for a [`Runtime`](crate::Runtime).
//!
//! [`HandleStats`] counts native handles created and released, failed
//! native calls, and bytes copied across the boundary. A `live()` count
//! that does not return to zero points at a leaked tensor.

/// Cumulative counters for one runtime.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct HandleStats {
    /// Native handles successfully created.
    pub constructed: u64,
    /// Native handles released.
    pub destroyed: u64,
    /// Highest number of handles alive at the same time.
    pub peak_live: u64,
    /// Native calls that returned a non-OK status.
    pub failed_calls: u64,
    /// Bytes handed to the native library at construction.
    pub bytes_copied_in: u64,
    /// Bytes copied out of native buffers.
    pub bytes_copied_out: u64,
    /// Host array reads served from the shadow copy.
    pub shadow_reads: u64,
}

impl HandleStats {
    /// Handles created but not yet released.
    pub fn live(&self) -> u64 {
        self.constructed.saturating_sub(self.destroyed)
    }

    pub(crate) fn record_construct(&mut self, bytes: usize) {
        self.constructed += 1;
        self.bytes_copied_in += bytes as u64;
        self.peak_live = self.peak_live.max(self.live());
    }

    pub(crate) fn record_destroy(&mut self) {
        self.destroyed += 1;
    }

    pub(crate) fn record_failure(&mut self) {
        self.failed_calls += 1;
    }

    pub(crate) fn record_copy_out(&mut self, bytes: usize) {
        self.bytes_copied_out += bytes as u64;
    }

    pub(crate) fn record_shadow_read(&mut self) {
        self.shadow_reads += 1;
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Handles: {} created, {} destroyed, {} live (peak {}), {} failed calls, \
             {} bytes in, {} bytes out, {} shadow reads",
            self.constructed,
            self.destroyed,
            self.live(),
            self.peak_live,
            self.failed_calls,
            self.bytes_copied_in,
            self.bytes_copied_out,
            self.shadow_reads,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let s = HandleStats::default();
        assert_eq!(s.live(), 0);
        assert_eq!(s.peak_live, 0);
    }

    #[test]
    fn test_live_and_peak() {
        let mut s = HandleStats::default();
        s.record_construct(40);
        s.record_construct(8);
        s.record_destroy();
        s.record_construct(0);
        assert_eq!(s.live(), 2);
        assert_eq!(s.peak_live, 2);
        assert_eq!(s.bytes_copied_in, 48);
        s.record_destroy();
        s.record_destroy();
        assert_eq!(s.live(), 0);
    }

    #[test]
    fn test_summary() {
        let mut s = HandleStats::default();
        s.record_construct(40);
        s.record_copy_out(40);
        s.record_failure();
        let text = s.summary();
        assert!(text.contains("1 created"));
        assert!(text.contains("1 failed calls"));
        assert!(text.contains("40 bytes out"));
    }
}
