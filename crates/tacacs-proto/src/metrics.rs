// SPDX-License-Identifier: AGPL-3.0-only
//! Increment-only outcome counters for `Crypter` reads and writes.

use std::sync::atomic::{AtomicU64, Ordering};

/// One observable `Crypter` outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrypterEvent {
    Read,
    ReadError,
    UnmarshalError,
    CryptError,
    Write,
    WriteError,
    MarshalError,
    BadSecret,
}

impl CrypterEvent {
    pub const ALL: [CrypterEvent; 8] = [
        CrypterEvent::Read,
        CrypterEvent::ReadError,
        CrypterEvent::UnmarshalError,
        CrypterEvent::CryptError,
        CrypterEvent::Write,
        CrypterEvent::WriteError,
        CrypterEvent::MarshalError,
        CrypterEvent::BadSecret,
    ];

    /// Stable label for exporters.
    pub fn as_str(self) -> &'static str {
        match self {
            CrypterEvent::Read => "read",
            CrypterEvent::ReadError => "read_error",
            CrypterEvent::UnmarshalError => "unmarshal_error",
            CrypterEvent::CryptError => "crypt_error",
            CrypterEvent::Write => "write",
            CrypterEvent::WriteError => "write_error",
            CrypterEvent::MarshalError => "marshal_error",
            CrypterEvent::BadSecret => "bad_secret",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Sink for `Crypter` outcomes, shared by every connection of a listener.
pub trait CrypterMetrics: Send + Sync {
    fn record(&self, event: CrypterEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl CrypterMetrics for NoopMetrics {
    fn record(&self, _event: CrypterEvent) {}
}

/// In-process atomic tallies, one per event.
#[derive(Debug, Default)]
pub struct CrypterCounters {
    counts: [AtomicU64; CrypterEvent::ALL.len()],
}

impl CrypterCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, event: CrypterEvent) -> u64 {
        self.counts[event.index()].load(Ordering::Relaxed)
    }
}

impl CrypterMetrics for CrypterCounters {
    fn record(&self, event: CrypterEvent) {
        self.counts[event.index()].fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_independent_per_event() {
        let counters = CrypterCounters::new();
        counters.record(CrypterEvent::Read);
        counters.record(CrypterEvent::Read);
        counters.record(CrypterEvent::BadSecret);
        assert_eq!(counters.get(CrypterEvent::Read), 2);
        assert_eq!(counters.get(CrypterEvent::BadSecret), 1);
        assert_eq!(counters.get(CrypterEvent::WriteError), 0);
    }

    #[test]
    fn labels_are_unique() {
        let mut labels: Vec<_> = CrypterEvent::ALL.iter().map(|e| e.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), CrypterEvent::ALL.len());
    }
}
