// SPDX-License-Identifier: AGPL-3.0-only
//! Prometheus counters for framing events.

use prometheus::{IntCounterVec, Opts, Registry, TextEncoder};
use tacwire_proto::{CrypterEvent, CrypterMetrics};

pub struct PrometheusMetrics {
    registry: Registry,
    events: IntCounterVec,
}

impl PrometheusMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let events = IntCounterVec::new(
            Opts::new(
                "tacacs_crypter_events_total",
                "TACACS+ framing and obfuscation events by kind",
            ),
            &["event"],
        )?;
        registry.register(Box::new(events.clone()))?;
        // every label starts at zero so scrapes see the full set
        for event in CrypterEvent::ALL {
            events.with_label_values(&[event.as_str()]);
        }
        Ok(Self { registry, events })
    }

    #[cfg(test)]
    fn get(&self, event: CrypterEvent) -> u64 {
        self.events.with_label_values(&[event.as_str()]).get()
    }

    /// Encode all metrics in Prometheus text format.
    pub fn encode(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }
}

impl CrypterMetrics for PrometheusMetrics {
    fn record(&self, event: CrypterEvent) {
        self.events.with_label_values(&[event.as_str()]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_by_event_label() {
        let m = PrometheusMetrics::new().unwrap();
        m.record(CrypterEvent::Read);
        m.record(CrypterEvent::Read);
        m.record(CrypterEvent::BadSecret);
        assert_eq!(m.get(CrypterEvent::Read), 2);
        assert_eq!(m.get(CrypterEvent::BadSecret), 1);
        assert_eq!(m.get(CrypterEvent::Write), 0);
    }

    #[test]
    fn encode_lists_every_event() {
        let m = PrometheusMetrics::new().unwrap();
        m.record(CrypterEvent::WriteError);
        let output = m.encode();
        assert!(output.contains("tacacs_crypter_events_total"));
        for event in CrypterEvent::ALL {
            assert!(output.contains(&format!("event=\"{}\"", event.as_str())));
        }
    }
}
