//! Run reporting.

use hdrhistogram::Histogram;
use linksim_simulation::{EventLog, LinkEventKind};
use linksim_test_helpers::{ClientStats, ServerStats};
use std::fmt::Write as _;
use std::time::Duration;

/// Aggregate results of one harness run.
#[derive(Debug)]
pub struct SimulationReport {
    /// Simulated time actually covered (the clock may stop a step past the
    /// horizon, or earlier at idle).
    pub simulated: Duration,

    // Client side.
    pub frames_sent: u64,
    pub hello_retransmits: u64,

    // Server side.
    pub frames_received: u64,
    pub out_of_order: u64,
    pub acks_sent: u64,

    // Bottleneck queue.
    pub packets_enqueued: u64,
    pub packets_dropped: u64,
    pub packets_shifted: u64,
    pub bytes_shifted: u64,
    pub bytes_dropped: u64,

    latency: Histogram<u64>,
}

impl SimulationReport {
    /// Significant figures for the latency histogram.
    const SIGFIG: u8 = 3;

    /// Assemble a report from the run's shared stats handles and event log.
    pub fn collect(
        simulated: Duration,
        client: &ClientStats,
        server: &ServerStats,
        events: &EventLog,
    ) -> Self {
        let mut latency = Histogram::new(Self::SIGFIG).expect("valid sigfig");
        for &sample in &server.latencies_millis {
            latency.saturating_record(sample);
        }
        SimulationReport {
            simulated,
            frames_sent: client.frames_sent,
            hello_retransmits: client.hello_retransmits,
            frames_received: server.frames_received,
            out_of_order: server.out_of_order,
            acks_sent: server.acks_sent,
            packets_enqueued: events.count(LinkEventKind::Enqueue) as u64,
            packets_dropped: events.count(LinkEventKind::Drop) as u64,
            packets_shifted: events.count(LinkEventKind::Shift) as u64,
            bytes_shifted: events.bytes(LinkEventKind::Shift),
            bytes_dropped: events.bytes(LinkEventKind::Drop),
            latency,
        }
    }

    pub fn latency_p50(&self) -> Duration {
        Duration::from_millis(self.latency.value_at_quantile(0.50))
    }

    pub fn latency_p99(&self) -> Duration {
        Duration::from_millis(self.latency.value_at_quantile(0.99))
    }

    pub fn latency_max(&self) -> Duration {
        Duration::from_millis(self.latency.max())
    }

    pub fn latency_samples(&self) -> u64 {
        self.latency.len()
    }

    /// Bytes per second carried over the link.
    pub fn goodput_bytes_per_sec(&self) -> f64 {
        let secs = self.simulated.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.bytes_shifted as f64 / secs
    }

    /// Fraction of offered packets the queue dropped.
    pub fn drop_rate(&self) -> f64 {
        let offered = self.packets_enqueued + self.packets_dropped;
        if offered == 0 {
            return 0.0;
        }
        self.packets_dropped as f64 / offered as f64
    }

    /// Human-readable multi-line summary.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "simulated {:?}", self.simulated);
        let _ = writeln!(
            out,
            "client: {} frames sent, {} hello retransmits",
            self.frames_sent, self.hello_retransmits
        );
        let _ = writeln!(
            out,
            "server: {} frames received ({} out of order), {} acks",
            self.frames_received, self.out_of_order, self.acks_sent
        );
        let _ = writeln!(
            out,
            "queue:  {} enqueued, {} shifted, {} dropped ({:.1}% drop rate)",
            self.packets_enqueued,
            self.packets_shifted,
            self.packets_dropped,
            self.drop_rate() * 100.0
        );
        let _ = writeln!(
            out,
            "goodput {:.0} bytes/sec",
            self.goodput_bytes_per_sec()
        );
        if self.latency_samples() > 0 {
            let _ = writeln!(
                out,
                "latency p50 {:?}, p99 {:?}, max {:?}",
                self.latency_p50(),
                self.latency_p99(),
                self.latency_max()
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linksim_types::SimTime;

    fn sources() -> (ClientStats, ServerStats, EventLog) {
        let client = ClientStats {
            frames_sent: 100,
            hello_retransmits: 0,
            highest_ack: Some(80),
            released: false,
        };
        let server = ServerStats {
            connection_id: None,
            frames_received: 80,
            out_of_order: 0,
            acks_sent: 5,
            latencies_millis: vec![100, 100, 120, 140],
        };
        let events = EventLog::new();
        for i in 0..90u64 {
            events.record(
                LinkEventKind::Enqueue,
                SimTime::from_secs(i as f64),
                1219,
                0,
            );
        }
        for i in 0..80u64 {
            events.record(LinkEventKind::Shift, SimTime::from_secs(i as f64), 1219, 0);
        }
        for i in 0..10u64 {
            events.record(LinkEventKind::Drop, SimTime::from_secs(i as f64), 1219, 0);
        }
        (client, server, events)
    }

    #[test]
    fn rates_and_percentiles() {
        let (client, server, events) = sources();
        let r = SimulationReport::collect(Duration::from_secs(10), &client, &server, &events);

        assert_eq!(r.packets_enqueued, 90);
        assert_eq!(r.packets_dropped, 10);
        assert_eq!(r.bytes_shifted, 80 * 1219);
        assert!((r.drop_rate() - 0.1).abs() < 1e-12);
        assert!((r.goodput_bytes_per_sec() - 9752.0).abs() < 1e-9);
        assert_eq!(r.latency_samples(), 4);
        assert!(r.latency_p50() >= Duration::from_millis(100));
        assert!(r.latency_max() >= Duration::from_millis(140));
    }

    #[test]
    fn summary_mentions_every_section() {
        let (client, server, events) = sources();
        let text =
            SimulationReport::collect(Duration::from_secs(10), &client, &server, &events).summary();
        for needle in ["client:", "server:", "queue:", "goodput", "latency"] {
            assert!(text.contains(needle), "missing {needle} in {text}");
        }
    }

    #[test]
    fn empty_run_is_well_defined() {
        let r = SimulationReport::collect(
            Duration::ZERO,
            &ClientStats::default(),
            &ServerStats::default(),
            &EventLog::new(),
        );
        assert_eq!(r.goodput_bytes_per_sec(), 0.0);
        assert_eq!(r.drop_rate(), 0.0);
        assert!(!r.summary().contains("latency"));
    }
}
