//! Latency percentile helpers for the benchmark command.

use std::time::Duration;

/// Timing percentiles over a batch of decode calls.
#[derive(Debug, Clone, Copy)]
pub struct LatencyStats {
    /// Mean latency.
    pub avg: Duration,
    /// Median latency.
    pub p50: Duration,
    /// 95th percentile latency.
    pub p95: Duration,
    /// 99th percentile latency.
    pub p99: Duration,
}

/// Computes latency percentiles. Returns zeros for an empty batch.
pub fn calculate_percentiles(times: &[Duration]) -> LatencyStats {
    if times.is_empty() {
        return LatencyStats {
            avg: Duration::ZERO,
            p50: Duration::ZERO,
            p95: Duration::ZERO,
            p99: Duration::ZERO,
        };
    }
    let mut sorted = times.to_vec();
    sorted.sort_unstable();
    let total: Duration = sorted.iter().sum();
    let pick = |q: f64| -> Duration {
        let idx = ((sorted.len() as f64 - 1.0) * q).round() as usize;
        sorted[idx]
    };
    LatencyStats {
        avg: total / sorted.len() as u32,
        p50: pick(0.50),
        p95: pick(0.95),
        p99: pick(0.99),
    }
}

/// Formats a duration in microseconds with two decimals.
pub fn format_us(d: Duration) -> String {
    format!("{:.2}", d.as_secs_f64() * 1e6)
}
