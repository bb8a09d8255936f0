//! Serving metrics and statistics tracking for the readmission risk service.

use crate::types::prediction::RiskTier;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Processing-time samples kept before the oldest half is dropped
const MAX_TIMING_SAMPLES: usize = 10_000;

/// Metrics collector for served predictions
pub struct ServingMetrics {
    /// Predictions returned to a caller
    pub predictions_served: AtomicU64,
    /// Requests rejected by form validation
    pub rejected_inputs: AtomicU64,
    /// Requests that failed inside the pipeline
    pub failed_predictions: AtomicU64,
    /// Expected features backfilled across all requests
    pub features_backfilled: AtomicU64,
    /// Predictions by risk tier
    predictions_by_tier: RwLock<BTreeMap<RiskTier, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Probability distribution buckets
    probability_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServingMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            rejected_inputs: AtomicU64::new(0),
            failed_predictions: AtomicU64::new(0),
            features_backfilled: AtomicU64::new(0),
            predictions_by_tier: RwLock::new(BTreeMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a served prediction
    pub fn record_prediction(
        &self,
        processing_time: Duration,
        probability: f64,
        tier: RiskTier,
        backfilled: usize,
    ) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        self.features_backfilled
            .fetch_add(backfilled as u64, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            if times.len() > MAX_TIMING_SAMPLES {
                times.drain(0..MAX_TIMING_SAMPLES / 2);
            }
        }

        let bucket = (probability.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }

        if let Ok(mut by_tier) = self.predictions_by_tier.write() {
            *by_tier.entry(tier).or_insert(0) += 1;
        }
    }

    pub fn record_rejected_input(&self) {
        self.rejected_inputs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_predictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted = match self.processing_times.read() {
            Ok(times) => times.clone(),
            Err(_) => return ProcessingStats::default(),
        };
        if sorted.is_empty() {
            return ProcessingStats::default();
        }
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.50),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (predictions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_probability_distribution(&self) -> [u64; 10] {
        self.probability_buckets
            .read()
            .map(|buckets| *buckets)
            .unwrap_or_default()
    }

    /// Count per tier, including tiers never seen
    pub fn get_predictions_by_tier(&self) -> BTreeMap<RiskTier, u64> {
        let mut counts: BTreeMap<RiskTier, u64> = RiskTier::ALL.iter().map(|t| (*t, 0)).collect();
        if let Ok(by_tier) = self.predictions_by_tier.read() {
            counts.extend(by_tier.iter().map(|(tier, count)| (*tier, *count)));
        }
        counts
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            rejected_inputs: self.rejected_inputs.load(Ordering::Relaxed),
            failed_predictions: self.failed_predictions.load(Ordering::Relaxed),
            features_backfilled: self.features_backfilled.load(Ordering::Relaxed),
            predictions_by_tier: self.get_predictions_by_tier(),
            probability_distribution: self.get_probability_distribution(),
            processing: self.get_processing_stats(),
            throughput_per_sec: self.get_throughput(),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let served = snapshot.predictions_served;
        let processing = &snapshot.processing;

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║          READMISSION RISK SERVICE - METRICS SUMMARY          ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Predictions Served: {:>8}  │  Throughput: {:>8.2} req/s  ║",
            served, snapshot.throughput_per_sec
        );
        info!(
            "║ Rejected Inputs:    {:>8}  │  Failures:   {:>8}        ║",
            snapshot.rejected_inputs, snapshot.failed_predictions
        );
        info!(
            "║ Features Backfilled: {:>7}                                  ║",
            snapshot.features_backfilled
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Predictions by Risk Tier:                                    ║");
        for (tier, count) in &snapshot.predictions_by_tier {
            let pct = if served > 0 {
                (*count as f64 / served as f64) * 100.0
            } else {
                0.0
            };
            info!("║   {:10}: {:>6} ({:>5.1}%)                                ║", tier.as_str(), count, pct);
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Probability Distribution:                                    ║");
        let total: u64 = snapshot.probability_distribution.iter().sum();
        for (i, &count) in snapshot.probability_distribution.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for ServingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Serializable view of the counters, served at `/api/metrics`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub predictions_served: u64,
    pub rejected_inputs: u64,
    pub failed_predictions: u64,
    pub features_backfilled: u64,
    pub predictions_by_tier: BTreeMap<RiskTier, u64>,
    pub probability_distribution: [u64; 10],
    pub processing: ProcessingStats,
    pub throughput_per_sec: f64,
    pub uptime_secs: u64,
}

/// Periodic metrics reporter that prints summaries
pub struct MetricsReporter {
    metrics: Arc<ServingMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServingMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task; returns at once if the interval is 0
    pub async fn start(self) {
        if self.interval_secs == 0 {
            return;
        }
        let period = Duration::from_secs(self.interval_secs);
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
