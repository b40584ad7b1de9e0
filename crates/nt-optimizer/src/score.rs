//! Multi-objective scoring.
//!
//! Raw benchmark metrics are turned into percentage deltas against the
//! run's baseline, then aggregated into a single higher-is-better scalar.
//! All three deltas are zero exactly when a candidate matches the baseline.

use serde::{Deserialize, Serialize};

/// Raw metrics returned by one evaluation of a parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetrics {
    /// Size of the generated file in bytes.
    pub file_size: u64,
    /// Per-run throughput in MB/s.
    pub throughputs: Vec<f64>,
    /// Per-run peak memory in KB.
    pub memory_usages: Vec<f64>,
}

/// Aggregated metrics of the run's default parameter set.
///
/// Denominator for all normalized scores; must be calibrated with nonzero
/// metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineMetrics {
    pub file_size: u64,
    pub throughput: f64,
    pub memory: f64,
}

/// Normalized result of scoring one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepScore {
    pub size_decrease: f64,
    pub throughput_increase: f64,
    pub memory_decrease: f64,
    pub performance: f64,
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percentage decrease in file size; positive means smaller.
pub fn size_decrease(size: u64, base_size: u64) -> f64 {
    (base_size as f64 - size as f64) / base_size as f64 * 100.0
}

/// Percentage increase in throughput; positive means faster.
pub fn throughput_increase(throughput: f64, base_throughput: f64) -> f64 {
    (throughput - base_throughput) / base_throughput * 100.0
}

/// Percentage decrease in peak memory; positive means leaner.
pub fn memory_decrease(memory: f64, base_memory: f64) -> f64 {
    (base_memory - memory) / base_memory * 100.0
}

/// Collapse the per-metric deltas into one scalar.
///
/// Unweighted arithmetic mean without weights, weighted average otherwise.
pub fn aggregate(values: &[f64], weights: Option<&[f64]>) -> f64 {
    match weights {
        None => mean(values),
        Some(weights) => {
            let total: f64 = weights.iter().sum();
            values
                .iter()
                .zip(weights)
                .map(|(v, w)| v * w)
                .sum::<f64>()
                / total
        }
    }
}

/// Score a candidate's aggregated metrics against the baseline.
pub fn score(
    file_size: u64,
    mean_throughput: f64,
    mean_memory: f64,
    baseline: &BaselineMetrics,
    weights: Option<&[f64]>,
) -> StepScore {
    let size_decrease = size_decrease(file_size, baseline.file_size);
    let throughput_increase = throughput_increase(mean_throughput, baseline.throughput);
    let memory_decrease = memory_decrease(mean_memory, baseline.memory);
    let performance = aggregate(
        &[size_decrease, throughput_increase, memory_decrease],
        weights,
    );

    StepScore {
        size_decrease,
        throughput_increase,
        memory_decrease,
        performance,
    }
}
