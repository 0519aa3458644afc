//! Per-source traffic features and the weighted attack score.

use serde::{Deserialize, Serialize};

use super::DosConfig;
use crate::domain::InboundRequest;

/// Spans shorter than this are treated as one second.
const MIN_SPAN_MS: u64 = 1_000;

/// Score weights; they sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DosWeights {
    pub frequency: f64,
    pub size: f64,
    pub regularity: f64,
    pub errors: f64,
    pub baseline: f64,
}

impl Default for DosWeights {
    fn default() -> Self {
        Self {
            frequency: 0.35,
            size: 0.15,
            regularity: 0.15,
            errors: 0.15,
            baseline: 0.20,
        }
    }
}

impl DosWeights {
    pub fn total(&self) -> f64 {
        self.frequency + self.size + self.regularity + self.errors + self.baseline
    }
}

/// Traffic features of one source within one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFeatures {
    pub request_count: usize,
    /// Requests per second over the source's span in the batch
    pub frequency_rps: f64,
    pub avg_size_bytes: f64,
    /// `1 − coefficient of variation` of inter-arrival times, in `[0, 1]`
    pub regularity: f64,
    pub error_rate: f64,
    /// `frequency_rps / baseline_rps`
    pub baseline_ratio: f64,
}

impl SourceFeatures {
    /// Extract features from one source's requests.
    pub fn extract(requests: &[&InboundRequest], baseline_rps: f64, min_samples: usize) -> Self {
        let request_count = requests.len();
        if request_count == 0 {
            return Self {
                request_count,
                frequency_rps: 0.0,
                avg_size_bytes: 0.0,
                regularity: 0.0,
                error_rate: 0.0,
                baseline_ratio: 0.0,
            };
        }

        let mut timestamps: Vec<u64> = requests.iter().map(|r| r.timestamp_ms).collect();
        timestamps.sort_unstable();
        let span_ms = (timestamps[request_count - 1] - timestamps[0]).max(MIN_SPAN_MS);
        let frequency_rps = request_count as f64 / (span_ms as f64 / 1_000.0);

        let avg_size_bytes =
            requests.iter().map(|r| r.size_bytes as f64).sum::<f64>() / request_count as f64;
        let error_rate =
            requests.iter().filter(|r| r.is_error).count() as f64 / request_count as f64;

        let regularity = if request_count >= min_samples.max(2) {
            regularity(&timestamps)
        } else {
            0.0
        };

        let baseline_ratio = if baseline_rps > 0.0 {
            frequency_rps / baseline_rps
        } else {
            0.0
        };

        Self {
            request_count,
            frequency_rps,
            avg_size_bytes,
            regularity,
            error_rate,
            baseline_ratio,
        }
    }

    /// Weighted score in `[0, 1]`.
    pub fn score(&self, config: &DosConfig) -> f64 {
        let w = &config.weights;
        let frequency = saturate(self.frequency_rps, config.frequency_saturation_rps);
        let size = saturate(self.avg_size_bytes, config.size_saturation_bytes as f64);
        let baseline = if config.baseline_multiplier > 1.0 {
            ((self.baseline_ratio - 1.0) / (config.baseline_multiplier - 1.0)).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let total = w.frequency * frequency
            + w.size * size
            + w.regularity * self.regularity
            + w.errors * self.error_rate.clamp(0.0, 1.0)
            + w.baseline * baseline;
        total.clamp(0.0, 1.0)
    }
}

fn saturate(value: f64, at: f64) -> f64 {
    if at <= 0.0 {
        return 0.0;
    }
    (value / at).clamp(0.0, 1.0)
}

/// `1 − stddev/mean` of the gaps between sorted timestamps, clamped.
fn regularity(sorted: &[u64]) -> f64 {
    let gaps: Vec<f64> = sorted.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    if gaps.is_empty() {
        return 0.0;
    }
    let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
    if mean == 0.0 {
        // Simultaneous bursts are perfectly regular.
        return 1.0;
    }
    let variance = gaps.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / gaps.len() as f64;
    (1.0 - variance.sqrt() / mean).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reqs(timestamps: &[u64], size: u64) -> Vec<InboundRequest> {
        timestamps
            .iter()
            .map(|&t| InboundRequest::new("s", size, t))
            .collect()
    }

    #[test]
    fn test_weights_sum_to_one() {
        assert!((DosWeights::default().total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_request_uses_minimum_span() {
        let requests = reqs(&[5_000], 100);
        let refs: Vec<&InboundRequest> = requests.iter().collect();
        let features = SourceFeatures::extract(&refs, 0.1, 5);
        assert_eq!(features.frequency_rps, 1.0);
        assert_eq!(features.regularity, 0.0);
        assert!((features.baseline_ratio - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_regular_intervals_score_high_regularity() {
        let timestamps: Vec<u64> = (0..20).map(|i| i * 500).collect();
        let requests = reqs(&timestamps, 100);
        let refs: Vec<&InboundRequest> = requests.iter().collect();
        let features = SourceFeatures::extract(&refs, 0.1, 5);
        assert_eq!(features.regularity, 1.0);
    }

    #[test]
    fn test_irregular_intervals_score_low_regularity() {
        let requests = reqs(&[0, 10, 5_000, 5_020, 20_000, 20_001], 100);
        let refs: Vec<&InboundRequest> = requests.iter().collect();
        let features = SourceFeatures::extract(&refs, 0.1, 5);
        assert!(features.regularity < 0.3);
    }

    #[test]
    fn test_flood_scores_above_flag_threshold() {
        let config = DosConfig::default();
        let timestamps: Vec<u64> = (0..120).map(|i| i * 500).collect();
        let mut requests = reqs(&timestamps, 10_000);
        for r in requests.iter_mut().step_by(5) {
            r.is_error = true;
        }
        let refs: Vec<&InboundRequest> = requests.iter().collect();
        let score = SourceFeatures::extract(&refs, config.initial_baseline_rps, 5).score(&config);
        assert!(score >= config.flag_threshold, "score {}", score);
    }

    #[test]
    fn test_single_legitimate_request_below_threshold() {
        let config = DosConfig::default();
        let requests = reqs(&[1_000], 512);
        let refs: Vec<&InboundRequest> = requests.iter().collect();
        let score = SourceFeatures::extract(&refs, config.initial_baseline_rps, 5).score(&config);
        assert!(score < config.flag_threshold, "score {}", score);
    }
}
