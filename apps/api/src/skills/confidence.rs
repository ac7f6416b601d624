use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::skills::models::EvidenceItem;

/// Evidence count at which the frequency component saturates.
const FREQUENCY_SATURATION: f64 = 5.0;
/// Distinct source count at which the diversity component saturates.
const DIVERSITY_SATURATION: f64 = 3.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub frequency: f64,
    pub quality: f64,
    pub diversity: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            frequency: 0.4,
            quality: 0.4,
            diversity: 0.2,
        }
    }
}

/// Folds an evidence list into one confidence value.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceAggregator {
    weights: ConfidenceWeights,
}

impl ConfidenceAggregator {
    pub fn new(weights: ConfidenceWeights) -> Self {
        Self { weights }
    }

    /// confidence = 0.4*frequency + 0.4*quality + 0.2*diversity, clamped to `[0, 1]`.
    /// Empty evidence yields 0.0.
    pub fn aggregate(&self, evidence: &[EvidenceItem]) -> f64 {
        if evidence.is_empty() {
            return 0.0;
        }

        let count = evidence.len() as f64;
        let frequency = (count / FREQUENCY_SATURATION).min(1.0);
        let quality = evidence.iter().map(|e| e.score).sum::<f64>() / count;
        let sources: HashSet<&str> = evidence.iter().map(|e| e.source.as_str()).collect();
        let diversity = (sources.len() as f64 / DIVERSITY_SATURATION).min(1.0);

        (self.weights.frequency * frequency
            + self.weights.quality * quality
            + self.weights.diversity * diversity)
            .clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(source: &str, score: f64) -> EvidenceItem {
        EvidenceItem {
            source: source.to_string(),
            snippet: "snippet".to_string(),
            score,
            offset: None,
            page_number: None,
            line_number: None,
            href: None,
        }
    }

    #[test]
    fn test_empty_evidence_is_zero() {
        assert_eq!(ConfidenceAggregator::default().aggregate(&[]), 0.0);
    }

    #[test]
    fn test_saturates_at_one() {
        let items = vec![
            evidence("resume", 1.0),
            evidence("resume", 1.0),
            evidence("github", 1.0),
            evidence("github", 1.0),
            evidence("linkedin", 1.0),
        ];
        let confidence = ConfidenceAggregator::default().aggregate(&items);
        assert!((confidence - 1.0).abs() < 1e-9, "Confidence was {confidence}");
    }

    #[test]
    fn test_single_weak_mention_is_low_but_nonzero() {
        // 0.4*0.2 + 0.4*0.3 + 0.2*(1/3) = 0.08 + 0.12 + 0.0667
        let confidence = ConfidenceAggregator::default().aggregate(&[evidence("resume", 0.3)]);
        assert!((confidence - 0.266_666).abs() < 1e-4, "Confidence was {confidence}");
        assert!(confidence > 0.0);
    }

    #[test]
    fn test_more_sources_raise_confidence() {
        let agg = ConfidenceAggregator::default();
        let single = agg.aggregate(&[evidence("resume", 0.5), evidence("resume", 0.5)]);
        let mixed = agg.aggregate(&[evidence("resume", 0.5), evidence("github", 0.5)]);
        assert!(mixed > single);
    }

    #[test]
    fn test_clamped_with_custom_weights() {
        let agg = ConfidenceAggregator::new(ConfidenceWeights {
            frequency: 1.0,
            quality: 1.0,
            diversity: 1.0,
        });
        let items = vec![evidence("resume", 1.0); 6];
        assert_eq!(agg.aggregate(&items), 1.0);
    }
}
