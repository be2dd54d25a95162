//! Extraction confidence score

use crate::config::ScoringWeights;
use basso_fmt::FieldRecord;

/// Scores a `FieldRecord` by which fields were found
#[derive(Debug, Clone, Default)]
pub struct ConfidenceScorer {
    weights: ScoringWeights,
}

impl ConfidenceScorer {
    pub fn new(weights: &ScoringWeights) -> Self {
        Self {
            weights: weights.clone(),
        }
    }

    /// Weighted sum of the fields present, clamped to 100
    pub fn score(&self, record: &FieldRecord) -> u8 {
        let w = &self.weights;
        let parts = [
            (record.title.is_some(), w.title),
            (record.composer.is_some(), w.composer),
            (record.key.is_some(), w.key),
            (!record.techniques.is_empty(), w.techniques),
            (record.tempo.is_some(), w.tempo),
            (record.page.is_some(), w.page),
        ];

        let total: u32 = parts
            .iter()
            .filter(|(found, _)| *found)
            .map(|(_, weight)| *weight as u32)
            .sum();
        total.min(100) as u8
    }
}
