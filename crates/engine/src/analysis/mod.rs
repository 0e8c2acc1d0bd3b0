//! Content analysis: structure, classification and granularity planning.

pub mod classifier;
pub mod granularity;
pub mod structure;

pub use classifier::{
    ClassificationResult, ComplexityIndicators, ContentClassifier, ContentFeatures, ContentScorer,
    PatternScorer, TypeScore,
};
pub use granularity::{
    decide_from_score, DecisionFactor, GranularityDecision, GranularityPlanner, OverridePolicy,
    ProcessingApproach,
};
pub use structure::{analyze_structure, HeadingEntry, StructuralCoherence, StructuralProfile};

use crate::text::{strip_tags, word_count};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Everything the generator needs to know about a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub classification: ClassificationResult,
    pub structure: StructuralProfile,
    pub granularity: GranularityDecision,
    pub word_count: usize,
    pub char_count: usize,
}

/// Runs the three analysis stages, substituting safe defaults on failure.
#[derive(Default)]
pub struct ContentAnalyzer {
    classifier: ContentClassifier,
    planner: GranularityPlanner,
}

impl ContentAnalyzer {
    pub fn new(classifier: ContentClassifier, planner: GranularityPlanner) -> Self {
        Self {
            classifier,
            planner,
        }
    }

    pub fn analyze(&self, content: &str, metadata: &Map<String, Value>) -> ContentAnalysis {
        let structure = analyze_structure(content);

        let classification = self
            .classifier
            .classify(content, metadata)
            .unwrap_or_else(|e| {
                tracing::warn!("Classification failed, using general documentation: {}", e);
                ClassificationResult::fallback()
            });

        let granularity = self
            .planner
            .plan(content, &classification, &structure)
            .unwrap_or_else(|e| {
                tracing::warn!("Granularity planning failed, keeping document unified: {}", e);
                GranularityDecision::safe_default()
            });

        ContentAnalysis {
            word_count: word_count(&strip_tags(content)),
            char_count: content.chars().count(),
            classification,
            structure,
            granularity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::ContentType;

    #[test]
    fn test_empty_content_falls_back() {
        let analysis = ContentAnalyzer::default().analyze("", &Map::new());

        assert_eq!(
            analysis.classification.primary_type,
            ContentType::GeneralDocumentation
        );
        assert_eq!(analysis.classification.confidence_score, 0.5);
        assert_eq!(
            analysis.granularity.recommended_approach,
            ProcessingApproach::Unified
        );
        assert_eq!(analysis.granularity.article_estimate, 1);
        assert_eq!(analysis.word_count, 0);
    }
}
