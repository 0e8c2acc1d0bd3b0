//! Granularity planning: one article or several, and how many.

use super::classifier::ClassificationResult;
use super::structure::StructuralProfile;
use crate::strategy::ContentType;
use crate::text::{strip_tags, word_count};
use docforge_core::{AppError, AppResult, EngineSettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const SHALLOW_THRESHOLD: f64 = 0.3;
pub const MODERATE_THRESHOLD: f64 = 0.6;
pub const DEEP_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingApproach {
    Unified,
    ShallowSplit,
    ModerateSplit,
    DeepSplit,
}

impl ProcessingApproach {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingApproach::Unified => "unified",
            ProcessingApproach::ShallowSplit => "shallow_split",
            ProcessingApproach::ModerateSplit => "moderate_split",
            ProcessingApproach::DeepSplit => "deep_split",
        }
    }

    pub fn is_split(&self) -> bool {
        !matches!(self, ProcessingApproach::Unified)
    }
}

impl fmt::Display for ProcessingApproach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionFactor {
    pub score: f64,
    pub weight: f64,
}

impl DecisionFactor {
    pub fn contribution(&self) -> f64 {
        self.score * self.weight
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GranularityDecision {
    pub recommended_approach: ProcessingApproach,
    /// Always at least 1
    pub article_estimate: usize,
    pub splitting_score: f64,
    pub confidence: f64,
    pub reasoning: String,
    pub decision_factors: BTreeMap<String, DecisionFactor>,
    #[serde(default)]
    pub overrides_applied: Vec<String>,
}

impl GranularityDecision {
    /// Decision used when planning fails.
    pub fn safe_default() -> Self {
        Self {
            recommended_approach: ProcessingApproach::Unified,
            article_estimate: 1,
            splitting_score: 0.0,
            confidence: 0.5,
            reasoning: "Planning failed; keeping the document as a single article".to_string(),
            decision_factors: BTreeMap::new(),
            overrides_applied: Vec::new(),
        }
    }
}

/// Rules that force a single article regardless of the splitting score.
#[derive(Debug, Clone, PartialEq)]
pub struct OverridePolicy {
    /// Types kept unified while under `unified_max_words`
    pub unified_types: Vec<ContentType>,
    pub unified_max_words: usize,
    /// Any document under this many words stays unified
    pub min_split_words: usize,
}

impl Default for OverridePolicy {
    fn default() -> Self {
        Self::from_settings(&EngineSettings::default())
    }
}

impl OverridePolicy {
    pub fn from_settings(settings: &EngineSettings) -> Self {
        let unified_types = settings
            .unified_override_types
            .iter()
            .filter_map(|label| {
                let parsed = ContentType::parse(label);
                if parsed.is_none() {
                    tracing::warn!("Ignoring unknown content type in unifiedOverrideTypes: {}", label);
                }
                parsed
            })
            .collect();

        Self {
            unified_types,
            unified_max_words: settings.unified_override_max_words,
            min_split_words: settings.min_split_words,
        }
    }

    /// Reason the document must stay unified, if any rule applies.
    fn unified_reason(&self, content_type: ContentType, words: usize) -> Option<String> {
        if self.unified_types.contains(&content_type) && words < self.unified_max_words {
            return Some(format!(
                "{} under {} words kept unified ({} words)",
                content_type, self.unified_max_words, words
            ));
        }
        if words < self.min_split_words {
            return Some(format!(
                "Documents under {} words are not split ({} words)",
                self.min_split_words, words
            ));
        }
        None
    }
}

/// Map a splitting score to an approach and article estimate.
///
/// Thresholds are inclusive on the upper bucket: 0.3 is shallow, 0.6 is
/// moderate, 0.8 is deep.
pub fn decide_from_score(score: f64, words: usize, headings: usize) -> (ProcessingApproach, usize) {
    if score < SHALLOW_THRESHOLD {
        (ProcessingApproach::Unified, 1)
    } else if score < MODERATE_THRESHOLD {
        (ProcessingApproach::ShallowSplit, if words < 3000 { 2 } else { 3 })
    } else if score < DEEP_THRESHOLD {
        (ProcessingApproach::ModerateSplit, headings.clamp(3, 5))
    } else {
        (ProcessingApproach::DeepSplit, (headings + 1).clamp(5, 8))
    }
}

/// Weighs document signals into a [`GranularityDecision`].
#[derive(Debug, Clone, Default)]
pub struct GranularityPlanner {
    policy: OverridePolicy,
}

impl GranularityPlanner {
    pub fn new(policy: OverridePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &OverridePolicy {
        &self.policy
    }

    pub fn plan(
        &self,
        content: &str,
        classification: &ClassificationResult,
        structure: &StructuralProfile,
    ) -> AppResult<GranularityDecision> {
        let words = word_count(&strip_tags(content));
        let headings = structure.heading_count();

        let factors = decision_factors(words, classification, structure);
        let score: f64 = factors.values().map(DecisionFactor::contribution).sum();

        self.decide(score, classification, words, headings, factors)
    }

    /// Turn a splitting score into a decision, applying the override policy.
    pub fn decide(
        &self,
        splitting_score: f64,
        classification: &ClassificationResult,
        words: usize,
        headings: usize,
        decision_factors: BTreeMap<String, DecisionFactor>,
    ) -> AppResult<GranularityDecision> {
        if !splitting_score.is_finite() {
            return Err(AppError::Analysis(format!(
                "Splitting score is not a number: {}",
                splitting_score
            )));
        }

        let (mut approach, mut estimate) = decide_from_score(splitting_score, words, headings);
        let mut overrides_applied = Vec::new();

        if approach.is_split() {
            if let Some(reason) = self.policy.unified_reason(classification.primary_type, words) {
                approach = ProcessingApproach::Unified;
                estimate = 1;
                overrides_applied.push(reason);
            }
        }

        let confidence = (classification.confidence_score
            + (1.0 - (splitting_score - 0.5).abs()) * 0.5)
            .min(1.0);

        let reasoning = build_reasoning(
            splitting_score,
            approach,
            estimate,
            &decision_factors,
            &overrides_applied,
        );

        tracing::info!(
            approach = %approach,
            estimate,
            score = splitting_score,
            "Granularity decided"
        );

        Ok(GranularityDecision {
            recommended_approach: approach,
            article_estimate: estimate,
            splitting_score,
            confidence,
            reasoning,
            decision_factors,
            overrides_applied,
        })
    }
}

fn decision_factors(
    words: usize,
    classification: &ClassificationResult,
    structure: &StructuralProfile,
) -> BTreeMap<String, DecisionFactor> {
    let factor = |score: f64, weight: f64| DecisionFactor {
        score: score.clamp(0.0, 1.0),
        weight,
    };

    BTreeMap::from([
        (
            "content_length".to_string(),
            factor(words as f64 / 5000.0, 0.25),
        ),
        (
            "content_type".to_string(),
            factor(classification.primary_type.strategy().complexity, 0.20),
        ),
        (
            "structural_complexity".to_string(),
            factor(structure.structural_complexity, 0.20),
        ),
        (
            "coherence".to_string(),
            factor(1.0 - structure.structural_coherence.score, 0.15),
        ),
        (
            "confidence".to_string(),
            factor(classification.confidence_score, 0.10),
        ),
        (
            "heading_density".to_string(),
            factor(structure.heading_count() as f64 / 10.0, 0.10),
        ),
    ])
}

fn build_reasoning(
    score: f64,
    approach: ProcessingApproach,
    estimate: usize,
    factors: &BTreeMap<String, DecisionFactor>,
    overrides: &[String],
) -> String {
    let mut ranked: Vec<(&String, f64)> = factors
        .iter()
        .map(|(name, f)| (name, f.contribution()))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut reasoning = format!(
        "Splitting score {:.2} selects {} with {} article(s)",
        score, approach, estimate
    );

    if !ranked.is_empty() {
        let top = ranked
            .iter()
            .take(3)
            .map(|(name, contribution)| format!("{} ({:.2})", name, contribution))
            .collect::<Vec<_>>()
            .join(", ");
        reasoning.push_str(&format!("; top factors: {}", top));
    }

    for reason in overrides {
        reasoning.push_str(&format!("; override: {}", reason));
    }

    reasoning
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::structure::analyze_structure;

    fn classification(primary_type: ContentType, confidence: f64) -> ClassificationResult {
        ClassificationResult {
            primary_type,
            confidence_score: confidence,
            ..ClassificationResult::fallback()
        }
    }

    #[test]
    fn test_threshold_boundaries() {
        let eps = 1e-9;
        assert_eq!(decide_from_score(0.3 - eps, 1000, 4).0, ProcessingApproach::Unified);
        assert_eq!(decide_from_score(0.3, 1000, 4).0, ProcessingApproach::ShallowSplit);
        assert_eq!(decide_from_score(0.6 - eps, 1000, 4).0, ProcessingApproach::ShallowSplit);
        assert_eq!(decide_from_score(0.6, 1000, 4).0, ProcessingApproach::ModerateSplit);
        assert_eq!(decide_from_score(0.8 - eps, 1000, 4).0, ProcessingApproach::ModerateSplit);
        assert_eq!(decide_from_score(0.8, 1000, 4).0, ProcessingApproach::DeepSplit);
    }

    #[test]
    fn test_article_estimates() {
        assert_eq!(decide_from_score(0.1, 9000, 20), (ProcessingApproach::Unified, 1));
        assert_eq!(decide_from_score(0.4, 2999, 0).1, 2);
        assert_eq!(decide_from_score(0.4, 3000, 0).1, 3);
        assert_eq!(decide_from_score(0.7, 0, 1).1, 3);
        assert_eq!(decide_from_score(0.7, 0, 12).1, 5);
        assert_eq!(decide_from_score(0.9, 0, 2).1, 5);
        assert_eq!(decide_from_score(0.9, 0, 6).1, 7);
        assert_eq!(decide_from_score(0.9, 0, 30).1, 8);
    }

    #[test]
    fn test_estimate_monotonic_in_word_count() {
        let planner = GranularityPlanner::default();
        let cls = classification(ContentType::UserManual, 0.8);
        let mut content = String::from("## Part one\n\n");
        let mut previous = 0;

        for _ in 0..40 {
            content.push_str(&"lorem ipsum dolor sit amet ".repeat(40));
            content.push_str("\n\n## Another part\n\n");
            let structure = analyze_structure(&content);
            let decision = planner.plan(&content, &cls, &structure).unwrap();
            assert!(decision.article_estimate >= 1);
            assert!(
                decision.article_estimate >= previous,
                "estimate dropped from {} to {}",
                previous,
                decision.article_estimate
            );
            previous = decision.article_estimate;
        }
    }

    #[test]
    fn test_type_override_beats_high_score() {
        let planner = GranularityPlanner::default();
        let cls = classification(ContentType::Tutorial, 0.9);

        let decision = planner.decide(0.9, &cls, 1500, 12, BTreeMap::new()).unwrap();
        assert_eq!(decision.recommended_approach, ProcessingApproach::Unified);
        assert_eq!(decision.article_estimate, 1);
        assert_eq!(decision.overrides_applied.len(), 1);
        assert!(decision.reasoning.contains("override"));

        let decision = planner.decide(0.9, &cls, 2500, 12, BTreeMap::new()).unwrap();
        assert_eq!(decision.recommended_approach, ProcessingApproach::DeepSplit);
        assert!(decision.overrides_applied.is_empty());
    }

    #[test]
    fn test_short_documents_stay_unified() {
        let planner = GranularityPlanner::default();
        let cls = classification(ContentType::ApiDocumentation, 1.0);

        let decision = planner.decide(0.7, &cls, 300, 4, BTreeMap::new()).unwrap();
        assert_eq!(decision.recommended_approach, ProcessingApproach::Unified);
        assert_eq!(decision.overrides_applied.len(), 1);
    }

    #[test]
    fn test_configurable_override_types() {
        let settings = EngineSettings {
            unified_override_types: vec!["release_notes".to_string(), "bogus".to_string()],
            ..EngineSettings::default()
        };
        let policy = OverridePolicy::from_settings(&settings);
        assert_eq!(policy.unified_types, vec![ContentType::ReleaseNotes]);

        let planner = GranularityPlanner::new(policy);
        let tutorial = classification(ContentType::Tutorial, 0.9);
        let decision = planner.decide(0.9, &tutorial, 1500, 12, BTreeMap::new()).unwrap();
        assert_eq!(decision.recommended_approach, ProcessingApproach::DeepSplit);
    }

    #[test]
    fn test_nan_score_is_error() {
        let planner = GranularityPlanner::default();
        let cls = classification(ContentType::Tutorial, 0.9);
        let result = planner.decide(f64::NAN, &cls, 1500, 2, BTreeMap::new());
        assert!(matches!(result, Err(AppError::Analysis(_))));
    }

    #[test]
    fn test_factor_weights_sum_to_one() {
        let content = "## A\n\ntext here\n\n## B\n\nmore text";
        let structure = analyze_structure(content);
        let cls = classification(ContentType::GeneralDocumentation, 0.5);
        let decision = GranularityPlanner::default()
            .plan(content, &cls, &structure)
            .unwrap();

        let total: f64 = decision.decision_factors.values().map(|f| f.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(decision.decision_factors.len(), 6);
        assert!((0.0..=1.0).contains(&decision.confidence));
    }

    #[test]
    fn test_confidence_formula() {
        let planner = GranularityPlanner::default();
        let cls = classification(ContentType::UserManual, 0.2);
        let decision = planner.decide(0.5, &cls, 6000, 4, BTreeMap::new()).unwrap();
        assert!((decision.confidence - 0.7).abs() < 1e-9);
    }
}
