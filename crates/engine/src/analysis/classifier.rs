//! Content classification by weighted pattern groups.
//!
//! Scoring is pluggable through [`ContentScorer`]; the default
//! [`PatternScorer`] counts case-insensitive pattern hits per content type and
//! normalizes them by document length.

use super::structure::find_headings;
use crate::strategy::ContentType;
use crate::text::strip_tags;
use docforge_core::{AppError, AppResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

/// Minimum normalized score for a type to beat the general fallback.
pub const MIN_TYPE_SCORE: f64 = 0.1;

/// Pattern groups per content type, in tie-break order.
static PATTERN_TABLE: LazyLock<Vec<(ContentType, Vec<Regex>)>> = LazyLock::new(|| {
    let compile = |patterns: &[&str]| -> Vec<Regex> {
        patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
    };

    vec![
        (
            ContentType::ApiDocumentation,
            compile(&[
                r"(?i)\b(?:endpoints?|apis?|restful|rest api)\b|\b(?:GET|POST|PUT|PATCH|DELETE)\s+/",
                r"(?i)\b(?:authentication|auth|bearer|access tokens?|api[_ -]?keys?)\b",
                r"(?i)\b(?:requests?|responses?|json|payloads?|status codes?|headers?)\b",
                r"(?i)\b(?:parameters?|query strings?|curl|https?)\b",
            ]),
        ),
        (
            ContentType::ComplianceDocumentation,
            compile(&[
                r"(?i)\b(?:compliance|regulations?|regulatory|polic(?:y|ies)|audits?)\b",
                r"(?i)\b(?:must|shall|mandatory|prohibited)\b",
                r"(?i)\b(?:gdpr|hipaa|sox|pci(?:[- ]dss)?|soc ?2|iso ?\d{4,5})\b",
                r"(?i)\b(?:controls?|obligations?|attestations?)\b",
            ]),
        ),
        (
            ContentType::ReleaseNotes,
            compile(&[
                r"(?i)\b(?:release notes?|changelog|what's new)\b",
                r"(?i)\b(?:new features?|improvements?|bug ?fix(?:es)?|fixed|resolved)\b",
                r"(?i)\b(?:deprecated|breaking changes?|known issues?|upgrade notes?)\b",
                r"\bv?\d+\.\d+\.\d+\b",
            ]),
        ),
        (
            ContentType::TroubleshootingGuide,
            compile(&[
                r"(?i)\b(?:troubleshoot(?:ing)?|problems?|issues?|errors?|fail(?:s|ed|ure)?)\b",
                r"(?i)\b(?:solutions?|resolve|fix|workarounds?|resolution)\b",
                r"(?i)\b(?:symptoms?|causes?|diagnos(?:e|is|tics?))\b",
                r"(?im)^\s*(?:<p>\s*)?(?:<strong>\s*)?[QA]:|\bfaq\b|frequently asked",
            ]),
        ),
        (
            ContentType::InstallationGuide,
            compile(&[
                r"(?i)\b(?:install(?:ation|ing|er)?|setup|set up|deploy(?:ment|ing)?)\b",
                r"(?i)\b(?:prerequisites?|system requirements|dependencies)\b",
                r"(?i)\b(?:download|configure|npm install|pip install|apt(?:-get)? install|brew install)\b",
                r"(?i)\b(?:compatib(?:le|ility)|supported platforms?|versions?)\b",
            ]),
        ),
        (
            ContentType::UserManual,
            compile(&[
                r"(?i)\b(?:user guide|user manual|manual|handbook)\b",
                r"(?i)\b(?:click|navigate|menus?|buttons?|screens?|dialogs?)\b",
                r"(?i)\b(?:settings|preferences|dashboard|toolbar)\b",
            ]),
        ),
        (
            ContentType::TechnicalSpecification,
            compile(&[
                r"(?i)\b(?:specifications?|architecture|design documents?)\b",
                r"(?i)\b(?:protocols?|interfaces?|schemas?|data models?|components?)\b",
                r"(?i)\b(?:performance|latency|throughput|scalability|constraints?)\b",
                r"(?i)\b(?:functional requirements?|non-functional|shall support|must support)\b",
            ]),
        ),
        (
            ContentType::TrainingMaterial,
            compile(&[
                r"(?i)\b(?:training|course|lessons?|curriculum|modules?)\b",
                r"(?i)\b(?:learning objectives?|objectives?|outcomes?|you will learn)\b",
                r"(?i)\b(?:exercises?|quiz(?:zes)?|assessments?|review questions?)\b",
            ]),
        ),
        (
            ContentType::Tutorial,
            compile(&[
                r"(?i)\b(?:tutorial|walkthrough|how to|getting started|guide)\b",
                r"(?i)\bstep\s*\d+\b|\b(?:first|next|then|finally)\b",
                r"(?i)\b(?:examples?|let's|we will|follow along)\b",
            ]),
        ),
        (ContentType::GeneralDocumentation, Vec::new()),
    ]
});

static CODE_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)```|<code\b|<pre\b|\bfunction\s|\bdef\s|\bclass\s|\bcurl\s|\{""#).unwrap()
});

static TABLE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)<table\b|^[ \t]*\|.*\|[ \t]*\r?$").unwrap());

static IMAGE_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<img\b|!\[|\.(?:png|jpe?g|gif|svg)\b|\bfigure\b").unwrap()
});

static SEQUENCE_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*\d+[.)][ \t]|\bstep\s+\d+|\b(?:first|second|third|next|then|finally)\b")
        .unwrap()
});

static SENTENCE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+(?:\s|$)").unwrap());

static ACRONYM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Z]{2,}\b").unwrap());

/// Score breakdown for one content type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeScore {
    /// Total pattern occurrences
    pub raw_score: usize,
    /// Pattern groups with at least one hit
    pub pattern_matches: usize,
    pub normalized_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentFeatures {
    pub has_code_examples: bool,
    pub has_tables: bool,
    pub has_images: bool,
    pub is_structured: bool,
    pub is_procedural: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexityIndicators {
    /// Distinct long words (8+ chars) per word
    pub vocabulary_complexity: f64,
    /// Sentences per non-empty line, capped at 1
    pub sentence_complexity: f64,
    /// Acronyms per word
    pub technical_density: f64,
}

/// Classifier output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub primary_type: ContentType,
    pub confidence_score: f64,
    pub content_features: ContentFeatures,
    pub complexity_indicators: ComplexityIndicators,
    #[serde(default)]
    pub type_scores: BTreeMap<ContentType, TypeScore>,
}

impl ClassificationResult {
    /// Result used when classification fails.
    pub fn fallback() -> Self {
        Self {
            primary_type: ContentType::GeneralDocumentation,
            confidence_score: 0.5,
            content_features: ContentFeatures::default(),
            complexity_indicators: ComplexityIndicators::default(),
            type_scores: BTreeMap::new(),
        }
    }
}

/// Scoring strategy for content types.
pub trait ContentScorer: Send + Sync {
    fn name(&self) -> &str;

    /// Score every content type the strategy knows about.
    fn score(&self, content: &str) -> BTreeMap<ContentType, TypeScore>;
}

/// Regex pattern-group scorer.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternScorer;

impl ContentScorer for PatternScorer {
    fn name(&self) -> &str {
        "pattern"
    }

    fn score(&self, content: &str) -> BTreeMap<ContentType, TypeScore> {
        let length_factor = (content.chars().count() as f64 / 1000.0).max(1.0);

        PATTERN_TABLE
            .iter()
            .map(|(content_type, patterns)| {
                let mut score = TypeScore::default();
                for pattern in patterns {
                    let hits = pattern.find_iter(content).count();
                    score.raw_score += hits;
                    if hits > 0 {
                        score.pattern_matches += 1;
                    }
                }
                score.normalized_score = (score.raw_score as f64 / length_factor).min(1.0);
                (*content_type, score)
            })
            .collect()
    }
}

/// Assigns a content type, feature flags and complexity indicators.
pub struct ContentClassifier {
    scorer: Box<dyn ContentScorer>,
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::new(Box::new(PatternScorer))
    }
}

impl ContentClassifier {
    pub fn new(scorer: Box<dyn ContentScorer>) -> Self {
        Self { scorer }
    }

    /// Classify content.
    ///
    /// Returns `AppError::Analysis` for empty content.
    pub fn classify(
        &self,
        content: &str,
        metadata: &Map<String, Value>,
    ) -> AppResult<ClassificationResult> {
        if content.trim().is_empty() {
            return Err(AppError::Analysis(
                "Cannot classify empty content".to_string(),
            ));
        }

        let type_scores = self.scorer.score(content);
        let (primary_type, confidence_score) = pick_primary(&type_scores);
        let filename = metadata
            .get("original_filename")
            .and_then(|name| name.as_str())
            .unwrap_or("unknown");

        tracing::debug!(
            scorer = self.scorer.name(),
            filename,
            primary_type = %primary_type,
            confidence = confidence_score,
            "Content classified"
        );

        Ok(ClassificationResult {
            primary_type,
            confidence_score,
            content_features: detect_features(content),
            complexity_indicators: complexity_indicators(content),
            type_scores,
        })
    }
}

/// Highest normalized score above the threshold, ties going to table order.
fn pick_primary(scores: &BTreeMap<ContentType, TypeScore>) -> (ContentType, f64) {
    let mut best: Option<(ContentType, f64)> = None;

    for content_type in ContentType::ALL {
        let Some(score) = scores.get(&content_type) else {
            continue;
        };
        let beats = match best {
            Some((_, best_score)) => score.normalized_score > best_score,
            None => true,
        };
        if beats {
            best = Some((content_type, score.normalized_score));
        }
    }

    match best {
        Some((content_type, score)) if score > MIN_TYPE_SCORE => (content_type, score),
        _ => (ContentType::GeneralDocumentation, 0.5),
    }
}

fn detect_features(content: &str) -> ContentFeatures {
    ContentFeatures {
        has_code_examples: CODE_MARKER_RE.is_match(content),
        has_tables: TABLE_MARKER_RE.is_match(content),
        has_images: IMAGE_MARKER_RE.is_match(content),
        is_structured: find_headings(content).len() >= 2,
        is_procedural: SEQUENCE_MARKER_RE.find_iter(content).count() >= 3,
    }
}

fn complexity_indicators(content: &str) -> ComplexityIndicators {
    let text = strip_tags(content);
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        return ComplexityIndicators::default();
    }

    let word_total = words.len() as f64;
    let long_words: HashSet<&str> = words
        .iter()
        .filter(|w| w.chars().count() >= 8)
        .map(String::as_str)
        .collect();

    let lines = content.lines().filter(|l| !l.trim().is_empty()).count().max(1);
    let sentences = SENTENCE_END_RE.find_iter(&text).count();

    ComplexityIndicators {
        vocabulary_complexity: (long_words.len() as f64 / word_total).min(1.0),
        sentence_complexity: (sentences as f64 / lines as f64).min(1.0),
        technical_density: (ACRONYM_RE.find_iter(&text).count() as f64 / word_total).min(1.0),
    }
}
