//! Content types and the per-type strategy table.
//!
//! Everything that varies by content type (planner weighting, prompt
//! guidance, cleaning, enhancement, code-language defaults and icons) is read
//! from [`ContentType::strategy`], so adding a type means adding one table row.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Document category assigned by the classifier.
///
/// Declaration order is the classifier's tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    ApiDocumentation,
    ComplianceDocumentation,
    ReleaseNotes,
    TroubleshootingGuide,
    InstallationGuide,
    UserManual,
    TechnicalSpecification,
    TrainingMaterial,
    Tutorial,
    GeneralDocumentation,
}

impl ContentType {
    pub const ALL: [ContentType; 10] = [
        ContentType::ApiDocumentation,
        ContentType::ComplianceDocumentation,
        ContentType::ReleaseNotes,
        ContentType::TroubleshootingGuide,
        ContentType::InstallationGuide,
        ContentType::UserManual,
        ContentType::TechnicalSpecification,
        ContentType::TrainingMaterial,
        ContentType::Tutorial,
        ContentType::GeneralDocumentation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::ApiDocumentation => "api_documentation",
            ContentType::ComplianceDocumentation => "compliance_documentation",
            ContentType::ReleaseNotes => "release_notes",
            ContentType::TroubleshootingGuide => "troubleshooting_guide",
            ContentType::InstallationGuide => "installation_guide",
            ContentType::UserManual => "user_manual",
            ContentType::TechnicalSpecification => "technical_specification",
            ContentType::TrainingMaterial => "training_material",
            ContentType::Tutorial => "tutorial",
            ContentType::GeneralDocumentation => "general_documentation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == normalized)
    }

    /// Human-readable label used in prompts.
    pub fn display_name(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn strategy(&self) -> &'static TypeStrategy {
        match self {
            ContentType::ApiDocumentation => &API_DOCUMENTATION,
            ContentType::ComplianceDocumentation => &COMPLIANCE_DOCUMENTATION,
            ContentType::ReleaseNotes => &RELEASE_NOTES,
            ContentType::TroubleshootingGuide => &TROUBLESHOOTING_GUIDE,
            ContentType::InstallationGuide => &INSTALLATION_GUIDE,
            ContentType::UserManual => &USER_MANUAL,
            ContentType::TechnicalSpecification => &TECHNICAL_SPECIFICATION,
            ContentType::TrainingMaterial => &TRAINING_MATERIAL,
            ContentType::Tutorial => &TUTORIAL,
            ContentType::GeneralDocumentation => &GENERAL_DOCUMENTATION,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific cleanup applied to generated HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleaningRule {
    None,
    /// Normalize "Example Response" / "Example Request" headings
    ApiExamples,
    /// Bold "Step N:" paragraph prefixes
    TutorialSteps,
    /// Restructure Q:/A: paragraph pairs
    QaPairs,
}

/// Type-specific HTML enhancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhancementRule {
    None,
    ApiBadges,
    ProblemSolutionCards,
    RequirementHighlights,
}

/// Closing block appended to deterministic fallback articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosingBlock {
    None,
    KeyPoints,
    SeeSource,
}

/// Extra fidelity rule checked on top of the base check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FidelityRule {
    None,
    /// Generated text must not mention URL paths absent from the source
    NoInventedPaths,
    /// Ordinal step markers must not exceed 1.5x the source count
    StepCount,
    /// Generic filler phrases absent from the source are rejected
    ForbiddenPhrases,
}

#[derive(Debug)]
pub struct TypeStrategy {
    /// Planner content-type factor
    pub complexity: f64,
    pub prompt_guidance: &'static str,
    pub default_languages: &'static [&'static str],
    pub icon: &'static str,
    pub cleaning: CleaningRule,
    pub enhancement: EnhancementRule,
    pub closing: ClosingBlock,
    pub fidelity: FidelityRule,
}

static API_DOCUMENTATION: TypeStrategy = TypeStrategy {
    complexity: 0.8,
    prompt_guidance: "API DOCUMENTATION REQUIREMENTS:\n\
        - Preserve every endpoint, HTTP method, parameter and status code exactly as written\n\
        - Keep request and response examples verbatim inside <pre><code> blocks\n\
        - Never add endpoints, fields or authentication schemes that the source does not describe",
    default_languages: &["json", "javascript", "bash"],
    icon: "🔌",
    cleaning: CleaningRule::ApiExamples,
    enhancement: EnhancementRule::ApiBadges,
    closing: ClosingBlock::SeeSource,
    fidelity: FidelityRule::NoInventedPaths,
};

static COMPLIANCE_DOCUMENTATION: TypeStrategy = TypeStrategy {
    complexity: 0.9,
    prompt_guidance: "COMPLIANCE DOCUMENTATION REQUIREMENTS:\n\
        - Reproduce every requirement, obligation and control with its original wording\n\
        - Keep the distinction between mandatory (must, shall) and optional (may, should) language\n\
        - Do not summarize, soften or generalize regulatory statements",
    default_languages: &["text"],
    icon: "📋",
    cleaning: CleaningRule::None,
    enhancement: EnhancementRule::RequirementHighlights,
    closing: ClosingBlock::None,
    fidelity: FidelityRule::ForbiddenPhrases,
};

static RELEASE_NOTES: TypeStrategy = TypeStrategy {
    complexity: 0.3,
    prompt_guidance: "RELEASE NOTES REQUIREMENTS:\n\
        - Keep version numbers, dates and change categories exactly as listed\n\
        - Present changes as lists grouped the way the source groups them\n\
        - Do not describe features or fixes that the source does not mention",
    default_languages: &["bash"],
    icon: "📢",
    cleaning: CleaningRule::None,
    enhancement: EnhancementRule::None,
    closing: ClosingBlock::None,
    fidelity: FidelityRule::None,
};

static TROUBLESHOOTING_GUIDE: TypeStrategy = TypeStrategy {
    complexity: 0.7,
    prompt_guidance: "TROUBLESHOOTING GUIDE REQUIREMENTS:\n\
        - Keep each problem paired with the solution the source gives for it\n\
        - Preserve error messages and diagnostic commands verbatim\n\
        - Format question and answer pairs as paragraphs starting with Q: and A:\n\
        - Do not add generic advice or causes the source does not state",
    default_languages: &["bash"],
    icon: "🔧",
    cleaning: CleaningRule::QaPairs,
    enhancement: EnhancementRule::ProblemSolutionCards,
    closing: ClosingBlock::None,
    fidelity: FidelityRule::ForbiddenPhrases,
};

static INSTALLATION_GUIDE: TypeStrategy = TypeStrategy {
    complexity: 0.4,
    prompt_guidance: "INSTALLATION GUIDE REQUIREMENTS:\n\
        - Keep prerequisites, commands and configuration values exactly as written\n\
        - Preserve the order of installation steps\n\
        - Put every command in a <pre><code> block",
    default_languages: &["bash"],
    icon: "⚙️",
    cleaning: CleaningRule::None,
    enhancement: EnhancementRule::None,
    closing: ClosingBlock::None,
    fidelity: FidelityRule::None,
};

static USER_MANUAL: TypeStrategy = TypeStrategy {
    complexity: 0.6,
    prompt_guidance: "USER MANUAL REQUIREMENTS:\n\
        - Keep menu paths, button labels and setting names exactly as written\n\
        - Preserve the task-oriented structure of the source",
    default_languages: &["text"],
    icon: "📖",
    cleaning: CleaningRule::None,
    enhancement: EnhancementRule::None,
    closing: ClosingBlock::None,
    fidelity: FidelityRule::None,
};

static TECHNICAL_SPECIFICATION: TypeStrategy = TypeStrategy {
    complexity: 0.9,
    prompt_guidance: "TECHNICAL SPECIFICATION REQUIREMENTS:\n\
        - Preserve every interface, data format, constraint and numeric limit exactly\n\
        - Keep requirement identifiers and their wording intact\n\
        - Use tables for structured parameters when the source does",
    default_languages: &["json", "text"],
    icon: "📐",
    cleaning: CleaningRule::None,
    enhancement: EnhancementRule::None,
    closing: ClosingBlock::None,
    fidelity: FidelityRule::None,
};

static TRAINING_MATERIAL: TypeStrategy = TypeStrategy {
    complexity: 0.6,
    prompt_guidance: "TRAINING MATERIAL REQUIREMENTS:\n\
        - Keep learning objectives, exercises and review questions as given\n\
        - Preserve the lesson order of the source",
    default_languages: &["python", "javascript"],
    icon: "🎓",
    cleaning: CleaningRule::None,
    enhancement: EnhancementRule::None,
    closing: ClosingBlock::None,
    fidelity: FidelityRule::None,
};

static TUTORIAL: TypeStrategy = TypeStrategy {
    complexity: 0.2,
    prompt_guidance: "TUTORIAL REQUIREMENTS:\n\
        - Keep the exact number and order of steps in the source\n\
        - Start each step paragraph with \"Step N:\" only where the source numbers its steps\n\
        - Keep code samples verbatim inside <pre><code> blocks",
    default_languages: &["javascript", "python", "bash"],
    icon: "📚",
    cleaning: CleaningRule::TutorialSteps,
    enhancement: EnhancementRule::None,
    closing: ClosingBlock::KeyPoints,
    fidelity: FidelityRule::StepCount,
};

static GENERAL_DOCUMENTATION: TypeStrategy = TypeStrategy {
    complexity: 0.5,
    prompt_guidance: "GENERAL DOCUMENTATION REQUIREMENTS:\n\
        - Keep the structure and emphasis of the source\n\
        - Use headings and lists only where the source content supports them",
    default_languages: &["text"],
    icon: "📄",
    cleaning: CleaningRule::None,
    enhancement: EnhancementRule::None,
    closing: ClosingBlock::None,
    fidelity: FidelityRule::None,
};
