//! Source-fidelity checks for generated articles.
//!
//! All checks are pure functions of `(source, generated, content_type)`.

use crate::strategy::{ContentType, FidelityRule};
use crate::text::strip_tags;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Generated text may be at most this many times longer than the source.
pub const MAX_LENGTH_RATIO: f64 = 3.0;

/// Minimum share of distinct generated words that must occur in the source.
pub const MIN_WORD_OVERLAP: f64 = 0.3;

/// Phrases that signal generic filler rather than source material.
pub const FORBIDDEN_PHRASES: [&str; 6] = [
    "common issue",
    "typical problem",
    "usually",
    "generally",
    "best practice",
    "in most cases",
];

static URL_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[A-Za-z0-9_\-{}:./]*[A-Za-z0-9_\-{}:]").unwrap());

static ORDINAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|\s)\d+\.\s|\bstep\s+\d+\b|\b(?:first|second|third|next|then|finally)\b")
        .unwrap()
});

/// Outcome of a fidelity check.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FidelityReport {
    pub violations: Vec<String>,
}

impl FidelityReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Check generated HTML against the source it was produced from.
pub fn validate_fidelity(source: &str, generated: &str, content_type: ContentType) -> FidelityReport {
    let source_text = strip_tags(source);
    let generated_text = strip_tags(generated);

    let mut violations = base_violations(&source_text, &generated_text);

    match content_type.strategy().fidelity {
        FidelityRule::NoInventedPaths => {
            for path in invented_paths(&source_text, &generated_text) {
                violations.push(format!("path not present in source: {}", path));
            }
        }
        FidelityRule::StepCount => {
            let source_steps = ORDINAL_RE.find_iter(&source_text).count();
            let generated_steps = ORDINAL_RE.find_iter(&generated_text).count();
            if generated_steps as f64 > source_steps as f64 * 1.5 {
                violations.push(format!(
                    "step markers grew from {} to {}",
                    source_steps, generated_steps
                ));
            }
        }
        FidelityRule::ForbiddenPhrases => {
            let source_lower = source_text.to_lowercase();
            let generated_lower = generated_text.to_lowercase();
            for phrase in FORBIDDEN_PHRASES {
                if generated_lower.contains(phrase) && !source_lower.contains(phrase) {
                    violations.push(format!("generic phrase added: \"{}\"", phrase));
                }
            }
        }
        FidelityRule::None => {}
    }

    FidelityReport { violations }
}

fn base_violations(source_text: &str, generated_text: &str) -> Vec<String> {
    let mut violations = Vec::new();

    if generated_text.trim().is_empty() {
        violations.push("generated content is empty".to_string());
        return violations;
    }

    let source_len = source_text.chars().count().max(1) as f64;
    let ratio = generated_text.chars().count() as f64 / source_len;
    if ratio > MAX_LENGTH_RATIO {
        violations.push(format!("generated text is {:.1}x the source length", ratio));
    }

    let source_words = significant_words(source_text);
    let generated_words = significant_words(generated_text);
    if !generated_words.is_empty() {
        let shared = generated_words.intersection(&source_words).count();
        let overlap = shared as f64 / generated_words.len() as f64;
        if overlap < MIN_WORD_OVERLAP {
            violations.push(format!(
                "only {:.0}% of generated vocabulary appears in the source",
                overlap * 100.0
            ));
        }
    }

    violations
}

/// Distinct lowercase words of four or more characters.
fn significant_words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 4)
        .map(str::to_lowercase)
        .collect()
}

fn invented_paths<'a>(source_text: &str, generated_text: &'a str) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    URL_PATH_RE
        .find_iter(generated_text)
        .map(|m| m.as_str())
        .filter(|path| !source_text.contains(path))
        .filter(|path| seen.insert(*path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const API_SOURCE: &str = "<h2>Users</h2><p>POST /users creates a user account. \
                              GET /users/{id} returns the account.</p>";

    #[test]
    fn test_faithful_rewrite_passes() {
        let generated = "<div class=\"article-body\"><h2>Users</h2><p>POST /users creates a user \
                         account and GET /users/{id} returns the account.</p></div>";
        let report = validate_fidelity(API_SOURCE, generated, ContentType::ApiDocumentation);
        assert!(report.passed(), "{:?}", report.violations);
    }

    #[test]
    fn test_invented_path_fails() {
        let generated = "<p>POST /users creates a user account. DELETE /admin/purge removes \
                         the account.</p>";
        let report = validate_fidelity(API_SOURCE, generated, ContentType::ApiDocumentation);
        assert!(!report.passed());
        assert!(report.violations[0].contains("/admin/purge"));
    }

    #[test]
    fn test_paths_only_checked_for_api_docs() {
        let generated = "<p>POST /users creates a user account at /admin/purge.</p>";
        let report = validate_fidelity(API_SOURCE, generated, ContentType::UserManual);
        assert!(report.passed(), "{:?}", report.violations);
    }

    #[test]
    fn test_tutorial_step_inflation() {
        let source = "Step 1 open the editor. Step 2 save the file.";
        let faithful = "<p>Step 1 open the editor.</p><p>Step 2 save the file.</p>";
        let inflated = "<p>Step 1 open the editor. Step 2 save the file. Step 3 open the file. \
                        Step 4 save the editor. Then save.</p>";

        assert!(validate_fidelity(source, faithful, ContentType::Tutorial).passed());
        assert!(!validate_fidelity(source, inflated, ContentType::Tutorial).passed());
    }

    #[test]
    fn test_step_count_only_applies_to_tutorials() {
        let source = "Install the package. Configure the service. Start the service.";
        let generated = "<p>First install the package. Then configure the service. \
                         Next start the service. Finally the service runs.</p>";

        let report = validate_fidelity(source, generated, ContentType::InstallationGuide);
        assert!(report.passed(), "{:?}", report.violations);
        assert!(!validate_fidelity(source, generated, ContentType::Tutorial).passed());
    }

    #[test]
    fn test_forbidden_phrase_added() {
        let source = "Restart the service when the queue stalls.";
        let generated = "<p>Usually you should restart the service when the queue stalls.</p>";
        let report = validate_fidelity(source, generated, ContentType::TroubleshootingGuide);
        assert_eq!(report.violations.len(), 1);

        let source_with_phrase = "Usually restart the service when the queue stalls.";
        let report = validate_fidelity(source_with_phrase, generated, ContentType::TroubleshootingGuide);
        assert!(report.passed(), "{:?}", report.violations);
    }

    #[test]
    fn test_base_check_rejects_empty_and_bloated_output() {
        let source = "Short source text about queues.";
        assert!(!validate_fidelity(source, "<div></div>", ContentType::GeneralDocumentation).passed());

        let bloated = "Short source text about queues. ".repeat(10);
        assert!(!validate_fidelity(source, &bloated, ContentType::GeneralDocumentation).passed());
    }

    #[test]
    fn test_base_check_rejects_unrelated_vocabulary() {
        let source = "Rotate the signing keys every quarter and archive the retired keys.";
        let generated = "Penguins gather along frozen coastlines during winter migrations.";
        let report = validate_fidelity(source, generated, ContentType::GeneralDocumentation);
        assert!(!report.passed());
    }

    #[test]
    fn test_validation_is_idempotent() {
        let generated = "<p>POST /users creates a user account. DELETE /admin/purge removes it.</p>";
        let first = validate_fidelity(API_SOURCE, generated, ContentType::ApiDocumentation);
        let second = validate_fidelity(API_SOURCE, generated, ContentType::ApiDocumentation);
        assert_eq!(first, second);
    }
}
