//! Prompt construction for article generation.

use crate::analysis::ContentAnalysis;
use docforge_core::AppResult;
use docforge_prompt::{build_prompt, BuiltPrompt, PromptDefinition};
use std::collections::HashMap;

/// Identifier of the article prompt; overridable from `.docforge/prompts/`.
pub const ARTICLE_PROMPT_ID: &str = "article.generate";

/// Markers delimiting the embedded source in the user prompt.
pub const SOURCE_START: &str = "=== SOURCE CONTENT START ===";
pub const SOURCE_END: &str = "=== SOURCE CONTENT END ===";

const ARTICLE_TEMPLATE: &str = "Create a knowledge-base article from the source content below.

Document: {{document_title}}
Content type: {{content_type}}
Processing approach: {{approach}}
Article: {{article_position}} of {{article_count}}{{#if section_title}}
Section: {{section_title}}{{/if}}
Structural complexity: {{complexity}}
Detected features: {{features}}

=== SOURCE CONTENT START ===
{{source_content}}
=== SOURCE CONTENT END ===

Return only the article HTML.";

/// Built-in article prompt definition.
pub fn builtin_article_prompt() -> PromptDefinition {
    PromptDefinition::builtin(ARTICLE_PROMPT_ID, "Knowledge article generation", ARTICLE_TEMPLATE)
}

/// Clause appended to the system prompt when retrying after a fidelity failure.
pub const STRICT_FIDELITY_CLAUSE: &str = "ABSOLUTE SOURCE FIDELITY REQUIRED:
- A previous answer added material that is not in the source
- Restate only what the source says, even if the article becomes shorter
- Do not add paths, steps or advice of your own";

/// Build the system prompt for one article.
pub fn build_system_prompt(analysis: &ContentAnalysis) -> String {
    let classification = &analysis.classification;
    let features = &classification.content_features;

    let mut prompt = String::from(
        "You are a technical documentation specialist who turns source documents into \
         knowledge-base articles.\n\n",
    );

    prompt.push_str(
        "SOURCE FIDELITY RULES:\n\
         - Use only information that appears in the source content\n\
         - Never invent examples, endpoints, commands, figures or steps\n\
         - Keep names, values and technical terms exactly as written\n\
         - If the source is incomplete, leave the article incomplete\n\n",
    );

    prompt.push_str(classification.primary_type.strategy().prompt_guidance);
    prompt.push_str("\n\n");

    if features.has_code_examples {
        prompt.push_str(
            "CODE EXAMPLES:\n\
             - Reproduce every code sample verbatim inside <pre><code> blocks\n\
             - Do not add comments, fix, shorten or translate code\n\n",
        );
    }

    if features.has_tables {
        prompt.push_str(
            "TABLES:\n\
             - Keep tables as HTML <table> elements with the same rows, columns and values\n\n",
        );
    }

    if analysis.structure.structural_complexity > 0.7 {
        prompt.push_str(
            "COMPLEX STRUCTURE:\n\
             - Preserve the section hierarchy of the source; do not flatten nested sections or lists\n\n",
        );
    }

    prompt.push_str(
        "FORMATTING:\n\
         - Return clean HTML wrapped in <div class=\"article-body\">\n\
         - Use <h2> to <h4>, <p>, <ul>, <ol>, <pre><code> and <table> only\n\
         - No <html>, <head> or <body> tags, no Markdown, no commentary before or after the HTML\n\
         - Do not embed images",
    );

    prompt
}

/// The retry variant of a system prompt.
pub fn strict_system_prompt(system: &str) -> String {
    format!("{}\n\n{}", system, STRICT_FIDELITY_CLAUSE)
}

/// Values substituted into the article prompt template.
#[derive(Debug, Clone)]
pub struct PromptInputs<'a> {
    pub document_title: &'a str,
    pub section_title: Option<&'a str>,
    pub article_position: usize,
    pub article_count: usize,
    pub source_content: &'a str,
}

/// Render the user prompt for one article.
pub fn build_user_prompt(
    definition: &PromptDefinition,
    analysis: &ContentAnalysis,
    inputs: &PromptInputs<'_>,
) -> AppResult<BuiltPrompt> {
    let classification = &analysis.classification;
    let features = &classification.content_features;

    let feature_labels: Vec<&str> = [
        (features.has_code_examples, "code examples"),
        (features.has_tables, "tables"),
        (features.is_structured, "structured headings"),
        (features.is_procedural, "procedural steps"),
    ]
    .into_iter()
    .filter_map(|(present, label)| present.then_some(label))
    .collect();

    let mut variables = HashMap::new();
    variables.insert("document_title".to_string(), inputs.document_title.to_string());
    variables.insert(
        "content_type".to_string(),
        classification.primary_type.display_name(),
    );
    variables.insert(
        "approach".to_string(),
        analysis.granularity.recommended_approach.to_string(),
    );
    variables.insert(
        "article_position".to_string(),
        inputs.article_position.to_string(),
    );
    variables.insert("article_count".to_string(), inputs.article_count.to_string());
    variables.insert(
        "section_title".to_string(),
        inputs.section_title.unwrap_or_default().to_string(),
    );
    variables.insert(
        "complexity".to_string(),
        format!("{:.2}", analysis.structure.structural_complexity),
    );
    variables.insert(
        "features".to_string(),
        if feature_labels.is_empty() {
            "none".to_string()
        } else {
            feature_labels.join(", ")
        },
    );
    variables.insert(
        "source_content".to_string(),
        inputs.source_content.to_string(),
    );

    build_prompt(definition, variables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ContentAnalyzer;
    use serde_json::Map;

    fn analysis_for(content: &str) -> ContentAnalysis {
        ContentAnalyzer::default().analyze(content, &Map::new())
    }

    #[test]
    fn test_system_prompt_blocks() {
        let analysis = analysis_for(
            "## Create user\n\nPOST /users with a JSON request and a Bearer token.\n\n```json\n{\"a\": 1}\n```",
        );

        let prompt = build_system_prompt(&analysis);
        assert!(prompt.contains("API DOCUMENTATION REQUIREMENTS"));
        assert!(prompt.contains("CODE EXAMPLES"));
        assert!(!prompt.contains("TABLES:"));
        assert!(!prompt.contains("ABSOLUTE SOURCE FIDELITY"));

        let strict = strict_system_prompt(&prompt);
        assert!(strict.starts_with(&prompt));
        assert!(strict.contains("ABSOLUTE SOURCE FIDELITY REQUIRED"));
    }

    #[test]
    fn test_user_prompt_embeds_source() {
        let analysis = analysis_for("Some plain words for a plain document.");
        let inputs = PromptInputs {
            document_title: "notes",
            section_title: Some("Overview"),
            article_position: 2,
            article_count: 3,
            source_content: "<p>Source & body</p>",
        };

        let built = build_user_prompt(&builtin_article_prompt(), &analysis, &inputs).unwrap();
        assert!(built.user.contains("Article: 2 of 3"));
        assert!(built.user.contains("Section: Overview"));
        assert!(built.user.contains(&format!("{}\n<p>Source & body</p>\n{}", SOURCE_START, SOURCE_END)));
        assert!(built.system.is_none());
        assert_eq!(built.metadata.source_prompt_id, ARTICLE_PROMPT_ID);
    }

    #[test]
    fn test_user_prompt_without_section() {
        let analysis = analysis_for("Some plain words for a plain document.");
        let inputs = PromptInputs {
            document_title: "notes",
            section_title: None,
            article_position: 1,
            article_count: 1,
            source_content: "body",
        };

        let built = build_user_prompt(&builtin_article_prompt(), &analysis, &inputs).unwrap();
        assert!(!built.user.contains("Section:"));
        assert!(built.user.contains("Content type: General Documentation"));
    }
}
