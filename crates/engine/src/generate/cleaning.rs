//! Normalization of raw LLM output into an `article-body` fragment.

use crate::strategy::CleaningRule;
use regex::Regex;
use std::sync::LazyLock;

pub const ARTICLE_BODY_OPEN: &str = "<div class=\"article-body\">";

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\r?\n?(.*?)\r?\n?```$").unwrap());

static DOCUMENT_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<!DOCTYPE[^>]*>|<head\b.*?</head\s*>|</?(?:html|body)\b[^>]*>").unwrap()
});

static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").unwrap());

static ARTICLE_BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<div\s+class\s*=\s*["']article-body["'][^>]*>"#).unwrap());

static EXAMPLE_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(h[2-6])([^>]*)>\s*example\s+(response|request)\s*:?\s*</h[2-6]\s*>").unwrap()
});

static STEP_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(<p\b[^>]*>)\s*(?:<strong>)?\s*step\s+(\d+)\s*:\s*(?:</strong>)?\s*").unwrap()
});

static QA_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<p\b[^>]*>\s*(?:<strong>)?\s*Q:\s*(?:</strong>)?\s*(.*?)\s*</p>\s*<p\b[^>]*>\s*(?:<strong>)?\s*A:\s*(?:</strong>)?\s*(.*?)\s*</p>",
    )
    .unwrap()
});

/// Clean raw LLM output.
///
/// Strips Markdown fences and document wrappers, drops images, keeps the
/// `article-body` div (adding one if missing) and applies the type rule.
pub fn clean_generated_html(raw: &str, rule: CleaningRule) -> String {
    let mut html = raw.trim().to_string();

    if let Some(inner) = FENCE_RE.captures(&html).and_then(|c| c.get(1)) {
        html = inner.as_str().trim().to_string();
    }

    html = DOCUMENT_TAG_RE.replace_all(&html, "").trim().to_string();
    html = IMAGE_RE.replace_all(&html, "").to_string();
    html = unwrap_article_body(&html);

    match rule {
        CleaningRule::ApiExamples => {
            html = EXAMPLE_HEADING_RE
                .replace_all(&html, |caps: &regex::Captures| {
                    let kind = if caps[3].eq_ignore_ascii_case("request") {
                        "Request"
                    } else {
                        "Response"
                    };
                    format!("<{}{}>Example {}</{}>", &caps[1], &caps[2], kind, &caps[1])
                })
                .to_string();
        }
        CleaningRule::TutorialSteps => {
            html = STEP_PREFIX_RE
                .replace_all(&html, "${1}<strong>Step ${2}:</strong> ")
                .to_string();
        }
        CleaningRule::QaPairs => {
            html = QA_PAIR_RE
                .replace_all(&html, "<h4>Q: ${1}</h4>\n<p><strong>A:</strong> ${2}</p>")
                .to_string();
        }
        CleaningRule::None => {}
    }

    html
}

/// Keep everything from the `article-body` opening tag through the last
/// closing `</div>`, or wrap the content when no such div exists.
fn unwrap_article_body(html: &str) -> String {
    match ARTICLE_BODY_RE.find(html) {
        Some(open) => {
            let body = &html[open.start()..];
            match body.rfind("</div>") {
                Some(end) => body[..end + "</div>".len()].to_string(),
                None => format!("{}</div>", body),
            }
        }
        None => format!("{}\n{}\n</div>", ARTICLE_BODY_OPEN, html.trim()),
    }
}
