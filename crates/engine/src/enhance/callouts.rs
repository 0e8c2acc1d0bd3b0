//! Type-specific callouts: API badges, troubleshooting cards and requirement
//! highlights.

use super::EnhanceContext;
use crate::strategy::EnhancementRule;
use crate::text::map_text_nodes;
use docforge_core::AppResult;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static HTTP_METHOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(GET|POST|PUT|PATCH|DELETE)(\s+/)").unwrap());

/// A bare status code, with its reason phrase when one follows.
static STATUS_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b([1-5][0-9]{2})\b(\s+(?:OK|Created|Accepted|No Content|Moved Permanently|Found|Not Modified|Bad Request|Unauthorized|Forbidden|Not Found|Method Not Allowed|Conflict|Unprocessable Entity|Too Many Requests|Internal Server Error|Bad Gateway|Service Unavailable)\b)?",
    )
    .unwrap()
});

static QA_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h4\b[^>]*>\s*Q:\s*(.*?)\s*</h4>\s*<p\b[^>]*>\s*<strong>A:</strong>\s*(.*?)\s*</p>")
        .unwrap()
});

static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(must not|shall not|must|shall|required|mandatory|should|may|optional|recommended)\b")
        .unwrap()
});

/// Apply the enhancement rule of the article's content type.
pub fn enhance_for_type(html: &str, ctx: &EnhanceContext<'_>) -> AppResult<String> {
    match ctx.content_type.strategy().enhancement {
        EnhancementRule::ApiBadges => Ok(status_codes(&method_badges(html))),
        EnhancementRule::ProblemSolutionCards => Ok(problem_solution_cards(html)),
        EnhancementRule::RequirementHighlights => Ok(requirement_highlights(html)),
        EnhancementRule::None => Ok(html.to_string()),
    }
}

/// `GET /users` becomes a method badge followed by the path.
pub fn method_badges(html: &str) -> String {
    if html.contains("class=\"api-method") {
        return html.to_string();
    }
    map_text_nodes(html, |text| {
        HTTP_METHOD_RE
            .replace_all(text, |caps: &Captures| {
                format!(
                    "<span class=\"api-method method-{}\">{}</span>{}",
                    caps[1].to_lowercase(),
                    &caps[1],
                    &caps[2]
                )
            })
            .into_owned()
    })
}

pub fn status_codes(html: &str) -> String {
    if html.contains("class=\"status-code") {
        return html.to_string();
    }
    map_text_nodes(html, |text| {
        STATUS_CODE_RE
            .replace_all(text, |caps: &Captures| {
                let class = caps[1].chars().next().unwrap_or('2');
                let reason = caps.get(2).map_or("", |m| m.as_str());
                format!(
                    "<span class=\"status-code status-{}xx\">{}{}</span>",
                    class, &caps[1], reason
                )
            })
            .into_owned()
    })
}

/// Turn `<h4>Q: …</h4><p><strong>A:</strong> …</p>` pairs into cards.
pub fn problem_solution_cards(html: &str) -> String {
    QA_HEADING_RE
        .replace_all(
            html,
            "<div class=\"troubleshooting-item\">\n\
             <div class=\"problem-card\"><h4>Problem</h4><p>${1}</p></div>\n\
             <div class=\"solution-card\"><h4>Solution</h4><p>${2}</p></div>\n\
             </div>",
        )
        .into_owned()
}

/// Mark normative keywords as mandatory or optional.
pub fn requirement_highlights(html: &str) -> String {
    if html.contains("class=\"requirement-") {
        return html.to_string();
    }
    map_text_nodes(html, |text| {
        REQUIREMENT_RE
            .replace_all(text, |caps: &Captures| {
                let keyword = &caps[1];
                let kind = match keyword.to_lowercase().as_str() {
                    "should" | "may" | "optional" | "recommended" => "optional",
                    _ => "mandatory",
                };
                format!("<span class=\"requirement-{}\">{}</span>", kind, keyword)
            })
            .into_owned()
    })
}
