//! Base HTML formatting capability.

use crate::generate::cleaning::ARTICLE_BODY_OPEN;
use crate::text::map_text_nodes;
use docforge_core::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

static EMPTY_PARAGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<p\b[^>]*>(?:\s|&nbsp;|<br\s*/?>)*</p\s*>").unwrap()
});

static BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\r?\n){2,}").unwrap());

static MD_BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]+)\*\*").unwrap());

/// First transform applied to every article.
///
/// Implementations receive the article HTML and the source document; an
/// error leaves the article untouched.
pub trait BaseFormatter: Send + Sync {
    fn name(&self) -> &str;

    fn enhance(&self, html: &str, source: &str) -> AppResult<String>;
}

/// Tidies generated HTML without changing its meaning.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardFormatter;

impl BaseFormatter for StandardFormatter {
    fn name(&self) -> &str {
        "standard"
    }

    fn enhance(&self, html: &str, _source: &str) -> AppResult<String> {
        if html.trim().is_empty() {
            return Err(AppError::Enhancement(
                "Cannot format empty article content".to_string(),
            ));
        }

        let html = EMPTY_PARAGRAPH_RE.replace_all(html, "");
        let html = BLANK_LINES_RE.replace_all(&html, "\n\n");
        let html = map_text_nodes(&html, |text| {
            MD_BOLD_RE.replace_all(text, "<strong>$1</strong>").into_owned()
        });
        let html = html.trim();

        if html.contains("class=\"article-body\"") {
            Ok(html.to_string())
        } else {
            Ok(format!("{}\n{}\n</div>", ARTICLE_BODY_OPEN, html))
        }
    }
}
