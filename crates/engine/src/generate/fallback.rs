//! Deterministic article content used when the LLM produces nothing usable.

use super::cleaning::ARTICLE_BODY_OPEN;
use crate::strategy::{ClosingBlock, ContentType};
use crate::text::{decode_entities, escape_html, strip_tags};
use regex::Regex;
use std::sync::LazyLock;

const MAX_FALLBACK_PARAGRAPHS: usize = 5;

static BLOCK_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\n[ \t]*\r?\n|</?(?:p|h[1-6]|li|div|pre|table|tr|blockquote)\b[^>]*>").unwrap()
});

static MD_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:#{1,6}|[-*+]|\d+[.)])[ \t]+").unwrap());

/// Build fallback HTML from the source text.
///
/// Uses up to five source paragraphs, the first as an intro section, plus a
/// closing block chosen by content type.
pub fn fallback_article_html(source: &str, content_type: ContentType, title: &str) -> String {
    let paragraphs = source_paragraphs(source);

    let mut html = String::from(ARTICLE_BODY_OPEN);
    html.push('\n');

    match paragraphs.split_first() {
        Some((intro, rest)) => {
            html.push_str(&format!(
                "<div class=\"intro-section\">\n<p>{}</p>\n</div>\n",
                escape_html(intro)
            ));
            for paragraph in rest {
                html.push_str(&format!("<p>{}</p>\n", escape_html(paragraph)));
            }
        }
        None => {
            html.push_str(&format!(
                "<div class=\"intro-section\">\n<p>{}</p>\n</div>\n",
                escape_html(title)
            ));
        }
    }

    match content_type.strategy().closing {
        ClosingBlock::KeyPoints if !paragraphs.is_empty() => {
            html.push_str("<div class=\"key-points\">\n<h3>Key Points</h3>\n<ul>\n");
            for paragraph in &paragraphs {
                html.push_str(&format!("<li>{}</li>\n", escape_html(first_sentence(paragraph))));
            }
            html.push_str("</ul>\n</div>\n");
        }
        ClosingBlock::SeeSource => {
            html.push_str(&format!(
                "<div class=\"source-note\">\n<p>See the source document <em>{}</em> for the complete reference.</p>\n</div>\n",
                escape_html(title)
            ));
        }
        _ => {}
    }

    html.push_str("</div>");
    html
}

fn source_paragraphs(source: &str) -> Vec<String> {
    BLOCK_SPLIT_RE
        .split(source)
        .map(|block| decode_entities(&strip_tags(&MD_PREFIX_RE.replace_all(block, ""))))
        .filter(|text| !text.is_empty())
        .take(MAX_FALLBACK_PARAGRAPHS)
        .collect()
}

fn first_sentence(paragraph: &str) -> &str {
    match paragraph.find(". ") {
        Some(idx) => &paragraph[..=idx],
        None => paragraph,
    }
}
