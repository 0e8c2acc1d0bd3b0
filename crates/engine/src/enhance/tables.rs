use super::EnhanceContext;
use docforge_core::AppResult;
use regex::Regex;
use std::sync::LazyLock;

static TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<table\b[^>]*>.*?</table\s*>").unwrap());

static BARE_TABLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<table\s*>").unwrap());

/// Wrap tables in a responsive container and give bare tables default classes.
pub fn enhance_tables(html: &str, _ctx: &EnhanceContext<'_>) -> AppResult<String> {
    if html.contains("class=\"table-responsive\"") {
        return Ok(html.to_string());
    }

    let classed = BARE_TABLE_RE.replace_all(html, "<table class=\"table table-striped\">");
    let wrapped = TABLE_RE.replace_all(&classed, "<div class=\"table-responsive\">${0}</div>");
    Ok(wrapped.into_owned())
}
