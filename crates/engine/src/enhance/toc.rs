//! Table of contents generation.

use super::EnhanceContext;
use crate::text::{slugify, strip_tags};
use docforge_core::AppResult;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Articles with more headings than this get a table of contents.
pub const TOC_MIN_HEADINGS: usize = 4;

/// At most this many headings are listed.
pub const TOC_MAX_ENTRIES: usize = 20;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h([1-6])([^>]*)>(.*?)</h[1-6]\s*>").unwrap());

static ID_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bid\s*=\s*["']([^"']*)["']"#).unwrap());

static ARTICLE_BODY_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<div\s+class\s*=\s*["']article-body["'][^>]*>"#).unwrap());

struct TocEntry {
    level: u8,
    id: String,
    text: String,
}

/// Add heading ids and insert a TOC after the `article-body` opening tag.
pub fn add_table_of_contents(html: &str, _ctx: &EnhanceContext<'_>) -> AppResult<String> {
    if html.contains("id=\"advanced-toc-container\"") {
        return Ok(html.to_string());
    }
    if HEADING_RE.find_iter(html).count() <= TOC_MIN_HEADINGS {
        return Ok(html.to_string());
    }

    let mut used: HashSet<String> = HEADING_RE
        .captures_iter(html)
        .filter_map(|caps| ID_ATTR_RE.captures(&caps[2]).map(|id| id[1].to_string()))
        .collect();
    let mut entries = Vec::new();

    let with_ids = HEADING_RE.replace_all(html, |caps: &Captures| {
        let level = caps[1].parse::<u8>().unwrap_or(2);
        let attrs = &caps[2];
        let inner = &caps[3];
        let text = strip_tags(inner).trim().to_string();

        let (id, tag) = match ID_ATTR_RE.captures(attrs) {
            Some(existing) => (existing[1].to_string(), caps[0].to_string()),
            None => {
                let id = unique_slug(&text, &mut used);
                let tag = format!("<h{level}{attrs} id=\"{id}\">{inner}</h{level}>");
                (id, tag)
            }
        };

        entries.push(TocEntry { level, id, text });
        tag
    });

    let toc = render_toc(&entries);
    let with_ids = with_ids.into_owned();

    Ok(match ARTICLE_BODY_OPEN_RE.find(&with_ids) {
        Some(open) => format!(
            "{}\n{}{}",
            &with_ids[..open.end()],
            toc,
            &with_ids[open.end()..]
        ),
        None => format!("{}\n{}", toc, with_ids),
    })
}

fn unique_slug(text: &str, used: &mut HashSet<String>) -> String {
    let base = slugify(text);
    let mut candidate = base.clone();
    let mut n = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{}-{}", base, n);
        n += 1;
    }
    candidate
}

fn render_toc(entries: &[TocEntry]) -> String {
    let mut toc = String::from(
        "<div id=\"advanced-toc-container\" class=\"advanced-toc\">\n\
         <h3 class=\"toc-title\">Table of Contents</h3>\n\
         <ul class=\"toc-list\">\n",
    );
    for entry in entries.iter().take(TOC_MAX_ENTRIES) {
        toc.push_str(&format!(
            "<li class=\"toc-level-{}\"><a href=\"#{}\">{}</a></li>\n",
            entry.level, entry.id, entry.text
        ));
    }
    toc.push_str("</ul>\n</div>");
    toc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ContentFeatures;
    use crate::strategy::ContentType;

    fn ctx(features: &ContentFeatures) -> EnhanceContext<'_> {
        EnhanceContext::new(ContentType::UserManual, features, "")
    }

    #[test]
    fn test_few_headings_unchanged() {
        let features = ContentFeatures::default();
        let html = "<div class=\"article-body\"><h2>A</h2><h2>B</h2><h3>C</h3><h3>D</h3></div>";
        assert_eq!(add_table_of_contents(html, &ctx(&features)).unwrap(), html);
    }

    #[test]
    fn test_toc_inserted_with_ids() {
        let features = ContentFeatures::default();
        let html = "<div class=\"article-body\">\n<h2>Setup</h2><p>x</p><h3 id=\"keep\">Keep Me</h3>\
                    <h3>Setup</h3><h2>Usage <em>notes</em></h2><h2>End</h2>\n</div>";

        let enhanced = add_table_of_contents(html, &ctx(&features)).unwrap();
        assert!(enhanced.starts_with(
            "<div class=\"article-body\">\n<div id=\"advanced-toc-container\""
        ));
        assert!(enhanced.contains("<li class=\"toc-level-2\"><a href=\"#setup\">Setup</a></li>"));
        assert!(enhanced.contains("<li class=\"toc-level-3\"><a href=\"#keep\">Keep Me</a></li>"));
        assert!(enhanced.contains("<a href=\"#setup-2\">Setup</a>"));
        assert!(enhanced.contains("<h2 id=\"usage-notes\">Usage <em>notes</em></h2>"));
        assert!(enhanced.contains("<h3 id=\"keep\">Keep Me</h3>"));

        assert_eq!(add_table_of_contents(&enhanced, &ctx(&features)).unwrap(), enhanced);
    }

    #[test]
    fn test_toc_caps_entries() {
        let features = ContentFeatures::default();
        let headings: String = (0..30).map(|i| format!("<h2>Heading {}</h2>", i)).collect();
        let html = format!("<div class=\"article-body\">{}</div>", headings);

        let enhanced = add_table_of_contents(&html, &ctx(&features)).unwrap();
        assert_eq!(enhanced.matches("<li class=\"toc-level-").count(), TOC_MAX_ENTRIES);
    }
}
