//! Small text and HTML helpers shared by the pipeline stages.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Tags whose contents are never rewritten by text-node transforms.
static VERBATIM_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^<(pre|code|script|style)\b").unwrap());

static VERBATIM_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^</(pre|code|script|style)\s*>").unwrap());

/// Whitespace-delimited word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Remove markup and collapse whitespace.
pub fn strip_tags(html: &str) -> String {
    let without_tags = TAG_RE.replace_all(html, " ");
    WS_RE.replace_all(&without_tags, " ").trim().to_string()
}

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z]+);").unwrap());

/// Decode the common named entities and numeric references in a single pass.
///
/// Unknown names are left untouched.
pub fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                    .and_then(Result::ok)
                    .and_then(char::from_u32),
            };
            match decoded {
                Some(ch) => ch.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Lowercase, hyphen-separated anchor id.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in strip_tags(text).chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

/// Human-readable document name derived from an uploaded filename.
pub fn clean_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem = match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    };

    let cleaned = stem
        .trim_start_matches('.')
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.is_empty() {
        "Document".to_string()
    } else {
        cleaned
    }
}

/// First `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// SHA-256 hex digest, used to link articles back to their source.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Apply `f` to every text node of `html`, leaving tags and the contents of
/// `<pre>`, `<code>`, `<script>` and `<style>` untouched.
pub fn map_text_nodes<F>(html: &str, mut f: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(html.len());
    let mut verbatim_depth = 0usize;
    let mut last = 0;

    for tag in TAG_RE.find_iter(html) {
        let text = &html[last..tag.start()];
        if verbatim_depth == 0 {
            out.push_str(&f(text));
        } else {
            out.push_str(text);
        }

        let tag_str = tag.as_str();
        if VERBATIM_OPEN_RE.is_match(tag_str) && !tag_str.ends_with("/>") {
            verbatim_depth += 1;
        } else if VERBATIM_CLOSE_RE.is_match(tag_str) {
            verbatim_depth = verbatim_depth.saturating_sub(1);
        }

        out.push_str(tag_str);
        last = tag.end();
    }

    let tail = &html[last..];
    if verbatim_depth == 0 {
        out.push_str(&f(tail));
    } else {
        out.push_str(tail);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("<h2>Title</h2>\n<p>Hello <b>world</b></p>"),
            "Title Hello world"
        );
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Getting Started: Step 1"), "getting-started-step-1");
        assert_eq!(slugify("  <em>API</em> Keys!  "), "api-keys");
        assert_eq!(slugify("???"), "section");
    }

    #[test]
    fn test_clean_filename() {
        assert_eq!(clean_filename("user_guide-v2.docx"), "user guide v2");
        assert_eq!(clean_filename("uploads/Release_Notes.pdf"), "Release Notes");
        assert_eq!(clean_filename(".hidden"), "hidden");
        assert_eq!(clean_filename(""), "Document");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("AT&amp;T &lt;b&gt; &quot;x&quot;"), "AT&T <b> \"x\"");
        assert_eq!(decode_entities("&#39;a&#x41;&nbsp;b"), "'aA b");
        assert_eq!(decode_entities("&amp;lt; stays encoded once"), "&lt; stays encoded once");
        assert_eq!(decode_entities("&bogus; & alone"), "&bogus; & alone");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn test_map_text_nodes_skips_code() {
        let html = "<p>use GET here</p><pre><code>GET /raw</code></pre><p>GET</p>";
        let mapped = map_text_nodes(html, |t| t.replace("GET", "[GET]"));
        assert_eq!(
            mapped,
            "<p>use [GET] here</p><pre><code>GET /raw</code></pre><p>[GET]</p>"
        );
    }

    #[test]
    fn test_content_hash_stable() {
        assert_eq!(content_hash("abc"), content_hash("abc"));
        assert_eq!(content_hash("abc").len(), 64);
    }
}
