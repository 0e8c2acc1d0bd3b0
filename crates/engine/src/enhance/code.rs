//! Code block language detection and highlighting markup.

use super::EnhanceContext;
use docforge_core::AppResult;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<pre\b([^>]*)>\s*<code\b([^>]*)>(.*?)</code\s*>\s*</pre\s*>").unwrap()
});

static LANGUAGE_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"language-([A-Za-z0-9_+-]+)").unwrap());

/// Per-language signatures; the language with the most hits wins.
static SIGNATURES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        (
            "curl",
            r#"\bcurl\s|(?:^|\s)-H\s+['"]|(?:^|\s)-X\s+(?:GET|POST|PUT|PATCH|DELETE)\b"#,
        ),
        (
            "javascript",
            r"\b(?:function|const|let|var)\s+\w+|=>|console\.log|require\(|\bimport\s+.+\s+from\s",
        ),
        (
            "python",
            r"(?m)\bdef\s+\w+\s*\(|^\s*import\s+\w+|^\s*from\s+\w+\s+import\b|\bprint\(|\bself\.|\belif\b",
        ),
        (
            "html",
            r"(?i)&lt;/?(?:html|head|body|div|span|p|a|ul|li|script)\b|<!DOCTYPE",
        ),
        (
            "css",
            r"(?m)^\s*[.#]?[\w-]+\s*\{|\b(?:color|margin|padding|font-size|display)\s*:|@media\b",
        ),
        (
            "json",
            r#"(?:"|&quot;)[\w-]+(?:"|&quot;)\s*:"#,
        ),
        (
            "bash",
            r"(?m)^\s*(?:\$\s|sudo\s|apt(?:-get)?\s|npm\s|pip\s|cd\s|export\s|echo\s|mkdir\s|chmod\s|git\s)",
        ),
        (
            "sql",
            r"(?i)\bSELECT\s.+\sFROM\b|\bINSERT\s+INTO\b|\bUPDATE\s+\w+\s+SET\b|\bCREATE\s+TABLE\b|\bDELETE\s+FROM\b",
        ),
    ]
    .into_iter()
    .map(|(lang, pattern)| (lang, Regex::new(pattern).unwrap()))
    .collect()
});

/// Best matching language for a code sample, or `default` when nothing matches.
pub fn detect_language<'a>(code: &str, default: &'a str) -> &'a str {
    let mut best: Option<(&'static str, usize)> = None;
    for (lang, pattern) in SIGNATURES.iter() {
        let hits = pattern.find_iter(code).count();
        if hits > 0 && best.map_or(true, |(_, best_hits)| hits > best_hits) {
            best = Some((*lang, hits));
        }
    }
    best.map(|(lang, _)| lang).unwrap_or(default)
}

/// Add Prism-style language and line-number classes to `<pre><code>` blocks.
///
/// Blocks already marked `line-numbers` are left alone; an explicit
/// `language-*` class on the `<code>` element is kept.
pub fn enhance_code_blocks(html: &str, ctx: &EnhanceContext<'_>) -> AppResult<String> {
    let default = ctx
        .content_type
        .strategy()
        .default_languages
        .first()
        .copied()
        .unwrap_or("text");

    let enhanced = CODE_BLOCK_RE.replace_all(html, |caps: &Captures| {
        let pre_attrs = &caps[1];
        if pre_attrs.contains("line-numbers") {
            return caps[0].to_string();
        }

        let code = &caps[3];
        let language = LANGUAGE_CLASS_RE
            .captures(&caps[2])
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or_else(|| detect_language(code, default));

        format!(
            "<pre class=\"line-numbers language-{lang}\"><code class=\"language-{lang}\">{code}</code></pre>",
            lang = language,
            code = code
        )
    });

    Ok(enhanced.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ContentFeatures;
    use crate::strategy::ContentType;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("const x = () => 1;\nconsole.log(x);", "text"), "javascript");
        assert_eq!(detect_language("def main():\n    print(\"hi\")", "text"), "python");
        assert_eq!(detect_language("SELECT id FROM users", "text"), "sql");
        assert_eq!(detect_language("curl -X POST https://x/api -H 'A: b'", "text"), "curl");
        assert_eq!(detect_language("{&quot;id&quot;: 1}", "text"), "json");
        assert_eq!(detect_language("$ npm install\n$ cd app", "text"), "bash");
        assert_eq!(detect_language("plain words", "bash"), "bash");
    }

    #[test]
    fn test_rewrites_blocks() {
        let features = ContentFeatures::default();
        let ctx = EnhanceContext::new(ContentType::Tutorial, &features, "");
        let html = "<pre><code>def run():\n    print(1)</code></pre>\
                    <pre><code class=\"language-rust\">fn main() {}</code></pre>\
                    <pre class=\"line-numbers\"><code>untouched</code></pre>\
                    <pre><code>nothing to see</code></pre>";

        let enhanced = enhance_code_blocks(html, &ctx).unwrap();
        assert!(enhanced.contains(
            "<pre class=\"line-numbers language-python\"><code class=\"language-python\">def run():"
        ));
        assert!(enhanced.contains("<code class=\"language-rust\">fn main() {}</code>"));
        assert!(enhanced.contains("<pre class=\"line-numbers\"><code>untouched</code></pre>"));
        assert!(enhanced.contains("<code class=\"language-javascript\">nothing to see</code>"));
    }
}
