//! Structural analysis of headings, lists, paragraphs and section balance.

use crate::text::{strip_tags, word_count};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::LazyLock;

static HTML_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]\s*>").unwrap());

static MD_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]{0,3}(#{1,6})[ \t]+(.+?)[ \t]*#*[ \t]*\r?$").unwrap()
});

static VERBATIM_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```.*?```|~~~.*?~~~|<pre\b.*?</pre\s*>|<table\b.*?</table\s*>").unwrap()
});

static HTML_OL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<ol\b").unwrap());
static HTML_UL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<ul\b").unwrap());
static HTML_LI_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<li\b").unwrap());
static HTML_LIST_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(/?)(?:ul|ol)\b").unwrap());

static MD_ORDERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\d+[.)][ \t]+\S").unwrap());
static MD_UNORDERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[-*+][ \t]+\S").unwrap());
static MD_NESTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]{2,}(?:\d+[.)]|[-*+])[ \t]+\S").unwrap());

static PARAGRAPH_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\n[ \t]*\r?\n|<p\b[^>]*>|</p\s*>").unwrap());

static PRE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<pre\b").unwrap());
static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*```").unwrap());
static CODE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<code\b").unwrap());
static PRE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<pre\b[^>]*>\s*<code\b").unwrap());
static BACKTICK_SPAN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`\n]+`").unwrap());

/// A heading found in the source, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingEntry {
    pub level: u8,
    pub text: String,
    pub word_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListAnalysis {
    pub ordered_count: usize,
    pub unordered_count: usize,
    pub nested_count: usize,
    pub total_items: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphAnalysis {
    pub total_paragraphs: usize,
    /// Average paragraph length in words
    pub average_paragraph_length: f64,
    pub code_block_count: usize,
    pub inline_code_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralCoherence {
    pub score: f64,
    pub hierarchy_score: f64,
    pub balance_score: f64,
    pub hierarchy_violations: usize,
    pub section_count: usize,
}

impl StructuralCoherence {
    /// Neutral-low coherence for content without headings.
    pub fn fallback() -> Self {
        Self {
            score: 0.3,
            hierarchy_score: 0.3,
            balance_score: 0.3,
            hierarchy_violations: 0,
            section_count: 1,
        }
    }
}

/// Structural summary of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralProfile {
    pub headings: Vec<HeadingEntry>,
    pub list_analysis: ListAnalysis,
    pub paragraph_analysis: ParagraphAnalysis,
    pub structural_coherence: StructuralCoherence,
    pub structural_complexity: f64,
}

impl StructuralProfile {
    pub fn heading_count(&self) -> usize {
        self.headings.len()
    }

    pub fn max_heading_level(&self) -> u8 {
        self.headings.iter().map(|h| h.level).max().unwrap_or(0)
    }
}

/// A heading with its byte offset in the source.
#[derive(Debug, Clone)]
pub(crate) struct HeadingMatch {
    pub offset: usize,
    pub level: u8,
    pub text: String,
}

/// Find HTML and Markdown headings in document order.
///
/// Markdown headings inside fenced or `<pre>` blocks are ignored.
pub(crate) fn find_headings(content: &str) -> Vec<HeadingMatch> {
    let mut found = Vec::new();

    for caps in HTML_HEADING_RE.captures_iter(content) {
        let (Some(whole), Some(level), Some(inner)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let text = strip_tags(inner.as_str());
        if text.is_empty() {
            continue;
        }
        found.push(HeadingMatch {
            offset: whole.start(),
            level: level.as_str().parse().unwrap_or(1),
            text,
        });
    }

    let masked = mask_verbatim_blocks(content);
    for caps in MD_HEADING_RE.captures_iter(&masked) {
        let (Some(whole), Some(hashes), Some(inner)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let text = strip_tags(inner.as_str());
        if text.is_empty() {
            continue;
        }
        found.push(HeadingMatch {
            offset: whole.start(),
            level: hashes.as_str().len() as u8,
            text,
        });
    }

    // Stable: equal offsets keep match order
    found.sort_by_key(|h| h.offset);
    found
}

/// Byte ranges of fenced, `<pre>` and `<table>` blocks.
pub(crate) fn verbatim_ranges(content: &str) -> Vec<Range<usize>> {
    VERBATIM_BLOCK_RE.find_iter(content).map(|m| m.range()).collect()
}

/// Blank out fenced, `<pre>` and `<table>` blocks while keeping byte offsets intact.
fn mask_verbatim_blocks(content: &str) -> String {
    let mut masked = String::with_capacity(content.len());
    let mut last = 0;

    for block in VERBATIM_BLOCK_RE.find_iter(content) {
        masked.push_str(&content[last..block.start()]);
        for ch in block.as_str().chars() {
            if ch == '\n' {
                masked.push('\n');
            } else {
                masked.push_str(&" ".repeat(ch.len_utf8()));
            }
        }
        last = block.end();
    }
    masked.push_str(&content[last..]);
    masked
}

/// Analyze document structure.
///
/// Pure and deterministic. Content without headings gets a fallback
/// coherence of 0.3 and a complexity of 0.5; list and paragraph analyses are
/// computed either way.
pub fn analyze_structure(content: &str) -> StructuralProfile {
    let heading_matches = find_headings(content);
    let headings: Vec<HeadingEntry> = heading_matches
        .iter()
        .map(|h| HeadingEntry {
            level: h.level,
            text: h.text.clone(),
            word_count: word_count(&h.text),
        })
        .collect();

    let list_analysis = analyze_lists(content);
    let paragraph_analysis = analyze_paragraphs(content);

    let (structural_coherence, structural_complexity) = if headings.is_empty() {
        (StructuralCoherence::fallback(), 0.5)
    } else {
        let coherence = compute_coherence(content, &heading_matches);
        let complexity = compute_complexity(&headings, &list_analysis);
        (coherence, complexity)
    };

    tracing::debug!(
        headings = headings.len(),
        coherence = structural_coherence.score,
        complexity = structural_complexity,
        "Structure analyzed"
    );

    StructuralProfile {
        headings,
        list_analysis,
        paragraph_analysis,
        structural_coherence,
        structural_complexity,
    }
}

fn analyze_lists(content: &str) -> ListAnalysis {
    let masked = mask_verbatim_blocks(content);

    let md_ordered = MD_ORDERED_RE.find_iter(&masked).count();
    let md_unordered = MD_UNORDERED_RE.find_iter(&masked).count();
    let md_nested = MD_NESTED_RE.find_iter(&masked).count();

    // Nested HTML lists are list open tags seen while another list is open
    let mut depth = 0usize;
    let mut html_nested = 0usize;
    for caps in HTML_LIST_TAG_RE.captures_iter(content) {
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        if closing {
            depth = depth.saturating_sub(1);
        } else {
            if depth > 0 {
                html_nested += 1;
            }
            depth += 1;
        }
    }

    ListAnalysis {
        ordered_count: HTML_OL_RE.find_iter(content).count() + md_ordered,
        unordered_count: HTML_UL_RE.find_iter(content).count() + md_unordered,
        nested_count: html_nested + md_nested,
        total_items: HTML_LI_RE.find_iter(content).count() + md_ordered + md_unordered,
    }
}

fn analyze_paragraphs(content: &str) -> ParagraphAnalysis {
    let paragraph_words: Vec<usize> = PARAGRAPH_SPLIT_RE
        .split(content)
        .map(|piece| word_count(&strip_tags(piece)))
        .filter(|&words| words > 0)
        .collect();

    let total_paragraphs = paragraph_words.len();
    let average_paragraph_length = if total_paragraphs == 0 {
        0.0
    } else {
        paragraph_words.iter().sum::<usize>() as f64 / total_paragraphs as f64
    };

    let fences = FENCE_RE.find_iter(content).count();
    let code_block_count = PRE_RE.find_iter(content).count() + fences / 2;

    let code_tags = CODE_TAG_RE.find_iter(content).count();
    let code_in_pre = PRE_CODE_RE.find_iter(content).count();
    let backtick_spans = BACKTICK_SPAN_RE
        .find_iter(&mask_verbatim_blocks(content))
        .count();

    ParagraphAnalysis {
        total_paragraphs,
        average_paragraph_length,
        code_block_count,
        inline_code_count: code_tags.saturating_sub(code_in_pre) + backtick_spans,
    }
}

fn compute_coherence(content: &str, headings: &[HeadingMatch]) -> StructuralCoherence {
    // 1. Hierarchy: forward jumps of more than one level
    let hierarchy_violations = headings
        .windows(2)
        .filter(|pair| pair[1].level > pair[0].level + 1)
        .count();
    let hierarchy_score =
        (1.0 - hierarchy_violations as f64 / headings.len().max(1) as f64).max(0.0);

    // 2. Balance: spread of section lengths between headings
    let mut section_words = Vec::with_capacity(headings.len() + 1);
    let preamble = word_count(&strip_tags(&content[..headings[0].offset]));
    if preamble > 0 {
        section_words.push(preamble);
    }
    for (i, heading) in headings.iter().enumerate() {
        let end = headings
            .get(i + 1)
            .map(|next| next.offset)
            .unwrap_or(content.len());
        section_words.push(word_count(&strip_tags(&content[heading.offset..end])));
    }

    let variance = relative_spread(&section_words);
    let balance_score = (1.0 - (variance / 10.0).min(1.0)).max(0.0);

    StructuralCoherence {
        score: ((hierarchy_score + balance_score) / 2.0).clamp(0.0, 1.0),
        hierarchy_score,
        balance_score,
        hierarchy_violations,
        section_count: section_words.len(),
    }
}

/// `(max - min) / mean`, or 0 for empty or all-zero input.
fn relative_spread(values: &[usize]) -> f64 {
    let (Some(&max), Some(&min)) = (values.iter().max(), values.iter().min()) else {
        return 0.0;
    };
    let mean = values.iter().sum::<usize>() as f64 / values.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    (max - min) as f64 / mean
}

fn compute_complexity(headings: &[HeadingEntry], lists: &ListAnalysis) -> f64 {
    let max_level = headings.iter().map(|h| h.level).max().unwrap_or(0);

    let complexity = 0.3 * (headings.len() as f64 / 10.0).min(1.0)
        + 0.2 * (max_level as f64 / 6.0).min(1.0)
        + 0.3 * (lists.total_items as f64 / 20.0).min(1.0)
        + 0.2 * (lists.nested_count as f64 / 5.0).min(1.0);

    complexity.clamp(0.0, 1.0)
}
