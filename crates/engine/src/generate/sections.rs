//! Splitting a document into article-sized sections.

use crate::analysis::structure::{find_headings, verbatim_ranges};
use crate::text::{strip_tags, word_count};
use docforge_core::{AppError, AppResult};
use regex::Regex;
use std::sync::LazyLock;

static PARAGRAPH_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\n[ \t]*\r?\n|</p\s*>").unwrap());

/// A contiguous slice of the source destined for one article.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: Option<String>,
    pub body: String,
}

impl Section {
    fn words(&self) -> usize {
        word_count(&strip_tags(&self.body))
    }
}

/// Split `content` into `target` sections.
///
/// Splits at heading boundaries, starting from the top heading level and
/// descending until there are enough boundaries. Text before the first
/// boundary joins the first section. Smallest adjacent pairs are merged while
/// there are too many sections; the largest sections are cut at paragraph
/// breaks while there are too few.
pub fn split_sections(content: &str, target: usize) -> AppResult<Vec<Section>> {
    if content.trim().is_empty() {
        return Err(AppError::Generation(
            "Cannot split empty content".to_string(),
        ));
    }
    let target = target.max(1);

    let mut sections = heading_sections(content, target);

    while sections.len() > target {
        merge_smallest_pair(&mut sections);
    }

    while sections.len() < target {
        if !split_largest(&mut sections) {
            break;
        }
    }

    sections.retain(|s| !s.body.trim().is_empty());
    if sections.is_empty() {
        return Err(AppError::Generation(
            "Section splitting produced no content".to_string(),
        ));
    }

    tracing::debug!(
        "Split content into {} sections (target {})",
        sections.len(),
        target
    );

    Ok(sections)
}

fn heading_sections(content: &str, target: usize) -> Vec<Section> {
    let headings = find_headings(content);
    if headings.is_empty() {
        return vec![Section {
            title: None,
            body: content.trim().to_string(),
        }];
    }

    // Shallowest level that yields enough boundaries, else every heading
    let mut levels: Vec<u8> = headings.iter().map(|h| h.level).collect();
    levels.sort_unstable();
    levels.dedup();
    let split_level = levels
        .iter()
        .copied()
        .find(|&level| headings.iter().filter(|h| h.level <= level).count() >= target)
        .unwrap_or(6);

    let boundaries: Vec<_> = headings.iter().filter(|h| h.level <= split_level).collect();

    let mut sections = Vec::with_capacity(boundaries.len());
    for (i, heading) in boundaries.iter().enumerate() {
        let start = if i == 0 { 0 } else { heading.offset };
        let end = boundaries
            .get(i + 1)
            .map(|next| next.offset)
            .unwrap_or(content.len());
        sections.push(Section {
            title: Some(heading.text.clone()),
            body: content[start..end].trim().to_string(),
        });
    }
    sections
}

fn merge_smallest_pair(sections: &mut Vec<Section>) {
    let Some(index) = (0..sections.len().saturating_sub(1))
        .min_by_key(|&i| sections[i].words() + sections[i + 1].words())
    else {
        return;
    };

    let next = sections.remove(index + 1);
    let current = &mut sections[index];
    current.body = format!("{}\n\n{}", current.body, next.body);
    if current.title.is_none() {
        current.title = next.title;
    }
}

/// Cut the largest splittable section in two at the paragraph break nearest
/// its middle. Returns false when nothing can be split.
fn split_largest(sections: &mut Vec<Section>) -> bool {
    let candidate = sections
        .iter()
        .enumerate()
        .filter_map(|(i, section)| {
            split_point(&section.body).map(|point| (i, point, section.words()))
        })
        .max_by_key(|&(_, _, words)| words);

    let Some((index, point, _)) = candidate else {
        return false;
    };

    let section = &mut sections[index];
    let tail = section.body[point..].trim().to_string();
    section.body = section.body[..point].trim().to_string();

    let title = section
        .title
        .as_ref()
        .map(|t| format!("{} (continued)", t));
    sections.insert(index + 1, Section { title, body: tail });
    true
}

/// Byte offset of the paragraph break closest to the middle of `body`, if
/// both halves would keep some text. Breaks inside code fences, `<pre>` and
/// tables are never used.
fn split_point(body: &str) -> Option<usize> {
    let middle = body.len() / 2;
    let verbatim = verbatim_ranges(body);
    PARAGRAPH_BREAK_RE
        .find_iter(body)
        .filter(|m| {
            !verbatim
                .iter()
                .any(|range| m.start() > range.start && m.start() < range.end)
        })
        .map(|m| m.end())
        .filter(|&end| {
            word_count(&strip_tags(&body[..end])) > 0 && word_count(&strip_tags(&body[end..])) > 0
        })
        .min_by_key(|&end| end.abs_diff(middle))
}
