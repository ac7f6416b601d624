use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use aho_corasick::{AhoCorasick, MatchKind};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::skills::vocabulary::{SkillVocabulary, VocabularyEntry};

/// Characters of context kept on each side of a match.
pub const SNIPPET_RADIUS: usize = 60;

const PAGE_BREAK: char = '\x0c';

/// Schemeless links such as `github.com/jane/rust-tools`.
static DOMAIN_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9-]+(\.[a-z0-9-]+)*\.(com|io|org|net|dev|app|ai|co)(/|$)").unwrap()
});

/// Words that mark a snippet as talking about skills. Needed to accept short or ambiguous aliases.
const CONTEXT_KEYWORDS: &[&str] = &[
    "experience",
    "experiences",
    "skill",
    "skills",
    "skilled",
    "proficient",
    "proficiency",
    "knowledge",
    "familiar",
    "familiarity",
    "using",
    "use",
    "utilized",
    "utilised",
    "expertise",
    "certified",
    "tools",
    "technologies",
    "technology",
    "framework",
    "frameworks",
    "stack",
    "worked",
    "hands-on",
    "hands on",
    "background",
    "projects",
    "responsible for",
    "competency",
    "competencies",
];

/// Bullet markers that start a list line.
const LIST_SYMBOLS: &[&str] = &["•", "·", "-", "*"];

/// One occurrence of a vocabulary skill in a text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSpan {
    /// Byte offset of the match.
    pub offset: usize,
    pub end: usize,
    /// The text as written, e.g. "k8s" for Kubernetes.
    pub matched_text: String,
    /// Whitespace-collapsed window around the match.
    pub snippet: String,
    /// 1-based, counted within the page.
    pub line_number: u32,
    /// 1-based; pages are separated by form feeds.
    pub page_number: u32,
}

#[derive(Debug, Clone, Copy)]
struct Pattern {
    entry: usize,
    phrase: &'static str,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    pattern: usize,
}

/// Finds vocabulary skills in free text with a single multi-pattern pass.
#[derive(Debug, Clone)]
pub struct SkillDetector {
    vocabulary: Arc<SkillVocabulary>,
    matcher: AhoCorasick,
    patterns: Vec<Pattern>,
}

impl SkillDetector {
    pub fn new(vocabulary: Arc<SkillVocabulary>) -> Result<Self, aho_corasick::BuildError> {
        let patterns: Vec<Pattern> = vocabulary
            .entries()
            .iter()
            .enumerate()
            .flat_map(|(entry, e)| e.phrases().map(move |phrase| Pattern { entry, phrase }))
            .collect();

        // Standard semantics so overlapping candidates can be filtered before choosing the longest
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(patterns.iter().map(|p| p.phrase))?;

        Ok(Self {
            vocabulary,
            matcher,
            patterns,
        })
    }

    /// Maps canonical skill name to its occurrences, ordered by offset.
    /// Skills without an accepted occurrence are absent.
    pub fn detect(&self, text: &str) -> BTreeMap<String, Vec<RawSpan>> {
        let mut found: BTreeMap<String, Vec<RawSpan>> = BTreeMap::new();
        if text.trim().is_empty() {
            return found;
        }

        let layout = TextLayout::new(text);

        let candidates: Vec<Candidate> = self
            .matcher
            .find_overlapping_iter(text)
            .map(|m| Candidate {
                start: m.start(),
                end: m.end(),
                pattern: m.pattern().as_usize(),
            })
            .filter(|c| on_word_boundary(text, c.start, c.end))
            .filter(|c| !inside_link(text, c.start, c.end))
            .filter(|c| self.context_allows(text, c))
            .collect();

        let mut seen_offsets: HashSet<(usize, usize)> = HashSet::new();
        for candidate in longest_non_overlapping(candidates) {
            let pattern = self.patterns[candidate.pattern];
            if !seen_offsets.insert((pattern.entry, candidate.start)) {
                continue;
            }
            let entry = &self.vocabulary.entries()[pattern.entry];
            let (line_number, page_number) = layout.position(candidate.start);
            found.entry(entry.name.to_string()).or_default().push(RawSpan {
                offset: candidate.start,
                end: candidate.end,
                matched_text: text[candidate.start..candidate.end].to_string(),
                snippet: snippet_around(text, candidate.start, candidate.end, SNIPPET_RADIUS),
                line_number,
                page_number,
            });
        }

        found
    }

    fn context_allows(&self, text: &str, candidate: &Candidate) -> bool {
        let pattern = self.patterns[candidate.pattern];
        let entry: &VocabularyEntry = &self.vocabulary.entries()[pattern.entry];
        if !entry.requires_context(pattern.phrase) {
            return true;
        }
        let window = snippet_around(text, candidate.start, candidate.end, SNIPPET_RADIUS);
        has_skill_context(&window) || starts_list_line(text, candidate.start)
    }
}

/// Keeps the longest candidates, dropping any that overlap an already kept span. Output is ordered by start.
fn longest_non_overlapping(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        (b.end - b.start)
            .cmp(&(a.end - a.start))
            .then(a.start.cmp(&b.start))
    });

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        let overlaps = kept
            .iter()
            .any(|k| candidate.start < k.end && k.start < candidate.end);
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept.sort_by_key(|c| c.start);
    kept
}

fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

/// True when the whitespace-delimited token holding the match is a URL, a bare domain
/// or an e-mail address.
fn inside_link(text: &str, start: usize, end: usize) -> bool {
    // Whitespace may be multi-byte (NBSP, ideographic space)
    let token_start = text[..start]
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let token_end = text[end..]
        .find(char::is_whitespace)
        .map(|i| end + i)
        .unwrap_or(text.len());
    let token = text[token_start..token_end].to_lowercase();
    let token = token.trim_matches(|c: char| {
        matches!(c, '(' | ')' | '[' | ']' | '<' | '>' | '"' | '\'' | ',' | ';' | '.')
    });
    token.contains("://")
        || token.starts_with("www.")
        || token.contains('@')
        || DOMAIN_TOKEN.is_match(token)
}

fn has_skill_context(snippet: &str) -> bool {
    let lower = snippet.to_lowercase();
    let words: HashSet<&str> = lower
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|w| !w.is_empty())
        .collect();
    CONTEXT_KEYWORDS.iter().any(|kw| {
        if kw.contains(' ') {
            lower.contains(kw)
        } else {
            words.contains(kw)
        }
    })
}

fn starts_list_line(text: &str, offset: usize) -> bool {
    let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line = text[line_start..offset].trim_start();
    LIST_SYMBOLS.iter().any(|s| line.starts_with(s))
}

/// Window of `radius` bytes either side of `[start, end)`, widened to char boundaries.
pub fn snippet_around(text: &str, start: usize, end: usize, radius: usize) -> String {
    let mut from = start.saturating_sub(radius);
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + radius).min(text.len());
    while !text.is_char_boundary(to) {
        to += 1;
    }
    text[from..to].split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte offsets of line and page breaks, for offset → (line, page) lookups.
struct TextLayout {
    newlines: Vec<usize>,
    page_breaks: Vec<usize>,
}

impl TextLayout {
    fn new(text: &str) -> Self {
        let mut newlines = Vec::new();
        let mut page_breaks = Vec::new();
        for (i, c) in text.char_indices() {
            match c {
                '\n' => newlines.push(i),
                PAGE_BREAK => page_breaks.push(i),
                _ => {}
            }
        }
        Self {
            newlines,
            page_breaks,
        }
    }

    fn position(&self, offset: usize) -> (u32, u32) {
        let pages_before = self.page_breaks.partition_point(|&b| b < offset);
        let page_start = if pages_before == 0 {
            0
        } else {
            self.page_breaks[pages_before - 1] + 1
        };
        let lines_before = self.newlines.partition_point(|&n| n < offset)
            - self.newlines.partition_point(|&n| n < page_start);
        (lines_before as u32 + 1, pages_before as u32 + 1)
    }
}
