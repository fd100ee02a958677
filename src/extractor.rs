//! Code extraction from free-form model output
//!
//! Text in, code out. Everything the model says around the first fenced
//! block is discarded.

use crate::log_debug;
use crate::types::Language;

/// Slugs longer than this are cut to keep file names manageable
pub const MAX_SLUG_LEN: usize = 50;

const FALLBACK_SLUG: &str = "scenario";

/// Reasons a response yields no usable code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("response contains no fenced code block")]
    NoCodeBlock,
    #[error("code block opened on line {line} is never closed")]
    Unterminated { line: usize },
    #[error("first code block is empty")]
    EmptyBlock,
}

/// A fenced region located in a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Info string after the opening fence, if any
    pub info: Option<String>,
    pub body: String,
}

/// Code recovered for one scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCode {
    pub code: String,
    pub file_name: String,
    /// Language tag the model put on the fence
    pub reported_language: Option<String>,
}

/// Recovers test code and a file name from a model response
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeExtractor;

impl CodeExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(
        &self,
        response: &str,
        scenario: &str,
        language: Language,
    ) -> Result<ExtractedCode, ExtractionError> {
        let block = find_code_block(response)?;
        if let Some(info) = block.info.as_deref()
            && !info.eq_ignore_ascii_case(language.fence_tag())
        {
            log_debug!(
                "Code block tagged '{}' while {} was requested",
                info,
                language.fence_tag()
            );
        }

        Ok(ExtractedCode {
            code: block.body,
            file_name: file_name(scenario, language),
            reported_language: block.info,
        })
    }
}

struct Fence<'a> {
    marker: char,
    len: usize,
    indent: usize,
    rest: &'a str,
}

fn parse_fence(line: &str) -> Option<Fence<'_>> {
    let trimmed = line.trim_start();
    let indent = line.len() - trimmed.len();
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    if len < 3 {
        return None;
    }
    // Markers are single-byte, so `len` is also a byte offset
    let rest = trimmed[len..].trim();
    Some(Fence {
        marker,
        len,
        indent,
        rest,
    })
}

/// Locate the first fenced code block in `text`
pub fn find_code_block(text: &str) -> Result<CodeBlock, ExtractionError> {
    let lines: Vec<&str> = text.lines().collect();

    let Some((open_idx, open)) = lines.iter().enumerate().find_map(|(idx, line)| {
        parse_fence(line)
            // Backtick info strings may not contain backticks, which rules out inline ```code```
            .filter(|fence| !(fence.marker == '`' && fence.rest.contains('`')))
            .map(|fence| (idx, fence))
    }) else {
        return Err(ExtractionError::NoCodeBlock);
    };

    let close_offset = lines
        .iter()
        .skip(open_idx + 1)
        .position(|line| {
            parse_fence(line).is_some_and(|fence| {
                fence.marker == open.marker && fence.len >= open.len && fence.rest.is_empty()
            })
        })
        .ok_or(ExtractionError::Unterminated { line: open_idx + 1 })?;

    let body = lines
        .iter()
        .skip(open_idx + 1)
        .take(close_offset)
        .map(|line| strip_indent(line, open.indent))
        .collect::<Vec<_>>()
        .join("\n");

    if body.trim().is_empty() {
        return Err(ExtractionError::EmptyBlock);
    }

    let info = open
        .rest
        .split_whitespace()
        .next()
        .map(ToString::to_string);

    Ok(CodeBlock { info, body })
}

/// Remove up to `indent` leading spaces, matching a fence nested in a list
fn strip_indent(line: &str, indent: usize) -> &str {
    let leading = line.len() - line.trim_start_matches(' ').len();
    &line[leading.min(indent)..]
}

/// Lower-case ASCII slug with runs of anything else collapsed to `_`
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len().min(MAX_SLUG_LEN));
    let mut pending_separator = false;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// `test_<slug>`, the derived name of a generated test
pub fn test_name(scenario: &str) -> String {
    format!("test_{}", slugify(scenario))
}

/// `test_<slug><ext>`
pub fn file_name(scenario: &str, language: Language) -> String {
    format!("{}{}", test_name(scenario), language.extension())
}
