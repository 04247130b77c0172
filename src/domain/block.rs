// Delimiter matching and statement boundaries.
// All functions work on masked text (see `source`), so delimiters inside
// comments and literals never count.

use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("offset {0} is not an opening delimiter")]
    NotADelimiter(usize),
    #[error("delimiter opened at offset {0} is never closed")]
    Unterminated(usize),
}

fn closing_for(open: u8) -> Option<u8> {
    match open {
        b'{' => Some(b'}'),
        b'(' => Some(b')'),
        b'[' => Some(b']'),
        _ => None,
    }
}

/// Return the offset of the delimiter closing the one at `open`.
///
/// Nested delimiters of the same kind are depth counted. Reaching the end
/// of `text` with depth still positive yields `BlockError::Unterminated`.
pub fn extract_block(text: &str, open: usize) -> Result<usize, BlockError> {
    let bytes = text.as_bytes();
    let opener = *bytes.get(open).ok_or(BlockError::NotADelimiter(open))?;
    let closer = closing_for(opener).ok_or(BlockError::NotADelimiter(open))?;

    let mut depth = 1usize;
    for (i, &b) in bytes.iter().enumerate().skip(open + 1) {
        if b == opener {
            depth += 1;
        } else if b == closer {
            depth -= 1;
            if depth == 0 {
                return Ok(i);
            }
        }
    }
    Err(BlockError::Unterminated(open))
}

/// Which statement starts `statement_starts` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundaries {
    /// Only starts at brace depth 0 of the text.
    TopLevel,
    /// Starts at any brace depth.
    Nested,
    /// Like `TopLevel`, and every line start at depth 0 also begins a
    /// statement (for languages with optional semicolons).
    TopLevelLines,
}

/// Offsets where a statement may begin: the start of `text` and every
/// position after `;`, `{` or `}` outside parentheses and brackets.
/// Leading whitespace is skipped, so each offset points at a
/// non-whitespace byte. The result is sorted and deduplicated.
pub fn statement_starts(text: &str, boundaries: Boundaries) -> Vec<usize> {
    let bytes = text.as_bytes();
    let nested = boundaries == Boundaries::Nested;
    let mut raw = vec![0];
    let mut braces = 0usize;
    let mut parens = 0usize;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' => parens += 1,
            b')' | b']' => parens = parens.saturating_sub(1),
            b'{' => {
                if parens == 0 && nested {
                    raw.push(i + 1);
                }
                braces += 1;
            }
            b'}' => {
                braces = braces.saturating_sub(1);
                if parens == 0 && (nested || braces == 0) {
                    raw.push(i + 1);
                }
            }
            b';' if parens == 0 && (nested || braces == 0) => raw.push(i + 1),
            b'\n' if boundaries == Boundaries::TopLevelLines && parens == 0 && braces == 0 => {
                raw.push(i + 1)
            }
            _ => {}
        }
    }

    let mut starts: Vec<usize> = raw
        .into_iter()
        .filter_map(|start| skip_whitespace(text, start))
        .collect();
    starts.dedup();
    starts
}

/// First non-whitespace offset at or after `from`, if any.
pub fn skip_whitespace(text: &str, from: usize) -> Option<usize> {
    text.as_bytes()
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, b)| !b.is_ascii_whitespace())
        .map(|(i, _)| i)
}

/// Split `range` of `text` on `separator` occurring outside any
/// parentheses, brackets or braces. Pieces are returned untrimmed and may
/// be empty.
pub fn split_top_level(text: &str, range: Range<usize>, separator: u8) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut piece_start = range.start;

    for i in range.clone() {
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b if b == separator && depth == 0 => {
                pieces.push(piece_start..i);
                piece_start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(piece_start..range.end);
    pieces
}

/// Offset of the first `terminator` at depth 0 in `text[from..limit]`.
pub fn find_top_level(text: &str, from: usize, limit: usize, terminator: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().take(limit).skip(from) {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
            }
            b if b == terminator && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}
