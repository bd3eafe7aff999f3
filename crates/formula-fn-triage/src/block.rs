//! Balanced-delimiter span extraction over raw source text.
//!
//! Fixture records and registration literals nest arbitrarily, so a single
//! regex cannot delimit them. Spans are recovered by explicit depth counting
//! instead: from an opening delimiter, walk forward (+1 on open, -1 on close)
//! until the depth returns to zero. Forward scans skip quoted string content
//! so a brace inside a string literal never skews the count.

use thiserror::Error;

/// Delimiter pair a span is balanced over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delims {
    pub open: u8,
    pub close: u8,
}

/// `{ ... }` — fixture records and `expectedValues` sub-blocks.
pub const BRACES: Delims = Delims {
    open: b'{',
    close: b'}',
};

/// `[ ... ]` — the function registration collection literal.
pub const BRACKETS: Delims = Delims {
    open: b'[',
    close: b']',
};

/// Half-open byte range `[start, end)` over the scanned text.
///
/// Invariant: the range starts at an opening delimiter and ends one past its
/// matching close, so open and close counts inside the span are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockSpan {
    pub start: usize,
    pub end: usize,
}

impl BlockSpan {
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("offset {offset} does not point at `{expected}`")]
    NotAnOpeningDelimiter { offset: usize, expected: char },
    #[error("no enclosing `{open}` found before offset {hint}")]
    NoOpeningDelimiter { hint: usize, open: char },
    #[error("block opened at offset {open_at} is never closed")]
    Unterminated { open_at: usize },
}

/// Returns the balanced span of the block whose opening delimiter sits at
/// `open_at`.
///
/// The scan is string-aware: content between `'`, `"` or backtick quotes is
/// skipped, honoring backslash escapes, so delimiters inside fixture strings
/// do not participate in the depth count.
pub fn forward_span(text: &str, open_at: usize, delims: Delims) -> Result<BlockSpan, BlockError> {
    let bytes = text.as_bytes();
    if bytes.get(open_at) != Some(&delims.open) {
        return Err(BlockError::NotAnOpeningDelimiter {
            offset: open_at,
            expected: char::from(delims.open),
        });
    }

    let mut depth = 0usize;
    let mut i = open_at;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\'' || b == b'"' || b == b'`' {
            i = skip_string(bytes, i);
            continue;
        }
        if b == delims.open {
            depth += 1;
        } else if b == delims.close {
            depth -= 1;
            if depth == 0 {
                return Ok(BlockSpan {
                    start: open_at,
                    end: i + 1,
                });
            }
        }
        i += 1;
    }

    Err(BlockError::Unterminated { open_at })
}

/// Returns the balanced span of the innermost block enclosing `hint`.
///
/// Scans backward from the hint, matching close delimiters against opens,
/// until an unmatched opening delimiter is found; the forward scan from there
/// produces the span. The backward pass counts delimiters only (it cannot
/// know whether it is inside a string), so the hint must not be preceded by a
/// brace-bearing string literal within the same block. Fixture records open
/// with their `name:` field, which satisfies that.
pub fn enclosing_span(text: &str, hint: usize, delims: Delims) -> Result<BlockSpan, BlockError> {
    let bytes = text.as_bytes();
    let limit = hint.min(bytes.len());

    let mut unmatched_closes = 0usize;
    for i in (0..limit).rev() {
        let b = bytes[i];
        if b == delims.close {
            unmatched_closes += 1;
        } else if b == delims.open {
            if unmatched_closes == 0 {
                return forward_span(text, i, delims);
            }
            unmatched_closes -= 1;
        }
    }

    Err(BlockError::NoOpeningDelimiter {
        hint,
        open: char::from(delims.open),
    })
}

/// Advances past a quoted string starting at `start` (which must point at the
/// quote character). Returns the offset one past the closing quote, or the
/// text length if the string is unterminated.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}
