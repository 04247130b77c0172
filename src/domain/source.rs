// Immutable view of submitted source text.
//
// Shape matchers run over `masked`, a copy in which comments, string and
// character literals and preprocessor lines are blanked to spaces. The
// masked copy has the same byte length and the same newlines as the
// original, so every offset found in it is valid in the original too.

use std::ops::Range;

use crate::domain::locator::locate;
use crate::domain::node::Location;

pub struct SourceText<'a> {
    original: &'a str,
    masked: String,
}

impl<'a> SourceText<'a> {
    pub fn new(original: &'a str) -> Self {
        Self {
            original,
            masked: mask(original),
        }
    }

    pub fn original(&self) -> &'a str {
        self.original
    }

    pub fn masked(&self) -> &str {
        &self.masked
    }

    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    pub fn locate(&self, offset: usize) -> Location {
        locate(self.original, offset)
    }

    /// Narrow `range` so it neither starts nor ends on masked whitespace.
    pub fn trimmed(&self, range: Range<usize>) -> Range<usize> {
        let bytes = self.masked.as_bytes();
        let mut start = range.start;
        let mut end = range.end.min(bytes.len());
        while start < end && bytes[start].is_ascii_whitespace() {
            start += 1;
        }
        while end > start && bytes[end - 1].is_ascii_whitespace() {
            end -= 1;
        }
        start..end
    }

    /// Verbatim original text of `range`, trimmed. `None` when blank.
    pub fn fragment(&self, range: Range<usize>) -> Option<String> {
        let range = self.trimmed(range);
        if range.is_empty() {
            None
        } else {
            Some(self.original[range].to_string())
        }
    }

    /// Masked text of `range`, trimmed. Used for identifiers and types,
    /// where comments must not leak into the result.
    pub fn masked_fragment(&self, range: Range<usize>) -> &str {
        let range = self.trimmed(range);
        &self.masked[range]
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    Literal(char),
    Directive,
}

/// Blank comments, literals and preprocessor lines, keeping byte length.
fn mask(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut state = State::Code;
    let mut at_line_start = true;
    let mut chars = source.chars().peekable();

    fn blank(out: &mut String, c: char) {
        if c == '\n' {
            out.push('\n');
        } else {
            out.extend(std::iter::repeat(' ').take(c.len_utf8()));
        }
    }

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    state = State::LineComment;
                    blank(&mut out, c);
                }
                '/' if chars.peek() == Some(&'*') => {
                    state = State::BlockComment;
                    blank(&mut out, c);
                    if let Some(star) = chars.next() {
                        blank(&mut out, star);
                    }
                }
                '"' | '\'' | '`' => {
                    state = State::Literal(c);
                    out.push(c);
                }
                '#' if at_line_start => {
                    state = State::Directive;
                    blank(&mut out, c);
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                }
                blank(&mut out, c);
            }
            State::BlockComment => {
                blank(&mut out, c);
                if c == '*' && chars.peek() == Some(&'/') {
                    if let Some(slash) = chars.next() {
                        blank(&mut out, slash);
                    }
                    state = State::Code;
                }
            }
            State::Literal(quote) => {
                if c == quote {
                    out.push(c);
                    state = State::Code;
                } else if c == '\\' {
                    blank(&mut out, c);
                    if let Some(escaped) = chars.next() {
                        blank(&mut out, escaped);
                    }
                } else if c == '\n' && quote != '`' {
                    // Unclosed literal ends with the line.
                    out.push('\n');
                    state = State::Code;
                } else {
                    blank(&mut out, c);
                }
            }
            State::Directive => {
                if c == '\\' && chars.peek() == Some(&'\n') {
                    blank(&mut out, c);
                    if let Some(newline) = chars.next() {
                        blank(&mut out, newline);
                    }
                    continue;
                }
                if c == '\n' {
                    state = State::Code;
                }
                blank(&mut out, c);
            }
        }

        if c == '\n' {
            at_line_start = true;
        } else if !c.is_whitespace() {
            at_line_start = false;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_keeps_length_and_newlines() {
        let src = "#include <stdio.h>\nint x; // note {\n/* { */ char *s = \"a;b{\";\n";
        let masked = mask(src);
        assert_eq!(masked.len(), src.len());
        assert_eq!(masked.matches('\n').count(), src.matches('\n').count());
        assert!(!masked.contains('{'));
        assert!(!masked.contains("include"));
        assert!(masked.contains("int x;"));
        assert!(masked.contains("char *s = \"    \";"));
    }

    #[test]
    fn test_mask_escapes_and_multibyte() {
        let src = "s = \"\\\"é}\"; c = '}';";
        let masked = mask(src);
        assert_eq!(masked.len(), src.len());
        assert!(!masked.contains('}'));
    }

    #[test]
    fn test_directive_continuation() {
        let src = "#define MAX(a, b) \\\n  ((a) > (b))\nint y;";
        let masked = mask(src);
        assert!(!masked.contains("MAX"));
        assert!(!masked.contains('>'));
        assert!(masked.ends_with("int y;"));
    }

    #[test]
    fn test_fragment_uses_original_text() {
        let src = SourceText::new("f(\"hi\",  x );");
        assert_eq!(src.fragment(2..6).as_deref(), Some("\"hi\""));
        assert_eq!(src.fragment(7..11).as_deref(), Some("x"));
        assert_eq!(src.fragment(11..11), None);
    }
}
