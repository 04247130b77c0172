// Offset -> (line, column) conversion shared by every pass.

use crate::domain::node::Location;

/// Convert a byte offset into a 1-based line and a 0-based column.
///
/// The line is one plus the number of newlines before `offset`; the column
/// is the number of characters between the previous newline (or the start
/// of the text) and `offset`. Offsets past the end are clamped.
pub fn locate(source: &str, offset: usize) -> Location {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }

    let before = &source[..offset];
    let line = 1 + before.bytes().filter(|&b| b == b'\n').count();
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count();

    Location { line, column }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line() {
        assert_eq!(locate("int x;", 4), Location { line: 1, column: 4 });
        assert_eq!(locate("int x;", 0), Location { line: 1, column: 0 });
    }

    #[test]
    fn test_after_newlines() {
        let src = "int a;\n\n  int b;";
        assert_eq!(locate(src, 10), Location { line: 3, column: 2 });
        // Offset of the newline itself still belongs to the line it ends.
        assert_eq!(locate(src, 6), Location { line: 1, column: 6 });
    }

    #[test]
    fn test_line_matches_newline_count() {
        let src = "a\nbb\n\nccc\n";
        for offset in 0..=src.len() {
            let expected = 1 + src[..offset].matches('\n').count();
            assert_eq!(locate(src, offset).line, expected);
        }
    }

    #[test]
    fn test_clamps_out_of_range_and_counts_chars() {
        assert_eq!(locate("ab", 99), Location { line: 1, column: 2 });
        // 'é' is two bytes but one column.
        assert_eq!(locate("é x", 3), Location { line: 1, column: 2 });
    }
}
