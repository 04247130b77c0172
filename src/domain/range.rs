// Text ranges and the containment test used for scope inference.

/// An inclusive byte range `[start, end]` of source text, typically the
/// opening and closing brace of a function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Index of the smallest range containing `offset`.
pub fn innermost_containing<'a, I>(ranges: I, offset: usize) -> Option<usize>
where
    I: IntoIterator<Item = &'a TextRange>,
{
    ranges
        .into_iter()
        .enumerate()
        .filter(|(_, range)| range.contains(offset))
        .min_by_key(|(_, range)| range.len())
        .map(|(i, _)| i)
}
