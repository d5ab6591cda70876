//! Offset to line/column mapping
//!
//! Columns are counted in characters, lines and columns are both 1-based.

/// Maps a byte offset in `text` to a 1-based `(line, column)` pair.
///
/// Offsets past the end of the text clamp to the end; offsets that fall inside
/// a multi-byte character resolve to that character.
pub fn index_to_line_col(text: &str, index: usize) -> (usize, usize) {
    let index = floor_char_boundary(text, index.min(text.len()));
    let before = &text[..index];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |nl| nl + 1);
    let column = text[line_start..index].chars().count() + 1;
    (line, column)
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Precomputed line starts for repeated lookups over the same text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 1-based line containing `index`.
    pub fn line_of(&self, index: usize) -> usize {
        match self.line_starts.binary_search(&index) {
            Ok(line) => line + 1,
            Err(next) => next,
        }
    }

    pub fn line_col(&self, text: &str, index: usize) -> (usize, usize) {
        let index = floor_char_boundary(text, index.min(text.len()));
        let line = self.line_of(index);
        let start = self.line_starts[line - 1];
        (line, text[start..index].chars().count() + 1)
    }
}
