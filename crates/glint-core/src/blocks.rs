//! Embedded `<script>` / `<style>` extraction from template files
//!
//! Blocks keep outer-file coordinates: the text of a block starts at the
//! beginning of the line holding the opening tag's `>`, with everything up to
//! and including that `>` blanked, so line `i` of the block is outer line
//! `start_line + i` and columns on every line match the outer file.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// An extracted region. `end_line` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub text: String,
    pub start_line: usize,
    pub end_line: usize,
}

impl CodeBlock {
    pub fn contains_line(&self, line: usize) -> bool {
        (self.start_line..self.end_line).contains(&line)
    }

    pub fn line_range(&self) -> Range<usize> {
        self.start_line..self.end_line
    }
}

/// Byte layout of one block inside the outer text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    /// Interior between the opening tag's `>` and the closing tag.
    pub body: Range<usize>,
    /// End of the closing tag, or end of text for an unclosed block.
    pub close_end: usize,
}

pub struct BlockExtractor {
    open: Regex,
    close: Regex,
}

static SCRIPT: LazyLock<BlockExtractor> =
    LazyLock::new(|| BlockExtractor::new("script").expect("Invalid script tag pattern"));
static STYLE: LazyLock<BlockExtractor> =
    LazyLock::new(|| BlockExtractor::new("style").expect("Invalid style tag pattern"));

impl BlockExtractor {
    pub fn new(tag: &str) -> Result<Self, regex::Error> {
        let tag = regex::escape(tag);
        Ok(Self {
            open: Regex::new(&format!(r"(?i)<{tag}(?:\s[^>]*)?>"))?,
            close: Regex::new(&format!(r"(?i)</{tag}\s*>"))?,
        })
    }

    /// Finds every non-overlapping block. An unclosed block runs to the end of
    /// the text; a self-closing tag has no body and is skipped.
    pub fn spans(&self, text: &str) -> Vec<BlockSpan> {
        let mut spans = Vec::new();
        let mut pos = 0;

        while let Some(open) = self.open.find_at(text, pos) {
            if open.as_str().ends_with("/>") {
                pos = open.end();
                continue;
            }

            let body_start = open.end();
            let (body_end, close_end) = match self.close.find_at(text, body_start) {
                Some(close) => (close.start(), close.end()),
                None => (text.len(), text.len()),
            };

            spans.push(BlockSpan {
                body: body_start..body_end,
                close_end,
            });
            pos = close_end;
        }

        spans
    }

    pub fn extract(&self, text: &str) -> Vec<CodeBlock> {
        self.spans(text)
            .into_iter()
            .map(|span| block_from_span(text, &span))
            .collect()
    }
}

fn block_from_span(text: &str, span: &BlockSpan) -> CodeBlock {
    let body_start = span.body.start;
    let line_start = text[..body_start].rfind('\n').map_or(0, |nl| nl + 1);

    let mut block_text = " ".repeat(text[line_start..body_start].chars().count());
    block_text.push_str(&text[span.body.clone()]);

    let start_line = text[..body_start].matches('\n').count();
    let end_line = text[..span.close_end].matches('\n').count() + 1;

    CodeBlock {
        text: block_text,
        start_line,
        end_line,
    }
}

/// Extracts every `<tag> ... </tag>` region of `text`.
pub fn extract_blocks(text: &str, tag: &str) -> Vec<CodeBlock> {
    match tag {
        "script" => SCRIPT.extract(text),
        "style" => STYLE.extract(text),
        other => BlockExtractor::new(other)
            .map(|extractor| extractor.extract(text))
            .unwrap_or_default(),
    }
}

/// Blanks the interior of every span, one space per character, keeping
/// newlines so line and column numbers hold.
pub fn mask_spans(text: &str, spans: &[BlockSpan]) -> String {
    let mut masked = String::with_capacity(text.len());
    let mut pos = 0;

    for span in spans {
        masked.push_str(&text[pos..span.body.start]);
        masked.extend(
            text[span.body.clone()]
                .chars()
                .map(|c| if c == '\n' { '\n' } else { ' ' }),
        );
        pos = span.body.end;
    }
    masked.push_str(&text[pos..]);

    masked
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Script,
    Style,
}

/// Script and style spans of a component file in text order.
///
/// A tag that starts inside an earlier block (a `<style>` in a script string,
/// say) is not a block of its own.
pub fn component_spans(text: &str) -> Vec<(BlockKind, BlockSpan)> {
    let mut spans: Vec<(BlockKind, BlockSpan)> = SCRIPT
        .spans(text)
        .into_iter()
        .map(|span| (BlockKind::Script, span))
        .chain(
            STYLE
                .spans(text)
                .into_iter()
                .map(|span| (BlockKind::Style, span)),
        )
        .collect();
    spans.sort_by_key(|(_, span)| span.body.start);

    let mut kept: Vec<(BlockKind, BlockSpan)> = Vec::with_capacity(spans.len());
    for (kind, span) in spans {
        if kept
            .last()
            .is_some_and(|(_, prev)| span.body.start < prev.close_end)
        {
            continue;
        }
        kept.push((kind, span));
    }
    kept
}

/// Component file split into its blocks and markup residue.
#[derive(Debug, Clone, Default)]
pub struct ComponentParts {
    pub scripts: Vec<CodeBlock>,
    pub styles: Vec<CodeBlock>,
    pub residue: String,
}

pub fn split_component(text: &str) -> ComponentParts {
    let spans = component_spans(text);
    let mut parts = ComponentParts::default();

    for (kind, span) in &spans {
        let block = block_from_span(text, span);
        match kind {
            BlockKind::Script => parts.scripts.push(block),
            BlockKind::Style => parts.styles.push(block),
        }
    }

    let plain: Vec<BlockSpan> = spans.into_iter().map(|(_, span)| span).collect();
    parts.residue = mask_spans(text, &plain);
    parts
}

/// The markup residue: `text` with every script and style interior blanked.
pub fn markup_residue(text: &str) -> String {
    split_component(text).residue
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPONENT: &str = "<h1>Title</h1>\n\
                             <p>intro</p>\n\
                             <script lang=\"ts\">\n\
                             let a = 1;\n\
                             let b = 2;\n\
                             let c = 3;\n\
                             </script>\n\
                             <style>\n\
                             p { color: red; }\n\
                             </style>\n";

    #[test]
    fn extracts_script_with_outer_line_numbers() {
        let blocks = extract_blocks(COMPONENT, "script");

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].start_line, 2);
        assert_eq!(blocks[0].end_line, 7);
        let lines: Vec<&str> = blocks[0].text.split('\n').collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "let a = 1;");
        assert_eq!(lines[3], "let c = 3;");
        assert!(lines[0].trim().is_empty());
    }

    #[test]
    fn block_lines_map_onto_outer_lines() {
        let outer: Vec<&str> = COMPONENT.lines().collect();
        let block = &extract_blocks(COMPONENT, "script")[0];

        for (i, line) in block.text.lines().enumerate() {
            if !line.trim().is_empty() {
                assert_eq!(line, outer[block.start_line + i]);
            }
        }
    }

    #[test]
    fn extracts_style_block() {
        let blocks = extract_blocks(COMPONENT, "style");

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].line_range(), 7..10);
        assert!(blocks[0].contains_line(8));
        assert!(!blocks[0].contains_line(10));
    }

    #[test]
    fn inline_block_keeps_columns() {
        let text = "<div></div><script>eval(x)</script>";
        let block = &extract_blocks(text, "script")[0];

        assert_eq!(block.start_line, 0);
        assert_eq!(block.end_line, 1);
        assert_eq!(block.text.find("eval"), text.find("eval"));
    }

    #[test]
    fn finds_multiple_blocks() {
        let text = "<script context=\"module\">\nexport const x = 1;\n</script>\n\
                    <script>\nlet y;\n</script>\n";
        let blocks = extract_blocks(text, "script");

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].line_range(), 0..3);
        assert_eq!(blocks[1].line_range(), 3..6);
    }

    #[test]
    fn tag_name_is_case_insensitive_and_exact() {
        assert_eq!(extract_blocks("<SCRIPT>x</SCRIPT>", "script").len(), 1);
        assert!(extract_blocks("<scripts>x</scripts>", "script").is_empty());
    }

    #[test]
    fn self_closing_tag_is_not_a_block() {
        let text = "<script src=\"/a.js\" />\n<p>hi</p>\n";
        assert!(extract_blocks(text, "script").is_empty());
    }

    #[test]
    fn unclosed_block_runs_to_end_of_file() {
        let text = "<p>x</p>\n<script>\nlet a;\n/* open";
        let blocks = extract_blocks(text, "script");

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].line_range(), 1..4);
        assert!(blocks[0].text.ends_with("/* open"));
    }

    #[test]
    fn residue_blanks_interiors_and_keeps_newlines() {
        let residue = markup_residue(COMPONENT);

        assert_eq!(residue.len(), COMPONENT.len());
        assert_eq!(residue.lines().count(), COMPONENT.lines().count());
        assert!(!residue.contains("let a"));
        assert!(!residue.contains("color: red"));
        assert!(residue.contains("<p>intro</p>"));
        assert!(residue.contains("<script lang=\"ts\">"));
        assert!(residue.contains("</style>"));
    }

    #[test]
    fn style_tag_inside_script_is_not_a_separate_block() {
        let text = "<script>\nconst s = '<style>p{}</style>';\n</script>\n<style>\na{}\n</style>";
        let residue = markup_residue(text);

        assert!(!residue.contains("const s"));
        assert!(!residue.contains("a{}"));
        assert_eq!(residue.lines().count(), text.lines().count());
    }

    #[test]
    fn split_component_separates_kinds() {
        let parts = split_component(COMPONENT);

        assert_eq!(parts.scripts.len(), 1);
        assert_eq!(parts.styles.len(), 1);
        assert_eq!(parts.scripts[0].line_range(), 2..7);
        assert_eq!(parts.styles[0].line_range(), 7..10);
        assert_eq!(parts.residue, markup_residue(COMPONENT));
    }

    #[test]
    fn custom_tag_extraction() {
        let blocks = extract_blocks("<template>\n<p/>\n</template>", "template");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].line_range(), 0..3);
    }

    #[test]
    fn residue_keeps_character_columns() {
        let text = "<script>const é = 1;</script><img src=x>";
        let residue = markup_residue(text);

        assert_eq!(residue.chars().count(), text.chars().count());
        assert_eq!(text.find("<img"), Some(30));
        assert_eq!(residue.find("<img"), Some(29));
    }
}
