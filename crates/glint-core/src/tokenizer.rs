//! Comment stripping with string, template and regex-literal awareness
//!
//! [`strip`] takes one physical line plus the state carried from the previous
//! line and returns the line with every comment character replaced by spaces.
//! Replacement is width-preserving at the byte level, so byte offsets (and
//! therefore columns) of surviving characters never move.
//!
//! This is a deliberately small lexer. It does not track `${ ... }`
//! interpolation inside template literals, and a regex literal is decided from
//! the text preceding the `/` on the same line only.

use serde::{Deserialize, Serialize};

/// Which lexical rules apply to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Script,
    Style,
    Markup,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Script => write!(f, "script"),
            Mode::Style => write!(f, "style"),
            Mode::Markup => write!(f, "markup"),
        }
    }
}

/// State carried from one line to the next within a contiguous scan.
///
/// In markup mode `in_block_comment` tracks `<!-- ... -->`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenizerState {
    pub in_block_comment: bool,
    pub in_template_literal: bool,
}

impl TokenizerState {
    pub fn is_neutral(&self) -> bool {
        !self.in_block_comment && !self.in_template_literal
    }
}

const REGEX_PRECEDING_KEYWORDS: &[&str] =
    &["return", "throw", "case", "typeof", "instanceof", "in", "of"];

/// Strips comments from `line` under `mode`, threading `state`.
pub fn strip(line: &str, mode: Mode, state: TokenizerState) -> (String, TokenizerState) {
    match mode {
        Mode::Script => strip_script(line, state),
        Mode::Style => strip_style(line, state),
        Mode::Markup => strip_markup(line, state),
    }
}

fn push_blank(out: &mut String, c: char) {
    for _ in 0..c.len_utf8() {
        out.push(' ');
    }
}

fn blank_rest(out: &mut String, rest: &[char]) {
    for &c in rest {
        push_blank(out, c);
    }
}

fn strip_script(line: &str, state: TokenizerState) -> (String, TokenizerState) {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());

    let mut in_block_comment = state.in_block_comment;
    let mut in_template = state.in_template_literal;
    let mut in_single = false;
    let mut in_double = false;
    let mut in_regex = false;
    let mut in_class = false;
    let mut escaped = false;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if in_block_comment {
            if c == '*' && next == Some('/') {
                out.push_str("  ");
                in_block_comment = false;
                i += 2;
            } else {
                push_blank(&mut out, c);
                i += 1;
            }
            continue;
        }

        if escaped {
            escaped = false;
            out.push(c);
            i += 1;
            continue;
        }

        if c == '\\' {
            escaped = true;
            out.push(c);
            i += 1;
            continue;
        }

        // Regex bodies are consumed before any comment detection so that a
        // class such as `[//]` never opens a line comment.
        if in_regex {
            if in_class {
                if c == ']' {
                    in_class = false;
                }
            } else if c == '[' {
                in_class = true;
            } else if c == '/' {
                in_regex = false;
            }
            out.push(c);
            i += 1;
            continue;
        }

        if in_single || in_double || in_template {
            match c {
                '\'' if in_single => in_single = false,
                '"' if in_double => in_double = false,
                '`' if in_template => in_template = false,
                _ => {}
            }
            out.push(c);
            i += 1;
            continue;
        }

        match c {
            '/' if next == Some('/') => {
                blank_rest(&mut out, &chars[i..]);
                break;
            }
            '/' if next == Some('*') => {
                out.push_str("  ");
                in_block_comment = true;
                i += 2;
                continue;
            }
            '/' => {
                if regex_may_start(&out) {
                    in_regex = true;
                    in_class = false;
                }
            }
            '\'' => in_single = true,
            '"' => in_double = true,
            '`' => in_template = true,
            _ => {}
        }
        out.push(c);
        i += 1;
    }

    (
        out,
        TokenizerState {
            in_block_comment,
            in_template_literal: in_template,
        },
    )
}

/// Decides whether a `/` following `preceding` opens a regex literal rather
/// than being a division operator.
fn regex_may_start(preceding: &str) -> bool {
    let trimmed = preceding.trim_end();
    let Some(last) = trimmed.chars().next_back() else {
        return true;
    };

    if ends_with_keyword(trimmed) {
        return true;
    }

    !(is_identifier_char(last) || matches!(last, ')' | ']' | '}'))
}

fn ends_with_keyword(trimmed: &str) -> bool {
    REGEX_PRECEDING_KEYWORDS.iter().any(|keyword| {
        trimmed.strip_suffix(keyword).is_some_and(|head| {
            head.chars()
                .next_back()
                .is_none_or(|c| !is_identifier_char(c) && c != '.')
        })
    })
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn strip_style(line: &str, state: TokenizerState) -> (String, TokenizerState) {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());

    let mut in_block_comment = state.in_block_comment;
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if in_block_comment {
            if c == '*' && next == Some('/') {
                out.push_str("  ");
                in_block_comment = false;
                i += 2;
            } else {
                push_blank(&mut out, c);
                i += 1;
            }
            continue;
        }

        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if in_single {
            in_single = c != '\'';
        } else if in_double {
            in_double = c != '"';
        } else if c == '/' && next == Some('*') {
            out.push_str("  ");
            in_block_comment = true;
            i += 2;
            continue;
        } else if c == '\'' {
            in_single = true;
        } else if c == '"' {
            in_double = true;
        }

        out.push(c);
        i += 1;
    }

    (
        out,
        TokenizerState {
            in_block_comment,
            in_template_literal: false,
        },
    )
}

fn strip_markup(line: &str, state: TokenizerState) -> (String, TokenizerState) {
    let mut out = String::with_capacity(line.len());
    let mut in_comment = state.in_block_comment;
    let mut rest = line;

    while !rest.is_empty() {
        if in_comment {
            match rest.find("-->") {
                Some(end) => {
                    out.push_str(&" ".repeat(end + 3));
                    rest = &rest[end + 3..];
                    in_comment = false;
                }
                None => {
                    out.push_str(&" ".repeat(rest.len()));
                    rest = "";
                }
            }
        } else {
            match rest.find("<!--") {
                Some(start) => {
                    out.push_str(&rest[..start]);
                    out.push_str("    ");
                    rest = &rest[start + 4..];
                    in_comment = true;
                }
                None => {
                    out.push_str(rest);
                    rest = "";
                }
            }
        }
    }

    (
        out,
        TokenizerState {
            in_block_comment: in_comment,
            in_template_literal: false,
        },
    )
}

/// Threads [`TokenizerState`] across consecutive lines of one contiguous scan.
#[derive(Debug, Clone)]
pub struct LineStripper {
    mode: Mode,
    state: TokenizerState,
}

impl LineStripper {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            state: TokenizerState::default(),
        }
    }

    pub fn strip(&mut self, line: &str) -> String {
        let (cleaned, state) = strip(line, self.mode, self.state);
        self.state = state;
        cleaned
    }

    pub fn state(&self) -> TokenizerState {
        self.state
    }

    /// Drops carried state, as at an independent block boundary.
    pub fn reset(&mut self) {
        self.state = TokenizerState::default();
    }
}
