//! # Console Rendering
//!
//! Splits a model reply into prose and fenced code blocks, and writes it to
//! a terminal with the code highlighted.

use crate::config::DEFAULT_THEME;
use regex::Regex;
use std::io::{self, Write};
use std::sync::OnceLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::{as_24_bit_terminal_escaped, LinesWithEndings};

/// Language assumed for untagged fences
pub const DEFAULT_LANGUAGE: &str = "swift";

/// One piece of a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Prose(String),
    Code { language: String, body: String },
}

fn fence_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)```([A-Za-z0-9_+\-]*)[ \t]*\n?(.*?)```").ok())
        .as_ref()
}

/// Split `text` on triple-backtick fences
pub fn split_fenced(text: &str) -> Vec<Segment> {
    let Some(pattern) = fence_pattern() else {
        return vec![Segment::Prose(text.trim().to_string())];
    };

    let mut segments = Vec::new();
    let push_prose = |segments: &mut Vec<Segment>, prose: &str| {
        let prose = prose.trim();
        if !prose.is_empty() {
            segments.push(Segment::Prose(prose.to_string()));
        }
    };

    let mut last = 0;
    for caps in pattern.captures_iter(text) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        push_prose(&mut segments, &text[last..whole.start()]);

        let language = caps
            .get(1)
            .map(|m| m.as_str())
            .filter(|lang| !lang.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE);
        segments.push(Segment::Code {
            language: language.to_lowercase(),
            body: body.as_str().trim().to_string(),
        });
        last = whole.end();
    }
    push_prose(&mut segments, &text[last..]);
    segments
}

/// Terminal renderer
pub struct Console {
    syntax_set: SyntaxSet,
    theme: Option<Theme>,
}

impl Console {
    /// Unknown theme names fall back to the default theme
    pub fn new(theme: &str) -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = themes.remove(theme).or_else(|| {
            tracing::warn!(theme, "Unknown theme, using {DEFAULT_THEME}");
            themes.remove(DEFAULT_THEME)
        });
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    /// Console that never emits escape codes
    pub fn plain() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme: None,
        }
    }

    pub fn render<W: Write>(&self, out: &mut W, text: &str) -> io::Result<()> {
        for segment in split_fenced(text) {
            match segment {
                Segment::Prose(prose) => writeln!(out, "{prose}\n")?,
                Segment::Code { language, body } => {
                    self.write_code(out, &language, &body)?;
                    writeln!(out)?;
                }
            }
        }
        out.flush()
    }

    fn write_code<W: Write>(&self, out: &mut W, language: &str, body: &str) -> io::Result<()> {
        let syntax = self.syntax_set.find_syntax_by_token(language);
        let (Some(theme), Some(syntax)) = (&self.theme, syntax) else {
            return writeln!(out, "{body}");
        };

        let mut highlighter = HighlightLines::new(syntax, theme);
        for line in LinesWithEndings::from(body) {
            match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => write!(out, "{}", as_24_bit_terminal_escaped(&ranges[..], false))?,
                Err(_) => write!(out, "{line}")?,
            }
        }
        writeln!(out, "\x1b[0m")
    }
}
