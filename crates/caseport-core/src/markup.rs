//! Jira wiki markup to HTML conversion
//!
//! Conversion returns the rewritten text together with the notes describing
//! which constructs were rewritten. Callers decide how to report them.

use crate::document::trimmed;
use crate::textile;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref RE_HEADER_ROW_END: Regex = Regex::new(r"\|\|[^|\n]*(\n|\z)").unwrap();
    static ref RE_LINE_BREAK_SPACES: Regex = Regex::new(r" *\n *").unwrap();
    static ref RE_PREFORMATTED: Regex = Regex::new(r"\{\{(.+?)\}\}").unwrap();
    static ref RE_QUOTE: Regex = Regex::new(r"(?s)\{quote\}(.*?)\{quote\}").unwrap();
    static ref RE_ABBREVIATION: Regex = Regex::new(r"[A-Z]+\(").unwrap();
    static ref RE_COLOR: Regex = Regex::new(r"\{color:([^}]+)\}([^{]*)\{color\}").unwrap();
    static ref RE_SCRIPT_OPEN: Regex = Regex::new(r"(?i)<(script)").unwrap();
    static ref RE_SCRIPT_CLOSE: Regex = Regex::new(r"(?i)></(script)>").unwrap();
}

/// A construct rewritten (or suspected) during conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupNote {
    Preformatted,
    Quote,
    /// `WORD(` left as is; usually an unconverted abbreviation macro
    AbbreviationMacro,
    Color,
}

impl fmt::Display for MarkupNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkupNote::Preformatted => write!(f, "Pre converted."),
            MarkupNote::Quote => write!(f, "Quote converted."),
            MarkupNote::AbbreviationMacro => write!(f, "Affected by abbr"),
            MarkupNote::Color => write!(f, "Color converted."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Converted {
    pub text: Option<String>,
    pub notes: Vec<MarkupNote>,
}

impl Converted {
    fn plain(text: Option<String>) -> Self {
        Self {
            text,
            notes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupConverter {
    convert_wiki_markup: bool,
}

impl MarkupConverter {
    pub fn new(convert_wiki_markup: bool) -> Self {
        Self {
            convert_wiki_markup,
        }
    }

    pub fn converts_wiki_markup(&self) -> bool {
        self.convert_wiki_markup
    }

    /// Trimmed and defused text, without markup conversion
    pub fn literal(&self, text: Option<&str>) -> Option<String> {
        text.and_then(trimmed).map(|text| defuse(&text))
    }

    /// Convert rich text for export.
    ///
    /// With wiki markup conversion disabled this is [`MarkupConverter::literal`].
    pub fn convert(&self, text: Option<&str>) -> Converted {
        let Some(text) = text.and_then(trimmed) else {
            return Converted::default();
        };

        if !self.convert_wiki_markup {
            return Converted::plain(Some(defuse(&text)));
        }

        let mut notes = Vec::new();
        let mut text = text.replace('\r', "");
        text = text.replace("\\\\ ", "\n");
        text = format_table_headers(&text);
        text = RE_LINE_BREAK_SPACES.replace_all(&text, "\n").into_owned();

        if RE_PREFORMATTED.is_match(&text) {
            text = RE_PREFORMATTED.replace_all(&text, "<pre>$1</pre>").into_owned();
            notes.push(MarkupNote::Preformatted);
        }

        if RE_QUOTE.is_match(&text) {
            text = RE_QUOTE
                .replace_all(&text, "<blockquote>$1</blockquote>")
                .into_owned();
            notes.push(MarkupNote::Quote);
        }

        if RE_ABBREVIATION.is_match(&text) {
            notes.push(MarkupNote::AbbreviationMacro);
        }

        if RE_COLOR.is_match(&text) {
            text = RE_COLOR
                .replace_all(&text, r#"<span style="color: $1">$2</span>"#)
                .into_owned();
            notes.push(MarkupNote::Color);
        }

        Converted {
            text: Some(defuse(&textile::to_html(&text))),
            notes,
        }
    }
}

/// Turn Jira table header cells into textile header cells.
///
/// `||Col1||Col2||` becomes `|_.Col1|_.Col2|`. A cell is only rewritten when
/// another `||` follows it; the row's closing `||` (and anything after it on
/// the line) becomes a single `|`.
pub fn format_table_headers(text: &str) -> String {
    let mut formatted = String::with_capacity(text.len());
    let mut rest = text;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("||") {
            let cell_len = after.find('|').unwrap_or(after.len());
            if cell_len > 0 && after[cell_len..].starts_with("||") {
                formatted.push_str("|_.");
                formatted.push_str(&after[..cell_len]);
                rest = &after[cell_len..];
                continue;
            }
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            formatted.push(c);
        }
        rest = chars.as_str();
    }

    RE_HEADER_ROW_END
        .replace_all(&formatted, "|${1}")
        .into_owned()
}

/// Neutralize script tags. Runs on every exported text, converted or not.
pub fn defuse(text: &str) -> String {
    let text = RE_SCRIPT_OPEN.replace_all(text, "&lt;$1");
    RE_SCRIPT_CLOSE
        .replace_all(&text, "&gt;&lt;/$1&gt;")
        .into_owned()
}
