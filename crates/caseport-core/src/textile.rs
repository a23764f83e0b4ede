//! Minimal textile to HTML renderer
//!
//! Covers the textile produced by the wiki markup rewrite: paragraphs with
//! `<br />` line breaks, `h1.`–`h6.` headings, `bq.` quotes, `*`/`#` lists,
//! `|`-tables with `|_.` header cells and the common phrase modifiers.
//! Blocks that already open with block-level HTML are emitted untouched.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RE_HEADING: Regex = Regex::new(r"^h([1-6])\.\s+(.*)$").unwrap();
    static ref RE_BLOCKQUOTE: Regex = Regex::new(r"^bq\.\s+(.*)$").unwrap();
    static ref RE_PARAGRAPH: Regex = Regex::new(r"^p\.\s+(.*)$").unwrap();
    static ref RE_LIST_ITEM: Regex = Regex::new(r"^([*#]+)\s+(.*)$").unwrap();
    static ref RE_HTML_BLOCK: Regex =
        Regex::new(r"(?i)^<(pre|blockquote|table|div|ul|ol|p|h[1-6])(?:\s[^>]*)?>").unwrap();
    static ref RE_PRE_SPAN: Regex = Regex::new(r"(?s)<pre>.*?</pre>").unwrap();

    static ref RE_LINK: Regex =
        Regex::new(r#""([^"\n]+)":((?:https?|ftp|mailto):[^\s<"]*[^\s<".,;:!?)])"#).unwrap();
    static ref PHRASES: Vec<(Regex, &'static str)> = [
        (r"@", "code"),
        (r"\?\?", "cite"),
        (r"\*", "strong"),
        (r"_", "em"),
        (r"-", "del"),
        (r"\+", "ins"),
        (r"\^", "sup"),
        (r"~", "sub"),
    ]
    .iter()
    .map(|(delimiter, tag)| (phrase_regex(delimiter), *tag))
    .collect();
}

/// `*word*` style span bounded by whitespace, punctuation or a tag edge
fn phrase_regex(delimiter: &str) -> Regex {
    Regex::new(&format!(
        r"(^|[\s(>\[]){d}([^\s](?:[^\n]*?[^\s])?){d}($|[\s.,;:!?)<\]])",
        d = delimiter
    ))
    .unwrap()
}

enum Block<'a> {
    Paragraph(Vec<&'a str>),
    Heading(u8, Vec<&'a str>),
    Quote(Vec<&'a str>),
    Table(Vec<&'a str>),
    List(Vec<&'a str>),
    Html(Vec<&'a str>),
}

/// Render textile `text` as an HTML fragment
pub fn to_html(text: &str) -> String {
    split_blocks(text)
        .into_iter()
        .map(render_block)
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_table_row(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

fn split_blocks(text: &str) -> Vec<Block<'_>> {
    let lines: Vec<&str> = text.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if line.trim().is_empty() {
            i += 1;
            continue;
        }

        if let Some(caps) = RE_HTML_BLOCK.captures(line.trim_start()) {
            let closing = format!("</{}>", caps[1].to_lowercase());
            let start = i;
            while i < lines.len() && !lines[i].to_lowercase().contains(&closing) {
                i += 1;
            }
            i = (i + 1).min(lines.len());
            blocks.push(Block::Html(lines[start..i].to_vec()));
            continue;
        }

        if is_table_row(line) {
            let start = i;
            while i < lines.len() && is_table_row(lines[i]) {
                i += 1;
            }
            blocks.push(Block::Table(lines[start..i].to_vec()));
            continue;
        }

        if RE_LIST_ITEM.is_match(line) {
            let start = i;
            while i < lines.len() && RE_LIST_ITEM.is_match(lines[i]) {
                i += 1;
            }
            blocks.push(Block::List(lines[start..i].to_vec()));
            continue;
        }

        // Text blocks run until a blank line or the start of a table or list
        let start = i;
        i += 1;
        while i < lines.len()
            && !lines[i].trim().is_empty()
            && !is_table_row(lines[i])
            && !RE_LIST_ITEM.is_match(lines[i])
        {
            i += 1;
        }
        let mut block_lines = lines[start..i].to_vec();

        if let Some(caps) = RE_HEADING.captures(line) {
            let level = caps[1].parse().unwrap_or(1);
            block_lines[0] = caps.get(2).map_or("", |m| m.as_str());
            blocks.push(Block::Heading(level, block_lines));
        } else if let Some(caps) = RE_BLOCKQUOTE.captures(line) {
            block_lines[0] = caps.get(1).map_or("", |m| m.as_str());
            blocks.push(Block::Quote(block_lines));
        } else if let Some(caps) = RE_PARAGRAPH.captures(line) {
            block_lines[0] = caps.get(1).map_or("", |m| m.as_str());
            blocks.push(Block::Paragraph(block_lines));
        } else {
            blocks.push(Block::Paragraph(block_lines));
        }
    }

    blocks
}

fn render_block(block: Block<'_>) -> String {
    match block {
        Block::Paragraph(lines) => format!("<p>{}</p>", render_lines(&lines)),
        Block::Heading(level, lines) => format!("<h{0}>{1}</h{0}>", level, render_lines(&lines)),
        Block::Quote(lines) => format!("<blockquote>\n<p>{}</p>\n</blockquote>", render_lines(&lines)),
        Block::Table(rows) => render_table(&rows),
        Block::List(items) => render_list(&items),
        Block::Html(lines) => lines.join("\n"),
    }
}

fn render_lines(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|line| inline(line.trim()))
        .collect::<Vec<_>>()
        .join("<br />\n")
}

fn render_table(rows: &[&str]) -> String {
    let mut html = String::from("<table>\n");
    for row in rows {
        let row = row.trim();
        let row = row.strip_prefix('|').unwrap_or(row);
        let row = row.strip_suffix('|').unwrap_or(row);

        html.push_str("<tr>\n");
        for cell in row.split('|') {
            match cell.strip_prefix("_.") {
                Some(header) => html.push_str(&format!("<th>{}</th>\n", inline(header.trim()))),
                None => html.push_str(&format!("<td>{}</td>\n", inline(cell.trim()))),
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>");
    html
}

fn render_list(items: &[&str]) -> String {
    let mut html = String::new();
    let mut open: Vec<&'static str> = Vec::new();

    for item in items {
        let Some(caps) = RE_LIST_ITEM.captures(item) else {
            continue;
        };
        let markers = &caps[1];
        let depth = markers.len();
        let tag = if markers.ends_with('#') { "ol" } else { "ul" };

        if depth > open.len() {
            while open.len() < depth {
                if !open.is_empty() {
                    html.push('\n');
                }
                html.push_str(&format!("<{}>\n", tag));
                open.push(tag);
            }
        } else {
            html.push_str("</li>\n");
            while open.len() > depth {
                if let Some(closed) = open.pop() {
                    html.push_str(&format!("</{}>\n</li>\n", closed));
                }
            }
        }

        html.push_str(&format!("<li>{}", inline(caps[2].trim())));
    }

    html.push_str("</li>\n");
    while let Some(closed) = open.pop() {
        html.push_str(&format!("</{}>", closed));
        if !open.is_empty() {
            html.push_str("\n</li>");
        }
        html.push('\n');
    }
    html.trim_end().to_string()
}

/// Phrase modifiers, skipping `<pre>` spans
fn inline(text: &str) -> String {
    let mut html = String::with_capacity(text.len());
    let mut last = 0;
    for pre in RE_PRE_SPAN.find_iter(text) {
        html.push_str(&format_phrases(&text[last..pre.start()]));
        html.push_str(pre.as_str());
        last = pre.end();
    }
    html.push_str(&format_phrases(&text[last..]));
    html
}

fn format_phrases(text: &str) -> String {
    let mut text = RE_LINK
        .replace_all(text, r#"<a href="$2">$1</a>"#)
        .into_owned();
    for (re, tag) in PHRASES.iter() {
        let replacement = format!("${{1}}<{0}>${{2}}</{0}>${{3}}", tag);
        // Adjacent spans share a boundary character; a second pass picks up the rest
        for _ in 0..2 {
            text = re.replace_all(&text, replacement.as_str()).into_owned();
        }
    }
    text
}
