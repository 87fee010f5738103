//! Plain chat text → HTML fragment.
//!
//! The text is scanned line by line. Each line is escaped first, so the only
//! markup in the output is what this module emits:
//!
//! - line breaks become `<br>`
//! - `1. item`, `- item` and `• item` lines become `<li>` elements, and each
//!   run of them is wrapped in a single `<ul>` with no `<br>` touching it
//! - `--- *note*` becomes `<div class="disclaimer">note</div>`
//!
//! Anything that does not fully match a marker is passed through as text.

/// One input line after classification. Both variants hold raw (unescaped) text.
#[derive(Debug, Clone, Copy)]
enum Line<'a> {
    Item(&'a str),
    Text(&'a str),
}

impl Line<'_> {
    fn is_blank(&self) -> bool {
        matches!(self, Line::Text(t) if t.trim().is_empty())
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render chat text as an HTML fragment.
pub fn format_message(text: &str) -> String {
    let lines: Vec<Line<'_>> = text
        .split('\n')
        .map(|l| classify(l.strip_suffix('\r').unwrap_or(l)))
        .collect();

    let mut out = String::with_capacity(text.len() + 32);
    let mut in_list = false;
    // Kind of the last emitted line: None before the first one.
    let mut prev_was_item: Option<bool> = None;

    for (i, line) in lines.iter().enumerate() {
        match *line {
            Line::Item(content) => {
                if !in_list {
                    out.push_str("<ul>");
                    in_list = true;
                }
                out.push_str("<li>");
                render_inline(content, &mut out);
                out.push_str("</li>");
                prev_was_item = Some(true);
            }
            Line::Text(text) => {
                if in_list {
                    // Blank lines between two items stay inside the list.
                    if line.is_blank() && next_content_is_item(&lines[i + 1..]) {
                        continue;
                    }
                    out.push_str("</ul>");
                    in_list = false;
                }
                if prev_was_item == Some(false) {
                    out.push_str("<br>");
                }
                render_inline(text, &mut out);
                prev_was_item = Some(false);
            }
        }
    }
    if in_list {
        out.push_str("</ul>");
    }
    out
}

fn next_content_is_item(rest: &[Line<'_>]) -> bool {
    rest.iter()
        .find(|l| !l.is_blank())
        .map_or(false, |l| matches!(l, Line::Item(_)))
}

fn classify(line: &str) -> Line<'_> {
    match list_item_content(line) {
        Some(content) => Line::Item(content),
        None => Line::Text(line),
    }
}

/// `<digits>.<ws><content>` or `-`/`•` followed by `<ws><content>`.
fn list_item_content(line: &str) -> Option<&str> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    let after_marker = if digits > 0 {
        line[digits..].strip_prefix('.')?
    } else {
        line.strip_prefix('-')
            .or_else(|| line.strip_prefix('•'))?
    };
    let content = after_marker.trim_start();
    if content.len() == after_marker.len() || content.trim().is_empty() {
        return None;
    }
    Some(content)
}

/// Escape `raw` into `out`, replacing every `--- *note*` segment with a
/// disclaimer block.
fn render_inline(raw: &str, out: &mut String) {
    // Markers survive escaping unchanged, so scanning the escaped text is safe.
    let escaped = escape_html(raw);
    let mut rest = escaped.as_str();
    while let Some(start) = rest.find("---") {
        match disclaimer_note(&rest[start + 3..]) {
            Some((note, consumed)) => {
                out.push_str(&rest[..start]);
                out.push_str("<div class=\"disclaimer\">");
                out.push_str(note);
                out.push_str("</div>");
                rest = &rest[start + 3 + consumed..];
            }
            None => {
                // Step past one dash only: "----- *x*" still has a marker at +2.
                out.push_str(&rest[..start + 1]);
                rest = &rest[start + 1..];
            }
        }
    }
    out.push_str(rest);
}

/// Match `<spaces>*note*` at the start of `s`. Returns the note and the
/// number of bytes consumed.
fn disclaimer_note(s: &str) -> Option<(&str, usize)> {
    let body = s.trim_start_matches([' ', '\t']);
    let skipped = s.len() - body.len();
    let body = body.strip_prefix('*')?;
    let end = body.find('*')?;
    if end == 0 {
        return None;
    }
    Some((&body[..end], skipped + 1 + end + 1))
}
