//! HTML helpers for mail bodies and input sanitizing

/// Escape the five HTML special characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replace every line break (`\r\n`, `\r` or `\n`) with `<br />`.
///
/// Apply after [`escape_html`], never before.
pub fn nl2br(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("<br />");
            }
            '\n' => out.push_str("<br />"),
            _ => out.push(c),
        }
    }
    out
}

/// Escaped, line-broken rendering of free text for HTML mail.
pub fn escape_multiline(input: &str) -> String {
    nl2br(&escape_html(input))
}

/// Remove markup: `<script>`/`<style>` elements including their content,
/// then every remaining tag.
pub fn strip_tags(input: &str) -> String {
    let without_blocks = strip_elements(input, "script");
    let without_blocks = strip_elements(&without_blocks, "style");

    let mut out = String::with_capacity(without_blocks.len());
    let mut in_tag = false;
    let mut chars = without_blocks.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            // A `<` not followed by a tag-like character is literal text
            '<' if !in_tag && chars.peek().is_some_and(|n| opens_tag(*n)) => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn opens_tag(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?')
}

fn strip_elements(input: &str, name: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let open = format!("<{}", name);
    let close = format!("</{}>", name);

    let mut out = String::with_capacity(input.len());
    let mut cursor = 0;
    while let Some(rel) = lower[cursor..].find(&open) {
        let start = cursor + rel;
        out.push_str(&input[cursor..start]);
        match lower[start..].find(&close) {
            Some(end_rel) => cursor = start + end_rel + close.len(),
            None => {
                // Unterminated element: drop the rest
                cursor = input.len();
                break;
            }
        }
    }
    out.push_str(&input[cursor..]);
    out
}
