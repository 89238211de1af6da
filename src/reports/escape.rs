//! Escaping utilities for Markdown report generation.
//!
//! Policy symbol names, conditional expressions and file paths come from
//! the policy sources and may contain characters that break Markdown table
//! structure or inline formatting. Everything user-controllable goes
//! through one of these functions before it is embedded in a report.

/// Characters that would end a table cell or open a link.
const TABLE_SPECIALS: &[char] = &['|', '`', '[', ']'];

/// Characters with inline Markdown meaning. `_` matters most here: nearly
/// every SELinux type name contains one.
const INLINE_SPECIALS: &[char] = &[
    '*', '_', '`', '[', ']', '#', '!', '~', '|', '<', '>',
];

/// Backslash-escape `specials`, fold line breaks into spaces.
fn escape_chars(s: &str, specials: &[char]) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    for c in s.chars() {
        match c {
            '\r' => {}
            '\n' => out.push(' '),
            c if specials.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Escape text for a Markdown table cell.
///
/// ```
/// use poldiff::reports::escape::escape_markdown_table;
///
/// assert_eq!(escape_markdown_table("a | b"), "a \\| b");
/// assert_eq!(escape_markdown_table("line1\nline2"), "line1 line2");
/// ```
pub fn escape_markdown_table(s: &str) -> String {
    escape_chars(s, TABLE_SPECIALS)
}

/// Escape text for headings and other inline Markdown.
///
/// ```
/// use poldiff::reports::escape::escape_markdown_inline;
///
/// assert_eq!(escape_markdown_inline("user_t"), "user\\_t");
/// ```
pub fn escape_markdown_inline(s: &str) -> String {
    escape_chars(s, INLINE_SPECIALS)
}

/// Make text safe inside a fenced code block.
///
/// Only a run of three backticks can close the fence early, so those are
/// broken up with a zero-width space.
pub fn escape_code_block(s: &str) -> String {
    s.replace("```", "`\u{200b}``")
}

/// Table cell for an optional value; `-` when absent.
pub fn escape_md_opt(s: Option<&str>) -> String {
    s.map_or_else(|| "-".to_string(), escape_markdown_table)
}
