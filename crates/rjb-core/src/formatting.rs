//! Formatting utilities (Telegram HTML, listing blocks).

use crate::search::ListingRecord;

/// Maximum excerpt length (in characters) before the ellipsis.
pub const EXCERPT_MAX_CHARS: usize = 200;

const SEPARATOR_WIDTH: usize = 30;
const SEPARATOR_CHAR: char = '─';

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// One rendered listing, separator included. Safe to concatenate as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayBlock(String);

impl DisplayBlock {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for DisplayBlock {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Render a listing for Telegram (HTML mode).
///
/// Field order is fixed; optional fields are omitted entirely when empty.
pub fn format_listing(record: &ListingRecord) -> DisplayBlock {
    let mut out = String::new();

    out.push_str(&format!("<b>{}</b>\n", escape_html(&record.title)));
    out.push_str(&format!("<b>Company:</b> {}\n", escape_html(&record.company)));
    out.push_str(&format!(
        "<b>Location:</b> {}\n",
        escape_html(&record.location)
    ));
    out.push_str(&format!("<b>Level:</b> {}\n", escape_html(&record.level)));

    let min = record.salary_min.as_deref().unwrap_or("");
    let max = record.salary_max.as_deref().unwrap_or("");
    if !min.is_empty() || !max.is_empty() {
        out.push_str(&format!(
            "<b>Salary:</b> {} - {}\n",
            escape_html(min),
            escape_html(max)
        ));
    }

    if let Some(excerpt) = record.excerpt.as_deref().filter(|e| !e.is_empty()) {
        // Truncate before escaping so an entity is never cut in half.
        let excerpt = truncate_with_ellipsis(excerpt, EXCERPT_MAX_CHARS);
        out.push_str(&format!("<b>Description:</b> {}\n", escape_html(&excerpt)));
    }

    out.push_str(&format!(
        "<b>Posted On:</b> {}\n",
        escape_html(date_only(&record.published))
    ));
    out.push_str(&format!(
        "<b>Apply:</b> <a href=\"{}\">View Job</a>\n",
        escape_html(&record.url)
    ));

    out.push('\n');
    out.extend(std::iter::repeat(SEPARATOR_CHAR).take(SEPARATOR_WIDTH));
    out.push_str("\n\n");

    DisplayBlock(out)
}

/// `2024-05-01T10:00:00Z` / `2024-05-01 10:00:00` -> `2024-05-01`.
fn date_only(published: &str) -> &str {
    let trimmed = published.trim();
    match trimmed.find(|c: char| c == 'T' || c.is_whitespace()) {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    }
}

fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    format!("{}...", s.chars().take(max_chars).collect::<String>())
}
