//! Citation marker formatting.
//!
//! The upstream embeds numeric markers like `[1]` in the answer text,
//! indexing into the ordered citation list (marker `[n]` refers to entry
//! `n-1`). [`format_citations`] rewrites them per [`CitationMode`]. The
//! function is pure and deterministic: it is re-applied to every cumulative
//! snapshot while streaming, so partial text never shows a different
//! citation style than the final answer.

use std::sync::LazyLock;

use crate::models::options::CitationMode;
use crate::models::response::SearchResult;

/// Matches a numeric citation marker. The upstream never emits more than
/// two digits. A marker followed by a word character (e.g. `[1]a`) is not
/// a citation; that check happens after the match since regex-lite has no
/// lookarounds.
static MARKER_RE: LazyLock<regex_lite::Regex> =
    LazyLock::new(|| regex_lite::Regex::new(r"\[(\d{1,2})\]").unwrap());

/// Rewrite citation markers in `text` per `mode`.
///
/// - `Default`: text is returned unchanged.
/// - `Markdown`: each resolvable marker becomes `[n](url)`.
/// - `Clean`: each resolvable marker is removed.
///
/// A marker is resolvable when `citations[n-1]` exists and (for Markdown)
/// has a non-empty URL. Unresolvable markers are left untouched — while
/// streaming, markers can reference sources that have not arrived yet.
pub fn format_citations(mode: CitationMode, text: &str, citations: &[SearchResult]) -> String {
    if mode == CitationMode::Default || text.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut last_end = 0;

    for caps in MARKER_RE.captures_iter(text) {
        let m = caps.get(0).expect("group 0 always present");

        // Reject markers glued to a word character, like "[1]st".
        let followed_by_word = text[m.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');

        out.push_str(&text[last_end..m.start()]);
        last_end = m.end();

        let number: usize = caps[1].parse().unwrap_or(0);
        let source = number
            .checked_sub(1)
            .and_then(|idx| citations.get(idx))
            .filter(|_| !followed_by_word);

        match (mode, source) {
            (CitationMode::Markdown, Some(result)) => match result.url.as_deref() {
                Some(url) if !url.is_empty() => {
                    out.push_str(&format!("[{number}]({url})"));
                }
                _ => out.push_str(m.as_str()),
            },
            (CitationMode::Clean, Some(_)) => {
                // Marker removed; citation stays available as metadata.
            }
            _ => out.push_str(m.as_str()),
        }
    }

    out.push_str(&text[last_end..]);
    out
}
