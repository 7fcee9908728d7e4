//! Splitting a generated reply into HTML and CSS.
//!
//! This is a best-effort heuristic, not an HTML parser: only the first
//! `<style>` block is extracted, and malformed or nested blocks are not
//! specially handled. Callers go through [`split_style`] only, so the
//! heuristic can be replaced without touching them.

use std::sync::LazyLock;

use regex::Regex;

/// Regex matching the first `<style ...>...</style>` block, lazily and
/// across newlines.
pub const STYLE_BLOCK_PATTERN: &str = r"(?s)<style[^>]*>(.*?)</style>";

static STYLE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(STYLE_BLOCK_PATTERN).expect("valid regex"));

/// Split a reply into `(html, css)`.
///
/// With a style block, `css` is its inner content and `html` is the reply
/// with that block removed once. Without one, `css` is empty and `html` is
/// the reply verbatim.
pub fn split_style(text: &str) -> (String, String) {
    match STYLE_BLOCK_RE.captures(text) {
        Some(caps) => {
            let block = caps.get_match();
            let css = caps.get(1).map_or("", |m| m.as_str()).to_string();
            let mut html = String::with_capacity(text.len() - block.len());
            html.push_str(&text[..block.start()]);
            html.push_str(&text[block.end()..]);
            (html, css)
        }
        None => (text.to_string(), String::new()),
    }
}
