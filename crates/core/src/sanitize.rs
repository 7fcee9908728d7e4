//! Preview sanitization for generated markup.
//!
//! Model output is untrusted input: a prompt can be crafted adversarially
//! and the model can produce unsafe markup on its own. Everything rendered
//! back to the user passes through [`sanitize`], which keeps an allow-list
//! of structural tags and attributes and strips the rest. Sanitizing never
//! fails; it only removes content.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

/// Tags kept in sanitized output. Anything else is unwrapped (children kept)
/// except `script` and `style`, which are dropped with their content.
pub const ALLOWED_TAGS: &[&str] = &[
    "div", "span", "h1", "h2", "h3", "h4", "h5", "h6", "p", "a", "ul", "ol", "li", "img",
    "section", "header", "footer", "main", "nav", "article", "aside", "strong", "em", "b", "i",
    "br", "hr", "table", "thead", "tbody", "tr", "td", "th", "form", "input", "label", "button",
    "blockquote", "pre", "code",
];

/// Attributes kept on any allowed tag.
pub const ALLOWED_ATTRIBUTES: &[&str] = &[
    "href",
    "src",
    "alt",
    "class",
    "style",
    "id",
    "type",
    "value",
    "placeholder",
    "name",
    "rows",
    "cols",
    "width",
    "height",
];

/// Tags removed together with everything inside them.
const STRIPPED_CONTENT_TAGS: &[&str] = &["script", "style"];

/// Sanitized preview markup.
///
/// Renders as `<style>{css}</style>{html}`, a single fragment meant for an
/// isolated frame with script execution disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafeMarkup {
    pub html: String,
    pub css: String,
}

impl SafeMarkup {
    /// The renderable document fragment.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SafeMarkup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<style>{}</style>{}", self.css, self.html)
    }
}

/// Sanitize generated HTML and CSS for preview.
///
/// Idempotent: sanitizing the parts of a [`SafeMarkup`] again yields the
/// same value.
pub fn sanitize(html: &str, css: &str) -> SafeMarkup {
    SafeMarkup {
        html: sanitize_html(html),
        css: neutralize_css(css),
    }
}

/// Apply the tag/attribute allow-list to an HTML fragment.
pub fn sanitize_html(html: &str) -> String {
    html_cleaner().clean(html).to_string()
}

/// Make CSS safe to embed inside a `<style>` element.
///
/// Every `<` becomes the CSS escape `\3C `, so the text can never close the
/// style element or open a new tag. Valid stylesheets practically never
/// contain a raw `<` outside of strings, where the escape is equivalent.
pub fn neutralize_css(css: &str) -> String {
    css.replace('<', "\\3C ")
}

fn html_cleaner() -> ammonia::Builder<'static> {
    let mut builder = ammonia::Builder::default();
    builder
        .tags(ALLOWED_TAGS.iter().copied().collect::<HashSet<_>>())
        .clean_content_tags(STRIPPED_CONTENT_TAGS.iter().copied().collect::<HashSet<_>>())
        .tag_attributes(HashMap::new())
        .generic_attributes(ALLOWED_ATTRIBUTES.iter().copied().collect::<HashSet<_>>())
        .link_rel(None)
        .strip_comments(true);
    builder
}
