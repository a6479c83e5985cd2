pub mod attributes;
pub mod decorator;
pub mod extractor;
pub mod scanner;

use scanner::{Token, TokenKind};

/// Marker attribute carried by every decoration wrapper.
pub const WRAPPER_MARKER: &str = "data-formbuilder-htmx";

/// Sentinel element attribute used when comments do not survive rendering.
pub const SENTINEL_MARKER: &str = "data-formbuilder-htmx-end";

/// Comment the form engine writes at the end of each form block.
pub const FORM_TERMINATOR: &str = "<!--/FormBuilder-->";

/// Identifiers are written into single-quoted attributes and compared
/// verbatim by the extractor, so quotes, angle brackets, `&` and whitespace
/// are refused.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && !id
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '<' | '>' | '&' | '`'))
}

/// Callers pass an id accepted by [`is_valid_id`].
pub fn wrapper_open(id: &str) -> String {
    format!("<div id='{}' {}>", id, WRAPPER_MARKER)
}

pub fn sentinel(id: &str) -> String {
    format!("<div {}='{}' hidden></div>", SENTINEL_MARKER, id)
}

/// Whether `token` is the form engine's end-of-block comment.
pub fn is_form_terminator(token: &Token<'_>) -> bool {
    let expected = FORM_TERMINATOR
        .trim_start_matches("<!--")
        .trim_end_matches("-->");
    matches!(&token.kind, TokenKind::Comment { body } if body.trim() == expected)
}
