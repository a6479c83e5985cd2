use crate::markup::scanner::{Scanner, Token};
use crate::markup::{SENTINEL_MARKER, WRAPPER_MARKER, is_form_terminator, is_valid_id};

/// The decorated region of a page for one correlation identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub id: String,
    /// Byte span of the fragment within the page
    pub start: usize,
    pub end: usize,
    html: String,
    inner: (usize, usize),
    pub has_sentinel: bool,
}

impl Fragment {
    /// Wrapper element, plus its sentinel when one follows.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Contents of the wrapper element.
    pub fn inner(&self) -> &str {
        &self.html[self.inner.0..self.inner.1]
    }

    pub fn len(&self) -> usize {
        self.html.len()
    }

    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }
}

/// Per-submission values used to pick between several wrappers that share
/// an identifier. All of a page's forms get the echoed identifier during a
/// background submission, so duplicates are the normal case there.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchTokens<'a> {
    pub submit_key: Option<&'a str>,
    pub form_name: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub fragment: Option<Fragment>,
    /// Wrappers found with a matching id
    pub candidates: usize,
    /// Matching wrappers dropped for lack of an end boundary
    pub rejected: usize,
}

/// Locate the fragment for `id`, or `None`.
pub fn extract(page: &str, id: &str, tokens: MatchTokens<'_>) -> Option<Fragment> {
    extract_detailed(page, id, tokens).fragment
}

pub fn extract_detailed(page: &str, id: &str, tokens: MatchTokens<'_>) -> Extraction {
    let mut extraction = Extraction::default();
    if !is_valid_id(id) {
        return extraction;
    }

    let mut found = Vec::new();

    for token in Scanner::new(page) {
        if !is_wrapper_for(&token, id) {
            continue;
        }

        extraction.candidates += 1;
        match bound_fragment(page, id, &token) {
            Some(fragment) => found.push(fragment),
            None => extraction.rejected += 1,
        }
    }

    extraction.fragment = choose(found, tokens);
    extraction
}

fn is_wrapper_for(token: &Token<'_>, id: &str) -> bool {
    token.is_start("div") && token.has_attribute(WRAPPER_MARKER) && token.attr_value("id") == Some(id)
}

fn is_sentinel_for(token: &Token<'_>, id: &str) -> bool {
    token.is_start("div") && token.attr_value(SENTINEL_MARKER) == Some(id)
}

/// Walk from the wrapper start tag to its end boundary, tracking `div`
/// depth. The wrapper is valid when the form terminator comment appears
/// inside it or a sentinel for the same id follows it.
fn bound_fragment(page: &str, id: &str, open: &Token<'_>) -> Option<Fragment> {
    let mut depth = 1usize;
    let mut terminated = false;
    let mut tokens = Scanner::at(page, open.end);

    let (inner_end, close_end) = loop {
        let token = tokens.next()?;

        if is_form_terminator(&token) {
            terminated = true;
        } else if is_sentinel_for(&token, id) {
            // Wrapper never balanced before its sentinel: cut at the sentinel
            let close = sentinel_end(page, &token)?;
            return Some(build(page, id, open.start, open.end, token.start, close, true));
        } else if token.is_start("div") && !token.is_self_closing() {
            depth += 1;
        } else if token.is_end("div") {
            depth -= 1;
            if depth == 0 {
                break (token.start, token.end);
            }
        }
    };

    // A sentinel may directly follow the wrapper
    let mut end = close_end;
    let mut has_sentinel = false;
    if page[close_end..].trim_start().starts_with('<') {
        let next_tag = close_end + (page[close_end..].len() - page[close_end..].trim_start().len());
        if let Some(next) = Scanner::at(page, next_tag).next() {
            if next.start == next_tag && is_sentinel_for(&next, id) {
                if let Some(close) = sentinel_end(page, &next) {
                    end = close;
                    has_sentinel = true;
                }
            }
        }
    }

    if !terminated && !has_sentinel {
        return None;
    }

    Some(build(page, id, open.start, open.end, inner_end, end, has_sentinel))
}

/// End offset of a sentinel element: its own `</div>` or, if
/// self-closing, the start tag.
fn sentinel_end(page: &str, sentinel: &Token<'_>) -> Option<usize> {
    if sentinel.is_self_closing() {
        return Some(sentinel.end);
    }
    Scanner::at(page, sentinel.end)
        .next()
        .filter(|t| t.is_end("div"))
        .map(|t| t.end)
}

fn build(
    page: &str,
    id: &str,
    start: usize,
    content_start: usize,
    content_end: usize,
    end: usize,
    has_sentinel: bool,
) -> Fragment {
    Fragment {
        id: id.to_string(),
        start,
        end,
        html: page[start..end].to_string(),
        inner: (content_start - start, content_end - start),
        has_sentinel,
    }
}

/// Pick one fragment. A lone candidate wins outright; otherwise the longest
/// candidate in the best tier: submit key present, then the form's success
/// block, then the form's class, then anything.
fn choose(found: Vec<Fragment>, tokens: MatchTokens<'_>) -> Option<Fragment> {
    if found.len() <= 1 {
        return found.into_iter().next();
    }

    let tier = |fragment: &Fragment| -> u8 {
        if tokens.submit_key.is_some_and(|key| fragment.html().contains(key)) {
            3
        } else if tokens.form_name.is_some_and(|name| has_success_block(fragment.html(), name)) {
            2
        } else if tokens.form_name.is_some_and(|name| has_form_class(fragment.html(), name)) {
            1
        } else {
            0
        }
    };

    // max_by_key keeps the last maximum; iterate reversed so ties go to the first
    found
        .into_iter()
        .rev()
        .max_by_key(|f| (tier(f), f.len()))
}

/// `<div id="FormBuilderSubmitted" data-name="<form>">`, written by the
/// form engine in place of the form after a successful submission.
fn has_success_block(html: &str, form_name: &str) -> bool {
    Scanner::new(html).any(|t| {
        t.is_start("div")
            && t.attr_value("id") == Some("FormBuilderSubmitted")
            && t.attr_value("data-name") == Some(form_name)
    })
}

fn has_form_class(html: &str, form_name: &str) -> bool {
    let class_name = format!("FormBuilder-{}", form_name);
    Scanner::new(html).any(|t| t.has_class(&class_name))
}
