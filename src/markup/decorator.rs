use rand::Rng;
use rand::distr::Alphanumeric;

use crate::config::{HtmxFormsConfig, IdConfig, OutputMode};
use crate::error::HtmxError;
use crate::markup::attributes::{GENERATED_ATTRIBUTES, build_attributes};
use crate::markup::scanner::{Scanner, Token, matching_close};
use crate::markup::{SENTINEL_MARKER, WRAPPER_MARKER, is_form_terminator, is_valid_id, sentinel, wrapper_open};
use crate::request::context::RequestContext;

// ============================================================================
// Identifier generation
// ============================================================================

/// Produces fresh correlation identifiers for forms rendered without one.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// `<prefix><n random alphanumerics>`, e.g. `fb-htmx-a8Kq2ZpL0x`.
#[derive(Debug, Clone)]
pub struct RandomIdGenerator {
    prefix: String,
    length: usize,
}

impl RandomIdGenerator {
    pub fn new(config: &IdConfig) -> Self {
        RandomIdGenerator {
            prefix: config.prefix.clone(),
            length: config.length.max(1),
        }
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        Self::new(&IdConfig::default())
    }
}

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> String {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect();
        format!("{}{}", self.prefix, suffix)
    }
}

/// Always hands out the same identifier.
#[derive(Debug, Clone)]
pub struct FixedId(pub String);

impl IdGenerator for FixedId {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

// ============================================================================
// Decoration
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct DecorateOptions {
    /// Selector toggled while the submission is in flight
    pub indicator: Option<String>,
    /// Extra attribute strings for the `<form>` element, e.g. `hx-confirm='Sure?'`
    pub extra_attributes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecoratedForm {
    pub id: String,
    pub indicator: Option<String>,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decorated {
    Applied(DecoratedForm),
    /// Input returned untouched
    Skipped { markup: String, reason: String },
}

impl Decorated {
    pub fn html(&self) -> &str {
        match self {
            Decorated::Applied(form) => &form.html,
            Decorated::Skipped { markup, .. } => markup,
        }
    }

    pub fn into_html(self) -> String {
        match self {
            Decorated::Applied(form) => form.html,
            Decorated::Skipped { markup, .. } => markup,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Decorated::Applied(form) => Some(&form.id),
            Decorated::Skipped { .. } => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Decorated::Applied(_))
    }
}

pub struct Decorator<'c> {
    config: &'c HtmxFormsConfig,
    ids: &'c dyn IdGenerator,
}

impl<'c> Decorator<'c> {
    pub fn new(config: &'c HtmxFormsConfig, ids: &'c dyn IdGenerator) -> Self {
        Decorator { config, ids }
    }

    /// The identifier for this render: echoed from the request when the
    /// client sent one, otherwise freshly generated.
    pub fn resolve_id(&self, ctx: &RequestContext) -> String {
        ctx.correlation_id()
            .map(str::to_string)
            .unwrap_or_else(|| self.ids.generate())
    }

    /// Render argument first, then the request header.
    pub fn resolve_indicator(&self, options: &DecorateOptions, ctx: &RequestContext) -> Option<String> {
        options
            .indicator
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| ctx.indicator())
            .map(str::to_string)
    }

    /// Decorate rendered form markup. Never fails: markup that cannot be
    /// decorated comes back unchanged as [`Decorated::Skipped`].
    pub fn decorate(&self, markup: &str, ctx: &RequestContext, options: &DecorateOptions) -> Decorated {
        let id = self.resolve_id(ctx);
        self.decorate_with_id(markup, &id, ctx, options)
    }

    pub fn decorate_with_id(
        &self,
        markup: &str,
        id: &str,
        ctx: &RequestContext,
        options: &DecorateOptions,
    ) -> Decorated {
        match self.try_decorate_with_id(markup, id, ctx, options) {
            Ok(form) => Decorated::Applied(form),
            Err(e) => {
                eprintln!("Warning: form left undecorated: {}", e);
                Decorated::Skipped {
                    markup: markup.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Strict variant of [`decorate_with_id`](Self::decorate_with_id).
    pub fn try_decorate_with_id(
        &self,
        markup: &str,
        id: &str,
        ctx: &RequestContext,
        options: &DecorateOptions,
    ) -> Result<DecoratedForm, HtmxError> {
        if !is_valid_id(id) {
            return Err(HtmxError::InvalidId(id.to_string()));
        }

        let indicator = self.resolve_indicator(options, ctx);
        let html = self.render_markup(markup, id, indicator.as_deref(), &options.extra_attributes)?;

        Ok(DecoratedForm {
            id: id.to_string(),
            indicator,
            html,
        })
    }

    fn render_markup(
        &self,
        markup: &str,
        id: &str,
        indicator: Option<&str>,
        extra: &[String],
    ) -> Result<String, HtmxError> {
        let content = unwrap_decoration(markup);

        let form = match find_form_tag(content) {
            Some(tag) => {
                let attributes = build_attributes(
                    id,
                    indicator,
                    extra,
                    &self.config.headers,
                    &self.config.markup,
                )?;
                rewrite_form_tag(content, &tag, attributes)?
            }
            // Success messages still need a wrapper to be swapped in
            None if is_formless_block(content) => content.to_string(),
            None => return Err(HtmxError::MissingPostMethod),
        };

        let mut html = String::with_capacity(form.len() + 128);
        html.push_str(&wrapper_open(id));
        html.push_str(&form);
        html.push_str("</div>");

        if self.config.markup.output_mode == OutputMode::MarkupRegions {
            html.push_str(&sentinel(id));
        }

        Ok(html)
    }
}

/// If `markup` is already a decoration wrapper (optionally followed by its
/// sentinel), return the wrapper's contents. Otherwise return it as is.
pub fn unwrap_decoration(markup: &str) -> &str {
    let trimmed = markup.trim();
    let Some(open) = Scanner::new(trimmed).next() else {
        return markup;
    };

    if open.start != 0 || !open.is_start("div") || !open.has_attribute(WRAPPER_MARKER) {
        return markup;
    }

    let Some((close_start, close_end)) = matching_close(trimmed, "div", open.end) else {
        return markup;
    };

    let rest = trimmed[close_end..].trim();
    let only_sentinel = rest.is_empty() || is_sentinel_element(rest);

    if only_sentinel {
        &trimmed[open.end..close_start]
    } else {
        markup
    }
}

fn is_sentinel_element(markup: &str) -> bool {
    let mut tokens = Scanner::new(markup);
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(open), Some(close), None) => {
            open.start == 0
                && open.is_start("div")
                && open.has_attribute(SENTINEL_MARKER)
                && close.is_end("div")
                && close.end == markup.len()
        }
        _ => false,
    }
}

/// First `<form>` start tag that is either undecorated (`method="post"`)
/// or carries a previous decoration (`hx-post`).
fn find_form_tag(markup: &str) -> Option<Token<'_>> {
    Scanner::new(markup).find(|t| {
        t.is_start("form")
            && (is_post_method(t) || t.has_attribute("hx-post"))
    })
}

/// A form engine block rendered without a form, such as the message shown
/// after a successful submission.
fn is_formless_block(markup: &str) -> bool {
    let mut recognized = false;
    for token in Scanner::new(markup) {
        if token.is_start("form") {
            return false;
        }
        if is_form_terminator(&token)
            || (token.is_start("div") && token.attr_value("id") == Some("FormBuilderSubmitted"))
        {
            recognized = true;
        }
    }
    recognized
}

fn is_post_method(tag: &Token<'_>) -> bool {
    tag.attr_value("method")
        .is_some_and(|m| m.trim().eq_ignore_ascii_case("post"))
}

/// Replace `method="post"` (or the previously generated attributes) on the
/// form start tag with `attributes`.
fn rewrite_form_tag(markup: &str, tag: &Token<'_>, attributes: Vec<String>) -> Result<String, HtmxError> {
    // Spans to cut from the tag, in source order
    let mut cuts: Vec<(usize, usize)> = tag
        .attributes()
        .iter()
        .filter(|a| {
            let generated = GENERATED_ATTRIBUTES.iter().any(|g| a.name == *g);
            let post = a.name == "method" && a.value.is_some_and(|v| v.trim().eq_ignore_ascii_case("post"));
            generated || post
        })
        .map(|a| (a.start, a.end))
        .collect();

    if cuts.is_empty() {
        return Err(HtmxError::MissingPostMethod);
    }
    cuts.sort_unstable();

    // Attributes that stay on the tag; an identical generated one would be a duplicate
    let kept: Vec<&str> = tag
        .attributes()
        .iter()
        .filter(|a| !cuts.contains(&(a.start, a.end)))
        .map(|a| &markup[a.start..a.end])
        .collect();

    let insert = attributes
        .into_iter()
        .filter(|a| !kept.contains(&a.as_str()))
        .collect::<Vec<_>>()
        .join(" ");

    let mut out = String::with_capacity(markup.len() + insert.len());
    let mut cursor = 0;

    for (i, (start, end)) in cuts.iter().enumerate() {
        out.push_str(&markup[cursor..*start]);
        if i == 0 {
            out.push_str(&insert);
        } else {
            // Drop the whitespace that separated the removed attribute
            while out.ends_with(char::is_whitespace) {
                out.pop();
            }
        }
        cursor = *end;
    }
    out.push_str(&markup[cursor..]);

    Ok(out)
}
