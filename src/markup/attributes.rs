use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::config::{HeaderNames, MarkupConfig};
use crate::error::HtmxError;

/// Attribute names the decorator owns on the `<form>` start tag. Any of
/// these already present are replaced on re-decoration.
pub const GENERATED_ATTRIBUTES: &[&str] = &[
    "hx-post",
    "hx-headers",
    "hx-disabled-elt",
    "hx-target",
    "hx-swap",
    "hx-indicator",
];

/// Payload of the `hx-headers` attribute. htmx echoes these back as request
/// headers when the form is submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct HxHeaders<'a> {
    pub id: &'a str,
    pub indicator: Option<&'a str>,
}

impl HxHeaders<'_> {
    /// Compact JSON object keyed by the configured header names. A missing
    /// indicator is written as `null`.
    pub fn to_json(&self, names: &HeaderNames) -> Result<String, HtmxError> {
        let mut map = Map::new();
        map.insert(names.id.clone(), Value::String(self.id.to_string()));
        map.insert(
            names.indicator.clone(),
            self.indicator
                .map(|s| Value::String(s.to_string()))
                .unwrap_or(Value::Null),
        );

        serde_json::to_string(&Value::Object(map)).map_err(|source| HtmxError::Json {
            context: "hx-headers payload".to_string(),
            source,
        })
    }
}

/// Escape a value for use inside a single-quoted HTML attribute.
pub fn escape_single_quoted(value: &str) -> String {
    value.replace('&', "&amp;").replace('\'', "&#39;")
}

/// Build the attribute strings that replace `method="post"`.
///
/// Order is fixed; caller extras follow the generated set and duplicates
/// are dropped keeping the first occurrence.
pub fn build_attributes(
    id: &str,
    indicator: Option<&str>,
    extra: &[String],
    names: &HeaderNames,
    markup: &MarkupConfig,
) -> Result<Vec<String>, HtmxError> {
    let headers = HxHeaders { id, indicator }.to_json(names)?;

    let mut generated = vec![
        "hx-post".to_string(),
        format!("hx-headers='{}'", escape_single_quoted(&headers)),
        format!(
            "hx-disabled-elt='{}'",
            escape_single_quoted(&markup.disabled_element)
        ),
        format!("hx-target='#{}'", escape_single_quoted(id)),
        format!("hx-swap='{}'", escape_single_quoted(&markup.swap)),
    ];

    if let Some(selector) = indicator {
        generated.push(format!("hx-indicator='{}'", escape_single_quoted(selector)));
    }

    generated.extend(extra.iter().map(|a| a.trim().to_string()));

    Ok(dedupe(generated))
}

fn dedupe(attributes: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    attributes
        .into_iter()
        .filter(|a| !a.is_empty())
        .filter(|a| seen.insert(a.clone()))
        .collect()
}

/// Whether the response should be the wrapper's contents rather than the
/// wrapper itself. With `innerHTML` the wrapper stays in the page and only
/// its children are replaced.
pub fn swaps_inner(swap: &str) -> bool {
    swap.split_whitespace()
        .next()
        .is_some_and(|mode| mode.eq_ignore_ascii_case("innerHTML"))
}
