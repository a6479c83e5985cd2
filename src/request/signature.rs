use serde::Serialize;

use crate::request::context::RequestContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestSignature {
    /// Page load with no identifier to echo; forms get fresh identifiers
    Initial,
    /// Async post of a previously decorated form
    BackgroundSubmission,
    /// Anything else: plain form posts, async requests without form fields
    Other,
}

/// Per-condition breakdown of a classification, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SignatureCheck {
    pub is_post: bool,
    pub has_submit_key: bool,
    pub has_form_name: bool,
    pub is_htmx_request: bool,
    pub has_correlation_id: bool,
}

impl SignatureCheck {
    pub fn inspect(ctx: &RequestContext) -> Self {
        SignatureCheck {
            is_post: ctx.is_post(),
            has_submit_key: ctx.has_field(&ctx.field_names().submit_key),
            has_form_name: ctx.has_field(&ctx.field_names().form_name),
            is_htmx_request: ctx.is_htmx_request(),
            has_correlation_id: ctx.correlation_id().is_some(),
        }
    }

    pub fn all_met(&self) -> bool {
        self.is_post
            && self.has_submit_key
            && self.has_form_name
            && self.is_htmx_request
            && self.has_correlation_id
    }
}

/// Classify the current request.
///
/// Conditions are checked cheapest first and stop at the first miss.
pub fn classify(ctx: &RequestContext) -> RequestSignature {
    let names = ctx.field_names();

    let background = ctx.is_post()
        && ctx.has_field(&names.submit_key)
        && ctx.has_field(&names.form_name)
        && ctx.is_htmx_request()
        && ctx.correlation_id().is_some();

    if background {
        return RequestSignature::BackgroundSubmission;
    }

    let form_post = ctx.is_post() && ctx.has_field(&names.form_name);
    if ctx.correlation_id().is_none() && !form_post {
        RequestSignature::Initial
    } else {
        RequestSignature::Other
    }
}
