use serde::Serialize;

use crate::config::HtmxFormsConfig;
use crate::markup::attributes::swaps_inner;
use crate::markup::decorator::{DecorateOptions, Decorator, IdGenerator, unwrap_decoration};
use crate::markup::extractor::{MatchTokens, extract_detailed};
use crate::request::context::RequestContext;
use crate::request::signature::{RequestSignature, classify};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{Stage, TraceEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterceptState {
    Idle,
    Intercepted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Not a background submission; page served as rendered
    Idle,
    /// Page replaced by the submitted form's fragment
    FragmentServed,
    /// Background submission, but no fragment found; page served as rendered
    ExtractionMiss,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interception {
    pub state: InterceptState,
    pub outcome: Outcome,
    pub signature: RequestSignature,
    pub body: String,
}

/// Runs once per request after the host has rendered the full page.
pub struct Interceptor<'c> {
    config: &'c HtmxFormsConfig,
    ids: &'c dyn IdGenerator,
    tracer: &'c TraceLogger,
}

impl<'c> Interceptor<'c> {
    pub fn new(config: &'c HtmxFormsConfig, ids: &'c dyn IdGenerator, tracer: &'c TraceLogger) -> Self {
        Interceptor { config, ids, tracer }
    }

    pub fn after_render(&self, page: String, ctx: &RequestContext) -> Interception {
        let signature = classify(ctx);

        let id = match (signature, ctx.correlation_id()) {
            (RequestSignature::BackgroundSubmission, Some(id)) => id,
            _ => {
                return Interception {
                    state: InterceptState::Idle,
                    outcome: Outcome::Idle,
                    signature,
                    body: page,
                };
            }
        };

        let tokens = MatchTokens {
            submit_key: ctx.submit_key(),
            form_name: ctx.submitted_form_name(),
        };
        let extraction = extract_detailed(&page, id, tokens);

        let event = TraceEvent::now(Stage::Intercept)
            .with_signature(signature)
            .with_id(Some(id))
            .with_form(tokens.form_name)
            .with_candidates(extraction.candidates);

        let Some(fragment) = extraction.fragment else {
            eprintln!(
                "Warning: no fragment for '{}' ({} candidates, {} without end marker); serving full page",
                id, extraction.candidates, extraction.rejected
            );
            self.tracer.log(&event.with_outcome("extraction_miss"));
            return Interception {
                state: InterceptState::Intercepted,
                outcome: Outcome::ExtractionMiss,
                signature,
                body: page,
            };
        };

        // Refresh the decoration for the next round trip from this fragment
        let decorator = Decorator::new(self.config, self.ids);
        let inner_swap = swaps_inner(&self.config.markup.swap);

        let body = match decorator.try_decorate_with_id(fragment.html(), id, ctx, &DecorateOptions::default()) {
            Ok(form) if inner_swap => unwrap_decoration(&form.html).to_string(),
            Ok(form) => form.html,
            Err(e) => {
                eprintln!("Warning: fragment '{}' served undecorated: {}", id, e);
                if inner_swap {
                    fragment.inner().to_string()
                } else {
                    fragment.html().to_string()
                }
            }
        };

        self.tracer
            .log(&event.with_outcome("fragment_served").with_fragment(&body));

        Interception {
            state: InterceptState::Intercepted,
            outcome: Outcome::FragmentServed,
            signature,
            body,
        }
    }
}
