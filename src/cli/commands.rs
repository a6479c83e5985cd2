use std::io::Read;

use crate::config::{HtmxFormsConfig, OutputMode};
use crate::error::HtmxError;
use crate::intercept::forms::HtmxForms;
use crate::intercept::interceptor::Interception;
use crate::markup::decorator::{DecorateOptions, Decorated};
use crate::markup::extractor::{Extraction, MatchTokens, extract_detailed};
use crate::request::context::RequestContext;
use crate::request::signature::{RequestSignature, SignatureCheck, classify};
use crate::trace::logger::TraceLogger;

/// Read a file, or stdin for `-`.
pub fn read_input(path: &str) -> Result<String, HtmxError> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| HtmxError::Io {
                path: "<stdin>".to_string(),
                source,
            })?;
        return Ok(buf);
    }

    std::fs::read_to_string(path).map_err(|source| HtmxError::Io {
        path: path.to_string(),
        source,
    })
}

fn request(config: &HtmxFormsConfig, method: &str, headers: &[String], fields: &[String]) -> Result<RequestContext, HtmxError> {
    Ok(RequestContext::from_raw(method, headers, fields)?.with_names(&config.headers, &config.fields))
}

// ============================================================================
// decorate subcommand
// ============================================================================

pub struct DecorateArgs<'a> {
    pub markup: &'a str,
    pub id: Option<&'a str>,
    pub indicator: Option<&'a str>,
    pub attributes: &'a [String],
    pub markup_regions: bool,
    pub headers: &'a [String],
}

pub fn cmd_decorate(
    config: &HtmxFormsConfig,
    args: DecorateArgs<'_>,
    tracer: TraceLogger,
    verbose: u8,
) -> Result<Decorated, HtmxError> {
    let mut config = config.clone();
    if args.markup_regions {
        config.markup.output_mode = OutputMode::MarkupRegions;
    }

    let ctx = request(&config, "GET", args.headers, &[])?;
    let forms = HtmxForms::new(config).with_tracer(tracer);

    let options = DecorateOptions {
        indicator: args.indicator.map(str::to_string),
        extra_attributes: args.attributes.to_vec(),
    };

    let id = match args.id {
        Some(id) => id.to_string(),
        None => forms.decorator().resolve_id(&ctx),
    };

    if verbose > 0 {
        eprintln!("Decorating with id '{}'", id);
    }

    Ok(forms.decorate_with_id(args.markup, &id, &ctx, &options, None))
}

// ============================================================================
// classify subcommand
// ============================================================================

pub fn cmd_classify(
    config: &HtmxFormsConfig,
    method: &str,
    headers: &[String],
    fields: &[String],
) -> Result<(RequestSignature, SignatureCheck), HtmxError> {
    let ctx = request(config, method, headers, fields)?;
    Ok((classify(&ctx), SignatureCheck::inspect(&ctx)))
}

pub fn format_classification(signature: RequestSignature, check: &SignatureCheck) -> String {
    let mark = |ok: bool| if ok { "\u{2713}" } else { "\u{2717}" };
    let mut out = format!("{:?}\n", signature);
    out.push_str(&format!("  {} POST method\n", mark(check.is_post)));
    out.push_str(&format!("  {} submit key field\n", mark(check.has_submit_key)));
    out.push_str(&format!("  {} form name field\n", mark(check.has_form_name)));
    out.push_str(&format!("  {} htmx request header\n", mark(check.is_htmx_request)));
    out.push_str(&format!("  {} correlation id header\n", mark(check.has_correlation_id)));
    out
}

// ============================================================================
// extract subcommand
// ============================================================================

pub fn cmd_extract(page: &str, id: &str, submit_key: Option<&str>, form: Option<&str>) -> Extraction {
    extract_detailed(
        page,
        id,
        MatchTokens {
            submit_key,
            form_name: form,
        },
    )
}

// ============================================================================
// intercept subcommand
// ============================================================================

pub fn cmd_intercept(
    config: &HtmxFormsConfig,
    page: String,
    method: &str,
    headers: &[String],
    fields: &[String],
    tracer: TraceLogger,
) -> Result<Interception, HtmxError> {
    let ctx = request(config, method, headers, fields)?;

    let forms = HtmxForms::new(config.clone()).with_tracer(tracer);

    Ok(forms.intercept(page, &ctx))
}
