use std::sync::Arc;

use formbuilder_htmx::config::{HtmxFormsConfig, OutputMode};
use formbuilder_htmx::error::HtmxError;
use formbuilder_htmx::intercept::forms::HtmxForms;
use formbuilder_htmx::intercept::hooks::{FormEngine, PostRenderHook, RenderPipeline, TemplateVars};
use formbuilder_htmx::intercept::interceptor::{InterceptState, Outcome};
use formbuilder_htmx::markup::decorator::FixedId;
use formbuilder_htmx::request::context::RequestContext;
use formbuilder_htmx::request::signature::RequestSignature;
use formbuilder_htmx::trace::logger::TraceLogger;
use formbuilder_htmx::trace::trace::fingerprint;

mod common;
use crate::common::utils::{background_request, fixture, page, temp_path};

// =========================================================================
// Test engines
// =========================================================================

/// Returns a fixture, ignoring the request.
struct FixtureEngine;

impl FormEngine for FixtureEngine {
    fn render(&self, form_name: &str, _vars: &TemplateVars, _ctx: &RequestContext) -> Result<String, HtmxError> {
        Ok(fixture(&format!("{}_form.html", form_name)))
    }
}

/// Renders the success block for the submitted form, the form otherwise.
struct SubmittingEngine;

impl FormEngine for SubmittingEngine {
    fn render(&self, form_name: &str, _vars: &TemplateVars, ctx: &RequestContext) -> Result<String, HtmxError> {
        if ctx.submitted_form_name() == Some(form_name) {
            Ok(fixture(&format!("{}_submitted.html", form_name)))
        } else {
            Ok(fixture(&format!("{}_form.html", form_name)))
        }
    }
}

const GET_FORM: &str = "<form method=\"get\" action=\"/search\"><input name=\"q\"></form>";

struct StaticEngine(&'static str);

impl FormEngine for StaticEngine {
    fn render(&self, _form_name: &str, _vars: &TemplateVars, _ctx: &RequestContext) -> Result<String, HtmxError> {
        Ok(self.0.to_string())
    }
}

struct FailingEngine;

impl FormEngine for FailingEngine {
    fn render(&self, form_name: &str, _vars: &TemplateVars, _ctx: &RequestContext) -> Result<String, HtmxError> {
        Err(HtmxError::FormEngine {
            form: form_name.to_string(),
            message: "no such form".to_string(),
        })
    }
}

fn forms(config: HtmxFormsConfig, id: &str) -> HtmxForms {
    HtmxForms::new(config).with_id_generator(FixedId(id.to_string()))
}

/// Render both forms into a page the way a host template would.
fn render_page(forms: &HtmxForms, engine: &dyn FormEngine, ctx: &RequestContext) -> String {
    let vars = TemplateVars::new();
    let newsletter = forms.render(engine, ctx, "newsletter", &vars, None, &[]).unwrap();
    let contact = forms
        .render(engine, ctx, "contact", &vars, Some("#spinner"), &[])
        .unwrap();
    page(&format!("{}\n<aside>sidebar</aside>\n{}", newsletter, contact))
}

// =========================================================================
// Render-time decoration
// =========================================================================

#[test]
fn render_decorates_engine_output() {
    let forms = forms(HtmxFormsConfig::default(), "fb-htmx-R1");
    let rendered = forms
        .render(&FixtureEngine, &RequestContext::get(), "contact", &TemplateVars::new(), None, &[])
        .unwrap();

    assert_eq!(rendered.form_name, "contact");
    assert_eq!(rendered.id.as_deref(), Some("fb-htmx-R1"));
    assert!(rendered.html.starts_with("<div id='fb-htmx-R1' data-formbuilder-htmx>"));
    assert_eq!(rendered.to_string(), rendered.html);
}

#[test]
fn render_propagates_engine_errors() {
    let forms = forms(HtmxFormsConfig::default(), "fb-htmx-R1");
    let err = forms
        .render(&FailingEngine, &RequestContext::get(), "missing", &TemplateVars::new(), None, &[])
        .unwrap_err();
    assert!(matches!(err, HtmxError::FormEngine { .. }));
    assert!(err.to_string().contains("missing"));
}

#[test]
fn render_wraps_success_block_without_a_form() {
    let forms = forms(HtmxFormsConfig::default(), "fb-htmx-R1");
    let ctx = RequestContext::post().with_field("_InputfieldForm", "contact");
    let rendered = forms
        .render(&SubmittingEngine, &ctx, "contact", &TemplateVars::new(), None, &[])
        .unwrap();
    assert_eq!(rendered.id.as_deref(), Some("fb-htmx-R1"));
    assert_eq!(
        rendered.html,
        format!("<div id='fb-htmx-R1' data-formbuilder-htmx>{}</div>", fixture("contact_submitted.html"))
    );
}

#[test]
fn render_without_post_form_serves_engine_markup() {
    let forms = forms(HtmxFormsConfig::default(), "fb-htmx-R1");
    let rendered = forms
        .render(&StaticEngine(GET_FORM), &RequestContext::get(), "search", &TemplateVars::new(), None, &[])
        .unwrap();
    assert_eq!(rendered.id, None);
    assert_eq!(rendered.html, GET_FORM);
}

// =========================================================================
// Post-render interception
// =========================================================================

#[test]
fn ordinary_requests_stay_idle() {
    let forms = forms(HtmxFormsConfig::default(), "fb-htmx-I1");
    let ctx = RequestContext::get();
    let full = render_page(&forms, &FixtureEngine, &ctx);

    let interception = forms.intercept(full.clone(), &ctx);
    assert_eq!(interception.state, InterceptState::Idle);
    assert_eq!(interception.outcome, Outcome::Idle);
    assert_eq!(interception.signature, RequestSignature::Initial);
    assert_eq!(interception.body, full);
}

#[test]
fn background_submission_serves_only_the_submitted_form() {
    let forms = forms(HtmxFormsConfig::default(), "unused");
    let ctx = background_request("fb-htmx-SUB", "contact", "contact:7f3a1c:1001")
        .with_header("Fb-Htmx-Indicator", "#spinner");
    let full = render_page(&forms, &FixtureEngine, &ctx);

    let interception = forms.intercept(full, &ctx);
    assert_eq!(interception.state, InterceptState::Intercepted);
    assert_eq!(interception.outcome, Outcome::FragmentServed);

    let body = &interception.body;
    assert!(body.starts_with("<div id='fb-htmx-SUB' data-formbuilder-htmx>"), "{}", body);
    assert!(body.contains("FormBuilder-contact"));
    assert!(!body.contains("FormBuilder-newsletter"));
    assert!(!body.contains("Site header"));
    assert!(!body.contains("sidebar"));
    assert!(body.contains("hx-indicator='#spinner'"));
    assert!(!body.contains("method=\"post\""));
}

#[test]
fn intercepted_fragment_matches_the_rendered_form() {
    let forms = forms(HtmxFormsConfig::default(), "unused");
    let ctx = background_request("fb-htmx-SUB", "contact", "contact:7f3a1c:1001");
    let rendered = forms
        .render(&FixtureEngine, &ctx, "contact", &TemplateVars::new(), None, &[])
        .unwrap();

    let interception = forms.intercept(page(&rendered.html), &ctx);
    assert_eq!(interception.body, rendered.html, "Re-decoration changes nothing");
}

#[test]
fn success_block_is_served_as_found() {
    let forms = forms(HtmxFormsConfig::default(), "unused");
    let ctx = background_request("fb-htmx-OK", "contact", "contact:7f3a1c:1001");
    let full = render_page(&forms, &SubmittingEngine, &ctx);

    let interception = forms.intercept(full, &ctx);
    assert_eq!(interception.outcome, Outcome::FragmentServed);
    assert!(interception.body.contains("FormBuilderSubmitted"));
    assert!(!interception.body.contains("newsletter"));
}

#[test]
fn extraction_miss_serves_the_full_page() {
    let forms = forms(HtmxFormsConfig::default(), "unused");
    let ctx = background_request("fb-htmx-GONE", "contact", "contact:7f3a1c:1001");
    let full = page("<p>The template did not render the form</p>");

    let interception = forms.intercept(full.clone(), &ctx);
    assert_eq!(interception.state, InterceptState::Intercepted);
    assert_eq!(interception.outcome, Outcome::ExtractionMiss);
    assert_eq!(interception.body, full, "Never an empty body");
}

#[test]
fn inner_swap_mode_serves_wrapper_contents() {
    let mut config = HtmxFormsConfig::default();
    config.markup.swap = "innerHTML".into();
    let forms = forms(config, "unused");
    let ctx = background_request("fb-htmx-IN", "contact", "contact:7f3a1c:1001");
    let full = render_page(&forms, &FixtureEngine, &ctx);

    let body = forms.intercept(full, &ctx).body;
    assert!(!body.contains("data-formbuilder-htmx"), "No nested wrapper: {}", body);
    assert!(body.trim_start().starts_with("<div class=\"FormBuilder FormBuilder-contact"));
    assert!(body.contains("hx-swap='innerHTML'"));
}

#[test]
fn markup_regions_round_trip_with_stripped_comments() {
    let mut config = HtmxFormsConfig::default();
    config.markup.output_mode = OutputMode::MarkupRegions;
    let forms = forms(config, "unused");
    let ctx = background_request("fb-htmx-MR", "contact", "contact:7f3a1c:1001");

    // The host drops comments while assembling regions
    let full = render_page(&forms, &FixtureEngine, &ctx).replace("<!--/FormBuilder-->", "");

    let interception = forms.intercept(full, &ctx);
    assert_eq!(interception.outcome, Outcome::FragmentServed);
    assert!(interception.body.contains("FormBuilder-contact"));
    assert!(interception.body.ends_with("<div data-formbuilder-htmx-end='fb-htmx-MR' hidden></div>"));
}

#[test]
fn unsafe_header_id_never_reaches_the_markup() {
    let forms = forms(HtmxFormsConfig::default(), "fb-htmx-FRESH");
    let ctx = background_request(
        "fb-htmx-a'><script>alert(1)</script><div x='",
        "contact",
        "contact:7f3a1c:1001",
    );
    let full = render_page(&forms, &FixtureEngine, &ctx);
    assert!(!full.contains("<script>"), "Header id is not echoed");
    assert_eq!(full.matches("<div id='fb-htmx-FRESH' data-formbuilder-htmx>").count(), 2);

    let interception = forms.intercept(full.clone(), &ctx);
    assert_eq!(interception.signature, RequestSignature::Other, "Refused id counts as absent");
    assert_eq!(interception.state, InterceptState::Idle);
    assert_eq!(interception.body, full);
}

#[test]
fn configured_names_apply_to_plain_requests() {
    let mut config = HtmxFormsConfig::default();
    config.headers.id = "X-Form-Id".into();
    config.fields.submit_key = "_key".into();
    let forms = forms(config, "unused");

    // Built without with_names: the facade applies its own configuration
    let ctx = RequestContext::post()
        .with_field("_key", "contact:7f3a1c:1001")
        .with_field("_InputfieldForm", "contact")
        .with_header("HX-Request", "true")
        .with_header("X-Form-Id", "fb-htmx-CUSTOM");
    let full = render_page(&forms, &FixtureEngine, &ctx);
    assert!(full.contains("<div id='fb-htmx-CUSTOM' data-formbuilder-htmx>"));
    assert!(full.contains("\"X-Form-Id\":\"fb-htmx-CUSTOM\""));

    let interception = forms.intercept(full, &ctx);
    assert_eq!(interception.signature, RequestSignature::BackgroundSubmission);
    assert_eq!(interception.outcome, Outcome::FragmentServed);
    assert!(interception.body.contains("FormBuilder-contact"));
    assert!(!interception.body.contains("FormBuilder-newsletter"));
}

// =========================================================================
// Hook registration
// =========================================================================

#[test]
fn installing_twice_registers_once() {
    let pipeline = RenderPipeline::new();
    let forms = Arc::new(forms(HtmxFormsConfig::default(), "unused"));

    assert!(forms.install(&pipeline));
    assert!(!forms.install(&pipeline), "Second install is a no-op");
    assert_eq!(pipeline.len(), 1);

    let other = Arc::new(HtmxForms::new(HtmxFormsConfig::default()));
    assert!(!other.install(&pipeline), "Same hook name from another instance");
}

#[test]
fn pipeline_runs_hook_once_per_request() {
    let pipeline = RenderPipeline::new();
    let forms = Arc::new(forms(HtmxFormsConfig::default(), "unused"));
    forms.install(&pipeline);
    forms.install(&pipeline);

    let ctx = background_request("fb-htmx-P1", "contact", "contact:7f3a1c:1001");
    let full = render_page(&forms, &FixtureEngine, &ctx);
    let expected = forms.intercept(full.clone(), &ctx).body;

    assert_eq!(pipeline.finish(full, &ctx), expected);
}

#[test]
fn concurrent_requests_do_not_interfere() {
    let pipeline = RenderPipeline::new();
    let forms = Arc::new(HtmxForms::new(HtmxFormsConfig::default()));
    forms.install(&pipeline);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pipeline = &pipeline;
                let forms = &forms;
                scope.spawn(move || {
                    let id = format!("fb-htmx-T{}", i);
                    let ctx = background_request(&id, "contact", "contact:7f3a1c:1001");
                    let full = render_page(forms, &FixtureEngine, &ctx);
                    (id, pipeline.finish(full, &ctx))
                })
            })
            .collect();

        for handle in handles {
            let (id, body) = handle.join().unwrap();
            assert!(body.starts_with(&format!("<div id='{}' data-formbuilder-htmx>", id)));
            assert_eq!(body.matches("data-formbuilder-htmx>").count(), 1);
        }
    });
}

#[test]
fn hook_reports_its_name() {
    let forms = HtmxForms::new(HtmxFormsConfig::default());
    assert_eq!(PostRenderHook::name(&forms), "formbuilder-htmx");
}

// =========================================================================
// Trace output
// =========================================================================

#[test]
fn trace_records_interception_outcomes() {
    let path = temp_path("trace.jsonl");
    let forms = forms(HtmxFormsConfig::default(), "unused")
        .with_tracer(TraceLogger::new(path.to_str().unwrap()));

    let ctx = background_request("fb-htmx-TR", "contact", "contact:7f3a1c:1001");
    let full = render_page(&forms, &FixtureEngine, &ctx);
    forms.intercept(full, &ctx);
    forms.intercept(page("<p>nothing</p>"), &ctx);

    let lines: Vec<serde_json::Value> = std::fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let _ = std::fs::remove_file(&path);

    let intercepts: Vec<_> = lines.iter().filter(|e| e["stage"] == "intercept").collect();
    assert_eq!(intercepts.len(), 2);
    assert_eq!(intercepts[0]["outcome"], "fragment_served");
    assert_eq!(intercepts[0]["correlation_id"], "fb-htmx-TR");
    assert_eq!(intercepts[0]["signature"], "background_submission");
    assert_eq!(intercepts[0]["candidates"], 2);
    assert_eq!(intercepts[0]["fragment_sha1"].as_str().unwrap().len(), 40);
    assert_ne!(intercepts[0]["fragment_sha1"].as_str().unwrap(), fingerprint(""));
    assert_eq!(intercepts[1]["outcome"], "extraction_miss");

    let decorates = lines.iter().filter(|e| e["stage"] == "decorate").count();
    assert_eq!(decorates, 2, "One event per rendered form");
}

#[test]
fn fingerprint_is_sha1_hex() {
    assert_eq!(fingerprint(""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    assert_eq!(fingerprint("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
}
