use std::borrow::Cow;
use std::sync::Arc;

use crate::config::HtmxFormsConfig;
use crate::error::HtmxError;
use crate::intercept::hooks::{FormEngine, PostRenderHook, RenderPipeline, TemplateVars};
use crate::intercept::interceptor::{Interception, Interceptor};
use crate::markup::decorator::{DecorateOptions, Decorated, Decorator, IdGenerator, RandomIdGenerator};
use crate::request::context::RequestContext;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{Stage, TraceEvent};

pub const HOOK_NAME: &str = "formbuilder-htmx";

/// A form as returned to the page template.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedForm {
    pub form_name: String,
    /// `None` when the markup could not be decorated and is served as rendered
    pub id: Option<String>,
    pub html: String,
}

impl std::fmt::Display for RenderedForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.html)
    }
}

/// Entry point for hosts: renders decorated forms and swaps the page for
/// the submitted form's fragment on background submissions.
///
/// Holds configuration only. Request data arrives per call through
/// [`RequestContext`], so one instance serves all workers.
pub struct HtmxForms {
    config: HtmxFormsConfig,
    ids: Box<dyn IdGenerator>,
    tracer: TraceLogger,
}

impl HtmxForms {
    pub fn new(config: HtmxFormsConfig) -> Self {
        let ids = Box::new(RandomIdGenerator::new(&config.ids));
        let tracer = TraceLogger::from_config(config.trace_file.as_deref());
        HtmxForms { config, ids, tracer }
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn config(&self) -> &HtmxFormsConfig {
        &self.config
    }

    pub fn decorator(&self) -> Decorator<'_> {
        Decorator::new(&self.config, self.ids.as_ref())
    }

    pub fn interceptor(&self) -> Interceptor<'_> {
        Interceptor::new(&self.config, self.ids.as_ref(), &self.tracer)
    }

    /// Render `form_name` through the engine and decorate the result.
    ///
    /// Engine failures propagate; decoration failures do not, the engine's
    /// markup is returned as is.
    pub fn render(
        &self,
        engine: &dyn FormEngine,
        ctx: &RequestContext,
        form_name: &str,
        vars: &TemplateVars,
        indicator: Option<&str>,
        extra_attributes: &[String],
    ) -> Result<RenderedForm, HtmxError> {
        let markup = engine.render(form_name, vars, ctx)?;
        let ctx = self.scoped(ctx);

        let options = DecorateOptions {
            indicator: indicator.map(str::to_string),
            extra_attributes: extra_attributes.to_vec(),
        };
        let id = self.decorator().resolve_id(&ctx);
        let decorated = self.decorate_with_id(&markup, &id, &ctx, &options, Some(form_name));

        Ok(RenderedForm {
            form_name: form_name.to_string(),
            id: decorated.id().map(str::to_string),
            html: decorated.into_html(),
        })
    }

    /// Decorate already-rendered markup under a known identifier.
    pub fn decorate_with_id(
        &self,
        markup: &str,
        id: &str,
        ctx: &RequestContext,
        options: &DecorateOptions,
        form_name: Option<&str>,
    ) -> Decorated {
        let ctx = self.scoped(ctx);
        let decorated = self.decorator().decorate_with_id(markup, id, &ctx, options);

        let event = TraceEvent::now(Stage::Decorate)
            .with_id(Some(id))
            .with_form(form_name);
        let event = match &decorated {
            Decorated::Applied(form) => event.with_outcome("decorated").with_fragment(&form.html),
            Decorated::Skipped { reason, .. } => event.with_outcome(format!("skipped: {}", reason)),
        };
        self.tracer.log(&event);

        decorated
    }

    pub fn intercept(&self, page: String, ctx: &RequestContext) -> Interception {
        self.interceptor().after_render(page, &self.scoped(ctx))
    }

    /// `ctx` read with this instance's configured header and field names.
    fn scoped<'r>(&self, ctx: &'r RequestContext) -> Cow<'r, RequestContext> {
        if ctx.header_names() == &self.config.headers && ctx.field_names() == &self.config.fields {
            Cow::Borrowed(ctx)
        } else {
            Cow::Owned(
                ctx.clone()
                    .with_names(&self.config.headers, &self.config.fields),
            )
        }
    }

    /// Register the post-render hook. Installing twice is a no-op and
    /// returns `false`.
    pub fn install(self: &Arc<Self>, pipeline: &RenderPipeline) -> bool {
        pipeline.register(Arc::clone(self) as Arc<dyn PostRenderHook>)
    }
}

impl PostRenderHook for HtmxForms {
    fn name(&self) -> &str {
        HOOK_NAME
    }

    fn after_render(&self, page: String, ctx: &RequestContext) -> String {
        self.intercept(page, ctx).body
    }
}
