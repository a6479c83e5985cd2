use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::error::HtmxError;
use crate::request::context::RequestContext;

/// Values handed to the form engine alongside the form name.
pub type TemplateVars = BTreeMap<String, serde_json::Value>;

// ============================================================================
// Host collaborators
// ============================================================================

/// The external form engine: processes posted values and renders a form.
pub trait FormEngine {
    fn render(&self, form_name: &str, vars: &TemplateVars, ctx: &RequestContext) -> Result<String, HtmxError>;
}

/// A transform the host applies to every full-page render.
pub trait PostRenderHook: Send + Sync {
    /// Registration key; a pipeline holds at most one hook per name.
    fn name(&self) -> &str;

    fn after_render(&self, page: String, ctx: &RequestContext) -> String;
}

// ============================================================================
// Pipeline
// ============================================================================

/// Process-wide list of post-render hooks.
///
/// Registration takes a write lock; rendering only reads, so concurrent
/// requests run their hooks side by side.
#[derive(Default)]
pub struct RenderPipeline {
    hooks: RwLock<Vec<Arc<dyn PostRenderHook>>>,
}

impl RenderPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when a hook with the same name is already installed.
    pub fn register(&self, hook: Arc<dyn PostRenderHook>) -> bool {
        let mut hooks = match self.hooks.write() {
            Ok(h) => h,
            Err(poisoned) => poisoned.into_inner(),
        };

        if hooks.iter().any(|h| h.name() == hook.name()) {
            return false;
        }

        hooks.push(hook);
        true
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every hook, in registration order, over the rendered page.
    pub fn finish(&self, page: String, ctx: &RequestContext) -> String {
        self.snapshot()
            .iter()
            .fold(page, |body, hook| hook.after_render(body, ctx))
    }

    fn snapshot(&self) -> Vec<Arc<dyn PostRenderHook>> {
        match self.hooks.read() {
            Ok(h) => h.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
