#![allow(dead_code)]

use std::path::PathBuf;

use formbuilder_htmx::config::HtmxFormsConfig;
use formbuilder_htmx::markup::decorator::{DecorateOptions, Decorator, FixedId};
use formbuilder_htmx::request::context::RequestContext;

pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);

    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("missing fixture {}: {}", path.display(), e))
}

/// A request satisfying every background-submission condition.
pub fn background_request(id: &str, form: &str, submit_key: &str) -> RequestContext {
    RequestContext::post()
        .with_field("_submitKey", submit_key)
        .with_field("_InputfieldForm", form)
        .with_field("name", "Ada")
        .with_header("HX-Request", "true")
        .with_header("Fb-Htmx-Id", id)
}

/// Decorate `markup` with a fixed id under `config`.
pub fn decorate_fixed(config: &HtmxFormsConfig, markup: &str, id: &str, ctx: &RequestContext) -> String {
    let ids = FixedId(id.to_string());
    Decorator::new(config, &ids)
        .decorate(markup, ctx, &DecorateOptions::default())
        .into_html()
}

/// Wrap a body in minimal page chrome.
pub fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><title>Site</title></head><body>\n<header>Site header</header>\n{}\n<footer>Site footer</footer>\n</body></html>",
        body
    )
}

/// Unique path in the temp dir for files a test writes.
pub fn temp_path(name: &str) -> PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("fbhtmx-{}-{}-{}", std::process::id(), n, name))
}
