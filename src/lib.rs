//! Asynchronous (htmx) submission for server-rendered form-builder forms.
//!
//! Two entry points share one request:
//! - at render time, [`intercept::forms::HtmxForms::render`] decorates a
//!   form's markup with htmx attributes and wraps it in an element carrying
//!   a correlation identifier;
//! - after the host renders the full page, the post-render hook detects a
//!   background submission and replaces the page with the submitted form's
//!   fragment.

pub mod cli;
pub mod config;
pub mod error;
pub mod intercept;
pub mod markup;
pub mod request;
pub mod trace;
