use std::collections::BTreeMap;

use crate::config::{FieldNames, HeaderNames};
use crate::error::HtmxError;
use crate::markup::is_valid_id;
use crate::request::headers::{RequestHeaders, parse_header_line};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other(String),
}

impl Method {
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_ascii_uppercase();
        match upper.as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            _ => Method::Other(upper),
        }
    }
}

/// Everything one request contributes: method, posted fields and headers.
///
/// Built once by the host and passed by reference to every stage, so no
/// stage keeps request data between calls.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub fields: BTreeMap<String, String>,
    pub headers: RequestHeaders,

    header_names: HeaderNames,
    field_names: FieldNames,
}

impl RequestContext {
    pub fn new(method: Method) -> Self {
        RequestContext {
            method,
            fields: BTreeMap::new(),
            headers: RequestHeaders::new(),
            header_names: HeaderNames::default(),
            field_names: FieldNames::default(),
        }
    }

    pub fn get() -> Self {
        Self::new(Method::Get)
    }

    pub fn post() -> Self {
        Self::new(Method::Post)
    }

    /// Use non-default header and field names.
    pub fn with_names(mut self, headers: &HeaderNames, fields: &FieldNames) -> Self {
        self.header_names = headers.clone();
        self.field_names = fields.clone();
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: RequestHeaders) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Build from raw CLI-style inputs: `Name: value` headers, `key=value` fields.
    pub fn from_raw(method: &str, headers: &[String], fields: &[String]) -> Result<Self, HtmxError> {
        let mut ctx = Self::new(Method::parse(method));

        for line in headers {
            let (name, value) = parse_header_line(line)?;
            ctx.headers.insert(&name, value);
        }

        for raw in fields {
            let (key, value) = raw
                .split_once('=')
                .ok_or_else(|| HtmxError::InvalidField(raw.clone()))?;
            if key.is_empty() {
                return Err(HtmxError::InvalidField(raw.clone()));
            }
            ctx.fields.insert(key.to_string(), value.to_string());
        }

        Ok(ctx)
    }

    pub fn header_names(&self) -> &HeaderNames {
        &self.header_names
    }

    pub fn field_names(&self) -> &FieldNames {
        &self.field_names
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::Post
    }

    // ---- Header accessors ----

    /// Echoed identifier, absent when blank or not safe to echo into markup.
    pub fn correlation_id(&self) -> Option<&str> {
        self.headers
            .get_non_empty(&self.header_names.id)
            .filter(|id| is_valid_id(id))
    }

    pub fn indicator(&self) -> Option<&str> {
        self.headers.get_non_empty(&self.header_names.indicator)
    }

    /// htmx marks its requests with the literal value `true`.
    pub fn is_htmx_request(&self) -> bool {
        self.headers.get(&self.header_names.request).map(str::trim) == Some("true")
    }

    // ---- Field accessors ----

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn submit_key(&self) -> Option<&str> {
        self.fields
            .get(&self.field_names.submit_key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn submitted_form_name(&self) -> Option<&str> {
        self.fields
            .get(&self.field_names.form_name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}
