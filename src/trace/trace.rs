use serde::Serialize;
use sha1::{Digest, Sha1};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::request::signature::RequestSignature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Decorate,
    Intercept,
}

#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub stage: Stage,

    pub signature: Option<RequestSignature>,
    pub correlation_id: Option<String>,
    pub form: Option<String>,

    pub outcome: Option<String>,
    pub candidates: Option<usize>,

    pub fragment_len: Option<usize>,
    pub fragment_sha1: Option<String>,
}

impl TraceEvent {
    pub fn now(stage: Stage) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            stage,
            signature: None,
            correlation_id: None,
            form: None,
            outcome: None,
            candidates: None,
            fragment_len: None,
            fragment_sha1: None,
        }
    }

    pub fn with_signature(mut self, signature: RequestSignature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn with_id(mut self, id: Option<&str>) -> Self {
        self.correlation_id = id.map(str::to_string);
        self
    }

    pub fn with_form(mut self, form: Option<&str>) -> Self {
        self.form = form.map(str::to_string);
        self
    }

    pub fn with_outcome(mut self, outcome: impl ToString) -> Self {
        self.outcome = Some(outcome.to_string());
        self
    }

    pub fn with_candidates(mut self, candidates: usize) -> Self {
        self.candidates = Some(candidates);
        self
    }

    pub fn with_fragment(mut self, html: &str) -> Self {
        self.fragment_len = Some(html.len());
        self.fragment_sha1 = Some(fingerprint(html));
        self
    }
}

pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
