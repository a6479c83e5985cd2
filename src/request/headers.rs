use std::collections::HashMap;

use crate::error::HtmxError;

/// Request headers keyed by lowercased name.
///
/// Server environments disagree on header casing, so names are normalized
/// once when the request is built and every lookup lowercases its query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestHeaders {
    values: HashMap<String, String>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later duplicates overwrite earlier ones.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut headers = Self::new();
        for (name, value) in pairs {
            headers.insert(name.as_ref(), value);
        }
        headers
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(normalize_name(name), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&normalize_name(name)).map(String::as_str)
    }

    /// Like [`get`](Self::get) but blank values count as absent.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Parse a raw `Name: value` header line.
pub fn parse_header_line(line: &str) -> Result<(String, String), HtmxError> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| HtmxError::InvalidHeader(line.to_string()))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(HtmxError::InvalidHeader(line.to_string()));
    }

    Ok((name.to_string(), value.trim().to_string()))
}
