use serde::{Deserialize, Serialize};

use crate::error::HtmxError;

pub const DEFAULT_CONFIG_PATH: &str = "formbuilder-htmx.yaml";

// ============================================================================
// Config Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `formbuilder-htmx.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HtmxFormsConfig {
    #[serde(default)]
    pub headers: HeaderNames,
    #[serde(default)]
    pub fields: FieldNames,
    #[serde(default)]
    pub ids: IdConfig,
    #[serde(default)]
    pub markup: MarkupConfig,
    /// JSONL trace output; tracing is off when unset
    #[serde(default)]
    pub trace_file: Option<String>,
}

/// Request headers exchanged with the client. Matched case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeaderNames {
    #[serde(default = "default_id_header")]
    pub id: String,

    #[serde(default = "default_indicator_header")]
    pub indicator: String,

    /// Header set by htmx on every request it issues
    #[serde(default = "default_request_header")]
    pub request: String,
}

impl Default for HeaderNames {
    fn default() -> Self {
        Self {
            id: default_id_header(),
            indicator: default_indicator_header(),
            request: default_request_header(),
        }
    }
}

/// POST fields owned by the form engine. Only their presence is checked,
/// except during fragment disambiguation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldNames {
    #[serde(default = "default_submit_key_field")]
    pub submit_key: String,

    #[serde(default = "default_form_name_field")]
    pub form_name: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            submit_key: default_submit_key_field(),
            form_name: default_form_name_field(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdConfig {
    #[serde(default = "default_id_prefix")]
    pub prefix: String,

    #[serde(default = "default_id_length")]
    pub length: usize,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            prefix: default_id_prefix(),
            length: default_id_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkupConfig {
    /// Value written to `hx-swap`
    #[serde(default = "default_swap")]
    pub swap: String,

    /// Selector written to `hx-disabled-elt`
    #[serde(default = "default_disabled_element")]
    pub disabled_element: String,

    #[serde(default)]
    pub output_mode: OutputMode,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            swap: default_swap(),
            disabled_element: default_disabled_element(),
            output_mode: OutputMode::default(),
        }
    }
}

/// How the host assembles the final page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// HTML comments survive to the final output
    #[default]
    Plain,
    /// Host strips comments while assembling regions; the decorator emits
    /// an explicit end sentinel after each wrapper
    MarkupRegions,
}

// Serde default helpers
fn default_id_header() -> String { "Fb-Htmx-Id".to_string() }
fn default_indicator_header() -> String { "Fb-Htmx-Indicator".to_string() }
fn default_request_header() -> String { "Hx-Request".to_string() }
fn default_submit_key_field() -> String { "_submitKey".to_string() }
fn default_form_name_field() -> String { "_InputfieldForm".to_string() }
fn default_id_prefix() -> String { "fb-htmx-".to_string() }
fn default_id_length() -> usize { 10 }
fn default_swap() -> String { "outerHTML".to_string() }
fn default_disabled_element() -> String { "button[type=submit]".to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Parse a config file strictly. Missing files and parse failures are errors.
pub fn read_config(path: &str) -> Result<HtmxFormsConfig, HtmxError> {
    let content = std::fs::read_to_string(path).map_err(|source| HtmxError::Io {
        path: path.to_string(),
        source,
    })?;

    serde_yaml::from_str(&content).map_err(|source| HtmxError::Config {
        path: path.to_string(),
        source,
    })
}

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> HtmxFormsConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match read_config(config_path) {
        Ok(config) => config,
        Err(HtmxError::Io { .. }) => HtmxFormsConfig::default(),
        Err(e) => {
            eprintln!("Warning: {}; using defaults", e);
            HtmxFormsConfig::default()
        }
    }
}
