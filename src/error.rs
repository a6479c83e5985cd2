use std::fmt;

#[derive(Debug)]
pub enum HtmxError {
    /// Reading or writing a file failed (config, page dump, trace file)
    Io { path: String, source: std::io::Error },

    /// Config file exists but could not be parsed
    Config { path: String, source: serde_yaml::Error },

    /// hx-headers payload could not be serialized
    Json { context: String, source: serde_json::Error },

    /// The external form engine failed to render a form
    FormEngine { form: String, message: String },

    /// Rendered form carries no `method="post"` to replace
    MissingPostMethod,

    /// Correlation identifier cannot be written into markup
    InvalidId(String),

    /// Raw header line is not `Name: value`
    InvalidHeader(String),

    /// Raw field is not `key=value`
    InvalidField(String),
}

impl fmt::Display for HtmxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HtmxError::Io { path, source } => {
                write!(f, "I/O error on '{}': {}", path, source)
            }
            HtmxError::Config { path, source } => {
                write!(f, "Invalid config file '{}': {}", path, source)
            }
            HtmxError::Json { context, source } => {
                write!(f, "JSON error ({}): {}", context, source)
            }
            HtmxError::FormEngine { form, message } => {
                write!(f, "Form '{}' failed to render: {}", form, message)
            }
            HtmxError::MissingPostMethod => {
                write!(f, "Rendered form has no method=\"post\" attribute")
            }
            HtmxError::InvalidId(id) => {
                write!(f, "Invalid correlation id: {:?}", id)
            }
            HtmxError::InvalidHeader(line) => {
                write!(f, "Invalid header line (expected 'Name: value'): {}", line)
            }
            HtmxError::InvalidField(raw) => {
                write!(f, "Invalid field (expected 'key=value'): {}", raw)
            }
        }
    }
}

impl std::error::Error for HtmxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HtmxError::Io { source, .. } => Some(source),
            HtmxError::Config { source, .. } => Some(source),
            HtmxError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}
