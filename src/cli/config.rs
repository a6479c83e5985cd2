use clap::{Parser, Subcommand};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "formbuilder-htmx",
    version,
    about = "Decorate form-builder markup for htmx and extract submitted fragments"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: formbuilder-htmx.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Append JSONL trace events to this file (overrides config)
    #[arg(long, global = true)]
    pub trace: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decorate rendered form markup
    Decorate {
        /// File holding the form engine's markup ("-" for stdin)
        #[arg(long)]
        input: String,

        /// Correlation identifier (default: from --header, else generated)
        #[arg(long)]
        id: Option<String>,

        /// Selector of the in-flight indicator element
        #[arg(long)]
        indicator: Option<String>,

        /// Extra attribute for the <form> element (repeatable)
        #[arg(long = "attr")]
        attributes: Vec<String>,

        /// Emit the end sentinel for hosts that strip comments
        #[arg(long)]
        markup_regions: bool,

        /// Request header as 'Name: value' (repeatable)
        #[arg(long = "header")]
        headers: Vec<String>,
    },

    /// Classify a request from its method, headers and posted fields
    Classify {
        #[arg(long, default_value = "GET")]
        method: String,

        /// Request header as 'Name: value' (repeatable)
        #[arg(long = "header")]
        headers: Vec<String>,

        /// Posted field as 'key=value' (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,
    },

    /// Extract the fragment for a correlation identifier from a page
    Extract {
        /// File holding the full page ("-" for stdin)
        #[arg(long)]
        page: String,

        #[arg(long)]
        id: String,

        /// Submit key value used to pick between duplicate wrappers
        #[arg(long)]
        submit_key: Option<String>,

        /// Submitted form name used to pick between duplicate wrappers
        #[arg(long)]
        form: Option<String>,

        /// Print only the wrapper contents
        #[arg(long)]
        inner: bool,
    },

    /// Run the post-render interceptor over a page for a given request
    Intercept {
        /// File holding the full page ("-" for stdin)
        #[arg(long)]
        page: String,

        #[arg(long, default_value = "POST")]
        method: String,

        /// Request header as 'Name: value' (repeatable)
        #[arg(long = "header")]
        headers: Vec<String>,

        /// Posted field as 'key=value' (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,
    },
}
