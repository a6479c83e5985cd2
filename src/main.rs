use clap::Parser;
use formbuilder_htmx::cli::commands::{
    DecorateArgs, cmd_classify, cmd_decorate, cmd_extract, cmd_intercept, format_classification,
    read_input,
};
use formbuilder_htmx::cli::config::{Cli, Commands};
use formbuilder_htmx::config::load_config;
use formbuilder_htmx::intercept::interceptor::Outcome;
use formbuilder_htmx::markup::decorator::Decorated;
use formbuilder_htmx::trace::logger::TraceLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    // Resolve trace file: CLI > config
    let trace_path = cli.trace.as_deref().or(config.trace_file.as_deref());
    let tracer = TraceLogger::from_config(trace_path);

    match cli.command {
        Commands::Decorate {
            input,
            id,
            indicator,
            attributes,
            markup_regions,
            headers,
        } => {
            let markup = read_input(&input)?;
            let decorated = cmd_decorate(
                &config,
                DecorateArgs {
                    markup: &markup,
                    id: id.as_deref(),
                    indicator: indicator.as_deref(),
                    attributes: &attributes,
                    markup_regions,
                    headers: &headers,
                },
                tracer,
                cli.verbose,
            )?;

            if let Decorated::Skipped { reason, .. } = &decorated {
                eprintln!("Markup left unchanged: {}", reason);
            }
            println!("{}", decorated.html());
        }
        Commands::Classify {
            method,
            headers,
            fields,
        } => {
            let (signature, check) = cmd_classify(&config, &method, &headers, &fields)?;
            print!("{}", format_classification(signature, &check));
        }
        Commands::Extract {
            page,
            id,
            submit_key,
            form,
            inner,
        } => {
            let page = read_input(&page)?;
            let extraction = cmd_extract(&page, &id, submit_key.as_deref(), form.as_deref());

            if cli.verbose > 0 {
                eprintln!(
                    "{} candidates, {} without end marker",
                    extraction.candidates, extraction.rejected
                );
            }

            match extraction.fragment {
                Some(fragment) if inner => println!("{}", fragment.inner()),
                Some(fragment) => println!("{}", fragment.html()),
                None => {
                    eprintln!("No fragment found for '{}'", id);
                    std::process::exit(1);
                }
            }
        }
        Commands::Intercept {
            page,
            method,
            headers,
            fields,
        } => {
            let page = read_input(&page)?;
            let interception = cmd_intercept(&config, page, &method, &headers, &fields, tracer)?;

            if cli.verbose > 0 || interception.outcome == Outcome::ExtractionMiss {
                eprintln!(
                    "{:?}: {:?} ({:?})",
                    interception.signature, interception.outcome, interception.state
                );
            }
            println!("{}", interception.body);
        }
    }

    Ok(())
}
