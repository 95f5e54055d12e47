//! Parse a tool-result envelope and print its component configurations.
//!
//! # Examples
//!
//! ```sh
//! # Normalized configurations as JSON
//! blockview result.json
//!
//! # Text preview with the demo formatters, reading stdin
//! cat result.json | blockview --preview
//!
//! # Reject payloads that do not match the UiOutput schema
//! blockview --strict result.json
//!
//! # Print the UiOutput JSON Schema
//! blockview --schema
//! ```
//!
//! Set `RUST_LOG=blockview=debug` to see dropped blocks and formatter lookups.

use std::io;
use std::path::PathBuf;
use std::process;

use blockview::envelope::{load_envelope, read_envelope, ui_output_schema};
use blockview::panel::ErrorPanel;
use blockview::parser::{DEFAULT_EXCERPT_CHARS, ParseOutcome, ParserConfig, ResultParser};
use blockview::registry::presets::demo_set;
use blockview::surface::{RenderResult, Surface, SurfaceConfig, prepare};
use clap::Parser;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

/// Parse a tool-result envelope and print its component configurations.
#[derive(Parser)]
#[command(name = "blockview")]
struct Cli {
    /// Envelope JSON file. Reads stdin when omitted or "-".
    file: Option<PathBuf>,

    /// Render a text preview instead of printing configurations
    #[arg(long)]
    preview: bool,

    /// Validate the decoded payload against the UiOutput JSON Schema
    #[arg(long)]
    strict: bool,

    /// Characters of raw text quoted when the payload is not valid JSON
    #[arg(long, default_value_t = DEFAULT_EXCERPT_CHARS)]
    excerpt_chars: usize,

    /// Omit configurations that fail validation
    #[arg(long)]
    skip_invalid: bool,

    /// Print the UiOutput JSON Schema and exit
    #[arg(long)]
    schema: bool,
}

fn load(cli: &Cli) -> Result<Value, String> {
    let result = match &cli.file {
        Some(path) if path.as_os_str() != "-" => load_envelope(path),
        _ => read_envelope(io::stdin().lock(), "<stdin>"),
    };
    result.map_err(|e| e.to_string())
}

fn print_json(value: &impl serde::Serialize) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

/// Print normalized configurations (and invalid ones with their errors).
fn print_configs(cli: &Cli, parser_config: ParserConfig, envelope: &Value) -> Result<(), String> {
    let parsed = match ResultParser::new(parser_config).parse(Some(envelope)) {
        Ok(ParseOutcome::Pending) => {
            println!("(no envelope)");
            return Ok(());
        }
        Ok(ParseOutcome::Parsed(parsed)) => parsed,
        Err(e) => return Err(ErrorPanel::from_parse_error(&e).to_text()),
    };

    let configs: Vec<Value> = prepare(&parsed)
        .into_iter()
        .filter(|p| p.validation.is_valid || !cli.skip_invalid)
        .map(|p| {
            if p.validation.is_valid {
                p.config
            } else {
                json!({"config": p.config, "errors": p.validation.errors})
            }
        })
        .collect();

    print_json(&json!({
        "configs": configs,
        "summary": parsed.summary,
        "dropped": parsed.dropped,
    }))
}

fn print_preview(cli: &Cli, parser_config: ParserConfig, envelope: &Value) -> Result<(), String> {
    let mut surface = Surface::new(
        SurfaceConfig::default()
            .with_parser(parser_config)
            .with_skip_invalid(cli.skip_invalid),
    );
    let handle = surface.mount(&demo_set());

    let result = surface.render(Some(envelope));
    surface.unmount(handle);
    match result {
        RenderResult::Pending => println!("(no envelope)"),
        RenderResult::Error(panel) => return Err(panel.to_text()),
        RenderResult::Rendered(out) => {
            print!("{}", out.to_text());
            for dropped in out.dropped.iter().filter(|d| d.reason.is_failure()) {
                eprintln!(
                    "dropped block {} ({}): {}",
                    dropped.block_index,
                    dropped.block_id.as_deref().unwrap_or("?"),
                    dropped.reason
                );
            }
        }
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<(), String> {
    if cli.schema {
        return print_json(&ui_output_schema());
    }

    let envelope = load(cli)?;
    let parser_config = ParserConfig::default()
        .with_excerpt_chars(cli.excerpt_chars)
        .with_strict_schema(cli.strict);

    if cli.preview {
        print_preview(cli, parser_config, &envelope)
    } else {
        print_configs(cli, parser_config, &envelope)
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        eprint!("{e}");
        if !e.ends_with('\n') {
            eprintln!();
        }
        process::exit(1);
    }
}
