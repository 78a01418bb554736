//! # utf8-wire CLI - Internal Encoding to UTF-8 Converter
//!
//! Command-line front end for converting byte streams between an 8-bit
//! internal encoding and UTF-8, and for checking which encodings are usable.

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use serde::Serialize;
#[cfg(feature = "cli")]
use tracing::{debug, info};
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use utf8_wire::{CacheStats, Converter, canonical_name, locale};

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features disabled. Enable with --features cli");
    std::process::exit(1);
}

/// utf8-wire: convert between an internal encoding and UTF-8
#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "utf8-wire")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Convert internal-encoded input to UTF-8
    Encode(ConvertArgs),

    /// Convert UTF-8 input to the internal encoding
    Decode(ConvertArgs),

    /// Check that an encoding can be converted to and from UTF-8
    Check(CheckArgs),

    /// Show the character set of the current locale
    Locale,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ConvertArgs {
    /// Internal encoding (default: the locale's character set)
    #[arg(short, long)]
    encoding: Option<String>,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct CheckArgs {
    /// Encoding to check
    encoding: String,
}

#[cfg(feature = "cli")]
#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, Debug)]
enum Direction {
    ToUtf8,
    FromUtf8,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ConversionResult {
    success: bool,
    encoding: String,
    bytes_processed: usize,
    bytes_written: usize,
    processing_time_ms: u64,
    handles: CacheStats,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct CheckResult {
    encoding: String,
    canonical: Option<&'static str>,
    supported: bool,
    error: Option<String>,
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Encode(ref args) => convert_command(args, Direction::ToUtf8, &cli)?,
        Commands::Decode(ref args) => convert_command(args, Direction::FromUtf8, &cli)?,
        Commands::Check(ref args) => check_command(args, &cli)?,
        Commands::Locale => locale_command(&cli)?,
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("UTF8_WIRE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn convert_command(args: &ConvertArgs, direction: Direction, cli: &Cli) -> Result<()> {
    let start_time = std::time::Instant::now();

    let encoding = args
        .encoding
        .clone()
        .unwrap_or_else(locale::current_codeset);
    let converter = Converter::<u8>::new(&encoding)
        .with_context(|| format!("Failed to create converter for {encoding}"))?;
    info!(encoding = %encoding, ?direction, "converting");

    // Read input
    let input_data = if let Some(ref input_path) = args.input {
        debug!(path = %input_path.display(), "reading input file");
        fs::read(input_path)
            .with_context(|| format!("Failed to read input file: {}", input_path.display()))?
    } else {
        debug!("reading from stdin");
        let mut buffer = Vec::new();
        io::stdin()
            .read_to_end(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    };

    let output_data = match direction {
        Direction::ToUtf8 => converter.encode_to_vec(&input_data),
        Direction::FromUtf8 => converter.decode_to_vec(&input_data),
    }
    .context("Conversion failed")?;

    // Write output
    if let Some(ref output_path) = args.output {
        fs::write(output_path, &output_data)
            .with_context(|| format!("Failed to write output file: {}", output_path.display()))?;
        debug!(path = %output_path.display(), "wrote output file");
    } else {
        io::stdout()
            .write_all(&output_data)
            .context("Failed to write to stdout")?;
    }

    let processing_time = start_time.elapsed();
    info!(
        bytes_in = input_data.len(),
        bytes_out = output_data.len(),
        elapsed = ?processing_time,
        "conversion finished"
    );

    match cli.format {
        OutputFormat::Json => {
            let result = ConversionResult {
                success: true,
                encoding,
                bytes_processed: input_data.len(),
                bytes_written: output_data.len(),
                processing_time_ms: processing_time.as_millis() as u64,
                handles: converter.stats(),
            };
            eprintln!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            if cli.verbose || args.output.is_some() {
                eprintln!("✓ Conversion completed successfully");
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn check_command(args: &CheckArgs, cli: &Cli) -> Result<()> {
    let outcome = Converter::<u8>::new(&args.encoding);
    let result = CheckResult {
        encoding: args.encoding.clone(),
        canonical: canonical_name(&args.encoding),
        supported: outcome.is_ok(),
        error: outcome.err().map(|err| err.to_string()),
    };

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => match (&result.error, result.canonical) {
            (None, Some(canonical)) => println!("✓ {} ({canonical})", result.encoding),
            (None, None) => println!("✓ {}", result.encoding),
            (Some(error), _) => println!("✗ {error}"),
        },
    }

    if !result.supported {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn locale_command(cli: &Cli) -> Result<()> {
    let codeset = locale::current_codeset();

    match cli.format {
        OutputFormat::Json => {
            let info = serde_json::json!({
                "codeset": codeset,
                "canonical": canonical_name(&codeset),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        OutputFormat::Text => {
            println!("Locale codeset: {codeset}");
            if let Some(canonical) = canonical_name(&codeset) {
                println!("Canonical name: {canonical}");
            }
        }
    }

    Ok(())
}
