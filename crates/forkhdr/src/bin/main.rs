#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::panic))]

use clap::{Parser, Subcommand};
use forkhdr::{BlockHeader, GenesisInfo};
use serde_json::json;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

#[derive(Parser)]
#[command(name = "forkhdr")]
#[command(about = "Decode, inspect and encode legacy and extended block headers.", long_about = None)]
struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false", global = true)]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Disable colored output.
    #[arg(long, default_value = "false", global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a hex header and print its fields as JSON.
    Decode {
        /// Header bytes, hex-encoded.
        hex: String,

        /// Treat the input as a full serialized block with an 8-byte prefix.
        #[arg(long, default_value = "false")]
        raw_block: bool,
    },

    /// Decode a hex header and print its id, target, difficulty and validity.
    Inspect {
        /// Header bytes, hex-encoded.
        hex: String,

        /// Treat the input as a full serialized block with an 8-byte prefix.
        #[arg(long, default_value = "false")]
        raw_block: bool,
    },

    /// Build a header from a JSON field mapping and print its hex.
    Encode {
        /// JSON object with the header fields.
        json: String,
    },

    /// Print the genesis header fields as JSON.
    Genesis,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    init_tracing(&args)?;

    println!("{}", run(&args.command)?);

    Ok(())
}

/// Runs a subcommand and returns what it prints.
fn run(command: &Command) -> Result<String, Box<dyn std::error::Error>> {
    let output = match command {
        Command::Decode { hex, raw_block } => {
            let header = decode(hex, *raw_block)?;
            serde_json::to_string_pretty(&header.to_fields())?
        }
        Command::Inspect { hex, raw_block } => {
            let header = decode(hex, *raw_block)?;
            let report = json!({
                "id": header.id().to_string(),
                "layout": header.layout().name(),
                "height": header.height(),
                "bits": header.bits().to_string(),
                "target": header.target().to_string(),
                "difficulty": header.difficulty(),
                "validTimestamp": header.valid_timestamp(),
                "validProofOfWork": header.valid_proof_of_work(),
            });
            serde_json::to_string_pretty(&report)?
        }
        Command::Encode { json } => {
            let header = BlockHeader::from_json(json)?;
            info!(id = %header.id(), layout = header.layout().name(), "encoded header");
            header.to_hex()
        }
        Command::Genesis => {
            let header = GenesisInfo::mainnet().to_header()?;
            serde_json::to_string_pretty(&header.to_fields())?
        }
    };

    Ok(output)
}

fn decode(hex: &str, raw_block: bool) -> Result<BlockHeader, forkhdr::HeaderError> {
    let hex = hex.trim();
    if raw_block {
        BlockHeader::from_raw_block(&hex::decode(hex)?)
    } else {
        BlockHeader::from_hex(hex)
    }
}

fn init_tracing(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let level = match args.log_level.as_str() {
        "error" => tracing::Level::ERROR,
        "warn" => tracing::Level::WARN,
        "info" => tracing::Level::INFO,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => {
            eprintln!(
                "Invalid log level: {}. Using 'warn' as default.",
                args.log_level
            );
            tracing::Level::WARN
        }
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let use_ansi = std::io::IsTerminal::is_terminal(&std::io::stderr()) && !args.no_color;

    // stdout carries the command output, so logs go to stderr
    let subscriber = Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_level(true)
            .with_target(true)
            .with_thread_ids(args.verbose)
            .with_thread_names(args.verbose)
            .with_ansi(use_ansi)
            .with_file(args.verbose)
            .with_line_number(args.verbose)
            .with_timer(ChronoUtc::rfc_3339()),
    );

    subscriber.try_init()?;

    Ok(())
}
