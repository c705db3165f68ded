//! ratgdo code generator
//!
//! Reads a device config, validates its ratgdo hub and binary-sensor
//! entries and prints the generated setup code.

mod pipeline;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// C++ declarations and setup body
    Cpp,
    /// Action list as JSON
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "rg-build", version, about = "Generate ratgdo setup code from a device config")]
struct Cli {
    /// Device config file (e.g. garage.yaml)
    config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Cpp)]
    format: Format,

    /// Write output to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only generated output
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Reading {}", cli.config.display());

    let (validated, script) = pipeline::build_file(&cli.config)
        .with_context(|| format!("failed to build {}", cli.config.display()))?;

    let rendered = match cli.format {
        Format::Cpp => script.render_cpp(validated.device_name.as_deref()),
        Format::Json => script.to_json().context("failed to serialize build script")?,
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}
