// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe CSG CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use polyframe_csg::registry::{ParamDefault, CONSTRUCTS};
use polyframe_csg::{BatchConverter, ConversionEnvelope, ConverterConfig, CsgConverter, Node, UnknownConstructPolicy};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polyframe-csg")]
#[command(about = "Polyframe CSG - OpenSCAD AST to canonical CSG descriptions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to polyframe-csg.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an AST JSON file into a result envelope
    Convert {
        /// Input AST JSON file
        input: PathBuf,

        /// Output JSON file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the unknown-construct policy (error, ignore, group)
        #[arg(long)]
        unknown: Option<UnknownConstructPolicy>,
    },

    /// Convert a JSON array of independent ASTs in parallel
    Batch {
        /// Input JSON file holding an array of ASTs
        input: PathBuf,

        /// Output JSON file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the construct registry
    Schema {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Write it to this file instead
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => ConverterConfig::from_file(path)?,
        None => ConverterConfig::load()?,
    };

    match cli.command {
        Commands::Convert { input, output, unknown } => {
            let config = ConverterConfig {
                unknown_constructs: unknown.unwrap_or(config.unknown_constructs),
                ..config
            };
            convert_command(&input, output.as_deref(), config, cli.verbose)?;
        }
        Commands::Batch { input, output } => {
            batch_command(&input, output.as_deref(), config, cli.verbose)?;
        }
        Commands::Schema { json } => schema_command(json)?,
        Commands::Config { save } => match save {
            Some(path) => {
                config.save(&path)?;
                println!("{} {}", "Saved configuration to".green(), path.display());
            }
            None => print!("{}", toml::to_string_pretty(&config).context("Failed to serialize config")?),
        },
        Commands::Version => {
            println!("Polyframe CSG v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {:?}", path))?;
    polyframe_csg::from_json(&content).with_context(|| format!("Failed to parse AST JSON: {:?}", path))
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write output file: {:?}", path)),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}

fn convert_command(input: &Path, output: Option<&Path>, config: ConverterConfig, verbose: bool) -> Result<()> {
    let root: Node = read_json(input)?;
    let result = CsgConverter::new(config).convert(&root);

    if verbose {
        match &result {
            Ok(converted) => eprintln!(
                "{} {} nodes, depth {}, {:.3} ms",
                "Converted".green().bold(),
                converted.metadata.nodes_visited,
                converted.metadata.depth,
                converted.metadata.generation_time
            ),
            Err(err) => eprintln!("{} {}", "Failed".red().bold(), err),
        }
    }

    let failed = result.is_err();
    let envelope = ConversionEnvelope::from(result);
    write_output(output, &envelope.to_json()?)?;

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn batch_command(input: &Path, output: Option<&Path>, config: ConverterConfig, verbose: bool) -> Result<()> {
    let roots: Vec<Node> = read_json(input)?;
    let start = std::time::Instant::now();
    let results = BatchConverter::new(config).convert_all(&roots);

    let failed = results.iter().filter(|r| r.is_err()).count();
    if verbose {
        eprintln!(
            "{} {} ASTs in {:.2?} ({} failed)",
            "Converted".green().bold(),
            roots.len(),
            start.elapsed(),
            if failed > 0 { failed.to_string().red() } else { failed.to_string().green() }
        );
    }

    let envelopes: Vec<ConversionEnvelope> = results.into_iter().map(ConversionEnvelope::from).collect();
    let json = serde_json::to_string_pretty(&envelopes).context("Failed to serialize results")?;
    write_output(output, &json)?;

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn schema_command(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(CONSTRUCTS).context("Failed to serialize registry")?);
        return Ok(());
    }

    for spec in CONSTRUCTS {
        println!("{} {}", spec.name.cyan().bold(), format!("({:?})", spec.class).bright_black());
        for param in spec.params {
            let default = match param.default {
                ParamDefault::Undef => "undef".to_string(),
                ParamDefault::Identity => "identity".to_string(),
                other => other.to_value().to_string(),
            };
            println!(
                "  {:>2}  {:<8} = {:<12} {}",
                param.position,
                param.name,
                default,
                param.ty.to_string().bright_black()
            );
        }
    }
    Ok(())
}
