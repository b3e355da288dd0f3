#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for census overlap aggregation.

use std::fs::File;
use std::path::PathBuf;

use census_overlay_cli::{AggregationConfig, read_rows};
use census_overlay_overlap::{
    GeometryErrorPolicy, aggregate, display_geometries, feature_collection, overlap_fraction,
    parse,
};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "census_overlay",
    about = "Area-weighted reaggregation of census data onto administrative areas"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate source rows from a CSV file onto their target areas
    Aggregate {
        /// CSV file with one row per source region / target area pair
        #[arg(long)]
        input: PathBuf,
        /// TOML file with column names, subgroups and geometry error policy
        /// (defaults to the built-in configuration)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Skip rows with unusable geometry instead of aborting
        #[arg(long)]
        skip_invalid: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Write output to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the fraction of a source polygon's area inside a target polygon
    Overlap {
        /// Source polygon WKT
        #[arg(long)]
        source: String,
        /// Target polygon WKT
        #[arg(long)]
        target: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Per-area totals and contributions as JSON
    Json,
    /// A `GeoJSON` `FeatureCollection` with one feature per area
    Geojson,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Aggregate {
            input,
            config,
            skip_invalid,
            format,
            output,
        } => {
            let config = match config {
                Some(path) => AggregationConfig::load(&path)?,
                None => AggregationConfig::embedded(),
            };

            let mut options = config.options();
            if skip_invalid {
                options.on_geometry_error = GeometryErrorPolicy::Skip;
            }

            log::info!("Reading rows from {}", input.display());
            let rows = read_rows(File::open(&input)?, &config)?;

            let aggregation = aggregate(&rows, &options).inspect_err(|e| {
                log::error!("Aggregation aborted: {e}");
            })?;

            for skipped in &aggregation.skipped {
                eprintln!(
                    "Skipped row {} ({}): {}",
                    skipped.row, skipped.target_key, skipped.reason
                );
            }

            let rendered = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&aggregation)?,
                OutputFormat::Geojson => {
                    feature_collection(&aggregation, &display_geometries(&rows)).to_string()
                }
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    log::info!(
                        "Wrote {} areas to {}",
                        aggregation.areas.len(),
                        path.display()
                    );
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Overlap { source, target } => {
            let source = parse(&source)?;
            let target = parse(&target)?;
            println!("{}", overlap_fraction(&source, &target)?);
        }
    }

    Ok(())
}
