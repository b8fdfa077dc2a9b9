//! Command-line interface for the harvester.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::HarvesterConfig;
use crate::dedup::DedupRegistry;
use crate::error::{HarvesterError, Result};
use crate::ingest::write_tsv;
use crate::pipeline::{build_from_tsv, harvest, run_tables};
use crate::search::SearchQuery;
use crate::types::RunReport;

/// SiRO Harvester - Build ARC/SiRO RDF from DPLA searches and spreadsheets.
#[derive(Parser)]
#[command(name = "siro-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build RDF documents from a TSV spreadsheet.
    Build {
        /// Tab-separated input with a header row
        tsv: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Search DPLA, optionally export a TSV, and build RDF documents.
    Harvest {
        /// Free text query
        #[arg(required_unless_present = "field", conflicts_with = "field")]
        query: Option<String>,

        /// Field search instead of free text (e.g. sourceResource.title=masses)
        #[arg(short, long, value_parser = parse_field)]
        field: Vec<(String, String)>,

        /// Write the harvested records to a TSV file
        #[arg(long)]
        tsv: Option<PathBuf>,

        /// Only export the TSV, do not build RDF
        #[arg(long, requires = "tsv")]
        skip_rdf: bool,

        /// Disciplines for every record, separated by '|'
        #[arg(long)]
        disciplines: Option<String>,

        /// Keep only items whose isShownAt link contains this text
        #[arg(long)]
        id_match: Option<String>,

        /// Look up genres of HathiTrust items from their MARC records
        #[arg(long)]
        marc_genre: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Maintain the dedup registry.
    Registry {
        #[command(subcommand)]
        command: RegistryCommand,
    },
}

#[derive(Subcommand)]
pub enum RegistryCommand {
    /// Register every .xml file name below a directory as processed.
    Rebuild {
        /// Directory of previously written per-record documents
        dir: PathBuf,

        /// Start from an empty registry
        #[arg(long)]
        reset: bool,

        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Registry file (default: data/processed_ids.json)
        #[arg(long)]
        registry: Option<PathBuf>,
    },
}

/// Options shared by the commands that write RDF.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output file (batches) or directory (--per-record)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Records per output document
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Process only the first N records
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Write one document per record
    #[arg(long)]
    pub per_record: bool,

    /// Registry file (default: data/processed_ids.json)
    #[arg(long)]
    pub registry: Option<PathBuf>,

    /// Ignore previously processed ids
    #[arg(long)]
    pub reset_dedup: bool,

    /// Do not read or write the registry
    #[arg(long, conflicts_with = "reset_dedup")]
    pub no_dedup: bool,

    /// Skip invalid records instead of aborting
    #[arg(long)]
    pub lenient: bool,
}

impl RunArgs {
    /// Load the configuration file (or defaults) and apply flag overrides.
    fn load_config(&self) -> Result<HarvesterConfig> {
        let mut config = load_config_file(self.config.as_deref())?;
        if let Some(output) = &self.output {
            config.output.path.clone_from(output);
        }
        if let Some(batch_size) = self.batch_size {
            config.output.batch_size = batch_size;
        }
        if self.limit.is_some() {
            config.limit = self.limit;
        }
        if self.per_record {
            config.output.per_record = true;
        }
        if let Some(registry) = &self.registry {
            config.dedup.path.clone_from(registry);
        }
        if self.reset_dedup {
            config.dedup.reset = true;
        }
        if self.no_dedup {
            config.dedup.enabled = false;
        }
        if self.lenient {
            config.strict = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn load_config_file(path: Option<&Path>) -> Result<HarvesterConfig> {
    match path {
        Some(path) => HarvesterConfig::load(path),
        None => {
            let mut config = HarvesterConfig::default();
            config.apply_env();
            Ok(config)
        }
    }
}

/// Parse a `field=value` search argument.
fn parse_field(arg: &str) -> std::result::Result<(String, String), String> {
    match arg.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got '{arg}'")),
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { tsv, run } => build_command(&tsv, &run),
        Commands::Harvest {
            query,
            field,
            tsv,
            skip_rdf,
            disciplines,
            id_match,
            marc_genre,
            run,
        } => {
            let query = match query {
                Some(text) => SearchQuery::Text(text),
                None => SearchQuery::Fields(field),
            };
            let mut config = run.load_config()?;
            if let Some(disciplines) = disciplines {
                config.search.disciplines = disciplines;
            }
            if id_match.is_some() {
                config.search.id_match = id_match;
            }
            if marc_genre {
                config.search.marc_genre = true;
            }
            harvest_command(&config, &query, tsv.as_deref(), skip_rdf)
        }
        Commands::Registry {
            command:
                RegistryCommand::Rebuild {
                    dir,
                    reset,
                    config,
                    registry,
                },
        } => rebuild_command(&dir, reset, config.as_deref(), registry),
    }
}

/// Execute the build command.
fn build_command(tsv: &Path, run: &RunArgs) -> Result<()> {
    if !tsv.exists() {
        return Err(HarvesterError::InputNotFound(tsv.to_path_buf()));
    }
    let config = run.load_config()?;

    println!(
        "{} {}",
        style("Building RDF from").bold(),
        style(tsv.display()).cyan()
    );
    println!();

    let report = build_from_tsv(&config, tsv)?;
    print_report(&report);
    Ok(())
}

/// Execute the harvest command.
fn harvest_command(
    config: &HarvesterConfig,
    query: &SearchQuery,
    tsv: Option<&Path>,
    skip_rdf: bool,
) -> Result<()> {
    println!(
        "{} {}",
        style("Searching DPLA for").bold(),
        style(query.describe()).cyan()
    );
    println!();

    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("Fetching search results...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let tables = match harvest(config, query) {
        Ok(tables) => tables,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };
    pb.finish_and_clear();

    println!("  Records: {}", style(tables.len()).green());

    if let Some(path) = tsv {
        write_tsv(path, &tables)?;
        println!(
            "{} {}",
            style("Saved TSV to:").green().bold(),
            path.display()
        );
    }

    if !skip_rdf {
        let report = run_tables(config, tables)?;
        print_report(&report);
    }
    Ok(())
}

/// Execute the registry rebuild command.
fn rebuild_command(
    dir: &Path,
    reset: bool,
    config: Option<&Path>,
    registry: Option<PathBuf>,
) -> Result<()> {
    if !dir.is_dir() {
        return Err(HarvesterError::InputNotFound(dir.to_path_buf()));
    }
    let config = load_config_file(config)?;
    let path = registry.unwrap_or(config.dedup.path);

    let mut registry = DedupRegistry::load(&path, reset)?;
    let stats = registry.rebuild_from_dir(dir)?;
    registry.persist()?;

    println!(
        "{} {} new, {} already registered",
        style("Registry rebuilt:").green().bold(),
        style(stats.added).cyan(),
        stats.matched
    );
    println!("  Saved to: {}", path.display());
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("  Processed: {}", style(report.processed).green());
    if report.duplicates > 0 {
        println!("  Duplicates skipped: {}", style(report.duplicates).yellow());
    }
    if !report.failed.is_empty() {
        println!(
            "  Failed: {}",
            style(report.failed.len()).yellow().bold()
        );
        for (id, reason) in &report.failed {
            println!("    {id}: {reason}");
        }
    }
    println!();
    for path in &report.written {
        println!("{} {}", style("Saved to:").green().bold(), path.display());
    }
}
