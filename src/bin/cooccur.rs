//! cooccur - co-occurrence network CLI
//!
//! Builds one co-occurrence network per environmental category and compares
//! their topology.

use clap::{Parser, Subcommand, ValueEnum};
use cooccur_net::data::{CountMatrix, Metadata, Metric};
use cooccur_net::error::Result;
use cooccur_net::pipeline::{NetworkComparison, NetworkConfig, NetworkPipeline};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Co-occurrence network construction and comparison
#[derive(Parser)]
#[command(name = "cooccur")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Tsv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline from a YAML configuration file
    Run {
        /// Path to pipeline configuration YAML
        #[arg(long)]
        config: PathBuf,

        /// Path to count matrix TSV
        #[arg(short = 'c', long)]
        counts: PathBuf,

        /// Path to metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Output path for the comparison table TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Directory for per-category edge lists
        #[arg(long)]
        edges_dir: Option<PathBuf>,
    },

    /// Compare categories with command-line parameters
    Compare {
        /// Path to count matrix TSV
        #[arg(short = 'c', long)]
        counts: PathBuf,

        /// Path to metadata TSV
        #[arg(short, long)]
        metadata: PathBuf,

        /// Metadata column defining the categories
        #[arg(short, long)]
        group: String,

        /// Minimum correlation coefficient for an edge
        #[arg(long, default_value = "0.6")]
        min_coefficient: f64,

        /// Maximum p-value for an edge
        #[arg(long, default_value = "0.05")]
        alpha: f64,

        /// Filter on Benjamini-Hochberg q-values
        #[arg(long)]
        bh: bool,

        /// Seed for community tie-breaking
        #[arg(long)]
        seed: Option<u64>,

        /// Sort rows by this metric, descending (e.g. modularity, n_edges)
        #[arg(long)]
        sort_by: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write the table here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for per-category edge lists
        #[arg(long)]
        edges_dir: Option<PathBuf>,
    },

    /// Write an example pipeline configuration
    Example {
        /// Output path for the example YAML
        #[arg(short, long, default_value = "pipeline.yaml")]
        output: PathBuf,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            counts,
            metadata,
            output,
            edges_dir,
        } => cmd_run(&config, &counts, &metadata, &output, edges_dir.as_deref()),

        Commands::Compare {
            counts,
            metadata,
            group,
            min_coefficient,
            alpha,
            bh,
            seed,
            sort_by,
            format,
            output,
            edges_dir,
        } => {
            let mut pipeline = NetworkPipeline::new()
                .group_column(&group)
                .min_coefficient(min_coefficient)
                .alpha(alpha);
            if bh {
                pipeline = pipeline.correct_bh();
            }
            if let Some(seed) = seed {
                pipeline = pipeline.seed(seed);
            }
            cmd_compare(
                &pipeline,
                &counts,
                &metadata,
                sort_by.as_deref(),
                format,
                output.as_deref(),
                edges_dir.as_deref(),
            )
        }

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_data(counts_path: &Path, metadata_path: &Path) -> Result<(CountMatrix, Metadata)> {
    let counts = CountMatrix::from_tsv(counts_path)?;
    let metadata = Metadata::from_tsv(metadata_path)?;
    tracing::info!(
        n_taxa = counts.n_taxa(),
        n_samples = counts.n_samples(),
        "loaded count table"
    );
    Ok((counts, metadata))
}

fn write_edges(comparison: &NetworkComparison, edges_dir: Option<&Path>) -> Result<()> {
    if let Some(dir) = edges_dir {
        let written = comparison.write_edges(dir)?;
        tracing::info!(n_files = written.len(), dir = ?dir, "wrote edge lists");
    }
    Ok(())
}

/// Run a pipeline from configuration
fn cmd_run(
    config_path: &Path,
    counts_path: &Path,
    metadata_path: &Path,
    output_path: &Path,
    edges_dir: Option<&Path>,
) -> Result<()> {
    let config = NetworkConfig::from_yaml_file(config_path)?;
    let (counts, metadata) = load_data(counts_path, metadata_path)?;

    let comparison = NetworkPipeline::from_config(&config).run(&counts, &metadata)?;
    comparison.table.to_tsv(output_path)?;
    write_edges(&comparison, edges_dir)?;

    tracing::info!(
        n_categories = comparison.table.len(),
        n_failed = comparison.table.n_failed(),
        output = ?output_path,
        "done"
    );
    Ok(())
}

fn cmd_compare(
    pipeline: &NetworkPipeline,
    counts_path: &Path,
    metadata_path: &Path,
    sort_by: Option<&str>,
    format: OutputFormat,
    output_path: Option<&Path>,
    edges_dir: Option<&Path>,
) -> Result<()> {
    let (counts, metadata) = load_data(counts_path, metadata_path)?;
    let comparison = pipeline.run(&counts, &metadata)?;
    write_edges(&comparison, edges_dir)?;

    let mut table = comparison.table.clone();
    if let Some(key) = sort_by {
        let metric: Metric = key.parse()?;
        let sorted: Vec<_> = table
            .sorted_by(metric, true)
            .into_iter()
            .cloned()
            .collect();
        table.rows = sorted;
    }

    let rendered = match format {
        OutputFormat::Text => table.to_string(),
        OutputFormat::Tsv => table.to_tsv_string()?,
        OutputFormat::Json => serde_json::to_string_pretty(&table)?,
    };

    match output_path {
        Some(path) => {
            std::fs::write(path, rendered)?;
            tracing::info!(output = ?path, "wrote comparison table");
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

/// Generate example pipeline configuration
fn cmd_example(output_path: &Path) -> Result<()> {
    let pipeline = NetworkPipeline::new()
        .name("example-cooccurrence")
        .group_column("environment")
        .min_coefficient(0.6)
        .alpha(0.05)
        .filter_prevalence(0.1)
        .seed(42);

    let config = pipeline.to_config(Some(
        "Spearman co-occurrence networks per environment with greedy modularity communities",
    ));
    config.to_yaml_file(output_path)?;
    tracing::info!(output = ?output_path, "wrote example pipeline");
    println!("{}", config.to_yaml()?);

    Ok(())
}
