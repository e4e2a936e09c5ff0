use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use payment_recon::{load_table, write_table, OutputFormat, PipelineConfig, ReconciliationEngine};

#[derive(Parser)]
#[command(name = "payment-recon")]
#[command(about = "Cross-match bulk payments and payment status against a bank statement")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Xlsx,
    Csv,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Xlsx => OutputFormat::Xlsx,
            Format::Csv => OutputFormat::Csv,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build the intermediate and final tables
    Reconcile {
        /// Bulk payment export (Beneficiary Addr. Line 3)
        #[arg(long)]
        bulk: PathBuf,

        /// Payment status export (REMARKS, AMOUNT, UTR NUMBER, REFERENCE NUMBER)
        #[arg(long)]
        payment: PathBuf,

        /// Bank statement export (Narrative)
        #[arg(long)]
        statement: PathBuf,

        /// Directory for the two output files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Output file format
        #[arg(long, value_enum, default_value_t = Format::Xlsx)]
        format: Format,

        /// JSON pipeline configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write a JSON run report here
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show which reference token a narrative yields
    Extract {
        #[arg(required = true)]
        narratives: Vec<String>,
    },
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Reconcile {
            bulk,
            payment,
            statement,
            out_dir,
            format,
            config,
            report,
        } => run_reconcile(bulk, payment, statement, out_dir, format.into(), config, report),
        Command::Extract { narratives } => {
            run_extract(&narratives);
            Ok(())
        }
    }
}

fn run_reconcile(
    bulk: PathBuf,
    payment: PathBuf,
    statement: PathBuf,
    out_dir: PathBuf,
    format: OutputFormat,
    config: Option<PathBuf>,
    report_path: Option<PathBuf>,
) -> Result<()> {
    let config = match config {
        Some(path) => PipelineConfig::from_file(&path)?,
        None => PipelineConfig::default(),
    };
    let engine = ReconciliationEngine::with_config(config)?;

    let bulk = load_table(&bulk, "bulk")?;
    let payment = load_table(&payment, "payment")?;
    let statement = load_table(&statement, "statement")?;

    let result = engine.reconcile(&bulk, &payment, &statement)?;

    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;
    let (intermediate_file, final_file) = format.file_names();
    write_table(result.intermediate.table(), &out_dir.join(intermediate_file))?;
    write_table(result.final_table.table(), &out_dir.join(final_file))?;

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&result.report)?;
        fs::write(&path, json).with_context(|| format!("Failed to write report: {:?}", path))?;
        info!("report written to {}", path.display());
    }

    info!("{}", result.report.summary());

    Ok(())
}

fn run_extract(narratives: &[String]) {
    let engine = ReconciliationEngine::new();
    for narrative in narratives {
        let token = engine.extract_reference_token(narrative);
        println!(
            "{}\t{}\t{}",
            narrative,
            token.rule(),
            token.value().unwrap_or("-")
        );
    }
}
