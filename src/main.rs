use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use startup_decision::config::POLICY_ENV_VAR;
use startup_decision::{
    ingest, normalize_insights, report, Analysis, DecisionPolicy, ExtractionReply,
    FinancialInsights,
};

#[derive(Parser)]
#[command(name = "startup-decision")]
#[command(about = "Normalize extracted startup facts and score an investment decision", long_about = None)]
#[command(version)]
struct Cli {
    /// Decision policy TOML file (defaults are built in)
    #[arg(long, global = true, env = POLICY_ENV_VAR)]
    policy: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one extraction document
    Analyze {
        #[arg(long)]
        input: PathBuf,
        /// Company name supplied alongside the document
        #[arg(long, default_value = "")]
        company: String,
        /// Auxiliary financial insights JSON
        #[arg(long)]
        insights: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rank several extraction documents by score
    Rank {
        #[arg(long = "input", required = true)]
        inputs: Vec<PathBuf>,
        /// Directory holding insights files named like the inputs
        #[arg(long)]
        insights_dir: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Also export the full ranking as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Print the effective decision policy
    Policy,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "startup_decision=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let policy = DecisionPolicy::resolve(cli.policy.as_deref())
        .context("failed to load decision policy")?;

    match cli.command {
        Commands::Analyze {
            input,
            company,
            insights,
            format,
            out,
        } => {
            let insights = insights.as_deref().map(read_insights).transpose()?;
            let analysis = analyze_file(&input, &company, insights.as_ref(), &policy)?;

            let rendered = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&analysis)?,
                OutputFormat::Markdown => report::build_report(&analysis),
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("Analysis written to {}", path.display());
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Rank {
            inputs,
            insights_dir,
            limit,
            csv,
        } => {
            let mut analyses = Vec::new();

            for input in inputs.iter() {
                let company = input
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let insights = match insights_dir.as_deref().and_then(|dir| sibling(dir, input)) {
                    Some(path) => Some(read_insights(&path)?),
                    None => None,
                };

                match analyze_file(input, &company, insights.as_ref(), &policy) {
                    Ok(analysis) => analyses.push(analysis),
                    Err(err) => warn!("Skipping {}: {err:#}", input.display()),
                }
            }

            if analyses.is_empty() {
                println!("No analyses could be produced.");
                return Ok(());
            }

            println!("{}", report::build_ranking(&analyses, limit));

            if let Some(path) = csv {
                let written = report::write_ranking_csv(&path, &analyses)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!("Wrote {written} rows to {}", path.display());
            }
        }
        Commands::Policy => {
            print!("{}", policy.to_toml()?);
        }
    }

    Ok(())
}

fn analyze_file(
    input: &Path,
    company: &str,
    insights: Option<&FinancialInsights>,
    policy: &DecisionPolicy,
) -> anyhow::Result<Analysis> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let reply = ExtractionReply::from_body_text(&text);
    let analysis = ingest(reply, company, insights, policy)
        .with_context(|| format!("analysis of {} failed", input.display()))?;
    Ok(analysis)
}

fn read_insights(path: &Path) -> anyhow::Result<FinancialInsights> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("insights file {} is not JSON", path.display()))?;
    Ok(normalize_insights(&raw))
}

fn sibling(dir: &Path, input: &Path) -> Option<PathBuf> {
    let candidate = dir.join(input.file_name()?);
    candidate.is_file().then_some(candidate)
}
