//! shotdiff CLI - cross-revision screenshot comparison
//!
//! Usage:
//!   shotdiff compare <request>      Classify a comparison and print per-platform results
//!   shotdiff report <request>       Print the plain-text change report
//!   shotdiff normalize <name>       Print the canonical combination key
//!   shotdiff init                   Write the default configuration

mod request;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use shotdiff_compare::{
    normalize, ChangeReport, ComparisonEngine, ComparisonReport, NameContext, PlatformReport,
    ReportLinks, RowFilter, RuleSet,
};
use shotdiff_core::fail_open::fail_open;
use shotdiff_core::ShotdiffConfig;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::request::RequestFile;

#[derive(Parser)]
#[command(name = "shotdiff")]
#[command(author, version, about = "Compare browser UI screenshots across revisions")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a comparison request and print per-platform results
    Compare {
        /// Request JSON (both sides' screenshots and comparator outcomes)
        request: PathBuf,

        /// Known-inconsistency rules (defaults to the configured path)
        #[arg(long, value_name = "FILE")]
        rules: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Hide similar rows
        #[arg(long)]
        hide_similar: bool,

        /// Hide rows with a missing source image
        #[arg(long)]
        hide_missing: bool,

        /// Hide known inconsistencies
        #[arg(long)]
        hide_known: bool,

        /// Only show rows whose `{platform}_{name}` matches (case-insensitive regex)
        #[arg(long, value_name = "REGEX")]
        filter: Option<String>,
    },

    /// Print the plain-text change report for a comparison request
    Report {
        /// Request JSON
        request: PathBuf,

        /// Known-inconsistency rules (defaults to the configured path)
        #[arg(long, value_name = "FILE")]
        rules: Option<PathBuf>,
    },

    /// Print the canonical combination key for a raw name
    Normalize {
        /// Raw combination name
        name: String,

        /// Strip the legacy free-text prefix
        #[arg(long)]
        legacy: bool,
    },

    /// Write the default configuration
    Init {
        /// Root directory (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Compare {
            request,
            rules,
            format,
            hide_similar,
            hide_missing,
            hide_known,
            filter,
        } => {
            cmd_compare(
                request,
                rules,
                format,
                hide_similar,
                hide_missing,
                hide_known,
                filter,
            )
            .await
        }
        Commands::Report { request, rules } => cmd_report(request, rules).await,
        Commands::Normalize { name, legacy } => cmd_normalize(name, legacy),
        Commands::Init { path } => cmd_init(path),
    }
}

/// Load the rule set, running without suppression if it cannot be loaded
async fn load_rules(config: &ShotdiffConfig, path: Option<PathBuf>) -> RuleSet {
    let path = path.unwrap_or_else(|| config.rules_path.clone());
    fail_open("known-inconsistency rules", || read_rules(&path))
        .await
        .unwrap_or_default()
}

async fn read_rules(path: &Path) -> shotdiff_core::Result<RuleSet> {
    let content = tokio::fs::read_to_string(path).await?;
    RuleSet::from_json(&content)
}

async fn load_request(path: &Path) -> Result<RequestFile> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read request file {:?}", path))?;
    serde_json::from_str(&content).context("Failed to parse request JSON")
}

async fn cmd_compare(
    request_path: PathBuf,
    rules_path: Option<PathBuf>,
    format: OutputFormat,
    hide_similar: bool,
    hide_missing: bool,
    hide_known: bool,
    filter: Option<String>,
) -> Result<()> {
    let config = ShotdiffConfig::load_or_default(Path::new("."))?;
    let rules = load_rules(&config, rules_path).await;
    let request = load_request(&request_path).await?.into_request(&config.legacy_prefix);

    let mut row_filter = RowFilter::from_defaults(&config.display);
    row_filter.hide_similar |= hide_similar;
    row_filter.hide_missing |= hide_missing;
    row_filter.hide_known_inconsistencies |= hide_known;
    if let Some(pattern) = filter {
        row_filter = row_filter.with_pattern(&pattern)?;
    }

    info!(
        "Comparing {}/{} to {}/{}",
        request.old.revision.project,
        request.old.revision.revision,
        request.new.revision.project,
        request.new.revision.revision
    );
    let engine =
        ComparisonEngine::new(rules).with_comparison_base_url(config.comparison_base_url.clone());
    let report = engine.compare(&request);

    match format {
        OutputFormat::Json => {
            let visible = visible_report(&report, &row_filter);
            println!("{}", serde_json::to_string_pretty(&visible)?);
        }
        OutputFormat::Text => print_report(&report, &row_filter),
    }

    Ok(())
}

/// Copy of the report keeping only visible rows; summaries cover all rows
fn visible_report(report: &ComparisonReport, filter: &RowFilter) -> ComparisonReport {
    ComparisonReport {
        platforms: report
            .platforms
            .iter()
            .map(|platform| PlatformReport {
                summary: platform.summary.clone(),
                rows: filter.visible_rows(platform).cloned().collect(),
            })
            .collect(),
    }
}

fn print_report(report: &ComparisonReport, filter: &RowFilter) {
    if report.platforms.is_empty() {
        println!("No screenshots found");
        return;
    }

    for platform in &report.platforms {
        let summary = &platform.summary;
        let marker = if summary.all_similar {
            " [all similar]"
        } else if summary.all_differences_known {
            " [only known inconsistencies]"
        } else {
            ""
        };
        println!("== {} ({}){} ==", summary.platform, summary.summary_line(), marker);

        let rows: Vec<_> = filter.visible_rows(platform).collect();
        let width = rows
            .iter()
            .map(|row| row.display_name.len())
            .max()
            .unwrap_or(0);
        for row in rows {
            let kind = match &row.known_inconsistency_reason {
                Some(reason) if reason.is_empty() => format!("{} (known)", row.result_kind),
                Some(reason) => format!("{} (known: {})", row.result_kind, reason),
                None => row.result_kind.to_string(),
            };
            println!("  {:<width$}  {}  {}", row.display_name, kind, row.payload, width = width);
        }
        println!();
    }
}

async fn cmd_report(request_path: PathBuf, rules_path: Option<PathBuf>) -> Result<()> {
    let config = ShotdiffConfig::load_or_default(Path::new("."))?;
    let rules = load_rules(&config, rules_path).await;
    let request = load_request(&request_path).await?.into_request(&config.legacy_prefix);

    if request.single_revision_view {
        anyhow::bail!("A change report needs both an old and a new revision");
    }

    let engine =
        ComparisonEngine::new(rules).with_comparison_base_url(config.comparison_base_url.clone());
    let report = engine.compare(&request);

    match ChangeReport::render(
        &request.old.revision,
        &request.new.revision,
        &report,
        &ReportLinks::from(&config),
    ) {
        Some(change) => {
            println!("Subject: {}\n", change.subject);
            print!("{}", change.body);
        }
        None => println!("No differences found"),
    }

    Ok(())
}

fn cmd_normalize(name: String, legacy: bool) -> Result<()> {
    let context = if legacy {
        NameContext::legacy()
    } else {
        NameContext::current()
    };
    println!("{}", normalize(&name, context));
    Ok(())
}

fn cmd_init(path: PathBuf) -> Result<()> {
    info!("Initializing shotdiff in {:?}", path);

    let config_path = ShotdiffConfig::write_default(&path)?;

    println!("Initialized shotdiff in {:?}", path);
    println!("Created:");
    println!("  {}", config_path.display());

    Ok(())
}
