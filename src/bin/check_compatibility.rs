// Companion/conflict check for a set of plants
//
// Usage: cargo run --release --bin check_compatibility -- tomato cabbage basil [--lang fr] [--json]

use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xcrop_advisor::{
    AdvisorConfig, CompanionResolver, JsonFormatter, Language, MarkdownFormatter,
    RecommendationResult, RuleStore,
};

/// Check companions and conflicts for plants grown together
#[derive(Parser, Debug)]
#[command(name = "check_compatibility")]
#[command(version, about, long_about = None)]
#[command(group(ArgGroup::new("input").required(true).args(["plants", "list"])))]
struct Cli {
    /// Plants to grow together (case-insensitive)
    plants: Vec<String>,

    /// List the plants known to the rule database
    #[arg(long)]
    list: bool,

    /// Print JSON instead of Markdown
    #[arg(long)]
    json: bool,

    /// Output language (en, fr)
    #[arg(long)]
    lang: Option<Language>,

    /// Directory holding the rule database
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xcrop_advisor=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = AdvisorConfig::from_env()?;
    if let Some(language) = cli.lang {
        config.language = language;
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }

    // Only the rule database is needed; no training for this path
    let rules = RuleStore::load(&config.rules_path())?;

    if cli.list {
        for name in rules.display_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let report = CompanionResolver::new(&rules).check(&cli.plants, config.language);
    if report.has_conflicts() {
        tracing::warn!("{} conflicting plants in selection", report.conflicts.len());
    }
    let result = RecommendationResult::from_compatibility(report, config.language);

    if cli.json {
        println!("{}", JsonFormatter::format(&result)?);
    } else {
        println!("{}", MarkdownFormatter::format(&result));
    }

    Ok(())
}
