// Recommend a crop for one soil/climate reading
//
// Usage:
//   cargo run --release --bin recommend_crop -- N=90,P=42,K=43,temperature=25,humidity=80,ph=6.5,rainfall=120
//   cargo run --release --bin recommend_crop -- --sensor --lang fr --json

use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xcrop_advisor::{
    AdvisorConfig, FeatureVector, JsonFormatter, Language, MarkdownFormatter, RecommendationEngine,
};

/// Recommend a crop from soil nutrients and climate readings
#[derive(Parser, Debug)]
#[command(name = "recommend_crop")]
#[command(version, about, long_about = None)]
#[command(group(ArgGroup::new("input").required(true).args(["features", "sensor"])))]
struct Cli {
    /// Readings as N=..,P=..,K=..,temperature=..,humidity=..,ph=..,rainfall=..
    features: Option<FeatureVector>,

    /// Use the simulated sensor reading instead of explicit values
    #[arg(long)]
    sensor: bool,

    /// Print JSON instead of Markdown
    #[arg(long)]
    json: bool,

    /// Output language (en, fr)
    #[arg(long)]
    lang: Option<Language>,

    /// Directory holding the training CSV and rule files
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl Cli {
    fn reading(&self) -> FeatureVector {
        self.features.unwrap_or_else(FeatureVector::sensor_preset)
    }
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

    let engine = RecommendationEngine::from_config(&config)?;
    let result = engine.recommend(&cli.reading())?;

    if cli.json {
        println!("{}", JsonFormatter::format(&result)?);
    } else {
        println!("{}", MarkdownFormatter::format(&result));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_feature_list() {
        let cli = Cli::try_parse_from([
            "recommend_crop",
            "N=90,P=42,K=43,temperature=25,humidity=80,ph=6.5,rainfall=120",
            "--lang",
            "fr",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.reading().rainfall, 120.0);
        assert_eq!(cli.lang, Some(Language::French));
        assert!(cli.json);
    }

    #[test]
    fn test_sensor_flag_uses_preset() {
        let cli = Cli::try_parse_from(["recommend_crop", "--sensor"]).unwrap();
        assert_eq!(cli.reading(), FeatureVector::sensor_preset());
        assert_eq!(cli.data_dir, None);
    }

    #[test]
    fn test_rejects_missing_input_and_bad_values() {
        assert!(Cli::try_parse_from(["recommend_crop"]).is_err());
        assert!(Cli::try_parse_from(["recommend_crop", "N=90,P=42"]).is_err());
        assert!(Cli::try_parse_from(["recommend_crop", "--sensor", "--lang", "klingon"]).is_err());
        assert!(Cli::try_parse_from(["recommend_crop", "--sensor", "--verbose"]).is_err());
    }
}
