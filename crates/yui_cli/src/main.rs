use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use yui_core::{Article, Topic, TopicStore};
use yui_inference::OracleConfig;
use yui_pipeline::{ArticleOutcome, Pipeline, PipelineConfig, TopicOutcome};

mod logging;

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate, deduplicate and store advice topics and articles", long_about = None)]
pub struct Cli {
    #[arg(long, default_value = "json", help = "Record store backend: json (default) or memory")]
    storage: String,
    #[arg(long, env = "YUI_STORE_PATH", default_value = "data/questions.json")]
    store_path: PathBuf,
    #[arg(long, env = "YUI_MODEL", default_value = "ollama", help = "Oracle to use: ollama (default), deepseek or dummy")]
    model: String,
    #[arg(long, env = "YUI_MODEL_URL")]
    model_url: Option<String>,
    #[arg(long, env = "YUI_MODEL_NAME")]
    model_name: Option<String>,
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// JSON file with pipeline settings; flags below override it.
    #[arg(long, env = "YUI_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long)]
    max_attempts: Option<u32>,
    #[arg(long)]
    site_url: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug, Clone)]
enum Commands {
    /// Commit one topic, then write the article for the oldest pending topic
    Run,
    /// Commit up to COUNT new topics
    Topic {
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// Write the article for the oldest pending topic
    Article,
    /// Print every stored topic
    List,
}

#[derive(Serialize, Default)]
struct Report {
    topics: Vec<Topic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    article: Option<ArticleReport>,
}

#[derive(Serialize)]
struct ArticleReport {
    topic: Topic,
    article: Article,
}

fn pipeline_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(max_attempts) = cli.max_attempts {
        config.max_attempts = max_attempts;
    }
    if let Some(site_url) = &cli.site_url {
        config.site_url = site_url.clone();
    }
    Ok(config)
}

fn build_pipeline(cli: &Cli, config: PipelineConfig, store: Arc<dyn TopicStore>) -> anyhow::Result<Pipeline> {
    let oracle_config = OracleConfig {
        model: cli.model.clone(),
        model_url: cli.model_url.clone(),
        model_name: cli.model_name.clone(),
        api_key: cli.api_key.clone(),
        timeout: config.oracle_timeout(),
    };
    let oracle = yui_inference::create_model(&oracle_config)?;
    info!("🧠 Oracle ready (using {})", oracle.name());
    Ok(Pipeline::new(oracle, store, config))
}

async fn article(pipeline: &Pipeline, report: &mut Report) -> anyhow::Result<()> {
    match pipeline.run_article().await? {
        ArticleOutcome::Done { topic, article } => {
            report.article = Some(ArticleReport { topic, article });
        }
        ArticleOutcome::Exhausted { topic, attempts } => {
            info!("No article for #{} after {} attempts ({:?})", topic.id, attempts, topic.status);
        }
        ArticleOutcome::NoPendingTopic => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let cli = Cli::parse();
    let config = pipeline_config(&cli)?;

    let store: Arc<dyn TopicStore> = yui_storage::create_storage(&cli.storage, Some(&cli.store_path))
        .with_context(|| format!("Failed to open {} store at {}", cli.storage, cli.store_path.display()))?;
    info!("💾 Store ready (using {})", cli.storage);

    let mut report = Report::default();
    match cli.command.clone().unwrap_or(Commands::Run) {
        Commands::List => {
            println!("{}", serde_json::to_string_pretty(&store.all().await?)?);
            return Ok(());
        }
        Commands::Run => {
            let pipeline = build_pipeline(&cli, config, store)?;
            if let TopicOutcome::Done(topic) = pipeline.run_topic().await? {
                report.topics.push(topic);
            }
            article(&pipeline, &mut report).await?;
        }
        Commands::Topic { count } => {
            let pipeline = build_pipeline(&cli, config, store)?;
            report.topics = pipeline.run_batch(count).await?;
        }
        Commands::Article => {
            let pipeline = build_pipeline(&cli, config, store)?;
            article(&pipeline, &mut report).await?;
        }
    }

    info!(
        "✨ Produced {} topic(s) and {} article(s)",
        report.topics.len(),
        usize::from(report.article.is_some())
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_run() {
        let cli = Cli::parse_from(["yui"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.storage, "json");
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from(["yui", "--max-attempts", "7", "--site-url", "https://example.com", "topic", "--count", "3"]);
        let config = pipeline_config(&cli).unwrap();
        assert_eq!(config.max_attempts, 7);
        assert_eq!(config.site_url, "https://example.com");
        assert!(matches!(cli.command, Some(Commands::Topic { count: 3 })));
    }
}
