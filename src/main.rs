//! Statuscycle CLI
//!
//! Loads animation definitions from a JSON file and rotates the chat status
//! through the chosen one until interrupted.

use clap::Parser;
use statuscycle::{
    AnimationStore, DryRunPublisher, HttpPresencePublisher, LogMode, MemoryStore,
    PresencePublisher, RotationEngine, RotatorConfig, StaticCatalog, StrftimeEvaluator,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Statuscycle - cycle your chat status through animated frames
#[derive(Parser, Debug)]
#[command(name = "statuscycle")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with animation definitions
    #[arg(short, long, default_value = "animations.json")]
    animations: PathBuf,

    /// Name of the animation to rotate
    #[arg(short, long, required_unless_present = "list")]
    start: Option<String>,

    /// Per-frame display output: none, minimal or detailed
    #[arg(long, default_value = "minimal")]
    log_mode: String,

    /// Presence endpoint URL; omit for a dry run that only logs updates
    #[arg(long)]
    endpoint: Option<String>,

    /// Minimum allowed frame interval in milliseconds
    #[arg(long, default_value_t = statuscycle::animation::DEFAULT_MIN_INTERVAL_MS)]
    min_interval_ms: u64,

    /// List the loaded animations and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let log_mode: LogMode = cli.log_mode.parse()?;
    let config = RotatorConfig::default()
        .with_min_interval_ms(cli.min_interval_ms)
        .with_log_mode(log_mode);

    let store = Arc::new(
        MemoryStore::load_from_file(&cli.animations, config.min_interval_ms).await?,
    );

    if cli.list {
        for animation in store.list().await {
            println!(
                "{}  ({} frames, {}ms interval)",
                animation.name,
                animation.frame_count(),
                animation.interval_ms
            );
        }
        return Ok(());
    }

    let publisher: Arc<dyn PresencePublisher> = match &cli.endpoint {
        Some(endpoint) => {
            let token = std::env::var("STATUS_TOKEN").map_err(|_| {
                anyhow::anyhow!("STATUS_TOKEN must be set when --endpoint is used")
            })?;
            Arc::new(HttpPresencePublisher::new(endpoint.clone(), token))
        }
        None => {
            info!("No presence endpoint configured, running dry");
            Arc::new(DryRunPublisher)
        }
    };

    let engine = RotationEngine::new(
        store.clone(),
        publisher,
        Arc::new(StaticCatalog::default()),
        Arc::new(StrftimeEvaluator),
        config,
    );

    let name = cli
        .start
        .ok_or_else(|| anyhow::anyhow!("--start is required unless --list is given"))?;
    let animation = store
        .find_by_name(&name)
        .await
        .ok_or_else(|| anyhow::anyhow!("No animation named \"{}\"", name))?;

    engine.start(&animation.id).await?;

    tokio::signal::ctrl_c().await?;
    engine.stop().await;
    // The engine leaves the persisted active flag to its caller.
    store.clear_all_active().await?;

    Ok(())
}
