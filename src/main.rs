//! Mini Cache snapshot inspector
//!
//! Loads a snapshot written by `Cache::save` and prints its statistics and
//! keys. With `--compact`, expired entries are swept and the snapshot is
//! written back in place.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_cache::{Cache, Config};

#[derive(Parser, Debug)]
#[command(name = "mini_cache")]
#[command(about = "Inspect a mini_cache snapshot file", long_about = None)]
struct Args {
    /// Snapshot file written by `Cache::save`
    snapshot: PathBuf,

    /// Sweep expired entries and rewrite the snapshot
    #[arg(short, long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let path = &args.snapshot;

    let config = Config::from_env();
    let cache = Cache::load_with_config(path, &config)
        .await
        .with_context(|| format!("failed to load snapshot '{}'", path.display()))?;

    if args.compact {
        let removed = cache.sweep_expired().await?;
        cache
            .save(path)
            .await
            .with_context(|| format!("failed to rewrite snapshot '{}'", path.display()))?;
        info!("Compacted snapshot: removed {} expired entries", removed);
    }

    println!("{}", cache.stats().await?);
    let mut keys = cache.inspect().await?;
    keys.sort_by(|a, b| a.key.cmp(&b.key));
    for info in keys {
        let remaining = match info.ttl_remaining_ms {
            None => "never expires".to_string(),
            Some(_) if info.expired => "expired".to_string(),
            Some(ms) => format!("{}s left", ms / 1000),
        };
        let window = if info.tracked { " [recent]" } else { "" };
        println!("{} ({} bytes, ttl {}s, {}){}", info.key, info.size, info.ttl, remaining, window);
    }
    Ok(())
}
