use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use quill_db::{keys, Database};
use quill_server::{AppState, QuillServer, ServerConfig};
use quill_store::redis_store::redact;
use quill_store::{KeyValueStore, RedisKvStore};

use crate::cli::{CheckArgs, Cli, Command, ServeArgs};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    match cli.command {
        Command::Serve(args) => runtime.block_on(cmd_serve(args)),
        Command::Check(args) => runtime.block_on(cmd_check(args)),
    }
}

/// Defaults, then the config file, then `PORT`/`REDIS_URL`, then flags.
fn load_config(
    path: Option<&Path>,
    port: Option<u16>,
    redis_url: Option<String>,
) -> anyhow::Result<ServerConfig> {
    let mut config = match path {
        Some(path) => ServerConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ServerConfig::default(),
    };
    config.apply_process_env()?;
    if let Some(port) = port {
        config.bind_addr.set_port(port);
    }
    if redis_url.is_some() {
        config.redis_url = redis_url;
    }
    config.validate()?;
    Ok(config)
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref(), args.port, args.redis_url)?;
    let state = if args.memory {
        tracing::warn!("using the in-memory store; data is lost on exit");
        AppState::in_memory(&config).await?
    } else {
        AppState::connect(&config)
            .await
            .with_context(|| format!("connecting to {}", redact(config.redis_url())))?
    };

    let backend = if args.memory {
        "memory".to_string()
    } else {
        redact(config.redis_url())
    };
    println!(
        "{} Quill on {} (store: {})",
        "✓".green().bold(),
        config.bind_addr.to_string().bold(),
        backend.as_str().cyan()
    );
    QuillServer::new(config, state).serve().await?;
    Ok(())
}

async fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref(), None, args.redis_url)?;
    let url = redact(config.redis_url());
    let store = RedisKvStore::connect(config.redis_url())
        .await
        .with_context(|| format!("connecting to {url}"))?;
    let store: Arc<dyn KeyValueStore> = Arc::new(store);
    let db = Database::new(store.clone());
    db.init().await?;

    let users = db.get_all_users().await?;
    let posts = db.get_all_posts().await?;
    let last_post_id = store.get_string(keys::LAST_POST_ID).await?;

    println!("{} {}", "✓".green().bold(), url.as_str().cyan());
    println!("  users: {}", users.len().to_string().bold());
    println!("  posts: {}", posts.len().to_string().bold());
    match last_post_id {
        Some(id) => println!("  {}: {}", keys::LAST_POST_ID, id.as_str().yellow()),
        None => println!("  {}: {}", keys::LAST_POST_ID, "not initialized".yellow()),
    }
    Ok(())
}
