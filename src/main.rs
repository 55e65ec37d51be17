use std::fs;

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use financial_warrior::api::{Cli, Command, build_config, build_projection, run_http_server};
use financial_warrior::export::render_plan;
use financial_warrior::store::{FileStore, SnapshotStore, load_session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Serve(args) => {
            let config = build_config(args).map_err(|e| anyhow!(e))?;
            run_http_server(config).await?;
        }
        Command::Project(args) => {
            let projection = build_projection(&args).map_err(|e| anyhow!(e))?;
            println!("{}", serde_json::to_string_pretty(&projection)?);
        }
        Command::Export(args) => {
            let store = FileStore::in_dir(&args.store.data_dir);
            let text = render_plan(&load_session(&store));
            match args.output {
                Some(path) => {
                    fs::write(&path, text)
                        .with_context(|| format!("writing plan to {}", path.display()))?;
                    info!(path = %path.display(), "plan exported");
                }
                None => print!("{text}"),
            }
        }
        Command::Reset(args) => {
            let store = FileStore::in_dir(&args.data_dir);
            store.clear().context("clearing saved progress")?;
            info!(path = %store.path().display(), "saved progress cleared");
        }
    }

    Ok(())
}
