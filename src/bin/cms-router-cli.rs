use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use cms_router::config::loader::{apply_env_overrides, finalize, load_config};
use cms_router::config::CmsConfig;
use cms_router::content::listing::parse_listing;
use cms_router::engine::Engine;
use cms_router::routing::redirect::match_redirect;

#[derive(Parser)]
#[command(name = "cms-router-cli")]
#[command(about = "Inspect routing decisions of the CMS router", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Falls back to CMS_* environment variables.
    #[arg(short, long, env = "CMS_ROUTER_CONFIG")]
    config: Option<PathBuf>,

    /// Content origin to fetch redirect listings from (for `match --remote`).
    #[arg(long, default_value = "http://localhost:3000")]
    origin: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the candidate content locations for a path
    Resolve { path: String },
    /// Match a path against a redirect listing
    Match {
        /// Listing file, or a listing path on --origin with --remote
        listing: String,
        path: String,
        #[arg(long)]
        remote: bool,
    },
    /// Check whether an editor origin may launch the CMS editor
    Editor { url: String },
    /// Run the full routing decision against the configured content store
    Route { path: String },
}

fn load(cli: &Cli) -> Result<CmsConfig, Box<dyn std::error::Error>> {
    Ok(match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let mut config = CmsConfig::default();
            apply_env_overrides(&mut config, |key| std::env::var(key).ok());
            finalize(config)?
        }
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let output: Value = match &cli.command {
        Commands::Resolve { path } => {
            let engine = Engine::from_config(&load(&cli)?)?;
            let resolver = engine.router.resolver();
            json!({
                "path": path,
                "content_root": resolver.content_root(),
                "default_document": resolver.default_document(),
                "candidates": resolver.candidates(path),
            })
        }
        Commands::Match { listing, path, remote } => {
            let body = if *remote {
                let url = reqwest::Url::parse(&cli.origin)?.join(listing)?;
                let res = reqwest::get(url).await?;
                if !res.status().is_success() {
                    eprintln!("Error: listing request returned status {}", res.status());
                    return Ok(());
                }
                res.bytes().await?.to_vec()
            } else {
                std::fs::read(listing)?
            };
            let rules = parse_listing(&body)?;
            json!({ "path": path, "rules": rules.len(), "redirect": match_redirect(&rules, path) })
        }
        Commands::Editor { url } => {
            let engine = Engine::from_config(&load(&cli)?)?;
            let script = engine.validator.editor_script_url(url);
            json!({ "origin": url, "authorized": script.is_some(), "editor_script": script })
        }
        Commands::Route { path } => {
            let engine = Engine::from_config(&load(&cli)?)?;
            let decision = engine.router.route(path).await;
            json!({ "path": path, "result": decision })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
