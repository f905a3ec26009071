//! `route-engine` inspection CLI.
//!
//! Loads a route tree from a TOML config and answers questions about it:
//! rank order, what a pathname resolves to, relative path resolution, and
//! what a full navigation commits.

use clap::{Parser, Subcommand};
use route_engine::config::loader::load_config;
use route_engine::config::EngineConfig;
use route_engine::location::{JsonSearchSerializer, RouteMask, SearchSerializer};
use route_engine::matches::MatchRoutesOptions;
use route_engine::observability::logging::init_logging;
use route_engine::routing::path::resolve_path;
use route_engine::{BuildOptions, MemoryHistory, RouteMatch, RouteTree, Router};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "route-engine")]
#[command(about = "Inspect route trees and navigations", long_about = None)]
struct Cli {
    /// TOML configuration with `[router]` settings and a `[[routes]]` tree
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print routes in match order
    Ranks,
    /// Resolve a pathname into its match chain
    Match {
        pathname: String,
        /// Query string, e.g. `?page=2`
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Resolve a relative path against a base path
    Resolve { from: String, to: String },
    /// Navigate a fresh router to an href and print the committed state
    Navigate { href: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    init_logging(&config.logging);

    let tree = RouteTree::from_config(&config.routes)?;
    tracing::debug!(routes = tree.len(), "Route tree built");

    match cli.command {
        Commands::Ranks => {
            for (rank, id) in tree.flat().iter().enumerate() {
                let node = tree.node(*id);
                println!("{rank:>4}  {:<40} {}", node.full_path, node.id);
            }
        }
        Commands::Match { pathname, search } => {
            let router = build_router(&config, tree)?;
            let search = JsonSearchSerializer.parse(&search);
            let matches = router.match_routes(&pathname, &search, MatchRoutesOptions::default())?;
            print_json(&json!({ "matches": matches_json(&matches) }))?;
        }
        Commands::Resolve { from, to } => {
            println!(
                "{}",
                resolve_path(&config.router.basepath, &from, &to, config.router.trailing_slash)
            );
        }
        Commands::Navigate { href } => {
            let router = build_router(&config, tree)?;
            router.load().await;
            router.navigate(BuildOptions::to(href)).await?;

            let state = router.state();
            print_json(&json!({
                "href": state.location.href,
                "maskedHref": state.location.masked_location.as_ref().map(|m| m.href.clone()),
                "statusCode": state.status_code,
                "matches": matches_json(&state.matches),
                "cached": state.cached_matches.len(),
            }))?;
        }
    }

    Ok(())
}

fn build_router(config: &EngineConfig, tree: RouteTree) -> Result<Router, Box<dyn std::error::Error>> {
    let mut builder = Router::builder(tree)
        .config(config.router.clone())
        .history(Arc::new(MemoryHistory::new("/")));
    for mask in &config.masks {
        builder = builder.route_mask(RouteMask::from(mask));
    }
    Ok(builder.build()?)
}

fn matches_json(matches: &[RouteMatch]) -> serde_json::Value {
    matches
        .iter()
        .map(|m| {
            json!({
                "id": m.id,
                "routeId": m.route_id,
                "pathname": m.pathname,
                "params": serde_json::Value::from(&m.params),
                "search": serde_json::Value::from(&m.search),
                "status": m.status,
                "error": m.error.as_ref().map(|e| e.to_string()),
            })
        })
        .collect()
}

fn print_json(value: &serde_json::Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
