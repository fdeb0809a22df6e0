//! Offline Proxy - Main Entry Point
//!
//! Installs and activates a worker over the real network, then pushes each
//! URL given on the command line through it.
//!
//! ```text
//! offline-proxy [--config worker.json] <url>...
//! ```

use std::sync::Arc;

use anyhow::{Context, bail};
use offline_core::{CacheConfig, Destination, FetchOutcome, MemoryCacheStorage, OfflineWorker, Request};
use offline_net::HttpFetcher;
use tracing_subscriber::EnvFilter;

struct Args {
    config: Option<String>,
    urls: Vec<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let mut parsed = Args {
        config: None,
        urls: Vec::new(),
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                parsed.config = Some(args.next().context("--config needs a path")?);
            }
            flag if flag.starts_with('-') => bail!("unknown flag {flag}"),
            _ => parsed.urls.push(arg),
        }
    }
    Ok(parsed)
}

/// Guess the request destination from the URL's extension
fn destination_for(url: &str) -> Destination {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    if path.ends_with(".js") {
        Destination::Script
    } else if path.ends_with(".css") {
        Destination::Style
    } else if path.ends_with(".html") || path.ends_with('/') {
        Destination::Document
    } else {
        Destination::Empty
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    let config = match &args.config {
        Some(path) => CacheConfig::load(path).with_context(|| format!("loading {path}"))?,
        None => CacheConfig::default(),
    };

    tracing::info!("Offline worker v{} for scope {}", offline_core::VERSION, config.scope);

    let fetcher = HttpFetcher::builder(&config.scope)?.build()?;
    let mut worker = OfflineWorker::builder(Arc::new(MemoryCacheStorage::new()), Arc::new(fetcher))
        .config(config)
        .build()?;

    smol::block_on(async {
        let installed = worker.install().await?;
        for (url, reason) in &installed.skipped {
            println!("skipped {url}: {reason}");
        }
        worker.activate().await?;

        for url in &args.urls {
            let request = Request::get(url).with_destination(destination_for(url));
            let class = worker.dispatcher().classifier().classify(url);
            match worker.fetch(&request).await {
                FetchOutcome::Respond(response) => println!(
                    "{url} [{class}] {} {} ({} bytes)",
                    response.status,
                    response.status_text,
                    response.body.len()
                ),
                FetchOutcome::Passthrough => println!("{url} [{class}] passthrough"),
            }
        }
        anyhow::Ok(())
    })
}
