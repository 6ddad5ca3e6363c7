use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use catalog_core::config::{expand_path, Config};
use catalog_core::{AppId, Document, RecommendationRequest, UserProfile};
use catalog_hybrid::SearchRequest;
use catalog_index::CatalogService;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "Usage: catalog-cli [--catalog <file.json>] <command> [args...]

Commands:
  search <query> [--top-k N] [--semantic-weight W] [--category C] [--free-only | --paid-only]
  web <id,id,...> [--depth D] [--max N]
  recommend <id,id,...> [--wishlist id,id] [--top-k N] [--diversity D]
  similar <id> [--top-k N]
  health";

const EMBED_BATCH: usize = 64;

struct Args {
    catalog: Option<PathBuf>,
    command: String,
    positional: Vec<String>,
    flags: Vec<(String, Option<String>)>,
}

impl Args {
    fn flag(&self, name: &str) -> Option<&str> {
        self.flags.iter().find(|(k, _)| k == name).and_then(|(_, v)| v.as_deref())
    }

    fn has(&self, name: &str) -> bool { self.flags.iter().any(|(k, _)| k == name) }

    fn parsed<T: std::str::FromStr>(&self, name: &str) -> anyhow::Result<Option<T>> {
        match self.flag(name) {
            Some(v) => v.parse().map(Some).map_err(|_| anyhow::anyhow!("--{name} expects a number, got '{v}'")),
            None => Ok(None),
        }
    }
}

fn parse_args() -> Args {
    let mut raw: Vec<String> = env::args().skip(1).collect();
    if raw.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }

    let mut catalog = None;
    let mut positional = Vec::new();
    let mut flags = Vec::new();
    let mut i = 0;
    while i < raw.len() {
        let arg = std::mem::take(&mut raw[i]);
        if let Some(name) = arg.strip_prefix("--") {
            let takes_value = !matches!(name, "free-only" | "paid-only");
            let value = if takes_value && i + 1 < raw.len() { i += 1; Some(std::mem::take(&mut raw[i])) } else { None };
            if name == "catalog" { catalog = value.map(expand_path); } else { flags.push((name.to_string(), value)); }
        } else {
            positional.push(arg);
        }
        i += 1;
    }
    if positional.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let command = positional.remove(0);
    Args { catalog, command, positional, flags }
}

fn parse_ids(list: &str) -> anyhow::Result<Vec<AppId>> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().parse::<AppId>().with_context(|| format!("invalid app id '{s}'")))
        .collect()
}

fn load_catalog(path: &Path) -> anyhow::Result<Vec<Document>> {
    let file = File::open(path).with_context(|| format!("opening catalog {}", path.display()))?;
    let documents: Vec<Document> =
        serde_json::from_reader(BufReader::new(file)).with_context(|| format!("parsing catalog {}", path.display()))?;
    Ok(documents)
}

/// Embed in batches with a progress bar, then publish the first generation.
fn build_index(service: &CatalogService, documents: Vec<Document>) -> anyhow::Result<()> {
    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} apps ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    let mut embeddings = Vec::with_capacity(documents.len());
    for batch in documents.chunks(EMBED_BATCH) {
        let texts: Vec<String> = batch.iter().map(Document::embedding_text).collect();
        embeddings.extend(service.embedder().embed_batch(&texts)?);
        pb.inc(batch.len() as u64);
    }
    pb.finish_with_message("embedded");

    let generation = service.reindex(documents, embeddings)?;
    info!(generation, "catalog indexed");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let args = parse_args();

    let catalog = args.catalog.clone().unwrap_or_else(|| {
        let path: String = config.get("data.catalog_path").unwrap_or_else(|_| "../dev_data/catalog.json".to_string());
        expand_path(path)
    });

    let service = CatalogService::from_settings(settings)?;
    if args.command != "health" || catalog.exists() {
        println!("Loading catalog from {}", catalog.display());
        build_index(&service, load_catalog(&catalog)?)?;
    }

    match args.command.as_str() {
        "search" => {
            let Some(query) = args.positional.first() else { bail!("search needs a query\n{USAGE}") };
            let mut request = SearchRequest::new(query.as_str());
            request.top_k = args.parsed("top-k")?;
            request.semantic_weight = args.parsed("semantic-weight")?;
            request.category_filter = args.flag("category").map(str::to_string);
            if args.has("free-only") { request.free_only = Some(true); }
            if args.has("paid-only") { request.free_only = Some(false); }

            let response = service.search(&request)?;
            println!("\n🔍 {} results for \"{}\" ({:.2} ms)", response.total_results, response.query, response.search_time_ms);
            for (i, r) in response.results.iter().enumerate() {
                println!("  {}. [{}] {} score={:.4} id={} category={}", i + 1, r.match_type, r.name, r.relevance_score, r.app_id, r.category);
            }
            println!(
                "\nmodel={} semantic={:.2} keyword={:.2} generation={}",
                response.metadata.model, response.metadata.semantic_weight, response.metadata.keyword_weight, response.metadata.generation
            );
        }
        "web" => {
            let ids = parse_ids(args.positional.first().map_or("", String::as_str))?;
            let request = RecommendationRequest::new(
                ids,
                args.parsed("depth")?.unwrap_or(2),
                args.parsed("max")?.unwrap_or(20),
            );
            let web = service.recommendation_web(&request)?;
            println!("{}", serde_json::to_string_pretty(&web)?);
        }
        "recommend" => {
            let mut profile = UserProfile::with_installed(parse_ids(args.positional.first().map_or("", String::as_str))?);
            if let Some(wishlist) = args.flag("wishlist") {
                profile.wishlist_ids.extend(parse_ids(wishlist)?);
            }
            let recs = service.personalized_recommendations(
                &profile,
                args.parsed("top-k")?.unwrap_or(20),
                args.parsed("diversity")?,
            )?;
            println!("\n⭐ {} recommendations", recs.len());
            for (i, r) in recs.iter().enumerate() {
                println!("  {}. {} score={:.4} id={} ({})", i + 1, r.name, r.recommendation_score, r.app_id, r.reason);
            }
        }
        "similar" => {
            let Some(id) = args.positional.first() else { bail!("similar needs an app id\n{USAGE}") };
            let id: AppId = id.parse().with_context(|| format!("invalid app id '{id}'"))?;
            let name = service.document(id)?.name;
            let similar = service.similar_apps(id, args.parsed("top-k")?.unwrap_or(10))?;
            println!("\n🔗 Apps similar to {name}:");
            for (i, s) in similar.iter().enumerate() {
                println!("  {}. {} similarity={:.4} id={}", i + 1, s.name, s.similarity_score, s.app_id);
            }
        }
        "health" => println!("{}", serde_json::to_string_pretty(&service.health())?),
        other => bail!("Unknown command: {other}\n{USAGE}"),
    }
    Ok(())
}
