use anyhow::Result;
use coviz::assemble::{self, AxisSelection, Selection};
use coviz::fetch::{self, FetchCache};
use coviz::query::DateRange;
use coviz::series::{Category, DatasetRegistry, Evaluation};
use coviz::Config;
use std::fs;
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Countries plotted when none are passed on the command line.
const INITIAL_COUNTRIES: &[&str] = &["World", "Germany", "United States of America"];

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) config + client ──────────────────────────────────────────
    let config = Config::from_env();
    let client = fetch::http::build_client(&config)?;
    let cache = match &config.cache_dir {
        Some(dir) => Some(FetchCache::new(dir)?),
        None => None,
    };

    // ─── 3) build the dataset registry (once per process) ────────────
    let start = Instant::now();
    let registry = DatasetRegistry::fetch(&client, &config, cache.as_ref()).await?;
    info!(
        elapsed = ?start.elapsed(),
        countries = registry.countries().len(),
        rows = registry.dates().len(),
        "registry ready"
    );

    // ─── 4) compose a selection from args (or the default set) ───────
    let args: Vec<String> = std::env::args().skip(1).collect();
    let countries: Vec<String> = if args.is_empty() {
        INITIAL_COUNTRIES.iter().map(|c| c.to_string()).collect()
    } else {
        args
    };
    for country in &countries {
        if !registry.contains_country(country) {
            anyhow::bail!("unknown country `{}`", country);
        }
    }

    let selection = Selection {
        countries,
        x: AxisSelection::new(Category::Time, Evaluation::Cumulative),
        y: AxisSelection::new(Category::Confirmed, Evaluation::Cumulative),
        range: DateRange::full(),
    };

    // ─── 5) chart bundle to stdout, workbook to disk ─────────────────
    if let Some(bundle) = assemble::chart::chart_bundle(&registry, &selection)? {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
    }

    if let Some(buffer) = assemble::xlsx::workbook(&registry, &selection)? {
        fs::write("data.xlsx", &buffer)?;
        info!(
            bytes = buffer.len(),
            mime = assemble::XLSX_MIME,
            "wrote data.xlsx"
        );
    }

    info!("all done");
    Ok(())
}
