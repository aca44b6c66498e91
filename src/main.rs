use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;

use address_harvest::parser::source::{validate_selectors, HtmlSnapshot};
use address_harvest::settings::Settings;
use address_harvest::sync::SyncClient;
use address_harvest::{db, server, AddressExtractor, Error, Extraction};

#[derive(Parser)]
#[command(name = "address_harvest", about = "Pull postal addresses out of saved listing pages")]
struct Cli {
    /// Settings file (default: ./harvest.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract addresses from saved HTML pages
    Extract {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print the full extraction report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Extract from one page and push the result to the collector
    Sync {
        file: PathBuf,
        /// Collector base URL (overrides settings)
        #[arg(short, long)]
        url: Option<String>,
    },
    /// Run the collector service
    Serve {
        /// Listen address (overrides settings)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Show stored addresses
    List,
    /// Delete all stored addresses
    Clear,
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: &'a Path,
    #[serde(flatten)]
    extraction: &'a Extraction,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    let result = match cli.command {
        Commands::Extract { files, json } => {
            let extractor = build_extractor(&settings)?;
            let results: Vec<(PathBuf, anyhow::Result<Extraction>)> = files
                .into_par_iter()
                .map(|path| {
                    let out = extract_file(&extractor, &path);
                    (path, out)
                })
                .collect();

            let mut reports = Vec::new();
            for (path, out) in &results {
                match out {
                    Ok(extraction) => reports.push(FileReport {
                        file: path,
                        extraction,
                    }),
                    Err(e) => eprintln!("{}: {:#}", path.display(), e),
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    print_report(report, results.len() > 1);
                }
            }
            Ok(())
        }
        Commands::Sync { file, url } => {
            let extractor = build_extractor(&settings)?;
            let extraction = extract_file(&extractor, &file)?;
            if extraction.addresses.is_empty() {
                println!("No addresses found.");
                return Ok(());
            }

            let base = url.unwrap_or_else(|| settings.collector_url.clone());
            let client = SyncClient::new(&base);
            println!(
                "Found {} addresses. Syncing to {}...",
                extraction.addresses.len(),
                client.endpoint()
            );
            match client.push(&extraction.addresses).await {
                Ok(receipt) => {
                    println!(
                        "Success! Synced {} homes ({}).",
                        extraction.addresses.len(),
                        receipt.message
                    );
                    Ok(())
                }
                Err(e @ Error::CollectorUnreachable { .. }) => {
                    println!("Connection error: is the collector running?");
                    Err(e.into())
                }
                Err(e) => Err(e.into()),
            }
        }
        Commands::Serve { bind } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let addr = bind.unwrap_or_else(|| settings.bind.clone());
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            server::serve(listener, server::AppState::new(conn)).await
        }
        Commands::List => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_addresses(&conn)?;
            if rows.is_empty() {
                println!("No addresses stored.");
                return Ok(());
            }
            println!("{:>4} | {:<19} | {}", "#", "Added", "Address");
            println!("{}", "-".repeat(72));
            for r in &rows {
                println!("{:>4} | {:<19} | {}", r.id, r.added_at, r.address);
            }
            println!("\n{} addresses", rows.len());
            Ok(())
        }
        Commands::Clear => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let removed = db::clear_addresses(&conn)?;
            println!("Removed {} addresses.", removed);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn build_extractor(settings: &Settings) -> anyhow::Result<AddressExtractor> {
    validate_selectors(&settings.rules)?;
    Ok(AddressExtractor::new(settings.rules.clone())?)
}

fn extract_file(extractor: &AddressExtractor, path: &Path) -> anyhow::Result<Extraction> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let snapshot = HtmlSnapshot::parse(&html);
    Ok(extractor.extract(&snapshot))
}

fn print_report(report: &FileReport, with_header: bool) {
    if with_header {
        let via = report
            .extraction
            .strategy
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".into());
        println!("== {} ({} via {})", report.file.display(), report.extraction.addresses.len(), via);
    }
    if report.extraction.addresses.is_empty() {
        println!("No addresses found.");
    }
    for address in &report.extraction.addresses {
        println!("{}", address);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
