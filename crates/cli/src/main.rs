//! Command-line interface for Depot.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use depot_core::Cid;
use depot_engine::{Engine, IngestOptions, RetrieveOptions};
use serde_json::json;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

#[derive(Parser)]
#[command(name = "depotctl")]
#[command(about = "Content-addressed chunk store")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "DEPOT_CONFIG", default_value = "config/depot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a file (or `-` for stdin) and print its summary
    Ingest {
        /// File to ingest
        path: PathBuf,
        /// Window size in bytes (default: ingest.default_chunk_size)
        #[arg(long)]
        chunk_size: Option<u64>,
        /// Sign and record an ingest receipt
        #[arg(long, default_value_t = false)]
        sign: bool,
        /// Filename to record (default: the path's file name)
        #[arg(long)]
        filename: Option<String>,
        /// MIME type to record
        #[arg(long)]
        mime_type: Option<String>,
        /// Uploader identity to record
        #[arg(long)]
        uploader: Option<String>,
    },
    /// Reconstruct a file by CID
    Fetch {
        cid: Cid,
        /// Write bytes here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Sign and record a retrieve receipt
        #[arg(long, default_value_t = false)]
        sign: bool,
        /// Re-hash every chunk while reading
        #[arg(long, default_value_t = false)]
        verify: bool,
    },
    /// Recompute a file's Merkle root; exits non-zero on mismatch
    Proof {
        cid: Cid,
        /// Sign and record a retrieve receipt
        #[arg(long, default_value_t = false)]
        sign: bool,
    },
    /// List the receipts recorded for a file
    Receipts { cid: Cid },
    /// Chunk and file statistics
    Stats {
        /// Print Prometheus metrics instead
        #[arg(long, default_value_t = false)]
        metrics: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        config: config_path,
        command,
    } = Cli::parse();
    let config = config::load_config(&config_path)?;
    let engine = Engine::from_config(&config)
        .await
        .context("failed to initialize engine")?;

    match command {
        Commands::Ingest {
            path,
            chunk_size,
            sign,
            filename,
            mime_type,
            uploader,
        } => {
            let options = IngestOptions {
                filename,
                mime_type,
                uploader,
                chunk_size,
                sign_receipt: sign,
                cancel: None,
            };
            handle_ingest(&engine, path, options).await
        }
        Commands::Fetch {
            cid,
            output,
            sign,
            verify,
        } => {
            let options = RetrieveOptions {
                sign_receipt: sign,
                // Without --verify, fall back to retrieval.verify_chunks.
                verify: verify.then_some(true),
            };
            handle_fetch(&engine, &cid, output, options).await
        }
        Commands::Proof { cid, sign } => handle_proof(&engine, &cid, sign).await,
        Commands::Receipts { cid } => {
            let receipts = engine.receipts(&cid).await?;
            print_json(&receipts)
        }
        Commands::Stats { metrics } => handle_stats(&engine, metrics).await,
    }
}

async fn handle_ingest(engine: &Engine, path: PathBuf, options: IngestOptions) -> Result<()> {
    let summary = if path.as_os_str() == "-" {
        engine.ingest_stream(tokio::io::stdin(), options).await
    } else {
        engine.ingest_path(&path, options).await
    }
    .with_context(|| format!("failed to ingest {}", path.display()))?;

    print_json(&summary)
}

async fn handle_fetch(
    engine: &Engine,
    cid: &Cid,
    output: Option<PathBuf>,
    options: RetrieveOptions,
) -> Result<()> {
    let file = engine.retrieve_file(cid, options).await?;

    match &output {
        Some(path) => {
            let mut out = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("failed to create {}", path.display()))?;
            for chunk in &file.chunks {
                out.write_all(chunk).await?;
            }
            out.sync_all().await?;
        }
        None => {
            let mut out = tokio::io::stdout();
            for chunk in &file.chunks {
                out.write_all(chunk).await?;
            }
            out.flush().await?;
        }
    }

    let report = json!({
        "metadata": file.metadata,
        "chunk_count": file.chunks.len(),
        "receipt": file.receipt,
    });
    eprintln!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn handle_proof(engine: &Engine, cid: &Cid, sign: bool) -> Result<()> {
    let report = engine.prove(cid, sign).await?;
    print_json(&report)?;
    report.ensure_matches()?;
    Ok(())
}

async fn handle_stats(engine: &Engine, metrics: bool) -> Result<()> {
    if metrics {
        print!("{}", depot_engine::metrics::gather());
        return Ok(());
    }

    let stats = engine.stats().await?;
    let dedup_ratio = if stats.stored_bytes == 0 {
        1.0
    } else {
        stats.logical_bytes as f64 / stats.stored_bytes as f64
    };
    print_json(&json!({
        "chunk_count": stats.chunk_count,
        "stored_bytes": stats.stored_bytes,
        "file_count": stats.file_count,
        "logical_bytes": stats.logical_bytes,
        "chunk_references": stats.chunk_references,
        "dedup_ratio": dedup_ratio,
    }))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
