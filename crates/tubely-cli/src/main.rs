//! Tubely CLI: run the video ingestion pipeline and delivery signing locally.
//!
//! Reads S3_BUCKET, S3_REGION (or AWS_REGION) and the optional pipeline
//! settings from the environment or `.env`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tubely_cli::{
    delivery_resolver, init_tracing, ingestion_orchestrator, remuxer, stream_inspector,
    ttl_from_secs,
};
use tubely_core::{IngestConfig, InMemoryVideoRepository, SystemClock, Video};
use tubely_processing::{FastStartRemuxer, IngestRequest};
use tubely_storage::create_storage;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "tubely", about = "Tubely video pipeline CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the aspect-ratio bucket of a video file
    Inspect {
        /// Path to the video file
        file: PathBuf,
    },
    /// Write a fast-start copy of a video file and print its path
    Faststart {
        /// Path to the video file
        file: PathBuf,
    },
    /// Run the full ingestion pipeline for a local file
    Ingest {
        /// Path to the video file
        file: PathBuf,
        /// Declared media type of the upload
        #[arg(long, default_value = "video/mp4")]
        content_type: String,
        /// Title of the record created for the upload
        #[arg(long, default_value = "Untitled")]
        title: String,
    },
    /// Print a presigned GET URL for an object
    Presign {
        bucket: String,
        key: String,
        /// URL lifetime in seconds (defaults to PRESIGN_TTL_SECS)
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
    /// Resolve a stored video URL field the way playback responses do
    Resolve {
        /// Stored value, e.g. "my-bucket,landscape/abc"
        video_url: String,
    },
}

#[derive(Serialize)]
struct IngestReport {
    aspect_ratio: String,
    locator: String,
    record: Video,
    playback_url: Option<String>,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = IngestConfig::from_env().context(
        "Failed to load configuration. Set S3_BUCKET and S3_REGION (or AWS_REGION)",
    )?;

    match cli.command {
        Commands::Inspect { file } => {
            let aspect_ratio = stream_inspector(&config)
                .inspect(&file)
                .await
                .with_context(|| format!("Failed to inspect {}", file.display()))?;
            println!("{}", aspect_ratio);
        }
        Commands::Faststart { file } => {
            let output = remuxer(&config)
                .remux(&file)
                .await
                .with_context(|| format!("Failed to remux {}", file.display()))?;
            println!("{}", output.display());
        }
        Commands::Ingest {
            file,
            content_type,
            title,
        } => {
            let storage = create_storage(&config, Arc::new(SystemClock))
                .context("Failed to configure storage")?;
            let repository = Arc::new(InMemoryVideoRepository::new());
            let video = Video::new(Uuid::new_v4(), title);
            repository.insert(video.clone()).await;

            let orchestrator = ingestion_orchestrator(&config, repository.clone(), &storage);
            let mut body = tokio::fs::File::open(&file)
                .await
                .with_context(|| format!("Failed to open {}", file.display()))?;
            let outcome = orchestrator
                .ingest(
                    IngestRequest {
                        video_id: video.id,
                        user_id: video.user_id,
                        content_type,
                    },
                    &mut body,
                )
                .await
                .context("Ingestion failed")?;

            let resolved = delivery_resolver(&config, &storage)
                .resolve(outcome.video.clone())
                .await
                .context("Failed to sign playback URL")?;

            print_json(&IngestReport {
                aspect_ratio: outcome.aspect_ratio.to_string(),
                locator: outcome.locator.to_string(),
                record: outcome.video,
                playback_url: resolved.video_url,
            })?;
        }
        Commands::Presign {
            bucket,
            key,
            ttl_secs,
        } => {
            let ttl = match ttl_secs {
                Some(secs) => ttl_from_secs(secs)?,
                None => config.presign_ttl,
            };
            let storage = create_storage(&config, Arc::new(SystemClock))
                .context("Failed to configure storage")?;
            let url = storage
                .signer
                .presigned_get_url(&bucket, &key, ttl)
                .await
                .context("Failed to presign URL")?;
            println!("{}", url);
        }
        Commands::Resolve { video_url } => {
            let storage = create_storage(&config, Arc::new(SystemClock))
                .context("Failed to configure storage")?;
            let mut video = Video::new(Uuid::nil(), "resolve");
            video.video_url = Some(video_url);
            let resolved = delivery_resolver(&config, &storage)
                .resolve(video)
                .await
                .context("Failed to resolve video URL")?;
            println!("{}", resolved.video_url.unwrap_or_default());
        }
    }

    Ok(())
}
