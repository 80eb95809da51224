//! Highlight extraction CLI.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reelcut_media::FfmpegTool;
use reelcut_ml_client::{
    ChatSuggester, MlClientConfig, OpenAiTranscriber, SentimentClient, SentimentService,
    SuggestionService,
};
use reelcut_models::EncodingConfig;
use reelcut_pipeline::{
    metrics, HighlightPipeline, HighlightSource, PipelineConfig, PipelineReport, PipelineServices,
};

#[derive(Parser, Debug)]
#[command(name = "reelcut")]
#[command(version)]
#[command(about = "Cut short highlight clips out of long-form video")]
struct Args {
    /// Source video file
    #[arg(value_name = "VIDEO")]
    input: PathBuf,

    /// Where highlights come from: scoring or suggestion
    #[arg(short, long)]
    source: Option<HighlightSource>,

    /// Also join the clips into one file
    #[arg(short, long)]
    concatenate: bool,

    /// Directory receiving the run folder
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Keep at most this many cuts (0 keeps all)
    #[arg(short = 'n', long)]
    max_cuts: Option<usize>,

    /// Write Prometheus metrics to this file when the run ends
    #[arg(long, env = "REELCUT_METRICS_FILE")]
    metrics_file: Option<PathBuf>,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    for directive in ["reelcut=info", "reelcut_pipeline=info", "reelcut_media=info"] {
        if let Ok(d) = directive.parse() {
            env_filter = env_filter.add_directive(d);
        }
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }
}

fn build_config(args: &Args) -> PipelineConfig {
    let mut config = PipelineConfig::from_env();
    if let Some(source) = args.source {
        config.highlight_source = source;
    }
    if args.concatenate {
        config.concatenate = true;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(n) = args.max_cuts {
        config.max_cuts = (n > 0).then_some(n);
    }
    config
}

async fn build_services(config: &PipelineConfig) -> anyhow::Result<PipelineServices> {
    let ml_config = MlClientConfig::from_env();
    info!("ML client config: {:?}", ml_config);

    let mut media = FfmpegTool::new(EncodingConfig::from_env());
    if let Some(secs) = config.ffmpeg_timeout_secs {
        media = media.with_timeout(secs);
    }

    let transcription = OpenAiTranscriber::new(ml_config.clone())
        .context("failed to create transcription client")?;

    let (sentiment, suggestion): (
        Option<Arc<dyn SentimentService>>,
        Option<Arc<dyn SuggestionService>>,
    ) = match config.highlight_source {
        HighlightSource::Scoring => {
            let client = SentimentClient::new(ml_config)
                .context("failed to create sentiment client")?;
            if !client.health_check().await {
                warn!("Sentiment service is not healthy, scoring may fail");
            }
            let client: Arc<dyn SentimentService> = Arc::new(client);
            (Some(client), None)
        }
        HighlightSource::Suggestion => {
            let client: Arc<dyn SuggestionService> = Arc::new(
                ChatSuggester::new(ml_config).context("failed to create suggestion client")?,
            );
            (None, Some(client))
        }
    };

    Ok(PipelineServices {
        media: Arc::new(media),
        transcription: Arc::new(transcription),
        sentiment,
        suggestion,
    })
}

async fn run(args: Args) -> anyhow::Result<PipelineReport> {
    let config = build_config(&args);
    info!("Pipeline config: {:?}", config);

    let services = build_services(&config).await?;
    let pipeline = HighlightPipeline::new(services, config)?;
    let report = pipeline
        .run(&args.input)
        .await
        .with_context(|| format!("failed to process {}", args.input.display()))?;
    Ok(report)
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();
    info!("Starting reelcut for {}", args.input.display());

    let metrics_file = args.metrics_file.clone();
    let prometheus = match &metrics_file {
        Some(_) => match metrics::init_metrics() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Failed to install metrics recorder: {}", e);
                None
            }
        },
        None => None,
    };

    let result = run(args).await;

    if let (Some(path), Some(handle)) = (&metrics_file, &prometheus) {
        if let Err(e) = tokio::fs::write(path, handle.render()).await {
            warn!("Failed to write metrics to {}: {}", path.display(), e);
        }
    }

    match result {
        Ok(report) => {
            info!(
                "Done: {} clips, {} skipped, {} failed -> {}",
                report.assembly.artifacts.len(),
                report.assembly.skipped.len(),
                report.assembly.failed.len(),
                report.output_dir.display()
            );
            for artifact in &report.assembly.artifacts {
                println!("{}", artifact.file_path.display());
            }
            if let Some(path) = &report.concatenated {
                println!("{}", path.display());
            }
        }
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}
