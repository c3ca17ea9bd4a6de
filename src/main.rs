use ai_video_shorts::request::{DEFAULT_DURATION_SECS, Language};
use ai_video_shorts::{Config, Pipeline, init};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ai-video-shorts")]
#[command(about = "Prompt -> narrated AI clip with background music", long_about = None)]
struct Args {
    /// Video prompt, also used as the narration text
    #[arg(short, long)]
    prompt: String,

    /// Voice language (english or telugu)
    #[arg(short, long, default_value = "english")]
    language: Language,

    /// Video duration in seconds (5-30)
    #[arg(short, long, default_value_t = DEFAULT_DURATION_SECS)]
    duration: u32,

    /// Output file; defaults to viral_ai_video_<timestamp>.mp4
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,
}

fn default_output() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("viral_ai_video_{stamp}.mp4"))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    if !init::check_ffmpeg().await || !init::check_ffprobe().await {
        error!("ffmpeg/ffprobe not found in PATH. Please install FFmpeg.");
        return Ok(ExitCode::FAILURE);
    }

    let config = Config::load(&args.config).await?;
    let pipeline = Pipeline::from_config(config).context("Failed to set up providers")?;

    match pipeline
        .generate(&args.prompt, args.language, args.duration)
        .await
    {
        Ok(clip) => {
            let dest = args.output.unwrap_or_else(default_output);
            let saved = clip.persist(&dest).await?;
            println!("Video generated successfully: {}", saved.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(stage = %err.stage(), "{err}");
            eprintln!("{}", err.user_message());
            for hint in err.hints() {
                eprintln!("  - {hint}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
