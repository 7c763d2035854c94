mod config;
mod repl;

use crate::config::{Config, generation_config};
use crate::repl::{Mode, Options};
use anyhow::{Context, Result};
use clap::Parser;
use gemini_live::{ReleasePolicy, connect_with_config};
use native_utils::audio::{LIVE_API_PCM16_SAMPLE_RATE, write_pcm16_wav};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Chat with a Gemini model over a live websocket session")]
struct Cli {
    /// What the console sends besides text, and how the model answers
    #[arg(long, value_enum, default_value_t = Mode::Text)]
    mode: Mode,

    /// Seconds to wait for each response
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Where audio answers are saved when the session ends
    #[arg(long, default_value = "combined_audio.wav")]
    audio_out: PathBuf,

    /// Show only the first fragment of each answer instead of waiting for the whole turn
    #[arg(long)]
    first_fragment: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();
    let response_timeout = Duration::from_secs(args.timeout_secs);

    // --- 4. Open the Session ---
    let mut live_config = config.live_config(response_timeout);
    if args.first_fragment {
        live_config = live_config.with_release_policy(ReleasePolicy::FirstFragment);
    }
    let live_config = live_config.build();
    tracing::info!("Connecting to {} with model {}", live_config.endpoint(), config.model);

    let mut session = connect_with_config(live_config, generation_config(args.mode.response_modality()))
        .await
        .context("Failed to open the live session")?;

    // --- 5. Console Loop ---
    let options = Options {
        mode: args.mode,
        response_timeout,
    };
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let result = repl::run(&mut session, stdin, &mut stdout, &options).await;
    session.close().await;

    // --- 6. Save Collected Audio ---
    if let Some(media) = session.take_media().filter(|media| !media.is_empty()) {
        write_pcm16_wav(&args.audio_out, &media, LIVE_API_PCM16_SAMPLE_RATE)
            .with_context(|| format!("Failed to save audio to {}", args.audio_out.display()))?;
        println!("Saved audio data to: {}", args.audio_out.display());
    }

    result
}
