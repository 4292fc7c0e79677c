//! `vox` — command-line client for the hosted speech-synthesis engine.
//!
//! The `speak` subcommand streams synthesized audio into a file and/or a
//! live playback device and reports exactly one JSON result object: on
//! stdout for success, on stderr for failure (with a non-zero exit code).

mod player;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use speech::{
    playback_channel, AudioFormat, AudioSink, AuthConfig, FileSink, SpeechClient,
    SynthesisRequest, WsTransport,
};
use tokio::io::AsyncReadExt;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Buffered playback chunks before back-pressure reaches the session.
const PLAYBACK_CHANNEL_CHUNKS: usize = 32;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Synthesize speech from text
    Speak(SpeakArgs),
}

#[derive(Args)]
struct SpeakArgs {
    /// Text to synthesize; falls back to --input, then to piped stdin
    text: Option<String>,

    /// Read the source text from a file ("-" for stdin)
    #[arg(long)]
    input: Option<String>,

    /// Write the audio stream to this file
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Play the audio live while it streams (requires --format pcm)
    #[arg(long)]
    play: bool,

    /// Voice identifier
    #[arg(long, default_value = "en_female_warm")]
    voice: String,

    /// Audio container format: mp3, ogg-opus or pcm
    #[arg(long, default_value = "mp3")]
    format: AudioFormat,

    /// Output sample rate in Hz
    #[arg(long, default_value_t = 24_000)]
    sample_rate: u32,

    /// Speech-rate offset relative to the voice default
    #[arg(long, default_value_t = 0)]
    speed: i32,

    /// Loudness offset relative to the voice default
    #[arg(long, default_value_t = 0)]
    volume: i32,

    /// Opaque user id echoed into the session config
    #[arg(long, default_value = "vox")]
    uid: String,

    /// Synthesis engine WebSocket endpoint
    #[arg(
        long,
        env = "VOX_ENDPOINT",
        default_value = "wss://api.voxspeech.io/v1/tts/stream"
    )]
    endpoint: String,

    /// Application key
    #[arg(long, env = "VOX_APP_KEY")]
    app_key: Option<String>,

    /// Access key
    #[arg(long, env = "VOX_ACCESS_KEY")]
    access_key: Option<String>,

    /// Per-frame receive timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

/// The one JSON object a successful run prints on stdout.
#[derive(Serialize)]
struct Report {
    ok: bool,
    session_id: String,
    chunks: usize,
    bytes: u64,
    elapsed_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_logging();
    let cli = Cli::parse();

    let Cmd::Speak(args) = cli.cmd;
    match speak(args).await {
        Ok(report) => {
            match serde_json::to_string(&report) {
                Ok(line) => println!("{line}"),
                Err(err) => {
                    error!(%err, "failed to render the result");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "speak failed");
            eprintln!("{}", serde_json::json!({ "ok": false, "error": err.to_string() }));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; stdout is reserved for the result object.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn speak(args: SpeakArgs) -> anyhow::Result<Report> {
    let started = Instant::now();

    let text = resolve_text(&args).await?;
    if text.trim().is_empty() {
        anyhow::bail!("no text to synthesize");
    }
    if args.play && args.format != AudioFormat::Pcm {
        anyhow::bail!("--play renders raw samples and requires --format pcm");
    }
    let app_key = args
        .app_key
        .clone()
        .context("missing credentials: pass --app-key or set VOX_APP_KEY")?;
    let access_key = args
        .access_key
        .clone()
        .context("missing credentials: pass --access-key or set VOX_ACCESS_KEY")?;

    let mut request = SynthesisRequest::new(text, args.voice.clone());
    request.format = args.format;
    request.sample_rate = args.sample_rate;
    request.speech_rate = args.speed;
    request.loudness_rate = args.volume;
    request.uid = args.uid.clone();

    let mut sinks: Vec<Box<dyn AudioSink>> = Vec::new();
    if let Some(path) = &args.output {
        let sink = FileSink::create(path)
            .await
            .with_context(|| format!("cannot create {}", path.display()))?;
        sinks.push(Box::new(sink));
    }
    let mut playback = None;
    if args.play {
        let (sink, reader) = playback_channel(PLAYBACK_CHANNEL_CHUNKS);
        sinks.push(Box::new(sink));
        playback = Some(player::spawn(reader, args.sample_rate));
    }
    if sinks.is_empty() {
        warn!("neither --output nor --play given; audio will be discarded");
    }

    let auth = AuthConfig::new(app_key, access_key);
    let transport = WsTransport::connect(&args.endpoint, &auth).await?;
    let mut client =
        SpeechClient::new(transport).with_frame_timeout(Duration::from_secs(args.timeout));
    let result = client.synthesize(&request, &mut sinks).await;

    // The sinks hold the playback sender; release them so the player drains
    // to end-of-stream, then wait for it to finish rendering.
    drop(sinks);
    if let Some(handle) = playback {
        tokio::task::spawn_blocking(move || handle.join())
            .await?
            .map_err(|_| anyhow::anyhow!("playback thread panicked"))?;
    }

    let summary = result?;
    Ok(Report {
        ok: true,
        session_id: summary.session_id,
        chunks: summary.chunks,
        bytes: summary.bytes,
        elapsed_ms: started.elapsed().as_millis(),
        output: args.output.as_ref().map(|p| p.display().to_string()),
    })
}

/// Positional text wins, then --input, then piped stdin.
async fn resolve_text(args: &SpeakArgs) -> anyhow::Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    match args.input.as_deref() {
        Some("-") | None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("reading text from stdin")?;
            Ok(buf)
        }
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read {path}")),
    }
}
