use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use voice_dispatcher::services::Services;
use voice_dispatcher::voice::{
    AudioCapture, AudioPlayback, ConsoleRecognizer, ConsoleSpeaker, MicrophoneRecognizer,
    TextToSpeech, VoiceSpeaker, calculate_rms,
};
use voice_dispatcher::{
    CommandDispatcher, Config, IntentResolver, Session, SpeechRecognizer, SpeechSynthesizer,
};

/// Assistant - wake-word gated voice command dispatcher
#[derive(Parser)]
#[command(name = "assistant", version, about)]
struct Cli {
    /// Config file (default: ~/.config/voice-dispatcher/config.toml)
    #[arg(short, long, env = "ASSISTANT_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Type commands instead of speaking them
    #[arg(long)]
    text: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Show configuration status
    Status,
    /// Show the intent a command resolves to, without running it
    Resolve {
        /// Command text
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config loading logs too, so give it a console subscriber of its own
    let startup = tracing_subscriber::fmt()
        .with_env_filter(verbosity_filter(cli.verbose))
        .finish();
    let config = match tracing::subscriber::with_default(startup, || {
        Config::load(cli.config.as_deref())
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(cli.verbose, &config);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

fn verbosity_filter(verbose: u8) -> EnvFilter {
    let filter = match verbose {
        0 => "info,voice_dispatcher=info",
        1 => "info,voice_dispatcher=debug",
        2 => "debug",
        _ => "trace",
    };
    EnvFilter::new(filter)
}

/// Console plus log file; `RUST_LOG` wins, then `LOG_LEVEL`, then `-v`
fn init_logging(verbose: u8, config: &Config) {
    let verbose = if config.debug_mode { verbose.max(1) } else { verbose };
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| config.log_level.as_deref().map(EnvFilter::new))
        .unwrap_or_else(|| verbosity_filter(verbose));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file);
    let file_layer = match file {
        Ok(file) => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        ),
        Err(e) => {
            eprintln!("cannot open log file {}: {e}", config.log_file.display());
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(&config, duration).await,
            Command::TestTts { text } => test_tts(&config, &text).await,
            Command::Status => {
                cmd_status(&config);
                Ok(())
            }
            Command::Resolve { text } => cmd_resolve(&text),
        };
    }

    tracing::info!(
        name = %config.assistant.name,
        text_mode = cli.text,
        "starting assistant"
    );
    if !config.validate() {
        tracing::info!("run `assistant status` for details");
    }

    let services = Services::from_config(&config)?;
    let dispatcher = CommandDispatcher::new(services, &config);
    let resolver = IntentResolver::new()?;

    let (recognizer, speaker, input_closed): (
        Box<dyn SpeechRecognizer>,
        Box<dyn SpeechSynthesizer>,
        Option<Arc<Notify>>,
    ) = if cli.text {
        let recognizer = ConsoleRecognizer::stdin();
        let closed = recognizer.closed();
        (
            Box::new(recognizer),
            Box::new(ConsoleSpeaker::new(config.assistant.name.clone())),
            Some(closed),
        )
    } else {
        (
            Box::new(MicrophoneRecognizer::from_config(&config)?),
            Box::new(VoiceSpeaker::from_config(&config)?),
            None,
        )
    };

    let mut session = Session::new(recognizer, speaker, resolver, dispatcher, &config)?;

    println!("{} is ready!", config.assistant.name);
    println!("Wake words: {}", config.assistant.wake_words.join(", "));
    println!("Say a wake word before each command. Press Ctrl+C to exit.\n");

    session.run(shutdown_signal(input_closed)).await;
    Ok(())
}

/// Resolves on Ctrl+C, or when typed input runs out
async fn shutdown_signal(input_closed: Option<Arc<Notify>>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    match input_closed {
        Some(closed) => {
            tokio::select! {
                () = ctrl_c => {}
                () = closed.notified() => tracing::info!("input closed"),
            }
        }
        None => ctrl_c.await,
    }
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(config: &Config, duration: u64) -> anyhow::Result<()> {
    println!("Input devices:");
    for name in AudioCapture::input_device_names() {
        println!("  - {name}");
    }

    let mut capture = AudioCapture::open(config.listening.input_device.as_deref())?;
    capture.start()?;

    println!("\nTesting '{}' for {duration} seconds...", capture.device_name());
    println!("Speak into your microphone!\n");
    println!("Sample rate: {} Hz", capture.sample_rate());
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = calculate_rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]",
            i + 1
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Is input_device in the config file set to the right device?");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

/// Test TTS output
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let tts = TextToSpeech::from_config(config)?.ok_or_else(|| {
        anyhow::anyhow!("no TTS key configured (set OPENAI_API_KEY or ELEVENLABS_API_KEY)")
    })?;

    println!("Synthesizing speech...");
    let mp3 = tts.synthesize(text).await?;
    println!("Received {} bytes of audio", mp3.len());

    let playback = AudioPlayback::new()?;
    println!("Playing...");
    playback.play_mp3(&mp3)?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");
    Ok(())
}

fn yes_no(present: bool) -> &'static str {
    if present { "configured" } else { "missing" }
}

/// Print configuration status
fn cmd_status(config: &Config) {
    let keys = &config.api_keys;

    println!("Assistant: {}", config.assistant.name);
    println!("Wake words: {}", config.assistant.wake_words.join(", "));
    println!(
        "TTS: {} voice {} at {}x",
        config.voice.tts_model, config.voice.tts_voice, config.voice.tts_speed
    );
    println!("Debug mode: {}", config.debug_mode);
    println!("Log file: {}", config.log_file.display());
    println!();
    println!("API keys:");
    println!("  Spotify:      {}", yes_no(keys.spotify_configured()));
    println!("    redirect URI: {}", keys.spotify_redirect_uri);
    println!("  OpenWeather:  {}", yes_no(keys.openweather.is_some()));
    println!("  OpenAI:       {}", yes_no(keys.openai.is_some()));
    println!("  Deepgram:     {}", yes_no(keys.deepgram.is_some()));
    println!("  ElevenLabs:   {}", yes_no(keys.elevenlabs.is_some()));
    println!();
    println!("Features:");
    println!("  Music playback:   {}", yes_no(keys.spotify_configured()));
    println!("  Weather reports:  {}", yes_no(keys.openweather.is_some()));
    println!(
        "  Speech input:     {}",
        yes_no(keys.openai.is_some() || keys.deepgram.is_some())
    );
    println!(
        "  Spoken replies:   {}",
        yes_no(keys.openai.is_some() || keys.elevenlabs.is_some())
    );
    println!("  Web search, encyclopedia, time, date, apps: always available");

    let missing = config.missing_credentials();
    if !missing.is_empty() {
        println!("\nMissing: {}", missing.join(", "));
    }
}

/// Print the resolved intent for a command
fn cmd_resolve(text: &str) -> anyhow::Result<()> {
    let resolver = IntentResolver::new()?;
    let resolution = resolver.resolve(text);

    println!("intent: {}", resolution.intent);
    match resolution.entity {
        Some(entity) => println!("entity: {entity}"),
        None => println!("entity: (none)"),
    }
    Ok(())
}
