use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mic_director::audio::backend::{AudioBackend, CpalBackend, StubBackend};
use mic_director::audio::{LevelIntake, LevelSink};
use mic_director::config::AppConfig;
use mic_director::director::Director;
use mic_director::error::log_director_error;

#[derive(Parser, Debug)]
#[command(
    name = "mic-directord",
    about = "Audio-driven automatic camera-switching director"
)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the director loop (and, if built with the `http` feature, the
    /// HTTP surface).
    Run {
        /// Address the HTTP surface listens on. Ignored without `--features http`.
        #[arg(long, default_value = "127.0.0.1:8787")]
        http_addr: String,
    },
    /// Run a single calibration session for one mic and print the result.
    Calibrate {
        /// Mic id as it appears in configuration.
        #[arg(long)]
        mic: String,

        /// Feed a constant level (dB) through an in-process stub backend
        /// instead of opening real hardware — lets a calibration run be
        /// scripted without a microphone attached.
        #[arg(long)]
        fixture_db: Option<f32>,
    },
}

fn main() -> ExitCode {
    mic_director::init_logging();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    match cli.command {
        Commands::Run { http_addr } => runtime.block_on(run_director(cli.config, http_addr)),
        Commands::Calibrate { mic, fixture_db } => {
            runtime.block_on(run_calibrate(cli.config, mic, fixture_db))
        }
    }
}

async fn run_director(config_path: PathBuf, http_addr: String) -> Result<ExitCode> {
    let config = AppConfig::load_from_file(&config_path);
    let intake = Arc::new(LevelIntake::new());
    let backend = CpalBackend::new();
    backend
        .start(config.audio_channels, intake.clone())
        .context("starting audio capture")?;

    let director = Arc::new(Director::new(config, Some(config_path), intake));

    #[cfg(feature = "http")]
    {
        let addr = http_addr
            .parse()
            .with_context(|| format!("parsing HTTP address {}", http_addr))?;
        let http_director = Arc::clone(&director);
        tokio::spawn(async move {
            if let Err(err) = mic_director::http::run_http_server(http_director, addr).await {
                log::error!("[mic-directord] HTTP surface stopped: {}", err);
            }
        });
    }
    #[cfg(not(feature = "http"))]
    {
        let _ = http_addr;
    }

    director_loop(director).await;
    Ok(ExitCode::from(0))
}

async fn director_loop(director: Arc<Director>) -> ! {
    let mut ticker = tokio::time::interval(Duration::from_millis(50));
    loop {
        ticker.tick().await;
        if let Err(err) = director.tick() {
            log_director_error(&err, "director_loop");
        }
    }
}

/// Backend handle kept alive for the duration of `run_calibrate`: either
/// real hardware, or — when `--fixture-db` is given — an in-process stub
/// fed a constant level every tick, so calibration can be scripted
/// without a microphone attached.
enum CalibrateBackend {
    Live(CpalBackend),
    Fixture { backend: StubBackend, channel: usize, level_db: f32 },
}

async fn run_calibrate(
    config_path: PathBuf,
    mic_id: String,
    fixture_db: Option<f32>,
) -> Result<ExitCode> {
    let config = AppConfig::load_from_file(&config_path);
    let Some(mic) = config.mic(&mic_id) else {
        eprintln!("unknown mic id {}", mic_id);
        return Ok(ExitCode::from(1));
    };
    let channel = mic.input_channel;

    let intake = Arc::new(LevelIntake::new());

    let backend = match fixture_db {
        Some(level_db) => {
            let backend = StubBackend::new();
            backend
                .start(config.audio_channels, intake.clone())
                .context("starting stub audio backend")?;
            CalibrateBackend::Fixture { backend, channel, level_db }
        }
        None => {
            let backend = CpalBackend::new();
            backend
                .start(config.audio_channels, intake.clone())
                .context("starting audio capture")?;
            CalibrateBackend::Live(backend)
        }
    };

    let director = Director::new(config, Some(config_path), intake.clone());
    director
        .start_calibration(&mic_id)
        .context("starting calibration session")?;

    let sink: Arc<dyn LevelSink> = intake;
    let mut ticker = tokio::time::interval(Duration::from_millis(50));
    loop {
        ticker.tick().await;
        if let CalibrateBackend::Fixture { backend: stub, channel, level_db } = &backend {
            stub.feed(&sink, vec![(*channel, *level_db)], mic_director::clock::now());
        }
        let status = director.tick().context("ticking director")?;
        if let Some(result) = status.results.get(&mic_id) {
            println!("{}", serde_json::to_string_pretty(result)?);
            break;
        }
    }

    let _ = match &backend {
        CalibrateBackend::Live(live) => live.stop(),
        CalibrateBackend::Fixture { backend: stub, .. } => stub.stop(),
    };
    Ok(ExitCode::from(0))
}
