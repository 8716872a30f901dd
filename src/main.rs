//! Application entry point: story frames terminal driver.
//!
//! # Commands
//!
//! * `connect <URL>`: normalise the URL, check `/health`, cache it.
//! * `health`: check the cached server.
//! * `story --image <PATH>...`: generate a story from one or more images.
//! * `play <STORY_FILE>`: narrate a story on a simulated clock while frames
//!   are generated in the background, then write the decoded frames to disk.
//!
//! `--server <URL>` overrides the cached URL for a single run.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use story_frames::{
    api::{normalize_server_url, StoryClient},
    config::{AppConfig, AppPaths},
    frames::{FrameClock, FramePipeline, FrameStatus, SharedFrames},
    narration::{estimate_duration, spawn_ticker, Accent, NarrationClock, SpeechSpeed},
    story::{encode_image_file, format_story, strip_data_uri, Genre, StoryLength, StoryRequest},
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "story-frames", version, about = "Narrated stories with generated frames")]
struct Cli {
    /// Server base URL for this run (overrides the cached one).
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check a server and remember it for later runs.
    Connect { url: String },

    /// Check that the configured server is healthy.
    Health,

    /// Generate a story from images.
    Story {
        /// Image file, or a `data:` URI.  Repeat for several images.
        #[arg(long = "image", required = true)]
        images: Vec<String>,
        #[arg(long)]
        genre: Option<Genre>,
        /// short, medium, long (or 200 / 500 / 1000).
        #[arg(long)]
        length: Option<StoryLength>,
        /// Write the story here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Narrate a story file with synchronised frames.
    Play {
        story: PathBuf,
        /// Where decoded frames are written.
        #[arg(long)]
        frames_dir: Option<PathBuf>,
        #[arg(long)]
        speed: Option<SpeechSpeed>,
        /// Narrator accent: us, uk, in or au (or the domain, e.g. co.uk).
        #[arg(long)]
        accent: Option<Accent>,
    },
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    if let Some(server) = &cli.server {
        if config.remember_server_url(server).is_none() {
            bail!("--server must not be empty");
        }
    }

    match cli.command {
        Command::Connect { url } => connect(config, &url).await,
        Command::Health => health(&config).await,
        Command::Story {
            images,
            genre,
            length,
            out,
        } => {
            let genre = genre.unwrap_or(config.story.genre);
            let length = length.unwrap_or(config.story.length);
            story(&config, &images, genre, length, out.as_deref()).await
        }
        Command::Play {
            story,
            frames_dir,
            speed,
            accent,
        } => {
            if let Some(speed) = speed {
                config.narration.speed = speed;
            }
            if let Some(accent) = accent {
                config.narration.accent = accent;
            }
            let frames_dir = frames_dir.unwrap_or_else(|| AppPaths::new().frames_dir);
            play(&config, &story, &frames_dir).await
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn connect(mut config: AppConfig, url: &str) -> Result<()> {
    let Some(base_url) = normalize_server_url(url) else {
        bail!("please enter a server URL");
    };

    let client = StoryClient::new(
        base_url.clone(),
        Duration::from_secs(config.server.story_timeout_secs),
        Duration::from_secs(config.server.health_timeout_secs),
    );
    let status = client
        .health()
        .await
        .with_context(|| format!("server at {base_url} is not reachable"))?;

    config.remember_server_url(&base_url);
    config.save().context("failed to save settings")?;

    log::info!("Connected to {base_url}");
    println!("Connected to {base_url} ({})", describe_health(&status));
    Ok(())
}

async fn health(config: &AppConfig) -> Result<()> {
    let client = StoryClient::from_config(&config.server)?;
    let status = client.health().await?;
    println!("{}: {}", client.base_url(), describe_health(&status));
    Ok(())
}

async fn story(
    config: &AppConfig,
    images: &[String],
    genre: Genre,
    length: StoryLength,
    out: Option<&Path>,
) -> Result<()> {
    let client = StoryClient::from_config(&config.server)?;

    let encoded = images
        .iter()
        .map(|image| {
            if image.starts_with("data:") {
                Ok(strip_data_uri(image).to_string())
            } else {
                encode_image_file(Path::new(image))
                    .with_context(|| format!("failed to read image {image}"))
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let request = StoryRequest::new(encoded, genre, length)?;
    let story = client.generate_story(&request).await?;
    let text = format_story(&story.text);

    match out {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("Story written to {}", path.display());
        }
        None => println!("{text}"),
    }
    if let Some(audio) = &story.audio_url {
        println!("Narration audio: {audio}");
    }
    Ok(())
}

async fn play(config: &AppConfig, story_path: &Path, frames_dir: &Path) -> Result<()> {
    let text = std::fs::read_to_string(story_path)
        .with_context(|| format!("failed to read {}", story_path.display()))?;

    let mut pipeline = FramePipeline::from_config(config);
    let queued = pipeline.set_story(&text);
    let state = pipeline.state();
    let mut frame_clock = FrameClock::new(Arc::clone(&state), config.frames.commit_delay());

    let duration = estimate_duration(
        &text,
        config.narration.words_per_minute,
        config.narration.speed,
    );
    let total = duration.as_secs_f64();
    log::info!(
        "Narrating {:.1}s at {} speed in {} with {queued} frame prompt(s)",
        total,
        config.narration.speed,
        config.narration.accent
    );

    let narration = Arc::new(Mutex::new(NarrationClock::new(duration)));
    if let Ok(mut clock) = narration.lock() {
        clock.play();
    }
    let (mut position_rx, ticker) = spawn_ticker(
        Arc::clone(&narration),
        Duration::from_millis(config.narration.tick_ms),
    );

    let mut caption: Option<String> = None;
    loop {
        tokio::select! {
            changed = position_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let position = *position_rx.borrow_and_update();
                frame_clock.on_time_update(position, total);
                report_caption(&state, &mut caption);
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted");
                ticker.abort();
                pipeline.cancel();
                break;
            }
        }
    }

    // Let the last debounced commit land.
    tokio::time::sleep(config.frames.commit_delay()).await;
    report_caption(&state, &mut caption);

    if pipeline.is_running() {
        log::info!("Narration finished; waiting for remaining frames (Ctrl-C to stop)");
        tokio::select! {
            _ = pipeline.join() => {}
            _ = tokio::signal::ctrl_c() => pipeline.cancel(),
        }
    }

    let written = write_frames(&state, frames_dir)?;
    let view = state
        .lock()
        .map_err(|e| anyhow::anyhow!("frame state poisoned: {e}"))?
        .view();
    println!(
        "{}/{} frames ready, {written} written to {}",
        view.ready,
        view.total,
        frames_dir.display()
    );
    if view.status == FrameStatus::Error {
        if let Some(err) = &view.last_error {
            println!("Frame generation error: {err}");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn describe_health(status: &story_frames::api::HealthStatus) -> String {
    let mut out = status.status.clone();
    if let Some(service) = &status.service {
        out.push_str(&format!(", {service}"));
    }
    if let Some(gpu) = status.gpu_available {
        out.push_str(if gpu { ", GPU" } else { ", CPU only" });
    }
    let services = status.available_services();
    if !services.is_empty() {
        out.push_str(&format!(", services: {}", services.join(", ")));
    }
    out
}

/// Log the displayed frame whenever it changes.
fn report_caption(state: &SharedFrames, last: &mut Option<String>) {
    let Ok(st) = state.lock() else {
        return;
    };
    let caption = st.view().caption();
    if caption != *last {
        if let Some(text) = &caption {
            log::info!("{text}");
        }
        *last = caption;
    }
}

/// Write every decodable frame as `frame_NN.<ext>`; remote URLs are listed.
fn write_frames(state: &SharedFrames, dir: &Path) -> Result<usize> {
    let frames: Vec<_> = state
        .lock()
        .map_err(|e| anyhow::anyhow!("frame state poisoned: {e}"))?
        .frames()
        .map(|(i, frame)| (i, frame.clone()))
        .collect();
    if frames.is_empty() {
        return Ok(0);
    }

    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut written = 0;
    for (i, frame) in frames {
        match frame.decode_data_uri() {
            Some(bytes) => {
                let path = dir.join(format!("frame_{:02}.{}", i + 1, frame.extension()));
                std::fs::write(&path, bytes)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                written += 1;
            }
            None => println!("Frame {}: {}", i + 1, frame.image),
        }
    }
    Ok(written)
}
