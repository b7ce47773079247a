// Grief Stage Sound Generator: CLI entry point.
//
// Renders one stage's heartbeat (WAV), drone (WAV), or score (MIDI), or all
// of them for every stage at once. Stage names are checked before anything
// is rendered.
//
// Usage:
//   cargo run -p grief_music -- heartbeat <STAGE|Flatline> [-o out.wav]
//   cargo run -p grief_music -- drone <STAGE> [--minutes 2] [-o out.wav]
//   cargo run -p grief_music -- score <STAGE> [--minutes 2] [-o out.mid]
//   cargo run -p grief_music -- all [--minutes 2] [--out-dir DIR]
//   (any command) --config settings.json
//
// Stages: Denial, Anger, Bargaining, Depression, Acceptance
// Logging honours RUST_LOG (default: info).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grief_music::midi::write_midi;
use grief_music::wav::write_wav;
use grief_music::{HeartbeatTarget, NoteEventSequencer, RenderConfig, Stage, WaveformSequencer};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "generate")]
#[command(about = "Render heartbeat, drone, and MIDI score for the stages of grief")]
#[command(version)]
struct Cli {
    /// JSON render settings; missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Heartbeat beeps for a stage, or the Flatline tone
    Heartbeat {
        stage: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Slow additive-synthesis chord drone
    Drone {
        stage: String,
        #[arg(long, default_value_t = 2.0)]
        minutes: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Chord progression + motif as a MIDI file
    Score {
        stage: String,
        #[arg(long, default_value_t = 2.0)]
        minutes: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Every output for every stage, rendered in parallel
    All {
        #[arg(long, default_value_t = 2.0)]
        minutes: f64,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => RenderConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RenderConfig::default(),
    };
    let waves = WaveformSequencer::new(&config)?;
    let notes = NoteEventSequencer::new(&config)?;

    match cli.command {
        Command::Heartbeat { stage, output } => {
            let target: HeartbeatTarget = stage.parse()?;
            let path = output.unwrap_or_else(|| heartbeat_path(Path::new("."), target));
            write_wav(&waves.build_heartbeat_for(target)?, &path)?;
        }
        Command::Drone {
            stage,
            minutes,
            output,
        } => {
            let stage: Stage = stage.parse()?;
            let path = output.unwrap_or_else(|| drone_path(Path::new("."), stage));
            write_wav(&waves.build_drone_for(stage, minutes * 60.0)?, &path)?;
        }
        Command::Score {
            stage,
            minutes,
            output,
        } => {
            let stage: Stage = stage.parse()?;
            let path = output.unwrap_or_else(|| score_path(Path::new("."), stage));
            write_midi(&notes.build_for(stage, minutes)?, &path)?;
        }
        Command::All { minutes, out_dir } => {
            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("creating {}", out_dir.display()))?;
            Stage::ALL
                .par_iter()
                .map(|&stage| render_stage(&waves, &notes, stage, minutes, &out_dir))
                .collect::<Result<Vec<()>>>()?;
            let flatline = HeartbeatTarget::Flatline;
            write_wav(
                &waves.build_heartbeat_for(flatline)?,
                &heartbeat_path(&out_dir, flatline),
            )?;
            tracing::info!(dir = %out_dir.display(), "all stages rendered");
        }
    }
    Ok(())
}

fn render_stage(
    waves: &WaveformSequencer,
    notes: &NoteEventSequencer,
    stage: Stage,
    minutes: f64,
    out_dir: &Path,
) -> Result<()> {
    let heartbeat = HeartbeatTarget::Stage(stage);
    write_wav(
        &waves.build_heartbeat_for(heartbeat)?,
        &heartbeat_path(out_dir, heartbeat),
    )?;
    write_wav(
        &waves.build_drone_for(stage, minutes * 60.0)?,
        &drone_path(out_dir, stage),
    )?;
    write_midi(&notes.build_for(stage, minutes)?, &score_path(out_dir, stage))?;
    Ok(())
}

fn heartbeat_path(dir: &Path, target: HeartbeatTarget) -> PathBuf {
    dir.join(format!("{}_heartbeat.wav", target.to_string().to_lowercase()))
}

fn drone_path(dir: &Path, stage: Stage) -> PathBuf {
    dir.join(format!("{}_drone.wav", stage.slug()))
}

fn score_path(dir: &Path, stage: Stage) -> PathBuf {
    dir.join(format!("{}_stage_structured.mid", stage.slug()))
}
