// Render settings shared by the waveform and note-event sequencers.
//
// Everything that is not stage-specific lives here: sample rate, chord unit
// length, tone amplitudes, the flatline tone, and the MIDI tick grid. Stage-
// specific values (tempo, progression, pauses) live in `table.rs` and are
// not configurable.
//
// `RenderConfig::default()` is the stock sound design.
// A JSON file may override any subset of fields; missing fields keep their
// defaults. `validate()` runs on every load so a bad file is rejected before
// anything is rendered.

use crate::error::{Result, SynthError, require_positive};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Sample domain
// ---------------------------------------------------------------------------

/// PCM-side settings for heartbeat and drone rendering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleSettings {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Length of one drone chord in seconds.
    pub chord_seconds: f64,
    /// Per-tone amplitude inside a drone chord (before normalization).
    pub chord_amplitude: f64,
    /// Amplitude of a single heartbeat beep.
    pub beep_amplitude: f64,
}

impl Default for SampleSettings {
    fn default() -> Self {
        SampleSettings {
            sample_rate: 44_100,
            chord_seconds: 4.0,
            chord_amplitude: 0.5,
            beep_amplitude: 0.2,
        }
    }
}

/// The long fading tone used by the Flatline pseudo-stage and by any stage
/// whose config sets `flatline`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatlineSettings {
    pub frequency: f64,
    pub duration: f64,
    pub amplitude: f64,
    /// Length of the trailing linear fade. A fade longer than `duration`
    /// fades the whole tone.
    pub fade_seconds: f64,
}

impl Default for FlatlineSettings {
    fn default() -> Self {
        FlatlineSettings {
            frequency: 783.99,
            duration: 10.0,
            amplitude: 0.15,
            fade_seconds: 7.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Symbolic domain
// ---------------------------------------------------------------------------

/// How the note-event sequencer treats a note-on for a pitch that is still
/// sounding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlapPolicy {
    /// Close the earlier note at the retrigger tick. Every note-on is then
    /// paired with exactly one later note-off before the pitch sounds again.
    #[default]
    Truncate,
    /// Keep the raw grid timing, overlaps included.
    Preserve,
}

/// Tick grid and velocities for MIDI score generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreSettings {
    /// SMF header resolution.
    pub ticks_per_quarter: u16,
    /// Ticks between the starts of consecutive bars.
    pub bar_ticks: u32,
    /// Chord note length, measured from the bar start.
    pub chord_hold_ticks: u32,
    /// Melody note-on, measured from the bar start.
    pub melody_start_ticks: u32,
    /// Melody note-off, measured from the bar start.
    pub melody_end_ticks: u32,
    /// Length of the final resolving chord.
    pub resolve_hold_ticks: u32,
    pub chord_velocity: u8,
    pub melody_velocity: u8,
    /// Used only to turn tempo and minutes into a bar count.
    pub beats_per_bar: u32,
    pub overlap: OverlapPolicy,
}

impl Default for ScoreSettings {
    fn default() -> Self {
        ScoreSettings {
            ticks_per_quarter: 480,
            bar_ticks: 480,
            chord_hold_ticks: 360,
            melody_start_ticks: 240,
            melody_end_ticks: 480,
            resolve_hold_ticks: 960,
            chord_velocity: 50,
            melody_velocity: 40,
            beats_per_bar: 4,
            overlap: OverlapPolicy::Truncate,
        }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub sample: SampleSettings,
    pub flatline: FlatlineSettings,
    pub score: ScoreSettings,
}

impl RenderConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| SynthError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RenderConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field that the synthesizers or sequencers would otherwise
    /// reject later, so errors surface before rendering starts.
    pub fn validate(&self) -> Result<()> {
        let s = &self.sample;
        if s.sample_rate == 0 {
            return Err(SynthError::invalid("sample.sample_rate", "must be > 0"));
        }
        require_positive("sample.chord_seconds", s.chord_seconds)?;
        require_amplitude("sample.chord_amplitude", s.chord_amplitude)?;
        require_amplitude("sample.beep_amplitude", s.beep_amplitude)?;

        let f = &self.flatline;
        require_positive("flatline.frequency", f.frequency)?;
        require_positive("flatline.duration", f.duration)?;
        require_amplitude("flatline.amplitude", f.amplitude)?;
        if !(f.fade_seconds.is_finite() && f.fade_seconds >= 0.0) {
            return Err(SynthError::invalid(
                "flatline.fade_seconds",
                format!("must be a finite value >= 0, got {}", f.fade_seconds),
            ));
        }

        let sc = &self.score;
        if sc.ticks_per_quarter == 0 || sc.ticks_per_quarter > 0x7FFF {
            return Err(SynthError::invalid(
                "score.ticks_per_quarter",
                "must be in 1..=32767",
            ));
        }
        let lengths = [
            sc.bar_ticks,
            sc.chord_hold_ticks,
            sc.melody_start_ticks,
            sc.melody_end_ticks,
            sc.resolve_hold_ticks,
        ];
        if lengths.iter().any(|&ticks| ticks > MAX_TICK_LENGTH) {
            return Err(SynthError::invalid(
                "score",
                format!("tick lengths must be <= {MAX_TICK_LENGTH} (one MIDI delta)"),
            ));
        }
        if sc.bar_ticks == 0 || sc.chord_hold_ticks == 0 || sc.resolve_hold_ticks == 0 {
            return Err(SynthError::invalid(
                "score",
                "bar, chord hold, and resolve hold lengths must be > 0",
            ));
        }
        if sc.melody_start_ticks >= sc.melody_end_ticks {
            return Err(SynthError::invalid(
                "score.melody_end_ticks",
                "must be later than melody_start_ticks",
            ));
        }
        if sc.chord_velocity > 127 || sc.melody_velocity > 127 {
            return Err(SynthError::invalid("score", "velocities must be <= 127"));
        }
        if sc.beats_per_bar == 0 {
            return Err(SynthError::invalid("score.beats_per_bar", "must be > 0"));
        }
        Ok(())
    }
}

/// Largest delta a MIDI variable-length quantity can carry (28 bits).
pub const MAX_TICK_LENGTH: u32 = 0x0FFF_FFFF;

/// Amplitudes live in (0, 1].
pub(crate) fn require_amplitude(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(SynthError::invalid(
            name,
            format!("must be in (0, 1], got {value}"),
        ))
    }
}
