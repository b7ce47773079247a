// Sample-domain sequencing: heartbeats, drones, and the flatline.
//
// Three renderers share one `WaveformSequencer`:
// - Drone: `floor(target / chord_seconds)` chord units, unit `i` playing
//   `drone[i % len]`. Each distinct chord is synthesized once and reused,
//   so repeats of a chord are sample-identical.
// - Heartbeat: `beats` repetitions of beep + pause, where the pause may cycle
//   through a list in lockstep with the beat index. Stages with the
//   flatline flag end with a long fading tone.
// - Flatline: the pseudo-stage. It never touches the parameter table and
//   renders only the fading tone.
//
// Each build owns a fresh `AudioBuffer`; nothing is shared between calls.
// Stage names are resolved before any allocation, so an unknown stage never
// produces partial output.
//
// PCM conversion multiplies by `i16::MAX` and truncates toward zero (the
// semantics of an `as` cast), which keeps -1.0 at -32767 rather than -32768.

use crate::chord::synthesize_chord;
use crate::config::{FlatlineSettings, RenderConfig, SampleSettings};
use crate::error::{Result, SynthError, require_positive};
use crate::stage::Stage;
use crate::table::StageParameterTable;
use crate::tone::{MAX_SAMPLES, ToneSegment, ToneSynthesizer};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Finished mono float buffer in [-1, 1], ready for the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    samples: Vec<f64>,
}

impl AudioBuffer {
    fn with_capacity(sample_rate: u32, capacity: usize) -> Self {
        AudioBuffer {
            sample_rate,
            samples: Vec::with_capacity(capacity),
        }
    }

    fn push_segment(&mut self, segment: &ToneSegment) {
        self.samples.extend_from_slice(segment.samples());
    }

    fn push_silence(&mut self, count: usize) {
        self.samples.resize(self.samples.len() + count, 0.0);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Scale to 16-bit PCM: `(sample * 32767) as i16`.
    pub fn to_pcm_i16(&self) -> Vec<i16> {
        self.samples
            .iter()
            .map(|&s| (s * i16::MAX as f64) as i16)
            .collect()
    }
}

/// What the heartbeat renderer can play: a table stage or the flatline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatTarget {
    Stage(Stage),
    Flatline,
}

impl fmt::Display for HeartbeatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeartbeatTarget::Stage(stage) => f.write_str(stage.name()),
            HeartbeatTarget::Flatline => f.write_str("Flatline"),
        }
    }
}

impl FromStr for HeartbeatTarget {
    type Err = SynthError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("flatline") {
            Ok(HeartbeatTarget::Flatline)
        } else {
            s.parse().map(HeartbeatTarget::Stage)
        }
    }
}

pub struct WaveformSequencer {
    sample: SampleSettings,
    flatline: FlatlineSettings,
    tones: ToneSynthesizer,
    table: &'static StageParameterTable,
}

impl WaveformSequencer {
    pub fn new(config: &RenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(WaveformSequencer {
            sample: config.sample.clone(),
            flatline: config.flatline.clone(),
            tones: ToneSynthesizer::new(config.sample.sample_rate, config.flatline.fade_seconds)?,
            table: StageParameterTable::global(),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample.sample_rate
    }

    /// Number of whole chord units that fit in `target_duration` seconds.
    pub fn drone_unit_count(&self, target_duration: f64) -> usize {
        (target_duration / self.sample.chord_seconds).floor() as usize
    }

    /// Samples in one drone chord unit.
    pub fn drone_unit_len(&self) -> usize {
        self.tones.sample_count(self.sample.chord_seconds)
    }

    /// Drone for a stage name. Fails with `UnknownStage` before synthesis.
    pub fn build_drone(&self, stage_id: &str, target_duration: f64) -> Result<AudioBuffer> {
        let stage: Stage = stage_id.parse()?;
        self.build_drone_for(stage, target_duration)
    }

    pub fn build_drone_for(&self, stage: Stage, target_duration: f64) -> Result<AudioBuffer> {
        require_positive("target_duration", target_duration)?;
        let progression = &self.table.get(stage).drone;
        let units = self.drone_unit_count(target_duration);
        let total = units
            .checked_mul(self.drone_unit_len())
            .filter(|&n| n <= MAX_SAMPLES)
            .ok_or_else(|| {
                SynthError::invalid(
                    "target_duration",
                    format!("{target_duration} s of drone exceeds {MAX_SAMPLES} samples"),
                )
            })?;

        // Only the chords that will actually sound get synthesized.
        let distinct = units.min(progression.len());
        let chords = progression[..distinct]
            .iter()
            .map(|freqs| {
                synthesize_chord(
                    &self.tones,
                    freqs,
                    self.sample.chord_seconds,
                    self.sample.chord_amplitude,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let mut buffer = AudioBuffer::with_capacity(self.sample_rate(), total);
        for i in 0..units {
            buffer.push_segment(&chords[i % progression.len()]);
        }

        info!(
            %stage,
            units,
            samples = buffer.len(),
            seconds = buffer.duration(),
            "rendered drone"
        );
        Ok(buffer)
    }

    /// Heartbeat for a stage name or "Flatline".
    pub fn build_heartbeat(&self, target_id: &str) -> Result<AudioBuffer> {
        let target: HeartbeatTarget = target_id.parse()?;
        self.build_heartbeat_for(target)
    }

    pub fn build_heartbeat_for(&self, target: HeartbeatTarget) -> Result<AudioBuffer> {
        let buffer = match target {
            HeartbeatTarget::Flatline => {
                let tone = self.flatline_tone(self.flatline.frequency)?;
                let mut buffer = AudioBuffer::with_capacity(self.sample_rate(), tone.len());
                buffer.push_segment(&tone);
                buffer
            }
            HeartbeatTarget::Stage(stage) => self.heartbeat_sequence(stage)?,
        };
        info!(
            %target,
            samples = buffer.len(),
            seconds = buffer.duration(),
            "rendered heartbeat"
        );
        Ok(buffer)
    }

    fn heartbeat_sequence(&self, stage: Stage) -> Result<AudioBuffer> {
        let params = &self.table.get(stage).heartbeat;

        // Every beep is identical, so synthesize it once.
        let beep = self.tones.synthesize(
            params.frequency,
            params.beep_seconds,
            self.sample.beep_amplitude,
            false,
        )?;
        let flatline = if params.flatline {
            Some(self.flatline_tone(params.frequency)?)
        } else {
            None
        };

        let pauses: Vec<usize> = (0..params.beats)
            .map(|i| self.tones.sample_count(params.pause.at(i)))
            .collect();
        let total = params.beats * beep.len()
            + pauses.iter().sum::<usize>()
            + flatline.as_ref().map_or(0, ToneSegment::len);

        let mut buffer = AudioBuffer::with_capacity(self.sample_rate(), total);
        for (i, &pause) in pauses.iter().enumerate() {
            buffer.push_segment(&beep);
            buffer.push_silence(pause);
            debug!(%stage, beat = i, pause_samples = pause, "heartbeat beat");
        }
        if let Some(tone) = &flatline {
            buffer.push_segment(tone);
        }
        Ok(buffer)
    }

    fn flatline_tone(&self, frequency: f64) -> Result<ToneSegment> {
        self.tones.synthesize(
            frequency,
            self.flatline.duration,
            self.flatline.amplitude,
            true,
        )
    }
}
