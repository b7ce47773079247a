// The stage parameter table: every per-stage constant in one place.
//
// Each stage carries three groups of parameters:
// - `HeartbeatParams`: beep frequency and length, pause pattern, beat count,
//   and whether a fading flatline closes the sequence (waveform.rs).
// - `drone`: a chord progression as frequency sets, one chord per drone unit
//   (waveform.rs).
// - `ScoreParams`: tempo, General MIDI program, chord progression as pitch
//   sets, and a one-note-per-bar melodic motif (score.rs).
//
// The table is built once per process behind a `LazyLock` and never mutated,
// so concurrent renders can share it without locking. Nothing in here is
// configurable at runtime; global render settings live in config.rs.
//
// Pauses that alternate between values are resolved into `Pause::Cyclic` at
// construction time, so the sequencer never has to ask whether a pause is a
// scalar or a list.

use crate::error::Result;
use crate::stage::Stage;
use std::sync::LazyLock;

/// Frequency of every heartbeat beep (G5).
pub const BEEP_FREQUENCY: f64 = 783.99;

/// Silence after a heartbeat beep.
#[derive(Debug, Clone, PartialEq)]
pub enum Pause {
    Fixed(f64),
    /// Cycles through the list in lockstep with the beat index.
    Cyclic(Vec<f64>),
}

impl Pause {
    /// Pause length in seconds after beat `beat`.
    pub fn at(&self, beat: usize) -> f64 {
        match self {
            Pause::Fixed(seconds) => *seconds,
            Pause::Cyclic(seconds) => seconds[beat % seconds.len()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatParams {
    pub frequency: f64,
    /// Length of one beep in seconds.
    pub beep_seconds: f64,
    pub pause: Pause,
    pub beats: usize,
    /// Append the fading flatline tone after the last beat.
    pub flatline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreParams {
    pub tempo_bpm: u32,
    /// General MIDI program number (0-based).
    pub program: u8,
    /// Chords as MIDI pitch sets, cycled one per bar.
    pub progression: Vec<Vec<u8>>,
    /// Melody pitches, cycled one per bar.
    pub motif: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageConfig {
    pub stage: Stage,
    pub heartbeat: HeartbeatParams,
    /// Chords as frequency sets in Hz, cycled one per drone unit.
    pub drone: Vec<Vec<f64>>,
    pub score: ScoreParams,
}

pub struct StageParameterTable {
    configs: [StageConfig; 5],
}

static TABLE: LazyLock<StageParameterTable> = LazyLock::new(StageParameterTable::build);

impl StageParameterTable {
    /// The process-wide table.
    pub fn global() -> &'static StageParameterTable {
        &TABLE
    }

    /// Config for a known stage. Infallible: the enum is closed.
    pub fn get(&self, stage: Stage) -> &StageConfig {
        &self.configs[stage.index()]
    }

    /// Config for a stage name, or `UnknownStage`.
    pub fn lookup(&self, stage_id: &str) -> Result<&StageConfig> {
        let stage: Stage = stage_id.parse()?;
        Ok(self.get(stage))
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageConfig> {
        self.configs.iter()
    }

    fn build() -> Self {
        StageParameterTable {
            configs: Stage::ALL.map(build_stage),
        }
    }
}

fn build_stage(stage: Stage) -> StageConfig {
    let (beep_seconds, pause, beats, flatline) = match stage {
        Stage::Denial => (0.2, Pause::Fixed(0.6), 5, false),
        Stage::Anger => (0.1, Pause::Cyclic(vec![0.2, 0.4]), 8, false),
        Stage::Bargaining => (0.15, Pause::Cyclic(vec![0.3, 0.7]), 6, false),
        Stage::Depression => (0.4, Pause::Fixed(1.5), 4, false),
        Stage::Acceptance => (0.2, Pause::Fixed(0.8), 4, true),
    };

    let score = match stage {
        // Am - F - C - G, celesta
        Stage::Denial => ScoreParams {
            tempo_bpm: 80,
            program: 89,
            progression: vec![
                vec![57, 60, 64],
                vec![53, 57, 60],
                vec![48, 52, 55],
                vec![43, 47, 50],
            ],
            motif: vec![60, 62, 64, 62],
        },
        // Am(b3 up) - G - F - Em, overdriven guitar
        Stage::Anger => ScoreParams {
            tempo_bpm: 120,
            program: 29,
            progression: vec![
                vec![57, 60, 63],
                vec![55, 59, 62],
                vec![53, 57, 60],
                vec![52, 55, 59],
            ],
            motif: vec![63, 62, 60, 62],
        },
        // Am7 - D7 - G - Cmaj7, strings
        Stage::Bargaining => ScoreParams {
            tempo_bpm: 90,
            program: 48,
            progression: vec![
                vec![57, 60, 67],
                vec![50, 57, 62],
                vec![55, 59, 62],
                vec![48, 52, 55],
            ],
            motif: vec![67, 65, 64, 65],
        },
        // Am - Em - Dm - F, tremolo strings
        Stage::Depression => ScoreParams {
            tempo_bpm: 50,
            program: 45,
            progression: vec![
                vec![57, 60, 64],
                vec![52, 55, 59],
                vec![50, 53, 57],
                vec![53, 57, 60],
            ],
            motif: vec![60, 59, 57, 59],
        },
        // C - G - Am - F, tubular bells
        Stage::Acceptance => ScoreParams {
            tempo_bpm: 70,
            program: 14,
            progression: vec![
                vec![48, 52, 55],
                vec![43, 47, 50],
                vec![57, 60, 64],
                vec![53, 57, 60],
            ],
            motif: vec![60, 62, 64, 67],
        },
    };

    let drone = match stage {
        // The dazed eight-chord drone: Am F C G Dm E F G.
        Stage::Denial => vec![
            vec![220.0, 261.63, 329.63],
            vec![174.61, 220.0, 261.63],
            vec![130.81, 164.81, 196.0],
            vec![98.0, 123.47, 146.83],
            vec![146.83, 174.61, 220.0],
            vec![164.81, 207.65, 246.94],
            vec![174.61, 220.0, 261.63],
            vec![98.0, 123.47, 146.83],
        ],
        _ => score
            .progression
            .iter()
            .map(|chord| chord.iter().map(|&p| pitch_to_frequency(p)).collect())
            .collect(),
    };

    StageConfig {
        stage,
        heartbeat: HeartbeatParams {
            frequency: BEEP_FREQUENCY,
            beep_seconds,
            pause,
            beats,
            flatline,
        },
        drone,
        score,
    }
}

/// Equal-tempered frequency of a MIDI pitch (A4 = 69 = 440 Hz), rounded to
/// 0.01 Hz to match the hand-written drone tables.
pub fn pitch_to_frequency(pitch: u8) -> f64 {
    let hz = 440.0 * 2f64.powf((pitch as f64 - 69.0) / 12.0);
    (hz * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SynthError;

    #[test]
    fn test_table_covers_every_stage_in_order() {
        let table = StageParameterTable::global();
        for stage in Stage::ALL {
            assert_eq!(table.get(stage).stage, stage);
        }
        assert_eq!(table.iter().count(), 5);
    }

    #[test]
    fn test_global_is_built_once() {
        let a = StageParameterTable::global() as *const _;
        let b = StageParameterTable::global() as *const _;
        assert_eq!(a, b);
    }

    #[test]
    fn test_lookup_unknown_stage() {
        let table = StageParameterTable::global();
        assert!(matches!(table.lookup("Joy"), Err(SynthError::UnknownStage(_))));
        assert!(matches!(
            table.lookup("Flatline"),
            Err(SynthError::UnknownStage(_))
        ));
        assert_eq!(table.lookup("bargaining").unwrap().score.tempo_bpm, 90);
    }

    #[test]
    fn test_cyclic_pause() {
        let anger = StageParameterTable::global().get(Stage::Anger);
        let pause = &anger.heartbeat.pause;
        assert_eq!(pause.at(0), 0.2);
        assert_eq!(pause.at(1), 0.4);
        assert_eq!(pause.at(3), pause.at(1));
        assert_eq!(pause.at(3), 0.4);

        let depression = StageParameterTable::global().get(Stage::Depression);
        assert_eq!(depression.heartbeat.pause.at(7), 1.5);
    }

    #[test]
    fn test_only_acceptance_flatlines() {
        let table = StageParameterTable::global();
        let flatlining: Vec<Stage> = table
            .iter()
            .filter(|c| c.heartbeat.flatline)
            .map(|c| c.stage)
            .collect();
        assert_eq!(flatlining, vec![Stage::Acceptance]);
    }

    #[test]
    fn test_pitch_to_frequency() {
        assert_eq!(pitch_to_frequency(69), 440.0);
        assert_eq!(pitch_to_frequency(57), 220.0);
        assert_eq!(pitch_to_frequency(60), 261.63);
        assert_eq!(pitch_to_frequency(64), 329.63);
        assert_eq!(pitch_to_frequency(43), 98.0);
    }

    #[test]
    fn test_denial_drone_opens_with_its_score_chords() {
        // The first four drone chords are the score progression in Hz.
        let denial = StageParameterTable::global().get(Stage::Denial);
        assert_eq!(denial.drone.len(), 8);
        for (chord, pitches) in denial.drone.iter().zip(&denial.score.progression) {
            let converted: Vec<f64> = pitches.iter().map(|&p| pitch_to_frequency(p)).collect();
            assert_eq!(chord, &converted);
        }
    }

    #[test]
    fn test_derived_drones_match_progressions() {
        let anger = StageParameterTable::global().get(Stage::Anger);
        assert_eq!(anger.drone.len(), anger.score.progression.len());
        assert_eq!(anger.drone[0], vec![220.0, 261.63, 311.13]);
    }

    #[test]
    fn test_pitches_in_midi_range() {
        for config in StageParameterTable::global().iter() {
            let all = config
                .score
                .progression
                .iter()
                .flatten()
                .chain(config.score.motif.iter());
            for &p in all {
                assert!(p <= 127);
            }
            assert!(config.score.program <= 127);
        }
    }
}
