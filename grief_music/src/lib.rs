// Grief Stage Sound Generator
//
// Procedurally renders audio for the five stages of grief (Denial, Anger,
// Bargaining, Depression, Acceptance). Every stage is a fixed preset of
// tempo, timbre, and rhythm; rendering is deterministic, so the same stage
// and settings always yield the same samples or events.
//
// Two independent outputs are built from one parameter table:
// - Sample domain: heartbeat beeps with (possibly alternating) pauses, a
//   fading flatline tone, and a slow additive-synthesis chord drone.
// - Symbolic domain: a MIDI score of one chord plus one melody note per bar,
//   closing on the opening chord.
//
// Architecture:
// - stage.rs: Closed set of stage identities and name parsing
// - table.rs: Per-stage parameter table, built once and shared read-only
// - config.rs: Render settings (sample rate, amplitudes, tick grid), JSON-loadable
// - envelope.rs: Trailing linear fade envelope
// - tone.rs: Sine tone synthesis with optional fade-out
// - chord.rs: Additive chord synthesis with peak normalization
// - waveform.rs: Heartbeat / drone / flatline sequencing into an AudioBuffer
// - score.rs: Bar-by-bar note-event sequencing with overlap resolution
// - wav.rs: WAV output (16-bit mono PCM)
// - midi.rs: Standard MIDI File output
// - error.rs: Error taxonomy shared by all of the above

pub mod chord;
pub mod config;
pub mod envelope;
pub mod error;
pub mod midi;
pub mod score;
pub mod stage;
pub mod table;
pub mod tone;
pub mod wav;
pub mod waveform;

pub use config::RenderConfig;
pub use error::{Result, SynthError};
pub use score::{NoteEventSequencer, NoteSequence};
pub use stage::Stage;
pub use waveform::{AudioBuffer, HeartbeatTarget, WaveformSequencer};
