// Symbolic sequencing: chord progression + motif as timed note events.
//
// The score is laid out on a fixed tick grid with no swing or humanization.
// For each bar `b` in `[0, total_bars)` starting at tick `b * bar_ticks`:
// - every pitch of `progression[b % len]` sounds from the bar start for
//   `chord_hold_ticks`,
// - `motif[b % len]` sounds from `melody_start_ticks` to `melody_end_ticks`.
// After the last bar, `progression[0]` is played once more and held for
// `resolve_hold_ticks`, so every piece opens and closes on the same chord.
//
// `total_bars = floor(tempo / beats_per_bar * minutes)`.
//
// Notes are first collected as (pitch, start, end) spans and only then turned
// into on/off events. That is where same-pitch overlaps get resolved: the
// melody note often repeats a chord tone that is still sounding (Denial's
// first bar plays C4 in both). Under `OverlapPolicy::Truncate` the earlier
// span is cut at the retrigger tick; under `Preserve` the raw grid stands.
//
// Events carry absolute ticks. `NoteSequence::messages()` produces the
// delta-timed stream (tempo and program change first) that midi.rs writes.

use crate::config::{OverlapPolicy, RenderConfig, ScoreSettings};
use crate::error::{Result, SynthError, require_positive};
use crate::stage::Stage;
use crate::table::StageParameterTable;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NoteKind {
    // Off sorts first so a note can end and restart on the same tick.
    Off,
    On,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    /// Absolute tick.
    pub tick: u32,
    pub pitch: u8,
    pub velocity: u8,
    pub kind: NoteKind,
}

/// One message in the delta-timed track stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMessage {
    SetTempo { micros_per_quarter: u32 },
    ProgramChange { program: u8 },
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8, velocity: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedMessage {
    /// Ticks since the previous message.
    pub delta: u32,
    pub message: ScoreMessage,
}

/// A finished score for one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteSequence {
    pub stage: Stage,
    pub tempo_bpm: u32,
    pub program: u8,
    pub ticks_per_quarter: u16,
    pub total_bars: usize,
    /// Sorted by tick; at equal ticks note-offs precede note-ons.
    pub events: Vec<NoteEvent>,
}

impl NoteSequence {
    /// Tick of the last event.
    pub fn end_tick(&self) -> u32 {
        self.events.last().map_or(0, |e| e.tick)
    }

    /// Pitches struck at the latest note-on tick, ascending.
    pub fn final_chord(&self) -> Vec<u8> {
        let Some(last_on) = self
            .events
            .iter()
            .filter(|e| e.kind == NoteKind::On)
            .map(|e| e.tick)
            .max()
        else {
            return Vec::new();
        };
        let mut pitches: Vec<u8> = self
            .events
            .iter()
            .filter(|e| e.kind == NoteKind::On && e.tick == last_on)
            .map(|e| e.pitch)
            .collect();
        pitches.sort_unstable();
        pitches
    }

    /// True when every note-on is closed by exactly one strictly later
    /// note-off of the same pitch before that pitch is struck again.
    pub fn is_strictly_closed(&self) -> bool {
        let mut sounding: BTreeMap<u8, u32> = BTreeMap::new();
        for event in &self.events {
            match event.kind {
                NoteKind::On => {
                    if sounding.insert(event.pitch, event.tick).is_some() {
                        return false;
                    }
                }
                NoteKind::Off => match sounding.remove(&event.pitch) {
                    Some(start) if start < event.tick => {}
                    _ => return false,
                },
            }
        }
        sounding.is_empty()
    }

    /// Delta-timed stream: set-tempo, program change, then the notes.
    pub fn messages(&self) -> Vec<TimedMessage> {
        let mut out = Vec::with_capacity(self.events.len() + 2);
        out.push(TimedMessage {
            delta: 0,
            message: ScoreMessage::SetTempo {
                micros_per_quarter: 60_000_000 / self.tempo_bpm,
            },
        });
        out.push(TimedMessage {
            delta: 0,
            message: ScoreMessage::ProgramChange {
                program: self.program,
            },
        });

        let mut last_tick = 0;
        for event in &self.events {
            let message = match event.kind {
                NoteKind::On => ScoreMessage::NoteOn {
                    pitch: event.pitch,
                    velocity: event.velocity,
                },
                NoteKind::Off => ScoreMessage::NoteOff {
                    pitch: event.pitch,
                    velocity: event.velocity,
                },
            };
            out.push(TimedMessage {
                delta: event.tick - last_tick,
                message,
            });
            last_tick = event.tick;
        }
        out
    }
}

/// A note before it is split into on/off events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    pitch: u8,
    velocity: u8,
    start: u32,
    end: u32,
}

pub struct NoteEventSequencer {
    settings: ScoreSettings,
    table: &'static StageParameterTable,
}

impl NoteEventSequencer {
    pub fn new(config: &RenderConfig) -> Result<Self> {
        config.validate()?;
        Ok(NoteEventSequencer {
            settings: config.score.clone(),
            table: StageParameterTable::global(),
        })
    }

    /// `floor(tempo / beats_per_bar * minutes)`.
    pub fn total_bars(&self, tempo_bpm: u32, duration_minutes: f64) -> usize {
        let bars_per_minute = tempo_bpm as f64 / self.settings.beats_per_bar as f64;
        (bars_per_minute * duration_minutes).floor() as usize
    }

    /// The cadence starts at `total_bars * bar_ticks` and nothing outlasts
    /// its longest hold, so that sum bounds every tick the score uses.
    fn check_tick_range(&self, total_bars: usize) -> Result<()> {
        let s = &self.settings;
        let tail = s
            .resolve_hold_ticks
            .max(s.chord_hold_ticks)
            .max(s.melody_end_ticks);
        u32::try_from(total_bars)
            .ok()
            .and_then(|bars| bars.checked_mul(s.bar_ticks))
            .and_then(|cadence| cadence.checked_add(tail))
            .map(|_| ())
            .ok_or_else(|| {
                SynthError::invalid(
                    "duration_minutes",
                    format!("{total_bars} bars overflow the 32-bit tick range"),
                )
            })
    }

    /// Score for a stage name. Fails with `UnknownStage` before any events
    /// are generated.
    pub fn build(&self, stage_id: &str, duration_minutes: f64) -> Result<NoteSequence> {
        let stage: Stage = stage_id.parse()?;
        self.build_for(stage, duration_minutes)
    }

    pub fn build_for(&self, stage: Stage, duration_minutes: f64) -> Result<NoteSequence> {
        require_positive("duration_minutes", duration_minutes)?;
        let params = &self.table.get(stage).score;
        let s = &self.settings;
        let total_bars = self.total_bars(params.tempo_bpm, duration_minutes);
        self.check_tick_range(total_bars)?;

        let mut spans = Vec::new();
        let mut bar_start: u32 = 0;
        for bar in 0..total_bars {
            let chord = &params.progression[bar % params.progression.len()];
            for &pitch in chord {
                spans.push(Span {
                    pitch,
                    velocity: s.chord_velocity,
                    start: bar_start,
                    end: bar_start + s.chord_hold_ticks,
                });
            }

            let melody = params.motif[bar % params.motif.len()];
            spans.push(Span {
                pitch: melody,
                velocity: s.melody_velocity,
                start: bar_start + s.melody_start_ticks,
                end: bar_start + s.melody_end_ticks,
            });

            bar_start += s.bar_ticks;
        }

        // Cadence: back to the opening chord, held longer.
        for &pitch in &params.progression[0] {
            spans.push(Span {
                pitch,
                velocity: s.chord_velocity,
                start: bar_start,
                end: bar_start + s.resolve_hold_ticks,
            });
        }

        if s.overlap == OverlapPolicy::Truncate {
            spans = close_overlaps(spans);
        }

        let sequence = NoteSequence {
            stage,
            tempo_bpm: params.tempo_bpm,
            program: params.program,
            ticks_per_quarter: s.ticks_per_quarter,
            total_bars,
            events: spans_to_events(&spans),
        };

        if !sequence.is_strictly_closed() {
            warn!(%stage, "score keeps overlapping same-pitch notes");
        }
        info!(
            %stage,
            bars = total_bars,
            events = sequence.events.len(),
            end_tick = sequence.end_tick(),
            "rendered score"
        );
        Ok(sequence)
    }
}

/// Cut each span at the start of the next span of the same pitch. Spans that
/// start on the same tick with the same pitch merge into one.
fn close_overlaps(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by_key(|span| (span.pitch, span.start));
    let mut resolved: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(prev) = resolved.last_mut() {
            if prev.pitch == span.pitch && span.start < prev.end {
                if span.start == prev.start {
                    prev.end = prev.end.max(span.end);
                    prev.velocity = prev.velocity.max(span.velocity);
                    continue;
                }
                prev.end = span.start;
            }
        }
        resolved.push(span);
    }
    resolved
}

fn spans_to_events(spans: &[Span]) -> Vec<NoteEvent> {
    let mut events: Vec<NoteEvent> = spans
        .iter()
        .flat_map(|span| {
            [
                NoteEvent {
                    tick: span.start,
                    pitch: span.pitch,
                    velocity: span.velocity,
                    kind: NoteKind::On,
                },
                NoteEvent {
                    tick: span.end,
                    pitch: span.pitch,
                    velocity: span.velocity,
                    kind: NoteKind::Off,
                },
            ]
        })
        .collect();
    events.sort_by_key(|e| (e.tick, e.kind, e.pitch));
    events
}
