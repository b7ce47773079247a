// MIDI output from note sequences.
//
// Converts a NoteSequence into a Standard MIDI File for playback. The score
// is a single melodic line plus chords on one channel, so the output is
// SMF Format 0 (one track): set-tempo, program change, the note stream, and
// end-of-track. Delta times come straight from `NoteSequence::messages()`.
//
// Uses the `midly` crate for MIDI writing.

use crate::error::{Result, SynthError};
use crate::score::{NoteSequence, ScoreMessage};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// All notes go out on the first channel.
const CHANNEL: u8 = 0;

/// Convert a NoteSequence to MIDI and write it to a file.
pub fn write_midi(sequence: &NoteSequence, path: &Path) -> Result<()> {
    let bytes = encode_midi(sequence)?;
    std::fs::write(path, &bytes).map_err(|source| SynthError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote MIDI");
    Ok(())
}

/// Serialize a NoteSequence to SMF bytes.
pub fn encode_midi(sequence: &NoteSequence) -> Result<Vec<u8>> {
    let smf = sequence_to_smf(sequence);
    let mut buf = Vec::new();
    smf.write(&mut buf)
        .map_err(|e| SynthError::Midi(e.to_string()))?;
    Ok(buf)
}

fn sequence_to_smf(sequence: &NoteSequence) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(sequence.ticks_per_quarter)),
    ));

    let channel = u4::new(CHANNEL);
    let mut track: Track<'static> = sequence
        .messages()
        .into_iter()
        .map(|timed| TrackEvent {
            delta: u28::new(timed.delta),
            kind: match timed.message {
                ScoreMessage::SetTempo { micros_per_quarter } => {
                    TrackEventKind::Meta(MetaMessage::Tempo(u24::new(micros_per_quarter)))
                }
                ScoreMessage::ProgramChange { program } => TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::ProgramChange {
                        program: u7::new(program),
                    },
                },
                ScoreMessage::NoteOn { pitch, velocity } => TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOn {
                        key: u7::new(pitch),
                        vel: u7::new(velocity),
                    },
                },
                ScoreMessage::NoteOff { pitch, velocity } => TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOff {
                        key: u7::new(pitch),
                        vel: u7::new(velocity),
                    },
                },
            },
        })
        .collect();

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);
    smf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::score::NoteEventSequencer;

    fn denial() -> NoteSequence {
        NoteEventSequencer::new(&RenderConfig::default())
            .unwrap()
            .build("Denial", 0.5)
            .unwrap()
    }

    #[test]
    fn test_sequence_to_smf_basic() {
        let seq = denial();
        let smf = sequence_to_smf(&seq);
        assert_eq!(smf.header.format, Format::SingleTrack);
        assert_eq!(smf.header.timing, Timing::Metrical(u15::new(480)));
        assert_eq!(smf.tracks.len(), 1);
        // Tempo + program + notes + end-of-track.
        assert_eq!(smf.tracks[0].len(), seq.events.len() + 3);
        assert_eq!(
            smf.tracks[0][0].kind,
            TrackEventKind::Meta(MetaMessage::Tempo(u24::new(750_000)))
        );
        assert_eq!(
            smf.tracks[0][1].kind,
            TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::ProgramChange { program: u7::new(89) },
            }
        );
    }

    #[test]
    fn test_encode_round_trips_through_parser() {
        let seq = denial();
        let bytes = encode_midi(&seq).unwrap();
        assert_eq!(&bytes[..4], b"MThd");

        let smf = Smf::parse(&bytes).unwrap();
        let ticks: u32 = smf.tracks[0].iter().map(|e| e.delta.as_int()).sum();
        assert_eq!(ticks, seq.end_tick());
        let note_ons = smf.tracks[0]
            .iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    TrackEventKind::Midi { message: MidiMessage::NoteOn { .. }, .. }
                )
            })
            .count();
        assert_eq!(note_ons, seq.events.len() / 2);
    }
}
