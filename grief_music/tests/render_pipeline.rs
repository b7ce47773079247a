// End-to-end rendering through the file boundaries.
//
// Renders each output kind into a temporary directory, then reads the files
// back with the same crates a player would use (hound for WAV, midly for
// MIDI) and checks the decoded content against the in-memory render. Also
// checks that a bad stage name is rejected without creating any file.

use grief_music::midi::write_midi;
use grief_music::wav::write_wav;
use grief_music::{
    HeartbeatTarget, NoteEventSequencer, RenderConfig, Stage, SynthError, WaveformSequencer,
};
use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};
use std::collections::BTreeMap;

/// Low sample rate so the multi-second renders stay fast.
fn fast_config() -> RenderConfig {
    let mut config = RenderConfig::default();
    config.sample.sample_rate = 4_000;
    config
}

#[test]
fn heartbeat_wav_matches_render() {
    let dir = tempfile::tempdir().unwrap();
    let waves = WaveformSequencer::new(&fast_config()).unwrap();

    for target in Stage::ALL
        .into_iter()
        .map(HeartbeatTarget::Stage)
        .chain([HeartbeatTarget::Flatline])
    {
        let buffer = waves.build_heartbeat_for(target).unwrap();
        let path = dir.path().join(format!("{target}.wav"));
        write_wav(&buffer, &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_rate, 4_000);
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, buffer.to_pcm_i16(), "{target}");
    }
}

#[test]
fn drone_wav_has_whole_chord_units() {
    let dir = tempfile::tempdir().unwrap();
    let waves = WaveformSequencer::new(&fast_config()).unwrap();
    let path = dir.path().join("denial_drone.wav");

    // 30 s at 4 s per chord: 7 whole chords.
    write_wav(&waves.build_drone("Denial", 30.0).unwrap(), &path).unwrap();
    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.len(), 7 * 16_000);

    // Normalized chords peak at full scale.
    let peak = reader
        .into_samples::<i16>()
        .map(|s| s.unwrap().unsigned_abs())
        .max()
        .unwrap();
    assert!(peak >= 32_766);
}

#[test]
fn score_midi_is_well_formed() {
    let dir = tempfile::tempdir().unwrap();
    let notes = NoteEventSequencer::new(&RenderConfig::default()).unwrap();

    for stage in Stage::ALL {
        let sequence = notes.build_for(stage, 2.0).unwrap();
        let path = dir.path().join(format!("{}.mid", stage.slug()));
        write_midi(&sequence, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 1);
        let track = &smf.tracks[0];

        assert!(matches!(
            track[0].kind,
            TrackEventKind::Meta(MetaMessage::Tempo(_))
        ));
        assert!(matches!(
            track.last().unwrap().kind,
            TrackEventKind::Meta(MetaMessage::EndOfTrack)
        ));

        // Walk the track: every note-on is closed before its pitch sounds
        // again, and the last chord struck is the opening chord.
        let mut tick = 0u32;
        let mut sounding: BTreeMap<u8, u32> = BTreeMap::new();
        let mut last_on_tick = 0u32;
        let mut last_chord: Vec<u8> = Vec::new();
        for event in track {
            tick += event.delta.as_int();
            if let TrackEventKind::Midi { message, .. } = &event.kind {
                match message {
                    MidiMessage::NoteOn { key, .. } => {
                        let key = key.as_int();
                        assert!(sounding.insert(key, tick).is_none(), "{stage}: retrigger {key}");
                        if tick != last_on_tick {
                            last_on_tick = tick;
                            last_chord.clear();
                        }
                        last_chord.push(key);
                    }
                    MidiMessage::NoteOff { key, .. } => {
                        let start = sounding.remove(&key.as_int()).expect("note-off without note-on");
                        assert!(start < tick);
                    }
                    _ => {}
                }
            }
        }
        assert!(sounding.is_empty());
        last_chord.sort_unstable();
        assert_eq!(last_chord, sequence.final_chord());
        assert_eq!(tick, sequence.end_tick());
    }
}

#[test]
fn unknown_stage_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let waves = WaveformSequencer::new(&fast_config()).unwrap();
    let notes = NoteEventSequencer::new(&fast_config()).unwrap();

    assert!(matches!(waves.build_heartbeat("Euphoria"), Err(SynthError::UnknownStage(_))));
    assert!(matches!(waves.build_drone("Euphoria", 8.0), Err(SynthError::UnknownStage(_))));
    assert!(matches!(notes.build("Euphoria", 2.0), Err(SynthError::UnknownStage(_))));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{ "sample": { "sample_rate": 2000, "chord_seconds": 2.0 }, "flatline": { "duration": 3.0 } }"#,
    )
    .unwrap();

    let config = RenderConfig::load(&path).unwrap();
    let waves = WaveformSequencer::new(&config).unwrap();
    assert_eq!(waves.build_drone("Anger", 8.0).unwrap().len(), 4 * 4_000);
    assert_eq!(waves.build_heartbeat("Flatline").unwrap().len(), 6_000);

    std::fs::write(&path, r#"{ "sample": { "chord_amplitude": 2.0 } }"#).unwrap();
    assert!(matches!(
        RenderConfig::load(&path),
        Err(SynthError::InvalidParameter { .. })
    ));
}
