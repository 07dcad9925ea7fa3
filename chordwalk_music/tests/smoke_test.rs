// End-to-end check of composed output against an independent SMF reader.
//
// Composes pieces with a seeded Mersenne Twister, serializes them, and parses
// the bytes back with `midly`. The parsed events must line up with the
// composition's own record of chords, durations and melody notes, which
// checks the header, the track length fields and the event encoding in one
// pass without relying on this crate's encoder.

use chordwalk_music::chord::Chord;
use chordwalk_music::compose::{Composer, Composition, MELODY_TRACK, TRACK_COUNT};
use chordwalk_music::config::{GenerationConfig, TableSource};
use chordwalk_music::markov::{Preset, TransitionTable};
use chordwalk_prng::MersenneRng;
use midly::num::u15;
use midly::{Format, MidiMessage, Smf, Timing, TrackEventKind};

/// (is_note_on, key, delta) for every event of a parsed track.
fn parsed_events(smf: &Smf, track: usize) -> Vec<(bool, u8, u32)> {
    smf.tracks[track]
        .iter()
        .map(|event| match &event.kind {
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, .. },
                ..
            } => (true, key.as_int(), event.delta.as_int()),
            TrackEventKind::Midi {
                message: MidiMessage::NoteOff { key, .. },
                ..
            } => (false, key.as_int(), event.delta.as_int()),
            other => panic!("unexpected event {other:?}"),
        })
        .collect()
}

fn compose(preset: Preset, bars: usize, seed: u64) -> (Composition, Vec<u8>) {
    let mut rng = MersenneRng::seed_from_u64(seed);
    let table = TransitionTable::preset(preset);
    let mut composition = Composer::default().compose(&table, bars, &mut rng).unwrap();
    let bytes = composition.file.to_bytes().unwrap();
    (composition, bytes)
}

#[test]
fn parsed_output_matches_composition() {
    for (i, preset) in Preset::ALL.into_iter().enumerate() {
        let (composition, bytes) = compose(preset, 16, 1000 + i as u64);
        let smf = Smf::parse(&bytes).unwrap();

        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.header.timing, Timing::Metrical(u15::new(128)));
        assert_eq!(smf.tracks.len(), TRACK_COUNT);

        // Chord tracks: one held note per bar, voiced from the bar's chord.
        for voice in 0..3 {
            let expected: Vec<(bool, u8, u32)> = composition
                .bars
                .iter()
                .flat_map(|bar| {
                    let key = bar.chord.voicing(4)[voice].key();
                    [(true, key, 0), (false, key, 512)]
                })
                .collect();
            assert_eq!(parsed_events(&smf, voice), expected, "{preset:?} voice {voice}");
        }

        // Melody: each note is on at delta 0 and off after its duration.
        let expected: Vec<(bool, u8, u32)> = composition
            .bars
            .iter()
            .flat_map(|bar| {
                bar.melody
                    .iter()
                    .zip(&bar.durations)
                    .flat_map(|(note, &duration)| {
                        [(true, note.key(), 0), (false, note.key(), duration)]
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        assert_eq!(parsed_events(&smf, MELODY_TRACK), expected, "{preset:?} melody");
    }
}

#[test]
fn melody_bars_sum_to_full_bar_in_parsed_output() {
    let (composition, bytes) = compose(Preset::Uniform, 24, 31337);
    let smf = Smf::parse(&bytes).unwrap();

    let mut offs = parsed_events(&smf, MELODY_TRACK)
        .into_iter()
        .filter(|&(on, _, _)| !on)
        .map(|(_, key, delta)| (key, delta));
    for bar in &composition.bars {
        let mut filled = 0;
        while filled < 512 {
            let (key, delta) = offs.next().expect("melody ended early");
            let pitch = key % 12;
            assert!(
                bar.chord.tones().iter().any(|t| t.number() == pitch),
                "key {key} outside {}",
                bar.chord
            );
            filled += delta;
        }
        assert_eq!(filled, 512);
    }
    assert!(offs.next().is_none());
}

#[test]
fn seeded_runs_are_byte_identical() {
    let (_, first) = compose(Preset::MinorLeaning, 8, 77);
    let (_, second) = compose(Preset::MinorLeaning, 8, 77);
    assert_eq!(first, second);
}

#[test]
fn default_config_pieces_compose() {
    let config = GenerationConfig::default();
    let composer = Composer::new(config.composer.clone()).unwrap();
    for (i, piece) in config.pieces.iter().enumerate() {
        let table = piece.table.resolve(std::path::Path::new(".")).unwrap();
        let mut rng = MersenneRng::seed_from_u64(i as u64);
        let mut composition = composer.compose(&table, piece.bars, &mut rng).unwrap();
        assert_eq!(composition.bars.len(), 8);
        assert_eq!(composition.bars[0].chord, Chord::C);
        let bytes = composition.file.to_bytes().unwrap();
        assert!(Smf::parse(&bytes).is_ok());
    }
    assert!(matches!(config.pieces[0].table, TableSource::Preset(Preset::Uniform)));
}
