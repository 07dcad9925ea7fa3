// Chord-walk composition.
//
// Produces a four-track MidiFile one bar at a time. Tracks 0-2 carry the
// current chord's voicing held for the whole bar; track 3 carries a melody
// drawn from the chord's three tones. Each bar:
//
// 1. emit the chord on tracks 0-2,
// 2. draw note durations until the bar is exactly full, rejecting any draw
//    longer than what remains, then draw one chord tone per duration,
// 3. draw a float in [0, 1) and step the Markov chain (markov.rs).
//
// The walk starts on C major. Random draws happen in exactly that order
// (durations, melody tones, transition) so a seeded source reproduces the
// same bytes. The transition draw is taken after the final bar as well; its
// result is reported as `Composition::next_chord`.

use crate::chord::{Chord, Note, Pitch};
use crate::error::{ConfigError, MidiError};
use crate::markov::TransitionTable;
use crate::midi::{Articulation, DEFAULT_TICKS_PER_QUARTER, MidiFile};
use chordwalk_prng::RandomSource;
use serde::{Deserialize, Serialize};

/// First of the three chord tracks.
pub const CHORD_FIRST_TRACK: usize = 0;
pub const MELODY_TRACK: usize = 3;
pub const TRACK_COUNT: usize = 4;

/// Tunable parameters. Defaults reproduce the reference output: 4/4 bars of
/// 512 ticks at 128 ticks per quarter, sixteenth/eighth/quarter-length
/// melody notes, chords at octave 4 and melody at octave 6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerSettings {
    pub ticks_per_quarter: u16,
    pub bar_ticks: u32,
    pub note_durations: Vec<u32>,
    pub chord_octave: u8,
    pub melody_octave: u8,
    pub articulation: Articulation,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        ComposerSettings {
            ticks_per_quarter: DEFAULT_TICKS_PER_QUARTER,
            bar_ticks: 512,
            note_durations: vec![64, 128, 256],
            chord_octave: 4,
            melody_octave: 6,
            articulation: Articulation::default(),
        }
    }
}

impl ComposerSettings {
    /// Reject settings under which a bar could not be filled exactly or a
    /// key would leave the 0-127 range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.ticks_per_quarter == 0 || self.ticks_per_quarter > 0x7FFF {
            return invalid(format!(
                "ticks_per_quarter {} must be in 1..=32767",
                self.ticks_per_quarter
            ));
        }
        if self.bar_ticks == 0 {
            return invalid("bar_ticks must be positive".to_string());
        }
        let Some(&shortest) = self.note_durations.iter().min() else {
            return invalid("note_durations must not be empty".to_string());
        };
        if shortest == 0 {
            return invalid("note_durations must be positive".to_string());
        }
        // With every duration a multiple of the shortest, and the bar a
        // multiple of it too, the shortest always fits what remains.
        if let Some(&d) = self.note_durations.iter().find(|&&d| d % shortest != 0) {
            return invalid(format!("duration {d} is not a multiple of {shortest}"));
        }
        if self.bar_ticks % shortest != 0 {
            return invalid(format!(
                "bar_ticks {} is not a multiple of {shortest}",
                self.bar_ticks
            ));
        }
        if self.bar_ticks > crate::encode::VAR_LEN_MAX {
            return invalid(format!("bar_ticks {} is too long", self.bar_ticks));
        }
        // Voicings may lift a tone one octave above the chord octave.
        if highest_key(self.chord_octave, 1) > 127 {
            return invalid(format!("chord_octave {} puts keys above 127", self.chord_octave));
        }
        if highest_key(self.melody_octave, 0) > 127 {
            return invalid(format!("melody_octave {} puts keys above 127", self.melody_octave));
        }
        let a = &self.articulation;
        if a.channel > 15 || a.velocity > 127 || a.release_velocity > 127 {
            return invalid(format!("articulation out of range: {a:?}"));
        }
        Ok(())
    }
}

fn highest_key(octave: u8, lift: u16) -> u16 {
    12 * (u16::from(octave) + lift) + u16::from(Pitch::B.number())
}

/// What one bar contains, for inspection after composing.
#[derive(Debug, Clone, PartialEq)]
pub struct BarPlan {
    pub chord: Chord,
    pub durations: Vec<u32>,
    pub melody: Vec<Note>,
}

#[derive(Debug, Clone)]
pub struct Composition {
    pub file: MidiFile,
    pub bars: Vec<BarPlan>,
    /// The chord the walk would play after the last bar.
    pub next_chord: Chord,
}

#[derive(Debug, Clone, Default)]
pub struct Composer {
    settings: ComposerSettings,
}

impl Composer {
    pub fn new(settings: ComposerSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Composer { settings })
    }

    pub fn settings(&self) -> &ComposerSettings {
        &self.settings
    }

    /// Compose `bars` bars by walking `table` from C major.
    pub fn compose(
        &self,
        table: &TransitionTable,
        bars: usize,
        rng: &mut impl RandomSource,
    ) -> Result<Composition, MidiError> {
        let settings = &self.settings;
        let mut file = MidiFile::new().with_ticks_per_quarter(settings.ticks_per_quarter);
        for _ in 0..TRACK_COUNT {
            file.add_track();
        }

        let mut chord = Chord::C;
        let mut plans = Vec::with_capacity(bars);
        for bar in 0..bars {
            file.add_chord(
                CHORD_FIRST_TRACK,
                i64::from(settings.bar_ticks),
                settings.chord_octave,
                chord,
                settings.articulation,
            )?;

            let durations = self.fill_bar(rng);
            let tones = chord.tones();
            let mut melody = Vec::with_capacity(durations.len());
            for &duration in &durations {
                let pitch = tones[rng.uniform_int(tones.len() as u32) as usize];
                let note = Note::new(settings.melody_octave, pitch);
                file.add_note(MELODY_TRACK, i64::from(duration), note, settings.articulation)?;
                melody.push(note);
            }

            let next = table.next_chord(chord, rng.uniform_f64());
            tracing::debug!(bar, %chord, %next, notes = melody.len(), "composed bar");
            plans.push(BarPlan {
                chord,
                durations,
                melody,
            });
            chord = next;
        }

        Ok(Composition {
            file,
            bars: plans,
            next_chord: chord,
        })
    }

    /// Draw durations until exactly one bar is filled.
    pub fn fill_bar(&self, rng: &mut impl RandomSource) -> Vec<u32> {
        let candidates = &self.settings.note_durations;
        let mut remaining = self.settings.bar_ticks;
        let mut chosen = Vec::new();
        while remaining > 0 {
            let duration = loop {
                let candidate = candidates[rng.uniform_int(candidates.len() as u32) as usize];
                if candidate <= remaining {
                    break candidate;
                }
            };
            chosen.push(duration);
            remaining -= duration;
        }
        chosen
    }
}
