// Pitch and chord vocabulary.
//
// Pitches are the 12 pitch classes (C = 0 .. B = 11); a `Note` adds an octave
// and yields the MIDI key `12 * octave + pitch`. Chords are a root plus a
// major/minor quality and have a compact index, `pitch * 2` for major and
// `pitch * 2 + 1` for minor, which is how transition tables address them
// (see markov.rs).
//
// The voicing table gives the three close-position tones used when a chord
// is spread over three tracks: root, third, fifth, with any tone whose pitch
// class lies below the root lifted an octave. It covers every root and
// quality even though the presets only reach C, Dm, F, G and Am.

use crate::error::MidiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the 12 pitch classes. Sharps are spelled with an `s` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pitch {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl Pitch {
    pub const ALL: [Pitch; 12] = [
        Pitch::C,
        Pitch::Cs,
        Pitch::D,
        Pitch::Ds,
        Pitch::E,
        Pitch::F,
        Pitch::Fs,
        Pitch::G,
        Pitch::Gs,
        Pitch::A,
        Pitch::As,
        Pitch::B,
    ];

    /// Semitones above C.
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Result<Self, MidiError> {
        Self::ALL
            .get(usize::from(n))
            .copied()
            .ok_or_else(|| MidiError::InvalidChordIdentity(format!("pitch {n}")))
    }

    /// The pitch `semitones` above this one, wrapping within the octave.
    pub fn transpose(self, semitones: u8) -> Self {
        Self::ALL[(usize::from(self.number()) + usize::from(semitones)) % 12]
    }

    pub fn name(self) -> &'static str {
        match self {
            Pitch::C => "C",
            Pitch::Cs => "C#",
            Pitch::D => "D",
            Pitch::Ds => "D#",
            Pitch::E => "E",
            Pitch::F => "F",
            Pitch::Fs => "F#",
            Pitch::G => "G",
            Pitch::Gs => "G#",
            Pitch::A => "A",
            Pitch::As => "A#",
            Pitch::B => "B",
        }
    }
}

/// An absolute pitch: octave plus pitch class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub octave: u8,
    pub pitch: Pitch,
}

impl Note {
    pub fn new(octave: u8, pitch: Pitch) -> Self {
        Note { octave, pitch }
    }

    /// The MIDI key byte, `12 * octave + pitch`. Keys past 127 are the
    /// caller's responsibility; the value is truncated to a byte like the
    /// wire field.
    pub fn key(self) -> u8 {
        (12 * u16::from(self.octave) + u16::from(self.pitch.number())) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    Major,
    Minor,
}

impl Quality {
    /// Semitones from root to third.
    fn third(self) -> u8 {
        match self {
            Quality::Major => 4,
            Quality::Minor => 3,
        }
    }
}

/// A triad identity: root and quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub root: Pitch,
    pub quality: Quality,
}

/// Size of the chord index space (12 roots × 2 qualities).
pub const CHORD_COUNT: usize = 24;

impl Chord {
    pub const C: Chord = Chord::major(Pitch::C);
    pub const D_MINOR: Chord = Chord::minor(Pitch::D);
    pub const F: Chord = Chord::major(Pitch::F);
    pub const G: Chord = Chord::major(Pitch::G);
    pub const A_MINOR: Chord = Chord::minor(Pitch::A);

    pub const fn major(root: Pitch) -> Self {
        Chord {
            root,
            quality: Quality::Major,
        }
    }

    pub const fn minor(root: Pitch) -> Self {
        Chord {
            root,
            quality: Quality::Minor,
        }
    }

    /// Position in the 24-entry index space.
    pub fn index(self) -> usize {
        let base = usize::from(self.root.number()) * 2;
        match self.quality {
            Quality::Major => base,
            Quality::Minor => base + 1,
        }
    }

    pub fn from_index(index: usize) -> Result<Self, MidiError> {
        if index >= CHORD_COUNT {
            return Err(MidiError::InvalidChordIdentity(format!("index {index}")));
        }
        let root = Pitch::from_number((index / 2) as u8)?;
        Ok(match index % 2 {
            0 => Chord::major(root),
            _ => Chord::minor(root),
        })
    }

    /// Every chord in index order.
    pub fn all() -> impl Iterator<Item = Chord> {
        Pitch::ALL
            .into_iter()
            .flat_map(|root| [Chord::major(root), Chord::minor(root)])
    }

    /// Root, third and fifth as pitch classes. These are the melody's scale
    /// tones while the chord sounds.
    pub fn tones(self) -> [Pitch; 3] {
        [
            self.root,
            self.root.transpose(self.quality.third()),
            self.root.transpose(7),
        ]
    }

    /// The three voiced tones, one per track, at the given base octave.
    pub fn voicing(self, octave: u8) -> [Note; 3] {
        let quality = match self.quality {
            Quality::Major => 0,
            Quality::Minor => 1,
        };
        VOICINGS[usize::from(self.root.number())][quality]
            .map(|(pitch, shift)| Note::new(octave + shift, pitch))
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root.name())?;
        if self.quality == Quality::Minor {
            f.write_str("m")?;
        }
        Ok(())
    }
}

impl FromStr for Chord {
    type Err = MidiError;

    /// Parses `C`, `Dm`, `F#`, `G#m` and so on.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (root_name, quality) = match s.strip_suffix('m') {
            Some(root) => (root, Quality::Minor),
            None => (s, Quality::Major),
        };
        Pitch::ALL
            .into_iter()
            .find(|p| p.name() == root_name)
            .map(|root| Chord { root, quality })
            .ok_or_else(|| MidiError::InvalidChordIdentity(s.to_string()))
    }
}

use Pitch::{A, As, B, C, Cs, D, Ds, E, F, Fs, G, Gs};

/// `VOICINGS[root][quality]` = (pitch, octave shift) for tracks +0, +1, +2.
/// Quality 0 is major, 1 is minor.
static VOICINGS: [[[(Pitch, u8); 3]; 2]; 12] = [
    [[(C, 0), (E, 0), (G, 0)], [(C, 0), (Ds, 0), (G, 0)]],
    [[(Cs, 0), (F, 0), (Gs, 0)], [(Cs, 0), (E, 0), (Gs, 0)]],
    [[(D, 0), (Fs, 0), (A, 0)], [(D, 0), (F, 0), (A, 0)]],
    [[(Ds, 0), (G, 0), (As, 0)], [(Ds, 0), (Fs, 0), (As, 0)]],
    [[(E, 0), (Gs, 0), (B, 0)], [(E, 0), (G, 0), (B, 0)]],
    [[(F, 0), (A, 0), (C, 1)], [(F, 0), (Gs, 0), (C, 1)]],
    [[(Fs, 0), (As, 0), (Cs, 1)], [(Fs, 0), (A, 0), (Cs, 1)]],
    [[(G, 0), (B, 0), (D, 1)], [(G, 0), (As, 0), (D, 1)]],
    [[(Gs, 0), (C, 1), (Ds, 1)], [(Gs, 0), (B, 0), (Ds, 1)]],
    [[(A, 0), (Cs, 1), (E, 1)], [(A, 0), (C, 1), (E, 1)]],
    [[(As, 0), (D, 1), (F, 1)], [(As, 0), (Cs, 1), (F, 1)]],
    [[(B, 0), (Ds, 1), (Fs, 1)], [(B, 0), (D, 1), (Fs, 1)]],
];
