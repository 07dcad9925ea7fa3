// Chordwalk Music Generator
//
// Composes short pieces by walking a first-order Markov chain over chords
// and writes them as Standard MIDI Files. Each bar holds one chord spread
// over three tracks, with a melody on a fourth track drawn from the chord's
// tones in randomly chosen durations that exactly fill the bar.
//
// Architecture:
// - chord.rs: Pitch classes, notes, chord identities and the voicing table
// - markov.rs: 24×24 chord transition tables, the next-chord walk, presets
//   and JSON loading
// - compose.rs: The bar-by-bar composition loop and its settings
// - midi.rs: In-memory SMF model (file, tracks, note events) and serializer
// - encode.rs: Big-endian and variable-length field encoders
// - config.rs: JSON configuration for a batch of pieces
// - error.rs: Error types
//
// The generator is deterministic given a seed: all randomness flows through
// one `chordwalk_prng::RandomSource` passed into the composer.

pub mod chord;
pub mod compose;
pub mod config;
pub mod encode;
pub mod error;
pub mod markov;
pub mod midi;
