// Error types for the MIDI model, transition tables and configuration.
//
// Every failing append on `MidiFile` leaves the model untouched, so callers
// may report and continue. The composer propagates instead, so a finished
// composition never has silently missing notes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MidiError {
    #[error("midi: invalid track index {index} (file has {count} tracks)")]
    InvalidTrackIndex { index: usize, count: usize },

    #[error("midi: invalid chord identity {0:?}")]
    InvalidChordIdentity(String),

    #[error("midi: negative duration {0}")]
    NegativeDuration(i64),

    #[error("midi: delta time {0} does not fit a variable-length quantity")]
    DeltaTimeOverflow(i64),

    #[error("midi: channel {0} out of range (0-15)")]
    InvalidChannel(u8),

    #[error("midi: velocity {0} out of range (0-127)")]
    InvalidVelocity(u8),

    #[error("midi: {0} tracks exceed the header's 16-bit track count")]
    TooManyTracks(usize),

    #[error("midi: track body of {0} bytes exceeds the 32-bit length field")]
    TrackTooLong(usize),

    #[error("midi: io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("table: io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table: parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("table: unknown chord {0:?}")]
    UnknownChord(String),

    #[error("table: negative weight {weight} for {from} -> {to}")]
    NegativeWeight {
        from: String,
        to: String,
        weight: f64,
    },

    #[error("table: row {row} sums to {sum}, more than 1")]
    RowOverweight { row: String, sum: f64 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config: io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config: {0}")]
    Invalid(String),

    #[error("config: {0}")]
    Table(#[from] TableError),
}
