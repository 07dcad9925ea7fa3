// First-order Markov chain over chords.
//
// A `TransitionTable` is a 24×24 weight matrix addressed by chord index (see
// chord.rs): row = current chord, column = next chord. Each row's weights are
// non-negative and sum to at most 1. A row may sum to less than 1; when the
// walk's random value lands in that unweighted remainder no column is chosen
// and the current chord repeats. An all-zero row therefore holds the chord.
//
// Tables come from the three built-in presets or from JSON:
//
//   { "rows": { "C": { "Dm": 0.25, "F": 0.25, ... }, "Dm": { ... } } }
//
// Loading validates every row, so a table that reaches the composer is
// always well formed.

use crate::chord::{CHORD_COUNT, Chord};
use crate::error::TableError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Slack allowed when checking that a row sums to at most 1, so that rows
/// like three thirds pass.
const ROW_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionTable {
    weights: [[f64; CHORD_COUNT]; CHORD_COUNT],
}

/// Serialized form: chord name -> (chord name -> weight).
#[derive(Debug, Default, Serialize, Deserialize)]
struct TableFile {
    rows: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl TransitionTable {
    /// All weights zero: every chord holds.
    pub fn empty() -> Self {
        TransitionTable {
            weights: [[0.0; CHORD_COUNT]; CHORD_COUNT],
        }
    }

    pub fn set(&mut self, from: Chord, to: Chord, weight: f64) {
        self.weights[from.index()][to.index()] = weight;
    }

    pub fn weight(&self, from: Chord, to: Chord) -> f64 {
        self.weights[from.index()][to.index()]
    }

    pub fn row(&self, from: Chord) -> &[f64; CHORD_COUNT] {
        &self.weights[from.index()]
    }

    /// Pick the successor of `current` for a random value `r` in [0, 1).
    ///
    /// Walks the row in index order; the first chord whose cumulative weight
    /// exceeds `r` wins. If none does, `current` repeats.
    pub fn next_chord(&self, current: Chord, r: f64) -> Chord {
        let mut cumulative = 0.0;
        for (index, &weight) in self.row(current).iter().enumerate() {
            cumulative += weight;
            if cumulative > r {
                // Index is below CHORD_COUNT by construction of the row.
                return Chord::from_index(index).unwrap_or(current);
            }
        }
        tracing::trace!(%current, r, cumulative, "transition fell through, holding chord");
        current
    }

    /// Check every row for negative weights and sums above 1.
    pub fn validate(&self) -> Result<(), TableError> {
        for from in Chord::all() {
            let mut sum = 0.0;
            for to in Chord::all() {
                let weight = self.weight(from, to);
                if weight.is_nan() || weight < 0.0 {
                    return Err(TableError::NegativeWeight {
                        from: from.to_string(),
                        to: to.to_string(),
                        weight,
                    });
                }
                sum += weight;
            }
            if sum > 1.0 + ROW_SUM_TOLERANCE {
                return Err(TableError::RowOverweight {
                    row: from.to_string(),
                    sum,
                });
            }
        }
        Ok(())
    }

    /// Parse and validate a table from JSON text.
    pub fn from_json(text: &str) -> Result<Self, TableError> {
        let file: TableFile = serde_json::from_str(text)?;
        let mut table = Self::empty();
        for (from_name, row) in &file.rows {
            let from = parse_chord(from_name)?;
            for (to_name, &weight) in row {
                table.set(from, parse_chord(to_name)?, weight);
            }
        }
        table.validate()?;
        Ok(table)
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Serialize the non-zero weights to JSON.
    pub fn to_json(&self) -> Result<String, TableError> {
        let mut file = TableFile::default();
        for from in Chord::all() {
            let row: BTreeMap<String, f64> = Chord::all()
                .filter(|&to| self.weight(from, to) != 0.0)
                .map(|to| (to.to_string(), self.weight(from, to)))
                .collect();
            if !row.is_empty() {
                file.rows.insert(from.to_string(), row);
            }
        }
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Build one of the built-in tables.
    pub fn preset(preset: Preset) -> Self {
        let rows: &[(Chord, &[(Chord, f64)])] = match preset {
            Preset::Uniform => &[
                (C, &[(DM, 0.25), (F, 0.25), (G, 0.25), (AM, 0.25)]),
                (DM, &[(G, 0.5), (AM, 0.5)]),
                (F, &[(F, 1.0 / 3.0), (DM, 1.0 / 3.0), (C, 1.0 / 3.0)]),
                (G, &[(C, 0.5), (AM, 0.5)]),
                (AM, &[(DM, 0.5), (F, 0.5)]),
            ],
            Preset::Cadential => &[
                (C, &[(DM, 0.25), (F, 0.25), (G, 0.25), (AM, 0.25)]),
                (DM, &[(G, 1.0)]),
                (F, &[(F, 0.1), (DM, 0.4), (C, 0.5)]),
                (G, &[(AM, 1.0)]),
                (AM, &[(F, 1.0)]),
            ],
            Preset::MinorLeaning => &[
                (C, &[(DM, 0.4), (F, 0.1), (G, 0.1), (AM, 0.4)]),
                (DM, &[(G, 0.3), (AM, 0.7)]),
                (F, &[(F, 0.1), (DM, 0.6), (C, 0.3)]),
                (G, &[(C, 0.3), (AM, 0.7)]),
                (AM, &[(DM, 0.7), (F, 0.3)]),
            ],
        };
        let mut table = Self::empty();
        for &(from, row) in rows {
            for &(to, weight) in row {
                table.set(from, to, weight);
            }
        }
        table
    }
}

const C: Chord = Chord::C;
const DM: Chord = Chord::D_MINOR;
const F: Chord = Chord::F;
const G: Chord = Chord::G;
const AM: Chord = Chord::A_MINOR;

/// The built-in transition tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Every allowed move equally likely.
    Uniform,
    /// Locks into Dm → G → Am → F once any of them is reached; only C and F
    /// branch.
    Cadential,
    /// Moves toward Dm and Am about twice as often.
    MinorLeaning,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Uniform, Preset::Cadential, Preset::MinorLeaning];
}

fn parse_chord(name: &str) -> Result<Chord, TableError> {
    name.parse()
        .map_err(|_| TableError::UnknownChord(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid_and_rows_sum_to_one() {
        for preset in Preset::ALL {
            let table = TransitionTable::preset(preset);
            table.validate().unwrap();
            for from in [C, DM, F, G, AM] {
                let sum: f64 = table.row(from).iter().sum();
                assert!((sum - 1.0).abs() < 1e-9, "{preset:?} row {from} sums to {sum}");
            }
        }
    }

    #[test]
    fn presets_only_reach_reference_vocabulary() {
        let vocabulary: Vec<usize> = [C, DM, F, G, AM].iter().map(|c| c.index()).collect();
        for preset in Preset::ALL {
            let table = TransitionTable::preset(preset);
            for from in [C, DM, F, G, AM] {
                for (to, &w) in table.row(from).iter().enumerate() {
                    if w > 0.0 {
                        assert!(vocabulary.contains(&to), "{preset:?}: {from} -> {to}");
                    }
                }
            }
        }
    }

    #[test]
    fn next_chord_walks_in_index_order() {
        let table = TransitionTable::preset(Preset::Uniform);
        // Row C in index order: Dm(5), F(10), G(14), Am(19).
        assert_eq!(table.next_chord(C, 0.0), DM);
        assert_eq!(table.next_chord(C, 0.24), DM);
        assert_eq!(table.next_chord(C, 0.25), F);
        assert_eq!(table.next_chord(C, 0.6), G);
        assert_eq!(table.next_chord(C, 0.9), AM);
        assert_eq!(table.next_chord(C, 0.999_999), AM);
    }

    #[test]
    fn deterministic_rows() {
        let table = TransitionTable::preset(Preset::Cadential);
        for r in [0.0, 0.5, 0.99] {
            assert_eq!(table.next_chord(DM, r), G);
            assert_eq!(table.next_chord(G, r), AM);
            assert_eq!(table.next_chord(AM, r), F);
        }
    }

    #[test]
    fn remainder_holds_current_chord() {
        let mut table = TransitionTable::empty();
        table.set(G, C, 0.5);
        assert_eq!(table.next_chord(G, 0.4), C);
        assert_eq!(table.next_chord(G, 0.5), G);
        assert_eq!(table.next_chord(G, 0.99), G);
        // An all-zero row always holds.
        assert_eq!(table.next_chord(AM, 0.0), AM);
    }

    #[test]
    fn validate_rejects_overweight_row() {
        let mut table = TransitionTable::empty();
        table.set(C, G, 0.7);
        table.set(C, F, 0.4);
        assert!(matches!(
            table.validate(),
            Err(TableError::RowOverweight { ref row, .. }) if row == "C"
        ));
    }

    #[test]
    fn validate_rejects_negative_and_nan_weights() {
        let mut table = TransitionTable::empty();
        table.set(F, C, -0.1);
        assert!(matches!(table.validate(), Err(TableError::NegativeWeight { .. })));

        let mut table = TransitionTable::empty();
        table.set(F, C, f64::NAN);
        assert!(matches!(table.validate(), Err(TableError::NegativeWeight { .. })));
    }

    #[test]
    fn json_round_trip_of_preset() {
        let table = TransitionTable::preset(Preset::MinorLeaning);
        let json = table.to_json().unwrap();
        assert_eq!(TransitionTable::from_json(&json).unwrap(), table);
    }

    #[test]
    fn from_json_by_chord_name() {
        let table = TransitionTable::from_json(
            r#"{ "rows": { "C": { "G": 0.5, "Am": 0.5 }, "G#m": { "C#": 1.0 } } }"#,
        )
        .unwrap();
        assert_eq!(table.weight(C, G), 0.5);
        assert_eq!(table.weight(C, AM), 0.5);
        assert_eq!(
            table.weight("G#m".parse().unwrap(), "C#".parse().unwrap()),
            1.0
        );
    }

    #[test]
    fn from_json_errors() {
        assert!(matches!(
            TransitionTable::from_json(r#"{ "rows": { "H": { "C": 1.0 } } }"#),
            Err(TableError::UnknownChord(ref name)) if name == "H"
        ));
        assert!(matches!(
            TransitionTable::from_json(r#"{ "rows": { "C": { "G": 0.9, "F": 0.9 } } }"#),
            Err(TableError::RowOverweight { .. })
        ));
        assert!(matches!(
            TransitionTable::from_json("not json"),
            Err(TableError::Parse(_))
        ));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err =
            TransitionTable::load(Path::new("/nonexistent/chordwalk/table.json")).unwrap_err();
        assert!(matches!(err, TableError::Io(_)));
    }

    #[test]
    fn preset_names_in_json() {
        assert_eq!(serde_json::to_string(&Preset::MinorLeaning).unwrap(), r#""minor_leaning""#);
        let p: Preset = serde_json::from_str(r#""cadential""#).unwrap();
        assert_eq!(p, Preset::Cadential);
    }
}
