// Chordwalk Music Generator — entry point.
//
// Reads `chordwalk.json` from the working directory if present, otherwise
// generates the three built-in presets (8 bars each) to
// transitiontable1.mid .. transitiontable3.mid. Pieces without a configured
// seed get one from the system clock; it is logged so the run can be
// repeated by putting it in the config.
//
// Set RUST_LOG=debug to see the chord chosen for every bar.

use chordwalk_music::compose::Composer;
use chordwalk_music::config::{DEFAULT_CONFIG_PATH, GenerationConfig, PieceConfig};
use chordwalk_prng::MersenneRng;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run() {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = Path::new(DEFAULT_CONFIG_PATH);
    let config = GenerationConfig::load_or_default(config_path)?;
    let base_dir = config_path.parent().unwrap_or(Path::new("."));
    let composer = Composer::new(config.composer.clone())?;

    for piece in &config.pieces {
        generate_piece(&composer, piece, base_dir)?;
    }
    Ok(())
}

fn generate_piece(
    composer: &Composer,
    piece: &PieceConfig,
    base_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = piece.table.resolve(base_dir)?;
    let seed = piece.seed.unwrap_or_else(clock_seed);
    tracing::info!(output = %piece.output.display(), bars = piece.bars, seed, "composing");

    let mut rng = MersenneRng::seed_from_u64(seed);
    let mut composition = composer.compose(&table, piece.bars, &mut rng)?;

    let progression: Vec<String> = composition.bars.iter().map(|b| b.chord.to_string()).collect();
    tracing::info!(progression = %progression.join(" "), "chords");

    composition.file.write_to_path(&piece.output)?;
    Ok(())
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
