//! Tilemap command - export a map's tile index grid.

use std::path::PathBuf;

use clap::Args;
use smfkit::smf::SmfContainer;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the tilemap command.
#[derive(Debug, Args)]
pub struct TilemapArgs {
    /// Map file to read
    pub input: PathBuf,

    /// Output CSV path
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Run the tilemap command.
pub fn run(runner: &CliRunner, args: TilemapArgs) -> Result<(), CliError> {
    runner.log_startup("tilemap");

    let mut map = SmfContainer::open(&args.input)?;
    map.read()?;

    let tilemap = map.tilemap();
    tilemap.save_csv(&args.output)?;

    println!(
        "✓ Wrote {}×{} tile map to {}",
        tilemap.width(),
        tilemap.height(),
        args.output.display()
    );
    Ok(())
}
