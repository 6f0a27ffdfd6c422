//! Tile archive CLI commands.
//!
//! Provides `smt create`, `smt append`, `smt extract` and `smt repair`.

use std::path::PathBuf;

use clap::Subcommand;
use smfkit::smt::SmtArchive;

use crate::error::CliError;
use crate::runner::{open_image, save_image, CliRunner};

/// Smt subcommands.
#[derive(Debug, Subcommand)]
pub enum SmtCommands {
    /// Create an empty tile archive
    Create {
        /// Archive path
        archive: PathBuf,

        /// Replace an existing file
        #[arg(long)]
        overwrite: bool,
    },

    /// Encode images and append them as tiles
    ///
    /// Each image must be exactly one tile (32×32 pixels).
    Append {
        /// Archive path
        archive: PathBuf,

        /// Tile images, appended in order
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Decode one tile to an image
    Extract {
        /// Archive path
        archive: PathBuf,

        /// Tile index
        index: u32,

        /// Output image path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Rewrite the tile count to match the file length
    Repair {
        /// Archive path
        archive: PathBuf,
    },
}

/// Run an smt subcommand.
pub fn run(runner: &CliRunner, command: SmtCommands) -> Result<(), CliError> {
    runner.log_startup("smt");

    match command {
        SmtCommands::Create { archive, overwrite } => run_create(archive, overwrite),
        SmtCommands::Append { archive, images } => run_append(archive, &images),
        SmtCommands::Extract {
            archive,
            index,
            output,
        } => run_extract(archive, index, output),
        SmtCommands::Repair { archive } => run_repair(archive),
    }
}

fn run_create(path: PathBuf, overwrite: bool) -> Result<(), CliError> {
    SmtArchive::create(&path, overwrite)?;
    println!("✓ Created {}", path.display());
    Ok(())
}

fn run_append(path: PathBuf, images: &[PathBuf]) -> Result<(), CliError> {
    let mut archive = SmtArchive::open_rw(&path)?;
    let first = archive.tile_count();

    for image_path in images {
        let tile = open_image(image_path)?.to_rgba8();
        let index = archive.append_tile(&tile)?;
        println!("  {} → tile {}", image_path.display(), index);
    }

    println!(
        "✓ Appended {} tiles to {} (indices {}..{})",
        images.len(),
        path.display(),
        first,
        archive.tile_count()
    );
    Ok(())
}

fn run_extract(path: PathBuf, index: u32, output: PathBuf) -> Result<(), CliError> {
    let mut archive = SmtArchive::open(&path)?;
    let tile = archive.get_tile(index)?;
    save_image(&tile, &output)?;
    println!("✓ Extracted tile {} to {}", index, output.display());
    Ok(())
}

fn run_repair(path: PathBuf) -> Result<(), CliError> {
    let mut archive = SmtArchive::open_rw(&path)?;
    let report = archive.repair()?;

    if report.old_count == report.new_count && report.truncated_bytes == 0 {
        println!("{} is consistent ({} tiles)", path.display(), report.new_count);
    } else {
        println!(
            "✓ Repaired {}: tile count {} → {}",
            path.display(),
            report.old_count,
            report.new_count
        );
        if report.truncated_bytes > 0 {
            println!("  Removed {} bytes of a partial tile", report.truncated_bytes);
        }
    }
    Ok(())
}
