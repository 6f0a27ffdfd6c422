//! Info command - summarize a map container or tile archive.

use std::path::{Path, PathBuf};

use clap::Args;
use smfkit::smf::{is_smf, SmfContainer};
use smfkit::smt::{is_smt, SizeCheck, SmtArchive};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the info command.
#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Map (.smf) or tile archive (.smt) to inspect
    pub file: PathBuf,
}

/// Run the info command.
pub fn run(runner: &CliRunner, args: InfoArgs) -> Result<(), CliError> {
    runner.log_startup("info");

    if is_smf(&args.file) {
        smf_info(&args.file)
    } else if is_smt(&args.file) {
        smt_info(&args.file)
    } else {
        Err(CliError::InvalidArgument(format!(
            "'{}' is neither a map container nor a tile archive",
            args.file.display()
        )))
    }
}

fn smf_info(path: &Path) -> Result<(), CliError> {
    let mut map = SmfContainer::open(path)?;
    let report = map.read()?;

    println!("{}", map.info());

    if !report.is_clean() {
        println!();
        println!("Layout problems:");
        for m in &report.pointer_mismatches {
            println!(
                "  {} declared at {}, expected {}",
                m.section, m.declared, m.derived
            );
        }
        for overlap in &report.overlaps {
            println!("  {}", overlap);
        }
    }
    Ok(())
}

fn smt_info(path: &Path) -> Result<(), CliError> {
    let archive = SmtArchive::open(path)?;
    let header = archive.header();

    println!("Tile archive: {}", path.display());
    println!("  Version:     {}", header.version);
    println!("  Tiles:       {}", header.tile_count);
    println!("  Tile size:   {}×{}", header.tile_size, header.tile_size);
    println!("  Tile bytes:  {}", archive.tile_bytes());

    if let SizeCheck::Mismatch { declared, actual } = archive.size_check() {
        println!();
        println!(
            "Size mismatch: header implies {} payload bytes, file holds {}",
            declared, actual
        );
        println!("Run 'smfkit smt repair {}' to fix the tile count.", path.display());
    }
    Ok(())
}
