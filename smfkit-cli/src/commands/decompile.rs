//! Decompile command - export a map container to images and CSV.

use std::path::PathBuf;

use clap::Args;
use smfkit::pipeline::DecompileJob;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the decompile command.
#[derive(Debug, Args)]
pub struct DecompileArgs {
    /// Map file to export
    pub input: PathBuf,

    /// Output directory (created if missing)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Also stitch the full diffuse texture from the tile archives
    #[arg(long)]
    pub diffuse: bool,
}

/// Run the decompile command.
pub fn run(runner: &CliRunner, args: DecompileArgs) -> Result<(), CliError> {
    runner.log_startup("decompile");

    println!("Decompiling {} into {}...", args.input.display(), args.output.display());
    let report = DecompileJob::new(&args.input, &args.output)
        .with_diffuse(args.diffuse)
        .run()?;

    for file in &report.files {
        println!("  {}", file.display());
    }
    if report.pointer_mismatches > 0 {
        println!(
            "  Note: {} section pointer(s) did not match the computed layout",
            report.pointer_mismatches
        );
    }
    println!("✓ Exported {} files", report.files.len());

    Ok(())
}
