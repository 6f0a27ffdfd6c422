//! Compile command - build a map container from source images.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use smfkit::pipeline::{BuildProgress, CompileJob};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the compile command.
#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Output map file (.smf); the tile archive is written beside it
    #[arg(short, long)]
    pub output: PathBuf,

    /// Map width in map units (64 squares each)
    #[arg(long)]
    pub width: u32,

    /// Map length in map units (64 squares each)
    #[arg(long)]
    pub length: u32,

    /// Height of the lowest terrain value
    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    pub min_height: f32,

    /// Height of the highest terrain value
    #[arg(long, default_value_t = 256.0, allow_negative_numbers = true)]
    pub max_height: f32,

    /// Height map image (16-bit gray preferred)
    #[arg(long)]
    pub height: Option<PathBuf>,

    /// Terrain type image
    #[arg(long)]
    pub type_map: Option<PathBuf>,

    /// Metal distribution image
    #[arg(long)]
    pub metal: Option<PathBuf>,

    /// Grass distribution image; adds the vegetation extension
    #[arg(long)]
    pub grass: Option<PathBuf>,

    /// Minimap image (resized to 1024×1024)
    #[arg(long)]
    pub minimap: Option<PathBuf>,

    /// Diffuse texture to cut into tiles
    #[arg(long, conflicts_with = "tilemap")]
    pub diffuse: Option<PathBuf>,

    /// Feature placement CSV (name,x,y,z[,rotation[,scale]])
    #[arg(long)]
    pub features: Option<PathBuf>,

    /// Existing tile archive: referenced with --tilemap, or reused by --diffuse
    #[arg(long)]
    pub smt: Option<PathBuf>,

    /// Tile index CSV for --smt
    #[arg(long, requires = "smt")]
    pub tilemap: Option<PathBuf>,

    /// Deduplication aggressiveness (0 disables matching)
    #[arg(long)]
    pub compression: Option<f64>,

    /// Store every tile, even exact repeats
    #[arg(long)]
    pub no_dedup: bool,

    /// Replace existing output files
    #[arg(long)]
    pub overwrite: bool,
}

/// Run the compile command.
pub fn run(runner: &CliRunner, args: CompileArgs) -> Result<(), CliError> {
    runner.log_startup("compile");

    if args.width == 0 || args.length == 0 {
        return Err(CliError::InvalidArgument(
            "--width and --length must be at least 1".to_string(),
        ));
    }

    let mut config = runner.build_config();
    if let Some(factor) = args.compression {
        if !(factor >= 0.0) {
            return Err(CliError::InvalidArgument(format!(
                "--compression must be a non-negative number, got {}",
                factor
            )));
        }
        config = config.with_compression_factor(factor);
    }
    if args.no_dedup {
        config = config.with_dedup(false);
    }

    let mut job = CompileJob::new(&args.output, args.width, args.length)
        .with_height_range(args.min_height, args.max_height)
        .with_config(config)
        .with_overwrite(args.overwrite);

    if let Some(p) = args.height {
        job = job.with_height(p);
    }
    if let Some(p) = args.type_map {
        job = job.with_type_map(p);
    }
    if let Some(p) = args.metal {
        job = job.with_metal(p);
    }
    if let Some(p) = args.grass {
        job = job.with_grass(p);
    }
    if let Some(p) = args.minimap {
        job = job.with_minimap(p);
    }
    if let Some(p) = args.features {
        job = job.with_features(p);
    }
    let tiling = args.diffuse.is_some();
    match (args.diffuse, args.smt, args.tilemap) {
        (Some(diffuse), shared, _) => {
            println!("Tile archive: {}", job.archive_path().display());
            job = job
                .with_diffuse(diffuse)
                .with_progress(Arc::new(print_progress));
            if let Some(smt) = shared {
                println!("Reusing tiles from: {}", smt.display());
                job = job.with_shared_tiles(smt);
            }
        }
        (None, Some(smt), Some(csv)) => job = job.with_existing_tiles(smt, csv),
        (None, Some(_), None) => {
            return Err(CliError::InvalidArgument(
                "--smt needs either --tilemap or --diffuse".to_string(),
            ));
        }
        _ => {}
    }

    println!("Compiling {} ({}×{} units)...", args.output.display(), args.width, args.length);
    let start = Instant::now();
    let report = job.run()?;
    if tiling {
        eprintln!();
    }

    println!(
        "✓ Wrote {} in {:.2}s",
        report.smf.display(),
        start.elapsed().as_secs_f64()
    );
    if let Some(shared) = &report.shared_smt {
        println!("  Shared:   {}", shared.display());
    }
    if let Some(smt) = &report.smt {
        println!("  Archive:  {}", smt.display());
    }
    if report.tile_count > 0 {
        println!("  Indexed:  {} tiles", report.tile_count);
    }
    if let Some(stats) = report.stats {
        println!(
            "  Tiles:    {} total, {} unique, {} reused ({:.1}%)",
            stats.tiles_total,
            stats.tiles_unique,
            stats.tiles_reused,
            stats.reuse_ratio() * 100.0
        );
    }
    println!("  Features: {}", report.features);

    Ok(())
}

fn print_progress(progress: BuildProgress) {
    let mut stderr = std::io::stderr();
    let _ = write!(
        stderr,
        "\rEncoding tiles: row {}/{} ({} unique)",
        progress.rows_done, progress.rows_total, progress.unique
    );
    let _ = stderr.flush();
}
