//! smfkit CLI - Command-line interface
//!
//! Compiles images into Spring map containers and tile archives, and
//! exports them back.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::compile::CompileArgs;
use commands::decompile::DecompileArgs;
use commands::info::InfoArgs;
use commands::smt::SmtCommands;
use commands::tilemap::TilemapArgs;
use error::CliError;
use runner::{CliRunner, GlobalOptions};

#[derive(Parser)]
#[command(name = "smfkit")]
#[command(version = smfkit::VERSION)]
#[command(about = "Compile and decompile Spring map files", long_about = None)]
struct Cli {
    /// Config file (default: ~/.smfkit/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a map from height, type, metal, minimap and diffuse images
    Compile(CompileArgs),

    /// Export a map's sections to images and CSV files
    Decompile(DecompileArgs),

    /// Show a summary of a map or tile archive
    Info(InfoArgs),

    /// Tile archive maintenance
    #[command(subcommand)]
    Smt(SmtCommands),

    /// Export a map's tile index grid as CSV
    Tilemap(TilemapArgs),
}

fn main() {
    let cli = Cli::parse();

    let options = GlobalOptions {
        config: cli.config,
        log_file: cli.log_file,
        verbose: cli.verbose,
    };

    if let Err(e) = run(&options, cli.command) {
        e.exit();
    }
}

fn run(options: &GlobalOptions, command: Commands) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;

    match command {
        Commands::Compile(args) => commands::compile::run(&runner, args),
        Commands::Decompile(args) => commands::decompile::run(&runner, args),
        Commands::Info(args) => commands::info::run(&runner, args),
        Commands::Smt(command) => commands::smt::run(&runner, command),
        Commands::Tilemap(args) => commands::tilemap::run(&runner, args),
    }
}
