//! smfkit - Spring map and tile archive toolkit
//!
//! Reads, writes and converts the binary map container (SMF) and tile
//! archive (SMT) formats used by the Spring RTS engine.
//!
//! # Modules
//!
//! - [`smf`]: the map container and its sections
//! - [`smt`]: append-only DXT1 tile archives
//! - [`dxt`]: DXT1 block, tile and minimap coding
//! - [`dedup`]: near-duplicate tile detection
//! - [`tilemap`], [`tilecache`]: tile index grids and global tile lookup
//! - [`pipeline`]: image → map compilation and the reverse
//!
//! # Example
//!
//! ```no_run
//! use smfkit::pipeline::{CompileJob, DecompileJob};
//!
//! CompileJob::new("island.smf", 8, 8)
//!     .with_height("height.png")
//!     .with_diffuse("diffuse.png")
//!     .run()?;
//! DecompileJob::new("island.smf", "island_out").with_diffuse(true).run()?;
//! # Ok::<(), smfkit::pipeline::PipelineError>(())
//! ```

pub mod binary;
pub mod config;
pub mod dedup;
pub mod dxt;
pub mod filemap;
pub mod logging;
pub mod pipeline;
pub mod smf;
pub mod smt;
pub mod tilecache;
pub mod tilemap;

/// Version of the smfkit library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
