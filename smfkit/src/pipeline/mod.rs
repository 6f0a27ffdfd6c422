//! Build and reverse pipelines.
//!
//! ```text
//! compile:   images ─┬─ rasters ──────────────────────────────┐
//!                    └─ diffuse → tiles → dedup → DXT1 → SMT ─┴→ SMF
//! decompile: SMF → rasters, tile map, features (+ SMT → stitched diffuse)
//! ```
//!
//! Each job owns its [`BuildContext`]; no state is shared between runs.

mod builder;
mod compile;
mod context;
mod decompile;
mod error;

pub use builder::{BuildProgress, BuildProgressCallback, TileArchiveBuilder};
pub use compile::{CompileJob, CompileReport, TileInput};
pub use context::{BuildContext, BuildStats};
pub use decompile::{DecompileJob, DecompileReport};
pub use error::PipelineError;
