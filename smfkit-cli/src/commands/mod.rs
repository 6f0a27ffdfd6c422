//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`compile`] - Build a map container (and tile archive) from images
//! - [`decompile`] - Export a map container back to images and CSV
//! - [`info`] - Summarize a map container or tile archive
//! - [`smt`] - Tile archive maintenance (create, append, extract, repair)
//! - [`tilemap`] - Export a map's tile index grid as CSV

pub mod compile;
pub mod decompile;
pub mod info;
pub mod smt;
pub mod tilemap;
