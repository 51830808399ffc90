//! Detection pipeline for game data directories.
//!
//! This module walks a directory, probes catalogued signatures against the
//! files it finds and reduces what matched to an ordered result list.

pub mod api;
pub mod collector;
pub mod config;
pub mod containers;
pub mod evidence;
pub mod fs;
pub mod heuristics;
pub mod index;
pub mod matcher;
pub mod naming;
pub mod patterns;
pub mod reduce;

pub use api::{Resolver, ScanReport, ScanStats};
pub use config::ResolverConfig;
pub use fs::{DiskNode, FsNode, MemoryTree};
