//! Content-based identification of game data directories.
//!
//! Given a directory copied from install media, [`detection::api::Resolver`]
//! works out which known release the files belong to. Identification is by
//! bounded-prefix content fingerprints where the release is catalogued, and by
//! filename families plus secondary evidence where it is not.

pub mod catalog;
pub mod core;
pub mod detection;
pub mod error;
pub mod hashing;
pub mod logging;

pub use crate::catalog::SignatureDatabase;
pub use crate::detection::api::{Resolver, ScanReport};
pub use crate::error::{ResolverError, Result};
