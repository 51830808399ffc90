//! Core data types for asset identification.
//!
//! Plain, serializable values shared by the detection pipeline and its
//! callers: platforms and languages, fingerprints, candidate signatures,
//! match results and diagnostics.

pub mod fingerprint;
pub mod issues;
pub mod platform;
pub mod result;
pub mod signature;

pub use fingerprint::{Fingerprint, FingerprintCap};
pub use issues::{DetectionIssue, DetectionIssueKind, UnknownFingerprintReport};
pub use platform::{Language, Platform};
pub use result::{Confidence, ContainerKind, MatchResult, MatchedFile, ResolvedTarget};
pub use signature::{
    CandidateSignature, ContainerHint, FeatureFlags, FileRequirement, FileRole, GenerationRule,
};
