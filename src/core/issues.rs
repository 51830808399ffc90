//! Diagnostics collected during a scan.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::fingerprint::{Fingerprint, FingerprintCap};

/// Standardized kinds of per-scan problems. None of them aborts a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionIssueKind {
    MissingEvidence,
    IoFailure,
    UnknownFingerprint,
    AmbiguousMatch,
    KnownCorruptedMatch,
}

impl fmt::Display for DetectionIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DetectionIssueKind::MissingEvidence => "missing_evidence",
            DetectionIssueKind::IoFailure => "io_failure",
            DetectionIssueKind::UnknownFingerprint => "unknown_fingerprint",
            DetectionIssueKind::AmbiguousMatch => "ambiguous_match",
            DetectionIssueKind::KnownCorruptedMatch => "known_corrupted_match",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionIssue {
    pub kind: DetectionIssueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub message: String,
}

impl DetectionIssue {
    pub fn new(kind: DetectionIssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            game_id: None,
            file: None,
            message: message.into(),
        }
    }

    pub fn with_game(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = Some(game_id.into());
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl fmt::Display for DetectionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(game) = &self.game_id {
            write!(f, " {}", game)?;
        }
        if let Some(file) = &self.file {
            write!(f, " ({})", file)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// A detection file whose content is not in the database, in a form a user
/// can paste into a bug report.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnknownFingerprintReport {
    pub file_name: String,
    pub path: PathBuf,
    pub size: u64,
    pub cap: FingerprintCap,
    pub fingerprint: Fingerprint,
}

impl fmt::Display for UnknownFingerprintReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown fingerprint {} for '{}' ({} bytes, first {} hashed). \
             Please report the details (language, platform, etc.) of this release.",
            self.fingerprint,
            self.file_name,
            self.size,
            self.cap.bytes()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_display() {
        let issue = DetectionIssue::new(DetectionIssueKind::IoFailure, "permission denied")
            .with_game("simon1")
            .with_file("GAMEPC");
        assert_eq!(
            issue.to_string(),
            "[io_failure] simon1 (GAMEPC): permission denied"
        );
    }

    #[test]
    fn unknown_report_mentions_digest_and_name() {
        let report = UnknownFingerprintReport {
            file_name: "00.LFL".into(),
            path: PathBuf::from("/games/mm/00.LFL"),
            size: 1988,
            cap: FingerprintCap::WHOLE_FILE_MIB,
            fingerprint: Fingerprint::from_bytes([0xab; 16]),
        };
        let line = report.to_string();
        assert!(line.contains("abababab"));
        assert!(line.contains("'00.LFL'"));
        assert!(line.contains("Please report"));
    }
}
