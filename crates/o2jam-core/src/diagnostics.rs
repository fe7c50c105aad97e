//! Recoverable conditions collected during a decode.
//!
//! Nothing in here aborts a decode. Each component records what it skipped,
//! dropped or defaulted and carries on; the caller gets the list back next
//! to the best-effort result.

use serde::Serialize;
use strum::IntoStaticStr;
use thiserror::Error;
use tracing::{info, warn};

use crate::chart::Difficulty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, IntoStaticStr)]
pub enum Severity {
    #[strum(serialize = "INFO")]
    Info,
    #[strum(serialize = "WARNING")]
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Error)]
pub enum Diagnostic {
    #[error("Audio container could not be decoded: {0}")]
    AudioUnavailable(String),

    #[error("Sample stream ended after {decoded} of {declared} declared samples")]
    TruncatedSampleStream { declared: u32, decoded: u32 },

    #[error("Unknown encryption flag {0}, remaining samples skipped")]
    UnknownEncryptionFlag(u32),

    #[error("Unknown codec code {codec} for sample {sample_id}")]
    UnknownCodec { codec: u16, sample_id: u32 },

    #[error("Sample {sample_id} is empty")]
    EmptySample { sample_id: u32 },

    #[error("Header strings are not valid {encoding}, decoded lossily")]
    LossyText { encoding: String },

    #[error("Duplicate difficulty {0}, will skip")]
    DuplicateDifficulty(Difficulty),

    #[error("{label} range {offset}..+{size} lies outside the {file_len}-byte file")]
    RegionOutOfBounds {
        label: String,
        offset: usize,
        size: usize,
        file_len: usize,
    },

    #[error("[{difficulty}] region ended after {decoded} of {declared} packages")]
    TruncatedRegion {
        difficulty: Difficulty,
        declared: u32,
        decoded: u32,
    },

    #[error("[{difficulty}] could not infer divisor, using {fallback}")]
    DivisorInferenceFailure { difficulty: Difficulty, fallback: u32 },

    #[error("[{difficulty}] failed to pair long note tail on lane {lane} at measure {measure}")]
    LnPairingFailure {
        difficulty: Difficulty,
        lane: u8,
        measure: f64,
    },

    #[error("[{difficulty}] unpaired long note head on lane {lane} at measure {measure} dropped")]
    PendingHeadAtEndOfStream {
        difficulty: Difficulty,
        lane: u8,
        measure: f64,
    },

    #[error("Degenerate tempo {bpm} at measure {measure}, beat length clamped")]
    DegenerateTempo { bpm: f32, measure: f64 },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::DuplicateDifficulty(_) => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

/// Ordered list of diagnostics for one decode call.
///
/// Every entry is logged through `tracing` as it is recorded.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Info => info!("{}", diagnostic),
            Severity::Warning => warn!("{}", diagnostic),
        }
        self.entries.push(diagnostic);
    }

    /// Appends entries already logged by another collector.
    pub fn append(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Number of warning-level entries.
    pub fn warnings(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
            .count()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_levels() {
        assert_eq!(
            Diagnostic::DuplicateDifficulty(Difficulty::Easy).severity(),
            Severity::Info
        );
        assert_eq!(
            Diagnostic::UnknownEncryptionFlag(3).severity(),
            Severity::Warning
        );
    }

    #[test]
    fn test_collect_and_count() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::DuplicateDifficulty(Difficulty::Normal));
        diagnostics.push(Diagnostic::EmptySample { sample_id: 4 });

        let mut other = Diagnostics::new();
        other.push(Diagnostic::UnknownEncryptionFlag(1));
        diagnostics.append(other);

        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics.warnings(), 2);
        assert_eq!(
            diagnostics.iter().last(),
            Some(&Diagnostic::UnknownEncryptionFlag(1))
        );
    }

    #[test]
    fn test_display_mentions_difficulty() {
        let d = Diagnostic::LnPairingFailure {
            difficulty: Difficulty::Hard,
            lane: 3,
            measure: 12.5,
        };
        assert_eq!(
            d.to_string(),
            "[Hard] failed to pair long note tail on lane 3 at measure 12.5"
        );
    }
}
