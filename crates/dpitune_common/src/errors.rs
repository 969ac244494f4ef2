//! Fatal error taxonomy and exit codes
//!
//! Only four conditions terminate a run; everything else (a failed probe,
//! a setting whose service never came up) is absorbed into the trial data.
//! Each fatal condition maps to its own exit status so the installation
//! glue can tell them apart.

use thiserror::Error;

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors (I/O, spawn failures, ...)
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when the settings or domain input is empty
pub const EXIT_CONFIGURATION: i32 = 64;

/// Exit code when no candidate produced a usable trial
pub const EXIT_NO_VIABLE: i32 = 65;

/// Exit code when the operator's selection is invalid
pub const EXIT_SELECTION: i32 = 66;

/// Conditions that abort the run.
#[derive(Debug, Error)]
pub enum TuneError {
    #[error("candidate settings list is empty")]
    NoCandidates,

    #[error("domain list is empty")]
    NoDomains,

    #[error("no viable configuration: every candidate was skipped or scored 0")]
    NoViableConfiguration,

    #[error("invalid selection '{input}': expected an index in 0..{len}")]
    InvalidSelection { input: String, len: usize },
}

impl TuneError {
    /// Distinct non-zero exit status for each fatal condition.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoCandidates | Self::NoDomains => EXIT_CONFIGURATION,
            Self::NoViableConfiguration => EXIT_NO_VIABLE,
            Self::InvalidSelection { .. } => EXIT_SELECTION,
        }
    }
}
