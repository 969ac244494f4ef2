//! Trial ranking and severity banding
//!
//! Trials are ordered by success rate (higher first); ties break toward the
//! shorter setting string, on the theory that fewer desync flags means less
//! collateral breakage. Only the top entries are presented.

use crate::errors::TuneError;
use crate::model::{RankedEntry, Trial};

/// Maximum number of entries surfaced to the operator.
pub const TOP_K: usize = 10;

/// Severity band for a ranked entry, keyed off its success rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn for_rate(rate: u8) -> Self {
        if rate >= 80 {
            Self::High
        } else if rate >= 50 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Rank trials and truncate to the top ten.
///
/// Returns [`TuneError::NoViableConfiguration`] when no trial exists or
/// every trial scored zero - in either case there is nothing worth
/// installing and the run must stop before the selection prompt.
pub fn rank(trials: Vec<Trial>) -> Result<Vec<RankedEntry>, TuneError> {
    if trials.is_empty() {
        return Err(TuneError::NoViableConfiguration);
    }
    if trials.iter().all(|t| t.success_rate == 0) {
        return Err(TuneError::NoViableConfiguration);
    }

    let mut trials = trials;
    // sort_by is stable, so equal (rate, len) keys keep trial order
    trials.sort_by(|a, b| {
        b.success_rate
            .cmp(&a.success_rate)
            .then(a.setting.len().cmp(&b.setting.len()))
    });

    Ok(trials
        .into_iter()
        .take(TOP_K)
        .enumerate()
        .map(|(rank, trial)| RankedEntry { rank, trial })
        .collect())
}
