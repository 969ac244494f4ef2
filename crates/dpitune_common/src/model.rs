//! Probe and trial data model
//!
//! A trial is the aggregated probing result for one candidate setting.
//! Outcomes are classified purely by HTTP status code; transport-level
//! failures carry a sentinel code of 0.

use serde::{Deserialize, Serialize};

/// Sentinel status code for probes that failed before receiving a response
/// (DNS, connect, TLS handshake, timeout).
pub const CODE_TRANSPORT_FAILURE: u16 = 0;

/// Status codes that count as "reachable through the proxy". Anything the
/// origin answers with, including client errors and redirects, proves the
/// connection made it past the DPI filter.
pub const SUCCESS_CODES: [u16; 7] = [200, 404, 400, 405, 403, 302, 301];

/// Classification of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeStatus {
    Success,
    Failure,
}

/// Classify an HTTP status code (or the sentinel) into a probe status.
pub fn classify_code(code: u16) -> ProbeStatus {
    if SUCCESS_CODES.contains(&code) {
        ProbeStatus::Success
    } else {
        ProbeStatus::Failure
    }
}

/// Result of probing one domain through the proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub domain: String,
    pub status: ProbeStatus,
    /// HTTP status code, or [`CODE_TRANSPORT_FAILURE`] when no response
    /// was received.
    pub code: u16,
}

impl ProbeOutcome {
    pub fn new(domain: impl Into<String>, code: u16) -> Self {
        Self {
            domain: domain.into(),
            status: classify_code(code),
            code,
        }
    }

    /// Outcome for a probe that never produced a response.
    pub fn transport_failure(domain: impl Into<String>) -> Self {
        Self::new(domain, CODE_TRANSPORT_FAILURE)
    }

    pub fn is_success(&self) -> bool {
        self.status == ProbeStatus::Success
    }
}

/// Aggregated probing result for one candidate setting. Immutable once
/// built; counts are derived from the outcome set at construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    pub setting: String,
    pub outcomes: Vec<ProbeOutcome>,
    pub success_count: usize,
    pub failed_count: usize,
    pub total_count: usize,
    /// Integer percentage, truncated (floor of `success * 100 / total`).
    pub success_rate: u8,
}

impl Trial {
    pub fn from_outcomes(setting: impl Into<String>, outcomes: Vec<ProbeOutcome>) -> Self {
        let total_count = outcomes.len();
        let success_count = outcomes.iter().filter(|o| o.is_success()).count();
        let success_rate = if total_count > 0 {
            (success_count * 100 / total_count) as u8
        } else {
            0
        };
        Self {
            setting: setting.into(),
            outcomes,
            success_count,
            failed_count: total_count - success_count,
            total_count,
            success_rate,
        }
    }

    /// Domains whose probe did not succeed, in completion order.
    pub fn failed_domains(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.domain.as_str())
            .collect()
    }
}

/// A trial plus its position in the ranked top-K list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub trial: Trial,
}

/// State of the single shared proxy service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceState {
    Stopped,
    Starting,
    Active,
    Failed,
}
