//! Scripted probe for testing.
//!
//! Replays a fixed sequence of responses, one per call. Once the script is
//! exhausted the last response repeats.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::error::{AuthError, ProbeError};
use crate::traits::{ProbeResult, TriggerProbe};

/// One scripted probe outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// Trigger absent.
    Missing,
    /// Backend reported the path as not found.
    NotFound(String),
    /// Trigger present with the given mtime.
    Present(DateTime<Utc>),
    /// Trigger present, no mtime available.
    PresentWithoutMtime,
    /// Transport failure with the given message.
    TransportError(String),
    /// Server rejected the credentials.
    AuthRejected(String),
}

impl MockResponse {
    fn to_result(&self) -> Result<ProbeResult, ProbeError> {
        match self {
            MockResponse::Missing => Ok(ProbeResult::missing()),
            MockResponse::NotFound(path) => Err(ProbeError::NotFound { path: path.clone() }),
            MockResponse::Present(at) => Ok(ProbeResult::present(*at)),
            MockResponse::PresentWithoutMtime => Ok(ProbeResult::present_without_mtime()),
            MockResponse::TransportError(message) => Err(ProbeError::Transport(message.clone())),
            MockResponse::AuthRejected(message) => {
                Err(ProbeError::Auth(AuthError::Rejected(message.clone())))
            }
        }
    }
}

/// Probe that replays scripted responses and counts calls.
#[derive(Debug, Clone)]
pub struct ScriptedProbe {
    script: Arc<Mutex<VecDeque<MockResponse>>>,
    last: Arc<Mutex<MockResponse>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProbe {
    pub fn new(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        Self {
            script: Arc::new(Mutex::new(responses.into_iter().collect())),
            last: Arc::new(Mutex::new(MockResponse::Missing)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Probe that always answers with `response`.
    pub fn always(response: MockResponse) -> Self {
        Self::new([response])
    }

    /// Number of times `probe` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TriggerProbe for ScriptedProbe {
    fn probe(&self) -> Result<ProbeResult, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = script.pop_front() {
            *last = next;
        }
        last.to_result()
    }

    fn describe(&self) -> String {
        "mock://trigger.txt".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_then_repeats_last() {
        let probe = ScriptedProbe::new([
            MockResponse::TransportError("reset".to_string()),
            MockResponse::PresentWithoutMtime,
        ]);

        assert!(probe.probe().is_err());
        assert!(probe.probe().unwrap().exists);
        assert!(probe.probe().unwrap().exists);
        assert_eq!(probe.calls(), 3);
    }

    #[test]
    fn test_empty_script_is_missing() {
        let probe = ScriptedProbe::new([]);
        assert!(!probe.probe().unwrap().exists);
    }

    #[test]
    fn test_clones_share_call_count() {
        let probe = ScriptedProbe::always(MockResponse::Missing);
        let clone = probe.clone();
        clone.probe().unwrap();
        assert_eq!(probe.calls(), 1);
    }
}
