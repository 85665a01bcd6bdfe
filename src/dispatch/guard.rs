use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::flow::FlowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InFlight,
    Finished,
}

/// Server-side record of wizard submissions by nonce. The session cookie is
/// held by the client, so a replayed cookie would otherwise dispatch again.
#[derive(Clone)]
pub struct SubmitGuard {
    retain: Duration,
    entries: Arc<Mutex<HashMap<String, (State, Instant)>>>,
}

impl Default for SubmitGuard {
    fn default() -> Self {
        SubmitGuard::new(Duration::from_secs(24 * 60 * 60))
    }
}

impl SubmitGuard {
    /// Entries older than `retain` are forgotten.
    pub fn new(retain: Duration) -> Self {
        Self {
            retain,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Claim `nonce` for one dispatch. Fails while another dispatch for it is
    /// running or after one has finished. Dropping the claim without calling
    /// [`Claim::finish`] releases it.
    pub fn begin(&self, nonce: &str) -> Result<Claim<'_>, FlowError> {
        let mut map = self.lock();
        let now = Instant::now();
        map.retain(|_, (_, at)| now.duration_since(*at) < self.retain);
        match map.get(nonce) {
            Some((State::InFlight, _)) => Err(FlowError::AlreadySubmitting),
            Some((State::Finished, _)) => Err(FlowError::AlreadySubmitted),
            None => {
                map.insert(nonce.to_string(), (State::InFlight, now));
                Ok(Claim { guard: self, nonce: nonce.to_string(), finished: false })
            }
        }
    }

    pub fn is_in_flight(&self, nonce: &str) -> bool {
        self.lock().get(nonce).is_some_and(|(state, _)| *state == State::InFlight)
    }

    pub fn is_finished(&self, nonce: &str) -> bool {
        self.lock().get(nonce).is_some_and(|(state, _)| *state == State::Finished)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, (State, Instant)>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// An in-flight dispatch for one nonce.
pub struct Claim<'a> {
    guard: &'a SubmitGuard,
    nonce: String,
    finished: bool,
}

impl Claim<'_> {
    /// Record the dispatch as done; the nonce is refused from now on.
    pub fn finish(mut self) {
        self.guard
            .lock()
            .insert(self.nonce.clone(), (State::Finished, Instant::now()));
        self.finished = true;
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.guard.lock().remove(&self.nonce);
        }
    }
}
