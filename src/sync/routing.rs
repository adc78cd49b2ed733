use thiserror::Error;

use crate::error::is_transient_message;

/// Failures observed by the sync client. Definitive server answers
/// (validation, conflict, not-found) surface as `Status`; everything that
/// kept us from getting an answer is `Network`; a full sweep of every
/// candidate base aggregates into `Exhausted` carrying the last error seen.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("request cancelled")]
    Cancelled,
    #[error("server answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("all {attempts} API bases failed; last error: {last}")]
    Exhausted { attempts: usize, last: Box<SyncError> },
}

impl SyncError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Exhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(message) => is_transient_message(message),
            Self::Exhausted { last, .. } => last.is_transient(),
            _ => false,
        }
    }
}

/// Ordered candidate API bases plus a sticky pointer to the last base that
/// answered. The candidate order itself is fixed for the session; only the
/// starting point moves.
#[derive(Debug)]
pub struct BaseRouter {
    candidates: Vec<String>,
    preferred: usize,
}

impl BaseRouter {
    pub fn new(primary: Option<String>, alternates: Vec<String>, last_resort: &str) -> Self {
        let mut candidates = Vec::new();
        let mut push = |raw: &str| {
            let base = raw.trim().trim_end_matches('/').to_string();
            if !base.is_empty() && !candidates.contains(&base) {
                candidates.push(base);
            }
        };

        if let Some(primary) = &primary {
            push(primary);
        }
        for alternate in &alternates {
            push(alternate);
        }
        push(last_resort);

        Self {
            candidates,
            preferred: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn preferred_base(&self) -> &str {
        &self.candidates[self.preferred]
    }

    /// Trial order for one request sweep: the preferred base first, then the
    /// remaining candidates in their fixed configured order.
    pub fn ordered(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.candidates.len());
        order.push(self.preferred);
        order.extend((0..self.candidates.len()).filter(|index| *index != self.preferred));
        order
    }

    pub fn url(&self, index: usize, path: &str) -> String {
        format!("{}/{}", self.candidates[index], path.trim_start_matches('/'))
    }

    pub fn mark_success(&mut self, index: usize) {
        if index < self.candidates.len() {
            self.preferred = index;
        }
    }
}
