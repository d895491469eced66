use crate::{
    CoreError, SchedulingApi,
    domain::scheduling::{RequestSubmission, TokenValidation},
};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

/// In-memory stand-in for the scheduling service.
///
/// Tokens registered with [`issue_token`](Self::issue_token) validate until
/// they are consumed. Failures of the consume and submit calls can be switched
/// on to exercise the error paths of the workflows.
#[derive(Debug, Clone, Default)]
pub struct InMemorySchedulingApi {
    tokens: Arc<DashMap<String, TokenValidation>>,
    consumed: Arc<DashSet<String>>,
    submissions: Arc<Mutex<Vec<RequestSubmission>>>,
    fail_consume: Arc<AtomicBool>,
    fail_submit: Arc<AtomicBool>,
}

impl InMemorySchedulingApi {
    pub fn issue_token(&self, token: &str, validation: TokenValidation) {
        self.tokens.insert(token.to_string(), validation);
    }

    pub fn set_fail_consume(&self, fail: bool) {
        self.fail_consume.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_submit(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::SeqCst);
    }

    pub fn is_consumed(&self, token: &str) -> bool {
        self.consumed.contains(token)
    }

    /// Submissions received so far, including rejected ones.
    pub fn submissions(&self) -> Vec<RequestSubmission> {
        self.submissions
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SchedulingApi for InMemorySchedulingApi {
    async fn validate_token(&self, token: &str) -> Option<TokenValidation> {
        if self.consumed.contains(token) {
            return None;
        }
        self.tokens.get(token).map(|entry| entry.value().clone())
    }

    async fn consume_token(&self, token: &str) -> bool {
        if self.fail_consume.load(Ordering::SeqCst) || !self.tokens.contains_key(token) {
            return false;
        }
        self.consumed.insert(token.to_string())
    }

    async fn submit_request(&self, submission: &RequestSubmission) -> Result<(), CoreError> {
        if let Ok(mut guard) = self.submissions.lock() {
            guard.push(submission.clone());
        }
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(CoreError::Remote("status 503: unavailable".into()));
        }
        Ok(())
    }
}
