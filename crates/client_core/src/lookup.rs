//! Search-as-you-type lookups where only the newest query may win.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use shared::{domain::LookupHit, error::FailureKind, protocol::decode_list_response};
use tracing::{debug, warn};

use crate::{
    error::ClientError,
    transport::{ApiRequest, AuthenticatedClient},
};

pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Results for the current query were stored.
    Applied(usize),
    /// The query was too short; suggestions were cleared without a request.
    Cleared,
    /// The query changed while the request was in flight; the response was dropped.
    Stale,
    /// The request failed; suggestions were cleared.
    Failed(FailureKind),
}

struct LookupState<T> {
    query: String,
    issued: u64,
    results: Vec<T>,
}

pub struct LookupController<T = LookupHit> {
    client: Arc<AuthenticatedClient>,
    path: String,
    inner: Mutex<LookupState<T>>,
}

impl<T: DeserializeOwned + Clone + Send + Sync> LookupController<T> {
    pub fn new(client: Arc<AuthenticatedClient>, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            inner: Mutex::new(LookupState {
                query: String::new(),
                issued: 0,
                results: Vec::new(),
            }),
        }
    }

    pub fn query(&self) -> String {
        self.state().query.clone()
    }

    pub fn results(&self) -> Vec<T> {
        self.state().results.clone()
    }

    pub fn clear(&self) {
        let mut state = self.state();
        state.query.clear();
        state.issued += 1;
        state.results.clear();
    }

    pub async fn search(&self, query: &str) -> LookupOutcome {
        let seq = {
            let mut state = self.state();
            state.query = query.to_string();
            state.issued += 1;
            if query.chars().count() < MIN_QUERY_CHARS {
                state.results.clear();
                return LookupOutcome::Cleared;
            }
            state.issued
        };

        let request = ApiRequest::get(self.path.clone()).query("name", query);
        let result = self.client.execute(request).await.and_then(|response| {
            decode_list_response::<T>(response.body, None).map_err(ClientError::from)
        });

        let mut state = self.state();
        if state.issued != seq || state.query != query {
            debug!(path = %self.path, query, "dropping stale lookup response");
            return LookupOutcome::Stale;
        }

        match result {
            Ok(results) => {
                let count = results.len();
                state.results = results;
                LookupOutcome::Applied(count)
            }
            Err(err) => {
                warn!(path = %self.path, query, error = %err, "lookup failed");
                state.results.clear();
                LookupOutcome::Failed(err.kind())
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, LookupState<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub fn teacher_lookup(client: Arc<AuthenticatedClient>) -> LookupController {
    LookupController::new(client, "/api/group/search-teacher")
}

pub fn course_lookup(client: Arc<AuthenticatedClient>) -> LookupController {
    LookupController::new(client, "/api/group/search-course")
}

pub fn student_lookup(client: Arc<AuthenticatedClient>) -> LookupController {
    LookupController::new(client, "/api/payment/search-student")
}
