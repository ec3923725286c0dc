use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

/// Proof that a fetch was started for a key
#[derive(Debug, Clone)]
pub struct FetchTicket<K> {
    key: K,
    generation: u64,
}

impl<K> FetchTicket<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

#[derive(Debug)]
struct QueryState<K, T> {
    key: Option<K>,
    generation: u64,
    data: Option<Arc<T>>,
    error: Option<String>,
    fetched_at: Option<Instant>,
}

/// What a caller renders for one query
#[derive(Debug, Clone)]
pub struct QuerySnapshot<K, T> {
    pub key: Option<K>,
    pub data: Option<Arc<T>>,
    pub error: Option<String>,
    pub is_loading: bool,
    pub is_stale: bool,
}

/// Single-key read-model cache with last-write-wins semantics.
///
/// Switching to a new key drops the old data and bumps the generation, so a
/// response still in flight for the previous key is discarded on arrival.
/// Data is only ever replaced whole.
#[derive(Debug)]
pub struct QueryCache<K, T> {
    state: RwLock<QueryState<K, T>>,
    stale_after: Duration,
}

impl<K, T> QueryCache<K, T>
where
    K: Clone + PartialEq + Debug,
{
    pub fn new(stale_after: Duration) -> Self {
        Self {
            state: RwLock::new(QueryState {
                key: None,
                generation: 0,
                data: None,
                error: None,
                fetched_at: None,
            }),
            stale_after,
        }
    }

    /// Registers a fetch for `key`, superseding any other key
    pub async fn begin(&self, key: K) -> FetchTicket<K> {
        let mut state = self.state.write().await;
        if state.key.as_ref() != Some(&key) {
            state.generation += 1;
            state.key = Some(key.clone());
            state.data = None;
            state.error = None;
            state.fetched_at = None;
        }
        FetchTicket {
            key,
            generation: state.generation,
        }
    }

    /// Applies a fetch result. Returns `false` when the ticket was superseded
    /// and the result was thrown away.
    pub async fn complete(&self, ticket: FetchTicket<K>, result: Result<T, String>) -> bool {
        let mut state = self.state.write().await;
        if state.generation != ticket.generation || state.key.as_ref() != Some(&ticket.key) {
            tracing::debug!(key = ?ticket.key, "Discarding superseded fetch result");
            return false;
        }
        match result {
            Ok(data) => {
                state.data = Some(Arc::new(data));
                state.error = None;
                state.fetched_at = Some(Instant::now());
            }
            Err(error) => {
                state.error = Some(error);
            }
        }
        true
    }

    /// Forces the next read to count as stale
    pub async fn invalidate(&self) {
        self.state.write().await.fetched_at = None;
    }

    /// Forgets the key and its data; pending fetches will be discarded
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.key = None;
        state.data = None;
        state.error = None;
        state.fetched_at = None;
    }

    pub async fn data_for(&self, key: &K) -> Option<Arc<T>> {
        let state = self.state.read().await;
        if state.key.as_ref() == Some(key) {
            state.data.clone()
        } else {
            None
        }
    }

    pub async fn snapshot(&self) -> QuerySnapshot<K, T> {
        let state = self.state.read().await;
        QuerySnapshot {
            key: state.key.clone(),
            data: state.data.clone(),
            error: state.error.clone(),
            is_loading: state.key.is_some() && state.data.is_none() && state.error.is_none(),
            is_stale: state
                .fetched_at
                .map_or(true, |at| at.elapsed() >= self.stale_after),
        }
    }
}
