//! In-flight request registry.
//!
//! At most one attempt sequence runs per cache key. The first caller
//! spawns the sequence as its own task and registers a shared handle to it;
//! callers arriving while it is pending await a clone of the same handle and
//! observe the same outcome. The task runs to completion even if every caller
//! goes away, and removes its own key once it settles, whether it succeeded
//! or failed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use orthoqa_core::ApiError;
use serde_json::Value;
use tracing::warn;

use crate::lock;

/// Settled outcome of one logical request.
pub type FlightResult = Result<Value, ApiError>;

/// Future shared by every caller of one logical request.
pub type SharedFlight = Shared<BoxFuture<'static, FlightResult>>;

/// How a caller got hold of a flight.
pub enum Flight {
    /// Another caller already started this request.
    Joined(SharedFlight),
    /// This caller registered the request.
    Started(SharedFlight),
}

impl Flight {
    /// Waits for the shared outcome.
    pub async fn outcome(self) -> FlightResult {
        match self {
            Self::Joined(flight) | Self::Started(flight) => flight.await,
        }
    }

    /// True if this caller attached to an existing flight.
    pub fn is_joined(&self) -> bool {
        matches!(self, Self::Joined(_))
    }
}

/// Registry of pending requests keyed by cache key.
#[derive(Default)]
pub struct InFlightRegistry {
    pending: Arc<Mutex<HashMap<String, SharedFlight>>>,
}

impl InFlightRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the flight registered under `key`, or spawns `start()` as a new one.
    ///
    /// Lookup and registration happen under one lock, and the spawned task
    /// needs that lock to deregister, so two callers can never both start the
    /// same key and a settled key is never left behind.
    ///
    /// Must be called from within a tokio runtime.
    pub fn join_or_start<F>(&self, key: &str, start: F) -> Flight
    where
        F: FnOnce() -> BoxFuture<'static, FlightResult>,
    {
        let mut pending = lock(&self.pending);
        if let Some(existing) = pending.get(key) {
            return Flight::Joined(existing.clone());
        }

        let work = start();
        let registry = Arc::clone(&self.pending);
        let owned_key = key.to_string();
        let task = tokio::spawn(async move {
            let outcome = work.await;
            lock(&registry).remove(&owned_key);
            outcome
        });

        let flight = async move {
            task.await.unwrap_or_else(|e| {
                warn!(error = %e, "Request task ended abnormally");
                Err(ApiError::Transport(format!("request task failed: {e}")))
            })
        }
        .boxed()
        .shared();

        pending.insert(key.to_string(), flight.clone());
        Flight::Started(flight)
    }

    /// Number of pending flights.
    pub fn len(&self) -> usize {
        lock(&self.pending).len()
    }

    /// True if no flight is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if a flight is pending under `key`.
    pub fn contains(&self, key: &str) -> bool {
        lock(&self.pending).contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_second_caller_joins() {
        let registry = InFlightRegistry::new();
        let (tx, rx) = oneshot::channel::<FlightResult>();

        let first = registry.join_or_start("k", || {
            async move { rx.await.unwrap_or(Err(ApiError::Cancelled)) }.boxed()
        });
        let second = registry.join_or_start("k", || {
            panic!("second caller must not start a new flight")
        });

        assert!(!first.is_joined());
        assert!(second.is_joined());
        assert!(registry.contains("k"));

        tx.send(Ok(json!({"ok": true}))).unwrap();
        let (a, b) = tokio::join!(first.outcome(), second.outcome());
        assert_eq!(a.unwrap(), json!({"ok": true}));
        assert_eq!(b.unwrap(), json!({"ok": true}));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_failure_deregisters() {
        let registry = InFlightRegistry::new();
        let flight = registry.join_or_start("k", || {
            async { Err(ApiError::Transport("connection reset".to_string())) }.boxed()
        });

        assert!(flight.outcome().await.is_err());
        assert!(!registry.contains("k"));
    }

    #[tokio::test]
    async fn test_flight_settles_without_callers() {
        let registry = InFlightRegistry::new();
        let (tx, rx) = oneshot::channel::<FlightResult>();

        let flight = registry.join_or_start("k", || {
            async move { rx.await.unwrap_or(Err(ApiError::Cancelled)) }.boxed()
        });
        drop(flight);
        assert!(registry.contains("k"));

        tx.send(Ok(json!(1))).unwrap();
        for _ in 0..10 {
            if registry.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_share() {
        let registry = InFlightRegistry::new();
        let a = registry.join_or_start("a", || async { Ok(json!(1)) }.boxed());
        let b = registry.join_or_start("b", || async { Ok(json!(2)) }.boxed());

        assert!(!b.is_joined());
        assert_eq!(a.outcome().await.unwrap(), json!(1));
        assert_eq!(b.outcome().await.unwrap(), json!(2));
    }
}
