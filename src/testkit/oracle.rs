//! Mock [`RelationOracle`] implementations for testing.
//!
//! - [`StaticOracle`] - Knows a fixed edge list and answers each batch with
//!   the edges whose endpoints both lie in it. Best for: pipeline scenarios.
//!
//! - [`ScriptedOracle`] - Pre-loaded results per batch, keyed by the first
//!   market in the batch, plus an optional delay. Tracks how many calls
//!   overlap. Best for: retries, timeouts, malformed responses,
//!   cancellation, concurrency limits.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::port::outbound::oracle::{MarketSummary, OracleEdge, RelationOracle};

// ---------------------------------------------------------------------------
// StaticOracle
// ---------------------------------------------------------------------------

/// An oracle that knows the true relationships and never fails.
pub struct StaticOracle {
    edges: Vec<OracleEdge>,
    batch_limit: usize,
    calls: Arc<AtomicU32>,
}

impl StaticOracle {
    pub fn new(edges: Vec<OracleEdge>) -> Self {
        Self {
            edges,
            batch_limit: 30,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelationOracle for StaticOracle {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn relate(&self, batch: &[MarketSummary]) -> Result<Vec<OracleEdge>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let ids: HashSet<&str> = batch.iter().map(|m| m.id.as_str()).collect();
        Ok(self
            .edges
            .iter()
            .filter(|e| ids.contains(e.a.as_str()) && ids.contains(e.b.as_str()))
            .cloned()
            .collect())
    }

    fn batch_limit(&self) -> usize {
        self.batch_limit
    }
}

// ---------------------------------------------------------------------------
// ScriptedOracle
// ---------------------------------------------------------------------------

/// An oracle with scripted results per batch.
///
/// Each call pops the next result queued for the batch's first market
/// (defaults to `Ok(vec![])` when exhausted or unscripted).
pub struct ScriptedOracle {
    scripts: Mutex<HashMap<String, VecDeque<Result<Vec<OracleEdge>>>>>,
    delay: Option<Duration>,
    calls: Arc<AtomicU32>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            delay: None,
            calls: Arc::new(AtomicU32::new(0)),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Queue results for batches starting with `first_market`.
    pub fn with_script(self, first_market: &str, results: Vec<Result<Vec<OracleEdge>>>) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.insert(first_market.to_string(), results.into());
        }
        self
    }

    /// Sleep before answering every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most calls that were ever running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight gauge when a call ends or is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Default for ScriptedOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelationOracle for ScriptedOracle {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn relate(&self, batch: &[MarketSummary]) -> Result<Vec<OracleEdge>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _gauge = InFlight(&self.in_flight);
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let key = batch.first().map(|m| m.id.to_string()).unwrap_or_default();
        let next = self
            .scripts
            .lock()
            .ok()
            .and_then(|mut scripts| scripts.get_mut(&key).and_then(VecDeque::pop_front));
        next.unwrap_or_else(|| Ok(Vec::new()))
    }
}
