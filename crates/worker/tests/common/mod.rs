//! In-memory store and scripted generator for processor tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use ohm_core::circuit::CircuitJson;
use ohm_core::hashing::circuit_hash;
use ohm_core::queue::DiagramStatus;
use ohm_core::types::{DbId, Timestamp};
use ohm_render::{DiagramGenerator, RenderError};
use ohm_worker::{ClaimedJob, DiagramStore, StoreError};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MemJob {
    pub job: ClaimedJob,
    pub status: DiagramStatus,
    pub diagram_url: Option<String>,
    pub from_cache: bool,
    pub error_message: Option<String>,
}

#[derive(Default)]
struct State {
    jobs: Vec<MemJob>,
    cache: HashMap<String, String>,
    requeue_cutoffs: Vec<Timestamp>,
    fail_claims: bool,
}

/// FIFO queue held in memory, mirroring the Postgres store's transitions.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Queue a job for `circuit`, hashing it the way enqueue does.
    pub fn push(&self, circuit: Value) -> DbId {
        let hash = CircuitJson::parse(&circuit)
            .map(|c| circuit_hash(&c))
            .unwrap_or_default();
        self.push_with_hash(circuit, hash)
    }

    pub fn push_with_hash(&self, circuit: Value, circuit_hash: String) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.jobs.len() as DbId + 1;
        state.jobs.push(MemJob {
            job: ClaimedJob {
                id,
                artifact_id: 100 + id,
                circuit_json: circuit,
                circuit_hash,
            },
            status: DiagramStatus::Queued,
            diagram_url: None,
            from_cache: false,
            error_message: None,
        });
        id
    }

    pub fn seed_cache(&self, hash: &str, url: &str) {
        self.state
            .lock()
            .unwrap()
            .cache
            .insert(hash.to_string(), url.to_string());
    }

    pub fn fail_claims(&self) {
        self.state.lock().unwrap().fail_claims = true;
    }

    pub fn job(&self, id: DbId) -> MemJob {
        self.state.lock().unwrap().jobs[(id - 1) as usize].clone()
    }

    pub fn cached(&self, hash: &str) -> Option<String> {
        self.state.lock().unwrap().cache.get(hash).cloned()
    }

    pub fn count(&self, status: DiagramStatus) -> usize {
        self.state
            .lock()
            .unwrap()
            .jobs
            .iter()
            .filter(|j| j.status == status)
            .count()
    }

    pub fn requeue_cutoffs(&self) -> Vec<Timestamp> {
        self.state.lock().unwrap().requeue_cutoffs.clone()
    }

    fn finish(&self, id: DbId, apply: impl FnOnce(&mut MemJob)) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.job.id == id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        if job.status == DiagramStatus::Processing {
            apply(job);
        }
        Ok(())
    }
}

#[async_trait]
impl DiagramStore for MemoryStore {
    async fn requeue_stale(&self, claimed_before: Timestamp) -> Result<u64, StoreError> {
        self.state.lock().unwrap().requeue_cutoffs.push(claimed_before);
        Ok(0)
    }

    async fn claim_next(&self) -> Result<Option<ClaimedJob>, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_claims {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let next = state
            .jobs
            .iter_mut()
            .find(|j| j.status == DiagramStatus::Queued);
        Ok(next.map(|j| {
            j.status = DiagramStatus::Processing;
            j.job.clone()
        }))
    }

    async fn cached_url(&self, circuit_hash: &str) -> Result<Option<String>, StoreError> {
        Ok(self.cached(circuit_hash))
    }

    async fn cache_url(&self, circuit_hash: &str, diagram_url: &str) -> Result<String, StoreError> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .cache
            .entry(circuit_hash.to_string())
            .or_insert_with(|| diagram_url.to_string())
            .clone())
    }

    async fn complete(
        &self,
        job: &ClaimedJob,
        diagram_url: &str,
        from_cache: bool,
    ) -> Result<(), StoreError> {
        self.finish(job.id, |j| {
            j.status = DiagramStatus::Complete;
            j.diagram_url = Some(diagram_url.to_string());
            j.from_cache = from_cache;
        })
    }

    async fn fail(&self, job: &ClaimedJob, error: &str) -> Result<(), StoreError> {
        self.finish(job.id, |j| {
            j.status = DiagramStatus::Failed;
            j.error_message = Some(error.to_string());
        })
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Title that makes [`ScriptedGenerator`] fail.
pub const FAILING_TITLE: &str = "explode";

/// Generator that sleeps `latency`, counts calls, and fails for circuits
/// titled [`FAILING_TITLE`].
#[derive(Default)]
pub struct ScriptedGenerator {
    pub latency: Duration,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiagramGenerator for ScriptedGenerator {
    async fn generate(&self, circuit: &CircuitJson) -> Result<String, RenderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if circuit.title.as_deref() == Some(FAILING_TITLE) {
            return Err(RenderError::ApiError {
                status: 500,
                body: "model crashed".to_string(),
            });
        }
        Ok(format!("https://img.test/{n}.png"))
    }
}

// ---------------------------------------------------------------------------
// Circuits
// ---------------------------------------------------------------------------

/// A small valid circuit whose wiring varies with `pin`.
pub fn circuit(pin: &str) -> Value {
    json!({
        "components": [{"id": "u1", "type": "arduino-uno"}, {"id": "d1", "type": "led"}],
        "connections": [{"from": format!("u1.{pin}"), "to": "d1"}]
    })
}

pub fn titled_circuit(title: &str, pin: &str) -> Value {
    let mut value = circuit(pin);
    value["title"] = Value::String(title.to_string());
    value
}
