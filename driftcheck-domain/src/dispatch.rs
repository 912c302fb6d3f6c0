use crate::classify::{Assessment, classify};
use crate::ports::VerifyError;
use crate::region;
use crate::registry::{Resolution, VerifierRegistry};
use anyhow::Context;
use driftcheck_types::{ClassifiedResult, VerificationOutcome, WorkItem};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Bounded worker pool that assesses and classifies work items.
pub struct Dispatcher {
    registry: Arc<VerifierRegistry>,
    target_region: String,
    concurrency: usize,
}

/// Unordered results of one dispatch, plus the shared mismatch counter.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub results: Vec<ClassifiedResult>,
    pub region_mismatches: u64,
}

/// Read-only context for workers. The mismatch counter is the only
/// mutable state they share; items arrive over a channel.
struct Shared {
    registry: Arc<VerifierRegistry>,
    target_region: String,
    region_mismatches: AtomicU64,
}

impl Dispatcher {
    /// `concurrency` is clamped to at least one worker.
    pub fn new(
        registry: Arc<VerifierRegistry>,
        target_region: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        Self {
            registry,
            target_region: target_region.into(),
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Classify every item. Each item yields exactly one result; order is
    /// completion order and carries no meaning.
    pub async fn dispatch(&self, items: Vec<WorkItem>) -> anyhow::Result<DispatchOutcome> {
        let total = items.len();
        if total == 0 {
            return Ok(DispatchOutcome::default());
        }

        let shared = Arc::new(Shared {
            registry: Arc::clone(&self.registry),
            target_region: self.target_region.clone(),
            region_mismatches: AtomicU64::new(0),
        });

        let (work_tx, work_rx) = mpsc::channel::<WorkItem>(self.concurrency);
        let work_rx = Arc::new(Mutex::new(work_rx));
        let (result_tx, mut result_rx) = mpsc::channel::<ClassifiedResult>(self.concurrency);
        let workers = self.concurrency.min(total);
        debug!(workers, items = total, "starting dispatch");

        let mut set = JoinSet::new();
        set.spawn(async move {
            for item in items {
                if work_tx.send(item).await.is_err() {
                    break;
                }
            }
        });
        for _ in 0..workers {
            let shared = Arc::clone(&shared);
            let work_rx = Arc::clone(&work_rx);
            let result_tx = result_tx.clone();
            set.spawn(async move {
                loop {
                    let next = work_rx.lock().await.recv().await;
                    let Some(item) = next else { break };
                    let result = process(&shared, &item).await;
                    if result_tx.send(result).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = result_rx.recv().await {
            results.push(result);
        }

        while let Some(joined) = set.join_next().await {
            joined.context("verification worker failed")?;
        }

        if results.len() != total {
            anyhow::bail!(
                "dispatch produced {} results for {} work items",
                results.len(),
                total
            );
        }

        Ok(DispatchOutcome {
            results,
            region_mismatches: shared.region_mismatches.load(Ordering::Relaxed),
        })
    }
}

async fn process(shared: &Shared, item: &WorkItem) -> ClassifiedResult {
    let assessment = assess(shared, item).await;
    classify(item, &assessment, &shared.target_region)
}

async fn assess(shared: &Shared, item: &WorkItem) -> Assessment {
    if let Some(assessment) =
        Assessment::from_region_check(region::check(item, &shared.target_region))
    {
        if matches!(assessment, Assessment::RegionMismatch { .. }) {
            shared.region_mismatches.fetch_add(1, Ordering::Relaxed);
            debug!(address = %item.address, "region mismatch, skipping verifier");
        }
        return assessment;
    }

    let (lookup, verifier) = match shared.registry.resolve(&item.kind) {
        Resolution::Passive => return Assessment::Passive,
        Resolution::Unregistered => return Assessment::Unregistered,
        Resolution::Registered { lookup, verifier } => (lookup, verifier),
    };

    if let Some(err) = &item.attribute_error {
        return Assessment::Verified(VerificationOutcome::failed(err.clone()));
    }

    let lookup = match lookup.lookup_for(item) {
        Ok(lookup) => lookup,
        Err(e @ VerifyError::ManualVerificationRequired { .. }) => {
            debug!(address = %item.address, "no identifying attribute, leaving for manual check");
            return Assessment::ManualCheck {
                reason: e.to_string(),
            };
        }
        Err(e) => return Assessment::Verified(VerificationOutcome::failed(e.to_string())),
    };

    let outcome = match verifier.verify(&lookup).await {
        Ok(live_id) => VerificationOutcome::found(live_id),
        Err(VerifyError::NotFound) => VerificationOutcome::missing(),
        Err(e) => {
            warn!(address = %item.address, code = e.error_code(), error = %e, "verification failed");
            VerificationOutcome::failed(e.to_string())
        }
    };
    Assessment::Verified(outcome)
}
