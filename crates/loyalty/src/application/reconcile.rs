//! Reconciliation Pool
//!
//! Fixed-size worker group that converges local order state to the
//! provider's. Workers share one rate-limit gate: any worker that sees a
//! 429 publishes the announced cool-down, every worker honours it before
//! its next provider call.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::application::config::ReconcileConfig;
use crate::domain::entity::order::PendingOrder;
use crate::domain::repository::LedgerRepository;
use crate::infra::accrual::{AccrualClient, AccrualError, AccrualReply};

/// Shared rate-limit gate
///
/// A duration in whole seconds, written by whichever worker observes
/// `RateLimited(n)` and read by every worker before each provider call.
/// Never blocks.
#[derive(Debug, Default)]
pub struct RateGate(AtomicU64);

impl RateGate {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Publish a provider-announced cool-down.
    pub fn throttle(&self, secs: u64) {
        self.0.store(secs, Ordering::Release);
    }

    /// Current cool-down, if any.
    pub fn delay(&self) -> Option<Duration> {
        match self.0.load(Ordering::Acquire) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Reconciliation worker pool
pub struct Reconciler<R>
where
    R: LedgerRepository + Send + Sync + 'static,
{
    repo: Arc<R>,
    accrual: Arc<AccrualClient>,
    gate: Arc<RateGate>,
    config: ReconcileConfig,
}

impl<R> Reconciler<R>
where
    R: LedgerRepository + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, accrual: Arc<AccrualClient>, config: ReconcileConfig) -> Self {
        Self {
            repo,
            accrual,
            gate: Arc::new(RateGate::new()),
            config,
        }
    }

    /// Drain `orders` with `config.workers` concurrent workers until the
    /// channel closes or `shutdown` fires.
    pub async fn run(self, orders: mpsc::Receiver<PendingOrder>, shutdown: CancellationToken) {
        let queue = Arc::new(Mutex::new(orders));

        let mut workers = Vec::with_capacity(self.config.workers);
        for worker_id in 0..self.config.workers {
            workers.push(tokio::spawn(worker(
                worker_id,
                Arc::clone(&self.repo),
                Arc::clone(&self.accrual),
                Arc::clone(&self.gate),
                Arc::clone(&queue),
                shutdown.clone(),
            )));
        }

        for handle in workers {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "Reconciliation worker panicked");
            }
        }

        tracing::info!("Reconciliation pool stopped");
    }
}

async fn worker<R>(
    worker_id: usize,
    repo: Arc<R>,
    accrual: Arc<AccrualClient>,
    gate: Arc<RateGate>,
    queue: Arc<Mutex<mpsc::Receiver<PendingOrder>>>,
    shutdown: CancellationToken,
) where
    R: LedgerRepository + Send + Sync + 'static,
{
    loop {
        // The lock is held only while waiting for the next item, so the
        // other workers are free as soon as one is handed out.
        let order = {
            let mut queue = queue.lock().await;
            tokio::select! {
                _ = shutdown.cancelled() => None,
                order = queue.recv() => order,
            }
        };
        let Some(order) = order else { break };

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = process(worker_id, repo.as_ref(), &accrual, &gate, &order) => {}
        }
    }

    tracing::debug!(worker_id, "Reconciliation worker stopped");
}

/// Handle one scanned order end to end.
async fn process<R>(
    worker_id: usize,
    repo: &R,
    accrual: &AccrualClient,
    gate: &RateGate,
    order: &PendingOrder,
) where
    R: LedgerRepository + Sync,
{
    if let Some(delay) = gate.delay() {
        // The skew spreads the workers back out once the gate opens.
        tokio::time::sleep(delay + worker_skew(worker_id)).await;
    }

    let reply = match fetch_with_retry(accrual, gate, &order.number).await {
        Ok(reply) => reply,
        Err(err) => {
            tracing::warn!(order = %order.number, error = %err, "Provider call failed");
            return;
        }
    };

    let provider = match reply {
        AccrualReply::Found(provider) => provider,
        AccrualReply::NoContent => {
            tracing::debug!(order = %order.number, "Provider has no record yet");
            return;
        }
        AccrualReply::RateLimited(_) => {
            // Retried once already; the next scan tick picks the order up.
            tracing::warn!(order = %order.number, "Provider still rate limited, giving up on item");
            return;
        }
    };

    // Unchanged status: drop without a write.
    if provider.order_status() == order.status {
        return;
    }

    let accrued = match provider.accrual_points() {
        Ok(points) => points,
        Err(err) => {
            tracing::warn!(order = %order.number, error = %err, "Rejecting provider accrual");
            return;
        }
    };

    if let Err(err) = repo
        .update_order(order.user_id, &order.number, provider.order_status(), accrued)
        .await
    {
        tracing::warn!(order = %order.number, error = %err, "Failed to update order");
    }
}

/// One provider call, retried a single time after a rate-limit reply.
async fn fetch_with_retry(
    accrual: &AccrualClient,
    gate: &RateGate,
    number: &str,
) -> Result<AccrualReply, AccrualError> {
    match accrual.order_status(number).await? {
        AccrualReply::RateLimited(secs) => {
            gate.throttle(secs);
            tracing::info!(retry_after = secs, "Provider rate limit hit");
            tokio::time::sleep(Duration::from_secs(secs)).await;
            accrual.order_status(number).await
        }
        reply => Ok(reply),
    }
}

fn worker_skew(worker_id: usize) -> Duration {
    Duration::from_millis(worker_id as u64 * 100)
}
