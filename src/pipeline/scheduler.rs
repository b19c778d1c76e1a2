//! Periodic and on-demand cycle scheduling.
//!
//! Every cycle, of either kind, runs through one [`CycleGate`]. Requests
//! that arrive while a cycle is in flight wait their turn in arrival order.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};

use crate::error::Result;
use crate::pipeline::Watcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleKind {
    Prices,
    Availability,
}

impl CycleKind {
    pub const ALL: [CycleKind; 2] = [CycleKind::Prices, CycleKind::Availability];
}

impl fmt::Display for CycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prices => write!(f, "price"),
            Self::Availability => write!(f, "availability"),
        }
    }
}

/// Sender for out-of-band cycle requests.
pub type ScanRequests = mpsc::UnboundedSender<CycleKind>;

/// Mutual exclusion across all cycles.
///
/// Waiters are served first come, first served.
#[derive(Debug, Default)]
pub struct CycleGate {
    lock: Mutex<()>,
}

impl CycleGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `cycle` once no other cycle is in flight.
    pub async fn run<F: Future>(&self, kind: CycleKind, cycle: F) -> F::Output {
        let _guard = self.lock.lock().await;
        log::debug!("Starting {kind} cycle");
        let output = cycle.await;
        log::debug!("Finished {kind} cycle");
        output
    }
}

/// Drives a [`Watcher`] on timers and on request.
pub struct Scheduler {
    watcher: Arc<Watcher>,
    gate: CycleGate,
}

impl Scheduler {
    pub fn new(watcher: Arc<Watcher>) -> Self {
        Self {
            watcher,
            gate: CycleGate::new(),
        }
    }

    /// Run one cycle of `kind` behind the gate.
    pub async fn run_once(&self, kind: CycleKind) -> Result<()> {
        self.gate
            .run(kind, async {
                match kind {
                    CycleKind::Prices => self.watcher.run_price_cycle().await.map(|_| ()),
                    CycleKind::Availability => {
                        self.watcher.run_availability_cycle().await.map(|_| ())
                    }
                }
            })
            .await
    }

    /// Run both periodic loops and serve `requests` until the process ends.
    pub async fn run(
        self: Arc<Self>,
        price_interval: Duration,
        availability_interval: Duration,
        requests: mpsc::UnboundedReceiver<CycleKind>,
    ) {
        let tasks = vec![
            tokio::spawn(Arc::clone(&self).periodic(CycleKind::Prices, price_interval)),
            tokio::spawn(Arc::clone(&self).periodic(CycleKind::Availability, availability_interval)),
            tokio::spawn(Arc::clone(&self).serve_requests(requests)),
        ];

        for joined in futures::future::join_all(tasks).await {
            if let Err(e) = joined {
                log::error!("Scheduler task stopped: {e}");
            }
        }
    }

    /// Run a cycle, then sleep `interval`, forever.
    async fn periodic(self: Arc<Self>, kind: CycleKind, interval: Duration) {
        log::info!("Checking {kind} every {}s", interval.as_secs());
        loop {
            if let Err(e) = self.run_once(kind).await {
                log::error!("The {kind} cycle failed: {e}");
            }
            tokio::time::sleep(interval).await;
        }
    }

    async fn serve_requests(self: Arc<Self>, mut requests: mpsc::UnboundedReceiver<CycleKind>) {
        while let Some(kind) = requests.recv().await {
            log::info!("Requested {kind} cycle");
            if let Err(e) = self.run_once(kind).await {
                log::error!("The requested {kind} cycle failed: {e}");
            }
        }
        log::debug!("Scan request channel closed");
    }
}
