//! # Ticker Engine
//!
//! Owns the lifecycle of one presence engine:
//!
//! ```text
//! Created -> Starting -> Running -> Stopped
//!               |           |
//!               +--> Failed <+
//! ```
//!
//! `start` probes the discovery mechanism once. A failed probe is the only
//! fatal discovery error; afterwards every tick is isolated. An engine is not
//! reusable once it has stopped or failed.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use presence_common::config::EngineOptions;
use presence_common::error::{ConfigurationError, DiscoveryError};
use presence_common::scanning::{NetworkScanner, ScanRequest};
use presence_common::system::SystemRepository;

use crate::forward::{Forwarder, ForwardingError};
use crate::hub::{BroadcastHub, ConnectionId, Subscriber};
use crate::normalize;
use crate::scheduler::{Cadence, Scheduler, Tick};
use crate::system::LocalIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Created,
    Starting,
    Running,
    Stopped,
    Failed,
}

impl EngineStatus {
    pub fn is_running(self) -> bool {
        self == EngineStatus::Running
    }

    /// Terminal states. The engine will never tick again.
    pub fn is_halted(self) -> bool {
        matches!(self, EngineStatus::Stopped | EngineStatus::Failed)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine cannot start from the {0:?} state")]
    InvalidState(EngineStatus),
    #[error("discovery probe failed: {0}")]
    Startup(#[from] DiscoveryError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Forwarding(#[from] ForwardingError),
}

pub struct TickerEngine {
    options: EngineOptions,
    scanner: Arc<dyn NetworkScanner>,
    system: Arc<dyn SystemRepository>,
    hub: Arc<BroadcastHub>,
    forwarder: Arc<Forwarder>,
    status: Arc<watch::Sender<EngineStatus>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TickerEngine {
    pub fn new(
        options: EngineOptions,
        scanner: Arc<dyn NetworkScanner>,
        system: Arc<dyn SystemRepository>,
    ) -> Result<Self, EngineError> {
        options.validate()?;
        let forwarder = Forwarder::new(options.forward_endpoint.clone(), options.forward_timeout)?;
        let (status, _) = watch::channel(EngineStatus::Created);

        Ok(Self {
            options,
            scanner,
            system,
            hub: Arc::new(BroadcastHub::new()),
            forwarder: Arc::new(forwarder),
            status: Arc::new(status),
            task: Mutex::new(None),
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn status(&self) -> EngineStatus {
        *self.status.borrow()
    }

    /// Receiver that observes every lifecycle transition.
    pub fn subscribe_status(&self) -> watch::Receiver<EngineStatus> {
        self.status.subscribe()
    }

    pub fn hub(&self) -> Arc<BroadcastHub> {
        Arc::clone(&self.hub)
    }

    /// Maps a transport connect event onto the hub. Refused once the engine has halted.
    pub fn subscribe(&self, id: ConnectionId, subscriber: impl Subscriber + 'static) -> bool {
        // Holding the borrow blocks status transitions until the insert is done.
        let status = self.status.borrow();
        if status.is_halted() {
            return false;
        }
        self.hub.subscribe(id, subscriber);
        true
    }

    pub fn unsubscribe(&self, id: ConnectionId) -> bool {
        self.hub.unsubscribe(id)
    }

    /// Probes the discovery mechanism and, if it answers, starts ticking.
    pub async fn start(&self) -> Result<(), EngineError> {
        if !self.transition(EngineStatus::Created, EngineStatus::Starting) {
            return Err(EngineError::InvalidState(self.status()));
        }

        info!(
            interface = %self.options.interface,
            tick_ms = self.options.tick_interval.as_millis() as u64,
            forward = self.options.forward_endpoint.as_ref().map(|url| url.as_str()),
            "starting presence engine"
        );

        let probe_started = Instant::now();
        if let Err(e) = self.probe().await {
            error!(error = %e, "discovery probe failed, engine cannot start");
            self.fail();
            return Err(e.into());
        }

        let scheduler = Scheduler::new(
            Cadence::resume_from(self.options.tick_interval, probe_started),
            Arc::clone(&self.scanner),
            LocalIdentity::new(Arc::clone(&self.system), self.options.interface.clone()),
            Arc::clone(&self.hub),
            self.forwarder.is_configured(),
            self.status.subscribe(),
        );

        if !self.transition(EngineStatus::Starting, EngineStatus::Running) {
            return Err(EngineError::InvalidState(self.status()));
        }

        let worker = tokio::spawn(tick_loop(
            scheduler,
            Arc::clone(&self.hub),
            Arc::clone(&self.forwarder),
        ));
        let status = Arc::clone(&self.status);
        let supervisor = tokio::spawn(async move {
            if let Err(e) = worker.await {
                error!(error = %e, "tick loop terminated unexpectedly");
                mark_failed(&status);
            }
        });

        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(supervisor);
        info!("presence engine running");
        Ok(())
    }

    /// Prevents future ticks. An attempt already in flight is allowed to finish.
    pub fn stop(&self) {
        let stopped = self.status.send_if_modified(|status| {
            if status.is_halted() {
                return false;
            }
            *status = EngineStatus::Stopped;
            true
        });
        if stopped {
            info!("presence engine stopped");
        }
    }

    /// Waits for the tick loop to exit. Returns immediately if it never started.
    pub async fn join(&self) {
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    /// Resolves once the engine has entered `Failed`.
    pub async fn wait_failed(&self) {
        let mut status = self.status.subscribe();
        let _ = status
            .wait_for(|status| *status == EngineStatus::Failed)
            .await;
    }

    /// Resolves once the engine has stopped or failed.
    pub async fn wait_halted(&self) {
        let mut status = self.status.subscribe();
        wait_until_halted(&mut status).await;
    }

    async fn probe(&self) -> Result<(), DiscoveryError> {
        let request = ScanRequest::new(self.options.interface.clone());
        let hosts = self.scanner.scan(&request).await?;
        let records = normalize::parse_hosts(hosts)?;
        debug!(hosts = records.len(), "discovery probe succeeded");
        Ok(())
    }

    fn transition(&self, from: EngineStatus, to: EngineStatus) -> bool {
        self.status.send_if_modified(|status| {
            if *status != from {
                return false;
            }
            *status = to;
            true
        })
    }

    fn fail(&self) {
        mark_failed(&self.status);
    }
}

/// Moves a starting or running engine to `Failed`. Notifies watchers at most once.
fn mark_failed(status: &watch::Sender<EngineStatus>) {
    status.send_if_modified(|status| {
        if !matches!(status, EngineStatus::Starting | EngineStatus::Running) {
            return false;
        }
        *status = EngineStatus::Failed;
        true
    });
}

pub(crate) async fn wait_until_halted(status: &mut watch::Receiver<EngineStatus>) {
    let _ = status.wait_for(|status| status.is_halted()).await;
}

async fn tick_loop(mut scheduler: Scheduler, hub: Arc<BroadcastHub>, forwarder: Arc<Forwarder>) {
    while let Some(tick) = scheduler.next_tick().await {
        let Tick::Roster(roster) = tick else {
            continue;
        };

        let roster = Arc::new(roster);
        let delivered = hub.publish(Arc::clone(&roster));
        forwarder.forward(&roster).await;
        info!(hosts = roster.len(), subscribers = delivered, "presence ticked");
    }
    debug!("tick loop exited");
}
