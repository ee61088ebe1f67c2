//! # Drift-Compensated Scheduler
//!
//! Produces one [`Tick`] per call to [`Scheduler::next_tick`] for as long as
//! the engine is running. Discovery attempts are strictly sequential and are
//! spaced by the tick interval measured from one attempt's start to the next
//! attempt's start. The wait before an attempt shrinks by however long the
//! previous attempt (and its fan-out) took, and is zero once that overruns
//! the interval.

use std::sync::Arc;
use std::time::Duration;

use futures_util::Stream;
use futures_util::stream;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use presence_common::error::TickError;
use presence_common::network::host::Roster;
use presence_common::scanning::{NetworkScanner, ScanRequest};

use crate::engine::{self, EngineStatus};
use crate::gate;
use crate::hub::BroadcastHub;
use crate::normalize;
use crate::system::LocalIdentity;

/// Outcome of one scheduler iteration.
#[derive(Debug)]
pub enum Tick {
    /// Nobody was listening, so no discovery ran.
    Idle,
    /// Discovery ran but produced no usable roster.
    Skipped(TickError),
    Roster(Roster),
}

/// Start/end bookkeeping for the previous discovery attempt.
#[derive(Debug, Clone)]
pub struct Cadence {
    interval: Duration,
    last_start: Option<Instant>,
    last_end: Option<Instant>,
}

impl Cadence {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_start: None,
            last_end: None,
        }
    }

    /// Treats an attempt that began at `start` as the previous one.
    pub fn resume_from(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last_start: Some(start),
            last_end: None,
        }
    }

    /// How long to wait at `now` before the next attempt may start.
    pub fn wait_before_next(&self, now: Instant) -> Duration {
        match self.last_start {
            Some(start) => self
                .interval
                .saturating_sub(now.saturating_duration_since(start)),
            None => Duration::ZERO,
        }
    }

    pub fn begin(&mut self, now: Instant) {
        self.last_start = Some(now);
        self.last_end = None;
    }

    pub fn finish(&mut self, now: Instant) {
        self.last_end = Some(now);
    }

    /// Forgets the previous attempt after an idle interval has already been waited out.
    pub fn idle(&mut self) {
        self.last_start = None;
        self.last_end = None;
    }

    /// Duration of the last completed attempt.
    pub fn last_duration(&self) -> Option<Duration> {
        match (self.last_start, self.last_end) {
            (Some(start), Some(end)) => Some(end.saturating_duration_since(start)),
            _ => None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

pub struct Scheduler {
    cadence: Cadence,
    request: ScanRequest,
    scanner: Arc<dyn NetworkScanner>,
    identity: LocalIdentity,
    hub: Arc<BroadcastHub>,
    forwarding: bool,
    status: watch::Receiver<EngineStatus>,
    ticks: u64,
}

impl Scheduler {
    pub fn new(
        cadence: Cadence,
        scanner: Arc<dyn NetworkScanner>,
        identity: LocalIdentity,
        hub: Arc<BroadcastHub>,
        forwarding: bool,
        status: watch::Receiver<EngineStatus>,
    ) -> Self {
        Self {
            cadence,
            request: ScanRequest::new(identity.interface()),
            scanner,
            identity,
            hub,
            forwarding,
            status,
            ticks: 0,
        }
    }

    /// Runs one iteration. Returns `None` once the engine stops running; an
    /// attempt that already started is always allowed to finish first.
    pub async fn next_tick(&mut self) -> Option<Tick> {
        if !self.is_running() {
            return None;
        }

        if !gate::should_discover(self.hub.subscriber_count(), self.forwarding) {
            self.cadence.idle();
            if !self.pause(self.cadence.interval()).await {
                return None;
            }
            return Some(Tick::Idle);
        }

        let wait = self.cadence.wait_before_next(Instant::now());
        if !self.pause(wait).await {
            return None;
        }

        self.ticks += 1;
        self.cadence.begin(Instant::now());
        let attempt = self.attempt().await;
        self.cadence.finish(Instant::now());

        debug!(
            tick = self.ticks,
            elapsed_ms = self.cadence.last_duration().unwrap_or_default().as_millis() as u64,
            "discovery attempt finished"
        );

        match attempt {
            Ok(roster) => Some(Tick::Roster(roster)),
            Err(e) => {
                warn!(tick = self.ticks, error = %e, "tick skipped");
                Some(Tick::Skipped(e))
            }
        }
    }

    /// The scheduler as a lazy, unbounded stream of ticks.
    pub fn into_stream(self) -> impl Stream<Item = Tick> + Send {
        stream::unfold(self, |mut scheduler| async move {
            let tick = scheduler.next_tick().await?;
            Some((tick, scheduler))
        })
    }

    async fn attempt(&self) -> Result<Roster, TickError> {
        let hosts = self.scanner.scan(&self.request).await?;
        let local = self.identity.host_record()?;
        Ok(normalize::normalize(hosts, local)?)
    }

    /// Sleeps for `duration` unless the engine halts first. Returns whether
    /// the engine is still running afterwards.
    async fn pause(&mut self, duration: Duration) -> bool {
        if !duration.is_zero() {
            let halted = tokio::select! {
                _ = tokio::time::sleep(duration) => false,
                _ = engine::wait_until_halted(&mut self.status) => true,
            };
            if halted {
                return false;
            }
        }
        self.is_running()
    }

    fn is_running(&self) -> bool {
        self.status.borrow().is_running()
    }
}
