use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use presence_common::error::DiscoveryError;
use presence_common::network::host::{RawHost, Roster};
use presence_common::scanning::{NetworkScanner, ScanRequest};
use presence_core::engine::{EngineError, EngineStatus, TickerEngine};

use crate::utils::{self, FixedSystem, ScriptedScanner};

/// Answers the startup probe, then panics inside the tick loop.
struct PanicsAfterProbe {
    calls: AtomicUsize,
}

#[async_trait]
impl NetworkScanner for PanicsAfterProbe {
    async fn scan(&self, _request: &ScanRequest) -> Result<Vec<RawHost>, DiscoveryError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            panic!("scanner state corrupted");
        }
        Ok(utils::neighbour())
    }
}

#[tokio::test(start_paused = true)]
async fn startup_probe_failure_fails_engine_once() {
    let scanner = Arc::new(ScriptedScanner::new(utils::neighbour()).failing_on(&[0]));
    let engine = utils::engine(utils::options(), Arc::clone(&scanner));
    let mut status = engine.subscribe_status();

    assert!(matches!(engine.start().await, Err(EngineError::Startup(_))));
    assert_eq!(*status.borrow_and_update(), EngineStatus::Failed);
    engine.wait_failed().await;

    let (tx, _rx) = mpsc::channel::<Arc<Roster>>(1);
    assert!(!engine.subscribe(1, tx));
    assert!(matches!(
        engine.start().await,
        Err(EngineError::InvalidState(EngineStatus::Failed))
    ));
    engine.stop();

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(!status.has_changed().unwrap(), "failure must be signalled exactly once");
    assert_eq!(scanner.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_lets_in_flight_attempt_finish() {
    let scanner = Arc::new(
        ScriptedScanner::new(utils::neighbour()).with_latency(Duration::from_millis(500)),
    );
    let engine = utils::engine(utils::options(), Arc::clone(&scanner));
    let (tx, mut rx) = mpsc::channel::<Arc<Roster>>(4);
    engine.subscribe(1, tx);
    engine.start().await.unwrap();

    // Probe ran for 500ms; tick 1 starts 1s after the probe and is in flight now.
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(scanner.calls(), 2);
    engine.stop();
    engine.join().await;

    assert_eq!(engine.status(), EngineStatus::Stopped);
    assert!(rx.try_recv().is_ok(), "in-flight roster should still be published");

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(scanner.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn stop_interrupts_waiting_between_ticks() {
    let scanner = Arc::new(ScriptedScanner::new(utils::neighbour()));
    let engine = utils::engine(utils::options().with_tick_interval(Duration::from_secs(60)), Arc::clone(&scanner));
    engine.start().await.unwrap();

    engine.stop();
    tokio::time::timeout(Duration::from_secs(1), engine.join())
        .await
        .expect("tick loop should exit without waiting out the interval");
    engine.wait_halted().await;
}

#[tokio::test(start_paused = true)]
async fn engine_cannot_be_restarted() {
    let scanner = Arc::new(ScriptedScanner::new(utils::neighbour()));
    let engine = utils::engine(utils::options(), scanner);
    engine.start().await.unwrap();
    assert_eq!(engine.status(), EngineStatus::Running);

    assert!(matches!(
        engine.start().await,
        Err(EngineError::InvalidState(EngineStatus::Running))
    ));

    engine.stop();
    engine.join().await;
    assert!(matches!(
        engine.start().await,
        Err(EngineError::InvalidState(EngineStatus::Stopped))
    ));
}

#[tokio::test(start_paused = true)]
async fn tick_loop_crash_fails_running_engine() {
    let scanner = Arc::new(PanicsAfterProbe {
        calls: AtomicUsize::new(0),
    });
    let engine = TickerEngine::new(
        utils::options(),
        scanner.clone(),
        Arc::new(FixedSystem::lan()),
    )
    .unwrap();
    let (tx, _rx) = mpsc::channel::<Arc<Roster>>(4);
    assert!(engine.subscribe(1, tx));

    engine.start().await.unwrap();
    assert_eq!(engine.status(), EngineStatus::Running);

    tokio::time::timeout(Duration::from_secs(5), engine.wait_failed())
        .await
        .expect("engine should fail once the tick loop dies");
    assert_eq!(engine.status(), EngineStatus::Failed);
    assert_eq!(scanner.calls.load(Ordering::SeqCst), 2);

    let (late_tx, _late_rx) = mpsc::channel::<Arc<Roster>>(4);
    assert!(!engine.subscribe(2, late_tx));
    engine.join().await;
}
