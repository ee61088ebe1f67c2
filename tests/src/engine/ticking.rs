use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use url::Url;

use presence_common::network::host::Roster;
use presence_core::engine::EngineStatus;

use crate::utils::{self, ScriptedScanner};

#[tokio::test(start_paused = true)]
async fn subscriber_receives_sorted_uppercase_roster() {
    let scanner = Arc::new(ScriptedScanner::new(utils::neighbour()));
    let engine = utils::engine(utils::options(), Arc::clone(&scanner));
    let (tx, mut rx) = mpsc::channel::<Arc<Roster>>(4);
    assert!(engine.subscribe(1, tx));

    engine.start().await.unwrap();
    let roster = rx.recv().await.unwrap();

    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0].ip, Ipv4Addr::new(192, 168, 1, 2));
    assert_eq!(roster[0].mac, "11:22:33:44:55:66");
    assert_eq!(roster[0].vendor, "presence-host");
    assert_eq!(roster[1].ip, Ipv4Addr::new(192, 168, 1, 5));
    assert_eq!(roster[1].mac, "AA:BB:CC:DD:EE:FF");

    engine.stop();
    engine.join().await;
    assert_eq!(engine.status(), EngineStatus::Stopped);
}

#[tokio::test(start_paused = true)]
async fn failed_tick_does_not_disturb_later_ticks() {
    let scanner = Arc::new(ScriptedScanner::new(utils::neighbour()).failing_on(&[5]));
    let engine = utils::engine(utils::options(), Arc::clone(&scanner));
    let (tx, mut rx) = mpsc::channel::<Arc<Roster>>(16);
    engine.subscribe(1, tx);
    engine.start().await.unwrap();

    let mut rosters = Vec::new();
    for _ in 0..5 {
        rosters.push(rx.recv().await.unwrap());
        assert_eq!(engine.status(), EngineStatus::Running);
    }

    // Ticks 1-4 and 6 published; tick 5 was skipped.
    assert!(scanner.calls() >= 6);
    assert_eq!(utils::strip(&rosters[3]), utils::strip(&rosters[4]));
    assert_eq!(utils::strip(&rosters[0]), utils::strip(&rosters[4]));

    engine.stop();
    engine.join().await;
}

#[tokio::test]
async fn forwarding_endpoint_alone_keeps_scanning() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let options = utils::options()
        .with_tick_interval(Duration::from_millis(50))
        .with_forward_timeout(Duration::from_millis(200))
        .with_forward_endpoint(Some(Url::parse(&format!("http://{addr}/roster")).unwrap()));
    let scanner = Arc::new(ScriptedScanner::new(utils::neighbour()));
    let engine = utils::engine(options, Arc::clone(&scanner));
    engine.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(scanner.calls() >= 2, "forwarding sink failures must not stop ticking");
    assert_eq!(engine.status(), EngineStatus::Running);

    engine.stop();
    engine.join().await;
}
