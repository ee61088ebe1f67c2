//! WebSocket transport for the presence engine.
//!
//! Every connection to `/presence` becomes a hub subscriber and receives
//! `{"event":"presenceAll","data":[...]}` frames. When the engine halts, all
//! sockets are closed and the listener stops accepting connections.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use futures_util::StreamExt;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};

use presence_common::network::host::{HostRecord, Roster};
use presence_core::engine::TickerEngine;

pub const PRESENCE_EVENT: &str = "presenceAll";
const SUBSCRIBER_BUFFER: usize = 8;

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Serialize)]
struct PresenceMessage<'a> {
    event: &'static str,
    data: &'a [HostRecord],
}

pub fn router(engine: Arc<TickerEngine>) -> Router {
    Router::new()
        .route("/presence", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(engine)
}

pub async fn serve(listener: TcpListener, engine: Arc<TickerEngine>) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "presence server listening");

    let halted = Arc::clone(&engine);
    axum::serve(listener, router(engine))
        .with_graceful_shutdown(async move {
            halted.wait_halted().await;
            info!("presence server shutting down");
        })
        .await
}

async fn ws_handler(ws: WebSocketUpgrade, State(engine): State<Arc<TickerEngine>>) -> Response {
    if engine.status().is_halted() {
        return (StatusCode::SERVICE_UNAVAILABLE, "presence engine unavailable").into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, engine))
}

async fn health_handler(State(engine): State<Arc<TickerEngine>>) -> (StatusCode, &'static str) {
    if engine.status().is_halted() {
        (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE")
    } else {
        (StatusCode::OK, "OK")
    }
}

async fn handle_socket(mut socket: WebSocket, engine: Arc<TickerEngine>) {
    let client_id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
    let (tx, mut rx) = mpsc::channel::<Arc<Roster>>(SUBSCRIBER_BUFFER);

    if !engine.subscribe(client_id, tx) {
        let _ = socket.send(Message::Close(None)).await;
        return;
    }
    info!(client = client_id, "client connected");

    loop {
        tokio::select! {
            incoming = socket.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            roster = rx.recv() => {
                let Some(roster) = roster else { break };
                if !send_roster(&mut socket, &roster).await {
                    break;
                }
            }
            _ = engine.wait_halted() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }

    engine.unsubscribe(client_id);
    info!(client = client_id, "client disconnected");
}

/// Returns false once the socket can no longer be written to.
async fn send_roster(socket: &mut WebSocket, roster: &[HostRecord]) -> bool {
    match encode(roster) {
        Ok(text) => socket.send(Message::Text(text.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "failed to encode roster");
            true
        }
    }
}

fn encode(roster: &[HostRecord]) -> serde_json::Result<String> {
    serde_json::to_string(&PresenceMessage {
        event: PRESENCE_EVENT,
        data: roster,
    })
}
