//! # Broadcast Hub
//!
//! Registry of live subscribers keyed by connection id. Each publish takes a
//! snapshot of the registry, so a subscriber added mid-publish may or may not
//! receive that roster. Delivery is at-most-once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use presence_common::network::host::Roster;

pub type ConnectionId = u64;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberDeliveryError {
    /// The receiving side is gone. The subscriber is removed.
    #[error("subscriber channel is closed")]
    Closed,
    /// The subscriber has not consumed earlier rosters. This roster is dropped for it.
    #[error("subscriber is lagging behind")]
    Lagging,
}

/// Something that can receive rosters without blocking the publisher.
pub trait Subscriber: Send + Sync {
    fn deliver(&self, roster: Arc<Roster>) -> Result<(), SubscriberDeliveryError>;
}

impl Subscriber for mpsc::Sender<Arc<Roster>> {
    fn deliver(&self, roster: Arc<Roster>) -> Result<(), SubscriberDeliveryError> {
        self.try_send(roster).map_err(|e| match e {
            TrySendError::Full(_) => SubscriberDeliveryError::Lagging,
            TrySendError::Closed(_) => SubscriberDeliveryError::Closed,
        })
    }
}

impl Subscriber for mpsc::UnboundedSender<Arc<Roster>> {
    fn deliver(&self, roster: Arc<Roster>) -> Result<(), SubscriberDeliveryError> {
        self.send(roster).map_err(|_| SubscriberDeliveryError::Closed)
    }
}

#[derive(Default)]
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<ConnectionId, Arc<dyn Subscriber>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `subscriber` under `id`, replacing any previous handle for that id.
    pub fn subscribe(&self, id: ConnectionId, subscriber: impl Subscriber + 'static) {
        self.lock().insert(id, Arc::new(subscriber));
        debug!(subscriber = id, "subscriber added");
    }

    /// Removes `id`. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: ConnectionId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            debug!(subscriber = id, "subscriber removed");
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Delivers `roster` to every subscriber registered when the call begins
    /// and returns how many accepted it. Closed subscribers are dropped.
    pub fn publish(&self, roster: Arc<Roster>) -> usize {
        let snapshot: Vec<(ConnectionId, Arc<dyn Subscriber>)> = self
            .lock()
            .iter()
            .map(|(id, subscriber)| (*id, Arc::clone(subscriber)))
            .collect();

        let mut delivered = 0;
        let mut closed: Vec<(ConnectionId, Arc<dyn Subscriber>)> = Vec::new();

        for (id, subscriber) in snapshot {
            match subscriber.deliver(Arc::clone(&roster)) {
                Ok(()) => delivered += 1,
                Err(SubscriberDeliveryError::Lagging) => {
                    warn!(subscriber = id, "subscriber lagging, roster dropped");
                }
                Err(SubscriberDeliveryError::Closed) => closed.push((id, subscriber)),
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self.lock();
            for (id, handle) in closed {
                // Only drop the handle that failed; the id may have been re-registered.
                let same_handle = subscribers
                    .get(&id)
                    .is_some_and(|current| Arc::ptr_eq(current, &handle));
                if same_handle {
                    subscribers.remove(&id);
                    debug!(subscriber = id, "closed subscriber removed");
                }
            }
        }

        delivered
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, Arc<dyn Subscriber>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
