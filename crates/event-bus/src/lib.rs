//! Event Bus (spec.md §4.9, component C9).
//!
//! A typed progress channel external subscribers (a dashboard, a file
//! logger) tap into. The bus guarantees at-least-once delivery within the
//! process and preserves per-session ordering (a single [`RunnerEvent`]
//! producer per session only ever publishes from that session's single
//! cooperative task, so ordering falls out of that, not out of the bus
//! itself). Cross-session ordering is explicitly not guaranteed (§5).

mod events;

pub use events::{Metrics, RunnerEvent, Via};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("failed to publish event: {0}")]
    Publish(String),
}

/// Trait implemented by payload types that can be carried on the bus.
pub trait Event: Clone + Send + Sync + std::fmt::Debug + 'static {}

impl<T> Event for T where T: Clone + Send + Sync + std::fmt::Debug + 'static {}

#[async_trait]
pub trait EventBus<E>: Send + Sync
where
    E: Event,
{
    async fn publish(&self, event: E) -> Result<(), EventBusError>;
    fn subscribe(&self) -> broadcast::Receiver<E>;
}

/// Simple in-memory bus suitable for unit tests and early integration.
pub struct InMemoryBus<E>
where
    E: Event,
{
    sender: broadcast::Sender<E>,
}

impl<E> InMemoryBus<E>
where
    E: Event,
{
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }
}

#[async_trait]
impl<E> EventBus<E> for InMemoryBus<E>
where
    E: Event,
{
    /// A publish with zero subscribers is not an error: a caller that
    /// publishes before anyone subscribes (or after the last subscriber
    /// dropped) must not fail the step it is reporting on. Callers that
    /// care about delivery should subscribe before the producer starts.
    async fn publish(&self, event: E) -> Result<(), EventBusError> {
        let _ = self.sender.send(event);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }
}

/// Helper to materialise an mpsc receiver from the bus subscription
/// so callers can await events without handling broadcast semantics directly.
pub fn to_mpsc<E>(bus: Arc<InMemoryBus<E>>, capacity: usize) -> mpsc::Receiver<E>
where
    E: Event,
{
    let mut rx = bus.subscribe();
    let (tx, out_rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(async move {
        while let Ok(ev) = rx.recv().await {
            if tx.send(ev).await.is_err() {
                break;
            }
        }
    });
    out_rx
}
