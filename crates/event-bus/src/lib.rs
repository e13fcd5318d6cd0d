#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

#[derive(Debug, Error, Clone)]
pub enum EventBusError {
    #[error("no subscriber is listening")]
    NoSubscribers,
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

/// Simple in-memory bus: the Step Orchestrator publishes `ExecutionEvent`s
/// here, the Learning Engine subscribes and batches them into knowledge-base
/// updates and pattern mining passes.
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
    async fn publish(&self, event: E) -> Result<(), EventBusError> {
        self.sender.send(event).map(|_| ()).map_err(|_| EventBusError::NoSubscribers)
    }

    fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }
}

/// Materializes an mpsc receiver from a bus subscription so callers can await
/// events without handling broadcast lag/closed semantics directly.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Ping(u32);

    #[tokio::test]
    async fn publish_delivers_to_subscriber() {
        let bus = InMemoryBus::<Ping>::new(8);
        let mut rx = bus.subscribe();
        bus.publish(Ping(1)).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), Ping(1));
    }

    #[tokio::test]
    async fn publish_without_subscribers_errors() {
        let bus = InMemoryBus::<Ping>::new(8);
        let err = bus.publish(Ping(1)).await.unwrap_err();
        assert!(matches!(err, EventBusError::NoSubscribers));
    }
}
