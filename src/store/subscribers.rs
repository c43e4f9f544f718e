use super::options::Overflow;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

enum Sink<S> {
    Queue {
        tx: mpsc::Sender<S>,
        overflow: Overflow,
    },
    Latest(watch::Sender<S>),
}

/// One registered sink and whether it still has a receiver.
pub(crate) struct Subscriber<S> {
    id: usize,
    sink: Sink<S>,
    active: AtomicBool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Sent,
    Dropped,
    Closed,
    Cancelled,
}

impl<S: Send + Sync + 'static> Subscriber<S> {
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    async fn deliver(&self, state: S, token: &CancellationToken) -> Delivery {
        let (tx, overflow) = match &self.sink {
            Sink::Latest(tx) => {
                return match tx.send(state) {
                    Ok(()) => Delivery::Sent,
                    Err(_) => Delivery::Closed,
                };
            }
            Sink::Queue { tx, overflow } => (tx, *overflow),
        };

        match overflow {
            Overflow::DropNewest => match tx.try_send(state) {
                Ok(()) => Delivery::Sent,
                Err(TrySendError::Full(_)) => Delivery::Dropped,
                Err(TrySendError::Closed(_)) => Delivery::Closed,
            },
            Overflow::Block => tokio::select! {
                biased;
                _ = token.cancelled() => Delivery::Cancelled,
                sent = tx.send(state) => match sent {
                    Ok(()) => Delivery::Sent,
                    Err(_) => Delivery::Closed,
                },
            },
            Overflow::Timeout(limit) => tokio::select! {
                biased;
                _ = token.cancelled() => Delivery::Cancelled,
                sent = tokio::time::timeout(limit, tx.send(state)) => match sent {
                    Ok(Ok(())) => Delivery::Sent,
                    Ok(Err(_)) => Delivery::Closed,
                    Err(_) => Delivery::Dropped,
                },
            },
        }
    }
}

/// Tally of one fan-out pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FanOut {
    pub(crate) delivered: usize,
    pub(crate) dropped: usize,
    pub(crate) closed: usize,
    pub(crate) cancelled: bool,
}

/// Ordered, append-only set of subscribers.
pub(crate) struct SubscriberRegistry<S> {
    subscribers: RwLock<Vec<Arc<Subscriber<S>>>>,
    next_id: AtomicUsize,
}

impl<S: Clone + Send + Sync + 'static> SubscriberRegistry<S> {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicUsize::new(0),
        }
    }

    pub(crate) fn register_queue(&self, tx: mpsc::Sender<S>, overflow: Overflow) -> usize {
        self.register(Sink::Queue { tx, overflow })
    }

    pub(crate) fn register_latest(&self, tx: watch::Sender<S>) -> usize {
        self.register(Sink::Latest(tx))
    }

    fn register(&self, sink: Sink<S>) -> usize {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().push(Arc::new(Subscriber {
            id,
            sink,
            active: AtomicBool::new(true),
        }));
        debug!(subscriber = id, "registered subscriber");
        id
    }

    /// Active subscribers in registration order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<Subscriber<S>>> {
        self.subscribers
            .read()
            .iter()
            .filter(|s| s.is_active())
            .cloned()
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    pub(crate) fn active(&self) -> usize {
        self.subscribers.read().iter().filter(|s| s.is_active()).count()
    }
}

/// Send `state` to each subscriber in order, stopping early on cancellation.
///
/// Sinks found closed are flipped to inactive and skipped from then on.
pub(crate) async fn fan_out<S: Clone + Send + Sync + 'static>(
    subscribers: &[Arc<Subscriber<S>>],
    state: &S,
    token: &CancellationToken,
) -> FanOut {
    let mut tally = FanOut::default();
    for subscriber in subscribers {
        if !subscriber.is_active() {
            continue;
        }
        match subscriber.deliver(state.clone(), token).await {
            Delivery::Sent => tally.delivered += 1,
            Delivery::Dropped => {
                tally.dropped += 1;
                warn!(subscriber = subscriber.id, "subscriber buffer full, notification dropped");
            }
            Delivery::Closed => {
                tally.closed += 1;
                subscriber.active.store(false, Ordering::Release);
                debug!(subscriber = subscriber.id, "subscriber closed, marking inactive");
            }
            Delivery::Cancelled => {
                tally.cancelled = true;
                break;
            }
        }
    }
    tally
}
