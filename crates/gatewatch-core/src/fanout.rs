// ── Bounded fan-out ──
//
// One broadcast ring per monitor. Every collaborator gets its own
// receiver, so each has an independent bounded queue: a receiver that
// falls behind loses its oldest items and the loss is counted. Publishing
// never waits on a consumer.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

#[derive(Debug)]
pub struct FanOut<T> {
    sender: broadcast::Sender<T>,
    dropped: Arc<AtomicU64>,
}

impl<T: Clone> FanOut<T> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Hand `item` to every subscriber. Never blocks.
    pub fn publish(&self, item: T) {
        // An error only means nobody is subscribed.
        let _ = self.sender.send(item);
    }

    /// A named consumer whose overflow is counted.
    pub fn subscribe(&self, name: impl Into<String>) -> Subscriber<T> {
        Subscriber {
            name: name.into(),
            rx: self.sender.subscribe(),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// A plain receiver for ad-hoc observers (e.g. the `watch` command).
    pub fn receiver(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }

    /// Items dropped across all named subscribers.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn dropped_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped)
    }
}

#[derive(Debug)]
pub struct Subscriber<T> {
    name: String,
    rx: broadcast::Receiver<T>,
    dropped: Arc<AtomicU64>,
}

impl<T: Clone> Subscriber<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Next item, or `None` once the publisher is gone. Overflow is
    /// counted and skipped.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.rx.recv().await {
                Ok(item) => return Some(item),
                Err(RecvError::Lagged(missed)) => {
                    self.dropped.fetch_add(missed, Ordering::Relaxed);
                    warn!(consumer = %self.name, missed, "consumer fell behind, dropped oldest items");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_consumer_drops_oldest_and_counts() {
        let fanout = FanOut::new(2);
        let mut fast = fanout.subscribe("fast");
        let mut slow = fanout.subscribe("slow");

        fanout.publish(1);
        assert_eq!(fast.recv().await, Some(1));

        fanout.publish(2);
        fanout.publish(3);
        fanout.publish(4);

        // `slow` lost 1 and 2; the newest two survive.
        assert_eq!(slow.recv().await, Some(3));
        assert_eq!(slow.recv().await, Some(4));
        assert_eq!(fanout.dropped(), 2);

        // `fast` lost 2 on its own queue.
        assert_eq!(fast.recv().await, Some(3));
        assert_eq!(fanout.dropped(), 3);
    }

    #[tokio::test]
    async fn closed_publisher_ends_stream() {
        let fanout = FanOut::new(4);
        let mut sub = fanout.subscribe("repo");
        fanout.publish("x");
        drop(fanout);
        assert_eq!(sub.recv().await, Some("x"));
        assert_eq!(sub.recv().await, None);
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let fanout = FanOut::new(1);
        fanout.publish(42_u8);
        assert_eq!(fanout.dropped(), 0);
    }
}
