//! Lifecycle event fan-out
//!
//! Every subscriber gets its own queue, so each one sees every event. The
//! client's own backlog is bounded and drops its oldest entry when full.

use crate::client::ClientEvent;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::trace;

/// Events kept for the client's own `recv_event*` calls
pub const EVENT_BACKLOG: usize = 64;

pub(crate) struct EventBus {
    subscribers: Mutex<Vec<Sender<ClientEvent>>>,
    backlog_tx: Sender<ClientEvent>,
    backlog_rx: Receiver<ClientEvent>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self::with_backlog(EVENT_BACKLOG)
    }

    pub(crate) fn with_backlog(capacity: usize) -> Self {
        let (backlog_tx, backlog_rx) = bounded(capacity.max(1));
        Self {
            subscribers: Mutex::new(Vec::new()),
            backlog_tx,
            backlog_rx,
        }
    }

    /// New receiver that sees every event published from now on
    ///
    /// Dropping the receiver unsubscribes it.
    pub(crate) fn subscribe(&self) -> Receiver<ClientEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Receiver over the bounded backlog
    pub(crate) fn backlog(&self) -> &Receiver<ClientEvent> {
        &self.backlog_rx
    }

    pub(crate) fn publish(&self, event: ClientEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());

        let mut pending = event;
        loop {
            match self.backlog_tx.try_send(pending) {
                Ok(()) => break,
                Err(TrySendError::Full(event)) => {
                    if let Ok(oldest) = self.backlog_rx.try_recv() {
                        trace!("Backlog full, dropping {:?}", oldest);
                    }
                    pending = event;
                }
                Err(TrySendError::Disconnected(_)) => break,
            }
        }
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn reconnecting(attempt: u32) -> ClientEvent {
        ClientEvent::Reconnecting {
            attempt,
            delay: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_every_subscriber_sees_every_event() {
        let bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.publish(ClientEvent::Disconnected);
        bus.publish(ClientEvent::Reconnected);

        for rx in [&a, &b] {
            assert_eq!(rx.try_recv().unwrap(), ClientEvent::Disconnected);
            assert_eq!(rx.try_recv().unwrap(), ClientEvent::Reconnected);
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(ClientEvent::Connected);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv().unwrap(), ClientEvent::Connected);
    }

    #[test]
    fn test_backlog_keeps_newest_events_only() {
        let bus = EventBus::with_backlog(4);

        for attempt in 1..=100 {
            bus.publish(reconnecting(attempt));
        }

        let kept: Vec<_> = bus.backlog().try_iter().collect();
        assert_eq!(kept, (97..=100).map(reconnecting).collect::<Vec<_>>());
    }

    #[test]
    fn test_subscriber_misses_events_before_subscribing() {
        let bus = EventBus::new();
        bus.publish(ClientEvent::Connected);

        let late = bus.subscribe();
        bus.publish(ClientEvent::Disconnected);

        assert_eq!(late.try_recv().unwrap(), ClientEvent::Disconnected);
        assert!(late.try_recv().is_err());
    }
}
