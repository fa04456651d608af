//! Event multiplexer
//!
//! # Architecture
//!
//! ```text
//! client task ──frames──> crossbeam channel ──> dispatcher thread
//!                                                  │ decode
//!                                                  ├─> Topic::Event(name) handlers
//!                                                  └─> Topic::All handlers
//!
//! Both handler lists run in registration order.
//! ```
//!
//! # Guarantees
//!
//! - Frames are dispatched one at a time, in wire order
//! - Every matching handler runs before the next frame is decoded
//! - The handler list is snapshotted per frame, so `on`/`off` calls made
//!   from inside a handler take effect from the next frame
//! - A decode failure, a handler error or a handler panic is logged and
//!   contained

use crate::traits::*;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Which events a listener is interested in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic<N> {
    /// A single event name
    Event(N),
    /// Every successfully decoded event
    All,
}

/// Handle identifying one subscription
///
/// Returned by [`Listeners::on`] and required by [`Listeners::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Listener callback
///
/// Returning `Err` is logged; it does not affect other listeners.
pub type EventHandler<E> = Arc<dyn Fn(&E) -> Result<()> + Send + Sync>;

struct Subscription<E> {
    id: ListenerId,
    handler: EventHandler<E>,
}

impl<E> Clone for Subscription<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: Arc::clone(&self.handler),
        }
    }
}

struct Registry<E: InboundEvent> {
    by_name: HashMap<E::Name, Vec<Subscription<E>>>,
    all: Vec<Subscription<E>>,
}

impl<E: InboundEvent> Registry<E> {
    fn list_mut(&mut self, topic: Topic<E::Name>) -> &mut Vec<Subscription<E>> {
        match topic {
            Topic::Event(name) => self.by_name.entry(name).or_default(),
            Topic::All => &mut self.all,
        }
    }

    fn snapshot(&self, name: E::Name) -> Vec<Subscription<E>> {
        let specific = self.by_name.get(&name).map(Vec::as_slice).unwrap_or(&[]);
        specific.iter().chain(self.all.iter()).cloned().collect()
    }
}

/// Registry of event listeners, shared by every clone
pub struct Listeners<E: InboundEvent> {
    registry: Arc<RwLock<Registry<E>>>,
    next_id: Arc<AtomicU64>,
}

impl<E: InboundEvent> Clone for Listeners<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<E: InboundEvent> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: InboundEvent> Listeners<E> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry {
                by_name: HashMap::new(),
                all: Vec::new(),
            })),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Subscribe a handler to a topic
    pub fn on<F>(&self, topic: Topic<E::Name>, handler: F) -> ListenerId
    where
        F: Fn(&E) -> Result<()> + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.registry.write().list_mut(topic).push(Subscription {
            id,
            handler: Arc::new(handler),
        });
        debug!("Listener {:?} subscribed to {:?}", id, topic);
        id
    }

    /// Remove the subscription matching both `topic` and `id`
    ///
    /// Returns `false` (and does nothing) when no such subscription exists.
    pub fn off(&self, topic: Topic<E::Name>, id: ListenerId) -> bool {
        let mut registry = self.registry.write();
        let list = match topic {
            Topic::Event(name) => match registry.by_name.get_mut(&name) {
                Some(list) => list,
                None => return false,
            },
            Topic::All => &mut registry.all,
        };

        match list.iter().position(|sub| sub.id == id) {
            Some(index) => {
                list.remove(index);
                debug!("Listener {:?} unsubscribed from {:?}", id, topic);
                true
            }
            None => false,
        }
    }

    /// Number of listeners subscribed to exactly this topic
    pub fn listener_count(&self, topic: Topic<E::Name>) -> usize {
        let registry = self.registry.read();
        match topic {
            Topic::Event(name) => registry.by_name.get(&name).map_or(0, Vec::len),
            Topic::All => registry.all.len(),
        }
    }

    /// Decode a raw frame and dispatch it
    ///
    /// Returns the number of handlers invoked; `0` when decoding failed.
    pub fn dispatch_frame(&self, frame: &WsMessage) -> usize {
        match E::decode(frame) {
            Ok(event) => self.dispatch(&event),
            Err(e) => {
                warn!("Dropping undecodable frame: {}", e);
                0
            }
        }
    }

    /// Dispatch an already decoded event
    pub fn dispatch(&self, event: &E) -> usize {
        let name = event.name();
        // Snapshot before invoking so handlers can call on/off freely
        let subscriptions = self.registry.read().snapshot(name);

        for sub in &subscriptions {
            match catch_unwind(AssertUnwindSafe(|| (sub.handler)(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!("Listener {:?} failed for {:?}: {}", sub.id, name, e);
                }
                Err(_) => {
                    error!("Listener {:?} panicked for {:?}", sub.id, name);
                }
            }
        }

        subscriptions.len()
    }
}

/// Spawn the dispatcher thread
///
/// Runs until the frame channel is closed or the shutdown flag turns
/// false.
pub(crate) fn spawn_dispatcher<E: InboundEvent>(
    listeners: Listeners<E>,
    frames: Receiver<WsMessage>,
    shutdown_flag: Arc<AtomicBool>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("autosocket-dispatch".into())
        .spawn(move || loop {
            match frames.recv_timeout(Duration::from_millis(50)) {
                Ok(frame) => {
                    listeners.dispatch_frame(&frame);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if !shutdown_flag.load(Ordering::Acquire) {
                        debug!("Shutdown flag detected, dispatcher thread exiting");
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Frame channel closed, dispatcher thread exiting");
                    break;
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Name {
        Added,
        Deleted,
    }

    #[derive(Debug)]
    struct Ev(Name);

    impl InboundEvent for Ev {
        type Name = Name;

        fn decode(message: &WsMessage) -> Result<Self> {
            match message.as_text() {
                Some("added") => Ok(Ev(Name::Added)),
                Some("deleted") => Ok(Ev(Name::Deleted)),
                other => Err(SocketError::Decode(format!("unknown frame {:?}", other))),
            }
        }

        fn name(&self) -> Name {
            self.0
        }
    }

    #[test]
    fn test_specific_before_all() {
        let listeners = Listeners::<Ev>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let l = Arc::clone(&log);
        listeners.on(Topic::All, move |_| {
            l.lock().push("all");
            Ok(())
        });
        let l = Arc::clone(&log);
        listeners.on(Topic::Event(Name::Added), move |_| {
            l.lock().push("added");
            Ok(())
        });

        assert_eq!(listeners.dispatch_frame(&"added".into()), 2);
        assert_eq!(*log.lock(), vec!["added", "all"]);
    }

    #[test]
    fn test_off_requires_matching_topic() {
        let listeners = Listeners::<Ev>::new();
        let id = listeners.on(Topic::Event(Name::Added), |_| Ok(()));

        assert!(!listeners.off(Topic::Event(Name::Deleted), id));
        assert!(!listeners.off(Topic::All, id));
        assert!(listeners.off(Topic::Event(Name::Added), id));
        assert!(!listeners.off(Topic::Event(Name::Added), id));
    }

    #[test]
    fn test_decode_failure_invokes_nothing() {
        let listeners = Listeners::<Ev>::new();
        listeners.on(Topic::All, |_| panic!("must not run"));
        assert_eq!(listeners.dispatch_frame(&"garbage".into()), 0);
    }
}
