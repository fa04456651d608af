//! Integration tests for the event multiplexer
//!
//! These tests drive a listener registry directly with raw frames, the way
//! the dispatcher thread does.

mod common;

use autosocket::{Listeners, SocketError, Topic, WsMessage};
use common::{added_frame, deleted_frame, TestEvent, TestEventName};
use parking_lot::Mutex;
use std::sync::Arc;

/// Macro for verbose test output
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

fn frame(text: String) -> WsMessage {
    WsMessage::Text(text)
}

type BoxedHandler = Box<dyn Fn(&TestEvent) -> autosocket::Result<()> + Send + Sync>;

fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&'static str) -> BoxedHandler) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let log_clone = Arc::clone(&log);
    let make = move |label: &'static str| {
        let log = Arc::clone(&log_clone);
        Box::new(move |_: &TestEvent| {
            log.lock().push(label.to_string());
            Ok(())
        }) as BoxedHandler
    };
    (log, make)
}

#[test]
fn test_specific_listeners_run_before_all() {
    verbose_println!("Testing dispatch order...");

    let listeners: Listeners<TestEvent> = Listeners::new();
    let (log, make) = recorder();

    // Subscribe the wildcard first; it must still run last
    listeners.on(Topic::All, make("all"));
    listeners.on(Topic::Event(TestEventName::Added), make("added-1"));
    listeners.on(Topic::Event(TestEventName::Added), make("added-2"));
    listeners.on(Topic::Event(TestEventName::Deleted), make("deleted"));

    let invoked = listeners.dispatch_frame(&frame(added_frame("u1")));

    verbose_println!("  Log: {:?}", log.lock());
    assert_eq!(invoked, 3);
    assert_eq!(*log.lock(), vec!["added-1", "added-2", "all"]);
}

#[test]
fn test_all_listener_sees_every_event() {
    let listeners: Listeners<TestEvent> = Listeners::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let seen_clone = Arc::clone(&seen);
    listeners.on(Topic::All, move |event| {
        seen_clone.lock().push(event.clone());
        Ok(())
    });

    listeners.dispatch_frame(&frame(added_frame("a")));
    listeners.dispatch_frame(&frame(deleted_frame("b")));

    assert_eq!(
        *seen.lock(),
        vec![
            TestEvent::Added { id: "a".into() },
            TestEvent::Deleted { id: "b".into() },
        ]
    );
}

#[test]
fn test_unsubscribe_during_own_invocation() {
    verbose_println!("Testing off() from inside a handler...");

    let listeners: Listeners<TestEvent> = Listeners::new();
    let calls = Arc::new(Mutex::new(0));
    let id_slot = Arc::new(Mutex::new(None));

    let registry = listeners.clone();
    let calls_clone = Arc::clone(&calls);
    let id_clone = Arc::clone(&id_slot);
    let id = listeners.on(Topic::Event(TestEventName::Added), move |_| {
        *calls_clone.lock() += 1;
        if let Some(id) = *id_clone.lock() {
            registry.off(Topic::Event(TestEventName::Added), id);
        }
        Ok(())
    });
    *id_slot.lock() = Some(id);

    listeners.dispatch_frame(&frame(added_frame("1")));
    listeners.dispatch_frame(&frame(added_frame("2")));

    assert_eq!(*calls.lock(), 1);
    assert_eq!(listeners.listener_count(Topic::Event(TestEventName::Added)), 0);
}

#[test]
fn test_subscribe_during_dispatch_applies_to_next_frame() {
    let listeners: Listeners<TestEvent> = Listeners::new();
    let (log, make) = recorder();
    let make = Arc::new(make);

    let registry = listeners.clone();
    let make_clone = Arc::clone(&make);
    let added_once = Arc::new(Mutex::new(false));
    listeners.on(Topic::Event(TestEventName::Added), move |_| {
        let mut added = added_once.lock();
        if !*added {
            registry.on(Topic::Event(TestEventName::Added), (*make_clone)("late"));
            *added = true;
        }
        Ok(())
    });

    assert_eq!(listeners.dispatch_frame(&frame(added_frame("1"))), 1);
    assert!(log.lock().is_empty());

    assert_eq!(listeners.dispatch_frame(&frame(added_frame("2"))), 2);
    assert_eq!(*log.lock(), vec!["late"]);
}

#[test]
fn test_off_requires_matching_topic() {
    let listeners: Listeners<TestEvent> = Listeners::new();
    let (_log, make) = recorder();

    let id = listeners.on(Topic::Event(TestEventName::Added), make("added"));

    assert!(!listeners.off(Topic::Event(TestEventName::Deleted), id));
    assert!(!listeners.off(Topic::All, id));
    assert_eq!(listeners.listener_count(Topic::Event(TestEventName::Added)), 1);

    assert!(listeners.off(Topic::Event(TestEventName::Added), id));
    // Second removal is a no-op
    assert!(!listeners.off(Topic::Event(TestEventName::Added), id));
}

#[test]
fn test_malformed_frames_are_dropped() {
    verbose_println!("Testing malformed frames...");

    let listeners: Listeners<TestEvent> = Listeners::new();
    let (log, make) = recorder();
    listeners.on(Topic::All, make("all"));

    for bad in [
        "not json".to_string(),
        r#"{"type":"UNKNOWN_EVENT","body":{}}"#.to_string(),
        r#"{"type":"ADDED","body":{"wrong":1}}"#.to_string(),
        r#"{"body":{"id":"x"}}"#.to_string(),
    ] {
        assert_eq!(listeners.dispatch_frame(&frame(bad)), 0);
    }
    assert_eq!(listeners.dispatch_frame(&WsMessage::Binary(vec![0xff, 0x00])), 0);

    // The registry keeps working afterwards
    assert_eq!(listeners.dispatch_frame(&frame(added_frame("ok"))), 1);
    assert_eq!(*log.lock(), vec!["all"]);
}

#[test]
fn test_failing_handlers_do_not_stop_dispatch() {
    verbose_println!("Testing handler isolation...");

    let listeners: Listeners<TestEvent> = Listeners::new();
    let (log, make) = recorder();

    listeners.on(Topic::Event(TestEventName::Added), |_| {
        Err(SocketError::Handler("boom".into()))
    });
    listeners.on(Topic::Event(TestEventName::Added), |_| panic!("handler panic"));
    listeners.on(Topic::Event(TestEventName::Added), make("survivor"));
    listeners.on(Topic::All, make("all"));

    let invoked = listeners.dispatch_frame(&frame(added_frame("1")));

    assert_eq!(invoked, 4);
    assert_eq!(*log.lock(), vec!["survivor", "all"]);
}
