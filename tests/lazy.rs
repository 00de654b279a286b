use std::{
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier, Mutex,
    },
    thread,
    time::Duration,
};

use serial_test::serial;
use synchro::{
    error::{BoxError, SyncError},
    lazy::{LazyConnection, Singleton, Transport},
};

const CALLERS: usize = 16;

#[derive(Debug)]
struct Settings {
    id: usize,
    values: Vec<u64>,
}

static CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

static SETTINGS: Singleton<Settings> = Singleton::new(|| {
    let id = CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
    // Make racing first callers overlap with the construction.
    thread::sleep(Duration::from_millis(20));
    Settings {
        id,
        values: (0..1024).collect(),
    }
});

#[test]
#[serial]
fn singleton_constructed_exactly_once() {
    let barrier = Barrier::new(CALLERS);

    let instances = thread::scope(|s| {
        let handles = (0..CALLERS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    SETTINGS.get_instance().unwrap()
                })
            })
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    assert_eq!(CONSTRUCTIONS.load(Ordering::SeqCst), 1);
    assert!(SETTINGS.is_initialized());
    for instance in &instances {
        assert!(Arc::ptr_eq(instance, &instances[0]));
        // Fully constructed when observed.
        assert_eq!(instance.values.len(), 1024);
        assert_eq!(instance.id, 0);
    }
}

static FLAKY_ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

static FLAKY: Singleton<String> = Singleton::fallible(|| {
    if FLAKY_ATTEMPTS.fetch_add(1, Ordering::SeqCst) < 2 {
        Err(io::Error::new(io::ErrorKind::Other, "backend not ready").into())
    } else {
        Ok("ready".to_string())
    }
});

#[test]
#[serial]
fn failed_construction_is_reported_and_retried() {
    for _ in 0..2 {
        let err = FLAKY.get_instance().unwrap_err();
        assert!(matches!(err, SyncError::InitializationFailure(_)));
        assert_eq!(err.to_string(), "initialization failed: backend not ready");
        assert!(!FLAKY.is_initialized());
    }

    assert_eq!(*FLAKY.get_instance().unwrap(), "ready");
    assert_eq!(*FLAKY.get_instance().unwrap(), "ready");
    assert_eq!(FLAKY_ATTEMPTS.load(Ordering::SeqCst), 3);
}

static FIRST_FAILS_ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

static FIRST_FAILS: Singleton<Settings> = Singleton::fallible(|| {
    let attempt = FIRST_FAILS_ATTEMPTS.fetch_add(1, Ordering::SeqCst);
    // Keep the other first callers queued behind this attempt.
    thread::sleep(Duration::from_millis(20));
    if attempt == 0 {
        Err("backend not ready".into())
    } else {
        Ok(Settings {
            id: attempt,
            values: (0..1024).collect(),
        })
    }
});

#[test]
#[serial]
fn concurrent_first_callers_see_one_failure_then_one_instance() {
    let barrier = Barrier::new(CALLERS);

    let results = thread::scope(|s| {
        let handles = (0..CALLERS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    FIRST_FAILS.get_instance()
                })
            })
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });

    // Only the caller that ran the failing attempt sees the error.
    let (instances, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0],
        Err(SyncError::InitializationFailure(_))
    ));

    let instances = instances
        .into_iter()
        .map(Result::unwrap)
        .collect::<Vec<_>>();
    assert_eq!(instances.len(), CALLERS - 1);
    for instance in &instances {
        assert!(Arc::ptr_eq(instance, &instances[0]));
        assert_eq!(instance.id, 1);
    }

    assert_eq!(FIRST_FAILS_ATTEMPTS.load(Ordering::SeqCst), 2);
    assert!(Arc::ptr_eq(&FIRST_FAILS.get_instance().unwrap(), &instances[0]));
}

/// An in-memory echo server.
#[derive(Debug, Default)]
struct Echo {
    inbox: Mutex<Vec<String>>,
}

impl Transport for Echo {
    type Packet = String;

    fn send(&self, packet: String) -> Result<(), BoxError> {
        self.inbox.lock().unwrap().push(packet);
        Ok(())
    }

    fn receive(&self) -> Result<String, BoxError> {
        Ok(self
            .inbox
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| "hello".to_string()))
    }
}

#[test]
fn connection_established_once_by_any_operation() {
    let connects = AtomicUsize::new(0);
    let conn = LazyConnection::new(|| {
        connects.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        Ok::<_, io::Error>(Echo::default())
    });
    let barrier = Barrier::new(CALLERS);

    thread::scope(|s| {
        for i in 0..CALLERS {
            let (conn, barrier) = (&conn, &barrier);
            s.spawn(move || {
                barrier.wait();
                if i % 2 == 0 {
                    conn.send(format!("packet {i}")).unwrap();
                } else {
                    assert!(!conn.receive().unwrap().is_empty());
                }
            });
        }
    });

    assert_eq!(connects.load(Ordering::SeqCst), 1);
    assert!(conn.is_connected());
}

#[test]
fn connect_failure_reaches_the_triggering_caller() {
    let attempts = AtomicUsize::new(0);
    let conn = LazyConnection::new(|| {
        if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(io::Error::from(io::ErrorKind::ConnectionRefused))
        } else {
            Ok(Echo::default())
        }
    });

    assert!(matches!(
        conn.receive(),
        Err(SyncError::InitializationFailure(_))
    ));
    assert!(!conn.is_connected());

    conn.send("retry".to_string()).unwrap();
    assert_eq!(conn.receive().unwrap(), "retry");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}
