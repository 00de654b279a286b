//! Lazily initialized shared resources.
//!
//! Two flavours are provided, both built on [`OnceGate`]:
//!
//! - [`Singleton`] is a process-wide instance that is constructed on first
//!   use and shared through an [`Arc`] for the rest of the process lifetime.
//!   It is meant to live in a `static`.
//! - [`LazyConnection`] wraps a [`Transport`] that is only connected once an
//!   operation actually needs it. Whichever of [`LazyConnection::send`] and
//!   [`LazyConnection::receive`] runs first establishes the connection, all
//!   later operations reuse it without taking a lock.
//!
//! In both cases a failed initializer is reported to the caller that ran it
//! as [`SyncError::InitializationFailure`] and the next caller tries again.

use std::{any::type_name, fmt::Debug, sync::Arc};

use crate::{
    error::{BoxError, Result, SyncError},
    once::OnceGate,
};

enum Init<T> {
    Infallible(fn() -> T),
    Fallible(fn() -> Result<T, BoxError>),
}

/// A process-wide instance, constructed exactly once on first request.
///
/// ```
/// use synchro::lazy::Singleton;
///
/// struct Registry {
///     names: Vec<&'static str>,
/// }
///
/// static REGISTRY: Singleton<Registry> = Singleton::new(|| Registry {
///     names: vec!["alpha", "beta"],
/// });
///
/// let a = REGISTRY.get_instance()?;
/// let b = REGISTRY.get_instance()?;
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// assert_eq!(a.names.len(), 2);
/// # Ok::<(), synchro::error::SyncError>(())
/// ```
pub struct Singleton<T> {
    gate: OnceGate<Arc<T>>,
    init: Init<T>,
}

impl<T> Singleton<T> {
    /// Creates a singleton with an infallible constructor.
    pub const fn new(init: fn() -> T) -> Self {
        Self {
            gate: OnceGate::new(),
            init: Init::Infallible(init),
        }
    }

    /// Creates a singleton whose constructor may fail.
    ///
    /// A failed construction does not consume the singleton, the next call
    /// to [`Singleton::get_instance`] runs the constructor again.
    pub const fn fallible(init: fn() -> Result<T, BoxError>) -> Self {
        Self {
            gate: OnceGate::new(),
            init: Init::Fallible(init),
        }
    }

    /// Returns the shared instance, constructing it on first use.
    ///
    /// Concurrent first callers block until the construction finished
    /// and all receive the same instance.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InitializationFailure`] if this call ran the
    /// constructor and it failed.
    pub fn get_instance(&self) -> Result<Arc<T>> {
        self.gate
            .get_or_try_init(|| -> Result<Arc<T>> {
                let instance = match self.init {
                    Init::Infallible(init) => init(),
                    Init::Fallible(init) => init().map_err(SyncError::InitializationFailure)?,
                };
                tracing::debug!(ty = type_name::<T>(), "singleton constructed");
                Ok(Arc::new(instance))
            })
            .map(Arc::clone)
    }

    /// Whether the instance was constructed.
    pub fn is_initialized(&self) -> bool {
        self.gate.is_initialized()
    }
}

impl<T> Debug for Singleton<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Singleton")
            .field("ty", &type_name::<T>())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

/// A connection able to transfer packets.
pub trait Transport {
    /// The unit of data moved over the connection.
    type Packet;

    /// Sends a packet to the remote end.
    fn send(&self, packet: Self::Packet) -> Result<(), BoxError>;

    /// Receives the next packet from the remote end.
    fn receive(&self) -> Result<Self::Packet, BoxError>;
}

/// A resource that connects its [`Transport`] on first use.
///
/// The connector runs exactly once successfully, on whichever thread first
/// calls an operation that needs the connection.
pub struct LazyConnection<T, F> {
    connector: F,
    connection: OnceGate<T>,
}

impl<T, F, E> LazyConnection<T, F>
where
    T: Transport,
    F: Fn() -> Result<T, E>,
    E: Into<BoxError>,
{
    /// Creates an unconnected resource that connects using `connector`.
    pub fn new(connector: F) -> Self {
        Self {
            connector,
            connection: OnceGate::new(),
        }
    }

    /// Returns the connection, establishing it if required.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InitializationFailure`] if this call ran the
    /// connector and it failed.
    pub fn connection(&self) -> Result<&T> {
        self.connection.get_or_try_init(|| -> Result<T> {
            let connection = (self.connector)().map_err(SyncError::initialization)?;
            tracing::debug!(ty = type_name::<T>(), "connection established");
            Ok(connection)
        })
    }

    /// Whether the connection was established.
    pub fn is_connected(&self) -> bool {
        self.connection.is_initialized()
    }

    /// Sends a packet, connecting first if required.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InitializationFailure`] if connecting failed and
    /// [`SyncError::Transport`] if the connection failed to send.
    pub fn send(&self, packet: T::Packet) -> Result<()> {
        self.connection()?
            .send(packet)
            .map_err(SyncError::Transport)
    }

    /// Receives a packet, connecting first if required.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InitializationFailure`] if connecting failed and
    /// [`SyncError::Transport`] if the connection failed to receive.
    pub fn receive(&self) -> Result<T::Packet> {
        self.connection()?.receive().map_err(SyncError::Transport)
    }
}

impl<T: Debug, F> Debug for LazyConnection<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyConnection")
            .field("connection", &self.connection.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        collections::VecDeque,
        io,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    #[derive(Debug, Default)]
    struct Loopback {
        packets: Mutex<VecDeque<u32>>,
    }

    impl Transport for Loopback {
        type Packet = u32;

        fn send(&self, packet: u32) -> Result<(), BoxError> {
            self.packets.lock().unwrap().push_back(packet);
            Ok(())
        }

        fn receive(&self) -> Result<u32, BoxError> {
            self.packets
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| io::Error::from(io::ErrorKind::WouldBlock).into())
        }
    }

    #[test]
    fn receive_triggers_connect() {
        let connects = AtomicUsize::new(0);
        let conn = LazyConnection::new(|| {
            connects.fetch_add(1, Ordering::SeqCst);
            Ok::<_, io::Error>(Loopback::default())
        });
        assert!(!conn.is_connected());

        assert!(matches!(conn.receive(), Err(SyncError::Transport(_))));
        assert!(conn.is_connected());

        conn.send(3).unwrap();
        assert_eq!(conn.receive().unwrap(), 3);
        assert_eq!(connects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_connect_is_retried() {
        let attempts = AtomicUsize::new(0);
        let conn = LazyConnection::new(|| {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(io::Error::from(io::ErrorKind::ConnectionRefused))
            } else {
                Ok(Loopback::default())
            }
        });

        let err = conn.send(1).unwrap_err();
        assert!(matches!(err, SyncError::InitializationFailure(_)));
        assert!(!conn.is_connected());

        conn.send(1).unwrap();
        assert_eq!(conn.receive().unwrap(), 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn singleton_retries_after_failure() {
        static ATTEMPTS: AtomicUsize = AtomicUsize::new(0);
        static FLAKY: Singleton<usize> = Singleton::fallible(|| {
            match ATTEMPTS.fetch_add(1, Ordering::SeqCst) {
                0 => Err("not yet".into()),
                n => Ok(n),
            }
        });

        assert!(matches!(
            FLAKY.get_instance(),
            Err(SyncError::InitializationFailure(_))
        ));
        assert!(!FLAKY.is_initialized());
        assert_eq!(*FLAKY.get_instance().unwrap(), 1);
        assert_eq!(*FLAKY.get_instance().unwrap(), 1);
        assert_eq!(ATTEMPTS.load(Ordering::SeqCst), 2);
    }
}
