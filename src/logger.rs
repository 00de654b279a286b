//! Installs a `tracing` subscriber for the events emitted by this crate.
//!
//! The primitives themselves only emit `tracing` events (lazy initialization,
//! blocking queue operations, cache updates). Applications that do not
//! bring their own subscriber can use [`Logger`] to print them.
//!
//! ```no_run
//! use synchro::logger::Logger;
//! use tracing::level_filters::LevelFilter;
//!
//! Logger::new()
//!     .with_max_level(LevelFilter::DEBUG)
//!     .with_filter("synchro::queue=trace")
//!     .set_logger();
//! ```

use tracing::{level_filters::LevelFilter, subscriber::SetGlobalDefaultError, Subscriber};
use tracing_subscriber::{fmt::MakeWriter, EnvFilter};

/// A builder for a formatting subscriber.
///
/// Without an explicit filter the directives in `RUST_LOG` are used, with
/// the configured max level as fallback.
#[must_use]
#[derive(Debug, Clone)]
pub struct Logger {
    max_level: LevelFilter,
    filter: Option<String>,
    ansi: bool,
    thread_names: bool,
}

impl Logger {
    /// Creates a new logger printing events up to `INFO`.
    pub fn new() -> Self {
        Self {
            max_level: LevelFilter::INFO,
            filter: None,
            ansi: true,
            thread_names: false,
        }
    }

    /// Sets the level used when no directive matches an event.
    pub fn with_max_level(mut self, level: LevelFilter) -> Self {
        self.max_level = level;
        self
    }

    /// Sets explicit filter directives, e.g. `synchro::lazy=debug`.
    /// `RUST_LOG` is ignored if a filter is set.
    pub fn with_filter(mut self, filter: impl AsRef<str>) -> Self {
        self.filter = Some(filter.as_ref().to_string());
        self
    }

    /// Enables or disables ANSI colors.
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Prints the name of the thread emitting an event.
    pub fn with_thread_names(mut self, thread_names: bool) -> Self {
        self.thread_names = thread_names;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        let builder = EnvFilter::builder().with_default_directive(self.max_level.into());
        match &self.filter {
            Some(filter) => builder.parse_lossy(filter),
            None => builder.from_env_lossy(),
        }
    }

    /// Builds a subscriber writing to stdout, without installing it.
    pub fn finish(self) -> impl Subscriber + Send + Sync + 'static {
        self.finish_with_writer(std::io::stdout)
    }

    /// Builds a subscriber writing to `writer`, without installing it.
    pub fn finish_with_writer<W>(self, writer: W) -> impl Subscriber + Send + Sync + 'static
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_ansi(self.ansi)
            .with_thread_names(self.thread_names)
            .with_writer(writer)
            .finish()
    }

    /// Installs the subscriber as global default.
    ///
    /// # Errors
    ///
    /// Fails if a global subscriber was already installed.
    pub fn try_set_logger(self) -> Result<(), SetGlobalDefaultError> {
        tracing::subscriber::set_global_default(self.finish())
    }

    /// Installs the subscriber as global default.
    ///
    /// # Panics
    ///
    /// Panics if a global subscriber was already installed.
    pub fn set_logger(self) {
        self.try_set_logger().expect("Failed to set logger");
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}
