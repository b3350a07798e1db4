//! Thread-affine notification delivery.
//!
//! Observer callbacks always run on one designated notification context, so
//! observers never need their own synchronization. A callback submitted from
//! that context runs inline; from anywhere else it is queued and runs in FIFO
//! order with the other queued callbacks.

use std::fmt::Debug;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::ThreadId;

use once_cell::sync::Lazy;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

use crate::config::DEFAULT_NOTIFIER_THREAD;

/// A notification callback.
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// The single-threaded context notifications are delivered on.
pub trait NotificationSink: Send + Sync + Debug {
    /// Whether the calling thread is the notification context.
    fn is_current_context(&self) -> bool;

    /// Queue `callback` for execution on the notification context.
    fn post(&self, callback: Callback);
}

/// Delivers callbacks on a [`NotificationSink`].
///
/// # Example
///
/// ```rust
/// use config_registry::Dispatcher;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let dispatcher = Dispatcher::spawn("notify").unwrap();
/// let hits = Arc::new(AtomicUsize::new(0));
///
/// let counter = Arc::clone(&hits);
/// dispatcher.deliver(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
/// dispatcher.flush();
///
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    sink: Arc<dyn NotificationSink>,
}

static GLOBAL: Lazy<Dispatcher> = Lazy::new(|| {
    Dispatcher::spawn(DEFAULT_NOTIFIER_THREAD).unwrap_or_else(|err| {
        error!(error = %err, "Failed to start notification thread, delivering inline");
        Dispatcher::inline()
    })
});

impl Dispatcher {
    /// Wrap an existing sink.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Start a dedicated notification thread named `thread_name`.
    pub fn spawn(thread_name: impl Into<String>) -> std::io::Result<Self> {
        Ok(Self::new(Arc::new(EventThread::spawn(thread_name.into())?)))
    }

    /// A dispatcher that treats every caller as the notification context.
    pub fn inline() -> Self {
        Self::new(Arc::new(InlineSink))
    }

    /// The process-wide dispatcher.
    pub fn global() -> &'static Dispatcher {
        &GLOBAL
    }

    pub fn is_current_context(&self) -> bool {
        self.sink.is_current_context()
    }

    /// Run `callback` on the notification context.
    pub fn deliver<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.sink.is_current_context() {
            run_guarded(Box::new(callback));
        } else {
            self.sink.post(Box::new(callback));
        }
    }

    /// Block until every callback queued before this call has run.
    ///
    /// Returns immediately when called on the notification context.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context,
    /// like `oneshot::Receiver::blocking_recv`.
    pub fn flush(&self) {
        if self.sink.is_current_context() {
            return;
        }
        let (tx, rx) = oneshot::channel();
        self.sink.post(Box::new(move || {
            let _ = tx.send(());
        }));
        // Err means the context dropped the marker; nothing is left to wait for.
        let _ = rx.blocking_recv();
    }
}

fn run_guarded(callback: Callback) {
    if catch_unwind(AssertUnwindSafe(callback)).is_err() {
        error!("Notification callback panicked");
    }
}

/// A dedicated thread draining a FIFO queue of callbacks.
#[derive(Debug)]
struct EventThread {
    tx: mpsc::UnboundedSender<Callback>,
    thread_id: ThreadId,
}

impl EventThread {
    fn spawn(name: String) -> std::io::Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Callback>();
        let handle = std::thread::Builder::new().name(name).spawn(move || {
            while let Some(callback) = rx.blocking_recv() {
                run_guarded(callback);
            }
        })?;
        Ok(Self {
            tx,
            thread_id: handle.thread().id(),
        })
    }
}

impl NotificationSink for EventThread {
    fn is_current_context(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    fn post(&self, callback: Callback) {
        if self.tx.send(callback).is_err() {
            warn!("Notification thread has stopped, dropping callback");
        }
    }
}

#[derive(Debug)]
struct InlineSink;

impl NotificationSink for InlineSink {
    fn is_current_context(&self) -> bool {
        true
    }

    fn post(&self, callback: Callback) {
        run_guarded(callback);
    }
}
