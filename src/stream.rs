//! Async streams of configuration events.
//!
//! Listener callbacks run on the notification thread; a subscription bridges
//! them into a bounded channel so async code can `await` changes instead of
//! registering callbacks.

use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

use crate::event::ConfigurationEvent;
use crate::listeners::{ListenerId, ListenerRegistry};
use crate::provider::ChangeListener;

/// Type alias for a boxed async stream of events.
pub type EventStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

/// A sender for events in an async stream.
///
/// This wraps a tokio mpsc sender. Sends never wait: listener callbacks must
/// not block the notification thread.
#[derive(Debug)]
pub struct EventSender<T> {
    tx: mpsc::Sender<T>,
}

impl<T> EventSender<T> {
    /// Create a new event sender from an mpsc sender.
    pub fn new(tx: mpsc::Sender<T>) -> Self {
        Self { tx }
    }

    /// Try to send an event without waiting.
    ///
    /// Returns `Err(event)` if the channel is full or closed.
    pub fn try_send(&self, event: T) -> Result<(), T> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(v) => v,
            mpsc::error::TrySendError::Closed(v) => v,
        })
    }

    /// Check if the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<T> Clone for EventSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

/// Create a bounded event channel.
pub fn create_stream<T: Send + 'static>(buffer_size: usize) -> (EventSender<T>, EventStream<T>) {
    let (tx, rx) = mpsc::channel(buffer_size.max(1));
    let stream: EventStream<T> = Box::pin(ReceiverStream::new(rx));
    (EventSender::new(tx), stream)
}

/// A stream of [`ConfigurationEvent`]s from one provider.
///
/// Dropping the subscription unregisters its listener. Events that arrive
/// while the buffer is full are dropped with a warning.
pub struct EventSubscription {
    id: ListenerId,
    listeners: Weak<ListenerRegistry<ChangeListener>>,
    stream: EventStream<ConfigurationEvent>,
}

impl EventSubscription {
    pub(crate) fn register(
        listeners: &Arc<ListenerRegistry<ChangeListener>>,
        buffer_size: usize,
    ) -> Self {
        let (sender, stream) = create_stream(buffer_size);
        let id = listeners.add(Arc::new(move |event: &ConfigurationEvent| {
            if sender.is_closed() {
                return;
            }
            if let Err(event) = sender.try_send(event.clone()) {
                warn!(kind = ?event.kind(), "Subscription buffer full, dropping event");
            }
        }));
        Self {
            id,
            listeners: Arc::downgrade(listeners),
            stream,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Stream for EventSubscription {
    type Item = ConfigurationEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().stream.as_mut().poll_next(cx)
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.remove(self.id);
        }
    }
}

impl std::fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubscription")
            .field("id", &self.id)
            .finish()
    }
}
