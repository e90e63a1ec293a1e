use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;

/// Latest-value publisher with lossless fan-out.
///
/// Every subscriber first receives the value current at subscription time and
/// then every later publish, in publish order. Channels are unbounded per
/// subscriber so a slow consumer never causes another to miss an update.
#[derive(Debug)]
pub struct StatePublisher<T: Clone> {
    inner: Arc<Inner<T>>,
}

#[derive(Debug)]
struct Inner<T> {
    name: &'static str,
    state: Mutex<PublisherState<T>>,
}

#[derive(Debug)]
struct PublisherState<T> {
    current: T,
    next_id: u64,
    subscribers: HashMap<u64, mpsc::UnboundedSender<T>>,
}

impl<T: Clone> Clone for StatePublisher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> StatePublisher<T> {
    pub fn new(name: &'static str, initial: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                state: Mutex::new(PublisherState {
                    current: initial,
                    next_id: 0,
                    subscribers: HashMap::new(),
                }),
            }),
        }
    }

    /// Replace the current value and deliver it to every subscriber
    pub fn publish(&self, value: T) {
        let mut state = self.inner.state.lock();
        Self::deliver(&mut state, value);
    }

    /// Publish only when the value differs from the current one
    pub fn publish_if_changed(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        let mut state = self.inner.state.lock();
        if state.current == value {
            return false;
        }
        Self::deliver(&mut state, value);
        true
    }

    // Callers hold the lock while sending, which keeps delivery order identical for all subscribers
    fn deliver(state: &mut PublisherState<T>, value: T) {
        state.current = value.clone();
        state
            .subscribers
            .retain(|_, sender| sender.send(value.clone()).is_ok());
    }

    pub fn current(&self) -> T {
        self.inner.state.lock().current.clone()
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut state = self.inner.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        // The receiver is alive, so seeding it cannot fail
        let _ = sender.send(state.current.clone());
        state.subscribers.insert(id, sender);

        tracing::debug!(publisher = self.inner.name, subscription = id, "Subscriber attached");

        Subscription {
            id,
            receiver,
            publisher: Arc::downgrade(&self.inner),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().subscribers.len()
    }
}

/// Handle held by one consumer. Dropping it detaches the consumer.
#[derive(Debug)]
pub struct Subscription<T> {
    id: u64,
    receiver: mpsc::UnboundedReceiver<T>,
    publisher: Weak<Inner<T>>,
}

impl<T> Subscription<T> {
    /// Wait for the next update. `None` once the publisher is gone and the backlog is drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Next already-delivered update, if any
    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Drain every update delivered so far
    pub fn drain(&mut self) -> Vec<T> {
        let mut updates = Vec::new();
        while let Ok(update) = self.receiver.try_recv() {
            updates.push(update);
        }
        updates
    }

    /// Detach explicitly. Updates published concurrently are simply discarded.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.publisher.upgrade() {
            inner.state.lock().subscribers.remove(&self.id);
            tracing::debug!(publisher = inner.name, subscription = self.id, "Subscriber detached");
        }
    }
}
