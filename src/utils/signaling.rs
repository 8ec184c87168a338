//! Subscriber lists for state-change notifications
//!
//! A [`Signaler`] holds a list of closures that get invoked with every event
//! sent through it. Closures registered while a signal is being delivered only
//! start receiving events from the next signal on.
//!
//! A closure may send events through the signaler it is registered with. Those are
//! queued and delivered to every closure once the current event went through all of
//! them, so each closure sees events in the order they were sent.

use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};
use std::thread::{self, ThreadId};

type Callback<E> = Box<dyn FnMut(&E) + Send>;

struct SignalerInner<E> {
    closures: Mutex<Vec<(usize, Callback<E>)>>,
    pending: Mutex<Vec<(usize, Callback<E>)>>,
    removed: Mutex<Vec<usize>>,
    // thread currently running the closures, and the events it sent from within them
    delivering: Mutex<Option<ThreadId>>,
    queued: Mutex<VecDeque<E>>,
    next_id: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the delivering thread, even if a closure panics
struct DeliveryGuard<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        *lock(self.0) = None;
    }
}

/// A token identifying a subscription, used to remove it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalToken(usize);

/// A cheaply clonable list of event subscribers
pub struct Signaler<E> {
    inner: Arc<SignalerInner<E>>,
}

impl<E> std::fmt::Debug for Signaler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signaler")
            .field("subscribers", &lock(&self.inner.closures).len())
            .finish_non_exhaustive()
    }
}

impl<E> Clone for Signaler<E> {
    fn clone(&self) -> Signaler<E> {
        Signaler {
            inner: self.inner.clone(),
        }
    }
}

impl<E> Default for Signaler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Signaler<E> {
    /// Create a new empty signaler
    pub fn new() -> Signaler<E> {
        Signaler {
            inner: Arc::new(SignalerInner {
                closures: Mutex::new(Vec::new()),
                pending: Mutex::new(Vec::new()),
                removed: Mutex::new(Vec::new()),
                delivering: Mutex::new(None),
                queued: Mutex::new(VecDeque::new()),
                next_id: AtomicUsize::new(0),
            }),
        }
    }

    /// Register a closure to be invoked for every future event
    pub fn register<F: FnMut(&E) + Send + 'static>(&self, f: F) -> SignalToken {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        // registration during delivery must not touch the list being iterated
        match self.inner.closures.try_lock() {
            Ok(mut closures) => closures.push((id, Box::new(f))),
            Err(_) => lock(&self.inner.pending).push((id, Box::new(f))),
        }
        SignalToken(id)
    }

    /// Remove a previously registered closure
    pub fn unregister(&self, token: SignalToken) {
        match self.inner.closures.try_lock() {
            Ok(mut closures) => closures.retain(|(id, _)| *id != token.0),
            Err(_) => lock(&self.inner.removed).push(token.0),
        }
        lock(&self.inner.pending).retain(|(id, _)| *id != token.0);
    }

    /// Deliver an event to every registered closure, in registration order
    ///
    /// When called from within one of the closures, the event is delivered after the
    /// current one instead.
    pub fn signal(&self, event: &E)
    where
        E: Clone,
    {
        let current = thread::current().id();
        if *lock(&self.inner.delivering) == Some(current) {
            lock(&self.inner.queued).push_back(event.clone());
            return;
        }

        let mut closures = lock(&self.inner.closures);
        *lock(&self.inner.delivering) = Some(current);
        let _guard = DeliveryGuard(&self.inner.delivering);

        let mut next = Some(event.clone());
        while let Some(event) = next {
            let removed = std::mem::take(&mut *lock(&self.inner.removed));
            closures.retain(|(id, _)| !removed.contains(id));
            for (_, closure) in closures.iter_mut() {
                closure(&event);
            }
            closures.append(&mut lock(&self.inner.pending));
            next = lock(&self.inner.queued).pop_front();
        }
        let removed = std::mem::take(&mut *lock(&self.inner.removed));
        closures.retain(|(id, _)| !removed.contains(id));
    }

    /// Number of registered subscribers
    pub fn len(&self) -> usize {
        lock(&self.inner.closures).len() + lock(&self.inner.pending).len()
    }

    /// Whether no subscriber is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::Signaler;
    use std::sync::{Arc, Mutex};

    #[test]
    fn delivers_in_registration_order() {
        let signaler = Signaler::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = seen.clone();
        signaler.register(move |e| first.lock().unwrap().push(("first", *e)));
        let second = seen.clone();
        signaler.register(move |e| second.lock().unwrap().push(("second", *e)));

        signaler.signal(&7);
        assert_eq!(*seen.lock().unwrap(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn unregister_stops_delivery() {
        let signaler = Signaler::<u32>::new();
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        let token = signaler.register(move |_| *c.lock().unwrap() += 1);

        signaler.signal(&1);
        signaler.unregister(token);
        signaler.signal(&2);

        assert_eq!(*count.lock().unwrap(), 1);
        assert!(signaler.is_empty());
    }

    #[test]
    fn register_from_within_callback() {
        let signaler = Signaler::<u32>::new();
        let count = Arc::new(Mutex::new(0));

        let inner_signaler = signaler.clone();
        let c = count.clone();
        signaler.register(move |_| {
            let c = c.clone();
            inner_signaler.register(move |_| *c.lock().unwrap() += 1);
        });

        signaler.signal(&1);
        assert_eq!(*count.lock().unwrap(), 0);
        signaler.signal(&2);
        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(signaler.len(), 3);
    }

    #[test]
    fn signal_from_within_callback_is_queued() {
        let signaler = Signaler::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner_signaler = signaler.clone();
        let first = seen.clone();
        signaler.register(move |e| {
            first.lock().unwrap().push(("first", *e));
            if *e == 1 {
                inner_signaler.signal(&2);
            }
        });
        let second = seen.clone();
        signaler.register(move |e| second.lock().unwrap().push(("second", *e)));

        signaler.signal(&1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("first", 1), ("second", 1), ("first", 2), ("second", 2)]
        );
    }

    #[test]
    fn panicking_callback_does_not_wedge_the_signaler() {
        let signaler = Signaler::<u32>::new();
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        signaler.register(move |e| {
            if *e == 0 {
                panic!("subscriber failure");
            }
            *c.lock().unwrap() += 1;
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| signaler.signal(&0)));
        assert!(result.is_err());
        signaler.signal(&1);
        assert_eq!(*count.lock().unwrap(), 1);
    }
}
