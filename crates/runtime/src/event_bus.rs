use std::fmt;

/// Handle returned by [`ObserverList::subscribe`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Observer<S, E> = Box<dyn FnMut(&S, &E)>;

/// Ordered list of change observers.
///
/// Observers run synchronously, in subscription order, inside the call to
/// [`ObserverList::notify`]. They get a shared reference to the owner's state:
/// reading is allowed, writing back is not.
pub struct ObserverList<S: ?Sized, E> {
    next_id: u64,
    observers: Vec<(SubscriptionId, Observer<S, E>)>,
}

impl<S: ?Sized, E> ObserverList<S, E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&S, &E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns `true` if the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn notify(&mut self, state: &S, event: &E) {
        for (_, observer) in self.observers.iter_mut() {
            observer(state, event);
        }
    }
}

impl<S: ?Sized, E> Default for ObserverList<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized, E> fmt::Debug for ObserverList<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("observers", &self.observers.len())
            .finish()
    }
}
