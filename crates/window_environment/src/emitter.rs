//! Named-event subscription registry.

use std::{collections::BTreeMap, fmt};

/// Handle returned by [`EventEmitter::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

type Listener<P> = Box<dyn FnMut(&P)>;

/// Maps event names to ordered handler lists.
///
/// Handlers for one name run in registration order. Emitting a name with no handlers is a no-op.
pub struct EventEmitter<P> {
    listeners: BTreeMap<String, Vec<(ListenerId, Listener<P>)>>,
    next_id: u64,
}

impl<P> Default for EventEmitter<P> {
    fn default() -> Self {
        Self {
            listeners: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<P> EventEmitter<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the list for `name`.
    pub fn on(&mut self, name: impl Into<String>, handler: impl FnMut(&P) + 'static) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners
            .entry(name.into())
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Removes one handler. Returns `false` when `id` was not registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let mut removed = false;
        self.listeners.retain(|_, handlers| {
            let before = handlers.len();
            handlers.retain(|(listener_id, _)| *listener_id != id);
            removed |= handlers.len() != before;
            !handlers.is_empty()
        });
        removed
    }

    /// Invokes every handler registered for `name`, in order, with `payload`.
    pub fn emit(&mut self, name: &str, payload: &P) {
        if let Some(handlers) = self.listeners.get_mut(name) {
            for (_, handler) in handlers.iter_mut() {
                handler(payload);
            }
        }
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl<P> fmt::Debug for EventEmitter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(name, handlers)| (name.as_str(), handlers.len()))
            .collect();
        f.debug_struct("EventEmitter")
            .field("listeners", &counts)
            .finish()
    }
}
