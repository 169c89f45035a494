//! Ordered publish/subscribe registry.

use std::collections::HashMap;

use relay_core::{Event, EventKind};

/// Subscriber callback. Invoked synchronously on the dispatch loop's
/// execution context.
type Handler = Box<dyn FnMut(&Event) + Send>;

/// Ordered, synchronous event dispatch keyed by [`EventKind`].
///
/// Subscription order determines delivery order. There is no removal
/// primitive: subscribers live as long as the client. Handlers are not
/// isolated from each other; a panicking handler aborts the remaining
/// dispatch for that emission.
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<EventKind, Vec<Handler>>,
}

impl EventBus {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to the given event kind's delivery list, creating
    /// the list if this is the kind's first subscriber.
    pub fn on(&mut self, kind: EventKind, handler: impl FnMut(&Event) + Send + 'static) {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
    }

    /// Invoke every handler registered for this event's kind, in
    /// subscription order.
    pub fn emit(&mut self, event: &Event) {
        if let Some(handlers) = self.handlers.get_mut(&event.kind()) {
            for handler in handlers {
                handler(event);
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: Vec<(EventKind, usize)> =
            self.handlers.iter().map(|(kind, list)| (*kind, list.len())).collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}
