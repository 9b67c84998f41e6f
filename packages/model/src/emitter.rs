//! # Change Emitter
//!
//! Topic-based publish/subscribe with a wildcard channel.
//!
//! ## Delivery
//!
//! - Synchronous, on the caller's stack, in subscription order
//! - Topic subscribers first, then wildcard subscribers
//! - Handler lists are snapshotted before a pass; a handler removed during
//!   the pass is skipped if it has not run yet
//! - `emit` called from inside a handler is queued and delivered by the
//!   outer pass once the current event is done, never nested
//!
//! Handlers receive the event plus a shared context reference (the page for
//! model events), so they may read freely but cannot mutate through it.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

/// Topic name that subscribes to every event
pub const WILDCARD: &str = "*";

/// Events routed by the emitter
pub trait Topic {
    fn topic(&self) -> &'static str;
}

/// Handle returned by `on`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E, C> = Rc<dyn Fn(&E, &C)>;

struct Entry<E, C: ?Sized> {
    id: SubscriptionId,
    handler: Handler<E, C>,
}

impl<E, C: ?Sized> Clone for Entry<E, C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: Rc::clone(&self.handler),
        }
    }
}

struct Registry<E, C: ?Sized> {
    topics: HashMap<&'static str, Vec<Entry<E, C>>>,
    wildcard: Vec<Entry<E, C>>,
}

impl<E, C: ?Sized> Registry<E, C> {
    fn is_live(&self, id: SubscriptionId) -> bool {
        self.wildcard.iter().any(|e| e.id == id)
            || self.topics.values().any(|list| list.iter().any(|e| e.id == id))
    }
}

/// Synchronous event bus
pub struct Emitter<E, C: ?Sized = ()> {
    registry: RefCell<Registry<E, C>>,
    queue: RefCell<VecDeque<E>>,
    dispatching: Cell<bool>,
    next_id: Cell<u64>,
}

impl<E: Topic, C: ?Sized> Emitter<E, C> {
    pub fn new() -> Self {
        Self {
            registry: RefCell::new(Registry {
                topics: HashMap::new(),
                wildcard: Vec::new(),
            }),
            queue: RefCell::new(VecDeque::new()),
            dispatching: Cell::new(false),
            next_id: Cell::new(0),
        }
    }

    /// Subscribe to one topic (`"*"` subscribes to everything)
    pub fn on(&self, topic: &'static str, handler: impl Fn(&E, &C) + 'static) -> SubscriptionId {
        let entry = Entry {
            id: self.next_subscription(),
            handler: Rc::new(handler),
        };
        let id = entry.id;
        let mut registry = self.registry.borrow_mut();
        if topic == WILDCARD {
            registry.wildcard.push(entry);
        } else {
            registry.topics.entry(topic).or_default().push(entry);
        }
        id
    }

    /// Subscribe to every event regardless of topic
    pub fn on_any(&self, handler: impl Fn(&E, &C) + 'static) -> SubscriptionId {
        self.on(WILDCARD, handler)
    }

    /// Unsubscribe. Returns false if the id was already gone.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.borrow_mut();
        let before = registry.wildcard.len();
        registry.wildcard.retain(|e| e.id != id);
        if registry.wildcard.len() != before {
            return true;
        }
        for list in registry.topics.values_mut() {
            let before = list.len();
            list.retain(|e| e.id != id);
            if list.len() != before {
                return true;
            }
        }
        false
    }

    /// Drop every subscription
    pub fn clear(&self) {
        let mut registry = self.registry.borrow_mut();
        registry.topics.clear();
        registry.wildcard.clear();
    }

    pub fn listener_count(&self) -> usize {
        let registry = self.registry.borrow();
        registry.wildcard.len() + registry.topics.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_dispatching(&self) -> bool {
        self.dispatching.get()
    }

    /// Deliver `event` to topic subscribers, then wildcard subscribers
    pub fn emit(&self, event: E, ctx: &C) {
        if self.dispatching.get() {
            self.queue.borrow_mut().push_back(event);
            return;
        }

        let _guard = DispatchGuard::enter(&self.dispatching);
        let mut next = Some(event);
        while let Some(event) = next {
            self.dispatch(&event, ctx);
            next = self.queue.borrow_mut().pop_front();
        }
    }

    fn dispatch(&self, event: &E, ctx: &C) {
        let snapshot: Vec<Entry<E, C>> = {
            let registry = self.registry.borrow();
            registry
                .topics
                .get(event.topic())
                .into_iter()
                .flatten()
                .chain(registry.wildcard.iter())
                .cloned()
                .collect()
        };

        for entry in snapshot {
            if self.registry.borrow().is_live(entry.id) {
                (entry.handler)(event, ctx);
            }
        }
    }

    fn next_subscription(&self) -> SubscriptionId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        SubscriptionId(id)
    }
}

impl<E: Topic, C: ?Sized> Default for Emitter<E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, C: ?Sized> fmt::Debug for Emitter<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("Emitter")
            .field("topics", &registry.topics.keys().collect::<Vec<_>>())
            .field("wildcard", &registry.wildcard.len())
            .field("dispatching", &self.dispatching.get())
            .finish()
    }
}

/// Resets the dispatching flag even if a handler panics
struct DispatchGuard<'a>(&'a Cell<bool>);

impl<'a> DispatchGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Ev {
        A(u32),
        B,
    }

    impl Topic for Ev {
        fn topic(&self) -> &'static str {
            match self {
                Ev::A(_) => "a",
                Ev::B => "b",
            }
        }
    }

    #[test]
    fn test_topic_then_wildcard_order() {
        let emitter: Emitter<Ev> = Emitter::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        emitter.on_any(move |_, _| l.borrow_mut().push("any"));
        let l = log.clone();
        emitter.on("a", move |_, _| l.borrow_mut().push("a1"));
        let l = log.clone();
        emitter.on("a", move |_, _| l.borrow_mut().push("a2"));

        emitter.emit(Ev::A(1), &());
        emitter.emit(Ev::B, &());

        assert_eq!(*log.borrow(), vec!["a1", "a2", "any", "any"]);
    }

    #[test]
    fn test_off_during_dispatch_skips_pending_handler() {
        let emitter: Rc<Emitter<Ev>> = Rc::new(Emitter::new());
        let calls = Rc::new(Cell::new(0));
        let victim = Rc::new(Cell::new(None));

        let em = emitter.clone();
        let v = victim.clone();
        emitter.on("a", move |_, _| {
            if let Some(id) = v.get() {
                assert!(em.off(id));
            }
        });
        let c = calls.clone();
        let id = emitter.on("a", move |_, _| c.set(c.get() + 1));
        victim.set(Some(id));

        emitter.emit(Ev::A(1), &());
        assert_eq!(calls.get(), 0);
        assert!(!emitter.off(id));
    }

    #[test]
    fn test_reentrant_emit_is_queued() {
        let emitter: Rc<Emitter<Ev>> = Rc::new(Emitter::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let em = emitter.clone();
        let l = log.clone();
        emitter.on("a", move |ev, _| {
            l.borrow_mut().push(format!("start {:?}", ev));
            if let Ev::A(1) = ev {
                em.emit(Ev::A(2), &());
            }
            l.borrow_mut().push(format!("end {:?}", ev));
        });

        emitter.emit(Ev::A(1), &());

        assert_eq!(
            *log.borrow(),
            vec!["start A(1)", "end A(1)", "start A(2)", "end A(2)"]
        );
        assert!(!emitter.is_dispatching());
    }

    #[test]
    fn test_context_is_passed() {
        let emitter: Emitter<Ev, str> = Emitter::new();
        let seen = Rc::new(RefCell::new(String::new()));
        let s = seen.clone();
        emitter.on("b", move |_, ctx: &str| s.borrow_mut().push_str(ctx));

        emitter.emit(Ev::B, "page");
        assert_eq!(&*seen.borrow(), "page");
        assert_eq!(emitter.listener_count(), 1);

        emitter.clear();
        assert_eq!(emitter.listener_count(), 0);
    }
}
