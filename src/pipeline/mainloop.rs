//! Single-threaded completion loop. Reader threads do the blocking I/O and post results on a
//! channel; handlers run here one at a time, on the thread that calls [`EventLoop::run`].

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{trace, warn};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Identifies one pending completion (a stream read or a deferred task).
pub type SourceId = u64;

/// Result of one read, produced on a reader thread.
pub(crate) enum Payload {
    /// One line without its trailing newline, or `None` at end-of-stream.
    Line(Option<String>),
    /// Up to the requested number of bytes; shorter means end-of-stream.
    Chunk(Vec<u8>),
    /// Wake-up for a deferred task.
    Wake,
}

/// Message posted to the loop channel.
pub(crate) struct Event {
    pub source: SourceId,
    pub payload: Payload,
}

type Handler = Box<dyn FnOnce(Payload)>;

struct Inner {
    tx: Sender<Event>,
    rx: Receiver<Event>,
    handlers: RefCell<HashMap<SourceId, Handler>>,
    next_id: Cell<SourceId>,
}

/// Cheap handle to the loop; clones share the same queue and handler table.
#[derive(Clone)]
pub struct EventLoop {
    inner: Rc<Inner>,
}

/// Non-owning handle held by pending reads. Dropping the last [`EventLoop`] drops every
/// registered handler even while reads are outstanding.
#[derive(Clone)]
pub(crate) struct LoopHandle {
    inner: Weak<Inner>,
}

impl LoopHandle {
    pub(crate) fn upgrade(&self) -> Option<EventLoop> {
        self.inner.upgrade().map(|inner| EventLoop { inner })
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            inner: Rc::new(Inner {
                tx,
                rx,
                handlers: RefCell::new(HashMap::new()),
                next_id: Cell::new(1),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> LoopHandle {
        LoopHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Allocate a fresh source id.
    pub(crate) fn next_source(&self) -> SourceId {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        id
    }

    /// Sender for reader threads.
    pub(crate) fn sender(&self) -> Sender<Event> {
        self.inner.tx.clone()
    }

    /// Register the handler for the next completion of `source`. At most one per source.
    pub(crate) fn expect(&self, source: SourceId, handler: Handler) -> bool {
        let mut handlers = self.inner.handlers.borrow_mut();
        if handlers.contains_key(&source) {
            warn!("source {source} already has a pending completion");
            return false;
        }
        handlers.insert(source, handler);
        true
    }

    /// Post a synthetic completion for `source` from the loop thread itself.
    pub(crate) fn post(&self, source: SourceId, payload: Payload) {
        // The loop holds its own receiver, so the channel cannot be disconnected here.
        let _ = self.inner.tx.send(Event { source, payload });
    }

    /// Run `task` on a later iteration of the loop, never synchronously.
    pub fn defer<F>(&self, task: F)
    where
        F: FnOnce() + 'static,
    {
        let source = self.next_source();
        self.expect(source, Box::new(move |_| task()));
        self.post(source, Payload::Wake);
    }

    /// Number of completions still awaited.
    pub fn pending(&self) -> usize {
        self.inner.handlers.borrow().len()
    }

    /// Block for one completion and run its handler. Returns false when nothing is pending.
    pub fn iteration(&self) -> bool {
        if self.pending() == 0 {
            return false;
        }
        let Ok(event) = self.inner.rx.recv() else {
            return false;
        };
        let handler = self.inner.handlers.borrow_mut().remove(&event.source);
        match handler {
            Some(handler) => {
                trace!("dispatch source {}", event.source);
                handler(event.payload);
            }
            None => warn!("dropping completion for unknown source {}", event.source),
        }
        true
    }

    /// Run handlers until no completion is pending.
    ///
    /// Blocks while any completion is awaited. A panicking reader still answers with
    /// end-of-stream, so every registered handler eventually runs.
    pub fn run(&self) {
        while self.iteration() {}
    }
}
