//! Two-way join for the total/unseen counts of one mailbox.

use log::{debug, warn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::MailboxCounts;

/// Which half of [`MailboxCounts`] a subquery fills.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountSlot {
    Total,
    Unseen,
}

type ReleaseFn = Box<dyn FnOnce(MailboxCounts)>;

/// Shared slot written by independent subqueries.
///
/// Starts with one outstanding writer; call [`acquire`](Self::acquire) before launching each
/// additional one. The decrement that reaches zero hands the filled counts to the release
/// callback, exactly once.
pub struct FanInContext {
    outstanding: Cell<usize>,
    counts: RefCell<MailboxCounts>,
    on_release: RefCell<Option<ReleaseFn>>,
}

impl FanInContext {
    pub fn new<F>(mailbox: &str, on_release: F) -> Rc<Self>
    where
        F: FnOnce(MailboxCounts) + 'static,
    {
        Rc::new(Self {
            outstanding: Cell::new(1),
            counts: RefCell::new(MailboxCounts {
                mailbox: mailbox.to_string(),
                ..MailboxCounts::default()
            }),
            on_release: RefCell::new(Some(Box::new(on_release))),
        })
    }

    /// Register one more writer.
    pub fn acquire(&self) {
        self.outstanding.set(self.outstanding.get() + 1);
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.get()
    }

    pub fn is_released(&self) -> bool {
        self.on_release.borrow().is_none()
    }

    /// Store `value` in `slot` and drop one writer. Returns true if this call released the context.
    pub fn complete(&self, slot: CountSlot, value: usize) -> bool {
        let outstanding = self.outstanding.get();
        if outstanding == 0 {
            warn!("{slot:?} result arrived after release; ignored");
            return false;
        }
        {
            let mut counts = self.counts.borrow_mut();
            match slot {
                CountSlot::Total => counts.total = value,
                CountSlot::Unseen => counts.unseen = value,
            }
        }
        self.outstanding.set(outstanding - 1);
        if outstanding > 1 {
            return false;
        }

        let counts = std::mem::take(&mut *self.counts.borrow_mut());
        let on_release = self.on_release.borrow_mut().take();
        debug!(
            "{}: {} unseen / {} total",
            counts.mailbox, counts.unseen, counts.total
        );
        if let Some(on_release) = on_release {
            on_release(counts);
        }
        true
    }
}
