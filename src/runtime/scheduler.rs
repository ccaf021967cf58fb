use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

type Task<C> = Box<dyn FnOnce(&C)>;

/// Single-threaded turn queue.
///
/// Work deferred with [`Scheduler::defer`] runs on the next call to
/// [`Scheduler::run_turn`]. A turn only runs the tasks that were queued when it
/// started. Tasks deferred while it runs wait for the following turn, but a
/// task already in the batch still sees whatever state earlier tasks left
/// behind.
pub(crate) struct Scheduler<C> {
    queue: RefCell<VecDeque<Task<C>>>,
    // Bumped by `discard` so a turn in progress drops its remaining tasks.
    epoch: Cell<u64>,
    running: Cell<bool>,
}

impl<C> Scheduler<C> {
    pub(crate) fn new() -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            epoch: Cell::new(0),
            running: Cell::new(false),
        }
    }

    /// Queue a task for the next turn.
    pub(crate) fn defer(&self, task: impl FnOnce(&C) + 'static) {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.queue.borrow().is_empty()
    }

    /// Number of tasks waiting for the next turn.
    pub(crate) fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Drop every queued task, including the rest of a turn in progress.
    pub(crate) fn discard(&self) {
        self.queue.borrow_mut().clear();
        self.epoch.set(self.epoch.get().wrapping_add(1));
    }

    /// Run one turn against `ctx`.
    ///
    /// Returns `false` without doing anything when the queue is empty or a
    /// turn is already running further up the stack.
    pub(crate) fn run_turn(&self, ctx: &C) -> bool {
        if self.running.get() || !self.has_pending() {
            return false;
        }
        let _running = Running::enter(&self.running);
        let epoch = self.epoch.get();
        let batch = std::mem::take(&mut *self.queue.borrow_mut());

        for task in batch {
            if self.epoch.get() != epoch {
                break;
            }
            task(ctx);
        }
        true
    }
}

struct Running<'a>(&'a Cell<bool>);

impl<'a> Running<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
