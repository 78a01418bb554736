//! Per-thread cache of conversion handle pairs
//!
//! Each cache owns a registry mapping thread identity to that thread's
//! [`HandlePair`]. A thread finds its own slot through a thread-local guard
//! table, so the registry lock is only taken to insert or remove entries.
//! A conversion checks the pair out of its slot and hands it back when done;
//! the slot lock is never held while the conversion runs, so a nested call
//! on the same thread fails with [`Error::ResourceAllocation`] instead of
//! blocking.
//!
//! A pair is released exactly once, by whichever comes first:
//! - the thread exits and its guard is dropped,
//! - the thread calls [`HandleCache::release_current`],
//! - the cache is dropped and the registry drains every remaining slot.
//!
//! Every path moves the slot to `SlotState::Released`, so a second attempt
//! finds nothing to free. A pair released while checked out is dropped when
//! its conversion hands it back.
//!
//! Dropping a cache removes the dropping thread's guard at once. Guards the
//! cache left on other threads hold only an empty slot and are pruned when
//! that thread next installs a pair for any cache, or when it exits.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::context::{ContextFactory, HandlePair, create_handle_pair};
use crate::{CodeUnit, Error, Result};

static NEXT_CACHE_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_GUARDS: RefCell<HashMap<u64, Box<dyn ExitGuard>>> = RefCell::new(HashMap::new());
}

enum SlotState<C: CodeUnit> {
    Ready(HandlePair<C>),
    /// Checked out by a conversion running on the owning thread
    InUse,
    Released,
}

type Slot<C> = Mutex<SlotState<C>>;

/// Snapshot of a cache's handle bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    /// Threads currently holding a handle pair
    pub cached_threads: usize,
    /// Handle pairs created for threads so far
    pub created: usize,
    /// Handle pairs released by thread exit or explicit release
    pub released: usize,
}

struct Registry<C: CodeUnit> {
    slots: Mutex<HashMap<ThreadId, Arc<Slot<C>>>>,
    created: AtomicUsize,
    released: AtomicUsize,
}

impl<C: CodeUnit> Registry<C> {
    fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            created: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        }
    }

    fn release(&self, slot: &Slot<C>) -> bool {
        let previous = std::mem::replace(&mut *slot.lock(), SlotState::Released);
        match previous {
            SlotState::Ready(pair) => {
                drop(pair);
                self.released.fetch_add(1, Ordering::SeqCst);
                true
            }
            SlotState::InUse => {
                self.released.fetch_add(1, Ordering::SeqCst);
                true
            }
            SlotState::Released => false,
        }
    }
}

impl<C: CodeUnit> Drop for Registry<C> {
    fn drop(&mut self) {
        let slots = std::mem::take(self.slots.get_mut());
        let released = slots
            .into_values()
            .filter(|slot| self.release(slot))
            .count();
        if released > 0 {
            debug!(released, "released handle pairs at converter teardown");
        }
    }
}

/// Thread-local entry that outlives every use of a cache on one thread
trait ExitGuard {
    fn as_any(&self) -> &dyn Any;

    /// The owning cache is gone
    fn is_orphaned(&self) -> bool;
}

struct ThreadGuard<C: CodeUnit> {
    thread: ThreadId,
    slot: Arc<Slot<C>>,
    registry: Weak<Registry<C>>,
}

impl<C: CodeUnit> ExitGuard for ThreadGuard<C> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_orphaned(&self) -> bool {
        self.registry.strong_count() == 0
    }
}

impl<C: CodeUnit> Drop for ThreadGuard<C> {
    fn drop(&mut self) {
        match self.registry.upgrade() {
            Some(registry) => {
                registry.slots.lock().remove(&self.thread);
                if registry.release(&self.slot) {
                    debug!(thread = ?self.thread, "released thread handle pair");
                }
            }
            None => {
                let previous = std::mem::replace(&mut *self.slot.lock(), SlotState::Released);
                drop(previous);
            }
        }
    }
}

/// A handle pair taken out of its slot for the length of one conversion
struct Checkout<'a, C: CodeUnit> {
    slot: &'a Slot<C>,
    pair: Option<HandlePair<C>>,
}

impl<'a, C: CodeUnit> Checkout<'a, C> {
    fn take(slot: &'a Slot<C>) -> Result<Self> {
        let mut state = slot.lock();
        match std::mem::replace(&mut *state, SlotState::InUse) {
            SlotState::Ready(pair) => Ok(Self {
                slot,
                pair: Some(pair),
            }),
            SlotState::InUse => Err(Error::ResourceAllocation(
                "handle pair for this thread is in use by an enclosing conversion".into(),
            )),
            SlotState::Released => {
                *state = SlotState::Released;
                Err(Error::ResourceAllocation(
                    "handle pair for this thread was already released".into(),
                ))
            }
        }
    }
}

impl<C: CodeUnit> Drop for Checkout<'_, C> {
    fn drop(&mut self) {
        let Some(pair) = self.pair.take() else {
            return;
        };
        let mut state = self.slot.lock();
        if matches!(*state, SlotState::InUse) {
            *state = SlotState::Ready(pair);
        } else {
            drop(state);
            drop(pair);
            debug!("dropped handle pair released during its conversion");
        }
    }
}

/// Lazily created handle pairs, one per calling thread
pub(crate) struct HandleCache<C: CodeUnit> {
    id: u64,
    internal: String,
    factory: Arc<dyn ContextFactory<C>>,
    registry: Arc<Registry<C>>,
}

impl<C: CodeUnit> HandleCache<C> {
    pub(crate) fn new(internal: &str, factory: Arc<dyn ContextFactory<C>>) -> Self {
        Self {
            id: NEXT_CACHE_ID.fetch_add(1, Ordering::Relaxed),
            internal: internal.to_owned(),
            factory,
            registry: Arc::new(Registry::new()),
        }
    }

    /// Run `f` with the calling thread's handle pair, creating it on first use
    pub(crate) fn with_handles<R>(&self, f: impl FnOnce(&mut HandlePair<C>) -> R) -> Result<R> {
        let slot = match self.cached_slot()? {
            Some(slot) => slot,
            None => self.install()?,
        };

        let mut checkout = Checkout::take(&slot)?;
        let Some(pair) = checkout.pair.as_mut() else {
            return Err(Error::ResourceAllocation("handle pair was not checked out".into()));
        };
        Ok(f(pair))
    }

    /// Release the calling thread's handle pair now instead of at thread exit
    pub(crate) fn release_current(&self) -> bool {
        let removed = THREAD_GUARDS
            .try_with(|guards| guards.borrow_mut().remove(&self.id))
            .ok()
            .flatten();
        removed.is_some()
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            cached_threads: self.registry.slots.lock().len(),
            created: self.registry.created.load(Ordering::SeqCst),
            released: self.registry.released.load(Ordering::SeqCst),
        }
    }

    fn cached_slot(&self) -> Result<Option<Arc<Slot<C>>>> {
        THREAD_GUARDS
            .try_with(|guards| {
                guards
                    .borrow()
                    .get(&self.id)
                    .and_then(|guard| guard.as_any().downcast_ref::<ThreadGuard<C>>())
                    .map(|guard| Arc::clone(&guard.slot))
            })
            .map_err(|err| {
                Error::ResourceAllocation(format!("thread-local storage unavailable: {err}"))
            })
    }

    fn install(&self) -> Result<Arc<Slot<C>>> {
        let pair = create_handle_pair(self.factory.as_ref(), &self.internal)?;
        let thread = thread::current().id();
        let slot = Arc::new(Mutex::new(SlotState::Ready(pair)));

        {
            let mut slots = self.registry.slots.lock();
            slots.try_reserve(1).map_err(|err| {
                Error::ResourceAllocation(format!("cannot register thread handles: {err}"))
            })?;
            slots.insert(thread, Arc::clone(&slot));
        }

        let guard = ThreadGuard {
            thread,
            slot: Arc::clone(&slot),
            registry: Arc::downgrade(&self.registry),
        };
        let id = self.id;
        // On failure the closure is dropped unrun, and the guard with it
        // unregisters and releases the slot.
        THREAD_GUARDS
            .try_with(move |guards| {
                let mut guards = guards.borrow_mut();
                guards.retain(|_, guard| !guard.is_orphaned());
                guards.insert(id, Box::new(guard));
            })
            .map_err(|err| {
                Error::ResourceAllocation(format!("cannot install thread exit hook: {err}"))
            })?;

        self.registry.created.fetch_add(1, Ordering::SeqCst);
        debug!(internal = %self.internal, thread = ?thread, "created thread handle pair");
        Ok(slot)
    }
}

impl<C: CodeUnit> Drop for HandleCache<C> {
    fn drop(&mut self) {
        let guard = THREAD_GUARDS
            .try_with(|guards| {
                guards
                    .try_borrow_mut()
                    .ok()
                    .and_then(|mut guards| guards.remove(&self.id))
            })
            .ok()
            .flatten();
        drop(guard);
    }
}
