// Shared fixtures for the oxidex-unique integration tests.
//
// `Tracked` values report their id when dropped and `CountingDelete`
// records every id it releases, so tests can tell policy releases apart
// from manual frees.

#![allow(dead_code)]

use oxidex_unique::{Delete, UniquePtr};
use std::cell::{Cell, RefCell};
use std::ptr::NonNull;
use std::rc::Rc;

/// Shared record of drops and policy releases.
#[derive(Default)]
pub struct Ledger {
    next_id: Cell<u64>,
    dropped: RefCell<Vec<u64>>,
    released: RefCell<Vec<u64>>,
}

impl Ledger {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Allocates a fresh tracked value on the heap.
    pub fn alloc(self: &Rc<Self>) -> (*mut Tracked, u64) {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let raw = Box::into_raw(Box::new(Tracked {
            id,
            ledger: Rc::clone(self),
        }));
        (raw, id)
    }

    pub fn created(&self) -> u64 {
        self.next_id.get()
    }

    pub fn dropped(&self) -> Vec<u64> {
        self.dropped.borrow().clone()
    }

    pub fn released(&self) -> Vec<u64> {
        self.released.borrow().clone()
    }

    pub fn times_released(&self, id: u64) -> usize {
        self.released.borrow().iter().filter(|&&r| r == id).count()
    }
}

/// A heap value that reports its own destruction.
pub struct Tracked {
    pub id: u64,
    ledger: Rc<Ledger>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.ledger.dropped.borrow_mut().push(self.id);
    }
}

/// Releases `Box<Tracked>` memory and logs the released id.
#[derive(Clone)]
pub struct CountingDelete {
    pub ledger: Rc<Ledger>,
}

impl Delete<Tracked> for CountingDelete {
    unsafe fn delete(&mut self, ptr: NonNull<Tracked>) {
        // SAFETY: the handle only passes live pointers from `Ledger::alloc`.
        let boxed = unsafe { Box::from_raw(ptr.as_ptr()) };
        self.ledger.released.borrow_mut().push(boxed.id);
    }
}

pub type Counted = UniquePtr<Tracked, CountingDelete>;

/// Creates a handle owning a fresh tracked value.
pub fn owning(ledger: &Rc<Ledger>) -> (Counted, u64) {
    let (raw, id) = ledger.alloc();
    let handle = unsafe {
        UniquePtr::from_raw_with(
            raw,
            CountingDelete {
                ledger: Rc::clone(ledger),
            },
        )
    };
    (handle, id)
}

/// Creates an empty handle sharing `ledger`.
pub fn empty(ledger: &Rc<Ledger>) -> Counted {
    UniquePtr::null_with(CountingDelete {
        ledger: Rc::clone(ledger),
    })
}
