//! Debug-only guard around chain probing.
//!
//! Probing a chain runs user code (`K: Hash` and `K: Eq`). If that code
//! reaches back into the same table, the nested call would observe a
//! table that is halfway through an operation. In debug builds the guard
//! records which operation is probing and panics on a nested entry,
//! naming both operations. In release builds it is zero-sized and free.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::fmt;
#[cfg(not(debug_assertions))]
use core::marker::PhantomData;

/// Table operations that probe chains.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Probe {
    Get,
    GetMut,
    Contains,
    Insert,
    Remove,
    BucketIndex,
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Probe::Get => "get",
            Probe::GetMut => "get_mut",
            Probe::Contains => "contains_key",
            Probe::Insert => "insert",
            Probe::Remove => "remove",
            Probe::BucketIndex => "bucket_index",
        };
        f.write_str(name)
    }
}

/// Embedded in the table; each probing method opens a scope with
/// `let _g = self.guard.enter(Probe::...)` that ends before the table is
/// mutated.
#[derive(Debug, Default)]
pub(crate) struct ProbeGuard {
    #[cfg(debug_assertions)]
    active: Cell<Option<Probe>>,
}

impl ProbeGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
        }
    }

    #[inline]
    pub(crate) fn enter(&self, probe: Probe) -> ProbeScope<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!("reentrant call to `{probe}` while `{outer}` is probing the same table");
            }
            self.active.set(Some(probe));
            return ProbeScope { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = probe;
            return ProbeScope { _owner: PhantomData };
        }
    }

    #[cfg(all(test, debug_assertions))]
    pub(crate) fn active(&self) -> Option<Probe> {
        self.active.get()
    }
}

pub(crate) struct ProbeScope<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ProbeGuard,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a ProbeGuard>,
}

impl Drop for ProbeScope<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}
