//! State shared between trap entries and main-line code.
//!
//! The hart clears `mstatus.MIE` when it takes a trap, and `with_traps_masked`
//! clears it for main-line code. Those are the only two contexts that can hold
//! a `TrapsMasked` token, and `TrapShared` refuses access without one.
//!
//! Masking only excludes other code on a single hart. Off target nothing is
//! masked and threads are real, so there `TrapShared` is not `Sync` and cannot
//! live in a `static`.

use core::cell::{Cell, UnsafeCell};
use core::marker::PhantomData;

use crate::cpu;

/// Proof that no trap can preempt the current code.
pub struct TrapsMasked {
    _not_send: PhantomData<*mut ()>,
}

impl TrapsMasked {
    /// # Safety
    /// Only valid inside a trap entry, before anything sets `mstatus.MIE` again.
    #[inline(always)]
    pub unsafe fn assume() -> Self {
        Self {
            _not_send: PhantomData,
        }
    }
}

/// Runs `f` with machine interrupts masked, restoring the previous enable state.
#[inline]
pub fn with_traps_masked<R>(f: impl FnOnce(&mut TrapsMasked) -> R) -> R {
    let was_enabled = cpu::mask_interrupts();
    let mut masked = TrapsMasked {
        _not_send: PhantomData,
    };
    let ret = f(&mut masked);
    unsafe { cpu::restore_interrupts(was_enabled) };
    ret
}

pub struct TrapShared<T> {
    value: UnsafeCell<T>,
    borrowed: Cell<bool>,
}

// Access is serialized by `TrapsMasked` on the one hart; the borrow flag
// catches nesting.
#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
unsafe impl<T: Send> Sync for TrapShared<T> {}

impl<T> TrapShared<T> {
    pub const fn new(value: T) -> Self {
        Self {
            value: UnsafeCell::new(value),
            borrowed: Cell::new(false),
        }
    }

    /// Panics if the value is already borrowed further up the stack.
    pub fn with_mut<R>(&self, _masked: &mut TrapsMasked, f: impl FnOnce(&mut T) -> R) -> R {
        assert!(
            !self.borrowed.replace(true),
            "TrapShared borrowed re-entrantly"
        );
        let ret = f(unsafe { &mut *self.value.get() });
        self.borrowed.set(false);
        ret
    }

    pub fn get(&self, masked: &mut TrapsMasked) -> T
    where
        T: Copy,
    {
        self.with_mut(masked, |value| *value)
    }

    pub fn set(&self, masked: &mut TrapsMasked, value: T) {
        self.with_mut(masked, |slot| *slot = value)
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}
