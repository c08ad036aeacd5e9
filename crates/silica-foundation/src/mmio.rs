//! Raw physical-address access. Every access here is volatile: the compiler may
//! not reorder volatile accesses against each other, merge them, or drop them.

use core::marker::PhantomData;
use core::ptr;

/// # Safety
/// `addr` must be mapped, aligned for `T` and writable with a `T`-sized store.
#[inline(always)]
pub unsafe fn write_volatile<T: Copy>(addr: usize, value: T) {
    ptr::write_volatile(addr as *mut T, value)
}

/// # Safety
/// `addr` must be mapped, aligned for `T` and readable with a `T`-sized load.
#[inline(always)]
pub unsafe fn read_volatile<T: Copy>(addr: usize) -> T {
    ptr::read_volatile(addr as *const T)
}

/// A fixed device register. The address contract is checked once, at
/// construction, so individual reads and writes are safe.
#[repr(transparent)]
pub struct MmioRegister<T> {
    addr: usize,
    _marker: PhantomData<T>,
}

impl<T> Clone for MmioRegister<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MmioRegister<T> {}

impl<T: Copy> MmioRegister<T> {
    /// # Safety
    /// Same contract as [`write_volatile`] and [`read_volatile`], for as long
    /// as the register is used.
    pub const unsafe fn new(addr: usize) -> Self {
        Self {
            addr,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub const fn addr(&self) -> usize {
        self.addr
    }

    #[inline(always)]
    pub fn write(&self, value: T) {
        unsafe { write_volatile(self.addr, value) }
    }

    #[inline(always)]
    pub fn read(&self) -> T {
        unsafe { read_volatile(self.addr) }
    }

    #[inline(always)]
    pub fn modify(&self, f: impl FnOnce(T) -> T) {
        self.write(f(self.read()))
    }
}
