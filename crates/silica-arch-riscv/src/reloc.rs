//! Pre-`main` memory setup: copy the initialized-data image from its load
//! address into RAM, then clear `.bss`.
//!
//! Both passes move 32-bit words with volatile accesses, so the compiler can
//! neither turn them into a `memcpy`/`memset` call nor drop them. Nothing here
//! may touch a static: it runs before statics hold their values.

use core::ptr;

pub type Word = u32;
pub const WORD_BYTES: usize = core::mem::size_of::<Word>();

/// A half-open, word-aligned RAM range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    start: *mut Word,
    end: *mut Word,
}

impl Region {
    /// # Safety
    /// `start..end` must be one writable, word-aligned allocation with
    /// `start <= end`.
    pub const unsafe fn new(start: *mut Word, end: *mut Word) -> Self {
        Self { start, end }
    }

    pub fn from_mut_slice(words: &mut [Word]) -> Self {
        let range = words.as_mut_ptr_range();
        Self {
            start: range.start,
            end: range.end,
        }
    }

    pub fn start(&self) -> *mut Word {
        self.start
    }

    pub fn len_words(&self) -> usize {
        (self.end as usize - self.start as usize) / WORD_BYTES
    }

    pub fn len_bytes(&self) -> usize {
        self.len_words() * WORD_BYTES
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Copies `data.len_words()` words from `image` into `data`. Returns the
/// number of words copied.
///
/// # Safety
/// `image` must be readable for `data.len_bytes()` bytes and must not overlap
/// `data`. `data` must satisfy the contract of [`Region::new`].
pub unsafe fn relocate(image: *const Word, data: Region) -> usize {
    let mut src = image;
    let mut dst = data.start;
    while dst < data.end {
        ptr::write_volatile(dst, ptr::read_volatile(src));
        src = src.add(1);
        dst = dst.add(1);
    }
    data.len_words()
}

/// Clears every word of `bss`. Returns the number of words cleared.
///
/// # Safety
/// `bss` must satisfy the contract of [`Region::new`].
pub unsafe fn zero_fill(bss: Region) -> usize {
    let mut dst = bss.start;
    while dst < bss.end {
        ptr::write_volatile(dst, 0);
        dst = dst.add(1);
    }
    bss.len_words()
}

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
mod linked {
    use super::{relocate, zero_fill, Region, Word};
    use core::ptr::{addr_of, addr_of_mut};

    extern "C" {
        static _sidata: Word;
        static mut _sdata: Word;
        static mut _edata: Word;
        static mut _sbss: Word;
        static mut _ebss: Word;
    }

    /// The `.data` image and the `.data`/`.bss` regions the linker placed.
    ///
    /// # Safety
    /// The linker script must define the five boundary symbols, word
    /// aligned, with the image holding exactly `_edata - _sdata` bytes.
    pub unsafe fn linked_regions() -> (*const Word, Region, Region) {
        (
            addr_of!(_sidata),
            Region::new(addr_of_mut!(_sdata), addr_of_mut!(_edata)),
            Region::new(addr_of_mut!(_sbss), addr_of_mut!(_ebss)),
        )
    }

    /// Called once from `_start`, with traps masked and before `mtvec` is set.
    ///
    /// # Safety
    /// See [`linked_regions`]. Must run before any static is read.
    #[no_mangle]
    pub unsafe extern "C" fn __silica_init_memory() {
        let (image, data, bss) = linked_regions();
        relocate(image, data);
        zero_fill(bss);
    }
}

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub use linked::{__silica_init_memory, linked_regions};
