//! Boot-time tracing for Silica.
//!
//! With the `debug` feature enabled, `writeln!` formats into a small stack
//! buffer and hands complete chunks to the platform hook
//! `__silica_debug_write`. Without it the macro expands to dead code, so trace
//! points cost nothing in release images.

#![no_std]

use core::fmt;

#[cfg(feature = "debug")]
extern "C" {
    // Platform must provide this function when `debug` is enabled.
    fn __silica_debug_write(buf: *const u8, len: usize);
}

#[cfg(feature = "debug")]
#[doc(hidden)]
pub fn __write_line(args: fmt::Arguments<'_>) {
    let mut line = LineBuffer::new(|chunk: &[u8]| unsafe {
        __silica_debug_write(chunk.as_ptr(), chunk.len())
    });
    let _ = fmt::Write::write_fmt(&mut line, args);
    let _ = fmt::Write::write_str(&mut line, "\n");
    line.flush();
}

#[cfg(feature = "debug")]
#[macro_export]
macro_rules! writeln {
    ($($arg:tt)*) => {
        $crate::__write_line(core::format_args!($($arg)*))
    };
}

#[cfg(not(feature = "debug"))]
#[doc(hidden)]
#[inline(always)]
pub fn __discard(_args: fmt::Arguments<'_>) {}

#[cfg(not(feature = "debug"))]
#[macro_export]
macro_rules! writeln {
    ($($arg:tt)*) => {
        if false {
            $crate::__discard(core::format_args!($($arg)*))
        }
    };
}

pub const LINE_CAPACITY: usize = 128;

/// Fixed-capacity formatting buffer that spills to `sink` whenever it fills up.
pub struct LineBuffer<F: FnMut(&[u8])> {
    buf: [u8; LINE_CAPACITY],
    len: usize,
    sink: F,
}

impl<F: FnMut(&[u8])> LineBuffer<F> {
    pub const fn new(sink: F) -> Self {
        Self {
            buf: [0; LINE_CAPACITY],
            len: 0,
            sink,
        }
    }

    pub fn flush(&mut self) {
        if self.len != 0 {
            (self.sink)(&self.buf[..self.len]);
            self.len = 0;
        }
    }
}

impl<F: FnMut(&[u8])> fmt::Write for LineBuffer<F> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for &byte in s.as_bytes() {
            if self.len == LINE_CAPACITY {
                self.flush();
            }
            self.buf[self.len] = byte;
            self.len += 1;
        }
        Ok(())
    }
}
