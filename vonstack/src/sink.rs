//! # Output sink
//! `PRINT` is the only way a program talks to the outside world. Where the printed
//! values end up is up to the embedder, through the [`OutputSink`] trait.
//!
//! It is implemented for [`Vec<i64>`], which simply records every value, and
//! [`StdoutSink`] writes them to the standard output when the `std` feature is
//! enabled.

use alloc::vec::Vec;

pub trait OutputSink {
    /// Called exactly once per dispatched `PRINT`, in dispatch order.
    fn emit(&mut self, value: i64);
}

impl OutputSink for Vec<i64> {
    fn emit(&mut self, value: i64) {
        self.push(value)
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn emit(&mut self, value: i64) {
        (**self).emit(value)
    }
}

/// Prints every value on its own line to the standard output.
#[cfg(feature = "std")]
#[derive(Clone, Copy, Default, Debug)]
pub struct StdoutSink;
#[cfg(feature = "std")]
impl OutputSink for StdoutSink {
    fn emit(&mut self, value: i64) {
        std::println!("{value}")
    }
}
