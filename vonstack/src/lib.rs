//! # VonStack: a stack machine with a single shared memory
//! A minimal stack machine where executable instructions and runtime data live
//! in the same fixed-size memory region, Von Neumann style.
//!
//! Programs are laid out by inserting instructions at explicit addresses, then
//! executed from an entry point:
//! ```rust
//! # use vonstack::machine::*;
//! let mut machine = Machine::with_sink(100, Vec::<i64>::new());
//! machine
//!     .set_address(0)
//!     .insert("PUSH", Some(20))?
//!     .insert("PUSH", Some(3))?
//!     .insert("MULT", None)?
//!     .insert("PRINT", None)?
//!     .insert("STOP", None)?
//!     .set_address(0);
//! assert_eq!(machine.execute()?, Outcome::Halted);
//! assert_eq!(machine.sink(), &[60]);
//! # Ok::<(), vonstack::VmError>(())
//! ```
//!
//! The library does not rely on `std`. Disabling the default `std` feature
//! removes the standard output sink, everything else stays available.

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

use alloc::string::String;
use core::fmt::{Display, Formatter};

pub mod instruction;
pub mod machine;
pub mod memory;
pub mod sink;

pub use instruction::{Cell, Instruction, Opcode};
pub use machine::{Machine, Outcome};
pub use memory::Memory;
pub use sink::OutputSink;


pub type VmResult<T> = Result<T, VmError>;

/// Everything that can abort an insertion or an execution.
///
/// None of these are retried internally: the failing call returns immediately
/// and leaves the machine in whatever state it reached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VmError {
    /// The instruction cursor is at or past the end of memory while inserting code.
    InsertOverflow,
    /// A push moved the data cursor at or past the end of memory.
    DataOverflow,
    /// A pop was attempted while the data cursor is below the boundary.
    DataUnderflow,
    /// The fetch loop ran out of addressable memory without reaching `STOP`.
    StackOverflow,
    /// No opcode goes by that name.
    UnknownOpcode(String),
    /// `PUSH` and `CALL` need an argument.
    MissingArgument(Opcode),
    /// A jump targeted an address below zero.
    InvalidJump(i64),
    /// The fetched cell holds data, not an instruction.
    NotAnInstruction { address: usize, value: i64 },
    /// The popped cell holds an instruction, not data.
    NotAnInteger { address: usize },
}
impl Display for VmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InsertOverflow => write!(f, "stack overflow during insertion"),
            Self::DataOverflow => write!(f, "stack overflow while pushing data"),
            Self::DataUnderflow => write!(f, "stack underflow"),
            Self::StackOverflow => write!(f, "stack overflow"),
            Self::UnknownOpcode(name) => {
                write!(f, "invalid instruction given: {name}. choices are: ")?;
                for (i, opcode) in Opcode::ALL.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{opcode}")?;
                }
                Ok(())
            }
            Self::MissingArgument(opcode) => write!(f, "{opcode} requires an argument"),
            Self::InvalidJump(target) => write!(f, "cannot jump to negative address {target}"),
            Self::NotAnInstruction { address, value } => {
                write!(f, "tried to execute data {value} at address {address}")
            }
            Self::NotAnInteger { address } => {
                write!(f, "expected data at address {address}, found an instruction")
            }
        }
    }
}
#[cfg(feature = "std")]
impl std::error::Error for VmError {}
