//! # Memory cells
//! Every address of a [`Memory`](crate::memory::Memory) holds a [`Cell`]: either
//! an [`Instruction`] or a piece of data.
//!
//! Cells that were never written, or that were cleared by a pop, hold the
//! [`Cell::NOP`] sentinel. It is a plain value, compared by tag like any other
//! instruction.

use alloc::string::ToString;
use core::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use crate::VmError;

/// Names of the operations the machine knows how to dispatch.
#[derive(Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub enum Opcode {
    Call,
    Mult,
    Print,
    Push,
    Ret,
    Stop,
    Nop,
}
impl Opcode {
    /// Every opcode, in the order they are listed in diagnostics.
    pub const ALL: [Opcode; 7] = [
        Self::Call,
        Self::Mult,
        Self::Print,
        Self::Push,
        Self::Ret,
        Self::Stop,
        Self::Nop,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Call => "CALL",
            Self::Mult => "MULT",
            Self::Print => "PRINT",
            Self::Push => "PUSH",
            Self::Ret => "RET",
            Self::Stop => "STOP",
            Self::Nop => "NOP",
        }
    }

    /// Whether the opcode cannot be dispatched without an argument.
    pub const fn takes_argument(self) -> bool {
        matches!(self, Self::Call | Self::Push)
    }
}
impl FromStr for Opcode {
    type Err = VmError;

    /// Resolves an opcode by its exact (uppercase) name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|opcode| opcode.name() == s)
            .ok_or_else(|| VmError::UnknownOpcode(s.to_string()))
    }
}
impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// An opcode along with its optional argument.
///
/// Instructions are plain values: two insertions of the same opcode with different
/// arguments produce two independent records.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct Instruction {
    pub opcode: Opcode,
    pub argument: Option<i64>,
}
impl Instruction {
    pub const NOP: Self = Self::new(Opcode::Nop, None);

    pub const fn new(opcode: Opcode, argument: Option<i64>) -> Self {
        Self { opcode, argument }
    }
}
impl Display for Instruction {
    /// Formats as `PUSH 50`, or just `MULT` when there is no argument.
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self.argument {
            Some(argument) => write!(f, "{} {argument}", self.opcode),
            None => write!(f, "{}", self.opcode),
        }
    }
}

/// Content of a single memory address.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum Cell {
    Instruction(Instruction),
    Data(i64),
}
impl Cell {
    /// The empty cell.
    pub const NOP: Self = Self::Instruction(Instruction::NOP);

    pub fn is_nop(&self) -> bool {
        *self == Self::NOP
    }

    pub fn instruction(&self) -> Option<Instruction> {
        match self {
            Self::Instruction(instruction) => Some(*instruction),
            Self::Data(_) => None,
        }
    }

    pub fn data(&self) -> Option<i64> {
        match self {
            Self::Data(value) => Some(*value),
            Self::Instruction(_) => None,
        }
    }
}
impl Default for Cell {
    /// Same as [`Cell::NOP`].
    fn default() -> Self {
        Self::NOP
    }
}
impl From<Instruction> for Cell {
    fn from(instruction: Instruction) -> Self {
        Self::Instruction(instruction)
    }
}
impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Data(value)
    }
}
impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Instruction(instruction) => instruction.fmt(f),
            Self::Data(value) => value.fmt(f),
        }
    }
}
