//! # Stack machine
//! Owns a [`Memory`] and knows how to dispatch every [`Opcode`].
//!
//! Programs are laid out with [`Machine::set_address`] and [`Machine::insert`],
//! which can be chained. Any number of disjoint code regions can be inserted before
//! picking an entry point and calling [`Machine::execute`].
//!
//! Execution can also be driven one instruction at a time using [`Machine::steps`].
//! It returns an iterator, which makes it easy to log instructions or to bound the
//! number of steps, since nothing in the machine itself prevents a program from
//! looping forever.
//! ```rust
//! # use vonstack::machine::*;
//! let mut machine = Machine::with_sink(100, Vec::<i64>::new());
//! machine
//!     .set_address(10)
//!     .insert("PUSH", Some(1))?
//!     .insert("CALL", Some(10))?
//!     .set_address(10);
//! // Pushes 1 forever, until memory runs out.
//! for instruction in machine.steps().take(4) {
//!     println!("{}", instruction?);
//! }
//! # Ok::<(), vonstack::VmError>(())
//! ```
//!
//! # Calling convention
//! `CALL` does not save a return address. Callers push it themselves before the
//! `CALL`, and `RET` pops it straight into the instruction cursor.
//!
//! `CALL n` moves the instruction cursor to `n - 1`, so the cell right before any
//! call target gets dispatched once on the way in. **That cell must be a `NOP`.**

use core::{iter::FusedIterator, ops::ControlFlow};

use crate::{
    instruction::{Cell, Instruction, Opcode},
    memory::Memory,
    sink::OutputSink,
    VmError, VmResult,
};

/// How a successful call to [`Machine::execute`] ended.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum Outcome {
    /// Nothing was inserted nor any address set yet, so there was nothing to run.
    NoOp,
    /// A `STOP` instruction was dispatched.
    Halted,
}

/// The machine, printing values through an [`OutputSink`] `S`.
#[derive(Clone, Debug)]
pub struct Machine<S> {
    memory: Memory,
    sink: S,
}
#[cfg(feature = "std")]
impl Machine<crate::sink::StdoutSink> {
    /// Returns a machine with `size` cells of memory that prints to the standard output.
    pub fn new(size: usize) -> Self {
        Self::with_sink(size, crate::sink::StdoutSink)
    }
}
impl<S: OutputSink> Machine<S> {
    /// Returns a machine with `size` cells of memory that prints to `sink`.
    pub fn with_sink(size: usize, sink: S) -> Self {
        Self {
            memory: Memory::new(size),
            sink,
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }
    pub fn sink(&self) -> &S {
        &self.sink
    }
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Whether both cursors have been set, i.e. [`Machine::execute`] will actually
    /// run something.
    pub fn is_ready(&self) -> bool {
        self.memory.instruction_cursor().is_some() && self.memory.data_cursor().is_some()
    }

    /// Sets the address at which the next instruction is inserted, or from which
    /// execution starts.
    pub fn set_address(&mut self, address: usize) -> &mut Self {
        self.memory.set_instruction_cursor(address);
        self
    }

    /// Inserts an instruction, looked up by name, at the current address.
    /// # Example
    /// ```rust
    /// # use vonstack::{machine::Machine, VmError};
    /// let mut machine = Machine::with_sink(30, Vec::<i64>::new());
    /// machine.set_address(20).insert("PUSH", Some(40))?;
    /// assert_eq!(machine.memory().cells()[20].to_string(), "PUSH 40");
    /// assert_eq!(machine.memory().instruction_cursor(), Some(21));
    ///
    /// assert!(matches!(machine.insert("WUT", None), Err(VmError::UnknownOpcode(_))));
    /// # Ok::<(), vonstack::VmError>(())
    /// ```
    pub fn insert(&mut self, name: &str, argument: Option<i64>) -> VmResult<&mut Self> {
        let opcode = name.parse::<Opcode>()?;
        self.insert_instruction(Instruction::new(opcode, argument))
    }

    /// Inserts an instruction at the current address.
    pub fn insert_instruction(&mut self, instruction: Instruction) -> VmResult<&mut Self> {
        if instruction.opcode.takes_argument() && instruction.argument.is_none() {
            return Err(VmError::MissingArgument(instruction.opcode));
        }
        let address = self.memory.instruction_cursor().unwrap_or(0);
        self.memory.write_instruction(instruction)?;
        log::debug!("inserted {instruction} at {address}");
        Ok(self)
    }

    /// Returns an [`Execution`] that dispatches one instruction per step, starting at
    /// the current address.
    pub fn steps(&mut self) -> Execution<'_, S> {
        Execution {
            machine: self,
            finished: false,
        }
    }

    /// Runs from the current address until a `STOP` is dispatched.
    ///
    /// Does nothing if no address was ever set. Fails with [`VmError::StackOverflow`]
    /// if the instruction cursor leaves memory before reaching a `STOP`, or with
    /// whatever error the failing instruction raised.
    pub fn execute(&mut self) -> VmResult<Outcome> {
        if !self.is_ready() {
            log::debug!("cursors are unset, nothing to execute");
            return Ok(Outcome::NoOp);
        }
        for step in self.steps() {
            step?;
        }
        Ok(Outcome::Halted)
    }

    /// Applies the effect of a single instruction.
    ///
    /// Breaks only on `STOP`.
    fn dispatch(&mut self, instruction: Instruction) -> VmResult<ControlFlow<()>> {
        let memory = &mut self.memory;
        let argument = || {
            instruction
                .argument
                .ok_or(VmError::MissingArgument(instruction.opcode))
        };

        match instruction.opcode {
            Opcode::Push => memory.push_data(argument()?)?,
            Opcode::Mult => {
                let a = memory.pop_data()?;
                let b = memory.pop_data()?;
                memory.push_data(a.wrapping_mul(b))?
            }
            Opcode::Print => {
                let value = memory.pop_data()?;
                self.sink.emit(value)
            }
            Opcode::Call => {
                let target = argument()?;
                // Lands right before the target, which gets fetched next.
                let address = target
                    .checked_sub(1)
                    .and_then(|address| usize::try_from(address).ok())
                    .ok_or(VmError::InvalidJump(target))?;
                log::debug!("calling {target}");
                memory.set_instruction_cursor(address)
            }
            Opcode::Ret => {
                let target = memory.pop_data()?;
                let address = usize::try_from(target).map_err(|_| VmError::InvalidJump(target))?;
                log::debug!("returning to {address}");
                memory.set_instruction_cursor(address)
            }
            Opcode::Stop => return Ok(ControlFlow::Break(())),
            Opcode::Nop => {}
        }

        Ok(ControlFlow::Continue(()))
    }
}

/// Step by step execution, implemented as an iterator that dispatches instructions
/// in sequence and yields each of them.
///
/// It ends once a `STOP` instruction is dispatched, which is not yielded, or right
/// after yielding an error. It also yields nothing at all if the machine
/// [is not ready](Machine::is_ready).
pub struct Execution<'a, S> {
    machine: &'a mut Machine<S>,
    finished: bool,
}
impl<'a, S: OutputSink> Iterator for Execution<'a, S> {
    type Item = VmResult<Instruction>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let memory = &mut self.machine.memory;
        let (Some(address), Some(data_cursor)) =
            (memory.instruction_cursor(), memory.data_cursor())
        else {
            self.finished = true;
            return None;
        };

        // Fetching fails once the instruction cursor is out of memory.
        let cell = match memory.read_instruction() {
            Some(cell) if data_cursor <= memory.size() => cell,
            _ => {
                log::warn!("ran out of memory at address {address} without reaching STOP");
                self.finished = true;
                return Some(Err(VmError::StackOverflow));
            }
        };
        let instruction = match cell {
            Cell::Instruction(instruction) => instruction,
            Cell::Data(value) => {
                self.finished = true;
                return Some(Err(VmError::NotAnInstruction { address, value }));
            }
        };

        log::trace!("{address:>5}: {instruction}");
        match self.machine.dispatch(instruction) {
            Ok(ControlFlow::Continue(())) => Some(Ok(instruction)),
            Ok(ControlFlow::Break(())) => {
                log::debug!("halted at {address}");
                self.finished = true;
                None
            }
            Err(error) => {
                log::debug!("{instruction} at {address} failed: {error}");
                self.finished = true;
                Some(Err(error))
            }
        }
    }
}
impl<'a, S: OutputSink> FusedIterator for Execution<'a, S> {}
