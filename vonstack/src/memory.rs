//! # Unified memory
//! A fixed number of [`Cell`]s shared by code and data.
//!
//! Two cursors walk this region:
//! - the *instruction cursor*, pointing at the next instruction to fetch (or write),
//! - the *data cursor*, pointing at the most recently pushed value.
//!
//! Code and data are kept apart by a movable wall, the *boundary*. It is the lowest
//! address data may occupy and only ever moves up, each time code is written at
//! or above it. Writing code also rearms the data region right below the boundary,
//! discarding anything pushed so far.
//!
//! | **Address** | 0 | 1 | 2 | 3 | 4 | 5 | ... |
//! | ----------- | - | - | - | - | - | - | --- |
//! | **Cell** | PUSH 20 | PUSH 3 | MULT | STOP | 20 | 3 | NOP |
//! | | | | | | boundary | data cursor | |

use alloc::{vec, vec::Vec};

use crate::{
    instruction::{Cell, Instruction},
    VmError, VmResult,
};

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Memory {
    cells: Vec<Cell>,
    instruction_cursor: Option<usize>,
    // `None` sits one below address 0: either never set, or popped down past it.
    data_cursor: Option<usize>,
    boundary: usize,
}
impl Memory {
    /// Returns a memory of `size` cells, all holding [`Cell::NOP`], with both
    /// cursors unset.
    /// # Example
    /// ```rust
    /// # use vonstack::{memory::Memory, Cell};
    /// let memory = Memory::new(12);
    /// assert_eq!(memory.size(), 12);
    /// assert!(memory.cells().iter().all(Cell::is_nop));
    /// assert_eq!(memory.instruction_cursor(), None);
    /// ```
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![Cell::NOP; size],
            instruction_cursor: None,
            data_cursor: None,
            boundary: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
    pub fn instruction_cursor(&self) -> Option<usize> {
        self.instruction_cursor
    }
    pub fn data_cursor(&self) -> Option<usize> {
        self.data_cursor
    }
    pub fn boundary(&self) -> usize {
        self.boundary
    }

    /// Iterates over every cell that does not hold the `NOP` sentinel, along
    /// with its address.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_nop())
    }

    /// Moves the instruction cursor. The address is not checked against the size
    /// of memory here, only when it gets used.
    pub fn set_instruction_cursor(&mut self, address: usize) {
        self.instruction_cursor = Some(address)
    }

    /// Writes an instruction at the instruction cursor and advances it, then
    /// raises the boundary if needed and resets the data region right below it.
    ///
    /// Writing with an unset instruction cursor starts at address 0.
    /// # Example
    /// ```rust
    /// # use vonstack::{memory::Memory, Instruction};
    /// let mut memory = Memory::new(12);
    /// memory.set_instruction_cursor(3);
    /// memory.write_instruction(Instruction::NOP)?;
    /// assert_eq!(memory.instruction_cursor(), Some(4));
    /// assert_eq!(memory.boundary(), 4);
    /// assert_eq!(memory.data_cursor(), Some(3));
    /// # Ok::<(), vonstack::VmError>(())
    /// ```
    pub fn write_instruction(&mut self, instruction: Instruction) -> VmResult<()> {
        let cursor = self.instruction_cursor.unwrap_or(0);
        if cursor >= self.size() {
            return Err(VmError::InsertOverflow);
        }
        self.cells[cursor] = Cell::Instruction(instruction);
        let cursor = cursor + 1;
        self.instruction_cursor = Some(cursor);

        if cursor >= self.boundary {
            self.boundary = cursor
        }
        // The boundary is at least 1 here, this never wraps.
        self.data_cursor = Some(self.boundary - 1);
        Ok(())
    }

    /// Returns the cell at the instruction cursor and advances it.
    ///
    /// Returns `None` without moving anything if the cursor is unset or past the
    /// end of memory: checking that before fetching is up to the caller.
    pub fn read_instruction(&mut self) -> Option<Cell> {
        let cursor = self.instruction_cursor?;
        let cell = *self.cells.get(cursor)?;
        self.instruction_cursor = Some(cursor + 1);
        Some(cell)
    }

    /// Pushes a value on top of the data region.
    ///
    /// The cursor is incremented before checking for overflow, so a failed push
    /// leaves it one past the end of memory without writing anything.
    /// # Example
    /// ```rust
    /// # use vonstack::{memory::Memory, VmError};
    /// let mut memory = Memory::new(2);
    /// memory.push_data(4)?;
    /// memory.push_data(10)?;
    /// assert_eq!(memory.push_data(12), Err(VmError::DataOverflow));
    /// # Ok::<(), vonstack::VmError>(())
    /// ```
    pub fn push_data(&mut self, value: i64) -> VmResult<()> {
        let cursor = self.data_cursor.map_or(0, |cursor| cursor + 1);
        self.data_cursor = Some(cursor);
        if cursor >= self.size() {
            return Err(VmError::DataOverflow);
        }
        self.cells[cursor] = Cell::Data(value);
        Ok(())
    }

    /// Pops the value on top of the data region, clearing its cell back to `NOP`.
    ///
    /// Fails without touching anything if the data cursor is below the boundary,
    /// or past the end of memory after a failed push.
    /// # Example
    /// ```rust
    /// # use vonstack::{memory::Memory, VmError};
    /// let mut memory = Memory::new(12);
    /// memory.push_data(1)?;
    /// memory.push_data(4)?;
    /// assert_eq!(memory.pop_data()?, 4);
    /// assert_eq!(memory.pop_data()?, 1);
    /// assert_eq!(memory.pop_data(), Err(VmError::DataUnderflow));
    /// # Ok::<(), vonstack::VmError>(())
    /// ```
    pub fn pop_data(&mut self) -> VmResult<i64> {
        let cursor = match self.data_cursor {
            Some(cursor) if cursor >= self.boundary => cursor,
            _ => return Err(VmError::DataUnderflow),
        };
        // Left past the end of memory by a failed push.
        let cell = self.cells.get(cursor).ok_or(VmError::DataOverflow)?;
        // Data above the boundary is only ever written by `push_data`.
        let value = cell
            .data()
            .ok_or(VmError::NotAnInteger { address: cursor })?;
        self.cells[cursor] = Cell::NOP;
        self.data_cursor = cursor.checked_sub(1);
        Ok(value)
    }
}
