//! Command buffers and the front/back swap protocol
//!
//! Two fixed slots hold commands. The *front* slot is drained by the state
//! machine through a cursor; the *back* slot is filled by a producer. While
//! a producer runs, the back buffer is moved out of its slot entirely, so
//! the interrupt side cannot observe a half-filled buffer.

use heapless::Vec;

use crate::command::Command;
use crate::config::COMMAND_BUFFER_CAPACITY;
use crate::fault::Violation;

/// Fixed-capacity ordered run of commands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBuffer {
    commands: Vec<Command, COMMAND_BUFFER_CAPACITY>,
}

impl CommandBuffer {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Append a command
    pub fn append(&mut self, command: Command) -> Result<(), Violation> {
        if command.is_pending() {
            return Err(Violation::InvalidCommand);
        }
        self.commands
            .push(command)
            .map_err(|_| Violation::BufferFull)
    }

    /// Append one `SendData` per byte, all or nothing
    pub fn append_data(&mut self, bytes: &[u8]) -> Result<(), Violation> {
        if bytes.is_empty() {
            return Err(Violation::EmptySend);
        }
        if bytes.len() > self.remaining() {
            return Err(Violation::BufferFull);
        }
        for &byte in bytes {
            // Capacity checked above
            let _ = self.commands.push(Command::SendData(byte));
        }
        Ok(())
    }

    /// Command at `index`, or `Pending` past the end
    pub fn get(&self, index: usize) -> Command {
        self.commands.get(index).copied().unwrap_or_default()
    }

    /// Number of commands stored
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are stored
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Free slots left
    pub fn remaining(&self) -> usize {
        COMMAND_BUFFER_CAPACITY - self.commands.len()
    }

    /// Stored commands in order
    pub fn as_slice(&self) -> &[Command] {
        &self.commands
    }

    /// Drop all commands
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

/// Identity of a buffer slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Slot {
    A,
    B,
}

impl Slot {
    const fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }

    const fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

/// The two command slots plus the consumer's read position
#[derive(Debug)]
pub(crate) struct DoubleBuffer {
    slots: [CommandBuffer; 2],
    front: Slot,
    cursor: usize,
    current: Command,
    back_lent: bool,
}

impl DoubleBuffer {
    pub(crate) const fn new() -> Self {
        Self {
            slots: [CommandBuffer::new(), CommandBuffer::new()],
            front: Slot::A,
            cursor: 0,
            current: Command::Pending,
            back_lent: false,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    fn front_buffer(&self) -> &CommandBuffer {
        &self.slots[self.front.index()]
    }

    fn back_buffer(&mut self) -> &mut CommandBuffer {
        &mut self.slots[self.front.other().index()]
    }

    /// Slot currently being drained
    #[cfg(test)]
    pub(crate) fn front(&self) -> Slot {
        self.front
    }

    /// Cached command at the cursor
    pub(crate) fn current(&self) -> Command {
        self.current
    }

    pub(crate) fn set_current(&mut self, command: Command) {
        self.current = command;
    }

    #[cfg(test)]
    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn front_len(&self) -> usize {
        self.front_buffer().len()
    }

    /// Whether every front command has been issued
    pub(crate) fn is_drained(&self) -> bool {
        self.cursor == self.front_len()
    }

    /// Move the cursor past the current command
    ///
    /// Loads the next command into the cache and returns `true`, or returns
    /// `false` once the front buffer is exhausted (the cache is left for the
    /// caller to decide between swapping and parking).
    pub(crate) fn advance(&mut self) -> bool {
        self.cursor += 1;
        if self.is_drained() {
            return false;
        }
        self.current = self.front_buffer().get(self.cursor);
        true
    }

    /// Hand the back buffer to a producer
    pub(crate) fn lend_back(&mut self) -> Result<CommandBuffer, Violation> {
        if self.back_lent || !self.back_buffer().is_empty() {
            return Err(Violation::BackBufferUnavailable);
        }
        self.back_lent = true;
        Ok(core::mem::take(self.back_buffer()))
    }

    /// Take the filled back buffer back from a producer
    pub(crate) fn return_back(&mut self, buffer: CommandBuffer) {
        *self.back_buffer() = buffer;
        self.back_lent = false;
    }

    /// Exchange front and back
    ///
    /// Requires a non-empty back buffer and a fully drained front buffer.
    pub(crate) fn swap(&mut self) -> Result<(), Violation> {
        if self.back_lent || self.back_buffer().is_empty() {
            return Err(Violation::SwapEmptyBack);
        }
        if !self.is_drained() {
            return Err(Violation::SwapFrontNotDrained);
        }

        self.front = self.front.other();
        self.back_buffer().clear();
        self.cursor = 0;
        self.current = self.front_buffer().get(0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(double: &mut DoubleBuffer, commands: &[Command]) {
        let mut back = double.lend_back().unwrap();
        for &command in commands {
            back.append(command).unwrap();
        }
        double.return_back(back);
    }

    #[test]
    fn test_append_until_full() {
        let mut buffer = CommandBuffer::new();
        for i in 0..COMMAND_BUFFER_CAPACITY {
            buffer.append(Command::SendData(i as u8)).unwrap();
        }
        assert_eq!(buffer.remaining(), 0);
        assert_eq!(
            buffer.append(Command::Stop),
            Err(Violation::BufferFull)
        );
        assert_eq!(buffer.len(), COMMAND_BUFFER_CAPACITY);
    }

    #[test]
    fn test_append_data_is_all_or_nothing() {
        let mut buffer = CommandBuffer::new();
        buffer.append(Command::Start).unwrap();
        let bytes = [0u8; COMMAND_BUFFER_CAPACITY];
        assert_eq!(buffer.append_data(&bytes), Err(Violation::BufferFull));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.append_data(&[]), Err(Violation::EmptySend));
    }

    #[test]
    fn test_pending_is_rejected() {
        let mut buffer = CommandBuffer::new();
        assert_eq!(
            buffer.append(Command::Pending),
            Err(Violation::InvalidCommand)
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_get_past_end_is_pending() {
        let mut buffer = CommandBuffer::new();
        buffer.append(Command::Start).unwrap();
        assert_eq!(buffer.get(0), Command::Start);
        assert_eq!(buffer.get(1), Command::Pending);
    }

    #[test]
    fn test_swap_loads_first_command() {
        let mut double = DoubleBuffer::new();
        filled(&mut double, &[Command::Start, Command::SendData(0x78)]);

        double.swap().unwrap();
        assert_eq!(double.front(), Slot::B);
        assert_eq!(double.cursor(), 0);
        assert_eq!(double.current(), Command::Start);
        assert_eq!(double.front_len(), 2);

        assert!(double.advance());
        assert_eq!(double.current(), Command::SendData(0x78));
        assert!(!double.advance());
        assert!(double.is_drained());
    }

    #[test]
    fn test_swap_requires_filled_back() {
        let mut double = DoubleBuffer::new();
        assert_eq!(double.swap(), Err(Violation::SwapEmptyBack));
    }

    #[test]
    fn test_swap_requires_drained_front() {
        let mut double = DoubleBuffer::new();
        filled(&mut double, &[Command::Start, Command::Stop]);
        double.swap().unwrap();
        filled(&mut double, &[Command::Start]);

        assert_eq!(double.swap(), Err(Violation::SwapFrontNotDrained));

        double.advance();
        double.advance();
        double.swap().unwrap();
        assert_eq!(double.front(), Slot::A);
    }

    #[test]
    fn test_swap_while_lent_fails() {
        let mut double = DoubleBuffer::new();
        let _back = double.lend_back().unwrap();
        assert_eq!(double.swap(), Err(Violation::SwapEmptyBack));
        assert_eq!(
            double.lend_back().unwrap_err(),
            Violation::BackBufferUnavailable
        );
    }

    #[test]
    fn test_new_back_is_cleared_after_swap() {
        let mut double = DoubleBuffer::new();
        filled(&mut double, &[Command::Stop]);
        double.swap().unwrap();
        double.advance();
        filled(&mut double, &[Command::Start]);
        double.swap().unwrap();

        let back = double.lend_back().unwrap();
        assert!(back.is_empty());
    }
}
