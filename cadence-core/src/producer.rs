//! Producer capability and the command sink it writes into
//!
//! A producer is invoked repeatedly by the fetch cycle. Each invocation
//! appends a bounded batch of commands to the sink and reports whether the
//! task has more to say. Producers run with the bus interrupt enabled, so
//! the sink only ever exposes the checked-out back buffer.

use cadence_hal::FaultReporter;

use crate::buffer::CommandBuffer;
use crate::command::Command;
use crate::fault::Violation;

/// Outcome of one producer invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Progress {
    /// Call again once this batch is queued
    More,
    /// Task finished; it leaves the queue
    Done,
}

/// Incremental source of bus commands
pub trait Producer {
    /// Append the next batch of commands
    ///
    /// Must append at least one command per call.
    fn produce(&mut self, sink: &mut CommandSink<'_>) -> Progress;
}

/// Append-only view of the back buffer handed to a producer
///
/// Every method checks capacity; a violation goes straight to the fault
/// reporter.
pub struct CommandSink<'s> {
    buffer: &'s mut CommandBuffer,
    address: u8,
    fault: &'s dyn FaultReporter,
}

impl<'s> CommandSink<'s> {
    /// Wrap `buffer` for a task targeting `address`
    pub fn new(buffer: &'s mut CommandBuffer, address: u8, fault: &'s dyn FaultReporter) -> Self {
        Self {
            buffer,
            address,
            fault,
        }
    }

    fn check(&self, result: Result<(), Violation>) {
        if let Err(violation) = result {
            self.fault.report(violation.into());
        }
    }

    /// Append a raw command
    pub fn append(&mut self, command: Command) {
        let result = self.buffer.append(command);
        self.check(result);
    }

    /// Queue one data byte
    pub fn send_byte(&mut self, byte: u8) {
        self.append(Command::SendData(byte));
    }

    /// Queue a run of data bytes
    pub fn send_bytes(&mut self, bytes: &[u8]) {
        let result = self.buffer.append_data(bytes);
        self.check(result);
    }

    /// Queue a start condition followed by the task's write address
    pub fn send_start(&mut self) {
        if self.address & 1 != 0 {
            self.fault.report(Violation::ReadAddress.into());
        }
        self.append(Command::Start);
        self.append(Command::SendData(self.address));
    }

    /// Queue a stop condition
    pub fn end_transmission(&mut self) {
        self.append(Command::Stop);
    }

    /// Target write address of the active task
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Commands that still fit in this batch
    pub fn remaining(&self) -> usize {
        self.buffer.remaining()
    }

    /// Commands appended so far in this batch
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been appended yet
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::COMMAND_BUFFER_CAPACITY;
    use crate::fault::PanicFault;

    #[test]
    fn test_send_start_appends_address() {
        let mut buffer = CommandBuffer::new();
        let mut sink = CommandSink::new(&mut buffer, 0xA0, &PanicFault);
        sink.send_start();
        sink.send_bytes(&[0x01, 0x02]);
        sink.end_transmission();
        assert_eq!(sink.len(), 5);

        assert_eq!(
            buffer.as_slice(),
            &[
                Command::Start,
                Command::SendData(0xA0),
                Command::SendData(0x01),
                Command::SendData(0x02),
                Command::Stop,
            ]
        );
    }

    #[test]
    #[should_panic(expected = "read address")]
    fn test_send_start_rejects_read_address() {
        let mut buffer = CommandBuffer::new();
        let mut sink = CommandSink::new(&mut buffer, 0x79, &PanicFault);
        sink.send_start();
    }

    #[test]
    #[should_panic(expected = "command buffer full")]
    fn test_overflow_faults() {
        let mut buffer = CommandBuffer::new();
        let mut sink = CommandSink::new(&mut buffer, 0x78, &PanicFault);
        for _ in 0..=COMMAND_BUFFER_CAPACITY {
            sink.send_byte(0xFF);
        }
    }

    #[test]
    #[should_panic(expected = "empty send")]
    fn test_empty_send_bytes_faults() {
        let mut buffer = CommandBuffer::new();
        let mut sink = CommandSink::new(&mut buffer, 0x78, &PanicFault);
        sink.send_bytes(&[]);
    }

    #[test]
    #[should_panic(expected = "invalid command")]
    fn test_pending_append_faults() {
        let mut buffer = CommandBuffer::new();
        let mut sink = CommandSink::new(&mut buffer, 0x78, &PanicFault);
        sink.append(Command::Pending);
    }

    #[test]
    fn test_remaining_tracks_appends() {
        let mut buffer = CommandBuffer::new();
        let mut sink = CommandSink::new(&mut buffer, 0x78, &PanicFault);
        assert!(sink.is_empty());
        sink.send_start();
        assert_eq!(sink.remaining(), COMMAND_BUFFER_CAPACITY - 2);
    }
}
