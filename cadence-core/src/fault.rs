//! Contract violations and the default fault reporter
//!
//! Engine internals return `Result<_, Violation>`; the engine escalates every
//! `Err` to its [`FaultReporter`]. None of these are recoverable: they mean a
//! producer or caller broke a documented precondition.

use cadence_hal::{Fault, FaultCategory, FaultReporter};

use crate::fmt::error;

/// A broken engine precondition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Violation {
    /// Task enqueued while the task queue is at capacity
    QueueFull = 0x10,
    /// Head task requested from an empty queue
    QueueEmpty = 0x11,
    /// Head task checked out twice
    HeadAlreadyLent = 0x12,
    /// Head task returned while not checked out
    HeadNotLent = 0x13,
    /// Caller-held task reached a fetch cycle run by someone else
    ScopedProducerMissing = 0x14,
    /// Back buffer would exceed its capacity
    BufferFull = 0x20,
    /// Swap attempted with an empty back buffer
    SwapEmptyBack = 0x21,
    /// Swap attempted before the front buffer was drained
    SwapFrontNotDrained = 0x22,
    /// Back buffer checked out while already lent or not empty
    BackBufferUnavailable = 0x23,
    /// Producer returned without appending anything
    ProducerStalled = 0x30,
    /// `send_bytes` called with an empty slice
    EmptySend = 0x31,
    /// Address with the read bit set passed to `send_start`
    ReadAddress = 0x32,
    /// `Pending` appended to a buffer
    InvalidCommand = 0x33,
    /// Command processed while the transmitter is inactive
    TransmitterInactive = 0x40,
    /// Transmitter started while already active
    TransmitterActive = 0x41,
    /// Transmitter started with no command loaded
    NothingToTransmit = 0x42,
}

impl Violation {
    /// Numeric code reported with the fault
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Short description reported with the fault
    pub const fn description(self) -> &'static str {
        match self {
            Violation::QueueFull => "task queue full",
            Violation::QueueEmpty => "task queue empty",
            Violation::HeadAlreadyLent => "head task already lent",
            Violation::HeadNotLent => "head task not lent",
            Violation::ScopedProducerMissing => "scoped task without its producer",
            Violation::BufferFull => "command buffer full",
            Violation::SwapEmptyBack => "swap with empty back buffer",
            Violation::SwapFrontNotDrained => "swap before front buffer drained",
            Violation::BackBufferUnavailable => "back buffer unavailable",
            Violation::ProducerStalled => "producer appended nothing",
            Violation::EmptySend => "empty send",
            Violation::ReadAddress => "read address in write start",
            Violation::InvalidCommand => "invalid command",
            Violation::TransmitterInactive => "transmitter inactive",
            Violation::TransmitterActive => "transmitter already active",
            Violation::NothingToTransmit => "no command loaded",
        }
    }
}

impl From<Violation> for Fault {
    fn from(violation: Violation) -> Self {
        Fault::new(
            FaultCategory::Contract,
            violation.code(),
            violation.description(),
        )
    }
}

/// Fault reporter that logs and panics
///
/// On target, pair it with a panic handler such as `panic-probe`; on the
/// host it turns faults into test failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicFault;

impl FaultReporter for PanicFault {
    fn report(&self, fault: Fault) -> ! {
        error!(
            "fault {}: code {=u8:#x}: {=str}",
            fault.category, fault.code, fault.description
        );
        panic!(
            "{:?} fault {:#04x}: {}",
            fault.category, fault.code, fault.description
        )
    }
}
