//! Host-side test doubles
//!
//! `RecordingBus` logs every primitive and remembers which completion
//! interrupt the hardware would raise next. Tests (or a thread standing in
//! for the interrupt context) deliver it with [`pump`].

use std::sync::{Arc, Mutex};
use std::vec::Vec;

use cadence_hal::{BusStatus, I2cConfig, TwiTransmitter};

use crate::command::Command;
use crate::engine::Engine;
use crate::fault::PanicFault;

/// Primitive issued to the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Init(u32),
    Start,
    Byte(u8),
    Stop,
    DisableInterrupt,
}

impl BusOp {
    /// The command that should have produced this primitive
    pub fn command(self) -> Option<Command> {
        match self {
            BusOp::Start => Some(Command::Start),
            BusOp::Byte(byte) => Some(Command::SendData(byte)),
            BusOp::Stop => Some(Command::Stop),
            BusOp::Init(_) | BusOp::DisableInterrupt => None,
        }
    }
}

#[derive(Debug, Default)]
struct Wire {
    ops: Vec<BusOp>,
    pending: Option<BusStatus>,
    after_start: bool,
}

/// Shared view of what the bus has seen
#[derive(Debug, Default)]
pub struct BusLog {
    wire: Mutex<Wire>,
}

impl BusLog {
    fn wire(&self) -> std::sync::MutexGuard<'_, Wire> {
        self.wire.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, op: BusOp) {
        let mut wire = self.wire();
        let raises = match op {
            BusOp::Start => Some(BusStatus::START),
            BusOp::Byte(_) if wire.after_start => Some(BusStatus::ADDRESS_ACK),
            BusOp::Byte(_) => Some(BusStatus::DATA_ACK),
            _ => None,
        };
        if raises.is_some() {
            assert!(
                wire.pending.is_none(),
                "{op:?} issued while an interrupt is outstanding"
            );
            wire.pending = raises;
        }
        wire.after_start = op == BusOp::Start;
        wire.ops.push(op);
    }

    /// Every primitive so far
    pub fn ops(&self) -> Vec<BusOp> {
        self.wire().ops.clone()
    }

    /// Primitives that correspond to commands, in wire order
    pub fn commands(&self) -> Vec<Command> {
        self.wire().ops.iter().filter_map(|op| op.command()).collect()
    }

    /// Consume the outstanding completion interrupt, if any
    pub fn take_interrupt(&self) -> Option<BusStatus> {
        self.wire().pending.take()
    }
}

/// Bus double that records primitives
pub struct RecordingBus {
    log: Arc<BusLog>,
}

impl RecordingBus {
    pub fn new() -> (Self, Arc<BusLog>) {
        let log = Arc::new(BusLog::default());
        (Self { log: log.clone() }, log)
    }
}

impl TwiTransmitter for RecordingBus {
    fn init(&mut self, config: I2cConfig) {
        self.log.record(BusOp::Init(config.frequency));
    }

    fn send_start_condition(&mut self) {
        self.log.record(BusOp::Start);
    }

    fn send_byte(&mut self, byte: u8) {
        self.log.record(BusOp::Byte(byte));
    }

    fn send_stop_condition(&mut self) {
        self.log.record(BusOp::Stop);
    }

    fn disable_interrupt(&mut self) {
        self.log.record(BusOp::DisableInterrupt);
    }
}

pub type TestEngine<'a> = Engine<'a, RecordingBus, PanicFault>;

/// Fresh engine over a recording bus
pub fn engine<'a>() -> (TestEngine<'a>, Arc<BusLog>) {
    let (bus, log) = RecordingBus::new();
    (Engine::new(bus, PanicFault), log)
}

/// Deliver interrupts until the bus goes quiet
///
/// Returns the number of interrupts delivered.
pub fn pump(engine: &TestEngine<'_>, log: &BusLog) -> usize {
    let mut delivered = 0;
    while let Some(status) = log.take_interrupt() {
        engine.on_bus_event(status);
        delivered += 1;
    }
    delivered
}
