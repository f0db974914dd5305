//! Interrupt-driven bus command engine
//!
//! The engine owns the task queue, both command buffers and the state
//! machine flags behind a single critical-section mutex. Two contexts call
//! into it:
//!
//! - Thread mode enqueues transmissions. When no fetch cycle is pending this
//!   seeds one directly.
//! - The bus interrupt handler calls [`Engine::on_bus_event`] once per
//!   completed primitive. It issues the next command and, after a buffer
//!   swap, pulls more commands from the active producer.
//!
//! Producers never run inside the critical section. While one runs it holds
//! the back buffer by value, and the interrupt keeps draining the front
//! buffer underneath it.
//!
//! At most one fetch cycle runs at a time. Whenever a task is queued, either
//! a cycle is running, a filled back buffer waits for its swap, or the head
//! task is a scoped one waiting for the caller that holds its producer.
//!
//! # State machine
//!
//! ```text
//!          enqueue (idle)                   front exhausted,
//!   Idle ───────────────▶ Transmitting ───────────────────▶ AwaitingData
//!    ▲                        │   ▲       no swap requested      │
//!    │      Stop, no tasks    │   │                              │
//!    └────────────────────────┘   └──────────────────────────────┘
//!                                    producer finishes a batch
//! ```

use core::cell::RefCell;

use cadence_hal::{BusStatus, Fault, FaultCategory, FaultReporter, I2cConfig, TwiTransmitter};
use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::buffer::{CommandBuffer, DoubleBuffer};
use crate::command::Command;
use crate::fault::Violation;
use crate::fmt::{debug, error};
use crate::producer::{CommandSink, Producer, Progress};
use crate::queue::{Source, Task, TaskQueue};
use crate::stream::ProgramMemoryStream;

/// Coarse engine state, derived from the transmitter flag and the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Transmitter inactive, no task queued
    Idle,
    /// Commands are being issued from the front buffer
    Transmitting,
    /// Transmitter parked while a task still has commands to produce
    AwaitingData,
}

/// Work checked out of the engine for one producer invocation
struct Lease<'a> {
    address: u8,
    source: Source<'a>,
    buffer: CommandBuffer,
}

struct EngineState<'a, B> {
    bus: B,
    tasks: TaskQueue<'a>,
    buffers: DoubleBuffer,
    transmitting: bool,
    swap_requested: bool,
    fetching: bool,
}

impl<'a, B: TwiTransmitter> EngineState<'a, B> {
    const fn new(bus: B) -> Self {
        Self {
            bus,
            tasks: TaskQueue::new(),
            buffers: DoubleBuffer::new(),
            transmitting: false,
            swap_requested: false,
            fetching: false,
        }
    }

    fn reset(&mut self) {
        self.tasks.clear();
        self.buffers.reset();
        self.transmitting = false;
        self.swap_requested = false;
        self.fetching = false;
    }

    fn is_idle(&self) -> bool {
        !self.transmitting && self.tasks.is_empty()
    }

    fn phase(&self) -> Phase {
        if self.transmitting {
            Phase::Transmitting
        } else if self.tasks.is_empty() {
            Phase::Idle
        } else {
            Phase::AwaitingData
        }
    }

    /// Whether a fetch cycle is running or a filled back buffer is waiting
    fn production_pending(&self) -> bool {
        self.fetching || self.swap_requested
    }

    /// Reserve the fetch cycle for an engine-held head task
    fn claim_fetch(&mut self) -> bool {
        let due = !self.production_pending()
            && self.tasks.peek_head().is_some_and(|head| !head.is_scoped());
        self.fetching |= due;
        due
    }

    /// Reserve the fetch cycle for the scoped task holding `ticket`
    fn claim_scoped(&mut self, ticket: u32) -> bool {
        let due = !self.production_pending()
            && self
                .tasks
                .peek_head()
                .is_some_and(|head| head.ticket() == ticket && head.is_scoped());
        self.fetching |= due;
        due
    }

    /// Queue a task; returns its ticket and whether the caller now owns the
    /// fetch cycle
    fn enqueue(&mut self, task: Task<'a>) -> Result<(u32, bool), Violation> {
        let ticket = self
            .tasks
            .enqueue(task)
            .map_err(|_| Violation::QueueFull)?;
        Ok((ticket, self.claim_fetch()))
    }

    fn swap(&mut self) -> Result<(), Violation> {
        self.buffers.swap()?;
        self.swap_requested = false;
        debug!("swap: {=usize} commands in front", self.buffers.front_len());
        Ok(())
    }

    /// Check out the head task and the back buffer
    ///
    /// `owner` is the ticket of the scoped task whose producer the running
    /// cycle holds, if any. Ends the cycle when the queue is empty or the
    /// head is someone else's scoped task.
    fn begin_production(&mut self, owner: Option<u32>) -> Result<Option<Lease<'a>>, Violation> {
        let runnable = self
            .tasks
            .peek_head()
            .is_some_and(|head| !head.is_scoped() || Some(head.ticket()) == owner);
        if !runnable {
            self.fetching = false;
            return Ok(None);
        }
        let buffer = self.buffers.lend_back()?;
        let (address, source) = self.tasks.checkout_head()?;
        Ok(Some(Lease {
            address,
            source,
            buffer,
        }))
    }

    /// Put a filled back buffer in place; returns whether to keep producing
    fn finish_production(&mut self, lease: Lease<'a>, progress: Progress) -> Result<bool, Violation> {
        let Lease { source, buffer, .. } = lease;
        if buffer.is_empty() {
            return Err(Violation::ProducerStalled);
        }
        self.buffers.return_back(buffer);

        match progress {
            Progress::More => self.tasks.restore_head(source)?,
            Progress::Done => {
                self.tasks.pop_head().ok_or(Violation::QueueEmpty)?;
            }
        }

        if self.transmitting {
            // The interrupt swaps once the front buffer runs dry
            self.swap_requested = true;
            self.fetching = false;
            return Ok(false);
        }

        // The other buffer went out in full while we were producing
        self.swap()?;
        self.start_transmitter()?;
        Ok(true)
    }

    fn start_transmitter(&mut self) -> Result<bool, Violation> {
        if self.transmitting {
            return Err(Violation::TransmitterActive);
        }
        if self.buffers.current().is_pending() {
            return Err(Violation::NothingToTransmit);
        }
        self.transmitting = true;
        self.process_command()
    }

    /// Issue the command at the cursor
    ///
    /// Returns whether the buffers were swapped, in which case the back
    /// buffer is free for the next batch.
    fn process_command(&mut self) -> Result<bool, Violation> {
        if !self.transmitting {
            return Err(Violation::TransmitterInactive);
        }

        let mut swapped = false;
        loop {
            match self.buffers.current() {
                Command::Start => self.bus.send_start_condition(),
                Command::SendData(byte) => self.bus.send_byte(byte),
                Command::Stop => {
                    self.bus.send_stop_condition();
                    self.transmitting = false;
                }
                Command::Pending => {
                    if !self.swap_requested {
                        self.bus.disable_interrupt();
                        self.transmitting = false;
                        break;
                    }
                    self.swap()?;
                    swapped = true;
                    continue;
                }
            }

            if self.buffers.advance() {
                if self.transmitting {
                    break;
                }
                // A stop raises no interrupt, so the next transaction in
                // this buffer starts right away.
                self.transmitting = true;
                continue;
            }

            if !self.swap_requested {
                self.buffers.set_current(Command::Pending);
                break;
            }
            self.swap()?;
            swapped = true;
            if self.transmitting {
                break;
            }
            // Old buffer ended on a stop; nothing will interrupt us
            self.transmitting = true;
        }

        Ok(swapped)
    }
}

/// Double-buffered two-wire command engine
///
/// Share one instance between thread mode and the bus interrupt handler,
/// typically as a `static`. Producers queued with
/// [`enqueue_transmission`](Engine::enqueue_transmission) must outlive `'a`;
/// [`transmit`](Engine::transmit) only borrows its producer for the call.
pub struct Engine<'a, B, F> {
    state: Mutex<CriticalSectionRawMutex, RefCell<EngineState<'a, B>>>,
    fault: F,
}

impl<'a, B, F> Engine<'a, B, F>
where
    B: TwiTransmitter,
    F: FaultReporter,
{
    /// Create an engine over `bus`, escalating faults to `fault`
    pub const fn new(bus: B, fault: F) -> Self {
        Self {
            state: Mutex::new(RefCell::new(EngineState::new(bus))),
            fault,
        }
    }

    /// Reset all engine state and bring up the bus peripheral
    pub fn init(&self, config: I2cConfig) {
        self.critical(|state| {
            state.reset();
            state.bus.init(config);
        });
        debug!("bus engine ready at {=u32} Hz", config.frequency);
    }

    fn critical<R>(&self, f: impl FnOnce(&mut EngineState<'a, B>) -> R) -> R {
        self.state.lock(|cell| f(&mut cell.borrow_mut()))
    }

    fn escalate<T>(&self, result: Result<T, Violation>) -> T {
        result.unwrap_or_else(|violation| {
            error!("contract violation: {}", violation);
            self.fault.report(violation.into())
        })
    }

    /// Queue a transmission to the device at `address`
    ///
    /// `address` is the 8-bit write address. If no fetch cycle is pending
    /// the producer is invoked before this returns. A full queue is a fault.
    pub fn enqueue_transmission(&self, address: u8, producer: &'a mut (dyn Producer + Send)) {
        self.submit(Task::new(address, Source::Borrowed(producer)));
    }

    /// Queue `data` as a single transaction without waiting for it
    pub fn enqueue_program_memory(&self, address: u8, data: &'a [u8]) {
        self.submit(Task::new(
            address,
            Source::ProgramMemory(ProgramMemoryStream::new(data)),
        ));
    }

    /// Send `data` as a single transaction and block until the bus is idle
    pub fn transmit_program_memory(&self, address: u8, data: &[u8]) {
        let mut stream = ProgramMemoryStream::new(data);
        self.transmit(address, &mut stream);
        self.wait_until_idle();
    }

    /// Queue a transmission whose producer stays with the caller, and block
    /// until the producer has finished
    ///
    /// The calling context runs every fetch cycle for this task, so the
    /// producer only has to live for the call. Returns once the task has
    /// left the queue; its last batch may still be on the wire.
    pub fn transmit(&self, address: u8, producer: &mut dyn Producer) {
        let ticket = self.submit_scoped(address, producer);
        while !self.poll_scoped(ticket, producer) {
            core::hint::spin_loop();
        }
    }

    /// [`transmit`](Engine::transmit), yielding to the executor between polls
    pub async fn transmit_async(&self, address: u8, producer: &mut dyn Producer) {
        let ticket = self.submit_scoped(address, producer);
        while !self.poll_scoped(ticket, producer) {
            yield_now().await;
        }
    }

    fn submit(&self, task: Task<'a>) {
        let address = task.address();
        let queued = self.critical(|state| state.enqueue(task));
        debug!("task queued for {=u8:#x}", address);
        let (_, claimed) = self.escalate(queued);
        if claimed {
            self.fetch(None);
        }
    }

    fn submit_scoped(&self, address: u8, producer: &mut dyn Producer) -> u32 {
        let queued = self.critical(|state| {
            let (ticket, claimed) = state.enqueue(Task::new(address, Source::Scoped))?;
            Ok((ticket, claimed || state.claim_scoped(ticket)))
        });
        debug!("scoped task queued for {=u8:#x}", address);
        let (ticket, claimed) = self.escalate(queued);
        if claimed {
            self.fetch(Some((ticket, producer)));
        }
        ticket
    }

    /// Run the fetch cycle for `ticket` if it is due; returns whether the
    /// task has left the queue
    fn poll_scoped(&self, ticket: u32, producer: &mut dyn Producer) -> bool {
        let (claimed, queued) =
            self.critical(|state| (state.claim_scoped(ticket), state.tasks.contains(ticket)));
        if claimed {
            self.fetch(Some((ticket, producer)));
        }
        !queued
    }

    /// No transmission in progress and no task queued
    pub fn is_idle(&self) -> bool {
        self.critical(|state| state.is_idle())
    }

    /// Current state machine phase
    pub fn phase(&self) -> Phase {
        self.critical(|state| state.phase())
    }

    /// Busy-wait until [`Engine::is_idle`]
    pub fn wait_until_idle(&self) {
        while !self.is_idle() {
            core::hint::spin_loop();
        }
    }

    /// Yield to the executor until [`Engine::is_idle`]
    pub async fn until_idle(&self) {
        while !self.is_idle() {
            yield_now().await;
        }
    }

    /// Bus interrupt entry point
    ///
    /// Call once per completion interrupt with the peripheral's status.
    /// Must not be re-entered.
    pub fn on_bus_event(&self, status: BusStatus) {
        if !status.is_acknowledged() {
            error!("bus error status {=u8:#x}", status.code());
            self.fault
                .report(Fault::new(FaultCategory::Bus, status.code(), "error status"));
        }

        let refill = self.critical(|state| {
            let swapped = state.process_command()?;
            Ok(swapped && state.claim_fetch())
        });
        if self.escalate(refill) {
            self.fetch(None);
        }
    }

    /// Pull commands from the head task until it gets ahead of the wire
    ///
    /// The caller must have claimed the cycle. `scoped` carries the producer
    /// of the caller's own scoped task.
    fn fetch<'p>(&self, mut scoped: Option<(u32, &mut (dyn Producer + 'p))>) {
        loop {
            let owner = scoped.as_ref().map(|(ticket, _)| *ticket);
            let lease = self.critical(|state| state.begin_production(owner));
            let Some(mut lease) = self.escalate(lease) else {
                return;
            };

            let progress = {
                let producer: &mut dyn Producer = match (lease.source.producer(), scoped.as_mut()) {
                    (Some(producer), _) => producer,
                    (None, Some((_, producer))) => &mut **producer,
                    (None, None) => self.fault.report(Violation::ScopedProducerMissing.into()),
                };
                let mut sink = CommandSink::new(&mut lease.buffer, lease.address, &self.fault);
                producer.produce(&mut sink)
            };

            let keep_going = self.critical(|state| state.finish_production(lease, progress));
            if !self.escalate(keep_going) {
                return;
            }
        }
    }
}
