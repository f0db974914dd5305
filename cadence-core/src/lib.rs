//! Board-agnostic two-wire command engine
//!
//! This crate keeps a TWI bus busy while the bytes it carries are still
//! being produced:
//!
//! - Command set and fixed-capacity command buffers
//! - Front/back double buffering with an explicit swap protocol
//! - FIFO task queue of pending transmissions
//! - Interrupt-driven state machine that drains the front buffer
//! - Producer sink API and the program-memory streaming producer
//!
//! One [`Engine`] instance is shared by thread-mode code (which enqueues
//! transmissions) and the bus interrupt handler (which calls
//! [`Engine::on_bus_event`]).

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

mod fmt;

pub mod buffer;
pub mod command;
pub mod config;
pub mod engine;
pub mod fault;
pub mod producer;
pub mod queue;
pub mod stream;

#[cfg(test)]
mod testing;

pub use buffer::CommandBuffer;
pub use command::Command;
pub use engine::{Engine, Phase};
pub use fault::{PanicFault, Violation};
pub use producer::{CommandSink, Producer, Progress};
pub use stream::ProgramMemoryStream;
