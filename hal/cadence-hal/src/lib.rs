//! Cadence Hardware Abstraction Layer
//!
//! This crate defines the narrow hardware boundary the Cadence bus engine
//! is written against. Chip-specific code implements these traits; the
//! engine and display crates never touch registers themselves.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application / cadence-display          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cadence-core (command engine)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cadence-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  chip TWI peripheral + interrupt vector │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::TwiTransmitter`] - Interrupt-driven start/byte/stop primitives
//! - [`fault::FaultReporter`] - Terminal fault facility

#![no_std]
#![deny(unsafe_code)]

pub mod fault;
pub mod i2c;

// Re-export key types at crate root for convenience
pub use fault::{Fault, FaultCategory, FaultReporter};
pub use i2c::{BusStatus, I2cConfig, TwiTransmitter};
