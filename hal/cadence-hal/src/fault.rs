//! Terminal fault facility
//!
//! Faults are not errors: nothing above this layer is expected to recover
//! from them. A reporter logs what it can and then halts, resets, or (on
//! the host) panics.

/// Subsystem a fault originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultCategory {
    /// Peripheral reported an unexpected bus status
    Bus,
    /// Caller or internal contract violated
    Contract,
}

/// A fatal condition with enough context to diagnose it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fault {
    /// Originating subsystem
    pub category: FaultCategory,
    /// Raw status or violation code
    pub code: u8,
    /// Short human-readable description
    pub description: &'static str,
}

impl Fault {
    /// Create a fault
    pub const fn new(category: FaultCategory, code: u8, description: &'static str) -> Self {
        Self {
            category,
            code,
            description,
        }
    }
}

/// Fault reporting facility
///
/// `report` never returns. Implementations are shared between thread mode
/// and interrupt context, so they take `&self`.
pub trait FaultReporter {
    /// Report an unrecoverable fault
    fn report(&self, fault: Fault) -> !;
}
