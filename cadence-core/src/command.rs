//! Bus command set
//!
//! A transaction is decomposed into a flat stream of these commands. The
//! state machine issues exactly one bus primitive per command.

/// One atomic step of a bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Generate a start condition
    Start,
    /// Shift out one byte
    SendData(u8),
    /// Generate a stop condition
    Stop,
    /// Nothing loaded; never stored in a buffer
    #[default]
    Pending,
}

impl Command {
    /// Numeric tag, used as the fault code when a command is rejected
    pub const fn code(self) -> u8 {
        match self {
            Command::Start => 0x01,
            Command::SendData(_) => 0x02,
            Command::Stop => 0x03,
            Command::Pending => 0x04,
        }
    }

    /// Whether this is the "nothing loaded" sentinel
    pub const fn is_pending(self) -> bool {
        matches!(self, Command::Pending)
    }
}
