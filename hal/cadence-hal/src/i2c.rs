//! Two-wire (I2C/TWI) bus abstractions
//!
//! The bus engine drives the peripheral one primitive at a time. Each
//! primitive only *starts* a bus operation; completion is signalled by the
//! peripheral's interrupt, whose status byte the platform hands back to the
//! engine as a [`BusStatus`].

/// Interrupt-driven TWI master transmitter
///
/// All methods are non-blocking. `send_start_condition` and `send_byte`
/// each raise exactly one completion interrupt; `send_stop_condition` and
/// `disable_interrupt` raise none.
pub trait TwiTransmitter {
    /// Configure clock and pins and leave the peripheral idle
    fn init(&mut self, config: I2cConfig);

    /// Generate a (repeated) start condition
    fn send_start_condition(&mut self);

    /// Shift one byte out (address or data)
    fn send_byte(&mut self, byte: u8);

    /// Generate a stop condition and release the bus
    fn send_stop_condition(&mut self);

    /// Mask the transmit-complete interrupt until the next primitive
    fn disable_interrupt(&mut self);
}

/// Raw status reported by the TWI peripheral on a completion interrupt
///
/// Values follow the master-transmitter status codes with the prescaler
/// bits masked off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusStatus(pub u8);

impl BusStatus {
    /// Bus error due to an illegal start or stop
    pub const BUS_ERROR: Self = Self(0x00);
    /// Start condition transmitted
    pub const START: Self = Self(0x08);
    /// Repeated start condition transmitted
    pub const REPEATED_START: Self = Self(0x10);
    /// Address + write transmitted, ACK received
    pub const ADDRESS_ACK: Self = Self(0x18);
    /// Address + write transmitted, NACK received
    pub const ADDRESS_NACK: Self = Self(0x20);
    /// Data byte transmitted, ACK received
    pub const DATA_ACK: Self = Self(0x28);
    /// Data byte transmitted, NACK received
    pub const DATA_NACK: Self = Self(0x30);
    /// Arbitration lost
    pub const ARBITRATION_LOST: Self = Self(0x38);

    /// Whether the interrupt reports a successfully completed primitive
    pub fn is_acknowledged(self) -> bool {
        matches!(
            self,
            Self::START | Self::REPEATED_START | Self::ADDRESS_ACK | Self::DATA_ACK
        )
    }

    /// Raw status code
    pub const fn code(self) -> u8 {
        self.0
    }
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::FAST
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };

    /// Fast mode plus (1 MHz)
    pub const FAST_PLUS: Self = Self {
        frequency: 1_000_000,
    };
}
