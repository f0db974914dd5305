//! SSD1306 OLED controller
//!
//! 128x64 panel addressed as 8 pages of 128 one-byte columns. The driver
//! holds no frame buffer; it only knows how to phrase commands for the
//! controller, leaving the byte stream itself to the bus engine.

use cadence_core::{CommandSink, Engine};
use cadence_hal::{FaultReporter, TwiTransmitter};

/// Default 7-bit bus address (0x3D with SA0 pulled high)
pub const DEFAULT_ADDRESS: u8 = 0x3C;

/// Panel width in columns
pub const COLUMNS: u8 = 128;

/// Panel height in 8-pixel pages
pub const PAGES: u8 = 8;

/// SSD1306 commands
mod cmd {
    pub const SET_MEMORY_MODE: u8 = 0x20;
    pub const SET_COLUMN_ADDR: u8 = 0x21;
    pub const SET_PAGE_ADDR: u8 = 0x22;
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_CHARGE_PUMP: u8 = 0x8D;
    pub const SET_SEG_REMAP: u8 = 0xA1;
    pub const DISPLAY_RESUME: u8 = 0xA4;
    pub const SET_NORMAL: u8 = 0xA6;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_COM_SCAN_DEC: u8 = 0xC8;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_VCOM_DETECT: u8 = 0xDB;
}

/// Control byte: every following byte is a command
const CONTROL_COMMANDS: u8 = 0x00;

/// Control byte: every following byte is display RAM data
const CONTROL_DATA: u8 = 0x40;

/// Power-on sequence, sent as one transaction
pub static INIT_SEQUENCE: [u8; 26] = [
    CONTROL_COMMANDS,
    cmd::DISPLAY_OFF,
    cmd::SET_CLOCK_DIV,
    0x80, // Default clock
    cmd::SET_MUX_RATIO,
    0x3F, // 64 lines
    cmd::SET_DISPLAY_OFFSET,
    0x00,
    cmd::SET_START_LINE,
    cmd::SET_CHARGE_PUMP,
    0x14, // Enable charge pump
    cmd::SET_MEMORY_MODE,
    0x00, // Horizontal addressing
    cmd::SET_SEG_REMAP,
    cmd::SET_COM_SCAN_DEC,
    cmd::SET_COM_PINS,
    0x12, // Alternative COM config
    cmd::SET_CONTRAST,
    0xCF,
    cmd::SET_PRECHARGE,
    0xF1,
    cmd::SET_VCOM_DETECT,
    0x40,
    cmd::DISPLAY_RESUME,
    cmd::SET_NORMAL,
    cmd::DISPLAY_ON,
];

/// SSD1306 controller on the two-wire bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ssd1306 {
    address: u8,
}

impl Default for Ssd1306 {
    fn default() -> Self {
        Self::new()
    }
}

impl Ssd1306 {
    /// Controller at [`DEFAULT_ADDRESS`]
    pub const fn new() -> Self {
        Self::with_address(DEFAULT_ADDRESS)
    }

    /// Controller at a 7-bit `address`
    pub const fn with_address(address: u8) -> Self {
        Self { address }
    }

    /// 7-bit bus address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Address byte that opens a write transaction
    pub fn write_address(&self) -> u8 {
        self.address << 1
    }

    /// Send the power-on sequence and block until it is on the wire
    pub fn init<'a, B, F>(&self, engine: &Engine<'a, B, F>)
    where
        B: TwiTransmitter,
        F: FaultReporter,
    {
        engine.transmit_program_memory(self.write_address(), &INIT_SEQUENCE);
    }

    /// Queue the power-on sequence without waiting
    pub fn start_init<'a, B, F>(&self, engine: &Engine<'a, B, F>)
    where
        B: TwiTransmitter,
        F: FaultReporter,
    {
        engine.enqueue_program_memory(self.write_address(), &INIT_SEQUENCE);
    }

    /// Write `segments` into `page` starting at `column`
    ///
    /// Emits two complete transactions: one narrowing the controller's
    /// write window to the target columns of a single page, one carrying
    /// the segment bytes. `segments` must be non-empty and fit the panel
    /// from `column` onwards.
    pub fn put_segments(&self, sink: &mut CommandSink<'_>, column: u8, page: u8, segments: &[u8]) {
        debug_assert!(!segments.is_empty());
        debug_assert!(column as usize + segments.len() <= COLUMNS as usize);
        debug_assert!(page < PAGES);

        let last_column = column + (segments.len() - 1) as u8;

        sink.send_start();
        sink.send_bytes(&[
            CONTROL_COMMANDS,
            cmd::SET_COLUMN_ADDR,
            column,
            last_column,
            cmd::SET_PAGE_ADDR,
            page,
            page,
        ]);
        sink.end_transmission();

        sink.send_start();
        sink.send_byte(CONTROL_DATA);
        sink.send_bytes(segments);
        sink.end_transmission();
    }

    /// Commands [`put_segments`](Self::put_segments) appends for `count` segments
    pub const fn put_segments_len(count: usize) -> usize {
        // Start, address, control + 6 window bytes, Stop
        // Start, address, control, segments, Stop
        10 + 4 + count
    }
}
