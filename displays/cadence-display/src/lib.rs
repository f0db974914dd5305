//! Sprite renderer for SSD1306 OLED panels
//!
//! This crate is a client of `cadence-core`:
//! - `Ssd1306` knows the controller's command set and init sequence
//! - `Sprite` is anything that can draw itself into a slice of one page
//! - `Display` composes sprites and hands out update producers
//! - `FullUpdate` and `PartialUpdate` stream the composed image to the
//!   panel a bounded number of columns at a time
//!
//! # Flow
//!
//! ```text
//! Display ──full_update()──▶ FullUpdate ──transmit()──▶ Engine
//!    │                            │
//!    └── sprites ◀── render() ────┘  (once per 32-column batch)
//! ```
//!
//! [`Display::refresh`] and [`Display::refresh_regions`] wrap this flow for
//! a shared engine; the producer lives on the caller's stack.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod display;
pub mod error;
pub mod extents;
pub mod sprite;
pub mod ssd1306;
pub mod update;

// Re-export key types
pub use display::{Display, MAX_SPRITES};
pub use error::DisplayError;
pub use extents::{Region, UpdateExtents, MAX_REGIONS};
pub use sprite::{Bitmap, Sprite};
pub use ssd1306::{Ssd1306, COLUMNS, PAGES};
pub use update::{FullUpdate, PartialUpdate, SEGMENTS_PER_BATCH};
