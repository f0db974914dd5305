//! Sprite compositor
//!
//! A `Display` owns no pixels. Each update batch asks every visible sprite
//! to draw into a scratch slice, back to front in insertion order, and
//! sends the result.

use cadence_core::Engine;
use cadence_hal::{FaultReporter, TwiTransmitter};
use heapless::Vec;

use crate::error::DisplayError;
use crate::extents::UpdateExtents;
use crate::sprite::Sprite;
use crate::ssd1306::Ssd1306;
use crate::update::{FullUpdate, PartialUpdate};

/// Maximum number of sprites a display composes
pub const MAX_SPRITES: usize = 8;

/// Panel plus the sprites drawn on it
pub struct Display<'s> {
    device: Ssd1306,
    sprites: Vec<&'s (dyn Sprite + Sync), MAX_SPRITES>,
}

impl<'s> Display<'s> {
    /// Display with no sprites
    pub const fn new(device: Ssd1306) -> Self {
        Self {
            device,
            sprites: Vec::new(),
        }
    }

    /// Controller the display is drawn on
    pub fn device(&self) -> &Ssd1306 {
        &self.device
    }

    /// Add a sprite on top of the existing ones
    pub fn add_sprite(&mut self, sprite: &'s (dyn Sprite + Sync)) -> Result<(), DisplayError> {
        self.sprites
            .push(sprite)
            .map_err(|_| DisplayError::TooManySprites)
    }

    /// Number of sprites added so far
    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    /// Compose columns `column_a..=column_b` of `page` into `segments`
    ///
    /// `segments` is cleared first, so unlit columns go out dark.
    pub fn render(&self, column_a: u8, page: u8, column_b: u8, segments: &mut [u8]) {
        segments.fill(0);
        for sprite in self.sprites.iter().filter(|s| s.is_visible()) {
            sprite.render(column_a, page, column_b, segments);
        }
    }

    /// Producer that repaints the whole panel
    pub fn full_update(&self) -> FullUpdate<'_, 's> {
        FullUpdate::new(self)
    }

    /// Producer that repaints only the regions in `extents`
    pub fn partial_update<'d>(
        &'d self,
        extents: &'d UpdateExtents,
    ) -> Result<PartialUpdate<'d, 's>, DisplayError> {
        PartialUpdate::new(self, extents)
    }

    /// Repaint the whole panel, blocking until every batch is produced
    pub fn refresh<B, F>(&self, engine: &Engine<'_, B, F>)
    where
        B: TwiTransmitter,
        F: FaultReporter,
    {
        let mut update = self.full_update();
        engine.transmit(self.device.write_address(), &mut update);
    }

    /// Repaint the regions in `extents`, blocking until every batch is
    /// produced
    pub fn refresh_regions<B, F>(
        &self,
        engine: &Engine<'_, B, F>,
        extents: &UpdateExtents,
    ) -> Result<(), DisplayError>
    where
        B: TwiTransmitter,
        F: FaultReporter,
    {
        let mut update = self.partial_update(extents)?;
        engine.transmit(self.device.write_address(), &mut update);
        Ok(())
    }
}
