//! Update producers
//!
//! Both producers stream composed segments through the engine one batch
//! per invocation. Every batch is a pair of complete bus transactions, so
//! the engine can park between batches without splitting a transaction.

use cadence_core::config::COMMAND_BUFFER_CAPACITY;
use cadence_core::{CommandSink, Producer, Progress};

use crate::display::Display;
use crate::error::DisplayError;
use crate::extents::UpdateExtents;
use crate::ssd1306::{Ssd1306, COLUMNS, PAGES};

/// Columns rendered per producer invocation
pub const SEGMENTS_PER_BATCH: usize = 32;

const _: () = assert!(Ssd1306::put_segments_len(SEGMENTS_PER_BATCH) <= COMMAND_BUFFER_CAPACITY);
const _: () = assert!(COLUMNS as usize % SEGMENTS_PER_BATCH == 0);

/// Repaints every page, left to right, top to bottom
pub struct FullUpdate<'d, 's> {
    display: &'d Display<'s>,
    column: u8,
    page: u8,
}

impl<'d, 's> FullUpdate<'d, 's> {
    /// Start at column 0 of page 0
    pub fn new(display: &'d Display<'s>) -> Self {
        Self {
            display,
            column: 0,
            page: 0,
        }
    }

    /// Whether the last page has been sent
    pub fn is_finished(&self) -> bool {
        self.page >= PAGES
    }
}

impl Producer for FullUpdate<'_, '_> {
    fn produce(&mut self, sink: &mut CommandSink<'_>) -> Progress {
        let mut segments = [0u8; SEGMENTS_PER_BATCH];
        let column_b = self.column + (SEGMENTS_PER_BATCH - 1) as u8;

        self.display
            .render(self.column, self.page, column_b, &mut segments);
        self.display
            .device()
            .put_segments(sink, self.column, self.page, &segments);

        self.column += SEGMENTS_PER_BATCH as u8;
        if self.column >= COLUMNS {
            self.column = 0;
            self.page += 1;
            if self.is_finished() {
                return Progress::Done;
            }
        }
        Progress::More
    }
}

/// Repaints the regions of an [`UpdateExtents`] in order
///
/// Regions wider than a batch are split; a batch never spans two regions.
pub struct PartialUpdate<'d, 's> {
    display: &'d Display<'s>,
    extents: &'d UpdateExtents,
    region_index: usize,
    column: u8,
}

impl<'d, 's> PartialUpdate<'d, 's> {
    /// Fails with [`DisplayError::NoRegions`] when `extents` is empty
    pub fn new(
        display: &'d Display<'s>,
        extents: &'d UpdateExtents,
    ) -> Result<Self, DisplayError> {
        let first = extents.regions().first().ok_or(DisplayError::NoRegions)?;
        Ok(Self {
            display,
            extents,
            region_index: 0,
            column: first.start_column,
        })
    }

    /// Whether the last region has been sent
    pub fn is_finished(&self) -> bool {
        self.region_index >= self.extents.len()
    }
}

impl Producer for PartialUpdate<'_, '_> {
    fn produce(&mut self, sink: &mut CommandSink<'_>) -> Progress {
        let regions = self.extents.regions();
        let region = regions[self.region_index];

        let column_b = (self.column + (SEGMENTS_PER_BATCH - 1) as u8).min(region.end_column);
        let count = (column_b - self.column) as usize + 1;

        let mut segments = [0u8; SEGMENTS_PER_BATCH];
        let segments = &mut segments[..count];
        self.display
            .render(self.column, region.page, column_b, segments);
        self.display
            .device()
            .put_segments(sink, self.column, region.page, segments);

        if column_b < region.end_column {
            self.column = column_b + 1;
            return Progress::More;
        }

        self.region_index += 1;
        match regions.get(self.region_index) {
            Some(next) => {
                self.column = next.start_column;
                Progress::More
            }
            None => Progress::Done,
        }
    }
}
