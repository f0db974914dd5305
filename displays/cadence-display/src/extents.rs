//! Update extents
//!
//! The set of page slices that changed since the last refresh. A partial
//! update only sends these.

use heapless::Vec;

use crate::error::DisplayError;
use crate::ssd1306::{COLUMNS, PAGES};

/// Maximum number of regions one update can carry
pub const MAX_REGIONS: usize = 16;

/// Inclusive column range within one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Region {
    pub page: u8,
    pub start_column: u8,
    pub end_column: u8,
}

impl Region {
    /// Number of columns covered
    pub fn width(&self) -> usize {
        (self.end_column - self.start_column) as usize + 1
    }
}

/// Changed regions, in the order they will be sent
#[derive(Debug, Clone, Default)]
pub struct UpdateExtents {
    regions: Vec<Region, MAX_REGIONS>,
}

impl UpdateExtents {
    /// No regions
    pub const fn new() -> Self {
        Self {
            regions: Vec::new(),
        }
    }

    /// Forget every region
    pub fn reset(&mut self) {
        self.regions.clear();
    }

    /// Record columns `start_column..=end_column` of `page` as changed
    pub fn add_region(
        &mut self,
        page: u8,
        start_column: u8,
        end_column: u8,
    ) -> Result<(), DisplayError> {
        if page >= PAGES || end_column >= COLUMNS || start_column > end_column {
            return Err(DisplayError::InvalidRegion);
        }
        self.regions
            .push(Region {
                page,
                start_column,
                end_column,
            })
            .map_err(|_| DisplayError::TooManyRegions)
    }

    /// Order regions by page so the controller walks the panel top to bottom
    pub fn optimize(&mut self) {
        self.regions.sort_unstable_by_key(|region| region.page);
    }

    /// Regions in send order
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
