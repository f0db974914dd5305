//! Display errors

/// Display layer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Sprite table is full
    TooManySprites,
    /// Update extents already hold the maximum number of regions
    TooManyRegions,
    /// Region lies outside the panel or has its columns reversed
    InvalidRegion,
    /// Partial update requested with no regions
    NoRegions,
}
