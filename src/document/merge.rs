//! Merged-region write guard

use super::reference::{CellCoordinate, CellRange};

/// Decides whether a write into a sheet's merged regions must be suppressed.
///
/// Only the top-left anchor of a merged region accepts writes; every other
/// coordinate inside the region is suppressed. The guard is consulted before
/// each single-cell write.
#[derive(Debug, Clone, Copy)]
pub struct MergedRegionGuard<'a> {
    regions: &'a [CellRange],
}

impl<'a> MergedRegionGuard<'a> {
    pub fn new(regions: &'a [CellRange]) -> Self {
        Self { regions }
    }

    /// The merged region containing `coordinate`, if any
    pub fn region_of(&self, coordinate: CellCoordinate) -> Option<&'a CellRange> {
        self.regions.iter().find(|region| region.contains(coordinate))
    }

    pub fn is_suppressed(&self, coordinate: CellCoordinate) -> bool {
        self.region_of(coordinate)
            .map(|region| region.anchor() != coordinate)
            .unwrap_or(false)
    }

    /// Anchor of the merged region containing `coordinate`
    pub fn anchor_of(&self, coordinate: CellCoordinate) -> Option<CellCoordinate> {
        self.region_of(coordinate).map(CellRange::anchor)
    }
}
