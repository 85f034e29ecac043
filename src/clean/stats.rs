//! Per-outcome counters for a cleaning run and their printed summary.

use std::fmt;

/// Counts of every discrete per-image outcome in one cleaning run.
///
/// Each source image is charged to exactly one of the rejection or acceptance
/// counters, so `total_images` always equals the sum over outcomes. `enhanced`
/// counts the subset of kept images whose enhanced write succeeded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub total_images: usize,
    pub no_label: usize,
    pub invalid_bbox: usize,
    pub duplicate: usize,
    pub too_dark: usize,
    pub too_bright: usize,
    pub kept: usize,
    pub enhanced: usize,
}

impl CleanStats {
    /// Total number of rejected images across all rejection reasons.
    pub fn rejected(&self) -> usize {
        self.no_label + self.invalid_bbox + self.duplicate + self.too_dark + self.too_bright
    }

    /// Whether the counter identity over all outcomes holds.
    pub fn is_consistent(&self) -> bool {
        self.total_images == self.rejected() + self.kept && self.enhanced <= self.kept
    }
}

impl fmt::Display for CleanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cleaning summary")?;
        writeln!(f, "  Total images: {}", self.total_images)?;
        writeln!(f, "  Kept: {} (enhanced: {})", self.kept, self.enhanced)?;
        writeln!(f, "  Removed: {}", self.rejected())?;
        writeln!(f, "    duplicates: {}", self.duplicate)?;
        writeln!(f, "    no label file: {}", self.no_label)?;
        writeln!(f, "    invalid bounding boxes: {}", self.invalid_bbox)?;
        writeln!(f, "    too dark: {}", self.too_dark)?;
        writeln!(f, "    too bright: {}", self.too_bright)?;
        Ok(())
    }
}
