//! Reference values for multi-level iso-surfaces and slice stacks

use isoslice_core::{Error, Result, ValueRange};
use serde::{Deserialize, Serialize};

/// Evenly spaced iso levels across a value range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelSpacing {
    /// Number of levels
    pub count: usize,
    /// Fraction of the span kept free at both ends, so the extreme levels
    /// do not coincide with the extreme nodal values
    pub margin: f32,
}

impl Default for LevelSpacing {
    fn default() -> Self {
        Self {
            count: 5,
            margin: 0.01,
        }
    }
}

impl LevelSpacing {
    /// Spacing for `count` levels
    pub fn new(count: usize) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    /// Set the relative margin kept from the range ends
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(Error::InvalidConfig(
                "At least one iso level is required".to_string(),
            ));
        }
        if !(0.0..0.5).contains(&self.margin) {
            return Err(Error::InvalidConfig(format!(
                "Level margin must be in [0, 0.5), got {}",
                self.margin
            )));
        }
        Ok(())
    }

    /// Reference values spanning `range`; a single level sits in the middle
    pub fn levels(&self, range: ValueRange) -> Vec<f32> {
        let inset = range.span() * self.margin;
        let lo = range.min + inset;
        let hi = range.max - inset;
        match self.count {
            0 => Vec::new(),
            1 => vec![0.5 * (lo + hi)],
            n => (0..n)
                .map(|i| lo + (hi - lo) * i as f32 / (n - 1) as f32)
                .collect(),
        }
    }
}

/// Plane offsets of a slice stack between `lo` and `hi` along the normal
///
/// The interval is first inset by 1e-3 of its extent. A single slice sits at
/// `offset` across the interval; several slices are shifted inwards by
/// `offset / count` at both ends and spread evenly.
pub fn stack_offsets(lo: f32, hi: f32, count: usize, offset: f32) -> Vec<f32> {
    let offset = offset.clamp(0.0, 1.0);
    let extent = (hi - lo).abs();
    let (mut lo, mut hi) = if extent != 0.0 {
        (lo + 1e-3 * extent, hi - 1e-3 * extent)
    } else {
        (lo, hi)
    };

    match count {
        0 => Vec::new(),
        1 => vec![lo + offset * (hi - lo)],
        n => {
            let df = offset / n as f32;
            lo += df;
            hi -= df;
            (0..n)
                .map(|i| lo + (hi - lo) * i as f32 / (n - 1) as f32)
                .collect()
        }
    }
}
