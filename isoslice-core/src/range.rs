//! Scalar value ranges used for color mapping

use serde::{Deserialize, Serialize};

/// How one bound of a color range is maintained across frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RangePolicy {
    /// Follows the extremum of the current frame
    #[default]
    Dynamic,
    /// Running extremum over all frames since the last reset, only widens
    Static,
    /// Fixed by the user, never updated from data
    User,
}

/// A closed scalar interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl Default for ValueRange {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl ValueRange {
    /// Range from its bounds, taken as given
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Extrema of the finite values, `None` if there are none
    pub fn of_values<'a>(values: impl IntoIterator<Item = &'a f32>) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<Self>, &v| match acc {
                None => Some(Self::new(v, v)),
                Some(r) => Some(Self::new(r.min.min(v), r.max.max(v))),
            })
    }

    /// Make sure `max > min` so normalization never divides by zero
    pub fn resolved(self) -> Self {
        if self.max > self.min {
            self
        } else {
            Self::new(self.min, self.min + 1.0)
        }
    }

    /// Width `max - min`
    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Smallest range containing both
    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Whether `other` lies inside this range
    pub fn contains(&self, other: &Self) -> bool {
        self.min <= other.min && self.max >= other.max
    }

    /// Map a value to `[0, 1]` relative to this range (not clamped)
    pub fn normalize(&self, value: f32) -> f32 {
        let span = self.span();
        if span == 0.0 {
            0.0
        } else {
            (value - self.min) / span
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_of_values_skips_non_finite() {
        let values = [2.0, f32::NAN, -1.0, f32::INFINITY, 0.5];
        let range = ValueRange::of_values(&values).unwrap();
        assert_eq!(range, ValueRange::new(-1.0, 2.0));
        assert!(ValueRange::of_values(&[f32::NAN]).is_none());
    }

    #[test]
    fn test_resolved_nudges_empty_range() {
        let range = ValueRange::new(3.0, 3.0).resolved();
        assert_eq!(range, ValueRange::new(3.0, 4.0));
        assert_relative_eq!(range.normalize(3.5), 0.5);
    }

    #[test]
    fn test_union_and_contains() {
        let a = ValueRange::new(0.0, 1.0);
        let b = ValueRange::new(-2.0, 0.5);
        let u = a.union(&b);
        assert_eq!(u, ValueRange::new(-2.0, 1.0));
        assert!(u.contains(&a));
        assert!(u.contains(&b));
        assert!(!a.contains(&b));
    }
}
