//! Frame-to-frame tracking of the color map range

use crate::parallel;
use isoslice_core::{Error, RangePolicy, Result, ValueRange};
use serde::{Deserialize, Serialize};

/// Policies and user bounds of a tracked range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeConfig {
    pub min_policy: RangePolicy,
    pub max_policy: RangePolicy,
    /// Used when `min_policy` is `User`
    pub user_min: f32,
    /// Used when `max_policy` is `User`
    pub user_max: f32,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            min_policy: RangePolicy::Dynamic,
            max_policy: RangePolicy::Dynamic,
            user_min: 0.0,
            user_max: 1.0,
        }
    }
}

impl RangeConfig {
    /// Same policy for both bounds
    pub fn with_policy(mut self, policy: RangePolicy) -> Self {
        self.min_policy = policy;
        self.max_policy = policy;
        self
    }

    /// User-fixed bounds on both ends
    pub fn with_user_range(mut self, min: f32, max: f32) -> Self {
        self.min_policy = RangePolicy::User;
        self.max_policy = RangePolicy::User;
        self.user_min = min;
        self.user_max = max;
        self
    }

    /// User bounds must be finite
    pub fn validate(&self) -> Result<()> {
        let user_bounds = [
            (self.min_policy, self.user_min),
            (self.max_policy, self.user_max),
        ];
        if user_bounds
            .iter()
            .any(|&(policy, v)| policy == RangePolicy::User && !v.is_finite())
        {
            return Err(Error::InvalidConfig(
                "User range bounds must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Extrema of the finite values of one frame
pub fn scan_range(values: &[f32]) -> Option<ValueRange> {
    parallel::parallel_reduce(
        values,
        None,
        |&v| v.is_finite().then(|| ValueRange::new(v, v)),
        |a, b| match (a, b) {
            (Some(a), Some(b)) => Some(a.union(&b)),
            (a, None) => a,
            (None, b) => b,
        },
    )
}

/// Resolves the color range of each frame from its values and the policies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeTracker {
    pub config: RangeConfig,
    /// Running extrema since the last reset
    running: Option<ValueRange>,
    /// Last resolved range
    current: ValueRange,
}

impl RangeTracker {
    /// Tracker with no frame seen yet
    pub fn new(config: RangeConfig) -> Self {
        Self {
            config,
            running: None,
            current: ValueRange::default(),
        }
    }

    /// Forget the running extrema; the next frame starts a new static range
    pub fn reset(&mut self) {
        self.running = None;
    }

    /// The last resolved range
    pub fn current(&self) -> ValueRange {
        self.current
    }

    /// Running extrema seen since the last reset
    pub fn running(&self) -> Option<ValueRange> {
        self.running
    }

    /// Scan one frame's values and resolve the range for it
    ///
    /// Frames without any finite value keep the previous bounds for the
    /// data-driven policies.
    pub fn update(&mut self, values: &[f32]) -> ValueRange {
        let frame = scan_range(values);
        self.update_with(frame)
    }

    /// Resolve the range from already known frame extrema
    pub fn update_with(&mut self, frame: Option<ValueRange>) -> ValueRange {
        if let Some(frame) = frame {
            self.running = Some(match self.running {
                Some(running) => running.union(&frame),
                None => frame,
            });
        }

        let dynamic = frame.unwrap_or(self.current);
        let running = self.running.unwrap_or(dynamic);

        let min = match self.config.min_policy {
            RangePolicy::Dynamic => dynamic.min,
            RangePolicy::Static => running.min,
            RangePolicy::User => self.config.user_min,
        };
        let max = match self.config.max_policy {
            RangePolicy::Dynamic => dynamic.max,
            RangePolicy::Static => running.max,
            RangePolicy::User => self.config.user_max,
        };

        self.current = ValueRange::new(min, max).resolved();
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dynamic_follows_frame() {
        let mut tracker = RangeTracker::default();
        assert_eq!(tracker.update(&[1.0, 3.0]), ValueRange::new(1.0, 3.0));
        assert_eq!(tracker.update(&[2.0, 2.5]), ValueRange::new(2.0, 2.5));
    }

    #[test]
    fn test_static_only_widens() {
        let config = RangeConfig::default().with_policy(RangePolicy::Static);
        let mut tracker = RangeTracker::new(config);
        let frames: [&[f32]; 4] = [&[0.0, 1.0], &[0.5, 0.6], &[-2.0, 0.0], &[3.0, 4.0]];
        let mut union: Option<ValueRange> = None;
        let mut previous: Option<ValueRange> = None;
        for frame in frames {
            let dynamic = ValueRange::of_values(frame).unwrap();
            union = Some(union.map_or(dynamic, |u| u.union(&dynamic)));
            let range = tracker.update(frame);
            assert!(range.contains(&union.unwrap()));
            if let Some(previous) = previous {
                assert!(range.contains(&previous));
            }
            previous = Some(range);
        }
        assert_eq!(tracker.current(), ValueRange::new(-2.0, 4.0));

        tracker.reset();
        assert_eq!(tracker.update(&[1.0, 2.0]), ValueRange::new(1.0, 2.0));
    }

    #[test]
    fn test_user_and_mixed_policies() {
        let mut tracker = RangeTracker::new(RangeConfig::default().with_user_range(-1.0, 1.0));
        assert_eq!(tracker.update(&[5.0, 10.0]), ValueRange::new(-1.0, 1.0));

        let config = RangeConfig {
            min_policy: RangePolicy::User,
            user_min: 0.0,
            ..RangeConfig::default()
        };
        let mut tracker = RangeTracker::new(config);
        assert_eq!(tracker.update(&[2.0, 7.0]), ValueRange::new(0.0, 7.0));
    }

    #[test]
    fn test_degenerate_ranges_are_nudged() {
        let mut tracker = RangeTracker::default();
        let range = tracker.update(&[4.0, 4.0, f32::NAN]);
        assert_eq!(range, ValueRange::new(4.0, 5.0));
        assert_relative_eq!(range.normalize(4.0), 0.0);

        let mut tracker = RangeTracker::new(RangeConfig::default().with_user_range(2.0, 1.0));
        assert_eq!(tracker.update(&[0.0]), ValueRange::new(2.0, 3.0));
    }

    #[test]
    fn test_empty_frame_keeps_previous_range() {
        let mut tracker = RangeTracker::default();
        tracker.update(&[1.0, 2.0]);
        assert_eq!(tracker.update(&[]), ValueRange::new(1.0, 2.0));
    }

    #[test]
    fn test_validate_rejects_non_finite_user_bounds() {
        assert!(RangeConfig::default().with_user_range(f32::NAN, 1.0).validate().is_err());
        assert!(RangeConfig::default().validate().is_ok());
    }
}
