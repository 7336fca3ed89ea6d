//! Color maps for scalar fields

use serde::{Deserialize, Serialize};

/// Built-in color ramps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMapKind {
    #[default]
    Jet,
    Gray,
    Parula,
    HotCold,
    Red,
    Green,
    Blue,
    RedGreen,
}

/// A piecewise-linear color ramp over `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorMap {
    /// Control points as (position, rgb), positions increasing
    stops: Vec<(f32, [u8; 3])>,
}

impl Default for ColorMap {
    fn default() -> Self {
        Self::new(ColorMapKind::Jet)
    }
}

impl ColorMap {
    /// Color map for one of the built-in ramps
    pub fn new(kind: ColorMapKind) -> Self {
        let stops = match kind {
            ColorMapKind::Jet => vec![
                (0.0, [0, 0, 255]),
                (0.4, [0, 255, 255]),
                (0.5, [0, 255, 0]),
                (0.6, [255, 255, 0]),
                (1.0, [255, 0, 0]),
            ],
            ColorMapKind::Gray => ramp([255, 255, 255]),
            ColorMapKind::Parula => vec![
                (0.0, [0, 0, 143]),
                (0.1667, [71, 87, 247]),
                (0.3333, [39, 150, 235]),
                (0.5, [24, 191, 181]),
                (0.6666, [128, 203, 88]),
                (0.8333, [253, 189, 60]),
                (1.0, [249, 250, 20]),
            ],
            ColorMapKind::HotCold => vec![
                (0.0, [64, 83, 187]),
                (0.25, [133, 188, 255]),
                (0.5, [241, 241, 241]),
                (0.75, [253, 165, 123]),
                (1.0, [184, 19, 40]),
            ],
            ColorMapKind::Red => ramp([255, 0, 0]),
            ColorMapKind::Green => ramp([0, 255, 0]),
            ColorMapKind::Blue => ramp([0, 0, 255]),
            ColorMapKind::RedGreen => vec![(0.0, [255, 0, 0]), (1.0, [0, 255, 0])],
        };
        Self { stops }
    }

    /// Continuous color at normalized position `w`, clamped to the end colors
    pub fn map(&self, w: f32) -> [u8; 3] {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return [255, 255, 255],
        };
        if w.is_nan() || w <= first.0 {
            return first.1;
        }
        if w >= last.0 {
            return last.1;
        }

        let upper = self
            .stops
            .iter()
            .position(|(p, _)| *p >= w)
            .unwrap_or(self.stops.len() - 1)
            .max(1);
        let (p0, c0) = self.stops[upper - 1];
        let (p1, c1) = self.stops[upper];
        let dp = p1 - p0;
        let t = if dp != 0.0 { (w - p0) / dp } else { 1.0 };

        let mut rgb = [0u8; 3];
        for (i, channel) in rgb.iter_mut().enumerate() {
            let v = c0[i] as f32 * (1.0 - t) + c1[i] as f32 * t;
            *channel = v.round().clamp(0.0, 255.0) as u8;
        }
        rgb
    }
}

/// Black-to-color ramp in four equal steps
fn ramp(top: [u8; 3]) -> Vec<(f32, [u8; 3])> {
    (0..5)
        .map(|i| {
            let t = i as f32 / 4.0;
            let c = top.map(|v| (v as f32 * t).round() as u8);
            (t, c)
        })
        .collect()
}
