//! Scalar-to-color mapping and threshold rules

use serde::{Deserialize, Serialize};

/// Maps a scalar voxel value to an RGBA color.
///
/// The slicing pipeline only ever calls this; the actual palette
/// machinery (named palettes, log scaling, color bars) lives with the
/// caller. [`LinearColorMap`] is the built-in default.
pub trait ColorMap {
    fn map_scalar(&self, value: f32) -> [u8; 4];
}

/// Linear ramp between two colors over a user-set value window.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinearColorMap {
    /// Value mapped to `low_color`
    pub min: f32,
    /// Value mapped to `high_color`
    pub max: f32,
    pub low_color: [u8; 3],
    pub high_color: [u8; 3],
    /// Render exact zero as fully transparent
    pub transparent_zero: bool,
}

impl LinearColorMap {
    /// Black-to-white ramp over [min, max]
    pub fn grayscale(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            low_color: [0, 0, 0],
            high_color: [255, 255, 255],
            transparent_zero: false,
        }
    }
}

impl ColorMap for LinearColorMap {
    fn map_scalar(&self, value: f32) -> [u8; 4] {
        if self.transparent_zero && value == 0.0 {
            return [0, 0, 0, 0];
        }
        let span = self.max - self.min;
        let t = if span.abs() < f32::EPSILON {
            0.0
        } else {
            ((value - self.min) / span).clamp(0.0, 1.0)
        };
        let mix = |lo: u8, hi: u8| (lo as f32 + (hi as f32 - lo as f32) * t).round() as u8;
        [
            mix(self.low_color[0], self.high_color[0]),
            mix(self.low_color[1], self.high_color[1]),
            mix(self.low_color[2], self.high_color[2]),
            255,
        ]
    }
}

/// Which side of the threshold range is shown
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdTest {
    /// Show voxels whose threshold value lies inside [min, max]
    ShowInside,
    /// Show voxels whose threshold value lies outside [min, max]
    ShowOutside,
}

/// Threshold range plus direction
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub range: [f32; 2],
    pub test: ThresholdTest,
}

impl ThresholdRule {
    pub fn show_inside(min: f32, max: f32) -> Self {
        Self {
            range: [min, max],
            test: ThresholdTest::ShowInside,
        }
    }

    pub fn show_outside(min: f32, max: f32) -> Self {
        Self {
            range: [min, max],
            test: ThresholdTest::ShowOutside,
        }
    }

    /// True when a voxel with this threshold value should be shown
    pub fn passes(&self, value: f32) -> bool {
        let inside = value >= self.range[0] && value <= self.range[1];
        match self.test {
            ThresholdTest::ShowInside => inside,
            ThresholdTest::ShowOutside => !inside,
        }
    }
}
