//! Per-sample color resolution

use crate::color::label_table::{LabelTable, UNLABELED_KEY};
use crate::color::palette::{ColorMap, ThresholdRule};

/// How one layer's raw values become color.
#[derive(Clone, Copy)]
pub enum LayerColoring<'a> {
    /// Integer keys resolved through a label table
    Label(&'a LabelTable),
    /// Scalars resolved through a palette
    Palette(&'a dyn ColorMap),
    /// Values are already color components (RGB / RGBA)
    PassThrough,
}

/// Resolves sampled values to RGBA bytes for one layer.
///
/// Configured once per layer per draw; applied to every grid position.
pub struct VoxelColorizer<'a> {
    coloring: LayerColoring<'a>,
    threshold: Option<ThresholdRule>,
    opacity: f32,
}

impl<'a> VoxelColorizer<'a> {
    pub fn new(
        coloring: LayerColoring<'a>,
        threshold: Option<ThresholdRule>,
        opacity: f32,
    ) -> Self {
        Self {
            coloring,
            threshold,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    /// Resolve one sample.
    ///
    /// `values` are the raw components from sampling, `valid` is the
    /// sample's bounds/masking state, `byte_range` tells pass-through
    /// coloring whether components are 0-255 rather than 0-1, and
    /// `threshold_value` is the co-sampled threshold volume value (None
    /// when the threshold position was out of bounds).
    ///
    /// Invalid samples and threshold-suppressed samples come back fully
    /// transparent.
    pub fn colorize(
        &self,
        values: [f32; 4],
        valid: bool,
        byte_range: bool,
        threshold_value: Option<f32>,
    ) -> [u8; 4] {
        const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

        if !valid {
            return TRANSPARENT;
        }

        if let Some(rule) = &self.threshold {
            match threshold_value {
                Some(t) if rule.passes(t) => {}
                // A configured but unevaluable threshold suppresses the voxel
                _ => return TRANSPARENT,
            }
        }

        let mut rgba = match &self.coloring {
            LayerColoring::Label(table) => {
                let key = values[0].round() as i64;
                // Key 0 is "unlabeled" and never drawn, even when a table
                // erroneously assigns it an opaque color.
                if key == UNLABELED_KEY {
                    return TRANSPARENT;
                }
                match table.lookup_rgba(key) {
                    Some(rgba) => rgba,
                    None => return TRANSPARENT,
                }
            }
            LayerColoring::Palette(map) => map.map_scalar(values[0]),
            LayerColoring::PassThrough => {
                let to_byte = |v: f32| {
                    if byte_range {
                        v.clamp(0.0, 255.0).round() as u8
                    } else {
                        (v * 255.0).clamp(0.0, 255.0).round() as u8
                    }
                };
                [
                    to_byte(values[0]),
                    to_byte(values[1]),
                    to_byte(values[2]),
                    to_byte(values[3]),
                ]
            }
        };

        rgba[3] = (rgba[3] as f32 * self.opacity).round().clamp(0.0, 255.0) as u8;
        rgba
    }
}
