//! Color resolution: palettes, label tables, per-sample colorizing

pub mod palette;
pub mod label_table;
pub mod colorizer;

pub use palette::{ColorMap, LinearColorMap, ThresholdRule, ThresholdTest};
pub use label_table::LabelTable;
pub use colorizer::{LayerColoring, VoxelColorizer};
