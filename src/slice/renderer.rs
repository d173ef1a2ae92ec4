//! Slice drawing orchestration

use serde::{Deserialize, Serialize};

use crate::color::VoxelColorizer;
use crate::core::types::{Mat4, Vec3};
use crate::slice::compositor::{apply_edge_mask, CompositeImage, SliceCompositor};
use crate::slice::grid::SlicePlane;
use crate::slice::identification::VoxelKey;
use crate::slice::layer::LayerStack;
use crate::slice::sampler::sample_layer;
use crate::slice::{EdgeMasking, Interpolation, SliceProjection, SliceView};

/// Per-draw view configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ViewSettings {
    pub view: SliceView,
    #[serde(default)]
    pub projection: SliceProjection,
    /// World coordinate the cutting plane passes through
    pub slice_xyz: [f32; 3],
    /// Viewing rotation for oblique projection, XYZ euler degrees
    #[serde(default)]
    pub rotation_degrees: [f32; 3],
    #[serde(default)]
    pub edge_masking: EdgeMasking,
    #[serde(default)]
    pub interpolation: Interpolation,
}

impl ViewSettings {
    /// Axis-aligned view through a coordinate
    pub fn orthogonal(view: SliceView, slice_xyz: Vec3) -> Self {
        Self {
            view,
            projection: SliceProjection::Orthogonal,
            slice_xyz: slice_xyz.to_array(),
            rotation_degrees: [0.0; 3],
            edge_masking: EdgeMasking::Off,
            interpolation: Interpolation::Nearest,
        }
    }

    /// Rotated view through a coordinate
    pub fn oblique(view: SliceView, slice_xyz: Vec3, rotation_degrees: [f32; 3]) -> Self {
        Self {
            view,
            projection: SliceProjection::Oblique,
            slice_xyz: slice_xyz.to_array(),
            rotation_degrees,
            edge_masking: EdgeMasking::Off,
            interpolation: Interpolation::Nearest,
        }
    }

    pub fn slice_coordinate(&self) -> Vec3 {
        Vec3::from_array(self.slice_xyz)
    }

    /// Rotation applied to the cutting plane; identity for orthogonal
    /// projection regardless of the configured angles
    pub fn rotation(&self) -> Mat4 {
        match self.projection {
            SliceProjection::Orthogonal => Mat4::IDENTITY,
            SliceProjection::Oblique => Mat4::from_euler(
                glam::EulerRot::XYZ,
                self.rotation_degrees[0].to_radians(),
                self.rotation_degrees[1].to_radians(),
                self.rotation_degrees[2].to_radians(),
            ),
        }
    }
}

/// Grid of parallel slices drawn together.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MontageLayout {
    pub rows: usize,
    pub cols: usize,
    /// Distance between consecutive cells, in sampling steps
    pub slice_step: usize,
}

/// One cell of a rendered montage.
pub struct MontageCell {
    pub grid_row: usize,
    pub grid_col: usize,
    /// Coordinate the cell's cutting plane passes through
    pub slice_xyz: Vec3,
    pub image: CompositeImage,
}

/// Rendered montage: independent composite images keyed by cell.
pub struct Montage {
    rows: usize,
    cols: usize,
    cells: Vec<MontageCell>,
}

impl Montage {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cells(&self) -> &[MontageCell] {
        &self.cells
    }

    pub fn cell(&self, grid_row: usize, grid_col: usize) -> Option<&MontageCell> {
        if grid_row >= self.rows || grid_col >= self.cols {
            return None;
        }
        self.cells.get(grid_row * self.cols + grid_col)
    }

    /// Picking across cells: resolve the cell, then its pixel
    pub fn query(
        &self,
        grid_row: usize,
        grid_col: usize,
        row: usize,
        col: usize,
    ) -> Option<VoxelKey> {
        self.cell(grid_row, grid_col)?.image.query(row, col)
    }
}

/// Drives the sample, colorize, composite, identify pipeline for each
/// requested slice and hands the finished image to the caller.
///
/// Holds only the view configuration; volume data is borrowed per call
/// and never stored. The whole pipeline runs synchronously on the
/// calling thread.
pub struct SliceRenderer {
    settings: ViewSettings,
}

impl SliceRenderer {
    pub fn new(settings: ViewSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    /// Render one slice of the stack at the configured coordinate.
    ///
    /// Layers are processed strictly in stack order (underlay first);
    /// a layer whose coloring cannot render its data kind is skipped so
    /// the rest of the slice still draws.
    pub fn draw(&self, stack: &LayerStack<'_>) -> CompositeImage {
        self.draw_at(stack, self.settings.slice_coordinate())
    }

    fn draw_at(&self, stack: &LayerStack<'_>, slice_xyz: Vec3) -> CompositeImage {
        let (Some(bounds), Some(spacing)) = (stack.combined_bounds(), stack.min_spacing())
        else {
            log::debug!("empty layer stack; producing empty slice");
            return CompositeImage::transparent(0, 0);
        };

        let Some(plane) = SlicePlane::for_view(
            self.settings.view,
            self.settings.rotation(),
            slice_xyz,
            &bounds,
            spacing,
        ) else {
            log::warn!("degenerate slice plane for {:?}; nothing drawn", self.settings.view);
            return CompositeImage::transparent(0, 0);
        };

        let mut compositor = SliceCompositor::new(plane.rows(), plane.cols());

        for (volume_index, layer) in stack.iter().enumerate() {
            if let Err(e) = layer.validate() {
                log::warn!(
                    "layer {} ({}) skipped: {}",
                    volume_index,
                    layer.grid.name(),
                    e
                );
                continue;
            }

            let mut samples = sample_layer(layer, &plane, self.settings.interpolation);
            apply_edge_mask(&mut samples, self.settings.edge_masking);

            let colorizer = VoxelColorizer::new(
                layer.coloring,
                layer.threshold.as_ref().map(|g| g.rule),
                layer.opacity,
            );
            let byte_range = samples.byte_range();
            let colors: Vec<[u8; 4]> = samples
                .iter()
                .map(|s| colorizer.colorize(s.values, s.valid, byte_range, s.threshold))
                .collect();

            compositor.add_layer(volume_index, layer.grid.map_index(), &samples, &colors);
        }

        let image = compositor.finish();
        log::debug!(
            "slice {}x{}: {} of {} pixels identified",
            image.rows(),
            image.cols(),
            image.identification().identified_count(),
            image.rows() * image.cols()
        );
        image
    }

    /// Render a grid of parallel slices.
    ///
    /// Cells run row-major from the top-left, which holds the
    /// most-positive slice coordinate; each subsequent cell steps
    /// `slice_step` sampling steps toward more negative coordinates,
    /// centered on the configured coordinate. Cells falling outside the
    /// volume render fully transparent, keeping the grid shape stable.
    pub fn draw_montage(&self, stack: &LayerStack<'_>, layout: &MontageLayout) -> Montage {
        let count = layout.rows * layout.cols;
        let spacing = stack.min_spacing().unwrap_or(1.0);
        let step_world = layout.slice_step.max(1) as f32 * spacing;
        let center = self.settings.slice_coordinate();
        let normal_axis = match self.settings.view {
            SliceView::Axial => 2,
            SliceView::Coronal => 1,
            SliceView::Parasagittal => 0,
        };

        let mut cells = Vec::with_capacity(count);
        for cell_index in 0..count {
            let offset = ((count as f32 - 1.0) / 2.0 - cell_index as f32) * step_world;
            let mut slice_xyz = center;
            slice_xyz[normal_axis] = center[normal_axis] + offset;

            cells.push(MontageCell {
                grid_row: cell_index / layout.cols,
                grid_col: cell_index % layout.cols,
                slice_xyz,
                image: self.draw_at(stack, slice_xyz),
            });
        }

        Montage {
            rows: layout.rows,
            cols: layout.cols,
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{LayerColoring, LinearColorMap, ThresholdRule};
    use crate::slice::layer::Layer;
    use crate::volume::{DataKind, IndexTransform, Volume};

    fn identity() -> IndexTransform {
        IndexTransform::from_matrix(Mat4::IDENTITY).unwrap()
    }

    fn label_volume() -> (Volume, crate::color::LabelTable) {
        let v = Volume::from_fn("labels", [4, 4, 4], DataKind::Label, identity(), |i, j, k, _| {
            (1 + i + 4 * j + 16 * k) as f32
        })
        .unwrap();
        let mut table = crate::color::LabelTable::new();
        for key in 1..=64 {
            table.insert(key, format!("r{key}"), [key as u8, 0, 0, 255]);
        }
        (v, table)
    }

    #[test]
    fn test_axial_label_slice_enumerates_voxels() {
        let (v, table) = label_volume();
        let mut stack = LayerStack::new();
        stack.push(Layer::new(v.grid(0).unwrap(), LayerColoring::Label(&table), 1.0));

        let renderer = SliceRenderer::new(ViewSettings::orthogonal(
            SliceView::Axial,
            Vec3::new(0.0, 0.0, 2.0),
        ));
        let image = renderer.draw(&stack);

        assert_eq!(image.rows(), 4);
        assert_eq!(image.cols(), 4);
        // Pixel (row, col) identifies voxel (i=col, j=row, k=2)
        for row in 0..4 {
            for col in 0..4 {
                let key = image.query(row, col).expect("every pixel identified");
                assert_eq!(key.ijk, [col as i64, row as i64, 2]);
                assert_eq!(key.volume_index, 0);
                assert_eq!(key.map_index, 0);
                let expected_key = 1 + col + 4 * row + 32;
                assert_eq!(image.pixel(row, col).r, expected_key as u8);
            }
        }
    }

    #[test]
    fn test_oblique_identity_matches_orthogonal() {
        let (v, table) = label_volume();
        let mut stack = LayerStack::new();
        stack.push(Layer::new(v.grid(0).unwrap(), LayerColoring::Label(&table), 1.0));

        let ortho = SliceRenderer::new(ViewSettings::orthogonal(
            SliceView::Axial,
            Vec3::new(0.0, 0.0, 1.0),
        ))
        .draw(&stack);
        let oblique = SliceRenderer::new(ViewSettings::oblique(
            SliceView::Axial,
            Vec3::new(0.0, 0.0, 1.0),
            [0.0; 3],
        ))
        .draw(&stack);

        assert_eq!(ortho.rows(), oblique.rows());
        assert_eq!(ortho.pixels(), oblique.pixels());
        for row in 0..ortho.rows() {
            for col in 0..ortho.cols() {
                assert_eq!(ortho.query(row, col), oblique.query(row, col));
            }
        }
    }

    #[test]
    fn test_identification_consistent_with_alpha() {
        // Underlay smaller than the overlay so part of the slice has
        // only one contributing layer and part has none
        let small = Volume::from_fn("small", [2, 2, 4], DataKind::PaletteScalar, identity(), |_, _, _, _| 1.0)
            .unwrap();
        let offset = IndexTransform::from_spacing_origin(Vec3::ONE, Vec3::new(2.0, 2.0, 0.0)).unwrap();
        let shifted = Volume::from_fn("shifted", [2, 2, 4], DataKind::PaletteScalar, offset, |_, _, _, _| 0.5)
            .unwrap();
        let map = LinearColorMap::grayscale(0.0, 1.0);
        let mut stack = LayerStack::new();
        stack.push(Layer::new(small.grid(0).unwrap(), LayerColoring::Palette(&map), 1.0));
        stack.push(Layer::new(shifted.grid(0).unwrap(), LayerColoring::Palette(&map), 0.5));

        let renderer = SliceRenderer::new(ViewSettings::orthogonal(
            SliceView::Axial,
            Vec3::new(0.0, 0.0, 1.0),
        ));
        let image = renderer.draw(&stack);

        let mut some_transparent = false;
        let mut some_identified = false;
        for row in 0..image.rows() {
            for col in 0..image.cols() {
                let alpha = image.pixel(row, col).a;
                let id = image.query(row, col);
                if alpha > 0 {
                    assert!(id.is_some(), "visible pixel ({row},{col}) lacks identification");
                    some_identified = true;
                } else {
                    assert!(id.is_none(), "invisible pixel ({row},{col}) has identification");
                    some_transparent = true;
                }
            }
        }
        assert!(some_transparent);
        assert!(some_identified);
    }

    #[test]
    fn test_overlay_wins_identification_where_visible() {
        let base = Volume::from_fn("base", [4, 4, 4], DataKind::PaletteScalar, identity(), |_, _, _, _| 1.0)
            .unwrap();
        let overlay = Volume::from_fn("over", [4, 4, 4], DataKind::PaletteScalar, identity(), |_, _, _, _| 1.0)
            .unwrap();
        let map = LinearColorMap::grayscale(0.0, 1.0);
        let mut stack = LayerStack::new();
        stack.push(Layer::new(base.grid(0).unwrap(), LayerColoring::Palette(&map), 1.0));
        stack.push(Layer::new(overlay.grid(0).unwrap(), LayerColoring::Palette(&map), 0.4));

        let renderer = SliceRenderer::new(ViewSettings::orthogonal(
            SliceView::Axial,
            Vec3::new(0.0, 0.0, 2.0),
        ));
        let image = renderer.draw(&stack);
        assert_eq!(image.query(0, 0).unwrap().volume_index, 1);
    }

    #[test]
    fn test_threshold_gating_scenario() {
        let color = Volume::from_fn("c", [4, 4, 4], DataKind::PaletteScalar, identity(), |_, _, _, _| 0.8)
            .unwrap();
        // Threshold volume: 0.3 below x = 2, 0.7 from x = 2 up
        let gate = Volume::from_fn("t", [4, 4, 4], DataKind::PaletteScalar, identity(), |i, _, _, _| {
            if i < 2 { 0.3 } else { 0.7 }
        })
        .unwrap();
        let map = LinearColorMap::grayscale(0.0, 1.0);
        let mut stack = LayerStack::new();
        stack.push(
            Layer::new(color.grid(0).unwrap(), LayerColoring::Palette(&map), 1.0)
                .with_threshold(gate.grid(0).unwrap(), ThresholdRule::show_inside(0.5, 1.0)),
        );

        let renderer = SliceRenderer::new(ViewSettings::orthogonal(
            SliceView::Axial,
            Vec3::new(0.0, 0.0, 1.0),
        ));
        let image = renderer.draw(&stack);

        // Gated out where the threshold volume reads 0.3
        assert_eq!(image.pixel(1, 1).a, 0);
        assert_eq!(image.query(1, 1), None);
        // Shown where it reads 0.7
        assert_eq!(image.pixel(1, 2).a, 255);
        assert_eq!(image.pixel(1, 2).r, 204);
    }

    #[test]
    fn test_empty_stack_draws_nothing() {
        let stack = LayerStack::new();
        let renderer = SliceRenderer::new(ViewSettings::orthogonal(SliceView::Axial, Vec3::ZERO));
        let image = renderer.draw(&stack);
        assert_eq!(image.rows(), 0);
        assert_eq!(image.identification().identified_count(), 0);
    }

    #[test]
    fn test_mismatched_coloring_layer_skipped() {
        let (v, table) = label_volume();
        let scalar = Volume::from_fn("s", [4, 4, 4], DataKind::PaletteScalar, identity(), |_, _, _, _| 1.0)
            .unwrap();
        let mut stack = LayerStack::new();
        stack.push(Layer::new(v.grid(0).unwrap(), LayerColoring::Label(&table), 1.0));
        // Scalar data with label coloring cannot render
        stack.push(Layer::new(scalar.grid(0).unwrap(), LayerColoring::Label(&table), 1.0));

        let renderer = SliceRenderer::new(ViewSettings::orthogonal(
            SliceView::Axial,
            Vec3::new(0.0, 0.0, 2.0),
        ));
        let image = renderer.draw(&stack);
        // The valid underlay still drew everywhere
        assert_eq!(image.identification().identified_count(), 16);
        assert_eq!(image.query(0, 0).unwrap().volume_index, 0);
    }

    #[test]
    fn test_montage_cell_coordinates_and_query() {
        let (v, table) = label_volume();
        let mut stack = LayerStack::new();
        stack.push(Layer::new(v.grid(0).unwrap(), LayerColoring::Label(&table), 1.0));

        let renderer = SliceRenderer::new(ViewSettings::orthogonal(
            SliceView::Axial,
            Vec3::new(0.0, 0.0, 1.5),
        ));
        let layout = MontageLayout {
            rows: 2,
            cols: 2,
            slice_step: 1,
        };
        let montage = renderer.draw_montage(&stack, &layout);

        assert_eq!(montage.cells().len(), 4);
        // Top-left holds the most positive coordinate, stepping down
        let z: Vec<f32> = montage.cells().iter().map(|c| c.slice_xyz.z).collect();
        assert_eq!(z, vec![3.0, 2.0, 1.0, 0.0]);

        // Every in-bounds cell identifies its own k plane
        let key = montage.query(0, 0, 1, 1).unwrap();
        assert_eq!(key.ijk, [1, 1, 3]);
        let key = montage.query(1, 1, 0, 0).unwrap();
        assert_eq!(key.ijk, [0, 0, 0]);
        assert!(montage.query(5, 0, 0, 0).is_none());
    }

    #[test]
    fn test_montage_out_of_bounds_cells_transparent() {
        let (v, table) = label_volume();
        let mut stack = LayerStack::new();
        stack.push(Layer::new(v.grid(0).unwrap(), LayerColoring::Label(&table), 1.0));

        let renderer = SliceRenderer::new(ViewSettings::orthogonal(
            SliceView::Axial,
            Vec3::new(0.0, 0.0, 1.5),
        ));
        let layout = MontageLayout {
            rows: 1,
            cols: 8,
            slice_step: 2,
        };
        let montage = renderer.draw_montage(&stack, &layout);
        assert_eq!(montage.cells().len(), 8);

        let identified: Vec<usize> = montage
            .cells()
            .iter()
            .map(|c| c.image.identification().identified_count())
            .collect();
        // Far cells fall outside k in [0, 4) and draw nothing
        assert_eq!(identified[0], 0);
        assert!(identified.iter().any(|n| *n == 16));
        assert_eq!(identified[7], 0);
    }
}
