//! Cover-fit geometry

use std::fmt;

use crate::domain::error::InvalidDimensions;

/// Width and height of a source or frame, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    width: u32,
    height: u32,
}

impl Dimensions {
    /// Create validated dimensions (both axes non-zero)
    pub fn new(width: u32, height: u32) -> Result<Self, InvalidDimensions> {
        if width == 0 || height == 0 {
            return Err(InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Round both axes down to even numbers (minimum 2), as yuv420p requires
    pub fn to_even(self) -> Self {
        Self {
            width: (self.width & !1).max(2),
            height: (self.height & !1).max(2),
        }
    }

    /// Bytes in one RGBA frame of this size
    pub fn rgba_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Where a source lands on the target frame.
///
/// `render_*` is the scaled source size, `offset_*` its top-left corner on
/// the frame. Offsets are zero or negative: overflow is split evenly and
/// cropped on both sides of the overflowing axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f64,
    pub render_width: f64,
    pub render_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// Compute the cover-fit placement of `source` inside `target`.
pub fn cover_fit(source: Dimensions, target: Dimensions) -> Placement {
    let target_w = target.width as f64;
    let target_h = target.height as f64;

    let scale = (target_w / source.width as f64).max(target_h / source.height as f64);
    let render_width = source.width as f64 * scale;
    let render_height = source.height as f64 * scale;

    Placement {
        scale,
        render_width,
        render_height,
        offset_x: (target_w - render_width) / 2.0,
        offset_y: (target_h - render_height) / 2.0,
    }
}

/// Geometry for rendering a list of sources into one fixed-size frame.
/// Computed once per source before drawing begins.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionPlan {
    target: Dimensions,
    placements: Vec<Placement>,
}

impl CompositionPlan {
    /// Build the plan for every source, in order
    pub fn for_sources<I>(target: Dimensions, sources: I) -> Self
    where
        I: IntoIterator<Item = Dimensions>,
    {
        let placements = sources
            .into_iter()
            .map(|source| cover_fit(source, target))
            .collect();
        Self { target, placements }
    }

    pub fn target(&self) -> Dimensions {
        self.target
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn placement(&self, index: usize) -> Option<&Placement> {
        self.placements.get(index)
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn dims(w: u32, h: u32) -> Dimensions {
        Dimensions::new(w, h).unwrap()
    }

    fn assert_covers(p: &Placement, target: Dimensions) {
        assert!(p.render_width + EPS >= target.width() as f64);
        assert!(p.render_height + EPS >= target.height() as f64);
        assert!(p.offset_x <= EPS && p.offset_y <= EPS);
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(Dimensions::new(0, 10).is_err());
        assert!(Dimensions::new(10, 0).is_err());
    }

    #[test]
    fn to_even_rounds_down() {
        assert_eq!(dims(721, 1281).to_even(), dims(720, 1280));
        assert_eq!(dims(1, 1).to_even(), dims(2, 2));
        assert_eq!(dims(640, 480).to_even(), dims(640, 480));
    }

    #[test]
    fn same_aspect_has_no_offsets() {
        let p = cover_fit(dims(400, 300), dims(800, 600));
        assert!((p.scale - 2.0).abs() < EPS);
        assert!(p.offset_x.abs() < EPS);
        assert!(p.offset_y.abs() < EPS);
    }

    #[test]
    fn wide_source_into_tall_target_crops_horizontally() {
        let target = dims(720, 1280);
        let p = cover_fit(dims(800, 600), target);

        let scale = 1280.0 / 600.0;
        assert!((p.scale - scale).abs() < EPS);
        assert!((p.render_height - 1280.0).abs() < EPS);
        assert!((p.offset_x - (720.0 - 800.0 * scale) / 2.0).abs() < EPS);
        assert!(p.offset_y.abs() < EPS);
        assert_covers(&p, target);
    }

    #[test]
    fn tall_source_into_wide_target_crops_vertically() {
        let target = dims(1280, 720);
        let p = cover_fit(dims(600, 800), target);

        assert!(p.offset_x.abs() < EPS);
        assert!(p.offset_y < 0.0);
        assert_covers(&p, target);
    }

    #[test]
    fn cover_holds_across_aspect_ratios() {
        let sizes = [1u32, 3, 7, 64, 599, 600, 800, 1080, 1920, 4000];
        for &sw in &sizes {
            for &sh in &sizes {
                for &(tw, th) in &[(720u32, 1280u32), (1280, 720), (512, 512), (3, 5)] {
                    let target = dims(tw, th);
                    let source = dims(sw, sh);
                    let p = cover_fit(source, target);
                    assert_covers(&p, target);

                    let zero_x = p.offset_x.abs() < 1e-6;
                    let zero_y = p.offset_y.abs() < 1e-6;
                    let same_ratio = (sw as u64 * th as u64) == (sh as u64 * tw as u64);
                    if same_ratio {
                        assert!(zero_x && zero_y, "{source} into {target}");
                    } else {
                        assert!(zero_x ^ zero_y, "{source} into {target}: {p:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn plan_keeps_one_placement_per_source_in_order() {
        let target = dims(720, 1280);
        let plan = CompositionPlan::for_sources(
            target,
            [dims(800, 600), dims(600, 800), dims(800, 800)],
        );

        assert_eq!(plan.len(), 3);
        assert_eq!(plan.target(), target);
        assert_eq!(plan.placement(0), Some(&cover_fit(dims(800, 600), target)));
        assert_eq!(plan.placement(1), Some(&cover_fit(dims(600, 800), target)));
        assert_eq!(plan.placement(2), Some(&cover_fit(dims(800, 800), target)));
        assert!(plan.placement(3).is_none());
    }
}
