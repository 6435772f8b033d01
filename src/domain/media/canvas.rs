//! Drawable RGBA frame

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::domain::composition::{Dimensions, Placement};

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Fixed-size RGBA surface that sources are drawn onto
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    dimensions: Dimensions,
    image: RgbaImage,
}

impl Canvas {
    /// Create an opaque black canvas
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            image: RgbaImage::from_pixel(dimensions.width(), dimensions.height(), BLACK),
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Reset every pixel to opaque black
    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = BLACK;
        }
    }

    /// Draw `source` according to its cover-fit placement.
    ///
    /// Only the visible region of the source is scaled: the overflow that the
    /// placement pushes off-frame is cropped before resizing.
    pub fn draw(&mut self, source: &RgbaImage, placement: &Placement) {
        let (src_w, src_h) = source.dimensions();
        if src_w == 0 || src_h == 0 || placement.scale <= 0.0 {
            self.clear();
            return;
        }
        let (dst_w, dst_h) = self.image.dimensions();

        let (crop_x, crop_w) = visible_span(placement.offset_x, dst_w, placement.scale, src_w);
        let (crop_y, crop_h) = visible_span(placement.offset_y, dst_h, placement.scale, src_h);

        let visible = imageops::crop_imm(source, crop_x, crop_y, crop_w, crop_h).to_image();
        self.image = if (crop_w, crop_h) == (dst_w, dst_h) {
            visible
        } else {
            imageops::resize(&visible, dst_w, dst_h, FilterType::Triangle)
        };
    }

    /// Raw RGBA bytes, row-major
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Source-space start and length of the part that lands on a `dst_len` axis
fn visible_span(offset: f64, dst_len: u32, scale: f64, src_len: u32) -> (u32, u32) {
    let start = (-offset / scale).round().clamp(0.0, (src_len - 1) as f64) as u32;
    let len = (dst_len as f64 / scale)
        .round()
        .clamp(1.0, (src_len - start) as f64) as u32;
    (start, len)
}
