// Core pixel types shared by the renderer, the painter and the window host.

#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    pub width: usize,      // surface width in device pixels
    pub height: usize,     // surface height in device pixels
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }
}

/// Coverage mask in [0,1] per pixel; 1 = cover image, 0 = real image shows through.
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub alpha: Vec<f32>,   // length = width * height, values clamped to [0.0, 1.0]
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, alpha: vec![1.0; width * height] }
    }

    /// Back to fully covered, without reallocating.
    pub fn reset_opaque(&mut self) {
        self.alpha.fill(1.0);
    }
}

/// Straight (non-premultiplied) colour with a float alpha.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba { r: 0, g: 0, b: 0, a: 0.0 };

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// `0xRRGGBB` at full opacity.
    pub const fn hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xFF) as u8,
            g: ((rgb >> 8) & 0xFF) as u8,
            b: (rgb & 0xFF) as u8,
            a: 1.0,
        }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn packed(self) -> u32 {
        pack_rgb(self.r, self.g, self.b)
    }
}

#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

#[inline]
pub fn unpack_rgb(px: u32) -> (u8, u8, u8) {
    (((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8)
}

/// Placement of an image scaled to fill a target while keeping its aspect ratio.
/// Offsets are <= 0; the overflowing axis is cropped symmetrically.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverFit {
    pub draw_width: f32,
    pub draw_height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl CoverFit {
    pub fn compute(image_w: f32, image_h: f32, target_w: f32, target_h: f32) -> Self {
        let image_ratio = image_w / image_h;
        let target_ratio = target_w / target_h;

        if image_ratio > target_ratio {
            // wider than the target: match heights, crop the sides
            let draw_height = target_h;
            let draw_width = draw_height * image_ratio;
            Self { draw_width, draw_height, offset_x: (target_w - draw_width) / 2.0, offset_y: 0.0 }
        } else {
            // taller (or equal): match widths, crop top and bottom
            let draw_width = target_w;
            let draw_height = draw_width / image_ratio;
            Self { draw_width, draw_height, offset_x: 0.0, offset_y: (target_h - draw_height) / 2.0 }
        }
    }

    /// Pixels cropped from each side horizontally.
    pub fn crop_x(&self) -> f32 {
        -self.offset_x
    }

    /// Pixels cropped from top and bottom.
    pub fn crop_y(&self) -> f32 {
        -self.offset_y
    }
}
