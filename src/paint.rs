// Software raster primitives for the reveal surface.
// All coordinates here are device pixels; callers scale logical positions first.
use crate::error::{Error, Result};
use crate::gamma::GammaLut;
use crate::types::{pack_rgb, unpack_rgb, FrameBuffer, Mask, Rgba};

// ----------------------------- radial gradients ----------------------------------------

#[derive(Clone, Copy, Debug)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

pub const fn stop(offset: f32, color: Rgba) -> ColorStop {
    ColorStop { offset, color }
}

/// Concentric radial gradient filled over the disc of radius `outer`.
/// Inside `inner` the first stop's colour is padded, like a canvas gradient.
pub struct RadialGradient<'a> {
    pub cx: f32,
    pub cy: f32,
    pub inner: f32,
    pub outer: f32,
    pub stops: &'a [ColorStop],
}

impl RadialGradient<'_> {
    pub fn sample(&self, distance: f32) -> Rgba {
        let Some(first) = self.stops.first() else { return Rgba::TRANSPARENT };
        let span = self.outer - self.inner;
        let t = if span > 0.0 { ((distance - self.inner) / span).clamp(0.0, 1.0) } else { 1.0 };

        if t <= first.offset {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.offset {
                let w = if b.offset > a.offset { (t - a.offset) / (b.offset - a.offset) } else { 1.0 };
                return lerp_rgba(a.color, b.color, w);
            }
        }
        self.stops[self.stops.len() - 1].color
    }

    /// Visit every pixel centre inside the outer disc with its sampled colour.
    fn for_each_pixel(&self, width: usize, height: usize, mut f: impl FnMut(usize, Rgba)) {
        if self.outer <= 0.0 || width == 0 || height == 0 {
            return;
        }
        let x0 = (self.cx - self.outer).floor().max(0.0) as usize;
        let y0 = (self.cy - self.outer).floor().max(0.0) as usize;
        let x1 = ((self.cx + self.outer).ceil().max(0.0) as usize).min(width - 1);
        let y1 = ((self.cy + self.outer).ceil().max(0.0) as usize).min(height - 1);
        if x0 > x1 || y0 > y1 {
            return;
        }
        let r2 = self.outer * self.outer;

        for y in y0..=y1 {
            let dy = y as f32 + 0.5 - self.cy;
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - self.cx;
                let d2 = dx * dx + dy * dy;
                if d2 > r2 {
                    continue;
                }
                let c = self.sample(d2.sqrt());
                if c.a > 0.0 {
                    f(y * width + x, c);
                }
            }
        }
    }
}

fn lerp_rgba(a: Rgba, b: Rgba, t: f32) -> Rgba {
    let ch = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round().clamp(0.0, 255.0) as u8;
    Rgba { r: ch(a.r, b.r), g: ch(a.g, b.g), b: ch(a.b, b.b), a: a.a + (b.a - a.a) * t }
}

// ----------------------------- erase (destination-out) ---------------------------------

/// Punch a soft hole into the coverage mask: `coverage *= 1 - src_alpha`.
pub fn erase_radial(mask: &mut Mask, gradient: &RadialGradient) {
    let alpha = &mut mask.alpha;
    gradient.for_each_pixel(mask.width, mask.height, |idx, c| {
        alpha[idx] *= 1.0 - c.a.clamp(0.0, 1.0);
    });
}

// ----------------------------- additive drawing ----------------------------------------

/// Additive blend one RGB triplet into a pixel with saturation to 255.
#[inline]
fn add_rgb_saturating(fb: &mut FrameBuffer, idx: usize, r: u8, g: u8, b: u8) {
    let (or, og, ob) = unpack_rgb(fb.pixels[idx]);
    fb.pixels[idx] = pack_rgb(or.saturating_add(r), og.saturating_add(g), ob.saturating_add(b));
}

#[inline]
fn scaled(c: Rgba, w: f32) -> (u8, u8, u8) {
    let k = (c.a * w).clamp(0.0, 1.0);
    (
        (c.r as f32 * k).round() as u8,
        (c.g as f32 * k).round() as u8,
        (c.b as f32 * k).round() as u8,
    )
}

/// Fill the gradient disc with additive blending (light only ever gets added).
pub fn add_radial(fb: &mut FrameBuffer, gradient: &RadialGradient) {
    let (w, h) = (fb.width, fb.height);
    gradient.for_each_pixel(w, h, |idx, c| {
        let (r, g, b) = scaled(c, 1.0);
        add_rgb_saturating(fb, idx, r, g, b);
    });
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blend {
    /// Light adds up and saturates (glow, sparkles).
    Add,
    /// Ordinary source-over.
    Over,
}

/// Fill a convex polygon with 2x2 supersampled edge coverage.
pub fn fill_convex_polygon(fb: &mut FrameBuffer, pts: &[(f32, f32)], color: Rgba, blend: Blend) {
    if pts.len() < 3 || fb.is_empty() || color.a <= 0.0 {
        return;
    }
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
    for &(x, y) in pts {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    if max_x < 0.0 || max_y < 0.0 || min_x >= fb.width as f32 || min_y >= fb.height as f32 {
        return;
    }
    let x0 = min_x.floor().max(0.0) as usize;
    let y0 = min_y.floor().max(0.0) as usize;
    let x1 = (max_x.ceil() as usize).min(fb.width - 1);
    let y1 = (max_y.ceil() as usize).min(fb.height - 1);

    const SUB: [f32; 2] = [0.25, 0.75];
    for y in y0..=y1 {
        for x in x0..=x1 {
            let mut hits = 0u32;
            for sy in SUB {
                for sx in SUB {
                    if inside_convex(pts, x as f32 + sx, y as f32 + sy) {
                        hits += 1;
                    }
                }
            }
            if hits == 0 {
                continue;
            }
            let coverage = hits as f32 / 4.0;
            match blend {
                Blend::Add => {
                    let (r, g, b) = scaled(color, coverage);
                    add_rgb_saturating(fb, y * fb.width + x, r, g, b);
                }
                Blend::Over => blend_pixel(fb, x as i32, y as i32, color.packed(), color.a * coverage),
            }
        }
    }
}

/// Point-in-convex-polygon, either winding.
fn inside_convex(pts: &[(f32, f32)], px: f32, py: f32) -> bool {
    let mut sign = 0.0f32;
    for i in 0..pts.len() {
        let (ax, ay) = pts[i];
        let (bx, by) = pts[(i + 1) % pts.len()];
        let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

// ----------------------------- image layers ----------------------------------------------

/// Copy a pre-scaled cover-fit image onto `dst`, cropping whatever overflows.
/// `offset_x`/`offset_y` are where the image's top-left lands (usually <= 0).
pub fn blit(dst: &mut FrameBuffer, src: &FrameBuffer, offset_x: i64, offset_y: i64) {
    for y in 0..dst.height {
        let sy = y as i64 - offset_y;
        if sy < 0 || sy >= src.height as i64 {
            continue;
        }
        let sx0 = (-offset_x).max(0);
        let dx0 = offset_x.max(0);
        if sx0 >= src.width as i64 || dx0 >= dst.width as i64 {
            continue;
        }
        let len = (src.width as i64 - sx0).min(dst.width as i64 - dx0) as usize;
        let s = sy as usize * src.width + sx0 as usize;
        let d = y * dst.width + dx0 as usize;
        dst.pixels[d..d + len].copy_from_slice(&src.pixels[s..s + len]);
    }
}

/// Composite `top` over `base` through the coverage mask, in linear light.
/// Mask 1 = `top` (cover), 0 = keep `base` (real photo).
pub fn blend_masked(base: &mut FrameBuffer, top: &FrameBuffer, mask: &Mask, lut: &GammaLut) -> Result<()> {
    if base.width != top.width || base.height != top.height {
        return Err(Error::surface("blend: dimension mismatch"));
    }
    if mask.width != base.width || mask.height != base.height {
        return Err(Error::surface("blend: mask dimension mismatch"));
    }

    for (i, px) in base.pixels.iter_mut().enumerate() {
        let a = mask.alpha[i];
        if a <= 0.0 {
            continue; // fully revealed
        }
        if a >= 1.0 {
            *px = top.pixels[i];
            continue;
        }
        *px = lut.mix(*px, top.pixels[i], a);
    }
    Ok(())
}

// ----------------------------- per-pixel helpers ----------------------------------------

/// Source-over one pixel with `alpha`, ignoring out-of-bounds coordinates.
#[inline]
pub fn blend_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32, alpha: f32) {
    if x < 0 || y < 0 || alpha <= 0.0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = if alpha >= 1.0 { color } else { mix_srgb(fb.pixels[idx], color, alpha) };
}

/// Plain sRGB mix; good enough for overlays that are not seamed against anything.
#[inline]
pub fn mix_srgb(base: u32, top: u32, a: f32) -> u32 {
    let (br, bg, bb) = unpack_rgb(base);
    let (tr, tg, tb) = unpack_rgb(top);
    let ch = |b: u8, t: u8| (b as f32 + (t as f32 - b as f32) * a).round().clamp(0.0, 255.0) as u8;
    pack_rgb(ch(br, tr), ch(bg, tg), ch(bb, tb))
}

/// CSS-style `grayscale(amount)`: 0 keeps colour, 1 is fully desaturated.
#[inline]
pub fn grayscale(px: u32, amount: f32) -> u32 {
    if amount <= 0.0 {
        return px;
    }
    let a = amount.min(1.0);
    let (r, g, b) = unpack_rgb(px);
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let ch = |c: [f32; 3]| (c[0] * r + c[1] * g + c[2] * b).round().clamp(0.0, 255.0) as u8;
    pack_rgb(
        ch([0.2126 + 0.7874 * (1.0 - a), 0.7152 - 0.7152 * (1.0 - a), 0.0722 - 0.0722 * (1.0 - a)]),
        ch([0.2126 - 0.2126 * (1.0 - a), 0.7152 + 0.2848 * (1.0 - a), 0.0722 - 0.0722 * (1.0 - a)]),
        ch([0.2126 - 0.2126 * (1.0 - a), 0.7152 - 0.7152 * (1.0 - a), 0.0722 + 0.9278 * (1.0 - a)]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba = Rgba::new(0, 0, 0, 1.0);

    #[test]
    fn gradient_pads_inside_inner_radius_and_interpolates() {
        let stops = [stop(0.0, Rgba::TRANSPARENT), stop(0.5, BLACK.with_alpha(0.3)), stop(1.0, Rgba::TRANSPARENT)];
        let g = RadialGradient { cx: 0.0, cy: 0.0, inner: 80.0, outer: 100.0, stops: &stops };
        assert_eq!(g.sample(10.0).a, 0.0);
        assert!((g.sample(90.0).a - 0.3).abs() < 1e-6);
        assert!((g.sample(85.0).a - 0.15).abs() < 1e-6);
        assert_eq!(g.sample(100.0).a, 0.0);
    }

    #[test]
    fn erase_opens_a_hole_centred_on_the_gradient() {
        let mut mask = Mask::new(40, 40);
        let stops = [stop(0.0, BLACK), stop(0.5, BLACK.with_alpha(0.5)), stop(1.0, Rgba::TRANSPARENT)];
        let g = RadialGradient { cx: 20.0, cy: 20.0, inner: 0.0, outer: 10.0, stops: &stops };
        erase_radial(&mut mask, &g);

        let centre = mask.alpha[20 * 40 + 20];
        let rim = mask.alpha[20 * 40 + 28];
        assert!(centre < 0.1, "centre coverage {centre}");
        assert!(rim > centre && rim < 1.0);
        assert_eq!(mask.alpha[0], 1.0);
    }

    #[test]
    fn additive_fill_saturates() {
        let mut fb = FrameBuffer::new(8, 8);
        fb.fill(0x00F0F0F0);
        let stops = [stop(0.0, Rgba::hex(0xFFFFFF)), stop(1.0, Rgba::hex(0xFFFFFF))];
        let g = RadialGradient { cx: 4.0, cy: 4.0, inner: 0.0, outer: 3.0, stops: &stops };
        add_radial(&mut fb, &g);
        assert_eq!(fb.get(4, 4), 0x00FFFFFF);
        assert_eq!(fb.get(0, 0), 0x00F0F0F0);
    }

    #[test]
    fn polygon_fill_covers_interior_only() {
        let mut fb = FrameBuffer::new(20, 20);
        let square = [(5.0, 5.0), (15.0, 5.0), (15.0, 15.0), (5.0, 15.0)];
        fill_convex_polygon(&mut fb, &square, Rgba::hex(0x808080), Blend::Add);
        assert_eq!(fb.get(10, 10), 0x00808080);
        assert_eq!(fb.get(2, 2), 0);
        assert_eq!(fb.get(17, 10), 0);

        fill_convex_polygon(&mut fb, &square, Rgba::hex(0x102030), Blend::Over);
        assert_eq!(fb.get(10, 10), 0x00102030);
    }

    #[test]
    fn blit_crops_negative_offsets() {
        let mut src = FrameBuffer::new(4, 2);
        for (i, p) in src.pixels.iter_mut().enumerate() {
            *p = i as u32;
        }
        let mut dst = FrameBuffer::new(2, 2);
        blit(&mut dst, &src, -1, 0);
        assert_eq!(dst.pixels, vec![1, 2, 5, 6]);
    }

    #[test]
    fn masked_blend_follows_coverage() {
        let lut = GammaLut::new();
        let mut base = FrameBuffer::new(2, 1);
        base.fill(0x00000000);
        let mut top = FrameBuffer::new(2, 1);
        top.fill(0x00FFFFFF);
        let mut mask = Mask::new(2, 1);
        mask.alpha[0] = 0.0;
        blend_masked(&mut base, &top, &mask, &lut).unwrap();
        assert_eq!(base.pixels, vec![0x00000000, 0x00FFFFFF]);

        let wrong = Mask::new(3, 1);
        assert!(blend_masked(&mut base, &top, &wrong, &lut).is_err());
    }

    #[test]
    fn grayscale_extremes() {
        let red = 0x00FF0000;
        assert_eq!(grayscale(red, 0.0), red);
        let (r, g, b) = unpack_rgb(grayscale(red, 1.0));
        assert_eq!(r, g);
        assert_eq!(g, b);
    }
}
