// Lookup tables for gamma-correct mixing of the cover over the real photo.
// Mixing in linear light keeps the soft edge of a reveal hole free of dark halos.

use crate::types::{pack_rgb, unpack_rgb};

pub struct GammaLut {
    // sRGB(0..255) -> linear (0..1)
    srgb_to_linear: [f32; 256],
    // linear(0..1) -> sRGB(0..255), index = (linear * 4095).round()
    linear_to_srgb: [u8; 4096],
}

impl Default for GammaLut {
    fn default() -> Self {
        Self::new()
    }
}

impl GammaLut {
    /// Build both tables once at startup.
    pub fn new() -> Self {
        let mut s2l = [0.0f32; 256];
        for (v, slot) in s2l.iter_mut().enumerate() {
            let c = v as f32 / 255.0;
            *slot = if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) };
        }

        let mut l2s = [0u8; 4096];
        for (i, slot) in l2s.iter_mut().enumerate() {
            let l = i as f32 / 4095.0;
            let s = if l <= 0.003_130_8 { 12.92 * l } else { 1.055 * l.powf(1.0 / 2.4) - 0.055 };
            *slot = (s * 255.0).round().clamp(0.0, 255.0) as u8;
        }

        Self { srgb_to_linear: s2l, linear_to_srgb: l2s }
    }

    #[inline]
    pub fn srgb_u8_to_linear(&self, v: u8) -> f32 {
        self.srgb_to_linear[v as usize]
    }

    #[inline]
    pub fn linear_to_srgb_u8(&self, l: f32) -> u8 {
        let idx = (l.clamp(0.0, 1.0) * 4095.0).round() as usize;
        self.linear_to_srgb[idx]
    }

    /// `a * top + (1 - a) * base`, per channel in linear light, on packed pixels.
    #[inline]
    pub fn mix(&self, base: u32, top: u32, a: f32) -> u32 {
        let (br, bg, bb) = unpack_rgb(base);
        let (tr, tg, tb) = unpack_rgb(top);
        let inv = 1.0 - a;
        let ch = |b: u8, t: u8| {
            self.linear_to_srgb_u8(a * self.srgb_u8_to_linear(t) + inv * self.srgb_u8_to_linear(b))
        };
        pack_rgb(ch(br, tr), ch(bg, tg), ch(bb, tb))
    }
}
