// Photo loading for the two reveal layers.
// Visual expectation: the cover ("artistic") image hides the real photo until
// the pointer punches holes in it. If a file is missing or corrupt, a generated
// placeholder stands in so the reveal still works.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use image::{RgbImage, imageops::FilterType};

use crate::error::{Error, Result};
use crate::paint::{self, Blend};
use crate::types::{pack_rgb, unpack_rgb, CoverFit, FrameBuffer, Rgba};

pub const PLACEHOLDER_WIDTH: u32 = 600;
pub const PLACEHOLDER_HEIGHT: u32 = 800;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    /// Drawn on top; holes are cut into it.
    Cover,
    /// Drawn first; shows through the holes.
    Real,
}

impl ImageSlot {
    pub fn name(self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Real => "real",
        }
    }
}

pub struct LoadedImage {
    pub slot: ImageSlot,
    pub image: RgbImage,
    pub placeholder: bool,
}

/// Decode one photo from disk.
pub fn load(path: &Path) -> Result<RgbImage> {
    let img = image::open(path).map_err(|source| Error::ImageLoad { path: path.to_path_buf(), source })?;
    Ok(img.to_rgb8())
}

/// Decode, or fall back to the slot's placeholder on any failure. Never retries.
pub fn load_or_placeholder(slot: ImageSlot, path: &Path) -> LoadedImage {
    match load(path) {
        Ok(image) => {
            tracing::debug!(slot = slot.name(), w = image.width(), h = image.height(), "image loaded");
            LoadedImage { slot, image, placeholder: false }
        }
        Err(e) => {
            tracing::warn!(slot = slot.name(), error = %e, "image failed to load, using placeholder");
            LoadedImage { slot, image: placeholder(slot), placeholder: true }
        }
    }
}

/// Background decode of both photos; results arrive one at a time via [`poll`](Self::poll).
pub struct ImageLoader {
    rx: Receiver<LoadedImage>,
}

impl ImageLoader {
    pub fn spawn(cover: PathBuf, real: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel();
        for (slot, path) in [(ImageSlot::Cover, cover), (ImageSlot::Real, real)] {
            let tx = tx.clone();
            thread::spawn(move || {
                // receiver gone means the app already shut down
                let _ = tx.send(load_or_placeholder(slot, &path));
            });
        }
        Self { rx }
    }

    /// Next finished image, if any, without blocking.
    pub fn poll(&self) -> Option<LoadedImage> {
        match self.rx.try_recv() {
            Ok(img) => Some(img),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

// ----------------------------- placeholders ---------------------------------------------

/// 600x800 stand-in. Cover: diagonal lavender -> cream -> champagne with a gold
/// four-point star. Real: cream with a magenta label.
pub fn placeholder(slot: ImageSlot) -> RgbImage {
    let (w, h) = (PLACEHOLDER_WIDTH as usize, PLACEHOLDER_HEIGHT as usize);
    let mut fb = FrameBuffer::new(w, h);

    match slot {
        ImageSlot::Cover => {
            let stops = [0x00E6E6FA, 0x00FFF5EC, 0x00F4E4C1];
            let len2 = (w * w + h * h) as f32;
            for y in 0..h {
                for x in 0..w {
                    // projection onto the (0,0)->(w,h) diagonal
                    let t = ((x * w + y * h) as f32 / len2).clamp(0.0, 1.0);
                    let (a, b, k) = if t < 0.5 { (stops[0], stops[1], t * 2.0) } else { (stops[1], stops[2], (t - 0.5) * 2.0) };
                    fb.pixels[y * w + x] = paint::mix_srgb(a, b, k);
                }
            }
            let (cx, cy, s) = (w as f32 / 2.0, h as f32 / 2.0, 24.0);
            let gold = Rgba::hex(0xD4AF37);
            let vertical = [(cx, cy - s), (cx + s * 0.3, cy), (cx, cy + s), (cx - s * 0.3, cy)];
            let horizontal = [(cx - s, cy), (cx, cy - s * 0.3), (cx + s, cy), (cx, cy + s * 0.3)];
            paint::fill_convex_polygon(&mut fb, &vertical, gold, Blend::Over);
            paint::fill_convex_polygon(&mut fb, &horizontal, gold, Blend::Over);
        }
        ImageSlot::Real => {
            fb.fill(0x00FFF5EC);
            let label = "PHOTO";
            let scale = 6;
            let tw = crate::draw::text_width(label, scale);
            let x = (w as i32 - tw) / 2;
            let y = h as i32 / 2 - 7 * scale / 2;
            crate::draw::draw_text(&mut fb, x, y, label, 0x00C71585, scale, 1.0);
        }
    }
    rgb_from_frame(&fb)
}

// ----------------------------- conversions ----------------------------------------------

/// Pack RGB pixels as 0x00RRGGBB for the window.
pub fn frame_from_rgb(img: &RgbImage) -> FrameBuffer {
    let (w, h) = img.dimensions();
    let mut out = Vec::with_capacity((w as usize) * (h as usize));
    for pixel in img.pixels() {
        out.push(pack_rgb(pixel[0], pixel[1], pixel[2]));
    }
    FrameBuffer { width: w as usize, height: h as usize, pixels: out }
}

pub fn rgb_from_frame(fb: &FrameBuffer) -> RgbImage {
    RgbImage::from_fn(fb.width as u32, fb.height as u32, |x, y| {
        let (r, g, b) = unpack_rgb(fb.get(x as usize, y as usize));
        image::Rgb([r, g, b])
    })
}

// ----------------------------- cover-fit cache ------------------------------------------

/// A photo resampled once to its cover-fit size for a given surface.
pub struct ScaledImage {
    pub key: (usize, usize),
    pub fit: CoverFit,
    pub pixels: FrameBuffer,
}

impl ScaledImage {
    pub fn new(image: &RgbImage, target_w: usize, target_h: usize) -> Self {
        let fit = CoverFit::compute(image.width() as f32, image.height() as f32, target_w as f32, target_h as f32);
        let dw = fit.draw_width.round().max(1.0) as u32;
        let dh = fit.draw_height.round().max(1.0) as u32;
        let resized = image::imageops::resize(image, dw, dh, FilterType::Triangle);
        Self { key: (target_w, target_h), fit, pixels: frame_from_rgb(&resized) }
    }

    /// Draw cropped and centred onto a surface of the cached size.
    pub fn draw(&self, dst: &mut FrameBuffer) {
        paint::blit(dst, &self.pixels, self.fit.offset_x.round() as i64, self.fit.offset_y.round() as i64);
    }
}

/// Cached cover-fit rendition of one photo, rebuilt only when the surface size changes.
#[derive(Default)]
pub struct CoverCache {
    scaled: Option<ScaledImage>,
}

impl CoverCache {
    pub fn get(&mut self, image: &RgbImage, target_w: usize, target_h: usize) -> &ScaledImage {
        let stale = self.scaled.as_ref().is_none_or(|s| s.key != (target_w, target_h));
        if stale {
            let scaled = ScaledImage::new(image, target_w, target_h);
            tracing::debug!(
                target_w,
                target_h,
                crop_x = scaled.fit.crop_x(),
                crop_y = scaled.fit.crop_y(),
                "rebuilt cover-fit cache"
            );
            self.scaled = Some(scaled);
        }
        self.scaled.get_or_insert_with(|| ScaledImage::new(image, target_w, target_h))
    }

    pub fn current(&self) -> Option<&ScaledImage> {
        self.scaled.as_ref()
    }

    pub fn invalidate(&mut self) {
        self.scaled = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_image_load_error() {
        let err = load(Path::new("/definitely/not/here.jpg")).unwrap_err();
        assert!(matches!(err, Error::ImageLoad { .. }));
    }

    #[test]
    fn missing_file_falls_back_to_placeholder() {
        let img = load_or_placeholder(ImageSlot::Cover, Path::new("/definitely/not/here.jpg"));
        assert!(img.placeholder);
        assert_eq!(img.slot, ImageSlot::Cover);
        assert_eq!(img.image.dimensions(), (PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT));
    }

    #[test]
    fn placeholders_carry_their_glyph() {
        let cover = frame_from_rgb(&placeholder(ImageSlot::Cover));
        assert_eq!(cover.get(300, 400), 0x00D4AF37);
        assert_ne!(cover.get(0, 0), cover.get(599, 799));

        let real = frame_from_rgb(&placeholder(ImageSlot::Real));
        assert_eq!(real.get(0, 0), 0x00FFF5EC);
        assert!(real.pixels.iter().any(|&p| p == 0x00C71585));
    }

    #[test]
    fn loader_delivers_both_slots() {
        let loader = ImageLoader::spawn(PathBuf::from("/nope/a.png"), PathBuf::from("/nope/b.png"));
        let mut got = Vec::new();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        while got.len() < 2 && std::time::Instant::now() < deadline {
            match loader.poll() {
                Some(img) => got.push(img.slot),
                None => std::thread::sleep(std::time::Duration::from_millis(5)),
            }
        }
        got.sort_by_key(|s| s.name());
        assert_eq!(got, vec![ImageSlot::Cover, ImageSlot::Real]);
    }

    #[test]
    fn cover_cache_is_stable_for_same_size() {
        let img = RgbImage::from_pixel(200, 100, image::Rgb([9, 9, 9]));
        let mut cache = CoverCache::default();
        let a = cache.get(&img, 50, 50).fit;
        let b = cache.get(&img, 50, 50).fit;
        assert_eq!(a, b);
        assert_eq!(cache.get(&img, 50, 50).pixels.width, 100);
        let c = cache.get(&img, 80, 40).fit;
        assert_ne!(a, c);
    }
}
