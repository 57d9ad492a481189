// Sticky hero transition driven by virtual scroll.
// Visual: scrolling down shrinks the hero about its centre and drains its colour,
// the titles slide in from both sides and the signature fades up. The page does
// not move until the transition has finished ("sticky"), and scrolling back
// up rewinds it.
// Virtual scroll lives in [0, SCROLL_DISTANCE]; `HeroStyle` derives every
// animated property from the resulting progress.

use crate::images::ScaledImage;
use crate::paint;
use crate::types::FrameBuffer;

/// Virtual scroll units for the full transition.
pub const SCROLL_DISTANCE: f32 = 800.0;
/// Touch drags move the virtual scroll twice as far as the finger.
pub const TOUCH_SENSITIVITY: f32 = 2.0;
/// The "touch to reveal" hint fades out over this long after the first interaction.
pub const HINT_FADE_MS: f64 = 500.0;

#[derive(Debug, Default)]
pub struct ScrollController {
    virtual_scroll: f32,
    progress: f32,
    last_drag_y: Option<f32>,
}

impl ScrollController {
    pub fn progress(&self) -> f32 {
        self.progress
    }

    #[cfg(test)]
    pub fn virtual_scroll(&self) -> f32 {
        self.virtual_scroll
    }

    /// Apply a wheel delta. Returns true when the delta was consumed.
    pub fn on_wheel(&mut self, delta_y: f32) -> bool {
        self.apply(delta_y)
    }

    pub fn on_drag_start(&mut self, y: f32) {
        self.last_drag_y = Some(y);
    }

    /// Finger moving up (y decreasing) scrolls down.
    pub fn on_drag_move(&mut self, y: f32) -> bool {
        let Some(last) = self.last_drag_y else { return false };
        self.last_drag_y = Some(y);
        self.apply((last - y) * TOUCH_SENSITIVITY)
    }

    pub fn on_drag_end(&mut self) {
        self.last_drag_y = None;
    }

    fn apply(&mut self, delta: f32) -> bool {
        let can_move = (delta > 0.0 && self.progress < 1.0) || (delta < 0.0 && self.progress > 0.0);
        if !can_move {
            return false;
        }
        self.virtual_scroll = (self.virtual_scroll + delta).clamp(0.0, SCROLL_DISTANCE);
        self.progress = self.virtual_scroll / SCROLL_DISTANCE;
        true
    }
}

fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t
}

/// Every scroll-driven property at one progress value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeroStyle {
    pub progress: f32,
    /// Reveal surface scale, 1.0 -> 0.6.
    pub hero_scale: f32,
    /// Percent, 0 -> 85.
    pub grayscale: f32,
    pub canvas_opacity: f32,
    pub signature_opacity: f32,
    pub signature_scale: f32,
    /// Percent of the title's own width.
    pub title_top_translate: f32,
    pub title_bottom_translate: f32,
    pub title_opacity: f32,
}

impl HeroStyle {
    pub fn at(progress: f32) -> Self {
        let p = progress.clamp(0.0, 1.0);
        Self {
            progress: p,
            hero_scale: lerp(1.0, 0.6, p),
            grayscale: lerp(0.0, 85.0, p),
            canvas_opacity: 1.0 - p,
            signature_opacity: lerp(0.0, 1.0, p),
            signature_scale: lerp(0.8, 1.0, p),
            title_top_translate: lerp(-120.0, 0.0, p),
            title_bottom_translate: lerp(120.0, 0.0, p),
            title_opacity: p,
        }
    }

    /// Where a point on the displayed frame lands on the unscaled reveal surface.
    /// `width`/`height` are the frame size in the same units as `x`/`y`.
    #[inline]
    pub fn unscale(&self, x: f32, y: f32, width: f32, height: f32) -> (f32, f32) {
        let s = self.hero_scale.max(f32::EPSILON);
        let (cx, cy) = (width / 2.0, height / 2.0);
        (cx + (x - cx) / s, cy + (y - cy) / s)
    }
}

/// Opacity of the instruction hint: fully shown until the first interaction,
/// then a linear fade over [`HINT_FADE_MS`].
pub fn hint_opacity(hidden_at_ms: Option<f64>, now_ms: f64) -> f32 {
    match hidden_at_ms {
        None => 1.0,
        Some(at) => (1.0 - (now_ms - at) / HINT_FADE_MS).clamp(0.0, 1.0) as f32,
    }
}

/// Text shown around the hero as the transition plays.
#[derive(Clone, Debug)]
pub struct Overlay {
    pub title_top: String,
    pub title_bottom: String,
    pub signature: String,
    /// Hint shown over the untouched hero.
    pub instruction: String,
}

const TITLE_COLOR: u32 = 0x00_F4_E4_C1;
const SIGNATURE_COLOR: u32 = 0x00_3C_B3_71;
const BACKDROP_FILL: u32 = 0x00_FF_F5_EC;
const HINT_COLOR: u32 = 0x00_FF_FF_FF;

/// Build the displayed frame: grayscaled backdrop photo, the reveal surface
/// scaled about its centre and faded, the instruction hint at `hint` opacity,
/// then the titles and signature.
pub fn compose(
    out: &mut FrameBuffer,
    surface: &FrameBuffer,
    backdrop: Option<&ScaledImage>,
    style: &HeroStyle,
    overlay: &Overlay,
    quality: f32,
    hint: f32,
) {
    out.fill(BACKDROP_FILL);
    if let Some(bg) = backdrop {
        bg.draw(out);
    }
    let gray = style.grayscale / 100.0;
    if gray > 0.0 {
        for px in &mut out.pixels {
            *px = paint::grayscale(*px, gray);
        }
    }

    if style.canvas_opacity > 0.0 && !surface.is_empty() {
        let (ow, oh) = (out.width as f32, out.height as f32);
        for y in 0..out.height {
            for x in 0..out.width {
                let (sx, sy) = style.unscale(x as f32 + 0.5, y as f32 + 0.5, ow, oh);
                if sx < 0.0 || sy < 0.0 || sx >= surface.width as f32 || sy >= surface.height as f32 {
                    continue;
                }
                let px = paint::grayscale(surface.get(sx as usize, sy as usize), gray);
                let idx = y * out.width + x;
                out.pixels[idx] = if style.canvas_opacity >= 1.0 {
                    px
                } else {
                    paint::mix_srgb(out.pixels[idx], px, style.canvas_opacity)
                };
            }
        }
    }

    let hint_alpha = hint * style.canvas_opacity;
    if hint_alpha > 0.0 && !overlay.instruction.is_empty() {
        let scale = (3.0 * quality).round().max(1.0) as i32;
        let w = crate::draw::text_width(&overlay.instruction, scale);
        let x = (out.width as i32 - w) / 2;
        let y = out.height as i32 * 2 / 3;
        crate::draw::draw_text(out, x, y, &overlay.instruction, HINT_COLOR, scale, hint_alpha);
    }

    if style.title_opacity > 0.0 {
        let scale = (3.0 * quality).round().max(1.0) as i32;
        draw_sliding_title(out, &overlay.title_top, out.height as i32 / 5, style.title_top_translate, scale, style.title_opacity);
        draw_sliding_title(out, &overlay.title_bottom, out.height as i32 * 4 / 5, style.title_bottom_translate, scale, style.title_opacity);
    }

    if style.signature_opacity > 0.0 {
        let scale = (5.0 * quality * style.signature_scale).round().max(1.0) as i32;
        let w = crate::draw::text_width(&overlay.signature, scale);
        let x = (out.width as i32 - w) / 2;
        let y = out.height as i32 / 2 - 7 * scale / 2;
        crate::draw::draw_text(out, x, y, &overlay.signature, SIGNATURE_COLOR, scale, style.signature_opacity);
    }
}

fn draw_sliding_title(out: &mut FrameBuffer, text: &str, y: i32, translate_pct: f32, scale: i32, alpha: f32) {
    let w = crate::draw::text_width(text, scale);
    let x = (out.width as i32 - w) / 2 + (w as f32 * translate_pct / 100.0).round() as i32;
    crate::draw::draw_text(out, x, y, text, TITLE_COLOR, scale, alpha);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halfway_values_are_exact_lerps() {
        let s = HeroStyle::at(0.5);
        assert!((s.hero_scale - 0.8).abs() < 1e-6);
        assert!((s.grayscale - 42.5).abs() < 1e-6);
        assert!((s.canvas_opacity - 0.5).abs() < 1e-6);
        assert!((s.signature_scale - 0.9).abs() < 1e-6);
        assert!((s.title_top_translate + 60.0).abs() < 1e-6);
        assert!((s.title_bottom_translate - 60.0).abs() < 1e-6);
    }

    #[test]
    fn endpoints_and_clamping() {
        let start = HeroStyle::at(-3.0);
        assert_eq!(start, HeroStyle::at(0.0));
        assert_eq!((start.hero_scale, start.grayscale, start.canvas_opacity), (1.0, 0.0, 1.0));
        assert_eq!(start.title_top_translate, -120.0);

        let end = HeroStyle::at(7.0);
        assert_eq!(end, HeroStyle::at(1.0));
        assert!((end.hero_scale - 0.6).abs() < 1e-6);
        assert_eq!((end.grayscale, end.canvas_opacity, end.signature_opacity), (85.0, 0.0, 1.0));
        assert_eq!(end.title_bottom_translate, 0.0);
    }

    #[test]
    fn wheel_sticks_at_both_ends() {
        let mut sc = ScrollController::default();
        assert!(!sc.on_wheel(-100.0), "cannot scroll above the start");
        assert!(sc.on_wheel(400.0));
        assert_eq!(sc.progress(), 0.5);
        assert!(sc.on_wheel(10_000.0));
        assert_eq!(sc.virtual_scroll(), SCROLL_DISTANCE);
        assert_eq!(sc.progress(), 1.0);
        assert!(!sc.on_wheel(50.0), "finished: page scroll takes over");
        assert!(sc.on_wheel(-200.0));
        assert_eq!(sc.progress(), 0.75);
    }

    #[test]
    fn drag_moves_twice_the_finger_distance() {
        let mut sc = ScrollController::default();
        assert!(!sc.on_drag_move(10.0), "no drag in progress");
        sc.on_drag_start(300.0);
        assert!(sc.on_drag_move(200.0));
        assert_eq!(sc.virtual_scroll(), 200.0);
        sc.on_drag_end();
        assert!(!sc.on_drag_move(0.0));
    }

    #[test]
    fn compose_hides_surface_once_finished() {
        let mut surface = FrameBuffer::new(8, 8);
        surface.fill(0x00FF0000);
        let mut out = FrameBuffer::new(8, 8);

        compose(&mut out, &surface, None, &HeroStyle::at(0.0), &blank_overlay(), 1.0, 0.0);
        assert!(out.pixels.iter().all(|&p| p == 0x00FF0000));

        compose(&mut out, &surface, None, &HeroStyle::at(1.0), &blank_overlay(), 1.0, 0.0);
        assert!(out.pixels.iter().all(|&p| p != 0x00FF0000));
    }

    fn blank_overlay() -> Overlay {
        Overlay { title_top: String::new(), title_bottom: String::new(), signature: String::new(), instruction: String::new() }
    }

    #[test]
    fn unscale_maps_display_points_back_onto_the_surface() {
        let half = HeroStyle::at(0.5);
        let (x, y) = half.unscale(100.0, 100.0, 1000.0, 1000.0);
        assert!(x.abs() < 1e-3 && y.abs() < 1e-3, "({x}, {y})");
        assert_eq!(half.unscale(500.0, 500.0, 1000.0, 1000.0), (500.0, 500.0));
        assert_eq!(HeroStyle::at(0.0).unscale(123.0, 7.0, 1000.0, 1000.0), (123.0, 7.0));
    }

    #[test]
    fn composed_pixel_under_a_point_comes_from_its_unscaled_position() {
        let mut surface = FrameBuffer::new(100, 100);
        surface.fill(0x00_00_00_FF);
        for y in 28..32 {
            for x in 28..32 {
                surface.pixels[y * 100 + x] = 0x00_FF_00_00;
            }
        }
        let style = HeroStyle { hero_scale: 0.5, grayscale: 0.0, canvas_opacity: 1.0, ..HeroStyle::at(0.0) };
        let mut out = FrameBuffer::new(100, 100);
        compose(&mut out, &surface, None, &style, &blank_overlay(), 1.0, 0.0);

        let marks: Vec<(usize, usize)> = (0..100)
            .flat_map(|y| (0..100).map(move |x| (x, y)))
            .filter(|&(x, y)| out.get(x, y) == 0x00_FF_00_00)
            .collect();
        assert!(!marks.is_empty(), "marker must survive the shrink");
        for (x, y) in marks {
            let (sx, sy) = style.unscale(x as f32 + 0.5, y as f32 + 0.5, 100.0, 100.0);
            assert!((28.0..32.0).contains(&sx) && (28.0..32.0).contains(&sy), "({x},{y}) -> ({sx},{sy})");
        }
    }

    #[test]
    fn hint_fades_after_first_interaction() {
        assert_eq!(hint_opacity(None, 10_000.0), 1.0);
        assert_eq!(hint_opacity(Some(1000.0), 1000.0), 1.0);
        assert!((hint_opacity(Some(1000.0), 1250.0) - 0.5).abs() < 1e-6);
        assert_eq!(hint_opacity(Some(1000.0), 1600.0), 0.0);
    }

    #[test]
    fn hint_is_drawn_until_faded() {
        let surface = FrameBuffer::new(60, 60);
        let overlay = Overlay { instruction: "TOUCH".into(), ..blank_overlay() };
        let mut out = FrameBuffer::new(60, 60);

        compose(&mut out, &surface, None, &HeroStyle::at(0.0), &overlay, 1.0, 1.0);
        assert!(out.pixels.iter().any(|&p| p == HINT_COLOR));

        compose(&mut out, &surface, None, &HeroStyle::at(0.0), &overlay, 1.0, 0.0);
        assert!(out.pixels.iter().all(|&p| p == 0));
    }
}
