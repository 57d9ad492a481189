// FX: the transient things the reveal is made of.
// - Trail points: soft holes that follow the pointer and fade after it moves on.
// - Ripples: a one-shot expanding ring hole at the start of each interaction.
// - Sparkles: small rotating gold/white glints thrown out with every ripple.
// Positions are logical pixels; `render_*` scale by the surface quality.

use std::collections::VecDeque;
use std::f32::consts::{PI, TAU};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::config::Profile;
use crate::paint::{self, Blend, RadialGradient, stop};
use crate::types::{FrameBuffer, Rgba};

/// Entities at or below this alpha are dropped.
pub const PURGE_ALPHA: f32 = 0.01;

/// Sparkle motion is tuned per 60 Hz frame; other rates are scaled to match.
const REFERENCE_FRAME_MS: f32 = 1000.0 / 60.0;

pub const GOLD: Rgba = Rgba::hex(0xD4AF37);
pub const WHITE: Rgba = Rgba::hex(0xFFFFFF);

// ----------------------------- trail ----------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailPoint {
    pub x: f32,
    pub y: f32,
    pub alpha: f32,
    pub radius: f32,
    pub age: f32, // ms
}

/// `max(0, 1 - (age / fade * 2)^exponent)`.
pub fn trail_alpha(age_ms: f32, fade_ms: f32, exponent: f32) -> f32 {
    let progress = age_ms / fade_ms;
    (1.0 - (progress * 2.0).powf(exponent)).max(0.0)
}

/// Oldest-first ring of trail points with a hard capacity.
pub struct Trail {
    points: VecDeque<TrailPoint>,
    capacity: usize,
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        Self { points: VecDeque::with_capacity(capacity + 1), capacity }
    }

    /// Append; the oldest point is evicted once over capacity.
    pub fn push(&mut self, point: TrailPoint) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn newest(&self) -> Option<&TrailPoint> {
        self.points.back()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    /// Age every point by `dt_ms`, recompute alpha/radius and drop the faded ones.
    /// With `hold_newest` the newest point stays fully open (stable hover).
    pub fn advance(&mut self, dt_ms: f32, hold_newest: bool, profile: &Profile) {
        let newest = self.points.len().saturating_sub(1);
        for (i, p) in self.points.iter_mut().enumerate() {
            p.age += dt_ms;
            if hold_newest && i == newest {
                p.alpha = 1.0;
                p.radius = profile.base_radius;
            } else {
                p.alpha = trail_alpha(p.age, profile.trail_fade_ms, profile.trail_fade_exponent);
                // holes widen slightly as they fade
                p.radius = profile.base_radius + (profile.max_radius - profile.base_radius) * (1.0 - p.alpha);
            }
        }
        self.points.retain(|p| p.alpha > PURGE_ALPHA);
    }
}

// ----------------------------- ripples --------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ripple {
    pub x: f32,
    pub y: f32,
    pub start_radius: f32,
    pub end_radius: f32,
    pub radius: f32,
    pub alpha: f32,
    pub age: f32,
    pub duration: f32,
}

impl Ripple {
    pub fn new(x: f32, y: f32, profile: &Profile) -> Self {
        Self {
            x,
            y,
            start_radius: profile.ripple_start_radius,
            end_radius: profile.ripple_end_radius,
            radius: profile.ripple_start_radius,
            alpha: 1.0,
            age: 0.0,
            duration: profile.ripple_duration_ms,
        }
    }

    pub fn advance(&mut self, dt_ms: f32) {
        self.age += dt_ms;
        let progress = self.age / self.duration;
        self.radius = self.start_radius + (self.end_radius - self.start_radius) * progress;
        self.alpha = (1.0 - progress.powf(0.8)).max(0.0);
    }

    pub fn alive(&self) -> bool {
        self.alpha > PURGE_ALPHA
    }
}

// ----------------------------- sparkles -------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sparkle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub alpha: f32,
    pub decay: f32,
    pub rotation: f32,
    pub rot_speed: f32,
    pub color: Rgba,
}

impl Sparkle {
    /// Advance by `steps` reference frames.
    fn advance(&mut self, steps: f32) {
        self.x += self.vx * steps;
        self.y += self.vy * steps;
        self.alpha -= self.decay * steps;
        self.rotation += self.rot_speed * steps;
    }

    /// Diamond body plus two thin cross flares, centred at the origin, in local units.
    fn shapes(&self) -> [[(f32, f32); 4]; 3] {
        let s = self.size;
        [
            [(0.0, -s), (s * 0.3, 0.0), (0.0, s), (-s * 0.3, 0.0)],
            [(0.0, -s * 1.5), (0.5, 0.0), (0.0, s * 1.5), (-0.5, 0.0)],
            [(-s * 1.5, 0.0), (0.0, 0.5), (s * 1.5, 0.0), (0.0, -0.5)],
        ]
    }
}

// ----------------------------- container ------------------------------------------------

/// Everything that glows or punches holes. Visual: empty = plain cover image.
pub struct Effects {
    rng: StdRng,
    pub trail: Trail,
    pub ripples: Vec<Ripple>,
    pub sparkles: Vec<Sparkle>,
}

impl Effects {
    pub fn new(profile: &Profile) -> Self {
        Self::with_rng(profile, StdRng::from_os_rng())
    }

    /// Deterministic sparkles, for tests.
    #[cfg(test)]
    pub fn seeded(profile: &Profile, seed: u64) -> Self {
        Self::with_rng(profile, StdRng::seed_from_u64(seed))
    }

    fn with_rng(profile: &Profile, rng: StdRng) -> Self {
        Self {
            rng,
            trail: Trail::new(profile.max_trail_points),
            ripples: Vec::new(),
            sparkles: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trail.is_empty() && self.ripples.is_empty() && self.sparkles.is_empty()
    }

    /// Any hole to cut this frame?
    pub fn has_holes(&self) -> bool {
        !self.trail.is_empty() || !self.ripples.is_empty()
    }

    pub fn clear(&mut self) {
        self.trail.clear();
        self.ripples.clear();
        self.sparkles.clear();
    }

    /// Splash at an interaction start: one ripple plus a burst of sparkles.
    pub fn spawn_ripple(&mut self, x: f32, y: f32, profile: &Profile) {
        self.ripples.push(Ripple::new(x, y, profile));
        self.spawn_sparkles(x, y);
    }

    /// 3–5 sparkles flying outward from (x, y); mostly gold, some white.
    pub fn spawn_sparkles(&mut self, x: f32, y: f32) {
        let count = self.rng.random_range(3..=5);
        for _ in 0..count {
            let angle = self.rng.random_range(0.0..TAU);
            let speed = self.rng.random_range(2.0..6.0);
            self.sparkles.push(Sparkle {
                x,
                y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                size: self.rng.random_range(2.0..6.0),
                alpha: 1.0,
                decay: self.rng.random_range(0.02..0.05),
                rotation: self.rng.random_range(0.0..PI),
                rot_speed: self.rng.random_range(-0.1..0.1),
                color: if self.rng.random::<f32>() > 0.3 { GOLD } else { WHITE },
            });
        }
    }

    /// Age trail, ripples and sparkles; faded entries are compacted away in place.
    pub fn advance(&mut self, dt_ms: f32, hold_newest: bool, profile: &Profile) {
        self.trail.advance(dt_ms, hold_newest, profile);

        for s in &mut self.sparkles {
            s.advance(dt_ms / REFERENCE_FRAME_MS);
        }
        self.sparkles.retain(|s| s.alpha > PURGE_ALPHA);

        for r in &mut self.ripples {
            r.advance(dt_ms);
        }
        self.ripples.retain(Ripple::alive);
    }

    /// Warm gold halo around every trail point, added on top of the composite.
    pub fn render_glow(&self, fb: &mut FrameBuffer, quality: f32) {
        for p in self.trail.iter() {
            let a = p.alpha;
            let stops = [
                stop(0.0, Rgba::new(255, 215, 0, 0.0)),
                stop(0.4, Rgba::new(255, 215, 0, a * 0.15)),
                stop(0.7, Rgba::new(212, 175, 55, a * 0.1)),
                stop(1.0, Rgba::new(255, 255, 255, 0.0)),
            ];
            let g = RadialGradient {
                cx: p.x * quality,
                cy: p.y * quality,
                inner: p.radius * 0.7 * quality,
                outer: p.radius * 1.4 * quality,
                stops: &stops,
            };
            paint::add_radial(fb, &g);
        }
    }

    /// Rotated sparkle glyphs, additive.
    pub fn render_sparkles(&self, fb: &mut FrameBuffer, quality: f32) {
        for s in &self.sparkles {
            let (sin, cos) = s.rotation.sin_cos();
            let color = s.color.with_alpha(s.alpha.clamp(0.0, 1.0));
            for shape in s.shapes() {
                let pts = shape.map(|(lx, ly)| {
                    let rx = lx * cos - ly * sin;
                    let ry = lx * sin + ly * cos;
                    ((s.x + rx) * quality, (s.y + ry) * quality)
                });
                paint::fill_convex_polygon(fb, &pts, color, Blend::Add);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceClass;

    fn point(x: f32, y: f32, profile: &Profile) -> TrailPoint {
        TrailPoint { x, y, alpha: 1.0, radius: profile.base_radius, age: 0.0 }
    }

    #[test]
    fn trail_evicts_oldest_over_capacity() {
        let profile = Profile::for_class(DeviceClass::Mobile);
        let mut trail = Trail::new(3);
        for i in 0..5 {
            trail.push(point(i as f32, 0.0, &profile));
        }
        assert_eq!(trail.len(), 3);
        let xs: Vec<f32> = trail.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
        assert_eq!(trail.newest().map(|p| p.x), Some(4.0));
    }

    #[test]
    fn trail_alpha_fades_monotonically_and_is_purged_by_half_fade() {
        let profile = Profile::default();
        let mut trail = Trail::new(8);
        trail.push(point(0.0, 0.0, &profile));

        let mut last = 1.0;
        for _ in 0..77 {
            trail.advance(16.0, false, &profile);
            let Some(p) = trail.newest() else { break };
            assert!(p.alpha <= last);
            assert!(p.radius >= profile.base_radius && p.radius <= profile.max_radius);
            last = p.alpha;
        }
        // 77 * 16 = 1232 ms: still barely visible
        assert_eq!(trail.len(), 1);
        trail.advance(18.0, false, &profile);
        // 1250 ms = fade/2 where alpha hits exactly 0
        assert!(trail.is_empty());
    }

    #[test]
    fn alpha_formula_boundaries() {
        assert_eq!(trail_alpha(0.0, 2500.0, 1.5), 1.0);
        assert_eq!(trail_alpha(1250.0, 2500.0, 1.5), 0.0);
        assert_eq!(trail_alpha(5000.0, 2500.0, 1.5), 0.0);
        assert!(trail_alpha(1241.0, 2500.0, 1.5) > PURGE_ALPHA);
    }

    #[test]
    fn held_newest_point_stays_open() {
        let profile = Profile::default();
        let mut trail = Trail::new(8);
        trail.push(point(0.0, 0.0, &profile));
        trail.push(point(20.0, 0.0, &profile));
        for _ in 0..200 {
            trail.advance(16.0, true, &profile);
        }
        assert_eq!(trail.len(), 1);
        let p = trail.newest().unwrap();
        assert_eq!((p.x, p.alpha, p.radius), (20.0, 1.0, profile.base_radius));
    }

    #[test]
    fn ripple_radius_and_alpha_over_its_life() {
        for class in [DeviceClass::Mobile, DeviceClass::Desktop] {
            let profile = Profile::for_class(class);
            let mut r = Ripple::new(5.0, 5.0, &profile);
            r.advance(0.0);
            assert_eq!(r.radius, 20.0);
            assert_eq!(r.alpha, 1.0);

            r.advance(400.0);
            assert!(r.radius > 20.0 && r.radius < profile.ripple_end_radius);

            r.advance(400.0);
            assert!((r.radius - profile.ripple_end_radius).abs() < 1e-3);
            assert_eq!(r.alpha, 0.0);
            assert!(!r.alive());
        }
    }

    #[test]
    fn sparkle_burst_is_three_to_five() {
        let profile = Profile::default();
        for seed in 0..32 {
            let mut fx = Effects::seeded(&profile, seed);
            fx.spawn_ripple(100.0, 100.0, &profile);
            assert_eq!(fx.ripples.len(), 1);
            assert!((3..=5).contains(&fx.sparkles.len()));
            for s in &fx.sparkles {
                assert!(s.color == GOLD || s.color == WHITE);
                assert!(s.decay >= 0.02 && s.decay < 0.05);
            }
        }
    }

    #[test]
    fn sparkles_fade_out_within_a_second() {
        let profile = Profile::default();
        let mut fx = Effects::seeded(&profile, 7);
        fx.spawn_sparkles(0.0, 0.0);
        // slowest decay 0.02/frame -> gone after 50 frames
        for _ in 0..60 {
            fx.advance(REFERENCE_FRAME_MS, false, &profile);
        }
        assert!(fx.sparkles.is_empty());
        assert!(fx.is_empty());
    }

    #[test]
    fn glow_and_sparkles_only_add_light() {
        let profile = Profile::default();
        let mut fx = Effects::seeded(&profile, 3);
        fx.trail.push(point(50.0, 50.0, &profile));
        fx.spawn_sparkles(50.0, 50.0);

        let mut fb = FrameBuffer::new(400, 400);
        fb.fill(0x00202020);
        let before = fb.clone();
        fx.render_glow(&mut fb, 1.0);
        fx.render_sparkles(&mut fb, 1.0);

        let mut brighter = 0;
        for (a, b) in before.pixels.iter().zip(&fb.pixels) {
            let (ar, ag, ab) = crate::types::unpack_rgb(*a);
            let (br, bg, bb) = crate::types::unpack_rgb(*b);
            assert!(br >= ar && bg >= ag && bb >= ab);
            if b != a {
                brighter += 1;
            }
        }
        assert!(brighter > 0);
    }
}
