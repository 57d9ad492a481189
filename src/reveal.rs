// The reveal renderer.
// Visual: the cover image sits over the real photo. Pointer or touch input leaves
// a trail of soft holes (plus a ripple and a sparkle burst at every interaction
// start) through which the real photo shows; a gold glow rims the trail.
// The host drives it with `handle` for input and `frame` once per refresh.
// The loop idles once nothing is animating and resumes on the next qualifying input.

use image::RgbImage;

use crate::config::Profile;
use crate::error::Result;
use crate::fx::{Effects, TrailPoint};
use crate::gamma::GammaLut;
use crate::images::{CoverCache, ImageSlot, LoadedImage, ScaledImage};
use crate::input::InputEvent;
use crate::paint::{self, RadialGradient, stop};
use crate::types::{CoverFit, FrameBuffer, Mask, Rgba};

/// Black at `a`; only the alpha matters for erase passes.
const fn ink(a: f32) -> Rgba {
    Rgba::new(0, 0, 0, a)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Images still loading, or the container had no size.
    Inactive,
    Running,
    /// Nothing to animate; resumes on the next qualifying input.
    Idle,
    /// Torn down; every call is a no-op from here on.
    Cancelled,
}

pub struct RevealRenderer {
    profile: Profile,
    quality: f32,
    fx: Effects,
    lut: GammaLut,

    cover: Option<RgbImage>,
    real: Option<RgbImage>,
    images_loaded: usize,
    cover_cache: CoverCache,
    real_cache: CoverCache,

    /// Logical container size.
    container: (usize, usize),
    surface: FrameBuffer,
    offscreen: FrameBuffer,
    mask: Mask,

    current: Option<(f32, f32)>,
    target: Option<(f32, f32)>,
    revealing: bool,
    /// When the first interaction hid the instruction hint.
    hint_hidden_at_ms: Option<f64>,

    state: LoopState,
    last_frame_ms: Option<f64>,
    dirty: bool,
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

impl RevealRenderer {
    pub fn new(profile: Profile, device_pixel_ratio: f32) -> Self {
        let fx = Effects::new(&profile);
        Self::with_effects(profile, device_pixel_ratio, fx)
    }

    pub fn with_effects(profile: Profile, device_pixel_ratio: f32, fx: Effects) -> Self {
        let quality = profile.quality(device_pixel_ratio);
        Self {
            profile,
            quality,
            fx,
            lut: GammaLut::new(),
            cover: None,
            real: None,
            images_loaded: 0,
            cover_cache: CoverCache::default(),
            real_cache: CoverCache::default(),
            container: (0, 0),
            surface: FrameBuffer::new(0, 0),
            offscreen: FrameBuffer::new(0, 0),
            mask: Mask::new(0, 0),
            current: None,
            target: None,
            revealing: false,
            hint_hidden_at_ms: None,
            state: LoopState::Inactive,
            last_frame_ms: None,
            dirty: false,
        }
    }

    // ----------------------------- lifecycle ----------------------------------------------

    /// Fill an image slot. Once both slots hold an image (real or placeholder)
    /// the surface is sized to `container` and the loop starts.
    /// Returns true when this call completed initialization.
    pub fn install_image(&mut self, loaded: LoadedImage, container: (usize, usize)) -> Result<bool> {
        if self.state == LoopState::Cancelled {
            return Ok(false);
        }
        let slot = match loaded.slot {
            ImageSlot::Cover => &mut self.cover,
            ImageSlot::Real => &mut self.real,
        };
        if slot.replace(loaded.image).is_none() {
            self.images_loaded += 1;
        }
        tracing::debug!(slot = loaded.slot.name(), placeholder = loaded.placeholder, loaded = self.images_loaded, "image slot filled");

        if self.images_loaded == 2 && self.state == LoopState::Inactive {
            self.initialize(container.0, container.1)?;
            return Ok(self.state != LoopState::Inactive);
        }
        Ok(false)
    }

    /// Size the surface and draw the untouched cover once.
    /// A zero-sized container leaves the renderer inactive.
    #[tracing::instrument(skip(self))]
    pub fn initialize(&mut self, width: usize, height: usize) -> Result<()> {
        if self.images_loaded < 2 || self.state == LoopState::Cancelled {
            return Ok(());
        }
        if width == 0 || height == 0 {
            tracing::debug!("container has no size; reveal stays inactive");
            return Ok(());
        }
        self.setup_surface(width, height);
        self.draw()?;
        self.state = LoopState::Running;
        self.last_frame_ms = None;
        self.dirty = true;
        tracing::info!(
            width,
            height,
            quality = self.quality,
            surface_w = self.surface.width,
            surface_h = self.surface.height,
            "reveal ready"
        );
        Ok(())
    }

    /// Stop the loop for good.
    pub fn destroy(&mut self) {
        if self.state != LoopState::Cancelled {
            tracing::debug!("reveal loop cancelled");
        }
        self.state = LoopState::Cancelled;
        self.dirty = false;
        self.fx.clear();
    }

    fn setup_surface(&mut self, width: usize, height: usize) {
        self.container = (width, height);
        let pw = ((width as f32) * self.quality).round().max(1.0) as usize;
        let ph = ((height as f32) * self.quality).round().max(1.0) as usize;
        if (pw, ph) != (self.surface.width, self.surface.height) {
            self.surface = FrameBuffer::new(pw, ph);
            self.offscreen = FrameBuffer::new(pw, ph);
            self.mask = Mask::new(pw, ph);
        }
        self.cover_cache.invalidate();
        self.real_cache.invalidate();
    }

    /// Debounced viewport resize. Active holes and glints belong to the old
    /// layout, so trail, ripples and sparkles are all dropped.
    #[tracing::instrument(skip(self))]
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        if self.images_loaded < 2 || self.state == LoopState::Cancelled || width == 0 || height == 0 {
            return Ok(());
        }
        if self.state == LoopState::Inactive {
            return self.initialize(width, height);
        }
        self.setup_surface(width, height);
        self.fx.clear();
        self.draw()?;
        self.dirty = true;
        Ok(())
    }

    // ----------------------------- input ----------------------------------------------------

    pub fn handle(&mut self, event: InputEvent, now_ms: f64) {
        if self.state == LoopState::Cancelled {
            return;
        }
        match event {
            InputEvent::PointerEnter { x, y } | InputEvent::TouchStart { x, y, .. } => {
                self.start_reveal(now_ms);
                self.target = Some((x, y));
                self.fx.spawn_ripple(x, y, &self.profile);
            }
            InputEvent::PointerMove { x, y } => {
                if !self.revealing {
                    self.start_reveal(now_ms);
                    self.fx.spawn_ripple(x, y, &self.profile);
                }
                self.target = Some((x, y));
            }
            InputEvent::TouchMove { x, y, .. } => {
                if self.revealing {
                    self.target = Some((x, y));
                }
            }
            InputEvent::PointerLeave | InputEvent::TouchEnd | InputEvent::TouchCancel => {
                // live entries fade out on their own
                self.revealing = false;
                self.target = None;
            }
            InputEvent::Wheel { .. }
            | InputEvent::ScrollDragStart { .. }
            | InputEvent::ScrollDragMove { .. }
            | InputEvent::ScrollDragEnd => {}
        }
    }

    fn start_reveal(&mut self, now_ms: f64) {
        self.revealing = true;
        if self.hint_hidden_at_ms.is_none() {
            self.hint_hidden_at_ms = Some(now_ms);
            tracing::debug!(now_ms, "instruction hint hidden");
        }
        if self.state == LoopState::Idle {
            self.state = LoopState::Running;
            self.last_frame_ms = Some(now_ms);
            tracing::trace!("reveal loop resumed");
        }
    }

    // ----------------------------- frame ----------------------------------------------------

    /// One display refresh. Returns true when the surface changed and should be presented.
    pub fn frame(&mut self, now_ms: f64) -> Result<bool> {
        let dirty = std::mem::take(&mut self.dirty);
        if self.state != LoopState::Running {
            return Ok(dirty);
        }
        if !self.revealing && self.fx.is_empty() {
            self.state = LoopState::Idle;
            tracing::trace!("reveal loop idle");
            return Ok(dirty);
        }

        let dt = self.last_frame_ms.map_or(0.0, |last| (now_ms - last).max(0.0)) as f32;
        self.last_frame_ms = Some(now_ms);

        self.update(dt);
        self.draw()?;
        Ok(true)
    }

    fn update(&mut self, dt_ms: f32) {
        let p = &self.profile;

        // 1) ease toward the pointer, snapping when close enough to stop jitter
        if let Some(t) = self.target {
            self.current = Some(match self.current {
                None => t,
                Some(c) if distance(c, t) < p.snap_distance => t,
                Some(c) => (c.0 + (t.0 - c.0) * p.ease, c.1 + (t.1 - c.1) * p.ease),
            });
        }

        // 2) drop a new trail point once the eased pointer has moved far enough
        if self.revealing {
            if let Some(c) = self.current {
                let far_enough = self.fx.trail.newest().is_none_or(|n| distance(c, (n.x, n.y)) > p.trail_spacing);
                if far_enough {
                    self.fx.trail.push(TrailPoint { x: c.0, y: c.1, alpha: 1.0, radius: p.base_radius, age: 0.0 });
                }
            }
        }

        // 3-5) age trail, ripples and sparkles
        let hovering = match (self.revealing, self.current, self.target) {
            (true, Some(c), Some(t)) => distance(c, t) < p.hover_tolerance,
            _ => false,
        };
        self.fx.advance(dt_ms, hovering, p);
    }

    fn draw(&mut self) -> Result<()> {
        let (Some(cover), Some(real)) = (self.cover.as_ref(), self.real.as_ref()) else {
            return Ok(());
        };
        let (w, h) = (self.surface.width, self.surface.height);
        let q = self.quality;

        // 1) real photo always goes down first
        self.surface.fill(0);
        self.real_cache.get(real, w, h).draw(&mut self.surface);

        if !self.fx.has_holes() {
            // 2) untouched: the cover hides the photo entirely
            self.cover_cache.get(cover, w, h).draw(&mut self.surface);
        } else {
            // 3) cover with holes cut where ripples and trail points are
            self.offscreen.fill(0);
            self.cover_cache.get(cover, w, h).draw(&mut self.offscreen);
            self.mask.reset_opaque();

            for r in &self.fx.ripples {
                let stops = [stop(0.0, ink(0.0)), stop(0.5, ink(r.alpha * 0.3)), stop(1.0, ink(0.0))];
                let g = RadialGradient {
                    cx: r.x * q,
                    cy: r.y * q,
                    inner: r.radius * 0.8 * q,
                    outer: r.radius * q,
                    stops: &stops,
                };
                paint::erase_radial(&mut self.mask, &g);
            }
            for p in self.fx.trail.iter() {
                let stops = [stop(0.0, ink(p.alpha)), stop(0.5, ink(p.alpha * 0.5)), stop(1.0, ink(0.0))];
                let g = RadialGradient {
                    cx: p.x * q,
                    cy: p.y * q,
                    inner: 0.0,
                    outer: p.radius * 1.5 * q,
                    stops: &stops,
                };
                paint::erase_radial(&mut self.mask, &g);
            }

            paint::blend_masked(&mut self.surface, &self.offscreen, &self.mask, &self.lut)?;

            // 4) warm glow around the trail
            self.fx.render_glow(&mut self.surface, q);
        }

        self.fx.render_sparkles(&mut self.surface, q);
        Ok(())
    }

    // ----------------------------- accessors ------------------------------------------------

    pub fn surface(&self) -> &FrameBuffer {
        &self.surface
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    #[cfg(test)]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, LoopState::Running | LoopState::Idle)
    }

    #[cfg(test)]
    pub fn is_revealing(&self) -> bool {
        self.revealing
    }

    pub fn container(&self) -> (usize, usize) {
        self.container
    }

    #[cfg(test)]
    pub fn effects(&self) -> &Effects {
        &self.fx
    }

    #[cfg(test)]
    pub fn pointer(&self) -> Option<(f32, f32)> {
        self.current
    }

    /// First-interaction time; the host fades the instruction hint from here.
    pub fn hint_hidden_at(&self) -> Option<f64> {
        self.hint_hidden_at_ms
    }

    /// Cached cover-fit placement of the cover image on the current surface.
    pub fn cover_geometry(&self) -> Option<CoverFit> {
        self.cover_cache.current().map(|s| s.fit)
    }

    /// The real photo fitted to the current surface, for the host's backdrop.
    pub fn backdrop(&self) -> Option<&ScaledImage> {
        self.real_cache.current()
    }
}
