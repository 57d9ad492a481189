// What you SEE:
// • The artistic cover image fills the window; the real photo hides beneath it.
// • Move the mouse over it (desktop) or press-and-drag (mobile profile): soft holes
//   follow you with a gold glow, and every new touch splashes a ripple + sparkles.
// • A "touch to reveal" hint sits over the untouched hero and fades on first contact.
// • Mouse wheel (or right-drag) plays the sticky hero transition: the photo shrinks
//   and goes gray while the titles slide in and the signature fades up.
// • ESC quits.

mod config;
mod draw;
mod error;
mod fx;
mod gamma;
mod images;
mod input;
mod paint;
mod reveal;
mod scroll;
mod types;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::{DeviceClass, Profile};
use draw::{Debounce, Drawer};
use images::ImageLoader;
use input::{GestureGuard, InputEvent, PointerTracker};
use reveal::RevealRenderer;
use scroll::{HeroStyle, Overlay, ScrollController};
use types::FrameBuffer;

#[derive(Parser, Debug)]
#[command(name = "hero-reveal", version, about = "Touch-to-reveal hero image with a sticky scroll transition")]
struct Cli {
    /// Image drawn on top; holes are cut into it.
    #[arg(long, default_value = "images/cover-artistic.jpg")]
    cover: PathBuf,

    /// Photo revealed through the holes.
    #[arg(long, default_value = "images/hero-photo.jpg")]
    real: PathBuf,

    /// Initial window width (logical pixels).
    #[arg(long, default_value_t = 540)]
    width: usize,

    /// Initial window height (logical pixels).
    #[arg(long, default_value_t = 720)]
    height: usize,

    /// Device pixel ratio hint; capped per device class.
    #[arg(long, default_value_t = 1.0)]
    dpr: f32,

    /// Environment identification string used to pick the mobile or desktop profile.
    #[arg(long, default_value = "")]
    user_agent: String,

    /// JSON file overriding individual profile fields.
    #[arg(long)]
    profile: Option<PathBuf>,

    #[arg(long, default_value = "SAVE THE DATE")]
    title_top: String,

    #[arg(long, default_value = "WE ARE GETTING MARRIED")]
    title_bottom: String,

    #[arg(long, default_value = "S & A")]
    signature: String,

    /// Hint shown until the first touch.
    #[arg(long, default_value = "TOUCH TO REVEAL")]
    instruction: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    /* --- Device class + tuning profile, decided once --- */
    let class = DeviceClass::probe(&cli.user_agent);
    let mut profile = Profile::for_class(class);
    if let Some(path) = &cli.profile {
        profile = Profile::load_overrides(&profile, path)
            .with_context(|| format!("loading profile overrides from {}", path.display()))?;
    }
    tracing::info!(?class, dpr = cli.dpr, "starting");

    /* --- Window + async photo decode --- */
    let mut drawer = Drawer::new("Hero Reveal", cli.width, cli.height).context("opening window")?;
    let loader = ImageLoader::spawn(cli.cover.clone(), cli.real.clone());

    let mut renderer = RevealRenderer::new(profile.clone(), cli.dpr);
    let mut scroll = ScrollController::default();
    let mut tracker = PointerTracker::new(class);
    let mut guard = GestureGuard::default();
    let mut resize = Debounce::new(Duration::from_millis(profile.resize_debounce_ms));
    let overlay = Overlay {
        title_top: cli.title_top,
        title_bottom: cli.title_bottom,
        signature: cli.signature,
        instruction: cli.instruction,
    };

    let start = Instant::now();
    let mut last_size = drawer.size();
    let mut display = FrameBuffer::new(0, 0);
    let mut events = Vec::new();
    let mut needs_present = true;
    let mut last_hint = 1.0;

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let now = Instant::now();
        let now_ms = now.duration_since(start).as_secs_f64() * 1000.0;

        /* 1) Photos arriving from the loader threads */
        while let Some(img) = loader.poll() {
            needs_present |= renderer.install_image(img, drawer.size())?;
        }

        /* 2) Window resizes settle for a moment before the surface is rebuilt */
        let size = drawer.size();
        if size != last_size {
            last_size = size;
            resize.push(size, now);
        }
        if let Some((w, h)) = resize.poll(now) {
            renderer.resize(w, h)?;
            needs_present = true;
        }

        /* 3) Input: scroll gestures drive the transition, the rest drives the reveal.
              Reveal input is mapped window -> container -> unscaled surface so holes
              stay under the pointer while the hero is shrunk. */
        let shown = HeroStyle::at(scroll.progress());
        let (cw, ch) = renderer.container();
        let to_surface = |x: f32, y: f32| {
            if cw == 0 || ch == 0 || size.0 == 0 || size.1 == 0 {
                return (x, y);
            }
            let (lx, ly) = (x * cw as f32 / size.0 as f32, y * ch as f32 / size.1 as f32);
            shown.unscale(lx, ly, cw as f32, ch as f32)
        };
        tracker.sample(drawer.sample_input(), &mut events);
        for ev in events.drain(..) {
            let Some(ev) = guard.filter(ev, now_ms) else { continue };
            match ev {
                InputEvent::Wheel { delta_y } => needs_present |= scroll.on_wheel(delta_y),
                InputEvent::ScrollDragStart { y } => scroll.on_drag_start(y),
                InputEvent::ScrollDragMove { y } => needs_present |= scroll.on_drag_move(y),
                InputEvent::ScrollDragEnd => scroll.on_drag_end(),
                other => renderer.handle(other.map_position(to_surface), now_ms),
            }
        }

        /* 4) One reveal frame (no-op while idle), plus the hint fade */
        needs_present |= renderer.frame(now_ms)?;
        let hint = scroll::hint_opacity(renderer.hint_hidden_at(), now_ms);
        if hint != last_hint {
            last_hint = hint;
            needs_present = true;
        }

        /* 5) Compose + present only when something changed */
        if needs_present {
            let surface = renderer.surface();
            let (w, h) = if surface.is_empty() { size } else { (surface.width, surface.height) };
            if (display.width, display.height) != (w, h) {
                display = FrameBuffer::new(w, h);
            }
            let style = HeroStyle::at(scroll.progress());
            scroll::compose(&mut display, surface, renderer.backdrop(), &style, &overlay, renderer.quality(), hint);
            drawer.present(&display)?;
            needs_present = false;
        } else {
            drawer.pump();
        }
    }

    renderer.destroy();
    tracing::info!(
        state = ?renderer.state(),
        double_taps = guard.double_taps,
        multi_touch_suppressed = guard.suppressed_multi_touch,
        "window closed"
    );
    Ok(())
}
