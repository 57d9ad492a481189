// Host-neutral input events.
// The window host samples raw mouse state once per loop iteration;
// `PointerTracker` turns consecutive samples into discrete events and
// `GestureGuard` drops gestures that would fight single-point interaction.

use crate::config::DeviceClass;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PointerEnter { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerLeave,
    TouchStart { x: f32, y: f32, touches: usize },
    TouchMove { x: f32, y: f32, touches: usize },
    TouchEnd,
    TouchCancel,
    /// Mouse wheel, positive = scrolling down.
    Wheel { delta_y: f32 },
    /// Vertical drag meant for the scroll controller, not the reveal.
    ScrollDragStart { y: f32 },
    ScrollDragMove { y: f32 },
    ScrollDragEnd,
}

impl InputEvent {
    pub fn touches(&self) -> usize {
        match *self {
            Self::TouchStart { touches, .. } | Self::TouchMove { touches, .. } => touches,
            _ => 0,
        }
    }

    /// Same event with its position remapped; events without a position pass through.
    pub fn map_position(self, f: impl FnOnce(f32, f32) -> (f32, f32)) -> Self {
        match self {
            Self::PointerEnter { x, y } => {
                let (x, y) = f(x, y);
                Self::PointerEnter { x, y }
            }
            Self::PointerMove { x, y } => {
                let (x, y) = f(x, y);
                Self::PointerMove { x, y }
            }
            Self::TouchStart { x, y, touches } => {
                let (x, y) = f(x, y);
                Self::TouchStart { x, y, touches }
            }
            Self::TouchMove { x, y, touches } => {
                let (x, y) = f(x, y);
                Self::TouchMove { x, y, touches }
            }
            other => other,
        }
    }
}

/// One snapshot of the host's pointer state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawInput {
    /// Pointer position in window coordinates, `None` when outside.
    pub pos: Option<(f32, f32)>,
    pub primary_down: bool,
    pub secondary_down: bool,
    pub wheel_y: f32,
}

/// Diffs raw samples into events.
///
/// Desktop hosts report hover as pointer events. Mobile hosts have no hover,
/// so the primary button stands in for a finger and hover is ignored. The
/// secondary button drags the virtual scroll on either class.
pub struct PointerTracker {
    class: DeviceClass,
    prev: RawInput,
}

impl PointerTracker {
    pub fn new(class: DeviceClass) -> Self {
        Self { class, prev: RawInput::default() }
    }

    pub fn sample(&mut self, now: RawInput, out: &mut Vec<InputEvent>) {
        let prev = std::mem::replace(&mut self.prev, now);

        if now.wheel_y != 0.0 {
            // minifb reports "wheel up" as positive; pages scroll down on positive deltas
            out.push(InputEvent::Wheel { delta_y: -now.wheel_y });
        }

        match (prev.secondary_down, now.secondary_down, now.pos) {
            (false, true, Some((_, y))) => out.push(InputEvent::ScrollDragStart { y }),
            (true, true, Some((_, y))) if prev.pos.map(|p| p.1) != Some(y) => {
                out.push(InputEvent::ScrollDragMove { y })
            }
            (true, false, _) | (true, true, None) => out.push(InputEvent::ScrollDragEnd),
            _ => {}
        }

        match self.class {
            DeviceClass::Desktop => match (prev.pos, now.pos) {
                (None, Some((x, y))) => out.push(InputEvent::PointerEnter { x, y }),
                (Some(a), Some((x, y))) if a != (x, y) => out.push(InputEvent::PointerMove { x, y }),
                (Some(_), None) => out.push(InputEvent::PointerLeave),
                _ => {}
            },
            DeviceClass::Mobile => {
                let was = prev.primary_down && prev.pos.is_some();
                let is = now.primary_down && now.pos.is_some();
                match (was, is, now.pos) {
                    (false, true, Some((x, y))) => out.push(InputEvent::TouchStart { x, y, touches: 1 }),
                    (true, true, Some((x, y))) if prev.pos != now.pos => {
                        out.push(InputEvent::TouchMove { x, y, touches: 1 })
                    }
                    // dragged off the window: the platform would cancel the touch
                    (true, false, None) => out.push(InputEvent::TouchCancel),
                    (true, false, Some(_)) => out.push(InputEvent::TouchEnd),
                    _ => {}
                }
            }
        }
    }
}

/// Two touch-ends closer than this count as a double tap.
pub const DOUBLE_TAP_MS: f64 = 300.0;

/// Keeps pinch and double-tap zoom from interfering with the reveal.
#[derive(Default)]
pub struct GestureGuard {
    last_touch_end_ms: Option<f64>,
    pub suppressed_multi_touch: u64,
    pub double_taps: u64,
}

impl GestureGuard {
    /// `None` means the event is swallowed. Double taps are still delivered
    /// (the reveal must end) but counted so the host can skip any zoom handling.
    pub fn filter(&mut self, event: InputEvent, now_ms: f64) -> Option<InputEvent> {
        // minifb exposes a single pointer, so `PointerTracker` always reports one
        // contact; hosts with real multi-touch feed the count through `touches`.
        if event.touches() > 1 {
            self.suppressed_multi_touch += 1;
            tracing::trace!(touches = event.touches(), "multi-touch suppressed");
            return None;
        }
        if matches!(event, InputEvent::TouchEnd) {
            if let Some(last) = self.last_touch_end_ms {
                if now_ms - last <= DOUBLE_TAP_MS {
                    self.double_taps += 1;
                    tracing::trace!("double tap suppressed");
                }
            }
            self.last_touch_end_ms = Some(now_ms);
        }
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32, y: f32) -> RawInput {
        RawInput { pos: Some((x, y)), ..RawInput::default() }
    }

    fn pressed(x: f32, y: f32) -> RawInput {
        RawInput { pos: Some((x, y)), primary_down: true, ..RawInput::default() }
    }

    #[test]
    fn desktop_hover_becomes_pointer_events() {
        let mut t = PointerTracker::new(DeviceClass::Desktop);
        let mut ev = Vec::new();
        t.sample(at(10.0, 10.0), &mut ev);
        t.sample(at(10.0, 10.0), &mut ev);
        t.sample(at(12.0, 10.0), &mut ev);
        t.sample(RawInput::default(), &mut ev);
        assert_eq!(
            ev,
            vec![
                InputEvent::PointerEnter { x: 10.0, y: 10.0 },
                InputEvent::PointerMove { x: 12.0, y: 10.0 },
                InputEvent::PointerLeave,
            ]
        );
    }

    #[test]
    fn mobile_press_becomes_touch_events() {
        let mut t = PointerTracker::new(DeviceClass::Mobile);
        let mut ev = Vec::new();
        t.sample(at(5.0, 5.0), &mut ev);
        t.sample(pressed(5.0, 5.0), &mut ev);
        t.sample(pressed(6.0, 5.0), &mut ev);
        t.sample(at(6.0, 5.0), &mut ev);
        assert_eq!(
            ev,
            vec![
                InputEvent::TouchStart { x: 5.0, y: 5.0, touches: 1 },
                InputEvent::TouchMove { x: 6.0, y: 5.0, touches: 1 },
                InputEvent::TouchEnd,
            ]
        );
    }

    #[test]
    fn wheel_and_secondary_drag_feed_scroll() {
        let mut t = PointerTracker::new(DeviceClass::Desktop);
        let mut ev = Vec::new();
        t.sample(RawInput { wheel_y: -3.0, ..RawInput::default() }, &mut ev);
        t.sample(RawInput { pos: Some((0.0, 50.0)), secondary_down: true, ..RawInput::default() }, &mut ev);
        t.sample(RawInput { pos: Some((0.0, 40.0)), secondary_down: true, ..RawInput::default() }, &mut ev);
        t.sample(RawInput { pos: Some((0.0, 40.0)), ..RawInput::default() }, &mut ev);
        assert_eq!(ev[0], InputEvent::Wheel { delta_y: 3.0 });
        assert!(ev.contains(&InputEvent::ScrollDragStart { y: 50.0 }));
        assert!(ev.contains(&InputEvent::ScrollDragMove { y: 40.0 }));
        assert!(ev.contains(&InputEvent::ScrollDragEnd));
    }

    #[test]
    fn map_position_touches_only_positioned_events() {
        let shift = |x: f32, y: f32| (x + 1.0, y * 2.0);
        assert_eq!(InputEvent::PointerMove { x: 1.0, y: 3.0 }.map_position(shift), InputEvent::PointerMove { x: 2.0, y: 6.0 });
        assert_eq!(
            InputEvent::TouchStart { x: 0.0, y: 1.0, touches: 2 }.map_position(shift),
            InputEvent::TouchStart { x: 1.0, y: 2.0, touches: 2 }
        );
        assert_eq!(InputEvent::PointerLeave.map_position(shift), InputEvent::PointerLeave);
        assert_eq!(InputEvent::ScrollDragMove { y: 5.0 }.map_position(shift), InputEvent::ScrollDragMove { y: 5.0 });
    }

    #[test]
    fn guard_drops_multi_touch() {
        let mut g = GestureGuard::default();
        let pinch = InputEvent::TouchStart { x: 0.0, y: 0.0, touches: 2 };
        assert_eq!(g.filter(pinch, 0.0), None);
        let single = InputEvent::TouchMove { x: 0.0, y: 0.0, touches: 1 };
        assert_eq!(g.filter(single, 0.0), Some(single));
        assert_eq!(g.suppressed_multi_touch, 1);
    }

    #[test]
    fn guard_counts_double_taps_but_delivers_them() {
        let mut g = GestureGuard::default();
        assert!(g.filter(InputEvent::TouchEnd, 1000.0).is_some());
        assert!(g.filter(InputEvent::TouchEnd, 1200.0).is_some());
        assert!(g.filter(InputEvent::TouchEnd, 2000.0).is_some());
        assert_eq!(g.double_taps, 1);
    }
}
