// Device-class probe and the tuning profile selected from it.
// Visual: phones get smaller holes, shorter ripples, a shorter trail and a
// lower surface resolution than desktops.
// The class is probed once at startup; everything else only sees the `Profile`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl DeviceClass {
    /// Classify an environment identification string (a browser-style user agent).
    /// Anything mentioning `Mobi` or `Android`, in any case, is treated as mobile.
    pub fn probe(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ua.contains("mobi") || ua.contains("android") {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    /// Trail hole radius while fresh (logical px).
    pub base_radius: f32,
    /// Trail hole radius once fully faded.
    pub max_radius: f32,
    pub ripple_start_radius: f32,
    pub ripple_end_radius: f32,
    pub ripple_duration_ms: f32,
    pub max_trail_points: usize,
    /// Upper bound for the device-pixel-ratio derived surface scale.
    pub quality_cap: f32,
    pub trail_fade_ms: f32,
    pub trail_fade_exponent: f32,
    pub ease: f32,
    pub snap_distance: f32,
    pub trail_spacing: f32,
    pub hover_tolerance: f32,
    pub resize_debounce_ms: u64,
}

impl Default for Profile {
    fn default() -> Self {
        Self::for_class(DeviceClass::Desktop)
    }
}

impl Profile {
    pub fn for_class(class: DeviceClass) -> Self {
        let mobile = class == DeviceClass::Mobile;
        Self {
            base_radius: if mobile { 70.0 } else { 110.0 },
            max_radius: if mobile { 100.0 } else { 150.0 },
            ripple_start_radius: 20.0,
            ripple_end_radius: if mobile { 130.0 } else { 220.0 },
            ripple_duration_ms: 800.0,
            max_trail_points: if mobile { 40 } else { 80 },
            quality_cap: if mobile { 1.5 } else { 2.0 },
            trail_fade_ms: 2500.0,
            trail_fade_exponent: 1.5,
            ease: 0.25,
            snap_distance: 0.5,
            trail_spacing: 8.0,
            hover_tolerance: 1.0,
            resize_debounce_ms: 250,
        }
    }

    /// Surface scale for a device-pixel-ratio hint; missing/invalid hints count as 1.
    pub fn quality(&self, device_pixel_ratio: f32) -> f32 {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        dpr.min(self.quality_cap)
    }

    /// Read a JSON override. Fields left out keep the values of `base`.
    pub fn load_overrides(base: &Profile, path: &Path) -> Result<Profile> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("read {}: {e}", path.display())))?;
        Self::merge_json(base, &text)
    }

    pub fn merge_json(base: &Profile, text: &str) -> Result<Profile> {
        let mut value = serde_json::to_value(base).map_err(|e| Error::config(e.to_string()))?;
        let patch: serde_json::Value =
            serde_json::from_str(text).map_err(|e| Error::config(format!("parse profile: {e}")))?;
        let serde_json::Value::Object(patch) = patch else {
            return Err(Error::config("profile override must be a JSON object"));
        };
        if let serde_json::Value::Object(fields) = &mut value {
            for (k, v) in patch {
                fields.insert(k, v);
            }
        }
        let merged: Profile =
            serde_json::from_value(value).map_err(|e| Error::config(format!("profile: {e}")))?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_trail_points == 0 {
            return Err(Error::config("max_trail_points must be > 0"));
        }
        if self.ripple_duration_ms <= 0.0 || self.trail_fade_ms <= 0.0 {
            return Err(Error::config("durations must be > 0"));
        }
        if self.max_radius < self.base_radius {
            return Err(Error::config("max_radius must be >= base_radius"));
        }
        if !(0.0..=1.0).contains(&self.ease) {
            return Err(Error::config("ease must be within [0, 1]"));
        }
        if self.quality_cap <= 0.0 {
            return Err(Error::config("quality_cap must be > 0"));
        }
        Ok(())
    }
}
