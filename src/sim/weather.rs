//! Weather numeric contract
//!
//! The weather collaborator owns its own state machine; the core only sees
//! the numbers it produces each tick.

use serde::{Deserialize, Serialize};

/// Named weather states the collaborator cycles through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeatherKind {
    #[default]
    Clear,
    Windy,
    Rain,
    Storm,
    Hurricane,
}

/// Per-tick weather input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherEffects {
    /// Air density multiplier
    pub density: f64,
    /// Wind speed multiplier
    pub wind_scale: f64,
    /// Precipitation intensity (0 = dry)
    pub precipitation: f64,
    /// Per-layer, per-tick chance of a gust starting
    pub gust_chance: f64,
    /// Gust speed added on top of the layer wind (m/s)
    pub gust_magnitude: f64,
    /// Gust length (s)
    pub gust_duration: f64,
}

impl Default for WeatherEffects {
    fn default() -> Self {
        Self::calm()
    }
}

impl WeatherEffects {
    /// Neutral modifiers, no gusts
    pub fn calm() -> Self {
        Self {
            density: 1.0,
            wind_scale: 1.0,
            precipitation: 0.0,
            gust_chance: 0.0,
            gust_magnitude: 0.0,
            gust_duration: 0.0,
        }
    }

    /// Effects for a weather state scaled by planetary intensity
    pub fn preset(kind: WeatherKind, intensity: f64) -> Self {
        // (wind scale, density, precipitation, gust chance)
        let (wind_scale, density, precipitation, gust_chance) = match kind {
            WeatherKind::Clear => (1.0, 1.0, 0.0, 0.05),
            WeatherKind::Windy => (1.5, 1.0, 0.0, 0.2),
            WeatherKind::Rain => (1.2, 1.05, 0.5, 0.1),
            WeatherKind::Storm => (2.0, 1.1, 1.0, 0.4),
            WeatherKind::Hurricane => (3.0, 1.15, 1.5, 0.6),
        };
        Self {
            density: density * intensity,
            wind_scale: wind_scale * intensity,
            precipitation: precipitation * intensity,
            gust_chance: gust_chance * intensity,
            gust_magnitude: 20.0 * wind_scale * intensity,
            gust_duration: 3.5,
        }
    }

    #[inline]
    pub fn is_wet(&self) -> bool {
        self.precipitation > 0.0
    }

    /// Copy with unusable multipliers replaced: negative or non-finite
    /// density/wind scale become 1.0, precipitation and gust chance are
    /// clamped to their valid ranges.
    pub fn sanitized(&self) -> Self {
        let multiplier = |v: f64| if v.is_finite() && v >= 0.0 { v } else { 1.0 };
        let non_negative = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        Self {
            density: multiplier(self.density),
            wind_scale: multiplier(self.wind_scale),
            precipitation: non_negative(self.precipitation),
            gust_chance: non_negative(self.gust_chance).min(1.0),
            gust_magnitude: non_negative(self.gust_magnitude),
            gust_duration: non_negative(self.gust_duration),
        }
    }
}
