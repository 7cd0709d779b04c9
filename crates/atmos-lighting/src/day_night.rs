//! Brightness proxy derived from sunrise and sunset.
//!
//! `progress` runs 0.3..=1.0 through the day on a half-sine that peaks at
//! solar noon, and 0.3..=0 through the night, falling linearly from the
//! previous sunset toward the next sunrise. The value is continuous at both
//! boundaries so lighting never steps.

use std::f64::consts::PI;

/// Milliseconds in one day.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

const DAY_FLOOR: f64 = 0.3;
const DAY_SWING: f64 = 0.7;

/// Result of [`compute_day_night`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DayNight {
    pub is_night: bool,
    /// Brightness proxy in `[0, 1]`.
    pub progress: f32,
}

impl Default for DayNight {
    /// Full daylight, used whenever sun times are unknown.
    fn default() -> Self {
        Self {
            is_night: false,
            progress: 1.0,
        }
    }
}

/// Classify `now_ms` against the sun times (all epoch milliseconds).
///
/// A missing or zero timestamp, or a sunset that does not follow sunrise,
/// yields [`DayNight::default`].
pub fn compute_day_night(sunrise: Option<i64>, sunset: Option<i64>, now_ms: i64) -> DayNight {
    let (Some(sunrise), Some(sunset)) = (sunrise.filter(|t| *t != 0), sunset.filter(|t| *t != 0))
    else {
        return DayNight::default();
    };
    if sunset <= sunrise {
        return DayNight::default();
    }

    if now_ms < sunrise {
        let previous_sunset = sunset - DAY_MS;
        return night(now_ms - previous_sunset, sunrise - previous_sunset);
    }
    if now_ms > sunset {
        let next_sunrise = sunrise + DAY_MS;
        return night(now_ms - sunset, next_sunrise - sunset);
    }

    let day_fraction = (now_ms - sunrise) as f64 / (sunset - sunrise) as f64;
    DayNight {
        is_night: false,
        progress: (DAY_FLOOR + (day_fraction * PI).sin() * DAY_SWING) as f32,
    }
}

fn night(since_sunset: i64, duration: i64) -> DayNight {
    let remaining = if duration > 0 {
        (1.0 - since_sunset as f64 / duration as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };
    DayNight {
        is_night: true,
        progress: (remaining * DAY_FLOOR) as f32,
    }
}
