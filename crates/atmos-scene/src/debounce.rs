//! Cross-fade gate between weather conditions.
//!
//! Only one condition is ever displayed. A change first fades the effect
//! opacity of the displayed condition to (almost) zero, then swaps and fades
//! the new one in, so two conditions' effects never overlap.

use atmos_animation::SmoothedValue;

use crate::weather::WeatherCondition;

const FADE_DAMPING: f32 = 0.03;
const FADE_PRECISION: f32 = 0.0005;
const SWAP_THRESHOLD: f32 = 0.01;

#[derive(Clone, Debug)]
pub struct EffectDebouncer {
    displayed: Option<WeatherCondition>,
    opacity: SmoothedValue,
}

impl Default for EffectDebouncer {
    fn default() -> Self {
        Self {
            displayed: None,
            opacity: SmoothedValue::new(0.0, FADE_DAMPING, FADE_PRECISION),
        }
    }
}

impl EffectDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Condition whose effects are currently shown.
    pub fn displayed(&self) -> Option<WeatherCondition> {
        self.displayed
    }

    /// Effect opacity in `[0, 1]`.
    pub fn opacity(&self) -> f32 {
        self.opacity.value()
    }

    /// Advance one tick against the latest requested condition.
    pub fn update(&mut self, requested: Option<WeatherCondition>) {
        match (requested, self.displayed) {
            (None, _) => self.opacity.set_target(0.0),
            (Some(condition), None) => {
                self.displayed = Some(condition);
                self.opacity.set_target(1.0);
            }
            (Some(condition), Some(shown)) if condition == shown => self.opacity.set_target(1.0),
            (Some(_), Some(_)) => self.opacity.set_target(0.0),
        }

        self.opacity.tick();

        if self.opacity.value() < SWAP_THRESHOLD && requested != self.displayed {
            tracing::debug!(
                from = ?self.displayed,
                to = ?requested,
                "weather effect swapped"
            );
            self.displayed = requested;
            if requested.is_some() {
                self.opacity.set_target(1.0);
            }
        }
    }
}
