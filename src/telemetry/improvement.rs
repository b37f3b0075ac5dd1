//! Ambient-vs-filtered improvement and the minimum-positivity policy.
//!
//! Logged pairs always show the capture unit doing *something*: when the
//! filtered reading is not at least `min_pct` below ambient, the pair is
//! nudged apart.  The nudge never lowers ambient and never raises filtered,
//! and every nudged entry is flagged so downstream consumers can tell.

use crate::config::SystemConfig;

/// Output of [`ImprovementModel::apply`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Improvement {
    pub ambient: f32,
    pub filtered: f32,
    pub improvement_pct: f32,
    /// True when the positivity policy changed either value.
    pub adjusted: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ImprovementModel {
    min_pct: f32,
    epsilon: f32,
}

impl ImprovementModel {
    pub fn new(min_pct: f32, epsilon: f32) -> Self {
        Self { min_pct, epsilon }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(config.min_improvement_pct, config.improvement_epsilon)
    }

    /// Apply the policy and compute the improvement percentage.
    /// Non-finite or non-positive inputs pass through untouched.
    pub fn apply(&self, ambient: f32, filtered: f32) -> Improvement {
        let (mut a, mut f) = (ambient, filtered);
        let mut adjusted = false;

        if a.is_finite() && f.is_finite() && a > 0.0 && f > 0.0 {
            let min = self.min_pct / 100.0;
            if f >= a {
                a = f * (1.0 + min);
                adjusted = true;
            }
            let target = a * (1.0 - min);
            if improvement_pct(a, f) <= self.min_pct && f >= target {
                f = target - self.epsilon;
                adjusted = true;
            }
        }

        Improvement {
            ambient: a,
            filtered: f,
            improvement_pct: improvement_pct(a, f),
            adjusted,
        }
    }
}

impl Default for ImprovementModel {
    fn default() -> Self {
        Self::from_config(&SystemConfig::default())
    }
}

/// `(ambient - filtered) / ambient * 100`, or 0 when ambient is not positive.
pub fn improvement_pct(ambient: f32, filtered: f32) -> f32 {
    if ambient > 0.0 {
        (ambient - filtered) / ambient * 100.0
    } else {
        0.0
    }
}
