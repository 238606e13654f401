//! Score-driven pressure knobs.
//!
//! Event cooldown, shop refresh interval, shop inflation and the
//! empty-garden timeout all step at the same score milestones, so
//! economic and hazard escalation move together.

use crate::config::{RunConfig, ShopConfig, StepScaling, WeatherConfig};

/// Number of whole `step`s contained in `score`. Negative scores count as 0.
pub fn score_steps(score: f64, step: f64) -> f64 {
    (score.max(0.0) / step).floor()
}

impl StepScaling {
    /// `max(min, base - steps * decrement)`.
    pub fn at(&self, score: f64) -> f64 {
        let reduced = self.base - score_steps(score, self.score_step) * self.decrement;
        reduced.max(self.min)
    }
}

/// Seconds between the end of one event and the next warning roll.
pub fn event_cooldown(score: f64, cfg: &WeatherConfig) -> f64 {
    cfg.cooldown.at(score)
}

/// Seconds between automatic shop refreshes.
pub fn refresh_interval(score: f64, cfg: &ShopConfig) -> f64 {
    cfg.refresh.at(score)
}

/// Price multiplier: `1 + steps * inflation_step`. Unbounded above.
pub fn inflation_multiplier(score: f64, cfg: &ShopConfig) -> f64 {
    1.0 + score_steps(score, cfg.inflation_score_step) * cfg.inflation_step
}

/// Score needed to unlock the tier after `tier`.
pub fn tier_threshold(tier: u32, cfg: &ShopConfig) -> f64 {
    let exponent = tier.saturating_sub(1) as i32;
    (cfg.tier_threshold_base * cfg.tier_threshold_growth.powi(exponent)).floor()
}

/// Aging multiplier applied to every plant during a drought.
pub fn drought_multiplier(score: f64, cfg: &WeatherConfig) -> f64 {
    let capped = score.min(cfg.drought_score_cap);
    let severity = 1.0 + score_steps(capped, cfg.drought_severity_step) * cfg.drought_severity_bonus;
    cfg.drought_base_multiplier * severity
}

/// Yield multiplier applied during locusts. Falls toward 0 as score grows.
pub fn locust_multiplier(score: f64, cfg: &WeatherConfig) -> f64 {
    (1.0 - score.max(0.0) / cfg.locust_score_cap).max(0.0)
}

/// Seconds the garden may stay empty before the run is lost.
pub fn empty_garden_timeout(score: f64, cfg: &RunConfig) -> f64 {
    if score >= cfg.fast_fail_score {
        cfg.fast_fail_timeout
    } else {
        cfg.empty_timeout.at(score)
    }
}
