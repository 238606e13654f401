use crate::{
    error::{SimError, SimResult},
    event::WeatherKind,
};
use serde::{Deserialize, Serialize};

// ── Grid ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub cols: u32,
    pub rows: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { cols: 8, rows: 8 }
    }
}

// ── Tier generation ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    pub tier_count:        u32,
    pub slots_per_tier:    u32,
    pub rate_base:         f64,
    pub rate_growth:       f64,
    pub cost_base:         f64,
    pub cost_growth:       f64,
    /// Same-tier stats are sampled in [variance_low, variance_high] × baseline.
    pub variance_low:      f64,
    pub variance_high:     f64,
    pub lifespan_min:      u32,
    pub lifespan_max:      u32,
    pub min_cost:          f64,
    pub min_rate:          f64,
    pub capstone_rate:     f64,
    pub capstone_cost:     f64,
    pub capstone_lifespan: f64,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            tier_count:        10,
            slots_per_tier:    3,
            rate_base:         5.0,
            rate_growth:       3.129,
            cost_base:         50.0,
            cost_growth:       2.783,
            variance_low:      0.85,
            variance_high:     1.15,
            lifespan_min:      10,
            lifespan_max:      40,
            min_cost:          5.0,
            min_rate:          1.0,
            capstone_rate:     100_000.0,
            capstone_cost:     500_000.0,
            capstone_lifespan: 5.0,
        }
    }
}

impl TierConfig {
    /// Manifest rows needed: full tiers plus the single capstone.
    pub fn required_entries(&self) -> usize {
        let full_tiers = self.tier_count.saturating_sub(1) as usize;
        full_tiers * self.slots_per_tier as usize + 1
    }
}

// ── Score-stepped intervals ────────────────────────────────────────

/// `max(min, base - floor(score / score_step) * decrement)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepScaling {
    pub base:       f64,
    pub min:        f64,
    pub score_step: f64,
    pub decrement:  f64,
}

// ── Weather ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherWeight {
    pub kind:   WeatherKind,
    pub weight: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Delay from run start until the first warning may be rolled.
    pub first_check_delay:        f64,
    pub warning_lead:             f64,
    pub duration_min:             f64,
    pub duration_max:             f64,
    pub cooldown:                 StepScaling,
    pub pool:                     Vec<WeatherWeight>,
    pub hazard_duration:          f64,
    pub hail_kills:               usize,
    pub hail_craters:             usize,
    pub rain_lifespan_bonus:      f64,
    pub drought_base_multiplier:  f64,
    pub drought_score_cap:        f64,
    pub drought_severity_step:    f64,
    pub drought_severity_bonus:   f64,
    pub locust_score_cap:         f64,
    pub flash_max:                u8,
    pub flash_decay:              u8,
    pub forecast_unknown_chance:  f64,
    pub forecast_truthful_chance: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            first_check_delay:        10.0,
            warning_lead:             5.0,
            duration_min:             5.0,
            duration_max:             10.0,
            cooldown: StepScaling {
                base:       60.0,
                min:        15.0,
                score_step: 50_000.0,
                decrement:  5.0,
            },
            pool: vec![
                WeatherWeight { kind: WeatherKind::Drought,   weight: 60 },
                WeatherWeight { kind: WeatherKind::Rain,      weight: 50 },
                WeatherWeight { kind: WeatherKind::Hailstorm, weight: 40 },
                WeatherWeight { kind: WeatherKind::Locusts,   weight: 30 },
                WeatherWeight { kind: WeatherKind::Eclipse,   weight: 20 },
                WeatherWeight { kind: WeatherKind::Meteor,    weight: 10 },
            ],
            hazard_duration:          10.0,
            hail_kills:               3,
            hail_craters:             6,
            rain_lifespan_bonus:      5.0,
            drought_base_multiplier:  3.0,
            drought_score_cap:        500_000.0,
            drought_severity_step:    100_000.0,
            drought_severity_bonus:   0.5,
            locust_score_cap:         500_000.0,
            flash_max:                255,
            flash_decay:              5,
            forecast_unknown_chance:  0.50,
            forecast_truthful_chance: 0.40,
        }
    }
}

// ── Shop ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub offering_count:        usize,
    pub refresh:               StepScaling,
    pub tier_threshold_base:   f64,
    pub tier_threshold_growth: f64,
    pub inflation_score_step:  f64,
    pub inflation_step:        f64,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            offering_count: 3,
            refresh: StepScaling {
                base:       60.0,
                min:        10.0,
                score_step: 50_000.0,
                decrement:  5.0,
            },
            tier_threshold_base:   100.0,
            tier_threshold_growth: 2.918,
            inflation_score_step:  50_000.0,
            inflation_step:        0.10,
        }
    }
}

// ── Run ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub starting_balance:        f64,
    pub starting_reroll_cost:    f64,
    pub reroll_growth:           f64,
    /// Seeds of one random tier-1 archetype handed out at run start.
    pub starting_seeds:          u32,
    pub empty_timeout:           StepScaling,
    /// Past this score the empty-garden timeout collapses to `fast_fail_timeout`.
    pub fast_fail_score:         f64,
    pub fast_fail_timeout:       f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            starting_balance:     150.0,
            starting_reroll_cost: 50.0,
            reroll_growth:        1.20,
            starting_seeds:       2,
            empty_timeout: StepScaling {
                base:       10.0,
                min:        0.0,
                score_step: 100_000.0,
                decrement:  1.0,
            },
            fast_fail_score:      1_000_000.0,
            fast_fail_timeout:    0.1,
        }
    }
}

// ── Top level ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub grid:    GridConfig,
    pub tiers:   TierConfig,
    pub weather: WeatherConfig,
    pub shop:    ShopConfig,
    pub run:     RunConfig,
}

impl SimConfig {
    /// Load from a JSON file. Missing sections and fields keep their defaults.
    /// In tests, use SimConfig::default_test().
    pub fn load(path: &str) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)?;
        config.validate()?;
        log::info!("config: loaded {path}");
        Ok(config)
    }

    /// Canonical constants for use in tests.
    pub fn default_test() -> Self {
        Self::default()
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> SimResult<()> {
        let g = &self.grid;
        if g.cols < 3 || g.rows < 3 {
            return invalid(format!("grid must be at least 3x3, got {}x{}", g.cols, g.rows));
        }

        let t = &self.tiers;
        if t.tier_count == 0 || t.slots_per_tier == 0 {
            return invalid("tier_count and slots_per_tier must be > 0".into());
        }
        if t.variance_low > t.variance_high {
            return invalid("tiers.variance_low exceeds variance_high".into());
        }
        if t.lifespan_min == 0 || t.lifespan_min > t.lifespan_max {
            return invalid("tiers lifespan range is empty or starts at 0".into());
        }
        if t.capstone_lifespan <= 0.0 {
            return invalid("tiers.capstone_lifespan must be > 0".into());
        }

        let w = &self.weather;
        if w.duration_min > w.duration_max {
            return invalid("weather.duration_min exceeds duration_max".into());
        }
        if w.pool.is_empty() || w.pool.iter().all(|p| p.weight == 0) {
            return invalid("weather.pool needs at least one positive weight".into());
        }
        if w.forecast_unknown_chance + w.forecast_truthful_chance > 1.0 {
            return invalid("forecast chances sum above 1.0".into());
        }
        for scaling in [&w.cooldown, &self.shop.refresh, &self.run.empty_timeout] {
            if scaling.score_step <= 0.0 {
                return invalid("score_step must be > 0".into());
            }
        }

        let s = &self.shop;
        if s.offering_count == 0 {
            return invalid("shop.offering_count must be > 0".into());
        }
        if s.inflation_score_step <= 0.0 {
            return invalid("shop.inflation_score_step must be > 0".into());
        }

        if self.run.reroll_growth < 1.0 {
            return invalid("run.reroll_growth must be >= 1.0".into());
        }
        Ok(())
    }
}

fn invalid(reason: String) -> SimResult<()> {
    Err(SimError::InvalidConfig { reason })
}
