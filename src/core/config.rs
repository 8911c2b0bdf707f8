//! Battle configuration with documented constants
//!
//! Every tunable number used by the resolver, the combatant status engine
//! and the scheduler is collected here.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{BattleError, Result};
use crate::core::types::Team;

/// Configuration for the battle systems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    // === CRITICAL HITS ===
    /// Crit chance every damaging action starts with, before the action's bonus
    pub base_crit_chance: f32,

    /// Damage multiplier on a critical hit (result is floored)
    pub crit_multiplier: f32,

    /// Multiplier applied to the player team's crit chance
    pub player_crit_modifier: f32,

    /// Multiplier applied to the enemy team's crit chance
    pub enemy_crit_modifier: f32,

    // === DAMAGE ===
    /// Lower bound of the uniform damage variance roll
    pub damage_variance_min: f32,

    /// Upper bound of the uniform damage variance roll
    pub damage_variance_max: f32,

    // === HEALING ===
    /// Share of the healer's max HP added to every heal (rounded up)
    pub heal_max_hp_ratio: f32,

    /// Share of the healer's attack added to every heal (rounded)
    pub heal_attack_ratio: f32,

    // === MULTI-TURN CHARGES ===
    /// Power multiplier for completed charges whose action does not set one
    pub default_charge_multiplier: f32,

    /// Proportional defense gain while charging with `ApplyDefenseBuff`
    pub charge_defense_boost: f32,

    /// Proportional speed loss while charging with `ApplySpeedDebuff`
    pub charge_speed_penalty: f32,

    /// Self damage per charge tick is `max_hp / divisor` (at least 1)
    pub charge_self_damage_divisor: u32,

    // === TURN ORDER PREDICTION ===
    /// Gauge value a combatant must reach to act in the lookahead simulation
    pub turn_gauge_threshold: f64,

    /// Number of upcoming actors reported by the lookahead
    pub turn_order_lookahead: usize,

    // === RUNNER ===
    /// Upper bound on turns for `run_until_blocked`
    pub max_turns: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            base_crit_chance: 0.05,
            crit_multiplier: 1.5,
            player_crit_modifier: 1.0,
            enemy_crit_modifier: 1.0,

            damage_variance_min: 0.85,
            damage_variance_max: 1.0,

            heal_max_hp_ratio: 0.15,
            heal_attack_ratio: 0.20,

            default_charge_multiplier: 1.5,
            charge_defense_boost: 0.5,
            charge_speed_penalty: 0.5,
            charge_self_damage_divisor: 20,

            turn_gauge_threshold: 100.0,
            turn_order_lookahead: 5,

            max_turns: 1000,
        }
    }
}

impl BattleConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: BattleConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Crit chance modifier for a team (neutral uses 1.0)
    pub fn crit_modifier(&self, team: Team) -> f32 {
        match team {
            Team::Player => self.player_crit_modifier,
            Team::Enemy => self.enemy_crit_modifier,
            Team::Neutral => 1.0,
        }
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.damage_variance_min > self.damage_variance_max {
            return Err(BattleError::InvalidConfig(format!(
                "damage_variance_min ({}) should be <= damage_variance_max ({})",
                self.damage_variance_min, self.damage_variance_max
            )));
        }

        if self.damage_variance_min <= 0.0 {
            return Err(BattleError::InvalidConfig(
                "damage_variance_min must be positive".into(),
            ));
        }

        if self.base_crit_chance < 0.0
            || self.player_crit_modifier < 0.0
            || self.enemy_crit_modifier < 0.0
        {
            return Err(BattleError::InvalidConfig(
                "Crit chance and modifiers must not be negative".into(),
            ));
        }

        if self.crit_multiplier < 1.0 {
            return Err(BattleError::InvalidConfig(format!(
                "crit_multiplier ({}) should be >= 1.0",
                self.crit_multiplier
            )));
        }

        if self.charge_self_damage_divisor == 0 {
            return Err(BattleError::InvalidConfig(
                "charge_self_damage_divisor must be non-zero".into(),
            ));
        }

        if self.turn_gauge_threshold <= 0.0 {
            return Err(BattleError::InvalidConfig(
                "turn_gauge_threshold must be positive".into(),
            ));
        }

        if self.turn_order_lookahead == 0 {
            return Err(BattleError::InvalidConfig(
                "turn_order_lookahead must be at least 1".into(),
            ));
        }

        if self.max_turns == 0 {
            return Err(BattleError::InvalidConfig(
                "max_turns must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
