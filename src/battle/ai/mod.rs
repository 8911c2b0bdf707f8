//! Enemy AI strategies for move selection
//!
//! Architecture: one trait, stateless implementations
//! - `AiStrategy` maps (actor, valid targets, moves) to a decision
//! - `AiKind` is the config form, loaded from battle setup TOML
//! - Randomness comes from the scheduler's RNG so battles replay exactly

mod aggressive;
mod healer;
mod random;
mod strategic;

pub use aggressive::AggressiveStrategy;
pub use healer::HealerStrategy;
pub use random::RandomStrategy;
pub use strategic::StrategicStrategy;

use std::fmt;
use std::sync::Arc;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::battle::action::{ActionType, BattleAction};
use crate::battle::combatant::Combatant;
use crate::core::config::BattleConfig;
use crate::core::types::CombatantId;

/// A chosen move and the primary target for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiDecision {
    /// Index into the move list the strategy was given
    pub action_index: usize,
    pub target: CombatantId,
}

/// Trait for battle AI implementations
pub trait AiStrategy: fmt::Debug + Send + Sync {
    /// Pick a move and target, or `None` when nothing sensible is possible
    fn choose_action(
        &self,
        actor: &Combatant,
        valid_targets: &[&Combatant],
        moves: &[BattleAction],
        rng: &mut dyn RngCore,
    ) -> Option<AiDecision>;

    fn name(&self) -> &'static str;
}

/// Strategy selection as it appears in setup files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiKind {
    Random,
    Aggressive,
    Healer {
        #[serde(default = "default_heal_threshold")]
        threshold: f32,
    },
    Strategic {
        #[serde(default = "default_defend_threshold")]
        defend_threshold: f32,
        #[serde(default = "default_buff_chance")]
        buff_chance: f32,
    },
}

fn default_heal_threshold() -> f32 {
    0.5
}

fn default_defend_threshold() -> f32 {
    0.3
}

fn default_buff_chance() -> f32 {
    0.3
}

impl AiKind {
    /// Instantiate the strategy for a battle running under `config`
    pub fn build(&self, config: &BattleConfig) -> Arc<dyn AiStrategy> {
        match *self {
            AiKind::Random => Arc::new(RandomStrategy),
            AiKind::Aggressive => Arc::new(AggressiveStrategy),
            AiKind::Healer { threshold } => Arc::new(HealerStrategy::new(threshold)),
            AiKind::Strategic {
                defend_threshold,
                buff_chance,
            } => Arc::new(StrategicStrategy::new(defend_threshold, buff_chance).with_config(config)),
        }
    }
}

// === SHARED HELPERS ===

/// Living target with the least HP (first in order on ties)
pub(crate) fn weakest_target(valid_targets: &[&Combatant]) -> Option<CombatantId> {
    valid_targets
        .iter()
        .filter(|c| c.is_alive())
        .min_by_key(|c| c.current_hp())
        .map(|c| c.id)
}

/// Index of the highest-power damage move
pub(crate) fn strongest_damage_move(moves: &[BattleAction]) -> Option<usize> {
    moves
        .iter()
        .enumerate()
        .filter(|(_, m)| m.action_type == ActionType::Damage)
        .max_by_key(|(i, m)| (m.power, std::cmp::Reverse(*i)))
        .map(|(i, _)| i)
}

/// Index of the first move of a given type
pub(crate) fn first_move_of(moves: &[BattleAction], action_type: ActionType) -> Option<usize> {
    moves.iter().position(|m| m.action_type == action_type)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::battle::combatant::CombatantStats;
    use crate::core::types::Team;

    pub fn enemy(id: u32, hp: u32) -> Combatant {
        let mut c = Combatant::new(format!("Target{}", id), Team::Player, CombatantStats::new(100, 10, 10, 5))
            .with_current_hp(hp);
        c.id = CombatantId(id);
        c
    }

    pub fn actor(hp: u32) -> Combatant {
        let mut c = Combatant::new("Orc", Team::Enemy, CombatantStats::new(100, 20, 10, 5))
            .with_current_hp(hp);
        c.id = CombatantId(99);
        c
    }

    pub fn moveset() -> Vec<BattleAction> {
        vec![
            BattleAction::basic_attack(),
            BattleAction::heal(),
            BattleAction::defend(),
            BattleAction::power_up(),
            BattleAction::basic_attack().with_power(90),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_ai_kind_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            ai: AiKind,
        }
        let w: Wrapper = toml::from_str("ai = \"aggressive\"\n").unwrap();
        assert_eq!(w.ai, AiKind::Aggressive);

        let w: Wrapper = toml::from_str("ai = { healer = { threshold = 0.4 } }\n").unwrap();
        assert_eq!(w.ai, AiKind::Healer { threshold: 0.4 });

        let w: Wrapper = toml::from_str("ai = { strategic = {} }\n").unwrap();
        assert_eq!(
            w.ai,
            AiKind::Strategic {
                defend_threshold: 0.3,
                buff_chance: 0.3
            }
        );
    }

    #[test]
    fn test_build_names() {
        let config = BattleConfig::default();
        assert_eq!(AiKind::Random.build(&config).name(), "random");
        assert_eq!(AiKind::Aggressive.build(&config).name(), "aggressive");
        assert_eq!(AiKind::Healer { threshold: 0.5 }.build(&config).name(), "healer");
        let strategic = AiKind::Strategic {
            defend_threshold: 0.3,
            buff_chance: 0.3,
        };
        assert_eq!(strategic.build(&config).name(), "strategic");
    }

    #[test]
    fn test_helpers() {
        let a = enemy(1, 40);
        let b = enemy(2, 10);
        assert_eq!(weakest_target(&[&a, &b]), Some(CombatantId(2)));
        assert_eq!(weakest_target(&[]), None);

        let moves = moveset();
        assert_eq!(strongest_damage_move(&moves), Some(4));
        assert_eq!(first_move_of(&moves, ActionType::Heal), Some(1));
        assert_eq!(first_move_of(&moves, ActionType::Item), None);
    }
}
