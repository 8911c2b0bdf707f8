use rand::Rng;
use rand::RngCore;

use crate::battle::action::{ActionType, BattleAction};
use crate::battle::ai::{first_move_of, strongest_damage_move, weakest_target, AiDecision, AiStrategy};
use crate::battle::combatant::Combatant;
use crate::battle::resolver::MoveResolver;
use crate::core::config::BattleConfig;

/// Threshold-driven tactician
///
/// Below `defend_threshold` it heals or guards. While unbuffed it may spend a
/// turn on a self buff. Otherwise it focuses the weakest enemy, using the
/// cheapest move that is sure to finish them and the strongest move if none is.
#[derive(Debug, Clone, Copy)]
pub struct StrategicStrategy {
    pub defend_threshold: f32,
    pub buff_chance: f32,
    /// Lowest damage roll, used to decide whether a hit is sure to finish
    pub min_variance: f32,
}

impl StrategicStrategy {
    pub fn new(defend_threshold: f32, buff_chance: f32) -> Self {
        Self {
            defend_threshold: defend_threshold.clamp(0.0, 1.0),
            buff_chance: buff_chance.clamp(0.0, 1.0),
            min_variance: BattleConfig::default().damage_variance_min,
        }
    }

    /// Judge finishing blows against the battle's own damage spread
    pub fn with_config(mut self, config: &BattleConfig) -> Self {
        self.min_variance = config.damage_variance_min;
        self
    }

    fn finishing_move(
        &self,
        moves: &[BattleAction],
        actor: &Combatant,
        target: &Combatant,
    ) -> Option<usize> {
        moves
            .iter()
            .enumerate()
            .filter(|(_, m)| m.action_type == ActionType::Damage && !m.requires_charge())
            .filter(|(_, m)| {
                let worst = MoveResolver::base_damage(m, actor.attack, target.defense) * self.min_variance;
                worst.floor() as u32 >= target.current_hp() && m.accuracy >= 1.0
            })
            .min_by_key(|(_, m)| m.power)
            .map(|(i, _)| i)
    }
}

impl Default for StrategicStrategy {
    fn default() -> Self {
        Self::new(0.3, 0.3)
    }
}

impl AiStrategy for StrategicStrategy {
    fn choose_action(
        &self,
        actor: &Combatant,
        valid_targets: &[&Combatant],
        moves: &[BattleAction],
        rng: &mut dyn RngCore,
    ) -> Option<AiDecision> {
        let target_id = weakest_target(valid_targets)?;

        if actor.hp_ratio() < self.defend_threshold {
            let survival = first_move_of(moves, ActionType::Heal)
                .or_else(|| first_move_of(moves, ActionType::Defend));
            if let Some(action_index) = survival {
                return Some(AiDecision {
                    action_index,
                    target: actor.id,
                });
            }
        }

        if !actor.is_attack_buffed() && rng.gen::<f32>() < self.buff_chance {
            if let Some(action_index) = first_move_of(moves, ActionType::Buff) {
                return Some(AiDecision {
                    action_index,
                    target: actor.id,
                });
            }
        }

        let target = valid_targets.iter().find(|c| c.id == target_id)?;
        let action_index = self.finishing_move(moves, actor, target)
            .or_else(|| strongest_damage_move(moves))
            .or_else(|| (!moves.is_empty()).then_some(0))?;

        Some(AiDecision {
            action_index,
            target: target_id,
        })
    }

    fn name(&self) -> &'static str {
        "strategic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ai::test_support::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_low_hp_prefers_heal_then_defend() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let a = enemy(1, 80);
        let strategy = StrategicStrategy::new(0.3, 0.0);

        let d = strategy.choose_action(&actor(10), &[&a], &moveset(), &mut rng).unwrap();
        assert_eq!(d.action_index, 1);

        let no_heal = vec![BattleAction::basic_attack(), BattleAction::defend()];
        let d = strategy.choose_action(&actor(10), &[&a], &no_heal, &mut rng).unwrap();
        assert_eq!(d.action_index, 1);
    }

    #[test]
    fn test_buffs_when_roll_allows() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let a = enemy(1, 80);
        let me = actor(100);
        let d = StrategicStrategy::new(0.3, 1.0)
            .choose_action(&me, &[&a], &moveset(), &mut rng)
            .unwrap();
        assert_eq!(d.action_index, 3);
        assert_eq!(d.target, me.id);
    }

    #[test]
    fn test_uses_cheapest_finisher() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        // 50 * 20 / 10 * 0.85 = 85 >= 60, so the weaker attack finishes
        let a = enemy(1, 60);
        let d = StrategicStrategy::new(0.3, 0.0)
            .choose_action(&actor(100), &[&a], &moveset(), &mut rng)
            .unwrap();
        assert_eq!(d.action_index, 0);
    }

    #[test]
    fn test_skips_moves_that_cannot_finish() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        // 85 < 100 rules out the basic attack; 90 * 2 * 0.85 = 153 does not
        let a = enemy(1, 100);
        let d = StrategicStrategy::new(0.3, 0.0)
            .choose_action(&actor(100), &[&a], &moveset(), &mut rng)
            .unwrap();
        assert_eq!(d.action_index, 4);
    }

    #[test]
    fn test_finisher_follows_configured_variance() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        // 100 base: finishes 85 HP at a 0.9 spread but not at 0.5
        let a = enemy(1, 85);
        let steady = BattleConfig {
            damage_variance_min: 0.9,
            ..BattleConfig::default()
        };
        let wild = BattleConfig {
            damage_variance_min: 0.5,
            ..BattleConfig::default()
        };

        let d = StrategicStrategy::new(0.3, 0.0)
            .with_config(&steady)
            .choose_action(&actor(100), &[&a], &moveset(), &mut rng)
            .unwrap();
        assert_eq!(d.action_index, 0);

        let d = StrategicStrategy::new(0.3, 0.0)
            .with_config(&wild)
            .choose_action(&actor(100), &[&a], &moveset(), &mut rng)
            .unwrap();
        assert_eq!(d.action_index, 4);
    }

    #[test]
    fn test_falls_back_to_strongest() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut a = enemy(1, 100);
        a.defense = 100;
        let d = StrategicStrategy::new(0.3, 0.0)
            .choose_action(&actor(100), &[&a], &moveset(), &mut rng)
            .unwrap();
        assert_eq!(d.action_index, 4);
    }
}
