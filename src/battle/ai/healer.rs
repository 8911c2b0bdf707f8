use rand::seq::SliceRandom;
use rand::RngCore;

use crate::battle::action::{ActionType, BattleAction};
use crate::battle::ai::{first_move_of, strongest_damage_move, weakest_target, AiDecision, AiStrategy};
use crate::battle::combatant::Combatant;

/// Heals itself below an HP threshold, otherwise attacks
#[derive(Debug, Clone, Copy)]
pub struct HealerStrategy {
    /// HP ratio (0..1) under which healing takes priority
    pub threshold: f32,
}

impl HealerStrategy {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }
}

impl Default for HealerStrategy {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl AiStrategy for HealerStrategy {
    fn choose_action(
        &self,
        actor: &Combatant,
        valid_targets: &[&Combatant],
        moves: &[BattleAction],
        rng: &mut dyn RngCore,
    ) -> Option<AiDecision> {
        if actor.hp_ratio() < self.threshold {
            if let Some(action_index) = first_move_of(moves, ActionType::Heal) {
                return Some(AiDecision {
                    action_index,
                    target: actor.id,
                });
            }
        }

        let target = weakest_target(valid_targets)?;
        let action_index = match strongest_damage_move(moves) {
            Some(index) => index,
            None => {
                let indices: Vec<usize> = (0..moves.len()).collect();
                *indices.choose(rng)?
            }
        };
        Some(AiDecision {
            action_index,
            target,
        })
    }

    fn name(&self) -> &'static str {
        "healer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ai::test_support::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_heals_when_low() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let me = actor(30);
        let a = enemy(1, 80);
        let d = HealerStrategy::new(0.5)
            .choose_action(&me, &[&a], &moveset(), &mut rng)
            .unwrap();
        assert_eq!(d.action_index, 1);
        assert_eq!(d.target, me.id);
    }

    #[test]
    fn test_attacks_when_healthy() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let a = enemy(1, 80);
        let b = enemy(2, 20);
        let d = HealerStrategy::default()
            .choose_action(&actor(90), &[&a, &b], &moveset(), &mut rng)
            .unwrap();
        assert_eq!(d.action_index, 4);
        assert_eq!(d.target, b.id);
    }

    #[test]
    fn test_low_without_heal_still_attacks() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let a = enemy(1, 80);
        let moves = vec![BattleAction::basic_attack()];
        let d = HealerStrategy::default()
            .choose_action(&actor(10), &[&a], &moves, &mut rng)
            .unwrap();
        assert_eq!(d.action_index, 0);
        assert_eq!(d.target, a.id);
    }
}
