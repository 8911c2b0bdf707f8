use rand::distributions::{Distribution, WeightedIndex};
use rand::RngCore;

use crate::battle::action::{ActionType, BattleAction};
use crate::battle::ai::{weakest_target, AiDecision, AiStrategy};
use crate::battle::combatant::Combatant;

/// Weight for moves that deal no damage
const NON_DAMAGE_WEIGHT: u64 = 1;

/// Favors hard-hitting moves against the most wounded enemy
///
/// Damage moves are weighted by power, so strong attacks dominate but
/// weaker ones still show up now and then.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggressiveStrategy;

impl AiStrategy for AggressiveStrategy {
    fn choose_action(
        &self,
        _actor: &Combatant,
        valid_targets: &[&Combatant],
        moves: &[BattleAction],
        rng: &mut dyn RngCore,
    ) -> Option<AiDecision> {
        let target = weakest_target(valid_targets)?;
        // Summed as u64; power comes straight from setup files
        let weights: Vec<u64> = moves
            .iter()
            .map(|m| match m.action_type {
                ActionType::Damage => u64::from(m.power.max(1)) * 10,
                _ => NON_DAMAGE_WEIGHT,
            })
            .collect();
        let dist = WeightedIndex::new(&weights).ok()?;
        Some(AiDecision {
            action_index: dist.sample(rng),
            target,
        })
    }

    fn name(&self) -> &'static str {
        "aggressive"
    }
}
