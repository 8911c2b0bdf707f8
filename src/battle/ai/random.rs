use rand::seq::SliceRandom;
use rand::Rng;
use rand::RngCore;

use crate::battle::action::BattleAction;
use crate::battle::ai::{AiDecision, AiStrategy};
use crate::battle::combatant::Combatant;

/// Uniformly random move and target
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomStrategy;

impl AiStrategy for RandomStrategy {
    fn choose_action(
        &self,
        _actor: &Combatant,
        valid_targets: &[&Combatant],
        moves: &[BattleAction],
        rng: &mut dyn RngCore,
    ) -> Option<AiDecision> {
        if moves.is_empty() {
            return None;
        }
        let action_index = rng.gen_range(0..moves.len());
        let target = valid_targets.choose(rng)?.id;
        Some(AiDecision {
            action_index,
            target,
        })
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
