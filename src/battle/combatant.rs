//! Combatants and their status/effect state machine
//!
//! A combatant owns its HP, base stats and three transient states: a defend
//! window, an attack buff and at most one multi-turn charge. Every mutator
//! records what happened in the supplied [`BattleEventLog`].

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::action::{BattleAction, ChargeTurnBehavior};
use crate::battle::ai::AiStrategy;
use crate::battle::events::{BattleEventLog, CombatantEventKind};
use crate::core::config::BattleConfig;
use crate::core::ratio::ratio_round;
use crate::core::types::{CombatantId, Team};

/// Base stats supplied at setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantStats {
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
}

impl CombatantStats {
    pub fn new(max_hp: u32, attack: u32, defense: u32, speed: u32) -> Self {
        Self {
            max_hp,
            attack,
            defense,
            speed,
        }
    }
}

/// Active defend window. Only exists while `turns_remaining > 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefendState {
    pub turns_remaining: u32,
    /// Fraction of incoming damage that still lands
    pub damage_reduction: f32,
    pub counter_chance: f32,
    pub counter_multiplier: f32,
}

/// Active attack buff. Only exists while `turns_remaining > 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackBuffState {
    pub turns_remaining: u32,
    pub multiplier: f32,
    pub original_attack: u32,
}

/// A counter owed to `against`, resolved the next time they target us
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingCounter {
    pub against: CombatantId,
    pub multiplier: f32,
}

/// In-flight multi-turn action
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeState {
    pub action: BattleAction,
    pub target: CombatantId,
    pub turns_remaining: u32,
    pub defense_buff_applied: bool,
    pub speed_debuff_applied: bool,
    defense_bonus: u32,
    speed_penalty: u32,
}

/// A battle participant
#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub team: Team,
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
    pub actions: Vec<BattleAction>,
    pub ai: Option<Arc<dyn AiStrategy>>,
    current_hp: u32,
    defend: Option<DefendState>,
    attack_buff: Option<AttackBuffState>,
    charge: Option<ChargeState>,
    pending_counter: Option<PendingCounter>,
}

impl Combatant {
    /// Create a combatant at full HP. The id is assigned by the roster.
    pub fn new(name: impl Into<String>, team: Team, stats: CombatantStats) -> Self {
        Self {
            id: CombatantId(0),
            name: name.into(),
            team,
            max_hp: stats.max_hp,
            attack: stats.attack,
            defense: stats.defense,
            speed: stats.speed,
            actions: Vec::new(),
            ai: None,
            current_hp: stats.max_hp,
            defend: None,
            attack_buff: None,
            charge: None,
            pending_counter: None,
        }
    }

    pub fn with_actions(mut self, actions: Vec<BattleAction>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_ai(mut self, ai: Arc<dyn AiStrategy>) -> Self {
        self.ai = Some(ai);
        self
    }

    /// Start below full HP (clamped to max)
    pub fn with_current_hp(mut self, hp: u32) -> Self {
        self.current_hp = hp.min(self.max_hp);
        self
    }

    pub fn current_hp(&self) -> u32 {
        self.current_hp
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp == 0 {
            return 0.0;
        }
        self.current_hp as f32 / self.max_hp as f32
    }

    /// Player team members without an AI strategy wait for external input
    pub fn is_player_controlled(&self) -> bool {
        self.team == Team::Player && self.ai.is_none()
    }

    pub fn is_defending(&self) -> bool {
        self.defend.is_some()
    }

    pub fn defend_state(&self) -> Option<&DefendState> {
        self.defend.as_ref()
    }

    pub fn is_attack_buffed(&self) -> bool {
        self.attack_buff.is_some()
    }

    pub fn attack_buff_state(&self) -> Option<&AttackBuffState> {
        self.attack_buff.as_ref()
    }

    pub fn is_charging(&self) -> bool {
        self.charge.is_some()
    }

    pub fn charge_state(&self) -> Option<&ChargeState> {
        self.charge.as_ref()
    }

    pub fn pending_counter(&self) -> Option<&PendingCounter> {
        self.pending_counter.as_ref()
    }

    /// Take the owed counter if it is owed to `attacker`
    pub fn take_pending_counter(&mut self, attacker: CombatantId) -> Option<PendingCounter> {
        match self.pending_counter {
            Some(counter) if counter.against == attacker => self.pending_counter.take(),
            _ => None,
        }
    }

    /// Moves usable this turn
    pub fn available_actions(&self) -> &[BattleAction] {
        &self.actions
    }

    // === DAMAGE & HEALING ===

    /// Apply incoming damage and roll for a delayed counter
    ///
    /// Returns the damage that landed after defend mitigation.
    pub fn take_damage<R: Rng + ?Sized>(
        &mut self,
        amount: u32,
        attacker: Option<CombatantId>,
        is_critical: bool,
        rng: &mut R,
        log: &mut BattleEventLog,
    ) -> u32 {
        if !self.is_alive() {
            return 0;
        }

        let defend = self.defend;
        let applied = self.apply_damage(amount, is_critical, log);

        if let (Some(defend), Some(attacker)) = (defend, attacker) {
            // One owed counter at a time; it holds until that attacker returns
            if self.is_alive()
                && self.pending_counter.is_none()
                && rng.gen::<f32>() < defend.counter_chance
            {
                self.pending_counter = Some(PendingCounter {
                    against: attacker,
                    multiplier: defend.counter_multiplier,
                });
                log.combatant(
                    self.id,
                    CombatantEventKind::CounterPrepared,
                    0,
                    format!("{} prepares a counter attack!", self.name),
                );
            }
        }

        applied
    }

    /// Mitigate, subtract and handle death. No counter roll.
    fn apply_damage(&mut self, amount: u32, is_critical: bool, log: &mut BattleEventLog) -> u32 {
        let applied = match self.defend {
            Some(defend) => ratio_round(defend.damage_reduction, amount).max(1),
            None => amount.max(1),
        };

        let before = self.current_hp;
        self.current_hp = self.current_hp.saturating_sub(applied);

        let (kind, message) = if is_critical {
            (
                CombatantEventKind::CriticalTaken,
                format!("Critical hit! {} takes {} damage", self.name, applied),
            )
        } else {
            (
                CombatantEventKind::DamageTaken,
                format!("{} takes {} damage", self.name, applied),
            )
        };
        log.combatant(self.id, kind, applied, message);

        if before > 0 && self.current_hp == 0 {
            self.die(log);
        }

        applied
    }

    fn die(&mut self, log: &mut BattleEventLog) {
        self.cancel_multi_turn_action(log);
        self.end_defend(log);
        self.remove_attack_buff(log);
        log.combatant(
            self.id,
            CombatantEventKind::Died,
            0,
            format!("{} has fallen!", self.name),
        );
    }

    /// Restore HP up to max. The dead are not revived.
    ///
    /// Returns the HP actually restored.
    pub fn heal(&mut self, amount: u32, log: &mut BattleEventLog) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        let before = self.current_hp;
        self.current_hp = self.current_hp.saturating_add(amount).min(self.max_hp);
        let healed = self.current_hp - before;
        log.combatant(
            self.id,
            CombatantEventKind::Healed,
            healed,
            format!("{} recovers {} HP", self.name, healed),
        );
        healed
    }

    // === DEFEND ===

    pub fn start_defend(&mut self, action: &BattleAction, log: &mut BattleEventLog) {
        let duration = action.defend_duration.max(1);
        self.defend = Some(DefendState {
            turns_remaining: duration,
            damage_reduction: action.damage_reduction.clamp(0.0, 1.0),
            counter_chance: action.counter_chance.clamp(0.0, 1.0),
            counter_multiplier: action.counter_multiplier,
        });
        log.combatant(
            self.id,
            CombatantEventKind::DefendStarted,
            duration,
            format!("{} takes a defensive stance", self.name),
        );

        if let Some(buff) = action.defend_attack_buff {
            self.apply_attack_buff(buff.multiplier, buff.duration, log);
        }
    }

    pub fn end_defend(&mut self, log: &mut BattleEventLog) {
        if self.defend.take().is_some() {
            log.combatant(
                self.id,
                CombatantEventKind::DefendEnded,
                0,
                format!("{} lowers their guard", self.name),
            );
        }
    }

    // === ATTACK BUFF ===

    /// Multiply attack in place for `duration` elapsed turns
    ///
    /// A second buff stacks on the current attack; the original value from
    /// the first buff is kept for restoration and the longer duration wins.
    pub fn apply_attack_buff(&mut self, multiplier: f32, duration: u32, log: &mut BattleEventLog) {
        if duration == 0 {
            return;
        }
        let original_attack = self
            .attack_buff
            .map_or(self.attack, |b| b.original_attack);
        let turns_remaining = self
            .attack_buff
            .map_or(duration, |b| b.turns_remaining.max(duration));

        let boosted = ratio_round(multiplier, self.attack).max(1);
        let gained = boosted.saturating_sub(self.attack);
        self.attack = boosted;
        self.attack_buff = Some(AttackBuffState {
            turns_remaining,
            multiplier,
            original_attack,
        });
        log.combatant(
            self.id,
            CombatantEventKind::AttackBuffApplied,
            gained,
            format!("{}'s attack rises to {}", self.name, self.attack),
        );
    }

    pub fn remove_attack_buff(&mut self, log: &mut BattleEventLog) {
        if let Some(buff) = self.attack_buff.take() {
            self.attack = buff.original_attack;
            log.combatant(
                self.id,
                CombatantEventKind::AttackBuffEnded,
                0,
                format!("{}'s attack returns to {}", self.name, self.attack),
            );
        }
    }

    /// One elapsed battle turn: count down defend and attack buff
    pub fn tick_status_effects(&mut self, log: &mut BattleEventLog) {
        if let Some(defend) = self.defend.as_mut() {
            defend.turns_remaining -= 1;
            if defend.turns_remaining == 0 {
                self.end_defend(log);
            }
        }
        if let Some(buff) = self.attack_buff.as_mut() {
            buff.turns_remaining -= 1;
            if buff.turns_remaining == 0 {
                self.remove_attack_buff(log);
            }
        }
    }

    /// Compound percent changes onto the current stats
    ///
    /// `sign` is +1.0 for buffs and -1.0 for debuffs. Stats never drop below 1.
    pub fn apply_stat_modifiers(
        &mut self,
        attack_pct: f32,
        defense_pct: f32,
        speed_pct: f32,
        sign: f32,
        log: &mut BattleEventLog,
    ) {
        self.attack = modified_stat(self.attack, attack_pct, sign);
        self.defense = modified_stat(self.defense, defense_pct, sign);
        self.speed = modified_stat(self.speed, speed_pct, sign);
        log.combatant(
            self.id,
            CombatantEventKind::StatChanged,
            0,
            format!(
                "{} now has ATK {} / DEF {} / SPD {}",
                self.name, self.attack, self.defense, self.speed
            ),
        );
    }

    // === MULTI-TURN CHARGE ===

    /// Begin charging `action` at `target`. Replaces any charge in flight.
    pub fn start_multi_turn_action(
        &mut self,
        action: &BattleAction,
        target: CombatantId,
        log: &mut BattleEventLog,
    ) {
        self.cancel_multi_turn_action(log);
        let turns_remaining = action.turn_cost.saturating_sub(1);
        self.charge = Some(ChargeState {
            action: action.clone(),
            target,
            turns_remaining,
            defense_buff_applied: false,
            speed_debuff_applied: false,
            defense_bonus: 0,
            speed_penalty: 0,
        });
        let message = if action.charge_message.is_empty() {
            format!("{} begins charging {}", self.name, action.name)
        } else {
            format!("{} {}", self.name, action.charge_message)
        };
        log.combatant(self.id, CombatantEventKind::ChargeStarted, turns_remaining, message);
    }

    /// Progress the charge by one turn. Returns true once it is ready.
    pub fn advance_multi_turn_action(
        &mut self,
        config: &BattleConfig,
        log: &mut BattleEventLog,
    ) -> bool {
        let Some(behavior) = self.charge.as_ref().map(|c| c.action.charge_behavior) else {
            return false;
        };

        match behavior {
            ChargeTurnBehavior::ApplyDefenseBuff => {
                let bonus = ratio_round(config.charge_defense_boost, self.defense).max(1);
                if let Some(charge) = self.charge.as_mut() {
                    if !charge.defense_buff_applied {
                        charge.defense_buff_applied = true;
                        charge.defense_bonus = bonus;
                        self.defense += bonus;
                    }
                }
            }
            ChargeTurnBehavior::ApplySpeedDebuff => {
                let penalty = ratio_round(config.charge_speed_penalty, self.speed)
                    .min(self.speed.saturating_sub(1));
                if let Some(charge) = self.charge.as_mut() {
                    if !charge.speed_debuff_applied {
                        charge.speed_debuff_applied = true;
                        charge.speed_penalty = penalty;
                        self.speed -= penalty;
                    }
                }
            }
            ChargeTurnBehavior::TakeDamage => {
                let recoil = (self.max_hp / config.charge_self_damage_divisor).max(1);
                self.apply_damage(recoil, false, log);
            }
            ChargeTurnBehavior::None => {}
        }

        // Recoil can kill, which cancels the charge
        let Some(charge) = self.charge.as_mut() else {
            return false;
        };
        charge.turns_remaining = charge.turns_remaining.saturating_sub(1);
        let remaining = charge.turns_remaining;
        let action_name = charge.action.name.clone();
        log.combatant(
            self.id,
            CombatantEventKind::ChargeProgressing,
            remaining,
            format!("{} is charging {} ({} turns left)", self.name, action_name, remaining),
        );
        remaining == 0
    }

    /// Finish the charge, undo its side effects and hand back what to resolve
    pub fn complete_multi_turn_action(&mut self, log: &mut BattleEventLog) -> Option<ChargeState> {
        let charge = self.charge.take()?;
        self.undo_charge_effects(&charge);
        log.combatant(
            self.id,
            CombatantEventKind::ChargeComplete,
            0,
            format!("{} unleashes {}!", self.name, charge.action.name),
        );
        Some(charge)
    }

    pub fn cancel_multi_turn_action(&mut self, log: &mut BattleEventLog) {
        if let Some(charge) = self.charge.take() {
            self.undo_charge_effects(&charge);
            log.combatant(
                self.id,
                CombatantEventKind::ChargeCancelled,
                0,
                format!("{}'s {} was interrupted", self.name, charge.action.name),
            );
        }
    }

    fn undo_charge_effects(&mut self, charge: &ChargeState) {
        if charge.defense_buff_applied {
            self.defense = self.defense.saturating_sub(charge.defense_bonus).max(1);
        }
        if charge.speed_debuff_applied {
            self.speed += charge.speed_penalty;
        }
    }
}

fn modified_stat(value: u32, pct: f32, sign: f32) -> u32 {
    if pct == 0.0 {
        return value;
    }
    let delta = ratio_round(pct.abs() / 100.0, value);
    if (sign > 0.0) == (pct > 0.0) {
        value.saturating_add(delta).max(1)
    } else {
        value.saturating_sub(delta).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fighter() -> Combatant {
        Combatant::new("Knight", Team::Player, CombatantStats::new(100, 20, 10, 5))
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_damage_floors_at_zero_and_dies_once() {
        let mut c = fighter().with_current_hp(5);
        let mut log = BattleEventLog::new(1);
        let landed = c.take_damage(10, None, false, &mut rng(), &mut log);
        assert_eq!(landed, 10);
        assert_eq!(c.current_hp(), 0);
        assert!(!c.is_alive());

        c.take_damage(10, None, false, &mut rng(), &mut log);
        assert_eq!(log.combatant_events(CombatantEventKind::Died).len(), 1);
    }

    #[test]
    fn test_minimum_one_damage() {
        let mut c = fighter();
        let mut log = BattleEventLog::new(1);
        assert_eq!(c.take_damage(0, None, false, &mut rng(), &mut log), 1);
        assert_eq!(c.current_hp(), 99);
    }

    #[test]
    fn test_defend_mitigation_rounds() {
        let mut c = fighter();
        let mut log = BattleEventLog::new(1);
        let defend = BattleAction::defend().with_defend(2, 0.3, 0.0, 1.0);
        c.start_defend(&defend, &mut log);

        // 25 * 0.3 = 7.5 -> 8
        assert_eq!(c.take_damage(25, None, false, &mut rng(), &mut log), 8);
        // 1 * 0.3 rounds to 0 -> minimum 1
        assert_eq!(c.take_damage(1, None, false, &mut rng(), &mut log), 1);
    }

    proptest! {
        #[test]
        fn prop_defend_mitigation_is_exact_half_up(pct in 1u32..100, amount in 1u32..400) {
            let mut c = Combatant::new("Wall", Team::Player, CombatantStats::new(1_000, 10, 10, 5));
            let mut log = BattleEventLog::new(1);
            let defend = BattleAction::defend().with_defend(2, pct as f32 / 100.0, 0.0, 1.0);
            c.start_defend(&defend, &mut log);

            let expected = ((pct * amount + 50) / 100).max(1);
            prop_assert_eq!(c.take_damage(amount, None, false, &mut rng(), &mut log), expected);
        }
    }

    #[test]
    fn test_defend_mitigation_known_f32_traps() {
        // Products that land just under .5 in f32
        for (pct, amount, expected) in [(21, 150, 32), (26, 225, 59), (39, 150, 59), (42, 75, 32), (53, 50, 27)] {
            let mut c = Combatant::new("Wall", Team::Player, CombatantStats::new(1_000, 10, 10, 5));
            let mut log = BattleEventLog::new(1);
            c.start_defend(&BattleAction::defend().with_defend(2, pct as f32 / 100.0, 0.0, 1.0), &mut log);
            assert_eq!(c.take_damage(amount, None, false, &mut rng(), &mut log), expected);
        }
    }

    #[test]
    fn test_heal_caps_at_max_and_skips_dead() {
        let mut c = fighter().with_current_hp(90);
        let mut log = BattleEventLog::new(1);
        assert_eq!(c.heal(50, &mut log), 10);
        assert_eq!(c.current_hp(), 100);

        let mut dead = fighter().with_current_hp(0);
        assert_eq!(dead.heal(50, &mut log), 0);
        assert!(!dead.is_alive());
    }

    #[test]
    fn test_counter_prepared_once_until_consumed() {
        let mut c = fighter();
        let mut log = BattleEventLog::new(1);
        c.start_defend(&BattleAction::defend().with_defend(3, 0.5, 1.0, 1.5), &mut log);

        c.take_damage(10, Some(CombatantId(4)), false, &mut rng(), &mut log);
        c.take_damage(10, Some(CombatantId(4)), false, &mut rng(), &mut log);
        c.take_damage(10, Some(CombatantId(9)), false, &mut rng(), &mut log);
        assert_eq!(log.combatant_events(CombatantEventKind::CounterPrepared).len(), 1);

        let counter = c.pending_counter().copied().unwrap();
        assert_eq!(counter.against, CombatantId(4));
        assert_eq!(counter.multiplier, 1.5);

        assert!(c.take_pending_counter(CombatantId(9)).is_none());
        assert!(c.take_pending_counter(CombatantId(4)).is_some());
        assert!(c.pending_counter().is_none());
    }

    #[test]
    fn test_no_counter_without_defend() {
        let mut c = fighter();
        let mut log = BattleEventLog::new(1);
        c.take_damage(10, Some(CombatantId(4)), false, &mut rng(), &mut log);
        assert!(c.pending_counter().is_none());
    }

    #[test]
    fn test_defend_expires_after_duration_ticks() {
        let mut c = fighter();
        let mut log = BattleEventLog::new(1);
        c.start_defend(&BattleAction::defend().with_defend(2, 0.5, 0.0, 1.0), &mut log);
        c.tick_status_effects(&mut log);
        assert!(c.is_defending());
        c.tick_status_effects(&mut log);
        assert!(!c.is_defending());
        assert_eq!(log.combatant_events(CombatantEventKind::DefendEnded).len(), 1);
    }

    #[test]
    fn test_attack_buff_restores_exact_value() {
        let mut c = fighter();
        let mut log = BattleEventLog::new(1);
        c.apply_attack_buff(1.5, 3, &mut log);
        assert_eq!(c.attack, 30);
        c.apply_attack_buff(1.5, 1, &mut log);
        assert_eq!(c.attack, 45);
        assert_eq!(c.attack_buff_state().unwrap().turns_remaining, 3);

        for _ in 0..3 {
            c.tick_status_effects(&mut log);
        }
        assert!(!c.is_attack_buffed());
        assert_eq!(c.attack, 20);
    }

    #[test]
    fn test_defend_can_grant_attack_buff() {
        let mut c = fighter();
        let mut log = BattleEventLog::new(1);
        let action = BattleAction::defend().with_defend_attack_buff(2.0, 2);
        c.start_defend(&action, &mut log);
        assert!(c.is_defending());
        assert_eq!(c.attack, 40);
    }

    #[test]
    fn test_stat_modifiers_compound() {
        let mut c = fighter();
        let mut log = BattleEventLog::new(1);
        c.apply_stat_modifiers(50.0, 0.0, 0.0, 1.0, &mut log);
        assert_eq!(c.attack, 30);
        c.apply_stat_modifiers(50.0, 0.0, 0.0, 1.0, &mut log);
        assert_eq!(c.attack, 45);

        c.apply_stat_modifiers(0.0, 200.0, 0.0, -1.0, &mut log);
        assert_eq!(c.defense, 1);
    }

    #[test]
    fn test_death_clears_status() {
        let mut c = fighter().with_current_hp(5);
        let mut log = BattleEventLog::new(1);
        c.start_defend(&BattleAction::defend(), &mut log);
        c.apply_attack_buff(2.0, 3, &mut log);
        c.start_multi_turn_action(&BattleAction::charged_strike(), CombatantId(1), &mut log);

        c.take_damage(100, None, false, &mut rng(), &mut log);
        assert!(!c.is_defending());
        assert!(!c.is_attack_buffed());
        assert!(!c.is_charging());
        assert_eq!(c.attack, 20);
        assert_eq!(log.combatant_events(CombatantEventKind::ChargeCancelled).len(), 1);
    }

    #[test]
    fn test_charge_defense_buff_applies_once() {
        let config = BattleConfig::default();
        let mut c = fighter();
        let mut log = BattleEventLog::new(1);
        c.start_multi_turn_action(&BattleAction::charged_strike(), CombatantId(1), &mut log);
        assert_eq!(c.charge_state().unwrap().turns_remaining, 2);

        assert!(!c.advance_multi_turn_action(&config, &mut log));
        assert_eq!(c.defense, 15);
        assert!(c.advance_multi_turn_action(&config, &mut log));
        assert_eq!(c.defense, 15);

        let charge = c.complete_multi_turn_action(&mut log).unwrap();
        assert_eq!(charge.target, CombatantId(1));
        assert_eq!(c.defense, 10);
        assert!(!c.is_charging());
    }

    #[test]
    fn test_charge_speed_debuff_restored_on_cancel() {
        let config = BattleConfig::default();
        let mut c = fighter();
        let mut log = BattleEventLog::new(1);
        let action = BattleAction::basic_attack().with_charge(3, ChargeTurnBehavior::ApplySpeedDebuff, "");
        c.start_multi_turn_action(&action, CombatantId(1), &mut log);
        c.advance_multi_turn_action(&config, &mut log);
        assert_eq!(c.speed, 2);
        c.cancel_multi_turn_action(&mut log);
        assert_eq!(c.speed, 5);
    }

    #[test]
    fn test_charge_recoil_every_tick() {
        let config = BattleConfig::default();
        let mut c = fighter();
        let mut log = BattleEventLog::new(1);
        let action = BattleAction::basic_attack().with_charge(3, ChargeTurnBehavior::TakeDamage, "");
        c.start_multi_turn_action(&action, CombatantId(1), &mut log);
        c.advance_multi_turn_action(&config, &mut log);
        c.advance_multi_turn_action(&config, &mut log);
        assert_eq!(c.current_hp(), 90);
    }

    #[test]
    fn test_lethal_recoil_cancels_charge() {
        let config = BattleConfig::default();
        let mut c = fighter().with_current_hp(3);
        let mut log = BattleEventLog::new(1);
        let action = BattleAction::basic_attack().with_charge(2, ChargeTurnBehavior::TakeDamage, "");
        c.start_multi_turn_action(&action, CombatantId(1), &mut log);
        assert!(!c.advance_multi_turn_action(&config, &mut log));
        assert!(!c.is_alive());
        assert!(!c.is_charging());
    }

    #[test]
    fn test_advance_without_charge_is_not_ready() {
        let mut c = fighter();
        let mut log = BattleEventLog::new(1);
        assert!(!c.advance_multi_turn_action(&BattleConfig::default(), &mut log));
        assert!(c.complete_multi_turn_action(&mut log).is_none());
    }
}
