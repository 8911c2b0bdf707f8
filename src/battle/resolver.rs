//! Move resolution
//!
//! Given a command (actor, action, primary target) and the roster, produces
//! one `BattleResult` per affected target. The resolver keeps no state
//! between calls; everything it changes lives on the combatants.

use rand::Rng;
use serde::Serialize;

use crate::battle::action::{ActionTargetType, ActionType, BattleAction};
use crate::battle::events::BattleEventLog;
use crate::battle::roster::Roster;
use crate::core::config::BattleConfig;
use crate::core::error::{BattleError, Result};
use crate::core::ratio::{ratio_ceil, ratio_floor, ratio_round};
use crate::core::types::{CombatantId, Team};

/// One (actor, action, primary target) attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleCommand {
    pub actor: CombatantId,
    pub action: BattleAction,
    pub target: Option<CombatantId>,
}

impl BattleCommand {
    pub fn new(actor: CombatantId, action: BattleAction, target: Option<CombatantId>) -> Self {
        Self {
            actor,
            action,
            target,
        }
    }

    /// Build a command, checking that every id names a roster member
    pub fn validated(
        roster: &Roster,
        actor: CombatantId,
        action: BattleAction,
        target: Option<CombatantId>,
    ) -> Result<Self> {
        roster.require(actor)?;
        if let Some(target) = target {
            roster.require(target)?;
        }
        if action.name.trim().is_empty() {
            return Err(BattleError::InvalidCommand("action has no name".into()));
        }
        Ok(Self::new(actor, action, target))
    }
}

/// Outcome of a command against one target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleResult {
    pub actor: CombatantId,
    pub target: Option<CombatantId>,
    pub action: String,
    pub message: String,
    pub damage_dealt: u32,
    pub healing_done: u32,
    pub critical_hit: bool,
    pub missed: bool,
    pub success: bool,
    pub crit_chance: f32,
    pub charge_multiplier: f32,
}

impl BattleResult {
    fn base(actor: CombatantId, target: Option<CombatantId>, action: &str) -> Self {
        Self {
            actor,
            target,
            action: action.to_string(),
            message: String::new(),
            damage_dealt: 0,
            healing_done: 0,
            critical_hit: false,
            missed: false,
            success: true,
            crit_chance: 0.0,
            charge_multiplier: 1.0,
        }
    }

    fn failure(
        actor: CombatantId,
        target: Option<CombatantId>,
        action: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Self::base(actor, target, action)
        }
    }
}

/// Stateless move calculator
#[derive(Debug, Clone, Default)]
pub struct MoveResolver {
    config: BattleConfig,
}

impl MoveResolver {
    pub fn new(config: BattleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Resolve a command against the roster
    ///
    /// Validation failures come back as a single unsuccessful result. An
    /// `Err` means the command named a combatant the roster does not have.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        command: &BattleCommand,
        roster: &mut Roster,
        rng: &mut R,
        log: &mut BattleEventLog,
    ) -> Result<Vec<BattleResult>> {
        self.resolve_with_multiplier(command, None, roster, rng, log)
    }

    /// Resolve a completed multi-turn action, scaling its effect
    pub fn resolve_charged<R: Rng + ?Sized>(
        &self,
        command: &BattleCommand,
        charge_multiplier: f32,
        roster: &mut Roster,
        rng: &mut R,
        log: &mut BattleEventLog,
    ) -> Result<Vec<BattleResult>> {
        self.resolve_with_multiplier(command, Some(charge_multiplier), roster, rng, log)
    }

    fn resolve_with_multiplier<R: Rng + ?Sized>(
        &self,
        command: &BattleCommand,
        charge_multiplier: Option<f32>,
        roster: &mut Roster,
        rng: &mut R,
        log: &mut BattleEventLog,
    ) -> Result<Vec<BattleResult>> {
        let action = &command.action;

        // Step 1: the actor must exist and be standing
        let Some(actor) = roster.get(command.actor) else {
            return Ok(vec![BattleResult::failure(
                command.actor,
                command.target,
                &action.name,
                "No actor for command",
            )]);
        };
        if !actor.is_alive() {
            let message = format!("{} is unable to act", actor.name);
            return Ok(vec![BattleResult::failure(
                command.actor,
                command.target,
                &action.name,
                message,
            )]);
        }
        let actor_name = actor.name.clone();
        let actor_team = actor.team;

        // Step 2: defend needs no target
        if action.action_type == ActionType::Defend {
            roster.require_mut(command.actor)?.start_defend(action, log);
            let mut result = BattleResult::base(command.actor, Some(command.actor), &action.name);
            result.message = format!("{} is defending", actor_name);
            return Ok(vec![result]);
        }

        // Step 3: single-target actions need a living primary target
        let needs_target = !action.target_self
            && !action.target_type.is_area()
            && action.target_type != ActionTargetType::SelfOnly;
        if needs_target {
            let Some(target_id) = command.target else {
                return Ok(vec![BattleResult::failure(
                    command.actor,
                    None,
                    &action.name,
                    format!("{} has no target for {}", actor_name, action.name),
                )]);
            };
            let target = roster.require(target_id)?;
            if !target.is_alive() {
                let message = format!("{} is already defeated", target.name);
                return Ok(vec![BattleResult::failure(
                    command.actor,
                    Some(target_id),
                    &action.name,
                    message,
                )]);
            }
        }

        let mut results = Vec::new();

        // Step 4: a counter owed by the target fires before this command
        if let Some(target_id) = command.target.filter(|t| *t != command.actor) {
            if roster.is_alive(target_id) {
                let owed = roster.require_mut(target_id)?.take_pending_counter(command.actor);
                if let Some(counter) = owed {
                    let counter_power =
                        ratio_round(counter.multiplier, roster.require(target_id)?.attack);
                    let counter_action = BattleAction::new("Counter Attack", ActionType::Damage)
                        .with_power(counter_power)
                        .with_accuracy(1.0);
                    let counter_result = self.apply_damage(
                        target_id,
                        command.actor,
                        &counter_action,
                        None,
                        roster,
                        rng,
                        log,
                    )?;
                    tracing::debug!(
                        "Counter attack by {:?} on {:?} for {}",
                        target_id,
                        command.actor,
                        counter_result.damage_dealt
                    );
                    results.push(counter_result);

                    if !roster.is_alive(command.actor) {
                        return Ok(results);
                    }
                }
            }
        }

        // Step 5: accuracy
        if rng.gen::<f32>() > action.accuracy {
            let mut missed = BattleResult::failure(
                command.actor,
                command.target,
                &action.name,
                format!("{}'s {} missed!", actor_name, action.name),
            );
            missed.missed = true;
            results.push(missed);
            return Ok(results);
        }

        // Step 6: expand and apply per target
        let targets = self.expand_targets(command, actor_team, roster);
        if targets.is_empty() {
            results.push(BattleResult::failure(
                command.actor,
                command.target,
                &action.name,
                format!("{} has no valid targets for {}", actor_name, action.name),
            ));
            return Ok(results);
        }

        for target_id in targets {
            let result = match action.action_type {
                ActionType::Damage => self.apply_damage(
                    command.actor,
                    target_id,
                    action,
                    charge_multiplier,
                    roster,
                    rng,
                    log,
                )?,
                ActionType::Heal => {
                    self.apply_heal(command.actor, target_id, action, charge_multiplier, roster, log)?
                }
                ActionType::Buff | ActionType::Debuff => {
                    self.apply_modifiers(command.actor, target_id, action, roster, log)?
                }
                ActionType::Item => {
                    let target_name = &roster.require(target_id)?.name;
                    let mut result = BattleResult::base(command.actor, Some(target_id), &action.name);
                    result.message = format!("{} uses {} on {}", actor_name, action.name, target_name);
                    result
                }
                ActionType::Defend => unreachable!("defend resolves before target expansion"),
            };
            tracing::debug!("{}", result.message);
            results.push(result);
        }

        Ok(results)
    }

    /// Targets an action affects, relative to the actor's team
    pub fn expand_targets(
        &self,
        command: &BattleCommand,
        actor_team: Team,
        roster: &Roster,
    ) -> Vec<CombatantId> {
        let action = &command.action;
        if action.target_self || action.target_type == ActionTargetType::SelfOnly {
            return vec![command.actor];
        }

        let team = match action.target_type {
            ActionTargetType::SingleEnemy | ActionTargetType::AllEnemies => actor_team.opponent(),
            ActionTargetType::SingleAlly | ActionTargetType::AllAllies => Some(actor_team),
            ActionTargetType::SelfOnly => None,
        };
        let Some(team) = team else {
            return Vec::new();
        };
        let candidates = roster.alive_in_team(team);

        if action.target_type.is_area() {
            return candidates;
        }

        // Single target: the primary target if it fits, else the first candidate
        match command.target {
            Some(primary) if candidates.contains(&primary) => vec![primary],
            _ => candidates.into_iter().take(1).collect(),
        }
    }

    /// Crit chance for an actor's team using `action`
    pub fn crit_chance(&self, action: &BattleAction, team: Team) -> f32 {
        ((self.config.base_crit_chance + action.crit_chance) * self.config.crit_modifier(team))
            .clamp(0.0, 1.0)
    }

    /// Damage before variance: power * (attack * multiplier) / max(1, defense)
    pub fn base_damage(action: &BattleAction, attack: u32, defense: u32) -> f32 {
        action.power as f32 * (attack as f32 * action.stat_multiplier) / defense.max(1) as f32
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_damage<R: Rng + ?Sized>(
        &self,
        attacker_id: CombatantId,
        target_id: CombatantId,
        action: &BattleAction,
        charge_multiplier: Option<f32>,
        roster: &mut Roster,
        rng: &mut R,
        log: &mut BattleEventLog,
    ) -> Result<BattleResult> {
        let attacker = roster.require(attacker_id)?;
        let (attack, team, attacker_name) = (attacker.attack, attacker.team, attacker.name.clone());
        let defense = roster.require(target_id)?.defense;

        let variance = rng.gen_range(self.config.damage_variance_min..=self.config.damage_variance_max);
        let mut damage =
            ((Self::base_damage(action, attack, defense) * variance).floor() as u32).max(1);

        if let Some(multiplier) = charge_multiplier {
            damage = ratio_floor(multiplier, damage).max(1);
        }

        let crit_chance = self.crit_chance(action, team);
        let critical = rng.gen::<f32>() < crit_chance;
        if critical {
            damage = ratio_floor(self.config.crit_multiplier, damage);
        }

        let target = roster.require_mut(target_id)?;
        let landed = target.take_damage(damage, Some(attacker_id), critical, rng, log);

        let mut result = BattleResult::base(attacker_id, Some(target_id), &action.name);
        result.damage_dealt = landed;
        result.critical_hit = critical;
        result.crit_chance = crit_chance;
        result.charge_multiplier = charge_multiplier.unwrap_or(1.0);
        result.message = if critical {
            format!(
                "{}'s {} critically hits {} for {} damage!",
                attacker_name, action.name, target.name, landed
            )
        } else {
            format!(
                "{}'s {} hits {} for {} damage",
                attacker_name, action.name, target.name, landed
            )
        };
        Ok(result)
    }

    fn apply_heal(
        &self,
        healer_id: CombatantId,
        target_id: CombatantId,
        action: &BattleAction,
        charge_multiplier: Option<f32>,
        roster: &mut Roster,
        log: &mut BattleEventLog,
    ) -> Result<BattleResult> {
        let healer = roster.require(healer_id)?;
        let healer_name = healer.name.clone();
        let mut amount = self.heal_amount(healer.max_hp, healer.attack);
        if let Some(multiplier) = charge_multiplier {
            amount = ratio_floor(multiplier, amount);
        }

        let target = roster.require_mut(target_id)?;
        let healed = target.heal(amount, log);

        let mut result = BattleResult::base(healer_id, Some(target_id), &action.name);
        result.healing_done = healed;
        result.charge_multiplier = charge_multiplier.unwrap_or(1.0);
        result.message = format!(
            "{}'s {} restores {} HP to {}",
            healer_name, action.name, healed, target.name
        );
        Ok(result)
    }

    /// ceil(ratio * max_hp) + round(ratio * attack)
    pub fn heal_amount(&self, max_hp: u32, attack: u32) -> u32 {
        ratio_ceil(self.config.heal_max_hp_ratio, max_hp)
            .saturating_add(ratio_round(self.config.heal_attack_ratio, attack))
    }

    fn apply_modifiers(
        &self,
        actor_id: CombatantId,
        target_id: CombatantId,
        action: &BattleAction,
        roster: &mut Roster,
        log: &mut BattleEventLog,
    ) -> Result<BattleResult> {
        let actor_name = roster.require(actor_id)?.name.clone();
        let sign = if action.action_type == ActionType::Debuff {
            -1.0
        } else {
            1.0
        };

        let target = roster.require_mut(target_id)?;
        target.apply_stat_modifiers(
            action.attack_modifier,
            action.defense_modifier,
            action.speed_modifier,
            sign,
            log,
        );

        let verb = if sign > 0.0 { "strengthens" } else { "weakens" };
        let mut result = BattleResult::base(actor_id, Some(target_id), &action.name);
        result.message = format!("{}'s {} {} {}", actor_name, action.name, verb, target.name);
        Ok(result)
    }
}
