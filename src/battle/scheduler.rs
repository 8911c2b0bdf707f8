//! Battle scheduler: round queue, turn protocol and the player input gate
//!
//! Each step: build a round if the queue is empty -> pop the next actor ->
//! tick status effects -> charge / player gate / AI decision -> resolve ->
//! check for a wiped team.
//!
//! The player gate is the only suspension point. When a player-controlled
//! combatant is up, `step` returns `AwaitingInput` and the scheduler stays
//! parked until `submit_command`, `submit_response` or
//! `cancel_pending_input` is called.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::battle::action::BattleAction;
use crate::battle::events::{
    panic_message, BattleEvent, BattleEventLog, BattleEventType, BattleObserver, ObserverRegistry,
    SkipReason,
};
use crate::battle::prediction::predict_turn_order;
use crate::battle::resolver::{BattleCommand, MoveResolver};
use crate::battle::roster::Roster;
use crate::battle::turn_queue::build_round;
use crate::core::config::BattleConfig;
use crate::core::error::{BattleError, Result};
use crate::core::types::{BattleOutcome, CombatantId, InputTicket, Team, Turn};

/// What the player is being asked to choose from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputRequest {
    pub actor: CombatantId,
    pub moves: Vec<BattleAction>,
    pub targets: Vec<CombatantId>,
    pub ticket: InputTicket,
}

/// Legacy input: an action/target pair instead of a full command
///
/// Only its arrival matters. The move and target are drawn at random from
/// what the gate offered; the pair is kept for logging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputResponse {
    pub action: Option<String>,
    pub target: Option<CombatantId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerState {
    NotStarted,
    Running,
    AwaitingInput(InputRequest),
    Finished(BattleOutcome),
}

/// Result of one `step`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    TurnTaken(CombatantId),
    TurnSkipped(CombatantId),
    AwaitingInput(InputTicket),
    Finished(BattleOutcome),
}

pub struct BattleScheduler {
    roster: Roster,
    resolver: MoveResolver,
    config: BattleConfig,
    rng: ChaCha8Rng,
    state: SchedulerState,
    queue: VecDeque<CombatantId>,
    round: u32,
    turn: Turn,
    last_ticket: InputTicket,
    observers: ObserverRegistry,
    battle_log: Vec<BattleEvent>,
}

impl BattleScheduler {
    pub fn new(roster: Roster, config: BattleConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            roster,
            resolver: MoveResolver::new(config.clone()),
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            state: SchedulerState::NotStarted,
            queue: VecDeque::new(),
            round: 0,
            turn: 0,
            last_ticket: InputTicket(0),
            observers: ObserverRegistry::new(),
            battle_log: Vec::new(),
        })
    }

    pub fn add_observer(&mut self, observer: impl BattleObserver + 'static) {
        self.observers.register(Box::new(observer));
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn pending_input(&self) -> Option<&InputRequest> {
        match &self.state {
            SchedulerState::AwaitingInput(request) => Some(request),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self.state {
            SchedulerState::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, SchedulerState::Finished(_))
    }

    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Actors still queued in the current round
    pub fn remaining_queue(&self) -> Vec<CombatantId> {
        self.queue.iter().copied().collect()
    }

    pub fn battle_log(&self) -> &[BattleEvent] {
        &self.battle_log
    }

    /// Gauge-based lookahead of upcoming actors, for display
    pub fn predict_turn_order(&self) -> Vec<CombatantId> {
        let entries: Vec<(CombatantId, u32)> =
            self.roster.alive().map(|c| (c.id, c.speed)).collect();
        predict_turn_order(
            &entries,
            self.config.turn_gauge_threshold,
            self.config.turn_order_lookahead,
        )
    }

    /// Start the battle
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            SchedulerState::NotStarted => {}
            SchedulerState::Finished(_) => return Err(BattleError::AlreadyFinished),
            _ => return Ok(()),
        }

        let mut log = BattleEventLog::new(self.turn);
        self.state = SchedulerState::Running;
        tracing::info!("Battle started with {} combatants", self.roster.len());
        log.push(BattleEventType::BattleStarted, "Battle has begun!".into());

        if let Some(outcome) = self.check_battle_end() {
            self.end_battle(outcome, &mut log);
        }
        self.flush(log);
        Ok(())
    }

    /// Advance by one queued turn
    pub fn step(&mut self) -> Result<StepOutcome> {
        match &self.state {
            SchedulerState::NotStarted => return Err(BattleError::NotStarted),
            SchedulerState::Finished(outcome) => return Ok(StepOutcome::Finished(*outcome)),
            SchedulerState::AwaitingInput(request) => {
                return Ok(StepOutcome::AwaitingInput(request.ticket))
            }
            SchedulerState::Running => {}
        }

        let mut log = BattleEventLog::new(self.turn);

        if let Some(outcome) = self.check_battle_end() {
            self.end_battle(outcome, &mut log);
            self.flush(log);
            return Ok(StepOutcome::Finished(outcome));
        }

        let Some(actor) = self.next_actor(&mut log) else {
            // Nobody left who could fill a round
            let outcome = self.check_battle_end().unwrap_or(BattleOutcome::Undefined);
            self.end_battle(outcome, &mut log);
            self.flush(log);
            return Ok(StepOutcome::Finished(outcome));
        };

        let outcome = self.take_turn(actor, &mut log);
        self.flush(log);
        Ok(outcome)
    }

    /// Step until the player gate opens, the battle ends or the turn cap hits
    pub fn run_until_blocked(&mut self) -> Result<StepOutcome> {
        let mut steps = 0;
        loop {
            let outcome = self.step()?;
            steps += 1;
            match outcome {
                StepOutcome::AwaitingInput(_) | StepOutcome::Finished(_) => return Ok(outcome),
                _ if steps >= self.config.max_turns => return Ok(outcome),
                _ => {}
            }
        }
    }

    // === INBOUND ENTRY POINTS ===

    /// Supply the full command for the gated player actor
    pub fn submit_command(&mut self, command: BattleCommand) -> Result<()> {
        let request = self.expect_pending()?;
        if command.actor != request.actor {
            tracing::warn!(
                "Rejected command for {:?} while waiting on {:?}",
                command.actor,
                request.actor
            );
            return Err(BattleError::ActorMismatch {
                submitted: command.actor,
                pending: request.actor,
            });
        }
        if !self.roster.is_alive(command.actor) {
            return Err(BattleError::ActorNotAlive(command.actor));
        }

        let actor = request.actor;
        self.state = SchedulerState::Running;
        let mut log = BattleEventLog::new(self.turn);
        self.record_selection(actor, &command.action, command.target, &mut log);
        self.execute_action(actor, command.action, command.target, &mut log);
        self.finish_turn(actor, &mut log);
        self.flush(log);
        Ok(())
    }

    /// Legacy path: pick at random among what the gate offered
    pub fn submit_response(&mut self, response: InputResponse) -> Result<()> {
        let request = self.expect_pending()?.clone();
        tracing::debug!(
            "Legacy response for {:?} ({:?} -> {:?}), choosing randomly",
            request.actor,
            response.action,
            response.target
        );

        self.state = SchedulerState::Running;
        let mut log = BattleEventLog::new(self.turn);
        let action = request.moves.choose(&mut self.rng).cloned();
        let target = request.targets.choose(&mut self.rng).copied();

        match (action, target) {
            (Some(action), Some(target)) => {
                self.record_selection(request.actor, &action, Some(target), &mut log);
                self.execute_action(request.actor, action, Some(target), &mut log);
            }
            _ => self.skip(request.actor, SkipReason::NoDecision, &mut log),
        }
        self.finish_turn(request.actor, &mut log);
        self.flush(log);
        Ok(())
    }

    /// Abandon the pending decision; the gated turn ends with no action
    pub fn cancel_pending_input(&mut self, ticket: InputTicket) -> Result<()> {
        let request = self.expect_pending()?;
        if request.ticket != ticket {
            return Err(BattleError::StaleTicket {
                submitted: ticket,
                current: request.ticket,
            });
        }

        let actor = request.actor;
        self.state = SchedulerState::Running;
        let mut log = BattleEventLog::new(self.turn);
        let name = self.name_of(actor);
        log.push(
            BattleEventType::InputCancelled { actor, ticket },
            format!("Input for {} was cancelled", name),
        );
        self.finish_turn(actor, &mut log);
        self.flush(log);
        Ok(())
    }

    fn expect_pending(&self) -> Result<&InputRequest> {
        match &self.state {
            SchedulerState::AwaitingInput(request) => Ok(request),
            SchedulerState::NotStarted => Err(BattleError::NotStarted),
            SchedulerState::Finished(_) => Err(BattleError::AlreadyFinished),
            SchedulerState::Running => Err(BattleError::NoPendingInput),
        }
    }

    // === ROUNDS & TURNS ===

    /// Pop the next queued actor, building a round when the queue runs dry
    fn next_actor(&mut self, log: &mut BattleEventLog) -> Option<CombatantId> {
        if self.queue.is_empty() && self.roster.alive().next().is_some() {
            self.start_round(log);
        }
        self.queue.pop_front()
    }

    fn start_round(&mut self, log: &mut BattleEventLog) {
        let entries: Vec<(CombatantId, u32)> =
            self.roster.alive().map(|c| (c.id, c.speed)).collect();
        let queue = build_round(&entries);
        self.round += 1;
        tracing::debug!("Round {} queue has {} turns", self.round, queue.len());

        log.push(
            BattleEventType::RoundStarted {
                round: self.round,
                queue: queue.clone(),
            },
            format!("Round {} begins", self.round),
        );
        self.queue = queue.into();
        self.push_turn_order(log);
    }

    fn take_turn(&mut self, actor: CombatantId, log: &mut BattleEventLog) -> StepOutcome {
        if !self.roster.is_alive(actor) {
            // No status ticks for a turn that never happens
            let name = self.name_of(actor);
            log.push(
                BattleEventType::TurnSkipped {
                    actor,
                    reason: SkipReason::ActorDead,
                },
                format!("{} has fallen and cannot act", name),
            );
            return StepOutcome::TurnSkipped(actor);
        }

        self.turn += 1;
        log.turn = self.turn;
        let name = self.name_of(actor);
        tracing::debug!("Turn {}: {}", self.turn, name);
        log.push(BattleEventType::TurnStarted { actor }, format!("{}'s turn", name));

        for combatant in self.roster.iter_mut().filter(|c| c.is_alive()) {
            combatant.tick_status_effects(log);
        }

        let (charging, player_controlled) = match self.roster.get(actor) {
            Some(c) => (c.is_charging(), c.is_player_controlled()),
            None => (false, false),
        };

        let acted = if charging {
            self.continue_charge(actor, log);
            true
        } else if player_controlled {
            match self.open_input_gate(actor, log) {
                Some(request) => return StepOutcome::AwaitingInput(request.ticket),
                None => false,
            }
        } else {
            self.take_ai_turn(actor, log)
        };

        self.finish_turn(actor, log);
        if acted {
            StepOutcome::TurnTaken(actor)
        } else {
            StepOutcome::TurnSkipped(actor)
        }
    }

    /// Offer moves and targets to the player. `None` if there is nothing to offer.
    fn open_input_gate(&mut self, actor: CombatantId, log: &mut BattleEventLog) -> Option<InputRequest> {
        let moves = self
            .roster
            .get(actor)
            .map(|c| c.available_actions().to_vec())
            .unwrap_or_default();
        let targets = self.roster.valid_targets(actor);

        if targets.is_empty() {
            self.no_valid_targets(actor, log);
            return None;
        }
        if moves.is_empty() {
            self.no_moves(actor, log);
            return None;
        }

        self.last_ticket = self.last_ticket.next();
        let request = InputRequest {
            actor,
            moves,
            targets,
            ticket: self.last_ticket,
        };
        let name = self.name_of(actor);
        log.push(
            BattleEventType::InputRequested {
                actor,
                moves: request.moves.iter().map(|m| m.name.clone()).collect(),
                targets: request.targets.clone(),
                ticket: request.ticket,
            },
            format!("Waiting for {}'s command", name),
        );
        self.state = SchedulerState::AwaitingInput(request.clone());
        Some(request)
    }

    /// AI decision and execution. Returns false if the turn was skipped.
    fn take_ai_turn(&mut self, actor: CombatantId, log: &mut BattleEventLog) -> bool {
        let targets = self.roster.valid_targets(actor);
        if targets.is_empty() {
            self.no_valid_targets(actor, log);
            return false;
        }

        let Some(combatant) = self.roster.get(actor) else {
            return false;
        };
        if combatant.actions.is_empty() {
            self.no_moves(actor, log);
            return false;
        }
        let Some(strategy) = combatant.ai.clone() else {
            self.skip(actor, SkipReason::NoStrategy, log);
            return false;
        };

        let moves = combatant.actions.clone();
        let target_refs: Vec<_> = targets.iter().filter_map(|id| self.roster.get(*id)).collect();
        let decision = strategy.choose_action(combatant, &target_refs, &moves, &mut self.rng);

        let chosen = decision.and_then(|d| {
            let action = moves.get(d.action_index)?.clone();
            let target_ok = targets.contains(&d.target) || d.target == actor;
            target_ok.then_some((action, d.target))
        });
        let Some((action, target)) = chosen else {
            self.skip(actor, SkipReason::NoDecision, log);
            return false;
        };

        self.record_selection(actor, &action, Some(target), log);
        self.execute_action(actor, action, Some(target), log);
        true
    }

    /// Progress a charge on the charger's own turn, resolving it when ready
    fn continue_charge(&mut self, actor: CombatantId, log: &mut BattleEventLog) {
        let config = self.config.clone();
        let Some(combatant) = self.roster.get_mut(actor) else {
            return;
        };
        if !combatant.advance_multi_turn_action(&config, log) {
            return;
        }
        let Some(charge) = combatant.complete_multi_turn_action(log) else {
            return;
        };

        let multiplier = charge
            .action
            .charge_multiplier
            .unwrap_or(config.default_charge_multiplier);

        // A fallen single target is swapped for the first living enemy
        let target = if self.roster.is_alive(charge.target) {
            Some(charge.target)
        } else {
            self.roster.valid_targets(actor).first().copied()
        };
        let Some(target) = target else {
            self.no_valid_targets(actor, log);
            return;
        };

        match BattleCommand::validated(&self.roster, actor, charge.action, Some(target)) {
            Ok(command) => self.run_resolution(&command, Some(multiplier), log),
            Err(e) => self.command_error(actor, e, log),
        }
    }

    /// Start a charge or resolve immediately
    fn execute_action(
        &mut self,
        actor: CombatantId,
        action: BattleAction,
        target: Option<CombatantId>,
        log: &mut BattleEventLog,
    ) {
        if action.requires_charge() {
            let target = target.unwrap_or(actor);
            if self.roster.get(target).is_none() {
                self.command_error(actor, BattleError::CombatantNotFound(target), log);
                return;
            }
            let name = self.name_of(actor);
            if let Some(combatant) = self.roster.get_mut(actor) {
                combatant.start_multi_turn_action(&action, target, log);
            }
            log.push(
                BattleEventType::MultiTurnStarted {
                    actor,
                    action: action.name.clone(),
                    target,
                    turns: action.turn_cost,
                },
                format!("{} starts charging {} ({} turns)", name, action.name, action.turn_cost),
            );
            return;
        }

        match BattleCommand::validated(&self.roster, actor, action, target) {
            Ok(command) => self.run_resolution(&command, None, log),
            Err(e) => self.command_error(actor, e, log),
        }
    }

    /// Resolve with fault containment: errors and panics become events
    fn run_resolution(
        &mut self,
        command: &BattleCommand,
        charge_multiplier: Option<f32>,
        log: &mut BattleEventLog,
    ) {
        let resolver = &self.resolver;
        let roster = &mut self.roster;
        let rng = &mut self.rng;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match charge_multiplier {
            Some(m) => resolver.resolve_charged(command, m, roster, rng, log),
            None => resolver.resolve(command, roster, rng, log),
        }));

        let message = match outcome {
            Ok(Ok(results)) => {
                for result in results {
                    let description = result.message.clone();
                    log.push(BattleEventType::MoveResolved { result }, description);
                }
                return;
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("resolver panicked: {}", panic_message(payload.as_ref())),
        };

        tracing::warn!("Resolution failed for {:?}: {}", command.actor, message);
        log.push(
            BattleEventType::ResolutionError {
                actor: command.actor,
                message: message.clone(),
            },
            format!("Could not resolve {}: {}", command.action.name, message),
        );
    }

    fn finish_turn(&mut self, actor: CombatantId, log: &mut BattleEventLog) {
        let name = self.name_of(actor);
        log.push(BattleEventType::TurnEnded { actor }, format!("{}'s turn ends", name));

        if let Some(outcome) = self.check_battle_end() {
            self.end_battle(outcome, log);
        } else {
            self.push_turn_order(log);
        }
    }

    /// Victory / Defeat / Undefined once a side has no one standing
    pub fn check_battle_end(&self) -> Option<BattleOutcome> {
        let players = self.roster.team_has_living(Team::Player);
        let enemies = self.roster.team_has_living(Team::Enemy);
        match (players, enemies) {
            (true, true) => None,
            (true, false) => Some(BattleOutcome::Victory),
            (false, true) => Some(BattleOutcome::Defeat),
            (false, false) => Some(BattleOutcome::Undefined),
        }
    }

    fn end_battle(&mut self, outcome: BattleOutcome, log: &mut BattleEventLog) {
        if self.is_finished() {
            return;
        }
        self.queue.clear();
        self.state = SchedulerState::Finished(outcome);
        tracing::info!("Battle ended after {} turns: {:?}", self.turn, outcome);
        log.push(
            BattleEventType::BattleEndConditionMet { outcome },
            format!("End condition met: {:?}", outcome),
        );
        log.push(
            BattleEventType::BattleEnded { outcome },
            format!("Battle ended: {:?}", outcome),
        );
    }

    // === EVENT HELPERS ===

    fn name_of(&self, id: CombatantId) -> String {
        self.roster
            .get(id)
            .map_or_else(|| format!("{:?}", id), |c| c.name.clone())
    }

    fn push_turn_order(&self, log: &mut BattleEventLog) {
        let upcoming = self.predict_turn_order();
        let names: Vec<String> = upcoming.iter().map(|id| self.name_of(*id)).collect();
        log.push(
            BattleEventType::TurnOrderUpdated { upcoming },
            format!("Next up: {}", names.join(", ")),
        );
    }

    fn record_selection(
        &self,
        actor: CombatantId,
        action: &BattleAction,
        target: Option<CombatantId>,
        log: &mut BattleEventLog,
    ) {
        let target = target.unwrap_or(actor);
        log.push(
            BattleEventType::ActionSelected {
                actor,
                action: action.name.clone(),
                target,
            },
            format!("{} chooses {} on {}", self.name_of(actor), action.name, self.name_of(target)),
        );
    }

    fn skip(&self, actor: CombatantId, reason: SkipReason, log: &mut BattleEventLog) {
        log.push(
            BattleEventType::TurnSkipped { actor, reason },
            format!("{} skips their turn ({:?})", self.name_of(actor), reason),
        );
    }

    fn no_valid_targets(&self, actor: CombatantId, log: &mut BattleEventLog) {
        log.push(
            BattleEventType::NoValidTargets { actor },
            format!("{} has no valid targets", self.name_of(actor)),
        );
        self.skip(actor, SkipReason::NoValidTargets, log);
    }

    fn no_moves(&self, actor: CombatantId, log: &mut BattleEventLog) {
        log.push(
            BattleEventType::NoMovesAvailable { actor },
            format!("{} has no moves available", self.name_of(actor)),
        );
        self.skip(actor, SkipReason::NoMovesAvailable, log);
    }

    fn command_error(&self, actor: CombatantId, error: BattleError, log: &mut BattleEventLog) {
        tracing::warn!("Command error for {:?}: {}", actor, error);
        log.push(
            BattleEventType::CommandError {
                actor,
                message: error.to_string(),
            },
            format!("{} could not act: {}", self.name_of(actor), error),
        );
    }

    /// Record events and deliver them to observers
    ///
    /// Observer failures become `EventHandlerError` events. Those are
    /// delivered too, but a failure while delivering one is only logged.
    fn flush(&mut self, log: BattleEventLog) {
        for event in log.events {
            let failures = self.observers.dispatch(&event);
            let actor = event.event_type.actor();
            let turn = event.turn;
            self.battle_log.push(event);

            for message in failures {
                tracing::warn!("Event handler error: {}", message);
                let error_event = BattleEvent {
                    turn,
                    event_type: BattleEventType::EventHandlerError {
                        actor,
                        message: message.clone(),
                    },
                    description: format!("Event handler error: {}", message),
                };
                for nested in self.observers.dispatch(&error_event) {
                    tracing::warn!("Event handler failed on error event: {}", nested);
                }
                self.battle_log.push(error_event);
            }
        }
    }
}

impl std::fmt::Debug for BattleScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleScheduler")
            .field("state", &self.state)
            .field("round", &self.round)
            .field("turn", &self.turn)
            .field("queue", &self.queue)
            .field("observers", &self.observers)
            .finish()
    }
}
