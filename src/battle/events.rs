//! Outbound battle events and observer delivery
//!
//! Every state change the presentation layer may care about is recorded as a
//! `BattleEvent`. The scheduler keeps the full log and forwards each event to
//! registered observers, one at a time, containing any observer failure.

use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;

use crate::battle::resolver::BattleResult;
use crate::core::types::{BattleOutcome, CombatantId, InputTicket, Turn};

/// Why a queued turn produced no action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Died after being queued
    ActorDead,
    NoValidTargets,
    NoMovesAvailable,
    /// Not player-controlled and has no AI strategy
    NoStrategy,
    /// Strategy returned no usable move or target
    NoDecision,
}

/// Status events raised by combatant mutators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CombatantEventKind {
    DamageTaken,
    CriticalTaken,
    Healed,
    Died,
    DefendStarted,
    DefendEnded,
    CounterPrepared,
    AttackBuffApplied,
    AttackBuffEnded,
    StatChanged,
    ChargeStarted,
    ChargeProgressing,
    ChargeComplete,
    ChargeCancelled,
}

#[derive(Debug, Clone, Serialize)]
pub enum BattleEventType {
    BattleStarted,
    RoundStarted {
        round: u32,
        queue: Vec<CombatantId>,
    },
    TurnOrderUpdated {
        upcoming: Vec<CombatantId>,
    },
    TurnStarted {
        actor: CombatantId,
    },
    TurnEnded {
        actor: CombatantId,
    },
    TurnSkipped {
        actor: CombatantId,
        reason: SkipReason,
    },
    NoValidTargets {
        actor: CombatantId,
    },
    NoMovesAvailable {
        actor: CombatantId,
    },
    InputRequested {
        actor: CombatantId,
        moves: Vec<String>,
        targets: Vec<CombatantId>,
        ticket: InputTicket,
    },
    InputCancelled {
        actor: CombatantId,
        ticket: InputTicket,
    },
    ActionSelected {
        actor: CombatantId,
        action: String,
        target: CombatantId,
    },
    MultiTurnStarted {
        actor: CombatantId,
        action: String,
        target: CombatantId,
        turns: u32,
    },
    MoveResolved {
        result: BattleResult,
    },
    CommandError {
        actor: CombatantId,
        message: String,
    },
    ResolutionError {
        actor: CombatantId,
        message: String,
    },
    EventHandlerError {
        actor: Option<CombatantId>,
        message: String,
    },
    BattleEndConditionMet {
        outcome: BattleOutcome,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
    Combatant {
        combatant: CombatantId,
        kind: CombatantEventKind,
        amount: u32,
    },
}

impl BattleEventType {
    /// The combatant an event is about, if any
    pub fn actor(&self) -> Option<CombatantId> {
        match self {
            Self::TurnStarted { actor }
            | Self::TurnEnded { actor }
            | Self::TurnSkipped { actor, .. }
            | Self::NoValidTargets { actor }
            | Self::NoMovesAvailable { actor }
            | Self::InputRequested { actor, .. }
            | Self::InputCancelled { actor, .. }
            | Self::ActionSelected { actor, .. }
            | Self::MultiTurnStarted { actor, .. }
            | Self::CommandError { actor, .. }
            | Self::ResolutionError { actor, .. } => Some(*actor),
            Self::EventHandlerError { actor, .. } => *actor,
            Self::MoveResolved { result } => Some(result.actor),
            Self::Combatant { combatant, .. } => Some(*combatant),
            Self::BattleStarted
            | Self::RoundStarted { .. }
            | Self::TurnOrderUpdated { .. }
            | Self::BattleEndConditionMet { .. }
            | Self::BattleEnded { .. } => None,
        }
    }
}

/// Log entry for battle events
#[derive(Debug, Clone, Serialize)]
pub struct BattleEvent {
    pub turn: Turn,
    pub event_type: BattleEventType,
    pub description: String,
}

/// Events raised while processing one step
#[derive(Debug, Clone, Default)]
pub struct BattleEventLog {
    pub turn: Turn,
    pub events: Vec<BattleEvent>,
}

impl BattleEventLog {
    pub fn new(turn: Turn) -> Self {
        Self {
            turn,
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, event_type: BattleEventType, description: String) {
        self.events.push(BattleEvent {
            turn: self.turn,
            event_type,
            description,
        });
    }

    /// Record a combatant status event
    pub fn combatant(
        &mut self,
        combatant: CombatantId,
        kind: CombatantEventKind,
        amount: u32,
        message: String,
    ) {
        self.push(
            BattleEventType::Combatant {
                combatant,
                kind,
                amount,
            },
            message,
        );
    }

    /// Status events of one kind, for assertions and presentation filters
    pub fn combatant_events(&self, kind: CombatantEventKind) -> Vec<&BattleEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e.event_type, BattleEventType::Combatant { kind: k, .. } if k == kind))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

pub type ObserverResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Passive listener for battle events
pub trait BattleObserver {
    fn on_event(&mut self, event: &BattleEvent) -> ObserverResult;
}

impl<F> BattleObserver for F
where
    F: FnMut(&BattleEvent) -> ObserverResult,
{
    fn on_event(&mut self, event: &BattleEvent) -> ObserverResult {
        self(event)
    }
}

/// Registered observers
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Vec<Box<dyn BattleObserver>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: Box<dyn BattleObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver one event to every observer
    ///
    /// Returns a message for each observer that returned an error or
    /// panicked. The remaining observers still receive the event.
    pub fn dispatch(&mut self, event: &BattleEvent) -> Vec<String> {
        let mut failures = Vec::new();
        for (index, observer) in self.observers.iter_mut().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| observer.on_event(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failures.push(format!("observer {} failed: {}", index, e)),
                Err(payload) => failures.push(format!(
                    "observer {} panicked: {}",
                    index,
                    panic_message(payload.as_ref())
                )),
            }
        }
        failures
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Best-effort text from a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sample_event() -> BattleEvent {
        BattleEvent {
            turn: 1,
            event_type: BattleEventType::TurnStarted {
                actor: CombatantId(0),
            },
            description: "Hero's turn".into(),
        }
    }

    #[test]
    fn test_log_stamps_turn() {
        let mut log = BattleEventLog::new(7);
        log.push(BattleEventType::BattleStarted, "go".into());
        log.combatant(CombatantId(1), CombatantEventKind::Healed, 5, "healed".into());
        assert_eq!(log.len(), 2);
        assert!(log.events.iter().all(|e| e.turn == 7));
        assert_eq!(log.combatant_events(CombatantEventKind::Healed).len(), 1);
        assert!(log.combatant_events(CombatantEventKind::Died).is_empty());
    }

    #[test]
    fn test_dispatch_reaches_all_observers() {
        let seen = Rc::new(RefCell::new(0));
        let mut registry = ObserverRegistry::new();
        for _ in 0..3 {
            let seen = Rc::clone(&seen);
            registry.register(Box::new(move |_: &BattleEvent| -> ObserverResult {
                *seen.borrow_mut() += 1;
                Ok(())
            }));
        }
        assert!(registry.dispatch(&sample_event()).is_empty());
        assert_eq!(*seen.borrow(), 3);
    }

    #[test]
    fn test_failing_and_panicking_observers_are_contained() {
        let seen = Rc::new(RefCell::new(0));
        let mut registry = ObserverRegistry::new();
        registry.register(Box::new(|_: &BattleEvent| -> ObserverResult {
            Err("boom".into())
        }));
        registry.register(Box::new(|_: &BattleEvent| -> ObserverResult {
            panic!("observer exploded")
        }));
        let counter = Rc::clone(&seen);
        registry.register(Box::new(move |_: &BattleEvent| -> ObserverResult {
            *counter.borrow_mut() += 1;
            Ok(())
        }));

        let failures = registry.dispatch(&sample_event());
        assert_eq!(failures.len(), 2);
        assert!(failures[0].contains("boom"));
        assert!(failures[1].contains("observer exploded"));
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn test_event_actor_lookup() {
        assert_eq!(sample_event().event_type.actor(), Some(CombatantId(0)));
        assert_eq!(BattleEventType::BattleStarted.actor(), None);
    }
}
