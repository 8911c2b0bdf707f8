//! Battle system - speed-weighted turn-based combat
//!
//! Combatants act in rounds built from their speed. Each turn resolves one
//! move through the resolver, which drives the status engine on the
//! combatants (defend, counters, attack buffs, multi-turn charges).
//!
//! Key pieces:
//! - `BattleScheduler` owns the roster and runs the turn protocol
//! - Player-controlled turns park the scheduler until input arrives
//! - Everything observable goes out as `BattleEvent`s

pub mod action;
pub mod ai;
pub mod combatant;
pub mod events;
pub mod prediction;
pub mod resolver;
pub mod roster;
pub mod scheduler;
pub mod setup;
pub mod turn_queue;

// Re-exports for convenient access
pub use action::{ActionTargetType, ActionType, BattleAction, ChargeTurnBehavior, DefendAttackBuff};
pub use ai::{AiDecision, AiKind, AiStrategy};
pub use combatant::{Combatant, CombatantStats};
pub use events::{
    BattleEvent, BattleEventLog, BattleEventType, BattleObserver, CombatantEventKind,
    ObserverResult, SkipReason,
};
pub use prediction::predict_turn_order;
pub use resolver::{BattleCommand, BattleResult, MoveResolver};
pub use roster::Roster;
pub use scheduler::{BattleScheduler, InputRequest, InputResponse, SchedulerState, StepOutcome};
pub use setup::{BattleSetup, CombatantSpec};
pub use turn_queue::build_round;
