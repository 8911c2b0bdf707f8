use thiserror::Error;

use crate::core::types::{CombatantId, InputTicket};

#[derive(Error, Debug)]
pub enum BattleError {
    #[error("Combatant not found: {0:?}")]
    CombatantNotFound(CombatantId),

    #[error("Command actor {submitted:?} does not match the pending actor {pending:?}")]
    ActorMismatch {
        submitted: CombatantId,
        pending: CombatantId,
    },

    #[error("Combatant is not alive: {0:?}")]
    ActorNotAlive(CombatantId),

    #[error("No player input is pending")]
    NoPendingInput,

    #[error("Input ticket {submitted:?} is stale (current: {current:?})")]
    StaleTicket {
        submitted: InputTicket,
        current: InputTicket,
    },

    #[error("Battle has not been started")]
    NotStarted,

    #[error("Battle is already finished")]
    AlreadyFinished,

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Setup error: {0}")]
    Setup(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BattleError>;
