//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Stable handle for a combatant inside a [`Roster`](crate::battle::Roster)
///
/// Ids are assigned in insertion order, so roster order doubles as the
/// deterministic tie-breaker wherever two combatants compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(pub u32);

impl CombatantId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Battle turn counter (one per turn actually taken)
pub type Turn = u32;

/// Identifies one opening of the player input gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InputTicket(pub u64);

impl InputTicket {
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

/// Side a combatant fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Player,
    Enemy,
    Neutral,
}

impl Team {
    /// The team this one fights against. Neutral fights nobody.
    pub fn opponent(&self) -> Option<Team> {
        match self {
            Team::Player => Some(Team::Enemy),
            Team::Enemy => Some(Team::Player),
            Team::Neutral => None,
        }
    }
}

/// How a battle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleOutcome {
    /// Player team survives, enemy team wiped
    Victory,
    /// Player team wiped
    Defeat,
    /// Both teams wiped at once
    Undefined,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_opponents() {
        assert_eq!(Team::Player.opponent(), Some(Team::Enemy));
        assert_eq!(Team::Enemy.opponent(), Some(Team::Player));
        assert_eq!(Team::Neutral.opponent(), None);
    }

    #[test]
    fn test_input_ticket_advances() {
        let t = InputTicket(3);
        assert_eq!(t.next(), InputTicket(4));
        assert!(t.next() > t);
    }

    #[test]
    fn test_combatant_id_index() {
        assert_eq!(CombatantId::new(7).index(), 7);
    }
}
