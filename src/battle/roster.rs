//! Battle roster: owns every combatant for the battle's lifetime
//!
//! The dead stay in the roster; every query filters on `is_alive`.

use crate::battle::combatant::Combatant;
use crate::core::error::{BattleError, Result};
use crate::core::types::{CombatantId, Team};

#[derive(Debug, Clone, Default)]
pub struct Roster {
    combatants: Vec<Combatant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a combatant, assigning its id
    pub fn add(&mut self, mut combatant: Combatant) -> CombatantId {
        let id = CombatantId(self.combatants.len() as u32);
        combatant.id = id;
        self.combatants.push(combatant);
        id
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(id.index())
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(id.index())
    }

    /// Like `get`, but a missing id is an error
    pub fn require(&self, id: CombatantId) -> Result<&Combatant> {
        self.get(id).ok_or(BattleError::CombatantNotFound(id))
    }

    pub fn require_mut(&mut self, id: CombatantId) -> Result<&mut Combatant> {
        self.get_mut(id).ok_or(BattleError::CombatantNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.combatants.iter_mut()
    }

    pub fn is_alive(&self, id: CombatantId) -> bool {
        self.get(id).map_or(false, |c| c.is_alive())
    }

    /// Living combatants in roster order
    pub fn alive(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter().filter(|c| c.is_alive())
    }

    /// Ids of living members of `team`, in roster order
    pub fn alive_in_team(&self, team: Team) -> Vec<CombatantId> {
        self.alive()
            .filter(|c| c.team == team)
            .map(|c| c.id)
            .collect()
    }

    pub fn team_has_living(&self, team: Team) -> bool {
        self.alive().any(|c| c.team == team)
    }

    /// Living members of the team opposing `id`
    pub fn valid_targets(&self, id: CombatantId) -> Vec<CombatantId> {
        self.get(id)
            .and_then(|c| c.team.opponent())
            .map(|team| self.alive_in_team(team))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::combatant::CombatantStats;

    fn roster() -> Roster {
        let stats = CombatantStats::new(50, 10, 5, 5);
        let mut roster = Roster::new();
        roster.add(Combatant::new("Hero", Team::Player, stats));
        roster.add(Combatant::new("Slime", Team::Enemy, stats));
        roster.add(Combatant::new("Bat", Team::Enemy, stats).with_current_hp(0));
        roster.add(Combatant::new("Merchant", Team::Neutral, stats));
        roster
    }

    #[test]
    fn test_ids_follow_insertion_order() {
        let r = roster();
        assert_eq!(r.len(), 4);
        assert_eq!(r.get(CombatantId(1)).unwrap().name, "Slime");
        assert_eq!(r.get(CombatantId(1)).unwrap().id, CombatantId(1));
        assert!(r.get(CombatantId(9)).is_none());
        assert!(matches!(
            r.require(CombatantId(9)),
            Err(BattleError::CombatantNotFound(CombatantId(9)))
        ));
    }

    #[test]
    fn test_dead_are_filtered_not_removed() {
        let r = roster();
        assert_eq!(r.alive_in_team(Team::Enemy), vec![CombatantId(1)]);
        assert!(!r.is_alive(CombatantId(2)));
        assert_eq!(r.len(), 4);
    }

    #[test]
    fn test_valid_targets_by_team() {
        let r = roster();
        assert_eq!(r.valid_targets(CombatantId(0)), vec![CombatantId(1)]);
        assert_eq!(r.valid_targets(CombatantId(1)), vec![CombatantId(0)]);
        assert!(r.valid_targets(CombatantId(3)).is_empty());
    }
}
