//! Battle setup files
//!
//! ```toml
//! [config]
//! crit_multiplier = 1.75
//!
//! [[moves]]
//! name = "Fireball"
//! power = 70
//! target_type = "AllEnemies"
//!
//! [[combatants]]
//! name = "Mage"
//! team = "Player"
//! max_hp = 80
//! attack = 25
//! defense = 8
//! speed = 12
//! moves = ["Fireball", "Heal"]
//! ```
//!
//! Moves are looked up by name in the `[[moves]]` library, which starts out
//! holding the built-in presets. A library entry with a preset's name
//! replaces it.

use std::fs;
use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::action::BattleAction;
use crate::battle::ai::AiKind;
use crate::battle::combatant::{Combatant, CombatantStats};
use crate::battle::roster::Roster;
use crate::core::config::BattleConfig;
use crate::core::error::{BattleError, Result};
use crate::core::types::Team;

/// One combatant entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantSpec {
    pub name: String,
    pub team: Team,
    #[serde(flatten)]
    pub stats: CombatantStats,
    /// Starting HP if not full
    #[serde(default)]
    pub current_hp: Option<u32>,
    #[serde(default)]
    pub moves: Vec<String>,
    /// Omit on a player-team combatant to make it player-controlled
    #[serde(default)]
    pub ai: Option<AiKind>,
}

/// Complete battle description as read from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BattleSetup {
    #[serde(default)]
    pub config: BattleConfig,
    #[serde(default)]
    pub moves: Vec<BattleAction>,
    #[serde(default)]
    pub combatants: Vec<CombatantSpec>,
}

impl BattleSetup {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let setup: BattleSetup = toml::from_str(contents)?;
        setup.config.validate()?;
        Ok(setup)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let setup = Self::from_toml_str(&contents)?;
        tracing::info!(
            "Loaded battle setup {:?}: {} combatants, {} custom moves",
            path,
            setup.combatants.len(),
            setup.moves.len()
        );
        Ok(setup)
    }

    /// Presets plus this file's `[[moves]]`, keyed by name
    pub fn move_library(&self) -> AHashMap<String, BattleAction> {
        let presets = [
            BattleAction::basic_attack(),
            BattleAction::sweep(),
            BattleAction::heal(),
            BattleAction::group_heal(),
            BattleAction::defend(),
            BattleAction::power_up(),
            BattleAction::weaken(),
            BattleAction::charged_strike(),
        ];
        presets
            .into_iter()
            .chain(self.moves.iter().cloned())
            .map(|action| (action.name.clone(), action))
            .collect()
    }

    /// Resolve move names and build the roster
    pub fn build(&self) -> Result<(BattleConfig, Roster)> {
        if self.combatants.is_empty() {
            return Err(BattleError::Setup("battle has no combatants".into()));
        }

        let library = self.move_library();
        let mut roster = Roster::new();

        for spec in &self.combatants {
            if spec.stats.max_hp == 0 {
                return Err(BattleError::Setup(format!("{} has zero max_hp", spec.name)));
            }

            let actions = spec
                .moves
                .iter()
                .map(|name| {
                    library.get(name).cloned().ok_or_else(|| {
                        BattleError::Setup(format!("{} knows unknown move '{}'", spec.name, name))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let mut combatant =
                Combatant::new(spec.name.clone(), spec.team, spec.stats).with_actions(actions);
            if let Some(hp) = spec.current_hp {
                combatant = combatant.with_current_hp(hp);
            }
            if let Some(ai) = &spec.ai {
                combatant = combatant.with_ai(ai.build(&self.config));
            }

            let id = roster.add(combatant);
            tracing::debug!("Added {} as {:?} ({:?})", spec.name, id, spec.team);
        }

        Ok((self.config.clone(), roster))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CombatantId;

    const SETUP: &str = r#"
        [config]
        crit_multiplier = 2.0

        [[moves]]
        name = "Fireball"
        power = 70
        target_type = "AllEnemies"

        [[combatants]]
        name = "Mage"
        team = "Player"
        max_hp = 80
        attack = 25
        defense = 8
        speed = 12
        moves = ["Fireball", "Heal"]

        [[combatants]]
        name = "Orc"
        team = "Enemy"
        max_hp = 120
        attack = 18
        defense = 12
        speed = 6
        current_hp = 100
        moves = ["Attack", "Defend"]
        ai = { healer = { threshold = 0.4 } }

        [[combatants]]
        name = "Wolf"
        team = "Enemy"
        max_hp = 60
        attack = 15
        defense = 5
        speed = 14
        moves = ["Attack"]
        ai = "aggressive"
    "#;

    #[test]
    fn test_build_from_toml() {
        let setup = BattleSetup::from_toml_str(SETUP).unwrap();
        let (config, roster) = setup.build().unwrap();

        assert_eq!(config.crit_multiplier, 2.0);
        assert_eq!(config.base_crit_chance, 0.05);
        assert_eq!(roster.len(), 3);

        let mage = roster.get(CombatantId(0)).unwrap();
        assert_eq!(mage.name, "Mage");
        assert!(mage.is_player_controlled());
        assert_eq!(mage.actions[0].power, 70);
        assert!(mage.actions[0].target_type.is_area());
        assert_eq!(mage.actions[1].name, "Heal");

        let orc = roster.get(CombatantId(1)).unwrap();
        assert_eq!(orc.current_hp(), 100);
        assert_eq!(orc.ai.as_ref().unwrap().name(), "healer");

        let wolf = roster.get(CombatantId(2)).unwrap();
        assert_eq!(wolf.ai.as_ref().unwrap().name(), "aggressive");
    }

    #[test]
    fn test_unknown_move_is_setup_error() {
        let toml = r#"
            [[combatants]]
            name = "Hero"
            team = "Player"
            max_hp = 10
            attack = 1
            defense = 1
            speed = 1
            moves = ["Meteor"]
        "#;
        let err = BattleSetup::from_toml_str(toml).unwrap().build().unwrap_err();
        assert!(matches!(err, BattleError::Setup(msg) if msg.contains("Meteor")));
    }

    #[test]
    fn test_custom_move_overrides_preset() {
        let toml = r#"
            [[moves]]
            name = "Attack"
            power = 5

            [[combatants]]
            name = "Hero"
            team = "Player"
            max_hp = 10
            attack = 1
            defense = 1
            speed = 1
            moves = ["Attack"]
        "#;
        let (_, roster) = BattleSetup::from_toml_str(toml).unwrap().build().unwrap();
        assert_eq!(roster.get(CombatantId(0)).unwrap().actions[0].power, 5);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            BattleSetup::from_toml_str("combatants = 3"),
            Err(BattleError::TomlError(_))
        ));
        assert!(matches!(
            BattleSetup::from_toml_str("[config]\nmax_turns = 0"),
            Err(BattleError::InvalidConfig(_))
        ));
        assert!(matches!(
            BattleSetup::default().build(),
            Err(BattleError::Setup(_))
        ));
    }

    #[test]
    fn test_load_sample_skirmish() {
        let setup = BattleSetup::load("data/battles/skirmish.toml").unwrap();
        let (_, roster) = setup.build().unwrap();
        assert!(roster.team_has_living(Team::Player));
        assert!(roster.team_has_living(Team::Enemy));
    }
}
