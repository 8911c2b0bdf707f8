//! Move definitions consumed by the resolver
//!
//! A `BattleAction` is plain data. It carries no behavior of its own; the
//! resolver and the combatant status engine interpret its fields.

use serde::{Deserialize, Serialize};

/// What an action does when it resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActionType {
    #[default]
    Damage,
    Heal,
    Buff,
    Debuff,
    Defend,
    Item,
}

/// Which combatants an action affects, relative to the actor's team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActionTargetType {
    #[serde(rename = "Self")]
    SelfOnly,
    #[default]
    SingleEnemy,
    AllEnemies,
    SingleAlly,
    AllAllies,
}

impl ActionTargetType {
    /// True when the action hits a whole team
    pub fn is_area(&self) -> bool {
        matches!(self, Self::AllEnemies | Self::AllAllies)
    }
}

/// Side effect applied while a multi-turn action charges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChargeTurnBehavior {
    #[default]
    None,
    ApplyDefenseBuff,
    ApplySpeedDebuff,
    TakeDamage,
}

/// Attack buff granted alongside a defend stance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefendAttackBuff {
    pub multiplier: f32,
    pub duration: u32,
}

/// An immutable move definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleAction {
    pub name: String,
    pub action_type: ActionType,
    pub target_type: ActionTargetType,
    /// Forces the actor to be the only target, whatever `target_type` says
    pub target_self: bool,

    pub power: u32,
    /// Hit probability in 0..=1
    pub accuracy: f32,
    /// Added to the base crit chance
    pub crit_chance: f32,
    /// Scales the actor's attack in the damage formula
    pub stat_multiplier: f32,

    /// Percent change to attack for Buff/Debuff (20.0 = 20%)
    pub attack_modifier: f32,
    pub defense_modifier: f32,
    pub speed_modifier: f32,

    // Defend only
    pub defend_duration: u32,
    /// Fraction of incoming damage that still lands while defending
    pub damage_reduction: f32,
    pub counter_chance: f32,
    pub counter_multiplier: f32,
    pub defend_attack_buff: Option<DefendAttackBuff>,

    // Multi-turn
    pub is_multi_turn: bool,
    /// Own turns the action occupies, including the turn it starts on
    pub turn_cost: u32,
    pub charge_behavior: ChargeTurnBehavior,
    pub charge_message: String,
    /// Power multiplier on completion; falls back to the configured default
    pub charge_multiplier: Option<f32>,
}

impl Default for BattleAction {
    fn default() -> Self {
        Self {
            name: String::from("Action"),
            action_type: ActionType::Damage,
            target_type: ActionTargetType::SingleEnemy,
            target_self: false,
            power: 0,
            accuracy: 1.0,
            crit_chance: 0.0,
            stat_multiplier: 1.0,
            attack_modifier: 0.0,
            defense_modifier: 0.0,
            speed_modifier: 0.0,
            defend_duration: 1,
            damage_reduction: 0.5,
            counter_chance: 0.0,
            counter_multiplier: 1.0,
            defend_attack_buff: None,
            is_multi_turn: false,
            turn_cost: 1,
            charge_behavior: ChargeTurnBehavior::None,
            charge_message: String::new(),
            charge_multiplier: None,
        }
    }
}

impl BattleAction {
    pub fn new(name: impl Into<String>, action_type: ActionType) -> Self {
        Self {
            name: name.into(),
            action_type,
            ..Self::default()
        }
    }

    /// Single-target strike
    pub fn basic_attack() -> Self {
        Self::new("Attack", ActionType::Damage).with_power(50)
    }

    /// Hits every living enemy
    pub fn sweep() -> Self {
        Self::new("Sweep", ActionType::Damage)
            .with_power(30)
            .with_target_type(ActionTargetType::AllEnemies)
            .with_accuracy(0.9)
    }

    /// Heals the actor
    pub fn heal() -> Self {
        Self::new("Heal", ActionType::Heal).targeting_self()
    }

    /// Heals every living ally, the actor included
    pub fn group_heal() -> Self {
        Self::new("Group Heal", ActionType::Heal).with_target_type(ActionTargetType::AllAllies)
    }

    /// Two-turn guard with an even chance of a delayed counter
    pub fn defend() -> Self {
        Self::new("Defend", ActionType::Defend)
            .targeting_self()
            .with_defend(2, 0.5, 0.5, 1.0)
    }

    /// Raises the actor's attack by 25%
    pub fn power_up() -> Self {
        Self::new("Power Up", ActionType::Buff)
            .targeting_self()
            .with_modifiers(25.0, 0.0, 0.0)
    }

    /// Lowers a target's attack and defense by 15%
    pub fn weaken() -> Self {
        Self::new("Weaken", ActionType::Debuff)
            .with_accuracy(0.9)
            .with_modifiers(15.0, 15.0, 0.0)
    }

    /// Three-turn strike that hardens the actor while charging
    pub fn charged_strike() -> Self {
        Self::new("Charged Strike", ActionType::Damage)
            .with_power(60)
            .with_charge(3, ChargeTurnBehavior::ApplyDefenseBuff, "is gathering power")
    }

    pub fn with_power(mut self, power: u32) -> Self {
        self.power = power;
        self
    }

    pub fn with_accuracy(mut self, accuracy: f32) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_crit_chance(mut self, crit_chance: f32) -> Self {
        self.crit_chance = crit_chance;
        self
    }

    pub fn with_stat_multiplier(mut self, stat_multiplier: f32) -> Self {
        self.stat_multiplier = stat_multiplier;
        self
    }

    pub fn with_target_type(mut self, target_type: ActionTargetType) -> Self {
        self.target_type = target_type;
        self
    }

    pub fn targeting_self(mut self) -> Self {
        self.target_type = ActionTargetType::SelfOnly;
        self.target_self = true;
        self
    }

    /// Percent modifiers for Buff/Debuff actions
    pub fn with_modifiers(mut self, attack: f32, defense: f32, speed: f32) -> Self {
        self.attack_modifier = attack;
        self.defense_modifier = defense;
        self.speed_modifier = speed;
        self
    }

    pub fn with_defend(
        mut self,
        duration: u32,
        damage_reduction: f32,
        counter_chance: f32,
        counter_multiplier: f32,
    ) -> Self {
        self.defend_duration = duration;
        self.damage_reduction = damage_reduction;
        self.counter_chance = counter_chance;
        self.counter_multiplier = counter_multiplier;
        self
    }

    pub fn with_defend_attack_buff(mut self, multiplier: f32, duration: u32) -> Self {
        self.defend_attack_buff = Some(DefendAttackBuff {
            multiplier,
            duration,
        });
        self
    }

    pub fn with_charge(
        mut self,
        turn_cost: u32,
        behavior: ChargeTurnBehavior,
        message: impl Into<String>,
    ) -> Self {
        self.is_multi_turn = true;
        self.turn_cost = turn_cost;
        self.charge_behavior = behavior;
        self.charge_message = message.into();
        self
    }

    pub fn with_charge_multiplier(mut self, multiplier: f32) -> Self {
        self.charge_multiplier = Some(multiplier);
        self
    }

    /// True when choosing this action starts a charge instead of resolving
    pub fn requires_charge(&self) -> bool {
        self.is_multi_turn && self.turn_cost > 1
    }

    pub fn is_offensive(&self) -> bool {
        matches!(self.action_type, ActionType::Damage | ActionType::Debuff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_consistent() {
        assert_eq!(BattleAction::basic_attack().action_type, ActionType::Damage);
        assert!(BattleAction::heal().target_self);
        assert!(BattleAction::sweep().target_type.is_area());
        assert!(BattleAction::charged_strike().requires_charge());
        assert!(!BattleAction::basic_attack().requires_charge());
    }

    #[test]
    fn test_single_turn_cost_never_charges() {
        let action = BattleAction::basic_attack().with_charge(1, ChargeTurnBehavior::None, "");
        assert!(action.is_multi_turn);
        assert!(!action.requires_charge());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let action: BattleAction = toml::from_str(
            r#"
            name = "Fireball"
            action_type = "Damage"
            target_type = "AllEnemies"
            power = 40
            accuracy = 0.8
            "#,
        )
        .unwrap();
        assert_eq!(action.name, "Fireball");
        assert_eq!(action.target_type, ActionTargetType::AllEnemies);
        assert_eq!(action.stat_multiplier, 1.0);
        assert_eq!(action.turn_cost, 1);
    }

    #[test]
    fn test_self_target_type_serializes_as_self() {
        let action: BattleAction = toml::from_str("target_type = \"Self\"\n").unwrap();
        assert_eq!(action.target_type, ActionTargetType::SelfOnly);
    }
}
