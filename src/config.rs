//! 对局配置：牌库构成、怪物名单、骰子范围等。

use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::{PlayerId, RuleError};

const DEFAULT_STARTING_HAND_SIZE: usize = 10;
const DEFAULT_TABLE_SIZE: usize = 3;
const DEFAULT_MIN_ATTACK_STRENGTH: i32 = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiceRange {
    pub min: i32,
    pub max: i32,
}

impl DiceRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        rng.gen_range(self.range())
    }

    pub fn range(&self) -> RangeInclusive<i32> {
        self.min..=self.max
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeckComposition {
    pub valkiria: u32,
    pub einherjar: u32,
    pub positive_modifiers: u32,
    pub negative_modifiers: u32,
    pub mutable_modifiers: u32,
    pub challenges: u32,
    pub modifier_magnitude: i32,
}

impl DeckComposition {
    /// 牌库总张数；溢出时返回 `None`。
    pub fn total(&self) -> Option<u32> {
        [
            self.einherjar,
            self.positive_modifiers,
            self.negative_modifiers,
            self.mutable_modifiers,
            self.challenges,
        ]
        .iter()
        .try_fold(self.valkiria, |sum, count| sum.checked_add(*count))
    }
}

impl Default for DeckComposition {
    fn default() -> Self {
        Self {
            valkiria: 20,
            einherjar: 40,
            positive_modifiers: 5,
            negative_modifiers: 5,
            mutable_modifiers: 5,
            challenges: 25,
            modifier_magnitude: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonsterSpec {
    pub name: String,
    pub required_strength: i32,
}

impl MonsterSpec {
    pub fn new(name: impl Into<String>, required_strength: i32) -> Self {
        Self {
            name: name.into(),
            required_strength,
        }
    }
}

fn default_monsters() -> Vec<MonsterSpec> {
    [
        ("Hatti", 16),
        ("Skol", 16),
        ("Nidhogg", 18),
        ("Hrym", 18),
        ("Surtr", 18),
        ("Hel", 18),
        ("Garm", 18),
        ("Fenrir", 20),
        ("Jormungand", 20),
    ]
    .into_iter()
    .map(|(name, strength)| MonsterSpec::new(name, strength))
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameConfig {
    pub starting_hand_size: usize,
    pub table_size: usize,
    /// 战队力量低于此值时直接拒绝攻击。
    pub min_attack_strength: i32,
    pub min_players: usize,
    pub max_players: usize,
    pub challenge_roll: DiceRange,
    pub attack_roll: DiceRange,
    pub deck: DeckComposition,
    pub monsters: Vec<MonsterSpec>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_hand_size: DEFAULT_STARTING_HAND_SIZE,
            table_size: DEFAULT_TABLE_SIZE,
            min_attack_strength: DEFAULT_MIN_ATTACK_STRENGTH,
            min_players: 2,
            max_players: 4,
            challenge_roll: DiceRange::new(1, 4),
            attack_roll: DiceRange::new(0, 3),
            deck: DeckComposition::default(),
            monsters: default_monsters(),
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        let config: GameConfig =
            serde_json::from_str(json).map_err(|err| RuleError::InvalidSetup {
                reason: format!("config is not valid JSON: {err}"),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_starting_hand_size(mut self, size: usize) -> Self {
        self.starting_hand_size = size;
        self
    }

    pub fn with_deck(mut self, deck: DeckComposition) -> Self {
        self.deck = deck;
        self
    }

    pub fn with_monsters(mut self, monsters: Vec<MonsterSpec>) -> Self {
        self.monsters = monsters;
        self
    }

    pub fn with_min_attack_strength(mut self, strength: i32) -> Self {
        self.min_attack_strength = strength;
        self
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        let invalid = |reason: &str| -> Result<(), RuleError> {
            Err(RuleError::InvalidSetup {
                reason: reason.to_string(),
            })
        };
        if self.challenge_roll.is_empty() || self.attack_roll.is_empty() {
            return invalid("dice ranges must not be empty");
        }
        if self.table_size == 0 {
            return invalid("table must hold at least one monster");
        }
        if self.min_players == 0 || self.min_players > self.max_players {
            return invalid("player range is inverted or empty");
        }
        if self.max_players > PlayerId::MAX as usize + 1 {
            return invalid("too many seats for a player id");
        }
        if self.deck.modifier_magnitude <= 0 {
            return invalid("modifier magnitude must be positive");
        }
        let Some(total) = self.deck.total() else {
            return invalid("deck size overflows");
        };
        let Some(needed) = self.starting_hand_size.checked_mul(self.max_players) else {
            return invalid("starting hands overflow");
        };
        if (total as usize) < needed {
            return invalid("deck is too small to deal every starting hand");
        }
        if self.monsters.iter().any(|monster| monster.required_strength <= 0) {
            return invalid("monsters must require positive strength");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn defaults_match_the_board_game() {
        let config = GameConfig::default();
        assert_eq!(config.deck.total(), Some(100));
        assert_eq!(config.monsters.len(), 9);
        assert_eq!(config.challenge_roll.range(), 1..=4);
        assert_eq!(config.attack_roll.range(), 0..=3);
        config.validate().expect("default config should be valid");
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = GameConfig::from_json(r#"{ "starting_hand_size": 5, "deck": { "challenges": 10 } }"#)
            .expect("config should parse");
        assert_eq!(config.starting_hand_size, 5);
        assert_eq!(config.deck.challenges, 10);
        assert_eq!(config.deck.einherjar, 40);
        assert_eq!(config.table_size, 3);
    }

    #[test]
    fn rejects_decks_that_cannot_deal() {
        let config = GameConfig::default().with_deck(DeckComposition {
            valkiria: 1,
            einherjar: 1,
            positive_modifiers: 0,
            negative_modifiers: 0,
            mutable_modifiers: 0,
            challenges: 0,
            modifier_magnitude: 1,
        });
        assert!(matches!(
            config.validate(),
            Err(RuleError::InvalidSetup { .. })
        ));
    }

    #[test]
    fn rejects_overflowing_counts() {
        let huge_deck = GameConfig::default().with_deck(DeckComposition {
            valkiria: u32::MAX,
            einherjar: 1,
            ..DeckComposition::default()
        });
        assert!(matches!(huge_deck.validate(), Err(RuleError::InvalidSetup { .. })));

        let huge_hands = GameConfig::default().with_starting_hand_size(usize::MAX);
        assert!(matches!(huge_hands.validate(), Err(RuleError::InvalidSetup { .. })));

        let json = format!(r#"{{ "deck": {{ "challenges": {} , "valkiria": 1 }} }}"#, u32::MAX);
        assert!(GameConfig::from_json(&json).is_err());
    }

    #[test]
    fn rejects_more_seats_than_player_ids() {
        let config = GameConfig {
            max_players: 257,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(RuleError::InvalidSetup { .. })));
        let config = GameConfig {
            max_players: 256,
            starting_hand_size: 0,
            ..GameConfig::default()
        };
        config.validate().expect("256 seats fit in a player id");
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(GameConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn rolls_stay_inside_range() {
        let mut rng = SmallRng::seed_from_u64(11);
        let dice = DiceRange::new(0, 3);
        for _ in 0..200 {
            let roll = dice.roll(&mut rng);
            assert!((0..=3).contains(&roll));
        }
    }
}
