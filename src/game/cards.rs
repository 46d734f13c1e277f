use serde::{Deserialize, Serialize};

use super::rules::RuleError;

/// 全局唯一的卡牌标识。
pub type CardId = u32;
/// 怪物卡标识。
pub type MonsterId = u32;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WarriorKind {
    Einherjar,
    Valkiria,
}

impl WarriorKind {
    pub const fn strength(self) -> i32 {
        match self {
            WarriorKind::Einherjar => 2,
            WarriorKind::Valkiria => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            WarriorKind::Einherjar => "Einherjar",
            WarriorKind::Valkiria => "Valkiria",
        }
    }
}

/// 修正卡的符号。`Undecided` 只能被固定一次。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ModifierSign {
    Positive,
    Negative,
    Undecided,
}

impl ModifierSign {
    pub fn is_decided(self) -> bool {
        !matches!(self, ModifierSign::Undecided)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Warrior {
    pub id: CardId,
    pub kind: WarriorKind,
    pub strength: i32,
}

impl Warrior {
    pub fn new(id: CardId, kind: WarriorKind) -> Self {
        Self {
            id,
            kind,
            strength: kind.strength(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Modifier {
    pub id: CardId,
    pub sign: ModifierSign,
    pub magnitude: i32,
    /// 印刷时无符号；符号固定后仍为 true。
    #[serde(default)]
    pub mutable: bool,
}

impl Modifier {
    pub fn new(id: CardId, sign: ModifierSign, magnitude: i32) -> Self {
        Self {
            id,
            sign,
            magnitude,
            mutable: matches!(sign, ModifierSign::Undecided),
        }
    }

    pub fn value(&self) -> i32 {
        match self.sign {
            ModifierSign::Positive => self.magnitude,
            ModifierSign::Negative => -self.magnitude,
            ModifierSign::Undecided => 0,
        }
    }

    pub fn needs_sign(&self) -> bool {
        !self.sign.is_decided()
    }

    /// 固定未定符号。该选择对这张卡永久有效，洗回牌堆后再抽到也不变。
    pub fn fix_sign(&mut self, sign: ModifierSign) -> Result<(), RuleError> {
        if self.sign.is_decided() {
            return Err(RuleError::ModifierSignFixed { card_id: self.id });
        }
        if !sign.is_decided() {
            return Err(RuleError::InvalidAction {
                action: "fix_modifier_sign".into(),
                reason: "a modifier sign must resolve to Positive or Negative".into(),
            });
        }
        self.sign = sign;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Challenge {
    pub id: CardId,
}

/// 手牌中的小卡：战士、修正或挑战。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Card {
    Warrior(Warrior),
    Modifier(Modifier),
    Challenge(Challenge),
}

impl Card {
    pub fn warrior(id: CardId, kind: WarriorKind) -> Self {
        Card::Warrior(Warrior::new(id, kind))
    }

    pub fn modifier(id: CardId, sign: ModifierSign, magnitude: i32) -> Self {
        Card::Modifier(Modifier::new(id, sign, magnitude))
    }

    pub fn challenge(id: CardId) -> Self {
        Card::Challenge(Challenge { id })
    }

    pub fn id(&self) -> CardId {
        match self {
            Card::Warrior(warrior) => warrior.id,
            Card::Modifier(modifier) => modifier.id,
            Card::Challenge(challenge) => challenge.id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Card::Warrior(warrior) => warrior.kind.name(),
            Card::Modifier(modifier) => match modifier.sign {
                ModifierSign::Positive => "Positive",
                ModifierSign::Negative => "Negative",
                ModifierSign::Undecided => "Mutable",
            },
            Card::Challenge(_) => "Challenge",
        }
    }

    pub fn as_warrior(&self) -> Option<&Warrior> {
        match self {
            Card::Warrior(warrior) => Some(warrior),
            _ => None,
        }
    }

    pub fn as_modifier(&self) -> Option<&Modifier> {
        match self {
            Card::Modifier(modifier) => Some(modifier),
            _ => None,
        }
    }

    pub fn is_challenge(&self) -> bool {
        matches!(self, Card::Challenge(_))
    }
}

impl From<Warrior> for Card {
    fn from(warrior: Warrior) -> Self {
        Card::Warrior(warrior)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Monster {
    pub id: MonsterId,
    pub name: String,
    pub required_strength: i32,
}

impl Monster {
    pub fn new(id: MonsterId, name: impl Into<String>, required_strength: i32) -> Self {
        Self {
            id,
            name: name.into(),
            required_strength,
        }
    }
}
