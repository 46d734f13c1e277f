use rand::Rng;
use serde::{Deserialize, Serialize};

use super::cards::{Card, CardId, Modifier, ModifierSign, Monster, Warrior, WarriorKind};
use super::economy::CardEconomy;
use super::gods::God;
use super::rules::RuleError;

/// 玩家标识，同时也是座位顺序。
pub type PlayerId = u8;

/// 玩家状态：手牌、已部署的战队与击败的怪物。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub god: God,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hand: Vec<Card>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub team: Vec<Warrior>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trophies: Vec<Monster>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, god: God) -> Self {
        Self {
            id,
            name: name.into(),
            god,
            hand: Vec::new(),
            team: Vec::new(),
            trophies: Vec::new(),
        }
    }

    pub fn compounded_strength(&self) -> i32 {
        self.team.iter().map(|warrior| warrior.strength).sum()
    }

    pub fn has_warrior(&self) -> bool {
        self.hand.iter().any(|card| card.as_warrior().is_some())
    }

    /// 传 `None` 时任意修正卡都算。
    pub fn has_modifier(&self, sign: Option<ModifierSign>) -> bool {
        self.hand.iter().any(|card| match (card.as_modifier(), sign) {
            (Some(_), None) => true,
            (Some(modifier), Some(sign)) => modifier.sign == sign,
            (None, _) => false,
        })
    }

    pub fn has_challenge(&self) -> bool {
        self.hand.iter().any(Card::is_challenge)
    }

    pub fn has_in_team(&self, kind: WarriorKind) -> bool {
        self.team.iter().any(|warrior| warrior.kind == kind)
    }

    pub fn count_in_team(&self, kind: WarriorKind) -> usize {
        self.team.iter().filter(|warrior| warrior.kind == kind).count()
    }

    pub fn warriors_in_hand(&self) -> Vec<Card> {
        self.hand
            .iter()
            .filter(|card| card.as_warrior().is_some())
            .cloned()
            .collect()
    }

    pub fn modifiers_in_hand(&self) -> Vec<Card> {
        self.hand
            .iter()
            .filter(|card| card.as_modifier().is_some())
            .cloned()
            .collect()
    }

    pub fn find_card_in_hand_index(&self, card_id: CardId) -> Option<usize> {
        self.hand.iter().position(|card| card.id() == card_id)
    }

    fn not_found(&self, card_id: Option<CardId>) -> RuleError {
        RuleError::CardNotFound {
            player_id: self.id,
            card_id,
        }
    }

    pub fn take_card(&mut self, card_id: CardId) -> Result<Card, RuleError> {
        let idx = self
            .find_card_in_hand_index(card_id)
            .ok_or_else(|| self.not_found(Some(card_id)))?;
        Ok(self.hand.remove(idx))
    }

    pub fn take_warrior(&mut self, kind: WarriorKind) -> Result<Warrior, RuleError> {
        let idx = self
            .hand
            .iter()
            .position(|card| matches!(card, Card::Warrior(warrior) if warrior.kind == kind))
            .ok_or_else(|| self.not_found(None))?;
        match self.hand.remove(idx) {
            Card::Warrior(warrior) => Ok(warrior),
            other => {
                let card_id = other.id();
                self.hand.insert(idx, other);
                Err(self.not_found(Some(card_id)))
            }
        }
    }

    pub fn take_modifier(&mut self, sign: ModifierSign) -> Result<Modifier, RuleError> {
        let idx = self
            .hand
            .iter()
            .position(|card| matches!(card, Card::Modifier(modifier) if modifier.sign == sign))
            .ok_or_else(|| self.not_found(None))?;
        match self.hand.remove(idx) {
            Card::Modifier(modifier) => Ok(modifier),
            other => {
                let card_id = other.id();
                self.hand.insert(idx, other);
                Err(self.not_found(Some(card_id)))
            }
        }
    }

    pub fn take_challenge(&mut self) -> Result<Card, RuleError> {
        let idx = self
            .hand
            .iter()
            .position(Card::is_challenge)
            .ok_or_else(|| self.not_found(None))?;
        Ok(self.hand.remove(idx))
    }

    pub fn deploy(&mut self, warrior: Warrior) {
        self.team.push(warrior);
    }

    /// 从战队移除第一名 `kind` 战士并放入弃牌堆。
    pub fn remove_from_team(
        &mut self,
        kind: WarriorKind,
        economy: &mut CardEconomy,
    ) -> Result<Warrior, RuleError> {
        let idx = self
            .team
            .iter()
            .position(|warrior| warrior.kind == kind)
            .ok_or_else(|| self.not_found(None))?;
        let warrior = self.team.remove(idx);
        economy.reject(Card::Warrior(warrior.clone()));
        Ok(warrior)
    }

    pub fn draw<R: Rng + ?Sized>(
        &mut self,
        economy: &mut CardEconomy,
        rng: &mut R,
    ) -> Result<CardId, RuleError> {
        let card = economy.draw(rng)?;
        let card_id = card.id();
        self.hand.push(card);
        Ok(card_id)
    }

    /// 弃掉整手牌后重抽 `hand_size` 张；牌几乎都在手牌和战队中时可能抽不满。
    pub fn discard_hand<R: Rng + ?Sized>(
        &mut self,
        economy: &mut CardEconomy,
        hand_size: usize,
        rng: &mut R,
    ) -> Result<Vec<CardId>, RuleError> {
        for card in self.hand.drain(..) {
            economy.reject(card);
        }
        let mut drawn = Vec::with_capacity(hand_size);
        while drawn.len() < hand_size && economy.can_draw() {
            drawn.push(self.draw(economy, rng)?);
        }
        Ok(drawn)
    }

    pub fn discard_one(
        &mut self,
        card_id: CardId,
        economy: &mut CardEconomy,
    ) -> Result<Card, RuleError> {
        let card = self.take_card(card_id)?;
        economy.reject(card.clone());
        Ok(card)
    }

    pub fn card_count(&self) -> usize {
        self.hand.len() + self.team.len()
    }
}
