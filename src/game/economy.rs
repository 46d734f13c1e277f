use std::collections::VecDeque;

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::cards::{Card, Monster, MonsterId};
use super::rules::RuleError;

/// 公共牌池：可抽牌堆、弃牌堆以及怪物牌堆。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardEconomy {
    #[serde(default)]
    pub available_cards: VecDeque<Card>,
    #[serde(default)]
    pub rejected_cards: Vec<Card>,
    #[serde(default)]
    pub available_monsters: VecDeque<Monster>,
    #[serde(default)]
    pub monsters_on_table: Vec<Monster>,
}

impl CardEconomy {
    pub fn new(cards: Vec<Card>, monsters: Vec<Monster>) -> Self {
        Self {
            available_cards: cards.into(),
            rejected_cards: Vec::new(),
            available_monsters: monsters.into(),
            monsters_on_table: Vec::new(),
        }
    }

    pub fn shuffle_all<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.available_cards.make_contiguous().shuffle(rng);
        self.available_monsters.make_contiguous().shuffle(rng);
    }

    pub fn can_draw(&self) -> bool {
        !self.available_cards.is_empty() || !self.rejected_cards.is_empty()
    }

    /// 从牌堆顶抽一张；牌堆为空时先把弃牌堆洗回。
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Card, RuleError> {
        if self.available_cards.is_empty() {
            self.reshuffle_rejected(rng);
        }
        self.available_cards
            .pop_front()
            .ok_or(RuleError::EconomyExhausted)
    }

    pub fn reject(&mut self, card: Card) {
        self.rejected_cards.push(card);
    }

    pub fn reshuffle_rejected<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.rejected_cards.is_empty() {
            return;
        }
        debug!(
            "reshuffling {} rejected cards into the draw pile",
            self.rejected_cards.len()
        );
        self.available_cards.extend(self.rejected_cards.drain(..));
        self.available_cards.make_contiguous().shuffle(rng);
    }

    /// 翻开下一只怪物。调用方需先检查 `available_monsters`。
    pub fn draw_monster(&mut self) -> Option<&Monster> {
        let monster = self.available_monsters.pop_front()?;
        self.monsters_on_table.push(monster);
        self.monsters_on_table.last()
    }

    pub fn refill_table(&mut self, table_size: usize) -> Vec<Monster> {
        let mut revealed = Vec::new();
        while self.monsters_on_table.len() < table_size {
            match self.draw_monster() {
                Some(monster) => revealed.push(monster.clone()),
                None => break,
            }
        }
        revealed
    }

    pub fn monster_on_table(&self, monster_id: MonsterId) -> Option<&Monster> {
        self.monsters_on_table
            .iter()
            .find(|monster| monster.id == monster_id)
    }

    pub fn remove_monster(&mut self, monster_id: MonsterId) -> Result<Monster, RuleError> {
        let pos = self
            .monsters_on_table
            .iter()
            .position(|monster| monster.id == monster_id)
            .ok_or(RuleError::MonsterNotFound { monster_id })?;
        Ok(self.monsters_on_table.remove(pos))
    }

    pub fn monsters_exhausted(&self) -> bool {
        self.available_monsters.is_empty() && self.monsters_on_table.is_empty()
    }

    pub fn pooled_card_count(&self) -> usize {
        self.available_cards.len() + self.rejected_cards.len()
    }

    pub fn pooled_cards(&self) -> impl Iterator<Item = &Card> {
        self.available_cards.iter().chain(self.rejected_cards.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::WarriorKind;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    fn economy_with(count: u32) -> CardEconomy {
        let cards = (0..count)
            .map(|id| Card::warrior(id, WarriorKind::Einherjar))
            .collect();
        let monsters = (0..5)
            .map(|id| Monster::new(id, format!("Monster {id}"), 16))
            .collect();
        CardEconomy::new(cards, monsters)
    }

    #[test]
    fn draw_takes_the_head_of_the_pile() {
        let mut economy = economy_with(3);
        let card = economy.draw(&mut rng()).expect("draw should succeed");
        assert_eq!(card.id(), 0);
        assert_eq!(economy.available_cards.len(), 2);
    }

    #[test]
    fn draw_on_empty_pile_reshuffles_rejected_cards() {
        let mut economy = economy_with(0);
        economy.reject(Card::challenge(10));
        economy.reject(Card::challenge(11));

        let card = economy.draw(&mut rng()).expect("rejected pool should refill");
        assert!(card.id() == 10 || card.id() == 11);
        assert!(economy.rejected_cards.is_empty());
        assert_eq!(economy.available_cards.len(), 1);
    }

    #[test]
    fn draw_with_both_pools_empty_is_exhaustion() {
        let mut economy = economy_with(0);
        assert!(!economy.can_draw());
        assert_eq!(economy.draw(&mut rng()), Err(RuleError::EconomyExhausted));
    }

    #[test]
    fn refill_table_stops_when_pool_runs_out() {
        let mut economy = economy_with(0);
        let revealed = economy.refill_table(3);
        assert_eq!(revealed.len(), 3);
        assert_eq!(economy.available_monsters.len(), 2);

        economy.remove_monster(revealed[0].id).expect("monster on table");
        economy.remove_monster(revealed[1].id).expect("monster on table");
        let revealed = economy.refill_table(3);
        assert_eq!(revealed.len(), 2);
        assert_eq!(economy.monsters_on_table.len(), 3);
        assert!(economy.available_monsters.is_empty());
        assert!(economy.draw_monster().is_none());
    }

    #[test]
    fn removing_unknown_monster_fails() {
        let mut economy = economy_with(0);
        assert_eq!(
            economy.remove_monster(42),
            Err(RuleError::MonsterNotFound { monster_id: 42 })
        );
    }

    #[test]
    fn monsters_exhausted_needs_both_pools_empty() {
        let mut economy = CardEconomy::new(Vec::new(), vec![Monster::new(1, "Hel", 18)]);
        assert!(!economy.monsters_exhausted());
        economy.refill_table(3);
        assert!(!economy.monsters_exhausted());
        economy.remove_monster(1).expect("monster on table");
        assert!(economy.monsters_exhausted());
    }
}
