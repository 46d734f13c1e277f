use std::collections::HashSet;

use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;

use super::cards::{Card, CardId, ModifierSign, Monster, MonsterId, WarriorKind};
use super::combat::{AttackRecord, DuelRound, DuelWinner};
use super::economy::CardEconomy;
use super::gods::God;
use super::player::{Player, PlayerId};
use super::rules::{ActionKind, RefusalReason, RuleError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum GameStatus {
    #[default]
    InProgress,
    Finished,
}

/// 回合内的阶段。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TurnPhase {
    #[default]
    TurnStart,
    FirstAction,
    SecondAction,
    TurnEnd,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VictoryState {
    pub winners: Vec<PlayerId>,
    pub trophies: usize,
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    HandDealt {
        player_id: PlayerId,
        cards: usize,
    },
    TurnStarted {
        player_id: PlayerId,
        turn: u32,
    },
    CardDrawn {
        player_id: PlayerId,
        card_id: CardId,
    },
    HandDiscarded {
        player_id: PlayerId,
        discarded: usize,
        drawn: usize,
    },
    CardDiscarded {
        player_id: PlayerId,
        card_id: CardId,
    },
    WarriorDeployed {
        player_id: PlayerId,
        card_id: CardId,
        kind: WarriorKind,
    },
    ChallengeDeclared {
        challenger: PlayerId,
        actor: PlayerId,
        action: ActionKind,
    },
    ChallengeRolled {
        challenger: PlayerId,
        actor: PlayerId,
        round: DuelRound,
    },
    ChallengeResolved {
        challenger: PlayerId,
        actor: PlayerId,
        winner: DuelWinner,
    },
    ActionBlocked {
        player_id: PlayerId,
        action: ActionKind,
        by: PlayerId,
    },
    ActionRefused {
        player_id: PlayerId,
        action: ActionKind,
        reason: RefusalReason,
    },
    ModifierSignFixed {
        player_id: PlayerId,
        card_id: CardId,
        sign: ModifierSign,
    },
    ModifierPlayed {
        player_id: PlayerId,
        actor: PlayerId,
        card_id: CardId,
        value: i32,
    },
    GodInvoked {
        player_id: PlayerId,
        god: String,
        message: String,
    },
    AttackRolled {
        player_id: PlayerId,
        roll: i32,
    },
    AttackResolved {
        record: AttackRecord,
    },
    WarriorLost {
        player_id: PlayerId,
        card_id: CardId,
        kind: WarriorKind,
    },
    MonsterDefeated {
        player_id: PlayerId,
        monster_id: MonsterId,
    },
    MonsterRevealed {
        monster: Monster,
    },
    RejectedCardsReshuffled {
        count: usize,
    },
    TurnEnded {
        player_id: PlayerId,
    },
    GameFinished {
        outcome: VictoryState,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    InvalidPlayerIndex { player_id: PlayerId },
    InvalidCurrentPlayer { player_id: PlayerId },
    DuplicateCardId { card_id: CardId },
    CardCountMismatch { expected: usize, actual: usize },
    TableOverfilled { on_table: usize, limit: usize },
}

/// 入座的玩家：神祇在此绑定，之后不再更换。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Seat {
    pub name: String,
    pub god: God,
}

impl Seat {
    pub fn new(name: impl Into<String>, god: God) -> Self {
        Self {
            name: name.into(),
            god,
        }
    }
}

/// 游戏整体状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GameState {
    #[serde(default)]
    pub players: Vec<Player>,
    pub current_player: PlayerId,
    pub turn: u32,
    #[serde(default)]
    pub phase: TurnPhase,
    #[serde(default)]
    pub status: GameStatus,
    #[serde(default)]
    pub economy: CardEconomy,
    #[serde(default)]
    pub table_size: usize,
    /// 开局时生成的小卡总数，之后保持不变。
    #[serde(default)]
    pub card_total: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attack_history: Vec<AttackRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<VictoryState>,
}

fn build_deck(config: &GameConfig) -> Vec<Card> {
    let deck = &config.deck;
    let mut next_id: CardId = 0;
    let mut id = || {
        let current = next_id;
        next_id += 1;
        current
    };
    let mut cards = Vec::with_capacity(deck.total().unwrap_or_default() as usize);
    for _ in 0..deck.valkiria {
        cards.push(Card::warrior(id(), WarriorKind::Valkiria));
    }
    for _ in 0..deck.einherjar {
        cards.push(Card::warrior(id(), WarriorKind::Einherjar));
    }
    for (count, sign) in [
        (deck.positive_modifiers, ModifierSign::Positive),
        (deck.negative_modifiers, ModifierSign::Negative),
        (deck.mutable_modifiers, ModifierSign::Undecided),
    ] {
        for _ in 0..count {
            cards.push(Card::modifier(id(), sign, deck.modifier_magnitude));
        }
    }
    for _ in 0..deck.challenges {
        cards.push(Card::challenge(id()));
    }
    cards
}

impl GameState {
    /// 生成并洗混牌库与怪物牌堆，按座位顺序发起始手牌，并翻开首批怪物。
    pub fn setup<R: Rng + ?Sized>(
        config: &GameConfig,
        seats: Vec<Seat>,
        rng: &mut R,
    ) -> Result<Self, RuleError> {
        config.validate()?;
        if seats.len() < config.min_players || seats.len() > config.max_players {
            return Err(RuleError::InvalidSetup {
                reason: format!(
                    "{} players seated, expected {}..={}",
                    seats.len(),
                    config.min_players,
                    config.max_players
                ),
            });
        }
        let mut names = HashSet::new();
        let mut gods = HashSet::new();
        for seat in &seats {
            if !names.insert(seat.name.as_str()) {
                return Err(RuleError::InvalidSetup {
                    reason: format!("player name {} is taken", seat.name),
                });
            }
            if !gods.insert(seat.god.name.as_str()) {
                return Err(RuleError::InvalidSetup {
                    reason: format!("{} is already bound to another player", seat.god.name),
                });
            }
        }

        let cards = build_deck(config);
        let monsters = config
            .monsters
            .iter()
            .enumerate()
            .map(|(idx, spec)| Monster::new(idx as MonsterId, spec.name.clone(), spec.required_strength))
            .collect();

        let mut state = GameState {
            players: seats
                .into_iter()
                .enumerate()
                .map(|(idx, seat)| Player::new(idx as PlayerId, seat.name, seat.god))
                .collect(),
            card_total: cards.len(),
            economy: CardEconomy::new(cards, monsters),
            table_size: config.table_size,
            turn: 1,
            ..GameState::default()
        };
        state.economy.shuffle_all(rng);

        for idx in 0..state.players.len() {
            let player = &mut state.players[idx];
            for _ in 0..config.starting_hand_size {
                player.draw(&mut state.economy, rng)?;
            }
            let event = GameEvent::HandDealt {
                player_id: player.id,
                cards: player.hand.len(),
            };
            state.record_event(event);
        }
        state.reveal_monsters();

        info!(
            "game set up for {} players with {} cards and {} monsters",
            state.players.len(),
            state.card_total,
            config.monsters.len()
        );
        Ok(state)
    }

    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    pub fn is_finished(&self) -> bool {
        self.status == GameStatus::Finished
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player, RuleError> {
        self.players
            .get(id as usize)
            .ok_or(RuleError::PlayerNotFound { player_id: id })
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, RuleError> {
        self.players
            .get_mut(id as usize)
            .ok_or(RuleError::PlayerNotFound { player_id: id })
    }

    /// 同时借出玩家与公共牌池。
    pub fn player_and_economy(
        &mut self,
        id: PlayerId,
    ) -> Result<(&mut Player, &mut CardEconomy), RuleError> {
        let player = self
            .players
            .get_mut(id as usize)
            .ok_or(RuleError::PlayerNotFound { player_id: id })?;
        Ok((player, &mut self.economy))
    }

    pub fn current(&self) -> Result<&Player, RuleError> {
        self.player(self.current_player)
    }

    /// 除 `id` 外的所有玩家，按座位顺序。
    pub fn others(&self, id: PlayerId) -> Vec<PlayerId> {
        self.players
            .iter()
            .map(|player| player.id)
            .filter(|other| *other != id)
            .collect()
    }

    pub fn next_player(&self) -> PlayerId {
        if self.players.is_empty() {
            return self.current_player;
        }
        ((self.current_player as usize + 1) % self.players.len()) as PlayerId
    }

    pub fn reveal_monsters(&mut self) -> usize {
        let revealed = self.economy.refill_table(self.table_size);
        let count = revealed.len();
        for monster in revealed {
            self.record_event(GameEvent::MonsterRevealed { monster });
        }
        count
    }

    /// 当前所有小卡的数量：两个牌池、全部手牌与战队。
    pub fn card_count(&self) -> usize {
        self.economy.pooled_card_count()
            + self
                .players
                .iter()
                .map(Player::card_count)
                .sum::<usize>()
    }

    /// 按击败怪物数排名，多者在前；并列时保持座位顺序。
    pub fn standings(&self) -> Vec<(PlayerId, usize)> {
        let mut standings: Vec<(PlayerId, usize)> = self
            .players
            .iter()
            .map(|player| (player.id, player.trophies.len()))
            .collect();
        standings.sort_by(|a, b| b.1.cmp(&a.1));
        standings
    }

    pub fn declare_finished(&mut self) -> VictoryState {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }
        let standings = self.standings();
        let best = standings.first().map(|(_, trophies)| *trophies).unwrap_or(0);
        let outcome = VictoryState {
            winners: standings
                .iter()
                .filter(|(_, trophies)| *trophies == best)
                .map(|(id, _)| *id)
                .collect(),
            trophies: best,
        };
        self.status = GameStatus::Finished;
        self.outcome = Some(outcome.clone());
        self.record_event(GameEvent::GameFinished {
            outcome: outcome.clone(),
        });
        info!("game finished, winners {:?}", outcome.winners);
        outcome
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        for (idx, player) in self.players.iter().enumerate() {
            if player.id as usize != idx {
                return Err(IntegrityError::InvalidPlayerIndex {
                    player_id: player.id,
                });
            }
        }
        if !self.players.is_empty() && self.current_player as usize >= self.players.len() {
            return Err(IntegrityError::InvalidCurrentPlayer {
                player_id: self.current_player,
            });
        }

        let mut seen = HashSet::new();
        let held = self
            .players
            .iter()
            .flat_map(|player| player.hand.iter().map(Card::id).chain(player.team.iter().map(|w| w.id)));
        for card_id in self.economy.pooled_cards().map(Card::id).chain(held) {
            if !seen.insert(card_id) {
                return Err(IntegrityError::DuplicateCardId { card_id });
            }
        }

        let actual = self.card_count();
        if actual != self.card_total {
            return Err(IntegrityError::CardCountMismatch {
                expected: self.card_total,
                actual,
            });
        }

        let on_table = self.economy.monsters_on_table.len();
        if on_table > self.table_size {
            return Err(IntegrityError::TableOverfilled {
                on_table,
                limit: self.table_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn seats() -> Vec<Seat> {
        vec![
            Seat::new("Astrid", God::odin()),
            Seat::new("Bjorn", God::thor()),
            Seat::new("Sigrid", God::freya()),
        ]
    }

    #[test]
    fn setup_deals_hands_and_reveals_table() {
        let mut rng = SmallRng::seed_from_u64(1);
        let config = GameConfig::default();
        let state = GameState::setup(&config, seats(), &mut rng).expect("setup should succeed");

        assert_eq!(state.players.len(), 3);
        assert!(state.players.iter().all(|player| player.hand.len() == 10));
        assert_eq!(state.economy.available_cards.len(), 70);
        assert_eq!(state.economy.monsters_on_table.len(), 3);
        assert_eq!(state.economy.available_monsters.len(), 6);
        assert_eq!(state.card_total, 100);
        assert_eq!(state.current_player, 0);
        state.integrity_check().expect("fresh game should be consistent");
    }

    #[test]
    fn setup_rejects_shared_gods() {
        let mut rng = SmallRng::seed_from_u64(1);
        let seats = vec![Seat::new("Astrid", God::odin()), Seat::new("Bjorn", God::odin())];
        let err = GameState::setup(&GameConfig::default(), seats, &mut rng)
            .expect_err("a god may only be bound once");
        assert!(matches!(err, RuleError::InvalidSetup { .. }));
    }

    #[test]
    fn setup_rejects_bad_player_counts() {
        let mut rng = SmallRng::seed_from_u64(1);
        let lonely = vec![Seat::new("Astrid", God::odin())];
        assert!(GameState::setup(&GameConfig::default(), lonely, &mut rng).is_err());
    }

    #[test]
    fn integrity_detects_lost_cards() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut state = GameState::setup(&GameConfig::default(), seats(), &mut rng).expect("setup");
        state.players[1].hand.pop();
        assert_eq!(
            state.integrity_check(),
            Err(IntegrityError::CardCountMismatch {
                expected: 100,
                actual: 99
            })
        );
    }

    #[test]
    fn integrity_detects_duplicates() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut state = GameState::setup(&GameConfig::default(), seats(), &mut rng).expect("setup");
        let copy = state.players[0].hand[0].clone();
        state.players[0].hand.pop();
        state.players[0].hand.push(copy.clone());
        assert_eq!(
            state.integrity_check(),
            Err(IntegrityError::DuplicateCardId { card_id: copy.id() })
        );
    }

    #[test]
    fn finishing_ranks_by_trophies() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut state = GameState::setup(&GameConfig::default(), seats(), &mut rng).expect("setup");
        state.players[1].trophies.push(Monster::new(90, "Hel", 18));
        state.players[2].trophies.push(Monster::new(91, "Garm", 18));

        let outcome = state.declare_finished();
        assert_eq!(outcome.winners, vec![1, 2]);
        assert_eq!(outcome.trophies, 1);
        assert!(state.is_finished());
        assert!(matches!(
            state.event_log.last(),
            Some(GameEvent::GameFinished { .. })
        ));
        assert_eq!(state.declare_finished(), outcome, "finishing is idempotent");
    }

    #[test]
    fn turn_order_is_cyclic() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut state = GameState::setup(&GameConfig::default(), seats(), &mut rng).expect("setup");
        state.current_player = 2;
        assert_eq!(state.next_player(), 0);
        assert_eq!(state.others(1), vec![0, 2]);
    }
}
