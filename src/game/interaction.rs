//! 引擎与外部协作者之间的接口：玩家输入与状态展示。

use std::collections::VecDeque;

use log::warn;
use serde::{Deserialize, Serialize};

use super::cards::{Card, CardId, ModifierSign, Monster, MonsterId};
use super::player::PlayerId;
use super::rules::ActionKind;
use super::state::GameState;

/// 选择或确认所针对的问题。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Prompt {
    /// “有人要挑战 `actor` 吗？”
    ChallengeWindow { actor: PlayerId, action: ActionKind },
    ChallengerSelection { actor: PlayerId },
    ConfirmChallenge { challenger: PlayerId, actor: PlayerId },
    /// “有人要对 `actor` 的攻击打出修正卡吗？”
    ModifierWindow { actor: PlayerId },
    ContributorSelection { actor: PlayerId },
    ConfirmModifier { contributor: PlayerId, actor: PlayerId },
    WarriorToDeploy { player: PlayerId },
    ModifierToPlay { player: PlayerId },
    /// 强制弃牌，例如挑战 Baldur 玩家时。
    CardToDiscard { player: PlayerId },
}

/// 玩家输入来源。所有调用都是阻塞式的一问一答。
pub trait Interaction {
    fn choose_action(&mut self, state: &GameState, player: PlayerId, offered: &[ActionKind]) -> ActionKind;

    fn choose_card(&mut self, state: &GameState, player: PlayerId, cards: &[Card], prompt: &Prompt) -> CardId;

    fn choose_monster(&mut self, state: &GameState, player: PlayerId, monsters: &[Monster]) -> MonsterId;

    fn choose_modifier_sign(&mut self, state: &GameState, player: PlayerId) -> ModifierSign;

    fn confirm(&mut self, state: &GameState, prompt: &Prompt) -> bool;

    fn choose_player(&mut self, state: &GameState, candidates: &[PlayerId], prompt: &Prompt) -> PlayerId;
}

/// 每次状态变化后接收完整对局。
pub trait Presentation {
    fn present(&mut self, state: &GameState);
}

/// [`ScriptedInteraction`] 队列中的一条答案。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value")]
pub enum Answer {
    Action(ActionKind),
    Card(CardId),
    Monster(MonsterId),
    Sign(ModifierSign),
    Confirm(bool),
    Player(PlayerId),
}

/// 按顺序回放固定答案。
///
/// 脚本耗尽或下一条答案不对应当前问题时，使用安全默认值：拒绝确认、取第一个候选、
/// 可变修正卡取正号。不匹配的答案保留在队列中。
#[derive(Debug, Clone, Default)]
pub struct ScriptedInteraction {
    answers: VecDeque<Answer>,
    fallbacks: usize,
}

impl ScriptedInteraction {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            fallbacks: 0,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let answers: Vec<Answer> = serde_json::from_str(json)?;
        Ok(Self::new(answers))
    }

    pub fn push(&mut self, answer: Answer) {
        self.answers.push_back(answer);
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.answers.is_empty()
    }

    /// 由默认值而非脚本回答的问题数。
    pub fn fallbacks(&self) -> usize {
        self.fallbacks
    }

    fn next<T>(&mut self, question: &str, extract: impl Fn(&Answer) -> Option<T>) -> Option<T> {
        let answer = self.answers.front().and_then(|answer| extract(answer));
        match answer {
            Some(value) => {
                self.answers.pop_front();
                Some(value)
            }
            None => {
                if let Some(unexpected) = self.answers.front() {
                    warn!("scripted answer {unexpected:?} does not fit {question}, using fallback");
                }
                self.fallbacks += 1;
                None
            }
        }
    }
}

impl Interaction for ScriptedInteraction {
    fn choose_action(&mut self, _state: &GameState, _player: PlayerId, offered: &[ActionKind]) -> ActionKind {
        self.next("choose_action", |answer| match answer {
            Answer::Action(action) => Some(*action),
            _ => None,
        })
        .or_else(|| offered.first().copied())
        .unwrap_or(ActionKind::DrawCard)
    }

    fn choose_card(&mut self, _state: &GameState, _player: PlayerId, cards: &[Card], _prompt: &Prompt) -> CardId {
        self.next("choose_card", |answer| match answer {
            Answer::Card(card_id) => Some(*card_id),
            _ => None,
        })
        .or_else(|| cards.first().map(Card::id))
        .unwrap_or_default()
    }

    fn choose_monster(&mut self, _state: &GameState, _player: PlayerId, monsters: &[Monster]) -> MonsterId {
        self.next("choose_monster", |answer| match answer {
            Answer::Monster(monster_id) => Some(*monster_id),
            _ => None,
        })
        .or_else(|| monsters.first().map(|monster| monster.id))
        .unwrap_or_default()
    }

    fn choose_modifier_sign(&mut self, _state: &GameState, _player: PlayerId) -> ModifierSign {
        self.next("choose_modifier_sign", |answer| match answer {
            Answer::Sign(sign) => Some(*sign),
            _ => None,
        })
        .unwrap_or(ModifierSign::Positive)
    }

    fn confirm(&mut self, _state: &GameState, _prompt: &Prompt) -> bool {
        self.next("confirm", |answer| match answer {
            Answer::Confirm(value) => Some(*value),
            _ => None,
        })
        .unwrap_or(false)
    }

    fn choose_player(&mut self, _state: &GameState, candidates: &[PlayerId], _prompt: &Prompt) -> PlayerId {
        self.next("choose_player", |answer| match answer {
            Answer::Player(player_id) => Some(*player_id),
            _ => None,
        })
        .or_else(|| candidates.first().copied())
        .unwrap_or_default()
    }
}

/// 保存收到的每个快照。
#[derive(Debug, Clone, Default)]
pub struct SnapshotRecorder {
    pub snapshots: Vec<GameState>,
}

impl Presentation for SnapshotRecorder {
    fn present(&mut self, state: &GameState) {
        self.snapshots.push(state.clone());
    }
}
