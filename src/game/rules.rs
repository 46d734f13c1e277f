use log::{debug, info};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;

use super::cards::{Card, CardId};
use super::combat::{resolve_attack, AttackRecord};
use super::interaction::{Interaction, Presentation, Prompt};
use super::interrupts::PendingAction;
use super::player::PlayerId;
use super::state::{GameEvent, GameState, IntegrityError, Seat, TurnPhase, VictoryState};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActionKind {
    DeployWarrior,
    Attack,
    DiscardHand,
    DrawCard,
    /// 只能在挑战窗口中使用。
    PlayChallenge,
    /// 只能在修正窗口中使用。
    UseModifier,
}

impl ActionKind {
    /// Attack 与 DiscardHand 会结束整个回合。
    pub fn ends_turn(self) -> bool {
        matches!(self, ActionKind::Attack | ActionKind::DiscardHand)
    }

    pub fn is_interrupt(self) -> bool {
        matches!(self, ActionKind::PlayChallenge | ActionKind::UseModifier)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActionSlot {
    First,
    Second,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RefusalReason {
    InsufficientStrength { strength: i32, required: i32 },
}

/// 一次行动的结果。被拒绝是正常结果，不是错误。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ActionOutcome {
    Completed,
    Attacked { record: AttackRecord },
    Blocked { by: PlayerId },
    Refused { reason: RefusalReason },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("the game has already finished")]
    GameFinished,
    #[error("player {player_id} does not exist")]
    PlayerNotFound { player_id: PlayerId },
    #[error("card {card_id:?} not found for player {player_id}")]
    CardNotFound {
        player_id: PlayerId,
        card_id: Option<CardId>,
    },
    #[error("monster {monster_id} is not on the table")]
    MonsterNotFound { monster_id: u32 },
    #[error("both the draw pile and the reject pile are empty")]
    EconomyExhausted,
    #[error("invalid action {action}: {reason}")]
    InvalidAction { action: String, reason: String },
    #[error("modifier {card_id} already has a fixed sign")]
    ModifierSignFixed { card_id: CardId },
    #[error("invalid setup: {reason}")]
    InvalidSetup { reason: String },
    #[error("state integrity violated: {error:?}")]
    IntegrityViolation { error: IntegrityError },
}

impl RuleError {
    pub(crate) fn invalid(action: ActionKind, reason: impl Into<String>) -> Self {
        RuleError::InvalidAction {
            action: format!("{action:?}"),
            reason: reason.into(),
        }
    }
}

/// 一次 [`RuleEngine::play_turn`] 调用中发生的全部事件。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReport {
    pub player_id: PlayerId,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<VictoryState>,
}

/// 回合状态机：选择行动、打开中断窗口、结算并推进回合。
pub struct RuleEngine {
    pub(crate) config: GameConfig,
    pub(crate) rng: SmallRng,
    presenters: Vec<Box<dyn Presentation>>,
}

impl RuleEngine {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
            presenters: Vec::new(),
        }
    }

    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
            presenters: Vec::new(),
        }
    }

    pub fn with_presentation(mut self, presentation: impl Presentation + 'static) -> Self {
        self.presenters.push(Box::new(presentation));
        self
    }

    /// 清空已注册的展示者，只保留 `presentation`。
    pub fn replace_presentation(&mut self, presentation: impl Presentation + 'static) {
        self.presenters.clear();
        self.presenters.push(Box::new(presentation));
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn new_game(&mut self, seats: Vec<Seat>) -> Result<GameState, RuleError> {
        let state = GameState::setup(&self.config, seats, &mut self.rng)?;
        self.notify(&state);
        Ok(state)
    }

    pub(crate) fn notify(&mut self, state: &GameState) {
        for presenter in &mut self.presenters {
            presenter.present(state);
        }
    }

    pub(crate) fn record(&mut self, state: &mut GameState, event: GameEvent) {
        debug!("{event:?}");
        state.record_event(event);
        self.notify(state);
    }

    fn ensure_integrity(state: &GameState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    fn is_eligible(&self, state: &GameState, player_id: PlayerId, action: ActionKind) -> Result<bool, RuleError> {
        let player = state.player(player_id)?;
        Ok(match action {
            ActionKind::DeployWarrior => player.has_warrior(),
            ActionKind::Attack => {
                !player.team.is_empty() && !state.economy.monsters_on_table.is_empty()
            }
            ActionKind::DiscardHand => true,
            ActionKind::DrawCard => state.economy.can_draw(),
            ActionKind::PlayChallenge | ActionKind::UseModifier => false,
        })
    }

    /// 当前玩家在该行动位可选的行动，按菜单顺序。
    pub fn offered_actions(&self, state: &GameState, slot: ActionSlot) -> Result<Vec<ActionKind>, RuleError> {
        let menu: &[ActionKind] = match slot {
            ActionSlot::First => &[
                ActionKind::DeployWarrior,
                ActionKind::Attack,
                ActionKind::DiscardHand,
                ActionKind::DrawCard,
            ],
            ActionSlot::Second => &[ActionKind::DeployWarrior, ActionKind::DrawCard],
        };
        let mut offered = Vec::with_capacity(menu.len());
        for action in menu {
            if self.is_eligible(state, state.current_player, *action)? {
                offered.push(*action);
            }
        }
        Ok(offered)
    }

    /// 为当前玩家进行完整一回合并推进到下一位。
    pub fn play_turn(&mut self, state: &mut GameState, io: &mut dyn Interaction) -> Result<TurnReport, RuleError> {
        if state.is_finished() {
            return Err(RuleError::GameFinished);
        }
        Self::ensure_integrity(state)?;

        let first_event = state.event_log.len();
        let actor = state.current_player;
        state.phase = TurnPhase::TurnStart;
        let turn = state.turn;
        self.record(state, GameEvent::TurnStarted { player_id: actor, turn });
        info!("turn {} for {}", state.turn, state.current()?.name);

        state.phase = TurnPhase::FirstAction;
        let first = self.play_slot(state, io, ActionSlot::First)?;
        if !first.map(ActionKind::ends_turn).unwrap_or(false) {
            state.phase = TurnPhase::SecondAction;
            self.play_slot(state, io, ActionSlot::Second)?;
        }

        self.end_turn(state)?;
        Self::ensure_integrity(state)?;

        Ok(TurnReport {
            player_id: actor,
            events: state.event_log[first_event..].to_vec(),
            outcome: state.outcome.clone(),
        })
    }

    /// 连续进行回合，直到游戏结束或达到 `turn_limit`。
    pub fn play_until_finished(
        &mut self,
        state: &mut GameState,
        io: &mut dyn Interaction,
        turn_limit: usize,
    ) -> Result<Option<VictoryState>, RuleError> {
        for _ in 0..turn_limit {
            if state.is_finished() {
                break;
            }
            self.play_turn(state, io)?;
        }
        Ok(state.outcome.clone())
    }

    /// 反复询问直到有行动被接受；被拒绝的行动在同一行动位不再提供。
    /// 无可选行动时返回 `None`。
    fn play_slot(
        &mut self,
        state: &mut GameState,
        io: &mut dyn Interaction,
        slot: ActionSlot,
    ) -> Result<Option<ActionKind>, RuleError> {
        let actor = state.current_player;
        let mut refused: Vec<ActionKind> = Vec::new();
        loop {
            let offered: Vec<ActionKind> = self
                .offered_actions(state, slot)?
                .into_iter()
                .filter(|action| !refused.contains(action))
                .collect();
            if offered.is_empty() {
                debug!("nothing to offer player {actor} in {slot:?} slot");
                return Ok(None);
            }

            let choice = io.choose_action(state, actor, &offered);
            if !offered.contains(&choice) {
                return Err(RuleError::invalid(choice, "action was not offered"));
            }

            match self.execute_action(state, io, actor, choice)? {
                ActionOutcome::Refused { .. } => refused.push(choice),
                _ => return Ok(Some(choice)),
            }
        }
    }

    /// 为 `actor` 执行单个行动，包括它打开的中断窗口。
    pub fn execute_action(
        &mut self,
        state: &mut GameState,
        io: &mut dyn Interaction,
        actor: PlayerId,
        action: ActionKind,
    ) -> Result<ActionOutcome, RuleError> {
        if state.is_finished() {
            return Err(RuleError::GameFinished);
        }
        if action.is_interrupt() {
            return Err(RuleError::invalid(action, "only playable inside an interrupt window"));
        }
        if !self.is_eligible(state, actor, action)? {
            return Err(RuleError::invalid(action, "preconditions not met"));
        }
        match action {
            ActionKind::DeployWarrior => self.deploy_warrior(state, io, actor),
            ActionKind::Attack => self.attack(state, io, actor),
            ActionKind::DiscardHand => self.discard_hand(state, actor),
            ActionKind::DrawCard => self.draw_card(state, actor),
            ActionKind::PlayChallenge | ActionKind::UseModifier => {
                Err(RuleError::invalid(action, "only playable inside an interrupt window"))
            }
        }
    }

    fn deploy_warrior(
        &mut self,
        state: &mut GameState,
        io: &mut dyn Interaction,
        actor: PlayerId,
    ) -> Result<ActionOutcome, RuleError> {
        let candidates = state.player(actor)?.warriors_in_hand();
        let card_id = io.choose_card(state, actor, &candidates, &Prompt::WarriorToDeploy { player: actor });
        let kind = candidates
            .iter()
            .find(|card| card.id() == card_id)
            .and_then(Card::as_warrior)
            .map(|warrior| warrior.kind)
            .ok_or_else(|| RuleError::invalid(ActionKind::DeployWarrior, "chosen card is not a warrior in hand"))?;

        let pending = self.challenge_window(state, io, PendingAction::new(actor, ActionKind::DeployWarrior))?;
        if let Some(by) = pending.blocked_by {
            return Ok(ActionOutcome::Blocked { by });
        }

        let player = state.player_mut(actor)?;
        let warrior = player.take_warrior(kind)?;
        let card_id = warrior.id;
        player.deploy(warrior);
        self.record(
            state,
            GameEvent::WarriorDeployed {
                player_id: actor,
                card_id,
                kind,
            },
        );
        Ok(ActionOutcome::Completed)
    }

    fn attack(
        &mut self,
        state: &mut GameState,
        io: &mut dyn Interaction,
        actor: PlayerId,
    ) -> Result<ActionOutcome, RuleError> {
        let strength = state.player(actor)?.compounded_strength();
        if strength < self.config.min_attack_strength {
            let reason = RefusalReason::InsufficientStrength {
                strength,
                required: self.config.min_attack_strength,
            };
            self.record(
                state,
                GameEvent::ActionRefused {
                    player_id: actor,
                    action: ActionKind::Attack,
                    reason: reason.clone(),
                },
            );
            return Ok(ActionOutcome::Refused { reason });
        }

        let pending = self.challenge_window(state, io, PendingAction::new(actor, ActionKind::Attack))?;
        if let Some(by) = pending.blocked_by {
            return Ok(ActionOutcome::Blocked { by });
        }
        let pending = self.modifier_window(state, io, pending)?;

        let table = state.economy.monsters_on_table.clone();
        let monster_id = io.choose_monster(state, actor, &table);
        let target = state
            .economy
            .monster_on_table(monster_id)
            .cloned()
            .ok_or(RuleError::MonsterNotFound { monster_id })?;

        let roll = self.config.attack_roll.roll(&mut self.rng);
        self.record(state, GameEvent::AttackRolled { player_id: actor, roll });
        let player = state.player(actor)?;
        if player.god.attack_bonus().is_some() {
            let event = GameEvent::GodInvoked {
                player_id: actor,
                god: player.god.name.clone(),
                message: player.god.announcement(&player.name),
            };
            self.record(state, event);
        }

        let pending = self.modifier_window(state, io, pending)?;

        let record = resolve_attack(state.player(actor)?, &target, roll, pending.modifier_sum);
        info!(
            "player {actor} attacked {} with {} (needed {}): {}",
            target.name,
            record.total,
            target.required_strength,
            if record.success { "defeated" } else { "repelled" }
        );

        let mut lost = Vec::with_capacity(record.casualties.len());
        {
            let (player, economy) = state.player_and_economy(actor)?;
            for kind in &record.casualties {
                lost.push(player.remove_from_team(*kind, economy)?);
            }
            if record.success {
                let monster = economy.remove_monster(target.id)?;
                player.trophies.push(monster);
            }
        }

        state.attack_history.push(record.clone());
        self.record(state, GameEvent::AttackResolved { record: record.clone() });
        for warrior in lost {
            self.record(
                state,
                GameEvent::WarriorLost {
                    player_id: actor,
                    card_id: warrior.id,
                    kind: warrior.kind,
                },
            );
        }
        if record.success {
            self.record(
                state,
                GameEvent::MonsterDefeated {
                    player_id: actor,
                    monster_id: target.id,
                },
            );
        }
        Ok(ActionOutcome::Attacked { record })
    }

    fn discard_hand(&mut self, state: &mut GameState, actor: PlayerId) -> Result<ActionOutcome, RuleError> {
        let hand_size = self.config.starting_hand_size;
        let (player, economy) = state.player_and_economy(actor)?;
        let discarded = player.hand.len();
        let drawn = player.discard_hand(economy, hand_size, &mut self.rng)?;
        self.record(
            state,
            GameEvent::HandDiscarded {
                player_id: actor,
                discarded,
                drawn: drawn.len(),
            },
        );
        Ok(ActionOutcome::Completed)
    }

    fn draw_card(&mut self, state: &mut GameState, actor: PlayerId) -> Result<ActionOutcome, RuleError> {
        let (player, economy) = state.player_and_economy(actor)?;
        let card_id = player.draw(economy, &mut self.rng)?;
        self.record(state, GameEvent::CardDrawn { player_id: actor, card_id });
        Ok(ActionOutcome::Completed)
    }

    /// 回合边界：补满桌面怪物、补充牌堆，然后结束游戏或轮到下一位。
    fn end_turn(&mut self, state: &mut GameState) -> Result<(), RuleError> {
        state.phase = TurnPhase::TurnEnd;
        let actor = state.current_player;
        self.record(state, GameEvent::TurnEnded { player_id: actor });

        if state.reveal_monsters() > 0 {
            self.notify(state);
        }
        if state.economy.available_cards.is_empty() && !state.economy.rejected_cards.is_empty() {
            let count = state.economy.rejected_cards.len();
            state.economy.reshuffle_rejected(&mut self.rng);
            self.record(state, GameEvent::RejectedCardsReshuffled { count });
        }

        if state.economy.monsters_exhausted() {
            state.declare_finished();
            self.notify(state);
            return Ok(());
        }

        state.current_player = state.next_player();
        state.turn += 1;
        state.phase = TurnPhase::TurnStart;
        Ok(())
    }
}
