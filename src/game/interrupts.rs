//! 中断窗口：挑战窗口（可阻止部署或攻击）与修正窗口（调整攻击总值）。
//!
//! 窗口都是循环：每轮询问是否有人介入，选出介入者并让其确认，直到无人介入。

use log::{debug, info};

use super::cards::Card;
use super::combat::{run_duel, DuelRound, DuelWinner};
use super::interaction::{Interaction, Prompt};
use super::player::PlayerId;
use super::rules::{ActionKind, RuleEngine, RuleError};
use super::state::{GameEvent, GameState};

/// 等待中断窗口关闭的行动。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub actor: PlayerId,
    pub action: ActionKind,
    pub modifier_sum: i32,
    pub blocked_by: Option<PlayerId>,
}

impl PendingAction {
    pub fn new(actor: PlayerId, action: ActionKind) -> Self {
        Self {
            actor,
            action,
            modifier_sum: 0,
            blocked_by: None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked_by.is_some()
    }
}

impl RuleEngine {
    /// 持有挑战卡的对手可以挑战 `pending`；首个赢得对决者阻止该行动并关闭窗口。
    pub fn challenge_window(
        &mut self,
        state: &mut GameState,
        io: &mut dyn Interaction,
        mut pending: PendingAction,
    ) -> Result<PendingAction, RuleError> {
        let actor = pending.actor;
        while !pending.is_blocked() {
            let eligible: Vec<PlayerId> = state
                .others(actor)
                .into_iter()
                .filter(|id| state.players[*id as usize].has_challenge())
                .collect();
            if eligible.is_empty() {
                break;
            }
            let window = Prompt::ChallengeWindow {
                actor,
                action: pending.action,
            };
            if !io.confirm(state, &window) {
                break;
            }

            let challenger = io.choose_player(state, &eligible, &Prompt::ChallengerSelection { actor });
            if !eligible.contains(&challenger) {
                return Err(RuleError::invalid(
                    ActionKind::PlayChallenge,
                    format!("player {challenger} cannot challenge now"),
                ));
            }
            if !io.confirm(state, &Prompt::ConfirmChallenge { challenger, actor }) {
                debug!("player {challenger} backed out of challenging {actor}");
                continue;
            }

            if self.run_challenge(state, io, challenger, &pending)? == DuelWinner::Challenger {
                self.record(
                    state,
                    GameEvent::ActionBlocked {
                        player_id: actor,
                        action: pending.action,
                        by: challenger,
                    },
                );
                pending.blocked_by = Some(challenger);
            }
        }
        Ok(pending)
    }

    fn run_challenge(
        &mut self,
        state: &mut GameState,
        io: &mut dyn Interaction,
        challenger: PlayerId,
        pending: &PendingAction,
    ) -> Result<DuelWinner, RuleError> {
        let actor = pending.actor;
        let challenger_god = state.player(challenger)?.god.clone();
        let defender_god = state.player(actor)?.god.clone();
        let dice = self.config.challenge_roll;
        // 单值骰且双方都没有加成时，平局永远无法打破。
        if dice.min == dice.max
            && DuelRound::score(dice.min, dice.max, &challenger_god, &defender_god)
                .winner()
                .is_none()
        {
            return Err(RuleError::InvalidSetup {
                reason: format!(
                    "challenge die always rolls {} and neither {} nor {} breaks the tie",
                    dice.min, challenger_god.name, defender_god.name
                ),
            });
        }

        let card = state.player_mut(challenger)?.take_challenge()?;
        self.record(
            state,
            GameEvent::ChallengeDeclared {
                challenger,
                actor,
                action: pending.action,
            },
        );

        let defender = state.player(actor)?;
        if defender.god.forces_challenger_discard() && !state.player(challenger)?.hand.is_empty() {
            let event = GameEvent::GodInvoked {
                player_id: actor,
                god: defender.god.name.clone(),
                message: defender.god.announcement(&defender.name),
            };
            self.record(state, event);

            let hand = state.player(challenger)?.hand.clone();
            let card_id = io.choose_card(state, challenger, &hand, &Prompt::CardToDiscard { player: challenger });
            let (player, economy) = state.player_and_economy(challenger)?;
            player.discard_one(card_id, economy)?;
            self.record(
                state,
                GameEvent::CardDiscarded {
                    player_id: challenger,
                    card_id,
                },
            );
        }

        let rng = &mut self.rng;
        let outcome = run_duel(|| (dice.roll(rng), dice.roll(rng)), &challenger_god, &defender_god);

        for round in &outcome.rounds {
            self.record(
                state,
                GameEvent::ChallengeRolled {
                    challenger,
                    actor,
                    round: *round,
                },
            );
        }
        if let Some(round) = outcome.deciding_round() {
            let bonus = [
                (challenger, round.challenger_bonus),
                (actor, round.defender_bonus),
            ];
            for (player_id, amount) in bonus {
                if amount != 0 {
                    let player = state.player(player_id)?;
                    let event = GameEvent::GodInvoked {
                        player_id,
                        god: player.god.name.clone(),
                        message: player.god.announcement(&player.name),
                    };
                    self.record(state, event);
                }
            }
        }

        state.economy.reject(card);
        self.record(
            state,
            GameEvent::ChallengeResolved {
                challenger,
                actor,
                winner: outcome.winner,
            },
        );
        info!(
            "player {challenger} challenged player {actor}: {:?} wins after {} round(s)",
            outcome.winner,
            outcome.rounds.len()
        );
        Ok(outcome.winner)
    }

    /// 任何持有修正卡的玩家（含攻击者）都可调整待结算攻击；可变修正卡首次打出时固定符号。
    pub fn modifier_window(
        &mut self,
        state: &mut GameState,
        io: &mut dyn Interaction,
        mut pending: PendingAction,
    ) -> Result<PendingAction, RuleError> {
        let actor = pending.actor;
        loop {
            let eligible: Vec<PlayerId> = state
                .players
                .iter()
                .filter(|player| player.has_modifier(None))
                .map(|player| player.id)
                .collect();
            if eligible.is_empty() || !io.confirm(state, &Prompt::ModifierWindow { actor }) {
                break;
            }

            let contributor = io.choose_player(state, &eligible, &Prompt::ContributorSelection { actor });
            if !eligible.contains(&contributor) {
                return Err(RuleError::invalid(
                    ActionKind::UseModifier,
                    format!("player {contributor} holds no modifier"),
                ));
            }
            if !io.confirm(state, &Prompt::ConfirmModifier { contributor, actor }) {
                continue;
            }

            let value = self.play_modifier(state, io, contributor, actor)?;
            pending.modifier_sum += value;
        }
        Ok(pending)
    }

    fn play_modifier(
        &mut self,
        state: &mut GameState,
        io: &mut dyn Interaction,
        contributor: PlayerId,
        actor: PlayerId,
    ) -> Result<i32, RuleError> {
        let candidates = state.player(contributor)?.modifiers_in_hand();
        let card_id = io.choose_card(state, contributor, &candidates, &Prompt::ModifierToPlay { player: contributor });
        if !candidates.iter().any(|card| card.id() == card_id) {
            return Err(RuleError::invalid(
                ActionKind::UseModifier,
                format!("card {card_id} is not a modifier in hand"),
            ));
        }

        let mut card = state.player_mut(contributor)?.take_card(card_id)?;
        let mut fixed = None;
        if let Card::Modifier(modifier) = &mut card {
            if modifier.needs_sign() {
                let sign = io.choose_modifier_sign(state, contributor);
                if let Err(err) = modifier.fix_sign(sign) {
                    state.player_mut(contributor)?.hand.push(card);
                    return Err(err);
                }
                fixed = Some(sign);
            }
        }
        let value = card.as_modifier().map(|modifier| modifier.value()).unwrap_or(0);

        if let Some(sign) = fixed {
            self.record(
                state,
                GameEvent::ModifierSignFixed {
                    player_id: contributor,
                    card_id,
                    sign,
                },
            );
        }
        state.economy.reject(card);
        self.record(
            state,
            GameEvent::ModifierPlayed {
                player_id: contributor,
                actor,
                card_id,
                value,
            },
        );

        if contributor != actor {
            self.reward_modifier_target(state, actor)?;
        }
        Ok(value)
    }

    /// Freya 的祝福：他人对攻击者打出修正卡时，攻击者抽牌。
    fn reward_modifier_target(&mut self, state: &mut GameState, actor: PlayerId) -> Result<(), RuleError> {
        let player = state.player(actor)?;
        let Some(cards) = player.god.draws_on_others_modifier() else {
            return Ok(());
        };
        let event = GameEvent::GodInvoked {
            player_id: actor,
            god: player.god.name.clone(),
            message: player.god.announcement(&player.name),
        };
        self.record(state, event);

        for _ in 0..cards {
            if !state.economy.can_draw() {
                break;
            }
            let (player, economy) = state.player_and_economy(actor)?;
            let card_id = player.draw(economy, &mut self.rng)?;
            self.record(state, GameEvent::CardDrawn { player_id: actor, card_id });
        }
        Ok(())
    }
}
