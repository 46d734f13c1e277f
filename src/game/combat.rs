//! 战斗结算：攻击总值、伤亡规则与挑战对决。这里全部是纯函数，不触碰牌池。

use serde::{Deserialize, Serialize};

use super::cards::{Monster, Warrior, WarriorKind};
use super::gods::God;
use super::player::{Player, PlayerId};

/// 一次已结算的攻击，写入历史后不再修改。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttackRecord {
    pub attacker: PlayerId,
    pub target: Monster,
    pub compounded_strength: i32,
    pub dice_roll: i32,
    #[serde(default)]
    pub god_bonus: i32,
    pub modifier_sum: i32,
    pub total: i32,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub casualties: Vec<WarriorKind>,
}

pub fn attack_total(compounded_strength: i32, dice_roll: i32, god_bonus: i32, modifier_sum: i32) -> i32 {
    compounded_strength + dice_roll + god_bonus + modifier_sum
}

/// 在所有中断窗口关闭后结算攻击。`dice_roll` 为未计神祇加成的基础骰点。
pub fn resolve_attack(
    attacker: &Player,
    target: &Monster,
    dice_roll: i32,
    modifier_sum: i32,
) -> AttackRecord {
    let compounded_strength = attacker.compounded_strength();
    let god_bonus = attacker.god.attack_bonus().unwrap_or(0);
    let total = attack_total(compounded_strength, dice_roll, god_bonus, modifier_sum);
    let success = total >= target.required_strength;
    AttackRecord {
        attacker: attacker.id,
        target: target.clone(),
        compounded_strength,
        dice_roll,
        god_bonus,
        modifier_sum,
        total,
        success,
        casualties: casualties(&attacker.team, success),
    }
}

/// 攻击后损失的战士，按移除顺序。
///
/// 胜利损失一名 Einherjar，没有时损失一名 Valkiria。失败损失一名 Valkiria，
/// 没有时损失两名 Einherjar；不足两名则只损失现有的。
pub fn casualties(team: &[Warrior], success: bool) -> Vec<WarriorKind> {
    let count = |kind: WarriorKind| team.iter().filter(|w| w.kind == kind).count();
    let einherjar = count(WarriorKind::Einherjar);
    let valkiria = count(WarriorKind::Valkiria);

    if success {
        if einherjar > 0 {
            vec![WarriorKind::Einherjar]
        } else if valkiria > 0 {
            vec![WarriorKind::Valkiria]
        } else {
            Vec::new()
        }
    } else if valkiria > 0 {
        vec![WarriorKind::Valkiria]
    } else {
        vec![WarriorKind::Einherjar; einherjar.min(2)]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DuelWinner {
    Challenger,
    Defender,
}

/// 一对已计入神祇加成的挑战骰点。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DuelRound {
    pub challenger_roll: i32,
    pub defender_roll: i32,
    #[serde(default)]
    pub challenger_bonus: i32,
    #[serde(default)]
    pub defender_bonus: i32,
}

impl DuelRound {
    /// 挑战者的神祇优先；仅当挑战者没有加成时才计防守方加成。
    pub fn score(challenger_roll: i32, defender_roll: i32, challenger: &God, defender: &God) -> Self {
        let (challenger_bonus, defender_bonus) = match (challenger.challenge_bonus(), defender.challenge_bonus()) {
            (Some(bonus), _) => (bonus, 0),
            (None, Some(bonus)) => (0, bonus),
            (None, None) => (0, 0),
        };
        Self {
            challenger_roll: challenger_roll + challenger_bonus,
            defender_roll: defender_roll + defender_bonus,
            challenger_bonus,
            defender_bonus,
        }
    }

    pub fn winner(&self) -> Option<DuelWinner> {
        match self.challenger_roll.cmp(&self.defender_roll) {
            std::cmp::Ordering::Greater => Some(DuelWinner::Challenger),
            std::cmp::Ordering::Less => Some(DuelWinner::Defender),
            std::cmp::Ordering::Equal => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DuelOutcome {
    pub rounds: Vec<DuelRound>,
    pub winner: DuelWinner,
}

impl DuelOutcome {
    pub fn blocks_action(&self) -> bool {
        self.winner == DuelWinner::Challenger
    }

    pub fn deciding_round(&self) -> Option<&DuelRound> {
        self.rounds.last()
    }
}

/// 反复调用 `roll_pair`（挑战者在前）直到调整后的点数不同。
pub fn run_duel<F>(mut roll_pair: F, challenger: &God, defender: &God) -> DuelOutcome
where
    F: FnMut() -> (i32, i32),
{
    let mut rounds = Vec::new();
    loop {
        let (challenger_roll, defender_roll) = roll_pair();
        let round = DuelRound::score(challenger_roll, defender_roll, challenger, defender);
        rounds.push(round);
        if let Some(winner) = round.winner() {
            return DuelOutcome { rounds, winner };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::Warrior;

    fn player_with_team(god: God, team: &[WarriorKind]) -> Player {
        let mut player = Player::new(0, "Astrid", god);
        for (idx, kind) in team.iter().enumerate() {
            player.deploy(Warrior::new(idx as u32, *kind));
        }
        player
    }

    #[test]
    fn scenario_success_costs_an_einherjar() {
        let attacker = player_with_team(God::freya(), &[WarriorKind::Einherjar, WarriorKind::Valkiria]);
        let monster = Monster::new(1, "Troll", 8);
        let record = resolve_attack(&attacker, &monster, 1, 1);
        assert_eq!(record.compounded_strength, 6);
        assert_eq!(record.total, 8);
        assert!(record.success);
        assert_eq!(record.casualties, vec![WarriorKind::Einherjar]);
    }

    #[test]
    fn scenario_failure_without_valkiria_costs_two_einherjar() {
        let attacker = player_with_team(God::odin(), &[WarriorKind::Einherjar, WarriorKind::Einherjar]);
        let monster = Monster::new(1, "Jotun", 10);
        let record = resolve_attack(&attacker, &monster, 0, 0);
        assert_eq!(record.total, 4);
        assert!(!record.success);
        assert_eq!(record.casualties, vec![WarriorKind::Einherjar, WarriorKind::Einherjar]);
    }

    #[test]
    fn thor_adds_two_to_the_roll() {
        let attacker = player_with_team(God::thor(), &[WarriorKind::Valkiria]);
        let monster = Monster::new(1, "Hel", 7);
        let record = resolve_attack(&attacker, &monster, 1, 0);
        assert_eq!(record.god_bonus, 2);
        assert_eq!(record.total, 7);
        assert!(record.success);
    }

    #[test]
    fn success_without_einherjar_costs_a_valkiria() {
        let team = [Warrior::new(1, WarriorKind::Valkiria)];
        assert_eq!(casualties(&team, true), vec![WarriorKind::Valkiria]);
    }

    #[test]
    fn failure_prefers_valkiria() {
        let team = [
            Warrior::new(1, WarriorKind::Einherjar),
            Warrior::new(2, WarriorKind::Valkiria),
        ];
        assert_eq!(casualties(&team, false), vec![WarriorKind::Valkiria]);
    }

    #[test]
    fn failure_with_single_einherjar_is_clamped() {
        let team = [Warrior::new(1, WarriorKind::Einherjar)];
        assert_eq!(casualties(&team, false), vec![WarriorKind::Einherjar]);
        assert!(casualties(&[], false).is_empty());
    }

    #[test]
    fn scenario_defender_bonus_breaks_the_tie() {
        let outcome = run_duel(|| (3, 3), &God::thor(), &God::odin());
        assert_eq!(outcome.rounds.len(), 1);
        assert_eq!(outcome.rounds[0].defender_roll, 4);
        assert_eq!(outcome.winner, DuelWinner::Defender);
        assert!(!outcome.blocks_action());
    }

    #[test]
    fn challenger_bonus_takes_precedence() {
        let round = DuelRound::score(2, 2, &God::odin(), &God::odin());
        assert_eq!(round.challenger_bonus, 1);
        assert_eq!(round.defender_bonus, 0);
        assert_eq!(round.winner(), Some(DuelWinner::Challenger));
    }

    #[test]
    fn ties_are_rerolled() {
        let mut rolls = vec![(4, 1), (2, 2), (1, 1)];
        let outcome = run_duel(|| rolls.pop().unwrap_or((4, 1)), &God::freya(), &God::thor());
        assert_eq!(outcome.rounds.len(), 3);
        assert!(outcome.rounds[..2].iter().all(|round| round.winner().is_none()));
        assert_eq!(outcome.winner, DuelWinner::Challenger);
        assert!(outcome.blocks_action());
    }
}
