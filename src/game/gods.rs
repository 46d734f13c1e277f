use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// 神祇提供的加成效果。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type")]
pub enum GodEffect {
    /// 挑战对决时加到绑定玩家的骰点上。
    RollBonusOnChallenge { amount: i32 },
    /// 攻击怪物时加到绑定玩家的基础骰点上。
    RollBonusOnAttack { amount: i32 },
    /// 他人在绑定玩家的行动中打出修正卡时，绑定玩家抽牌。
    DrawOnOthersModifier { cards: u8 },
    /// 挑战绑定玩家者须先弃一张牌。
    ForceDiscardOnBeingChallenged,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct God {
    pub name: String,
    pub bonus: String,
    pub effect: GodEffect,
    announcement: String,
}

static ROSTER: Lazy<Vec<God>> = Lazy::new(|| {
    vec![
        God::new(
            "Odin",
            "When you roll dice during a Challenge, add 1 to your roll.",
            "Odin gives you 1 extra point!",
            GodEffect::RollBonusOnChallenge { amount: 1 },
        ),
        God::new(
            "Thor",
            "When you roll dice to defeat a Monster, add 2 to your roll.",
            "Thor gives you 2 extra strength!",
            GodEffect::RollBonusOnAttack { amount: 2 },
        ),
        God::new(
            "Freya",
            "When another player plays a Modifier card, draw one card.",
            "Thanks to Freya you get a card",
            GodEffect::DrawOnOthersModifier { cards: 1 },
        ),
        God::new(
            "Baldur",
            "When another player challenges you, they must discard a card from their hand.",
            "By Baldur's justice, your opponent is forced to discard a card.",
            GodEffect::ForceDiscardOnBeingChallenged,
        ),
    ]
});

impl God {
    pub fn new(
        name: impl Into<String>,
        bonus: impl Into<String>,
        announcement: impl Into<String>,
        effect: GodEffect,
    ) -> Self {
        Self {
            name: name.into(),
            bonus: bonus.into(),
            effect,
            announcement: announcement.into(),
        }
    }

    pub fn roster() -> &'static [God] {
        &ROSTER
    }

    pub fn by_name(name: &str) -> Option<God> {
        ROSTER
            .iter()
            .find(|god| god.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn odin() -> God {
        ROSTER[0].clone()
    }

    pub fn thor() -> God {
        ROSTER[1].clone()
    }

    pub fn freya() -> God {
        ROSTER[2].clone()
    }

    pub fn baldur() -> God {
        ROSTER[3].clone()
    }

    /// 加成生效时的播报文本，称呼绑定玩家。
    pub fn announcement(&self, player_name: &str) -> String {
        self.announcement
            .replace(" you ", &format!(" {player_name} "))
    }

    pub fn challenge_bonus(&self) -> Option<i32> {
        match self.effect {
            GodEffect::RollBonusOnChallenge { amount } => Some(amount),
            _ => None,
        }
    }

    pub fn attack_bonus(&self) -> Option<i32> {
        match self.effect {
            GodEffect::RollBonusOnAttack { amount } => Some(amount),
            _ => None,
        }
    }

    pub fn draws_on_others_modifier(&self) -> Option<u8> {
        match self.effect {
            GodEffect::DrawOnOthersModifier { cards } => Some(cards),
            _ => None,
        }
    }

    pub fn forces_challenger_discard(&self) -> bool {
        matches!(self.effect, GodEffect::ForceDiscardOnBeingChallenged)
    }
}
