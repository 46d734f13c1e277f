//! 游戏核心逻辑模块（牌池、玩家、战斗结算、中断窗口、回合状态机）。

pub mod cards;
pub mod combat;
pub mod economy;
pub mod gods;
pub mod interaction;
pub mod interrupts;
pub mod player;
pub mod rules;
pub mod state;

pub use cards::{
    Card,
    CardId,
    Challenge,
    Modifier,
    ModifierSign,
    Monster,
    MonsterId,
    Warrior,
    WarriorKind,
};
pub use combat::{
    attack_total,
    casualties,
    resolve_attack,
    run_duel,
    AttackRecord,
    DuelOutcome,
    DuelRound,
    DuelWinner,
};
pub use economy::CardEconomy;
pub use gods::{God, GodEffect};
pub use interaction::{Answer, Interaction, Presentation, Prompt, ScriptedInteraction, SnapshotRecorder};
pub use interrupts::PendingAction;
pub use player::{Player, PlayerId};
pub use rules::{ActionKind, ActionOutcome, ActionSlot, RefusalReason, RuleEngine, RuleError, TurnReport};
pub use state::{
    GameEvent,
    GameState,
    GameStatus,
    IntegrityError,
    Seat,
    TurnPhase,
    VictoryState,
};
