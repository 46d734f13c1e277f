pub mod config;
pub mod game;
pub mod logging;

use log::{warn, LevelFilter};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub use config::{DeckComposition, DiceRange, GameConfig, MonsterSpec};
pub use game::{
    attack_total, casualties, resolve_attack, run_duel, ActionKind, ActionOutcome, ActionSlot, Answer,
    AttackRecord, Card, CardEconomy, CardId, DuelOutcome, DuelRound, DuelWinner, GameEvent, GameState, GameStatus, God, GodEffect, IntegrityError,
    Interaction, Modifier, ModifierSign, Monster, MonsterId, PendingAction, Player, PlayerId, Presentation,
    Prompt, RefusalReason, RuleEngine, RuleError, ScriptedInteraction, Seat, SnapshotRecorder, TurnPhase,
    TurnReport, VictoryState, Warrior, WarriorKind,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
    logging::init_console_logger(LevelFilter::Info);
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

#[wasm_bindgen]
extern "C" {
    /// 由前端实现的玩家输入与展示接口。每个方法同步返回答案。
    pub type JsInteraction;

    #[wasm_bindgen(method, js_name = chooseAction)]
    fn choose_action(this: &JsInteraction, state: JsValue, player: PlayerId, offered: JsValue) -> JsValue;

    #[wasm_bindgen(method, js_name = chooseCard)]
    fn choose_card(this: &JsInteraction, state: JsValue, player: PlayerId, cards: JsValue, prompt: JsValue) -> JsValue;

    #[wasm_bindgen(method, js_name = chooseMonster)]
    fn choose_monster(this: &JsInteraction, state: JsValue, player: PlayerId, monsters: JsValue) -> JsValue;

    #[wasm_bindgen(method, js_name = chooseModifierSign)]
    fn choose_modifier_sign(this: &JsInteraction, state: JsValue, player: PlayerId) -> JsValue;

    #[wasm_bindgen(method)]
    fn confirm(this: &JsInteraction, state: JsValue, prompt: JsValue) -> JsValue;

    #[wasm_bindgen(method, js_name = choosePlayer)]
    fn choose_player(this: &JsInteraction, state: JsValue, candidates: JsValue, prompt: JsValue) -> JsValue;

    #[wasm_bindgen(method)]
    fn present(this: &JsInteraction, state: JsValue);
}

/// 把 [`JsInteraction`] 适配为引擎的协作者 trait。
struct JsBridge {
    js: JsInteraction,
}

impl JsBridge {
    fn new(js: &JsInteraction) -> Self {
        let js = JsValue::clone(js).unchecked_into::<JsInteraction>();
        Self { js }
    }

    fn encode<T: Serialize + ?Sized>(value: &T) -> JsValue {
        to_value(&value).unwrap_or_else(|err| {
            warn!("failed to encode value for the front end: {err}");
            JsValue::NULL
        })
    }

    fn decode<T: DeserializeOwned>(question: &str, answer: JsValue) -> Option<T> {
        match from_value(answer) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("undecodable answer to {question}, using fallback: {err}");
                None
            }
        }
    }
}

impl Interaction for JsBridge {
    fn choose_action(&mut self, state: &GameState, player: PlayerId, offered: &[ActionKind]) -> ActionKind {
        let answer = self
            .js
            .choose_action(Self::encode(state), player, Self::encode(offered));
        Self::decode("chooseAction", answer)
            .or_else(|| offered.first().copied())
            .unwrap_or(ActionKind::DrawCard)
    }

    fn choose_card(&mut self, state: &GameState, player: PlayerId, cards: &[Card], prompt: &Prompt) -> CardId {
        let answer = self
            .js
            .choose_card(Self::encode(state), player, Self::encode(cards), Self::encode(prompt));
        Self::decode("chooseCard", answer)
            .or_else(|| cards.first().map(Card::id))
            .unwrap_or_default()
    }

    fn choose_monster(&mut self, state: &GameState, player: PlayerId, monsters: &[Monster]) -> MonsterId {
        let answer = self
            .js
            .choose_monster(Self::encode(state), player, Self::encode(monsters));
        Self::decode("chooseMonster", answer)
            .or_else(|| monsters.first().map(|monster| monster.id))
            .unwrap_or_default()
    }

    fn choose_modifier_sign(&mut self, state: &GameState, player: PlayerId) -> ModifierSign {
        let answer = self.js.choose_modifier_sign(Self::encode(state), player);
        Self::decode("chooseModifierSign", answer).unwrap_or(ModifierSign::Positive)
    }

    fn confirm(&mut self, state: &GameState, prompt: &Prompt) -> bool {
        let answer = self.js.confirm(Self::encode(state), Self::encode(prompt));
        answer.as_bool().unwrap_or(false)
    }

    fn choose_player(&mut self, state: &GameState, candidates: &[PlayerId], prompt: &Prompt) -> PlayerId {
        let answer = self
            .js
            .choose_player(Self::encode(state), Self::encode(candidates), Self::encode(prompt));
        Self::decode("choosePlayer", answer)
            .or_else(|| candidates.first().copied())
            .unwrap_or_default()
    }
}

impl Presentation for JsBridge {
    fn present(&mut self, state: &GameState) {
        self.js.present(Self::encode(state));
    }
}

/// 前端传入的座位：玩家名与神祇名。
#[derive(Debug, Deserialize)]
struct SeatRequest {
    name: String,
    god: String,
}

fn parse_seats(seats_json: &str) -> Result<Vec<Seat>, RuleError> {
    let requests: Vec<SeatRequest> = serde_json::from_str(seats_json).map_err(|err| RuleError::InvalidSetup {
        reason: format!("malformed seats: {err}"),
    })?;
    requests
        .into_iter()
        .map(|request| {
            God::by_name(&request.god)
                .map(|god| Seat::new(request.name, god))
                .ok_or_else(|| RuleError::InvalidSetup {
                    reason: format!("unknown god {}", request.god),
                })
        })
        .collect()
}

#[wasm_bindgen]
pub struct GameEngine {
    engine: RuleEngine,
    state: GameState,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(seats_json: &str, config_json: Option<String>, seed: Option<u32>) -> Result<GameEngine, JsValue> {
        let config = match config_json {
            Some(json) => GameConfig::from_json(&json).map_err(to_js_error)?,
            None => GameConfig::default(),
        };
        let seats = parse_seats(seats_json).map_err(to_js_error)?;
        let mut engine = match seed {
            Some(seed) => RuleEngine::with_seed(config, u64::from(seed)),
            None => RuleEngine::new(config),
        };
        let state = engine.new_game(seats).map_err(to_js_error)?;
        Ok(GameEngine { engine, state })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(serde_to_js_error)
    }

    pub fn offered_actions_json(&self) -> Result<String, JsValue> {
        let offered = self
            .engine
            .offered_actions(&self.state, ActionSlot::First)
            .map_err(to_js_error)?;
        serde_json::to_string(&offered).map_err(serde_to_js_error)
    }

    pub fn play_turn(&mut self, interaction: &JsInteraction) -> Result<String, JsValue> {
        self.engine.replace_presentation(JsBridge::new(interaction));
        let mut bridge = JsBridge::new(interaction);
        let report = self
            .engine
            .play_turn(&mut self.state, &mut bridge)
            .map_err(to_js_error)?;
        serde_json::to_string(&report).map_err(serde_to_js_error)
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }
}

/// 纯函数：根据战队、怪物、骰点与修正值结算一次攻击。
#[wasm_bindgen(js_name = "resolveAttack")]
pub fn resolve_attack_js(
    attacker: JsValue,
    monster: JsValue,
    dice_roll: i32,
    modifier_sum: i32,
) -> Result<JsValue, JsValue> {
    let attacker: Player = from_value(attacker).map_err(JsValue::from)?;
    let monster: Monster = from_value(monster).map_err(JsValue::from)?;
    let record = resolve_attack(&attacker, &monster, dice_roll, modifier_sum);
    to_value(&record).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "godRoster")]
pub fn god_roster() -> Result<JsValue, JsValue> {
    to_value(&God::roster()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "defaultConfig")]
pub fn default_config() -> Result<JsValue, JsValue> {
    to_value(&GameConfig::default()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state
        .integrity_check()
        .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))?;
    Ok(())
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
