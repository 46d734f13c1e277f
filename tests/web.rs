#![cfg(target_arch = "wasm32")]

use serde_wasm_bindgen::from_value;
use wasm_bindgen_test::*;

use valhalla_rules::{default_config, god_roster, validate_state, GameConfig, GameEngine, GameState, God};

wasm_bindgen_test_configure!(run_in_browser);

const SEATS: &str = r#"[{"name":"Astrid","god":"Odin"},{"name":"Bjorn","god":"Freya"}]"#;

#[wasm_bindgen_test]
fn engine_deals_a_fresh_game() {
    let engine = GameEngine::new(SEATS, None, Some(7)).expect("engine should start");
    let state: GameState = serde_json::from_str(&engine.state_json().expect("state serializes"))
        .expect("state json round-trips");
    assert_eq!(state.players.len(), 2);
    assert!(state.players.iter().all(|player| player.hand.len() == 10));
    assert!(!engine.is_finished());

    let offered: Vec<valhalla_rules::ActionKind> =
        serde_json::from_str(&engine.offered_actions_json().expect("offer serializes")).expect("offer parses");
    assert!(offered.contains(&valhalla_rules::ActionKind::DiscardHand));
}

#[wasm_bindgen_test]
fn duplicate_gods_are_rejected() {
    let seats = r#"[{"name":"Astrid","god":"Thor"},{"name":"Bjorn","god":"thor"}]"#;
    assert!(GameEngine::new(seats, None, Some(1)).is_err());
}

#[wasm_bindgen_test]
fn roster_and_config_are_exposed() {
    let roster: Vec<God> = from_value(god_roster().expect("roster encodes")).expect("roster decodes");
    assert_eq!(roster.len(), 4);
    let config: GameConfig = from_value(default_config().expect("config encodes")).expect("config decodes");
    assert_eq!(config, GameConfig::default());
}

#[wasm_bindgen_test]
fn validate_state_accepts_a_dealt_game() {
    let engine = GameEngine::new(SEATS, None, Some(3)).expect("engine should start");
    let state: GameState = serde_json::from_str(&engine.state_json().expect("state serializes"))
        .expect("state json round-trips");
    let value = serde_wasm_bindgen::to_value(&state).expect("state encodes");
    assert!(validate_state(value).is_ok());
}
