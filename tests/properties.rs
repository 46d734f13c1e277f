use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use valhalla_rules::{
    casualties, resolve_attack, run_duel, ActionKind, Card, CardEconomy, CardId, GameConfig, GameState, God,
    Interaction, ModifierSign, Monster, MonsterId, Player, PlayerId, Prompt, RuleEngine, Seat, Warrior,
    WarriorKind,
};

/// Answers every question at random, always from the offered candidates.
struct RandomPlayer {
    rng: SmallRng,
    eagerness: f64,
}

impl Interaction for RandomPlayer {
    fn choose_action(&mut self, _state: &GameState, _player: PlayerId, offered: &[ActionKind]) -> ActionKind {
        *offered.choose(&mut self.rng).unwrap_or(&ActionKind::DrawCard)
    }

    fn choose_card(&mut self, _state: &GameState, _player: PlayerId, cards: &[Card], _prompt: &Prompt) -> CardId {
        cards.choose(&mut self.rng).map(Card::id).unwrap_or_default()
    }

    fn choose_monster(&mut self, _state: &GameState, _player: PlayerId, monsters: &[Monster]) -> MonsterId {
        monsters.choose(&mut self.rng).map(|monster| monster.id).unwrap_or_default()
    }

    fn choose_modifier_sign(&mut self, _state: &GameState, _player: PlayerId) -> ModifierSign {
        if self.rng.gen_bool(0.5) {
            ModifierSign::Positive
        } else {
            ModifierSign::Negative
        }
    }

    fn confirm(&mut self, _state: &GameState, _prompt: &Prompt) -> bool {
        self.rng.gen_bool(self.eagerness)
    }

    fn choose_player(&mut self, _state: &GameState, candidates: &[PlayerId], _prompt: &Prompt) -> PlayerId {
        candidates.choose(&mut self.rng).copied().unwrap_or_default()
    }
}

fn seats(count: usize) -> Vec<Seat> {
    ["Astrid", "Bjorn", "Sigrid", "Ulf"]
        .iter()
        .zip(God::roster())
        .take(count)
        .map(|(name, god)| Seat::new(*name, god.clone()))
        .collect()
}

fn team(einherjar: usize, valkiria: usize) -> Vec<Warrior> {
    let mut team = Vec::new();
    for id in 0..einherjar {
        team.push(Warrior::new(id as u32, WarriorKind::Einherjar));
    }
    for id in 0..valkiria {
        team.push(Warrior::new(100 + id as u32, WarriorKind::Valkiria));
    }
    team
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn cards_are_conserved_through_random_play(
        seed in any::<u64>(),
        players in 2usize..=4,
        eagerness in 0.0f64..0.8,
    ) {
        let mut engine = RuleEngine::with_seed(GameConfig::default(), seed);
        let mut state = engine.new_game(seats(players)).expect("setup should succeed");
        let total = state.card_count();
        let mut io = RandomPlayer { rng: SmallRng::seed_from_u64(seed ^ 0x5eed), eagerness };

        for _ in 0..60 {
            if state.is_finished() {
                break;
            }
            engine.play_turn(&mut state, &mut io).expect("random legal play never errors");
            prop_assert_eq!(state.card_count(), total);
            prop_assert!(state.integrity_check().is_ok());
            prop_assert!(state.economy.monsters_on_table.len() <= state.table_size);
        }
    }

    #[test]
    fn draw_reshuffles_rejects_when_pile_is_empty(rejected in 1u32..30, seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut economy = CardEconomy::default();
        for id in 0..rejected {
            economy.reject(Card::challenge(id));
        }
        let card = economy.draw(&mut rng).expect("rejected cards are drawable");
        prop_assert!(card.id() < rejected);
        prop_assert!(economy.rejected_cards.is_empty());
        prop_assert_eq!(economy.available_cards.len() as u32, rejected - 1);
    }

    #[test]
    fn higher_roll_or_modifier_never_loses_a_won_attack(
        einherjar in 0usize..6,
        valkiria in 0usize..6,
        required in 1i32..30,
        roll in 0i32..=3,
        modifiers in -5i32..5,
        extra_roll in 0i32..3,
        extra_modifier in 0i32..5,
    ) {
        let mut attacker = Player::new(0, "Astrid", God::freya());
        attacker.team = team(einherjar, valkiria);
        let monster = Monster::new(0, "Garm", required);

        let base = resolve_attack(&attacker, &monster, roll, modifiers);
        let boosted = resolve_attack(&attacker, &monster, roll + extra_roll, modifiers + extra_modifier);
        prop_assert!(boosted.total >= base.total);
        if base.success {
            prop_assert!(boosted.success);
        }
    }

    #[test]
    fn casualties_follow_the_preference_order(
        einherjar in 0usize..5,
        valkiria in 0usize..5,
        success in any::<bool>(),
    ) {
        let team = team(einherjar, valkiria);
        let lost = casualties(&team, success);
        prop_assert_eq!(&lost, &casualties(&team, success));

        let expected = match (success, einherjar, valkiria) {
            (true, 0, 0) => vec![],
            (true, 0, _) => vec![WarriorKind::Valkiria],
            (true, _, _) => vec![WarriorKind::Einherjar],
            (false, _, v) if v > 0 => vec![WarriorKind::Valkiria],
            (false, e, _) => vec![WarriorKind::Einherjar; e.min(2)],
        };
        prop_assert_eq!(lost, expected);
    }

    #[test]
    fn duels_never_end_on_a_tie(
        rolls in proptest::collection::vec((1i32..=4, 1i32..=4), 1..8),
        challenger_idx in 0usize..4,
        defender_idx in 0usize..4,
    ) {
        let roster = God::roster();
        let challenger = &roster[challenger_idx];
        let defender = &roster[defender_idx];
        let mut queue = rolls.into_iter();
        let outcome = run_duel(|| queue.next().unwrap_or((4, 1)), challenger, defender);

        let last = outcome.deciding_round().expect("at least one round");
        prop_assert_ne!(last.challenger_roll, last.defender_roll);
        prop_assert_eq!(outcome.blocks_action(), last.challenger_roll > last.defender_roll);
        for round in &outcome.rounds[..outcome.rounds.len() - 1] {
            prop_assert_eq!(round.challenger_roll, round.defender_roll);
        }
    }
}
