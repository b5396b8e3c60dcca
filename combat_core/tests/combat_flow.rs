//! Integration test: Catalogs -> Encounter setup -> Turns -> Outcome
//!
//! Drives full encounters through the public API with the bundled catalogs.

use combat_core::config::parse_enemy_configs;
use combat_core::prelude::*;
use combat_core::{EnemyDef, IntentType, RelicDef, RelicKind};
use std::sync::Arc;

fn starter_deck() -> Vec<Card> {
    let mut deck = Vec::new();
    for i in 0..5 {
        deck.push(Card::new(format!("strike_{i}"), "Strike", CardKind::Attack, 1));
    }
    for i in 0..4 {
        deck.push(Card::new(format!("defend_{i}"), "Defend", CardKind::Skill, 1));
    }
    deck.push(Card::new("bash", "Bash", CardKind::Attack, 2));
    deck
}

/// Play every affordable card: attacks hit the first living enemy for 6, skills block 5
fn play_turn(ctx: &mut CombatContext<'_>) {
    loop {
        let energy = ctx.energy();
        let Some(slot) = ctx.hand().iter().position(|c| c.is_playable() && c.cost <= energy) else {
            break;
        };
        let card = ctx.play_card(slot).unwrap();
        match card.kind {
            CardKind::Attack => {
                if let Some(&target) = ctx.living_enemies().first() {
                    ctx.attack(Target::Enemy(target), 6).unwrap();
                }
            }
            _ => {
                ctx.gain_block(Target::Player, 5).unwrap();
            }
        }
        if ctx.is_over() {
            break;
        }
    }
}

fn fight(ctx: &mut CombatContext<'_>, max_turns: u32) -> CombatOutcome {
    ctx.start_combat().unwrap();
    while !ctx.is_over() && ctx.turn() <= max_turns {
        play_turn(ctx);
        if ctx.is_over() {
            break;
        }
        ctx.end_player_turn().unwrap();
        ctx.run_enemy_turn().unwrap();
    }
    ctx.outcome()
}

#[test]
fn test_full_fight_against_louse() {
    let statuses = default_statuses();
    let enemies = default_enemies();
    let rules = StandardRules::default();
    let mut player = PlayerCombatant::new("player", "Ironclad", 80);
    let mut relics = Vec::new();

    let mut ctx = CombatContext::new(&mut player, &mut relics, &statuses, &rules)
        .with_seed(42)
        .with_deck(starter_deck())
        .with_enemy_catalog(&enemies);
    ctx.spawn_enemy("red_louse").unwrap();

    let outcome = fight(&mut ctx, 20);
    assert_eq!(outcome, CombatOutcome::Victory);
    assert_eq!(ctx.phase(), CombatPhase::End);
    assert!(ctx.hand().is_empty());
    assert!(matches!(
        ctx.events().last(),
        Some(CombatEvent::CombatEnded {
            outcome: CombatOutcome::Victory
        })
    ));
    drop(ctx);

    assert!(player.is_alive());
    assert!(player.gold() > 0);
    assert!(player.statuses().is_empty());
}

#[test]
fn test_same_seed_same_fight() {
    let statuses = default_statuses();
    let enemies = default_enemies();
    let rules = StandardRules::default();

    let run = |seed: u64| {
        let mut player = PlayerCombatant::new("player", "Ironclad", 80);
        let mut relics = Vec::new();
        let mut ctx = CombatContext::new(&mut player, &mut relics, &statuses, &rules)
            .with_seed(seed)
            .with_deck(starter_deck())
            .with_enemy_catalog(&enemies);
        ctx.spawn_enemy("jaw_worm").unwrap();
        ctx.spawn_enemy("cultist").unwrap();
        fight(&mut ctx, 30);
        ctx.take_events()
    };

    assert_eq!(run(1234), run(1234));
}

#[test]
fn test_defeat_is_final() {
    let statuses = default_statuses();
    let rules = StandardRules::default();
    let mut player = PlayerCombatant::new("player", "Ironclad", 80);
    player.set_current_health(1);
    let mut relics = Vec::new();

    let def = Arc::new(EnemyDef::new("brute", "Brute", 60).with_pattern(EnemyIntent::attack(14, 1), 1.0));
    let mut ctx = CombatContext::new(&mut player, &mut relics, &statuses, &rules).with_seed(3);
    ctx.add_enemy(EnemyInstance::new("brute_0", def, 60)).unwrap();
    ctx.start_combat().unwrap();
    ctx.end_player_turn().unwrap();

    assert_eq!(ctx.run_enemy_turn().unwrap(), CombatOutcome::Defeat);
    assert_eq!(ctx.check_combat_end(), CombatOutcome::Defeat);
    assert_eq!(ctx.end_player_turn(), Err(CombatError::CombatOver));
    assert_eq!(ctx.apply_status(Target::Player, ids::WEAK, 1), Err(CombatError::CombatOver));
    assert_eq!(ctx.process_next_enemy(), Ok(EnemyStep::CombatOver(CombatOutcome::Defeat)));
}

#[test]
fn test_all_enemies_escaping_is_victory() {
    let statuses = default_statuses();
    let rules = StandardRules::default();
    let mut player = PlayerCombatant::new("player", "Ironclad", 80);
    let mut relics = Vec::new();

    let def = Arc::new(EnemyDef::new("thief", "Thief", 20).with_pattern(EnemyIntent::new(IntentType::Escape), 1.0));
    let mut ctx = CombatContext::new(&mut player, &mut relics, &statuses, &rules);
    ctx.add_enemy(EnemyInstance::new("thief_0", def, 20)).unwrap();
    ctx.start_combat().unwrap();
    ctx.end_player_turn().unwrap();

    assert_eq!(
        ctx.process_next_enemy(),
        Ok(EnemyStep::CombatOver(CombatOutcome::Victory))
    );
    assert!(ctx.enemy(0).unwrap().escaped);
    assert!(ctx
        .events()
        .iter()
        .any(|e| matches!(e, CombatEvent::EnemyEscaped { index: 0 })));
}

#[test]
fn test_cultist_ritual_grows_strength() {
    let statuses = default_statuses();
    let rules = StandardRules::default();
    let enemies = parse_enemy_configs(
        r#"
[[enemies]]
id = "chanter"
name = "Chanter"
base_health = 40

[[enemies.patterns]]
weight = 1.0
intent = { intent_type = "buff", status_id = "ritual", stacks = 2 }
"#,
    )
    .unwrap();
    let mut player = PlayerCombatant::new("player", "Ironclad", 80);
    let mut relics = Vec::new();

    let mut ctx = CombatContext::new(&mut player, &mut relics, &statuses, &rules).with_enemy_catalog(&enemies);
    ctx.spawn_enemy("chanter").unwrap();
    ctx.start_combat().unwrap();

    for _ in 0..2 {
        ctx.end_player_turn().unwrap();
        ctx.run_enemy_turn().unwrap();
    }
    let chanter = ctx.enemy(0).unwrap();
    // Ritual 2 then 4, each granting its stacks as strength at turn end
    assert_eq!(chanter.status_stacks("ritual"), 4);
    assert_eq!(chanter.status_stacks(ids::STRENGTH), 6);
}

fn relic(kind: RelicKind) -> RelicInstance {
    RelicInstance::new(Arc::new(RelicDef::new(format!("{kind:?}"), format!("{kind:?}"), kind)))
}

fn free_cards(n: usize, kind: CardKind) -> Vec<Card> {
    (0..n).map(|i| Card::new(format!("free_{i}"), "Free", kind, 0)).collect()
}

fn training_dummy(health: i32) -> EnemyInstance {
    let def = Arc::new(EnemyDef::new("dummy", "Dummy", health).with_pattern(EnemyIntent::defend(1), 1.0));
    EnemyInstance::new("dummy_0", def, health)
}

#[test]
fn test_nunchaku_grants_energy_on_tenth_card() {
    let statuses = default_statuses();
    let rules = StandardRules::default();
    let mut player = PlayerCombatant::new("player", "Ironclad", 80);
    let mut relics = vec![relic(RelicKind::Nunchaku)];

    let mut ctx = CombatContext::new(&mut player, &mut relics, &statuses, &rules).with_deck(free_cards(12, CardKind::Skill));
    ctx.add_enemy(training_dummy(50)).unwrap();
    ctx.start_combat().unwrap();

    for _ in 0..5 {
        ctx.play_card(0).unwrap();
    }
    assert_eq!(ctx.energy(), 3);
    ctx.end_player_turn().unwrap();
    ctx.run_enemy_turn().unwrap();

    for _ in 0..5 {
        ctx.play_card(0).unwrap();
    }
    assert_eq!(ctx.energy(), 4);
    assert_eq!(ctx.relics()[0].counter, 0);
    assert_eq!(ctx.relics()[0].uses, 1);
}

#[test]
fn test_pen_nib_doubles_next_attack() {
    let statuses = default_statuses();
    let rules = StandardRules::default();
    let mut player = PlayerCombatant::new("player", "Ironclad", 80);
    let mut pen_nib = relic(RelicKind::PenNib);
    pen_nib.counter = 9;
    let mut relics = vec![pen_nib];

    let mut ctx = CombatContext::new(&mut player, &mut relics, &statuses, &rules).with_deck(free_cards(5, CardKind::Attack));
    ctx.add_enemy(training_dummy(50)).unwrap();
    ctx.start_combat().unwrap();

    ctx.play_card(0).unwrap();
    assert!(ctx.player().has_status("double_damage"));
    let taken = ctx.attack(Target::Enemy(0), 6).unwrap();
    assert_eq!(taken.health_lost, 12);
    assert!(!ctx.player().has_status("double_damage"));

    // Only the tenth attack is doubled
    ctx.play_card(0).unwrap();
    let taken = ctx.attack(Target::Enemy(0), 6).unwrap();
    assert_eq!(taken.health_lost, 6);
    ctx.play_card(0).unwrap();
    let taken = ctx.attack(Target::Enemy(0), 6).unwrap();
    assert_eq!(taken.health_lost, 6);
    assert_eq!(ctx.relics()[0].counter, 2);
}

#[test]
fn test_gremlin_horn_on_kill() {
    let statuses = default_statuses();
    let rules = StandardRules::default();
    let mut player = PlayerCombatant::new("player", "Ironclad", 80);
    let mut relics = vec![relic(RelicKind::GremlinHorn)];

    let mut ctx = CombatContext::new(&mut player, &mut relics, &statuses, &rules).with_deck(free_cards(8, CardKind::Skill));
    ctx.add_enemy(training_dummy(5)).unwrap();
    ctx.add_enemy(training_dummy(50)).unwrap();
    ctx.start_combat().unwrap();
    assert_eq!(ctx.hand().len(), 5);

    ctx.attack(Target::Enemy(0), 10).unwrap();
    assert_eq!(ctx.energy(), 4);
    assert_eq!(ctx.hand().len(), 6);
    assert_eq!(ctx.outcome(), CombatOutcome::InProgress);
}

#[test]
fn test_orichalcum_and_mercury_hourglass() {
    let statuses = default_statuses();
    let rules = StandardRules::default();
    let mut player = PlayerCombatant::new("player", "Ironclad", 80);
    let mut relics = vec![relic(RelicKind::Orichalcum), relic(RelicKind::MercuryHourglass)];

    let def = Arc::new(EnemyDef::new("brute", "Brute", 30).with_pattern(EnemyIntent::attack(5, 1), 1.0));
    let mut ctx = CombatContext::new(&mut player, &mut relics, &statuses, &rules);
    ctx.add_enemy(EnemyInstance::new("brute_0", def, 30)).unwrap();
    ctx.start_combat().unwrap();
    assert_eq!(ctx.enemy(0).unwrap().current_health(), 27);

    ctx.end_player_turn().unwrap();
    assert_eq!(ctx.player().block(), 6);
    ctx.run_enemy_turn().unwrap();
    assert_eq!(ctx.player().current_health(), 80);
    assert_eq!(ctx.enemy(0).unwrap().current_health(), 24);
}

#[test]
fn test_torii_and_intangible_cap_hits() {
    let statuses = default_statuses();
    let rules = StandardRules::default();
    let mut player = PlayerCombatant::new("player", "Ironclad", 80);
    let mut relics = vec![relic(RelicKind::Torii)];

    let mut ctx = CombatContext::new(&mut player, &mut relics, &statuses, &rules);
    ctx.add_enemy(training_dummy(50)).unwrap();
    ctx.start_combat().unwrap();

    let hit = ctx
        .deal_damage(Some(Target::Enemy(0)), Target::Player, 4, DamageFlags::ATTACK)
        .unwrap();
    assert_eq!(hit.health_lost, 1);

    // Torii looks at what gets past block: 7 into 3 block leaves 4, reduced to 1
    ctx.gain_block(Target::Player, 3).unwrap();
    let hit = ctx
        .deal_damage(Some(Target::Enemy(0)), Target::Player, 7, DamageFlags::ATTACK)
        .unwrap();
    assert_eq!((hit.blocked, hit.health_lost), (3, 1));

    // Thorns and other non-attack damage are not reduced
    let hit = ctx
        .deal_damage(Some(Target::Enemy(0)), Target::Player, 3, DamageFlags::THORNS)
        .unwrap();
    assert_eq!(hit.health_lost, 3);
    assert_eq!(ctx.player().current_health(), 75);

    ctx.apply_status(Target::Enemy(0), ids::INTANGIBLE, 1).unwrap();
    let hit = ctx
        .deal_damage(None, Target::Enemy(0), 20, DamageFlags::NONE)
        .unwrap();
    assert_eq!(hit.health_lost, 1);
}

#[test]
fn test_charons_ashes_on_exhaust() {
    let statuses = default_statuses();
    let rules = StandardRules::default();
    let mut player = PlayerCombatant::new("player", "Ironclad", 80);
    let mut relics = vec![relic(RelicKind::CharonsAshes)];

    let deck = vec![Card::new("offering", "Offering", CardKind::Skill, 0).exhausting()];
    let mut ctx = CombatContext::new(&mut player, &mut relics, &statuses, &rules).with_deck(deck);
    ctx.add_enemy(training_dummy(20)).unwrap();
    ctx.start_combat().unwrap();

    ctx.play_card(0).unwrap();
    assert_eq!(ctx.enemy(0).unwrap().current_health(), 17);
    assert_eq!(ctx.piles().exhaust.len(), 1);
}

#[test]
fn test_thorns_retaliate_on_killing_blow() {
    let statuses = default_statuses();
    let rules = StandardRules::default();
    let mut player = PlayerCombatant::new("player", "Ironclad", 80);
    let mut relics = Vec::new();

    let mut ctx = CombatContext::new(&mut player, &mut relics, &statuses, &rules);
    ctx.add_enemy(training_dummy(5)).unwrap();
    ctx.add_enemy(training_dummy(50)).unwrap();
    ctx.start_combat().unwrap();
    ctx.apply_status(Target::Enemy(0), "thorns", 3).unwrap();

    let taken = ctx.attack(Target::Enemy(0), 10).unwrap();
    assert!(taken.killed);
    assert_eq!(ctx.player().current_health(), 77);
    assert_eq!(ctx.living_enemies(), vec![1]);
    assert_eq!(ctx.outcome(), CombatOutcome::InProgress);
}
