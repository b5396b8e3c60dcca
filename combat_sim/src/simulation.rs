//! Encounter simulation: starter deck, card effects and a greedy autoplayer

use combat_core::prelude::*;
use combat_core::{CombatOutcome, X_COST, X_VARIABLE};
use tracing::{debug, info};

/// What a card does once `play_card` has paid for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardEffect {
    /// Hit one enemy `times` times
    Attack { damage: i32, times: i32 },
    /// Hit every living enemy
    AttackAll { damage: i32 },
    /// Hit every living enemy once per energy spent
    AttackAllX { damage: i32 },
    Block { amount: i32 },
    /// Attack, then apply a debuff to the same enemy
    AttackDebuff { damage: i32, status: &'static str, stacks: i32 },
    AttackDraw { damage: i32, draw: usize },
    Buff { status: &'static str, stacks: i32 },
    /// Unplayable or unknown cards
    Nothing,
}

/// Effect table keyed by card id
pub fn card_effect(card_id: &str) -> CardEffect {
    match card_id {
        "strike" => CardEffect::Attack { damage: 6, times: 1 },
        "defend" => CardEffect::Block { amount: 5 },
        "bash" => CardEffect::AttackDebuff {
            damage: 8,
            status: ids::VULNERABLE,
            stacks: 2,
        },
        "clothesline" => CardEffect::AttackDebuff {
            damage: 12,
            status: ids::WEAK,
            stacks: 2,
        },
        "twin_strike" => CardEffect::Attack { damage: 5, times: 2 },
        "pommel_strike" => CardEffect::AttackDraw { damage: 9, draw: 1 },
        "cleave" => CardEffect::AttackAll { damage: 8 },
        "whirlwind" => CardEffect::AttackAllX { damage: 5 },
        "shrug_it_off" => CardEffect::Block { amount: 8 },
        "inflame" => CardEffect::Buff {
            status: ids::STRENGTH,
            stacks: 2,
        },
        "metallicize" => CardEffect::Buff {
            status: "metallicize",
            stacks: 3,
        },
        _ => CardEffect::Nothing,
    }
}

/// The default simulated deck
pub fn starter_deck() -> Vec<Card> {
    let mut deck = Vec::new();
    for _ in 0..5 {
        deck.push(Card::new("strike", "Strike", CardKind::Attack, 1));
    }
    for _ in 0..4 {
        deck.push(Card::new("defend", "Defend", CardKind::Skill, 1));
    }
    deck.push(Card::new("bash", "Bash", CardKind::Attack, 2));
    deck.push(Card::new("pommel_strike", "Pommel Strike", CardKind::Attack, 1));
    deck.push(Card::new("whirlwind", "Whirlwind", CardKind::Attack, X_COST));
    deck.push(Card::new("inflame", "Inflame", CardKind::Power, 1));
    deck
}

/// Summary of one simulated encounter
#[derive(Debug, Clone, Default)]
pub struct EncounterSimulation {
    pub outcome: CombatOutcome,
    pub turns: u32,
    pub cards_played: u32,
    pub damage_dealt: i32,
    pub damage_taken: i32,
    pub gold_gained: i32,
}

impl EncounterSimulation {
    /// Fight until the combat ends or `max_turns` player turns have passed
    pub fn run(ctx: &mut CombatContext<'_>, max_turns: u32) -> CombatResult<Self> {
        let mut result = EncounterSimulation::default();
        ctx.start_combat()?;

        while !ctx.is_over() && ctx.turn() <= max_turns {
            result.cards_played += play_turn(ctx)?;
            if ctx.is_over() {
                break;
            }
            ctx.end_player_turn()?;
            ctx.run_enemy_turn()?;
        }

        result.outcome = ctx.outcome();
        result.turns = ctx.turn();
        result.tally(ctx.events());
        info!(outcome = ?result.outcome, turns = result.turns, "simulation finished");
        Ok(result)
    }

    fn tally(&mut self, events: &[CombatEvent]) {
        for event in events {
            match event {
                CombatEvent::Damage {
                    target: Target::Player,
                    health_lost,
                    ..
                } => self.damage_taken += health_lost,
                CombatEvent::Damage {
                    target: Target::Enemy(_),
                    health_lost,
                    ..
                } => self.damage_dealt += health_lost,
                CombatEvent::GoldGained { amount } => self.gold_gained += amount,
                _ => {}
            }
        }
    }
}

/// Greedy policy: play the most expensive affordable card until nothing fits
fn play_turn(ctx: &mut CombatContext<'_>) -> CombatResult<u32> {
    let mut played = 0;
    loop {
        let energy = ctx.energy();
        let choice = ctx
            .hand()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_playable() && card_effect(&c.id) != CardEffect::Nothing)
            .filter(|(_, c)| if c.is_x_cost() { energy > 0 } else { c.cost <= energy })
            .max_by_key(|(_, c)| if c.is_x_cost() { energy } else { c.cost })
            .map(|(i, _)| i);
        let Some(slot) = choice else {
            break;
        };

        let card = ctx.play_card(slot)?;
        played += 1;
        resolve(ctx, &card)?;
        if ctx.is_over() {
            break;
        }
    }
    Ok(played)
}

fn resolve(ctx: &mut CombatContext<'_>, card: &Card) -> CombatResult<()> {
    let effect = card_effect(&card.id);
    debug!(card = %card.id, ?effect, "resolving card");

    let target = ctx.living_enemies().first().copied().map(Target::Enemy);
    match effect {
        CardEffect::Attack { damage, times } => {
            for _ in 0..times {
                if let Some(target) = target.filter(|_| !ctx.is_over()) {
                    ctx.attack(target, damage)?;
                }
            }
        }
        CardEffect::AttackAll { damage } => attack_all(ctx, damage, 1)?,
        CardEffect::AttackAllX { damage } => {
            let times = ctx.variable(X_VARIABLE);
            attack_all(ctx, damage, times)?;
        }
        CardEffect::Block { amount } => {
            ctx.gain_block(Target::Player, amount)?;
        }
        CardEffect::AttackDebuff { damage, status, stacks } => {
            if let Some(target) = target {
                let taken = ctx.attack(target, damage)?;
                if !taken.killed && !ctx.is_over() {
                    // Artifact may negate the debuff; that is not a failure of the card
                    match ctx.apply_status(target, status, stacks) {
                        Ok(_) | Err(CombatError::Blocked(_)) => {}
                        Err(e) => return Err(e),
                    }
                }
            }
        }
        CardEffect::AttackDraw { damage, draw } => {
            if let Some(target) = target {
                ctx.attack(target, damage)?;
            }
            if !ctx.is_over() {
                ctx.draw_cards(draw)?;
            }
        }
        CardEffect::Buff { status, stacks } => {
            ctx.apply_status(Target::Player, status, stacks)?;
        }
        CardEffect::Nothing => {}
    }
    Ok(())
}

fn attack_all(ctx: &mut CombatContext<'_>, damage: i32, times: i32) -> CombatResult<()> {
    for _ in 0..times {
        for index in ctx.living_enemies() {
            if ctx.is_over() {
                return Ok(());
            }
            ctx.attack(Target::Enemy(index), damage)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{default_enemies, default_statuses};

    #[test]
    fn test_card_table() {
        assert_eq!(card_effect("strike"), CardEffect::Attack { damage: 6, times: 1 });
        assert_eq!(card_effect("wound"), CardEffect::Nothing);
        assert!(starter_deck().iter().all(|c| card_effect(&c.id) != CardEffect::Nothing));
    }

    #[test]
    fn test_simulation_beats_louse() {
        let statuses = default_statuses();
        let enemies = default_enemies();
        let rules = StandardRules::default();
        let mut player = PlayerCombatant::new("player", "Ironclad", 80);
        let mut relics = Vec::new();

        let mut ctx = CombatContext::new(&mut player, &mut relics, &statuses, &rules)
            .with_seed(9)
            .with_deck(starter_deck())
            .with_enemy_catalog(&enemies);
        ctx.spawn_enemy("red_louse").unwrap();

        let result = EncounterSimulation::run(&mut ctx, 30).unwrap();
        assert_eq!(result.outcome, CombatOutcome::Victory);
        assert!(result.cards_played > 0);
        assert!(result.damage_dealt >= 10);
        assert_eq!(result.gold_gained, 10);
    }
}
