//! CombatContext - One encounter: turn state machine and resolution pipeline
//!
//! The context owns everything that only lives for one fight (enemies, card
//! piles, energy, RNG, event log) and borrows what the run owns (player,
//! relics, status catalog, rules).
//!
//! Turn flow:
//!
//! ```text
//! Setup --start_combat--> PlayerTurn --end_player_turn--> EnemyTurn
//!   ^                                                        |
//!   |              process_next_enemy (one enemy per call)   |
//!   +------------------- PlayerTurn <------------------------+
//! ```
//!
//! Any kill or escape can move the combat to `End`; once there every mutating
//! operation fails with [`CombatError::CombatOver`].

use crate::cards::{Card, CardKind, CardPiles};
use crate::combatant::{Combatant, DamageTaken, PlayerCombatant};
use crate::enemy::{EnemyInstance, EnemyIntent, EnemyRegistry, IntentAction};
use crate::error::{CombatError, CombatResult};
use crate::relic::{RelicDef, RelicEffect, RelicInstance, RelicTriggers};
use crate::rules::CombatRules;
use crate::status::{StackChange, StatusAction, StatusEffectDef, StatusRegistry};
use crate::types::{CombatOutcome, CombatPhase, CombatRng, DamageFlags, HookContext, Target};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Variable holding the energy spent by the last X-cost card
pub const X_VARIABLE: &str = "x";

/// Something that happened, in order, for presentation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CombatEvent {
    CombatStarted { enemies: usize },
    PlayerTurnStarted { turn: u32 },
    PlayerTurnEnded { turn: u32 },
    IntentDecided { index: usize, intent: EnemyIntent },
    EnemyActed { index: usize },
    Damage {
        source: Option<Target>,
        target: Target,
        amount: i32,
        blocked: i32,
        health_lost: i32,
    },
    BlockGained { target: Target, amount: i32 },
    Healed { target: Target, amount: i32 },
    StatusApplied { target: Target, status_id: String, stacks: i32, total: i32 },
    StatusBlocked { target: Target, status_id: String },
    StatusRemoved { target: Target, status_id: String },
    CardPlayed { card_id: String },
    CardsDrawn { count: usize },
    CardExhausted { card_id: String },
    CardDiscarded { card_id: String },
    RelicTriggered { relic_id: String },
    GoldGained { amount: i32 },
    EnemySpawned { index: usize, enemy_id: String },
    EnemyDied { index: usize },
    EnemyEscaped { index: usize },
    CombatEnded { outcome: CombatOutcome },
}

/// Result of one `process_next_enemy` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyStep {
    /// The enemy at `index` took its turn
    Acted { index: usize },
    /// Every enemy has acted and the next player turn has begun
    TurnComplete,
    CombatOver(CombatOutcome),
}

/// State of a single combat encounter
///
/// Every state change is appended to an event log that only shrinks when the
/// caller drains it with [`CombatContext::take_events`]. Hosts that keep a
/// context alive for many turns should drain it once per turn.
pub struct CombatContext<'a> {
    player: &'a mut PlayerCombatant,
    relics: &'a mut [RelicInstance],
    statuses: &'a StatusRegistry,
    rules: &'a dyn CombatRules,
    enemy_catalog: Option<&'a EnemyRegistry>,

    enemies: Vec<EnemyInstance>,
    piles: CardPiles,
    energy: i32,
    turn: u32,
    phase: CombatPhase,
    outcome: CombatOutcome,
    cards_played_this_turn: u32,
    variables: HashMap<String, i32>,
    rng: CombatRng,
    current_enemy_index: usize,
    /// Enemies present when the enemy turn began; summons wait for the next turn
    enemy_turn_len: usize,
    /// Unbounded until drained by `take_events`
    events: Vec<CombatEvent>,
}

impl<'a> CombatContext<'a> {
    pub fn new(
        player: &'a mut PlayerCombatant,
        relics: &'a mut [RelicInstance],
        statuses: &'a StatusRegistry,
        rules: &'a dyn CombatRules,
    ) -> Self {
        CombatContext {
            player,
            relics,
            statuses,
            rules,
            enemy_catalog: None,
            enemies: Vec::new(),
            piles: CardPiles::default(),
            energy: 0,
            turn: 0,
            phase: CombatPhase::Setup,
            outcome: CombatOutcome::InProgress,
            cards_played_this_turn: 0,
            variables: HashMap::new(),
            rng: CombatRng::seed_from_u64(0),
            current_enemy_index: 0,
            enemy_turn_len: 0,
            events: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.set_seed(seed);
        self
    }

    /// Cards copied into the draw pile at `start_combat`
    pub fn with_deck(mut self, deck: Vec<Card>) -> Self {
        self.piles = CardPiles::new(deck);
        self
    }

    /// Catalog used by `spawn_enemy` and enemy summons
    pub fn with_enemy_catalog(mut self, catalog: &'a EnemyRegistry) -> Self {
        self.enemy_catalog = Some(catalog);
        self
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.rng = CombatRng::seed_from_u64(seed);
    }

    // === Accessors ===

    pub fn player(&self) -> &PlayerCombatant {
        self.player
    }

    /// Direct access for card effects the engine does not model
    pub fn player_mut(&mut self) -> &mut PlayerCombatant {
        self.player
    }

    pub fn enemies(&self) -> &[EnemyInstance] {
        &self.enemies
    }

    pub fn enemy(&self, index: usize) -> Option<&EnemyInstance> {
        self.enemies.get(index)
    }

    pub fn enemy_mut(&mut self, index: usize) -> Option<&mut EnemyInstance> {
        self.enemies.get_mut(index)
    }

    /// Indices of enemies that are alive and have not escaped
    pub fn living_enemies(&self) -> Vec<usize> {
        self.enemies
            .iter()
            .enumerate()
            .filter(|(_, e)| e.in_combat())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn relics(&self) -> &[RelicInstance] {
        self.relics
    }

    pub fn piles(&self) -> &CardPiles {
        &self.piles
    }

    pub fn piles_mut(&mut self) -> &mut CardPiles {
        &mut self.piles
    }

    pub fn hand(&self) -> &[Card] {
        &self.piles.hand
    }

    pub fn energy(&self) -> i32 {
        self.energy
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn phase(&self) -> CombatPhase {
        self.phase
    }

    pub fn outcome(&self) -> CombatOutcome {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_terminal()
    }

    pub fn cards_played_this_turn(&self) -> u32 {
        self.cards_played_this_turn
    }

    pub fn current_enemy_index(&self) -> usize {
        self.current_enemy_index
    }

    pub fn rng(&mut self) -> &mut CombatRng {
        &mut self.rng
    }

    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    /// Hand the accumulated events to the caller and start a fresh log
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.events)
    }

    // === Setup ===

    /// Add an already spawned enemy (setup only)
    pub fn add_enemy(&mut self, enemy: EnemyInstance) -> CombatResult<usize> {
        if self.phase != CombatPhase::Setup {
            return Err(CombatError::InvalidPhase("add_enemy"));
        }
        self.enemies.push(enemy);
        Ok(self.enemies.len() - 1)
    }

    /// Spawn an enemy from the catalog (setup only)
    pub fn spawn_enemy(&mut self, enemy_id: &str) -> CombatResult<usize> {
        if self.phase != CombatPhase::Setup {
            return Err(CombatError::InvalidPhase("spawn_enemy"));
        }
        let catalog = self
            .enemy_catalog
            .ok_or_else(|| CombatError::NotFound(enemy_id.to_string()))?;
        let instance_id = format!("{}_{}", enemy_id, self.enemies.len());
        let enemy = catalog.spawn(enemy_id, instance_id, &mut self.rng)?;
        self.enemies.push(enemy);
        Ok(self.enemies.len() - 1)
    }

    /// Setup → PlayerTurn
    ///
    /// Piles are set up, relics see combat start, enemies run their spawn
    /// hooks and pick a first intent, then the first player turn begins.
    pub fn start_combat(&mut self) -> CombatResult<()> {
        self.ensure_active()?;
        if self.phase != CombatPhase::Setup {
            return Err(CombatError::InvalidPhase("start_combat"));
        }

        info!(enemies = self.enemies.len(), "combat started");
        self.piles.setup();
        self.events.push(CombatEvent::CombatStarted {
            enemies: self.enemies.len(),
        });

        self.fire_relics(RelicTriggers::COMBAT_START, |def, player, cx| {
            def.on_combat_start(player, cx)
        });

        for index in 0..self.enemies.len() {
            self.run_spawn_hooks(index);
        }

        self.phase = CombatPhase::PlayerTurn;
        if self.check_combat_end().is_terminal() {
            return Ok(());
        }
        self.begin_player_turn();
        Ok(())
    }

    // === Turn flow ===

    fn begin_player_turn(&mut self) {
        // Block granted at combat start (Anchor) carries into the first turn
        if self.turn > 0 {
            self.player.clear_block();
        }
        self.turn += 1;
        self.phase = CombatPhase::PlayerTurn;
        self.cards_played_this_turn = 0;
        self.energy = self.rules.energy_per_turn().max(0);

        info!(turn = self.turn, energy = self.energy, "player turn started");
        self.events.push(CombatEvent::PlayerTurnStarted { turn: self.turn });

        let turn = self.turn;
        self.fire_relics(RelicTriggers::TURN_START, |def, player, cx| {
            def.on_turn_start(player, turn, cx)
        });
        if self.is_over() {
            return;
        }

        self.run_status_hooks(Target::Player, None, |def, owner, stacks, cx| {
            def.on_turn_start(owner, stacks, cx)
        });
        if self.is_over() {
            return;
        }

        let count = self.rules.cards_per_turn();
        self.draw_internal(count);
    }

    /// PlayerTurn → EnemyTurn
    pub fn end_player_turn(&mut self) -> CombatResult<()> {
        self.ensure_active()?;
        if self.phase != CombatPhase::PlayerTurn {
            return Err(CombatError::InvalidPhase("end_player_turn"));
        }

        self.end_of_turn_statuses(Target::Player);
        if self.is_over() {
            return Ok(());
        }

        let turn = self.turn;
        self.fire_relics(RelicTriggers::TURN_END, |def, player, cx| {
            def.on_turn_end(player, turn, cx)
        });
        if self.is_over() {
            return Ok(());
        }

        let discarded = self.piles.discard_hand();
        self.cards_played_this_turn = 0;
        self.current_enemy_index = 0;
        self.enemy_turn_len = self.enemies.len();
        self.phase = CombatPhase::EnemyTurn;

        debug!(turn, discarded, "player turn ended");
        self.events.push(CombatEvent::PlayerTurnEnded { turn });
        Ok(())
    }

    /// Let the next enemy in line take its turn
    ///
    /// Dead and escaped enemies are skipped. Once every enemy has acted the
    /// dead are purged and, unless the combat is over, a new player turn
    /// begins and `TurnComplete` is returned.
    pub fn process_next_enemy(&mut self) -> CombatResult<EnemyStep> {
        if self.is_over() {
            return Ok(EnemyStep::CombatOver(self.outcome));
        }
        if self.phase != CombatPhase::EnemyTurn {
            return Err(CombatError::InvalidPhase("process_next_enemy"));
        }

        let end = self.enemy_turn_len.min(self.enemies.len());
        while self.current_enemy_index < end && !self.enemy_can_act(self.current_enemy_index) {
            self.current_enemy_index += 1;
        }
        if self.current_enemy_index >= end {
            return Ok(self.finish_enemy_turn());
        }

        let index = self.current_enemy_index;
        self.current_enemy_index += 1;
        self.take_enemy_turn(index);

        if self.is_over() {
            return Ok(EnemyStep::CombatOver(self.outcome));
        }
        Ok(EnemyStep::Acted { index })
    }

    /// Drive `process_next_enemy` until the enemy turn is finished
    pub fn run_enemy_turn(&mut self) -> CombatResult<CombatOutcome> {
        loop {
            match self.process_next_enemy()? {
                EnemyStep::Acted { .. } => continue,
                EnemyStep::TurnComplete => return Ok(self.outcome),
                EnemyStep::CombatOver(outcome) => return Ok(outcome),
            }
        }
    }

    fn take_enemy_turn(&mut self, index: usize) {
        let me = Target::Enemy(index);
        if let Some(enemy) = self.enemies.get_mut(index) {
            enemy.clear_block();
        }

        self.run_status_hooks(me, None, |def, owner, stacks, cx| def.on_turn_start(owner, stacks, cx));
        if self.is_over() || !self.enemy_can_act(index) {
            return;
        }

        let enemy = &mut self.enemies[index];
        let intent = enemy.intent.clone().unwrap_or_else(EnemyIntent::unknown);
        let def = enemy.def_arc();
        let actions = def.behavior.execute_intent(enemy, &intent);
        debug!(enemy = %enemy.id(), intent = %intent.summary(), "enemy acts");
        self.events.push(CombatEvent::EnemyActed { index });

        self.apply_intent_actions(index, actions);
        if self.is_over() {
            return;
        }

        if self.enemies.get(index).map_or(false, |e| e.is_alive()) {
            self.end_of_turn_statuses(me);
        }
        if let Some(enemy) = self.enemies.get_mut(index) {
            enemy.turn_count += 1;
        }
        if self.enemy_can_act(index) {
            self.decide_intent(index);
        }
    }

    fn finish_enemy_turn(&mut self) -> EnemyStep {
        let before = self.enemies.len();
        self.enemies.retain(|e| e.in_combat());
        if self.enemies.len() != before {
            debug!(removed = before - self.enemies.len(), "purged defeated enemies");
        }
        self.current_enemy_index = 0;

        let outcome = self.check_combat_end();
        if outcome.is_terminal() {
            return EnemyStep::CombatOver(outcome);
        }

        self.begin_player_turn();
        if self.is_over() {
            return EnemyStep::CombatOver(self.outcome);
        }
        EnemyStep::TurnComplete
    }

    /// Turn-end hooks followed by clear/decrement bookkeeping
    fn end_of_turn_statuses(&mut self, owner: Target) {
        self.run_status_hooks(owner, None, |def, c, stacks, cx| def.on_turn_end(c, stacks, cx));

        let expiring: Vec<(String, bool)> = match self.combatant(owner) {
            Some(c) if c.is_alive() => c
                .statuses()
                .iter()
                .filter_map(|s| {
                    if s.def.clears_at_turn_end {
                        Some((s.id().to_string(), true))
                    } else if s.def.decrements_at_turn_end {
                        Some((s.id().to_string(), false))
                    } else {
                        None
                    }
                })
                .collect(),
            _ => return,
        };

        for (status_id, clear) in expiring {
            if clear {
                let removed = self
                    .combatant_mut(owner)
                    .and_then(|c| c.remove_status(&status_id))
                    .is_some();
                if removed {
                    self.on_status_removed(owner, &status_id);
                }
            } else {
                self.reduce_status(owner, &status_id, 1);
            }
        }
    }

    // === Termination ===

    /// Evaluate the terminal condition, ending the combat if it is met
    ///
    /// Player dead → Defeat, no enemy left in the fight → Victory. Once a
    /// terminal outcome is stored it is returned unchanged. During setup the
    /// enemy list is still being filled, so only Defeat is reported there.
    pub fn check_combat_end(&mut self) -> CombatOutcome {
        if self.outcome.is_terminal() {
            return self.outcome;
        }

        let outcome = if !self.player.is_alive() {
            CombatOutcome::Defeat
        } else if self.phase == CombatPhase::Setup {
            CombatOutcome::InProgress
        } else if !self.enemies.iter().any(|e| e.in_combat()) {
            CombatOutcome::Victory
        } else {
            CombatOutcome::InProgress
        };

        if outcome.is_terminal() {
            self.finish(outcome);
        }
        outcome
    }

    /// End the combat with an explicit outcome (forfeit, scripted escape)
    pub fn end_combat(&mut self, outcome: CombatOutcome) -> CombatResult<()> {
        self.ensure_active()?;
        if !outcome.is_terminal() {
            return Err(CombatError::InvalidPhase("end_combat"));
        }
        self.finish(outcome);
        Ok(())
    }

    /// Leave the fight on the player's turn, if the rules allow it
    pub fn escape(&mut self) -> CombatResult<()> {
        self.ensure_active()?;
        if self.phase != CombatPhase::PlayerTurn || !self.rules.can_escape() {
            return Err(CombatError::InvalidPhase("escape"));
        }
        self.end_combat(CombatOutcome::Escaped)
    }

    fn finish(&mut self, outcome: CombatOutcome) {
        self.outcome = outcome;
        self.phase = CombatPhase::End;
        info!(?outcome, turn = self.turn, "combat ended");

        let victory = outcome == CombatOutcome::Victory;
        self.fire_relics(RelicTriggers::COMBAT_END, |def, player, cx| {
            def.on_combat_end(player, victory, cx)
        });

        self.piles.end_combat();
        self.player.clear_combat_statuses();
        self.player.clear_block();
        self.energy = 0;
        self.variables.clear();
        self.events.push(CombatEvent::CombatEnded { outcome });
    }

    // === Energy ===

    /// Spend energy; fails without mutation when there is not enough
    pub fn spend_energy(&mut self, amount: i32) -> CombatResult<()> {
        if amount < 0 {
            return Err(CombatError::InvalidAmount(amount));
        }
        if amount > self.energy {
            return Err(CombatError::InsufficientEnergy {
                required: amount,
                available: self.energy,
            });
        }
        self.energy -= amount;
        Ok(())
    }

    pub fn add_energy(&mut self, amount: i32) {
        self.energy = self.energy.saturating_add(amount).max(0);
    }

    pub fn set_energy(&mut self, value: i32) {
        self.energy = value.max(0);
    }

    // === Variables ===

    pub fn set_variable(&mut self, key: impl Into<String>, value: i32) {
        self.variables.insert(key.into(), value);
    }

    /// Value of a variable, 0 when unset
    pub fn variable(&self, key: &str) -> i32 {
        self.variables.get(key).copied().unwrap_or(0)
    }

    // === Cards ===

    /// Play the card in `hand_index`: pay its cost, move it out of the hand,
    /// and notify relics
    ///
    /// X-cost cards spend all energy and store the amount in [`X_VARIABLE`].
    /// Powers leave the piles entirely. The played card is returned so the
    /// caller can resolve its effect.
    pub fn play_card(&mut self, hand_index: usize) -> CombatResult<Card> {
        self.ensure_active()?;
        if self.phase != CombatPhase::PlayerTurn {
            return Err(CombatError::InvalidPhase("play_card"));
        }
        let card = self
            .piles
            .hand
            .get(hand_index)
            .cloned()
            .ok_or_else(|| CombatError::NotFound(format!("hand slot {hand_index}")))?;
        if !card.is_playable() {
            return Err(CombatError::Blocked(card.id));
        }

        if card.is_x_cost() {
            let x = self.energy;
            self.energy = 0;
            self.set_variable(X_VARIABLE, x);
        } else {
            self.spend_energy(card.cost)?;
        }

        self.piles.take_from_hand(hand_index);
        self.cards_played_this_turn += 1;
        let exhausted = card.exhausts && card.kind != CardKind::Power;
        match card.kind {
            CardKind::Power => {}
            _ if exhausted => self.piles.exhaust(card.clone()),
            _ => self.piles.discard(card.clone()),
        }

        debug!(card = %card.id, energy = self.energy, "card played");
        self.events.push(CombatEvent::CardPlayed {
            card_id: card.id.clone(),
        });
        self.fire_relics(RelicTriggers::CARD_PLAYED, |def, _, cx| def.on_card_played(&card, cx));

        if exhausted {
            self.events.push(CombatEvent::CardExhausted {
                card_id: card.id.clone(),
            });
            self.fire_relics(RelicTriggers::CARD_EXHAUST, |def, _, cx| def.on_card_exhaust(&card, cx));
        }
        Ok(card)
    }

    /// Draw up to `count` cards, bounded by the hand size limit
    pub fn draw_cards(&mut self, count: usize) -> CombatResult<usize> {
        self.ensure_active()?;
        Ok(self.draw_internal(count))
    }

    pub fn exhaust_card(&mut self, hand_index: usize) -> CombatResult<Card> {
        self.ensure_active()?;
        let card = self
            .piles
            .take_from_hand(hand_index)
            .ok_or_else(|| CombatError::NotFound(format!("hand slot {hand_index}")))?;
        self.piles.exhaust(card.clone());
        self.events.push(CombatEvent::CardExhausted {
            card_id: card.id.clone(),
        });
        self.fire_relics(RelicTriggers::CARD_EXHAUST, |def, _, cx| def.on_card_exhaust(&card, cx));
        Ok(card)
    }

    pub fn discard_card(&mut self, hand_index: usize) -> CombatResult<Card> {
        self.ensure_active()?;
        let card = self
            .piles
            .take_from_hand(hand_index)
            .ok_or_else(|| CombatError::NotFound(format!("hand slot {hand_index}")))?;
        self.piles.discard(card.clone());
        self.events.push(CombatEvent::CardDiscarded {
            card_id: card.id.clone(),
        });
        self.fire_relics(RelicTriggers::CARD_DISCARD, |def, _, cx| def.on_card_discard(&card, cx));
        Ok(card)
    }

    fn draw_internal(&mut self, count: usize) -> usize {
        let room = self.rules.hand_size_limit().saturating_sub(self.piles.hand.len());
        let drawn = self.piles.draw(count.min(room));
        if drawn.is_empty() {
            return 0;
        }

        self.events.push(CombatEvent::CardsDrawn { count: drawn.len() });
        for card in &drawn {
            self.fire_relics(RelicTriggers::CARD_DRAW, |def, _, cx| def.on_card_draw(card, cx));
        }
        drawn.len()
    }

    // === Resolution pipeline ===

    /// Deal damage from `source` (None for unowned damage) to `target`
    ///
    /// Attack damage runs through the rules formula, the attacker's status
    /// modifiers and (for the player) relic modifiers. All damage except
    /// HP loss then runs through the defender's status and relic modifiers
    /// before block and health are touched.
    pub fn deal_damage(
        &mut self,
        source: Option<Target>,
        target: Target,
        base: i32,
        flags: DamageFlags,
    ) -> CombatResult<DamageTaken> {
        self.ensure_active()?;
        self.check_target(target)?;
        if let Some(source) = source {
            self.check_target(source)?;
        }
        Ok(self.damage_internal(source, target, base, flags))
    }

    /// Player attack against an enemy
    pub fn attack(&mut self, target: Target, base: i32) -> CombatResult<DamageTaken> {
        self.deal_damage(Some(Target::Player), target, base, DamageFlags::ATTACK)
    }

    /// Gain block through the rules formula and block modifiers
    pub fn gain_block(&mut self, target: Target, base: i32) -> CombatResult<i32> {
        self.ensure_active()?;
        self.check_target(target)?;
        Ok(self.block_internal(target, base))
    }

    pub fn heal(&mut self, target: Target, amount: i32) -> CombatResult<i32> {
        self.ensure_active()?;
        self.check_target(target)?;
        Ok(self.heal_internal(target, amount))
    }

    /// Apply a status and run its apply/stack-change hooks
    pub fn apply_status(&mut self, target: Target, status_id: &str, stacks: i32) -> CombatResult<StackChange> {
        self.ensure_active()?;
        self.check_target(target)?;
        self.apply_status_internal(target, status_id, stacks)
    }

    /// Give the player gold after relic modifiers; returns the amount added
    pub fn gain_gold(&mut self, amount: i32) -> i32 {
        self.gain_gold_internal(amount)
    }

    fn damage_internal(&mut self, source: Option<Target>, target: Target, base: i32, flags: DamageFlags) -> DamageTaken {
        let cx = self.hook_context();
        let rules = self.rules;
        let is_attack = flags.contains(DamageFlags::ATTACK);

        let amount = {
            let defender = match self.combatant(target) {
                Some(c) if c.is_alive() && base > 0 => c,
                _ => return DamageTaken::default(),
            };
            let attacker = source.and_then(|s| self.combatant(s));

            let mut amount = base;
            if !flags.contains(DamageFlags::HP_LOSS) {
                if is_attack {
                    amount = rules.calculate_damage(amount, attacker, defender);
                    if let Some(attacker) = attacker {
                        for s in attacker.statuses().iter() {
                            amount = s.def.modify_damage_dealt(attacker, amount, s.stacks, &cx);
                        }
                    }
                    if source == Some(Target::Player) {
                        for relic in self.relics.iter() {
                            amount = relic.modify(RelicTriggers::MODIFY_DAMAGE_DEALT, amount, |d, v| {
                                d.modify_damage_dealt(v)
                            });
                        }
                    }
                }
                for s in defender.statuses().iter() {
                    amount = s.def.modify_damage_received(defender, amount, s.stacks, &cx);
                }
                // Received-damage relics only see the attack damage that gets past block
                if target == Target::Player && is_attack && !flags.contains(DamageFlags::THORNS) {
                    let blocked = if flags.contains(DamageFlags::UNBLOCKABLE) {
                        0
                    } else {
                        defender.block().clamp(0, amount.max(0))
                    };
                    let mut unblocked = amount - blocked;
                    for relic in self.relics.iter() {
                        unblocked = relic.modify(RelicTriggers::MODIFY_DAMAGE_RECEIVED, unblocked, |d, v| {
                            d.modify_damage_received(v)
                        });
                    }
                    amount = blocked + unblocked;
                }
            }
            amount.max(0)
        };

        let taken = match self.combatant_mut(target) {
            Some(defender) => defender.take_damage_detailed(amount, flags),
            None => return DamageTaken::default(),
        };
        debug!(
            ?source,
            ?target,
            base,
            amount,
            blocked = taken.blocked,
            health_lost = taken.health_lost,
            "damage resolved"
        );
        self.events.push(CombatEvent::Damage {
            source,
            target,
            amount,
            blocked: taken.blocked,
            health_lost: taken.health_lost,
        });

        if let (Some(attacker), true) = (source, is_attack) {
            self.run_status_hooks(attacker, Some(target), |def, owner, stacks, cx| {
                def.on_damage_dealt(owner, taken.health_lost, stacks, cx)
            });
        }
        if !flags.contains(DamageFlags::HP_LOSS) {
            self.run_status_hooks(target, source, |def, owner, stacks, cx| {
                def.on_damage_received(owner, taken.health_lost, flags, stacks, cx)
            });
        }

        if source == Some(Target::Player) && target != Target::Player {
            if let Some(snapshot) = self.combatant(target).map(|c| c.core().clone()) {
                self.fire_relics(RelicTriggers::DAMAGE_DEALT, |def, _, cx| {
                    def.on_damage_dealt(&snapshot, taken.health_lost, cx)
                });
            }
        }
        if target == Target::Player && taken.health_lost > 0 {
            self.fire_relics(RelicTriggers::DAMAGE_RECEIVED, |def, _, cx| {
                def.on_damage_received(taken.health_lost, cx)
            });
        }

        if taken.killed {
            match target {
                Target::Enemy(index) => self.handle_enemy_death(index),
                Target::Player => {
                    info!("player died");
                    self.check_combat_end();
                }
            }
        }
        taken
    }

    fn block_internal(&mut self, target: Target, base: i32) -> i32 {
        if base <= 0 {
            return 0;
        }
        let cx = self.hook_context();
        let rules = self.rules;

        let amount = match self.combatant(target) {
            Some(c) => {
                let mut amount = rules.calculate_block(base, c);
                for s in c.statuses().iter() {
                    amount = s.def.modify_block_gained(c, amount, s.stacks, &cx);
                }
                if target == Target::Player {
                    for relic in self.relics.iter() {
                        amount = relic.modify(RelicTriggers::MODIFY_BLOCK, amount, |d, v| d.modify_block_gained(v));
                    }
                }
                amount
            }
            None => return 0,
        };

        let gained = self.combatant_mut(target).map_or(0, |c| c.gain_block_exact(amount));
        if gained > 0 {
            debug!(?target, gained, "block gained");
            self.events.push(CombatEvent::BlockGained { target, amount: gained });
            self.run_status_hooks(target, None, |def, owner, stacks, cx| {
                def.on_block_gained(owner, gained, stacks, cx)
            });
        }
        gained
    }

    fn heal_internal(&mut self, target: Target, amount: i32) -> i32 {
        let rules = self.rules;
        let amount = match self.combatant(target) {
            Some(c) => {
                let mut amount = rules.calculate_healing(amount, c);
                if target == Target::Player {
                    for relic in self.relics.iter() {
                        amount = relic.modify(RelicTriggers::MODIFY_HEAL, amount, |d, v| d.modify_heal(v));
                    }
                }
                amount
            }
            None => return 0,
        };

        let healed = self.combatant_mut(target).map_or(0, |c| c.heal(amount));
        if healed > 0 {
            debug!(?target, healed, "healed");
            self.events.push(CombatEvent::Healed { target, amount: healed });
            if target == Target::Player {
                self.fire_relics(RelicTriggers::HEAL, |def, _, cx| def.on_heal(healed, cx));
            }
        }
        healed
    }

    fn apply_status_internal(&mut self, target: Target, status_id: &str, stacks: i32) -> CombatResult<StackChange> {
        let registry = self.statuses;
        let result = match self.combatant_mut(target) {
            Some(c) => c.apply_status(registry, status_id, stacks),
            None => Err(CombatError::NotFound(format!("{target:?}"))),
        };

        let change = match result {
            Ok(change) => change,
            Err(CombatError::Blocked(id)) => {
                self.events.push(CombatEvent::StatusBlocked {
                    target,
                    status_id: id.clone(),
                });
                return Err(CombatError::Blocked(id));
            }
            Err(e) => {
                debug!(?target, status = status_id, error = %e, "status not applied");
                return Err(e);
            }
        };

        debug!(?target, status = status_id, old = change.old, new = change.new, "status applied");
        self.events.push(CombatEvent::StatusApplied {
            target,
            status_id: status_id.to_string(),
            stacks,
            total: change.new,
        });

        if let Some(def) = registry.get(status_id) {
            let cx = self.hook_context();
            let actions = self
                .combatant(target)
                .map(|owner| {
                    if change.created() {
                        def.on_apply(owner, change.new, &cx)
                    } else {
                        def.on_stack_change(owner, change.old, change.new, &cx)
                    }
                })
                .unwrap_or_default();
            self.apply_status_actions(target, None, actions);
        }
        Ok(change)
    }

    fn reduce_status(&mut self, owner: Target, status_id: &str, stacks: i32) {
        let change = self
            .combatant_mut(owner)
            .and_then(|c| c.remove_status_stacks(status_id, stacks));
        if change.map_or(false, |c| c.removed()) {
            self.on_status_removed(owner, status_id);
        }
    }

    fn on_status_removed(&mut self, owner: Target, status_id: &str) {
        self.events.push(CombatEvent::StatusRemoved {
            target: owner,
            status_id: status_id.to_string(),
        });
        let registry = self.statuses;
        if let Some(def) = registry.get(status_id) {
            let cx = self.hook_context();
            let actions = self
                .combatant(owner)
                .map(|c| def.on_remove(c, &cx))
                .unwrap_or_default();
            self.apply_status_actions(owner, None, actions);
        }
    }

    fn gain_gold_internal(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let mut amount = amount;
        for relic in self.relics.iter() {
            amount = relic.modify(RelicTriggers::MODIFY_GOLD, amount, |d, v| d.modify_gold(v));
        }
        let added = self.player.add_gold(amount);
        if added > 0 {
            info!(gold = added, total = self.player.gold(), "gold gained");
            self.events.push(CombatEvent::GoldGained { amount: added });
        }
        added
    }

    // === Enemies ===

    fn enemy_can_act(&self, index: usize) -> bool {
        self.enemies.get(index).map_or(false, |e| e.in_combat())
    }

    fn decide_intent(&mut self, index: usize) {
        let Some(enemy) = self.enemies.get_mut(index) else {
            return;
        };
        let def = enemy.def_arc();
        let intent = def.behavior.decide_intent(enemy, &mut self.rng);
        enemy.intent = Some(intent.clone());
        debug!(enemy = %enemy.id(), intent = %intent.summary(), "intent decided");
        self.events.push(CombatEvent::IntentDecided { index, intent });
    }

    fn run_spawn_hooks(&mut self, index: usize) {
        let Some(enemy) = self.enemies.get_mut(index) else {
            return;
        };
        let def = enemy.def_arc();
        let actions = def.behavior.on_spawn(enemy);
        self.apply_intent_actions(index, actions);
        if self.enemy_can_act(index) {
            self.decide_intent(index);
        }
    }

    /// Add a catalog enemy mid-fight; it acts from the next enemy turn on
    fn summon(&mut self, enemy_id: &str) -> CombatResult<usize> {
        let catalog = self
            .enemy_catalog
            .ok_or_else(|| CombatError::NotFound(enemy_id.to_string()))?;
        let instance_id = format!("{}_{}", enemy_id, self.enemies.len());
        let enemy = catalog.spawn(enemy_id, instance_id, &mut self.rng)?;
        self.enemies.push(enemy);
        let index = self.enemies.len() - 1;

        info!(enemy = enemy_id, index, "enemy summoned");
        self.events.push(CombatEvent::EnemySpawned {
            index,
            enemy_id: enemy_id.to_string(),
        });
        self.run_spawn_hooks(index);
        Ok(index)
    }

    fn handle_enemy_death(&mut self, index: usize) {
        let Some(enemy) = self.enemies.get_mut(index) else {
            return;
        };
        let def = enemy.def_arc();
        let actions = def.behavior.on_death(enemy);
        info!(enemy = %enemy.id(), "enemy died");
        let snapshot = enemy.core().clone();
        self.events.push(CombatEvent::EnemyDied { index });

        self.fire_relics(RelicTriggers::ENEMY_DEATH, |def, _, cx| def.on_enemy_death(&snapshot, cx));
        self.apply_intent_actions(index, actions);
        self.check_combat_end();
    }

    fn apply_intent_actions(&mut self, index: usize, actions: Vec<IntentAction>) {
        let me = Target::Enemy(index);
        for action in actions {
            if self.is_over() && !matches!(action, IntentAction::DropGold { .. }) {
                break;
            }
            match action {
                IntentAction::Attack { damage, times } => {
                    for _ in 0..times.max(0) {
                        if !self.enemy_can_act(index) || !self.player.is_alive() {
                            break;
                        }
                        self.damage_internal(Some(me), Target::Player, damage, DamageFlags::ATTACK);
                    }
                }
                IntentAction::GainBlock { amount } => {
                    self.block_internal(me, amount);
                }
                IntentAction::ApplyStatusToSelf { status_id, stacks } => {
                    let _ = self.apply_status_internal(me, &status_id, stacks);
                }
                IntentAction::ApplyStatusToPlayer { status_id, stacks } => {
                    let _ = self.apply_status_internal(Target::Player, &status_id, stacks);
                }
                IntentAction::Heal { amount } => {
                    self.heal_internal(me, amount);
                }
                IntentAction::Summon { enemy_id } => {
                    if let Err(e) = self.summon(&enemy_id) {
                        warn!(enemy = %enemy_id, error = %e, "summon failed");
                    }
                }
                IntentAction::DropGold { amount } => {
                    self.gain_gold_internal(amount);
                }
                IntentAction::Escape => {
                    if let Some(enemy) = self.enemies.get_mut(index) {
                        enemy.escaped = true;
                        info!(enemy = %enemy.id(), "enemy escaped");
                    }
                    self.events.push(CombatEvent::EnemyEscaped { index });
                    self.check_combat_end();
                }
            }
        }
    }

    // === Hook plumbing ===

    fn hook_context(&self) -> HookContext {
        HookContext {
            turn: self.turn,
            phase: self.phase,
        }
    }

    fn ensure_active(&self) -> CombatResult<()> {
        if self.outcome.is_terminal() {
            Err(CombatError::CombatOver)
        } else {
            Ok(())
        }
    }

    fn check_target(&self, target: Target) -> CombatResult<()> {
        match self.combatant(target) {
            Some(_) => Ok(()),
            None => Err(CombatError::NotFound(format!("{target:?}"))),
        }
    }

    fn combatant(&self, target: Target) -> Option<&dyn Combatant> {
        match target {
            Target::Player => Some(&*self.player as &dyn Combatant),
            Target::Enemy(index) => self.enemies.get(index).map(|e| e as &dyn Combatant),
        }
    }

    fn combatant_mut(&mut self, target: Target) -> Option<&mut dyn Combatant> {
        match target {
            Target::Player => Some(&mut *self.player as &mut dyn Combatant),
            Target::Enemy(index) => self.enemies.get_mut(index).map(|e| e as &mut dyn Combatant),
        }
    }

    /// Collect actions from every status on `owner`, then apply them in order
    fn run_status_hooks<F>(&mut self, owner: Target, source: Option<Target>, mut hook: F)
    where
        F: FnMut(&StatusEffectDef, &dyn Combatant, i32, &HookContext) -> Vec<StatusAction>,
    {
        let cx = self.hook_context();
        let actions: Vec<StatusAction> = match self.combatant(owner) {
            Some(c) => c
                .statuses()
                .iter()
                .flat_map(|s| hook(s.def.as_ref(), c, s.stacks, &cx))
                .collect(),
            None => return,
        };
        if !actions.is_empty() {
            self.apply_status_actions(owner, source, actions);
        }
    }

    fn apply_status_actions(&mut self, owner: Target, source: Option<Target>, actions: Vec<StatusAction>) {
        for action in actions {
            // Retaliation still lands when the hit killed its owner
            let owner_alive = self.combatant(owner).map_or(false, |c| c.is_alive());
            if !owner_alive && !matches!(action, StatusAction::DamageSource { .. }) {
                continue;
            }
            match action {
                StatusAction::LoseHp { amount } => {
                    self.damage_internal(None, owner, amount, DamageFlags::HP_LOSS);
                }
                StatusAction::GainBlock { amount } => {
                    let gained = self.combatant_mut(owner).map_or(0, |c| c.gain_block_exact(amount));
                    if gained > 0 {
                        self.events.push(CombatEvent::BlockGained {
                            target: owner,
                            amount: gained,
                        });
                    }
                }
                StatusAction::Heal { amount } => {
                    self.heal_internal(owner, amount);
                }
                StatusAction::ApplyStatus { status_id, stacks } => {
                    let _ = self.apply_status_internal(owner, &status_id, stacks);
                }
                StatusAction::ReduceStacks { status_id, stacks } => {
                    self.reduce_status(owner, &status_id, stacks);
                }
                StatusAction::DamageSource { amount } => {
                    if let Some(source) = source {
                        self.damage_internal(Some(owner), source, amount, DamageFlags::THORNS);
                    }
                }
            }
        }
    }

    /// Run a relic hook on every owned relic, then apply the effects
    fn fire_relics<F>(&mut self, trigger: RelicTriggers, mut hook: F)
    where
        F: FnMut(&RelicDef, &PlayerCombatant, &HookContext) -> Vec<RelicEffect>,
    {
        let cx = self.hook_context();
        let player: &PlayerCombatant = self.player;
        let mut fired = Vec::new();
        for relic in self.relics.iter_mut() {
            let effects = relic.fire(trigger, |def| hook(def, player, &cx));
            if !effects.is_empty() {
                fired.push((relic.id().to_string(), effects));
            }
        }

        for (relic_id, effects) in fired {
            debug!(relic = %relic_id, ?trigger, "relic triggered");
            self.events.push(CombatEvent::RelicTriggered {
                relic_id: relic_id.clone(),
            });
            self.apply_relic_effects(&relic_id, effects);
        }
    }

    fn apply_relic_effects(&mut self, relic_id: &str, effects: Vec<RelicEffect>) {
        for effect in effects {
            // After the combat ends only effects that outlive it still apply
            if self.is_over()
                && !matches!(
                    effect,
                    RelicEffect::Heal { .. } | RelicEffect::GainGold { .. } | RelicEffect::GainMaxHealth { .. }
                )
            {
                debug!(relic = relic_id, ?effect, "effect dropped after combat end");
                continue;
            }
            match effect {
                RelicEffect::GainBlock { amount } => {
                    let gained = self.player.gain_block_exact(amount);
                    if gained > 0 {
                        self.events.push(CombatEvent::BlockGained {
                            target: Target::Player,
                            amount: gained,
                        });
                    }
                }
                RelicEffect::Heal { amount } => {
                    self.heal_internal(Target::Player, amount);
                }
                RelicEffect::GainEnergy { amount } => self.add_energy(amount),
                RelicEffect::DrawCards { count } => {
                    self.draw_internal(count);
                }
                RelicEffect::GainGold { amount } => {
                    self.gain_gold_internal(amount);
                }
                RelicEffect::GainMaxHealth { amount } => {
                    let max = self.player.max_health().saturating_add(amount);
                    self.player.set_max_health(max);
                    self.heal_internal(Target::Player, amount);
                }
                RelicEffect::ApplyStatusToPlayer { status_id, stacks } => {
                    let _ = self.apply_status_internal(Target::Player, &status_id, stacks);
                }
                RelicEffect::ApplyStatusToAllEnemies { status_id, stacks } => {
                    for index in self.living_enemies() {
                        let _ = self.apply_status_internal(Target::Enemy(index), &status_id, stacks);
                    }
                }
                RelicEffect::DamageAllEnemies { amount } => {
                    for index in self.living_enemies() {
                        self.damage_internal(None, Target::Enemy(index), amount, DamageFlags::NONE);
                    }
                }
                RelicEffect::AdvanceCounter => {}
            }
        }
    }
}
