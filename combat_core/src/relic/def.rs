//! RelicDef - Relic catalog entries and their hook table

use crate::cards::{Card, CardKind};
use crate::combatant::Combatant;
use crate::status::ids;
use crate::types::HookContext;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Events a relic reacts to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct RelicTriggers: u32 {
        const OBTAIN                 = 1 << 0;
        const REMOVE                 = 1 << 1;
        const COMBAT_START           = 1 << 2;
        const COMBAT_END             = 1 << 3;
        const TURN_START             = 1 << 4;
        const TURN_END               = 1 << 5;
        const CARD_PLAYED            = 1 << 6;
        const CARD_DRAW              = 1 << 7;
        const CARD_EXHAUST           = 1 << 8;
        const CARD_DISCARD           = 1 << 9;
        const DAMAGE_DEALT           = 1 << 10;
        const DAMAGE_RECEIVED        = 1 << 11;
        const HEAL                   = 1 << 12;
        const ENEMY_DEATH            = 1 << 13;
        const MODIFY_DAMAGE_DEALT    = 1 << 14;
        const MODIFY_DAMAGE_RECEIVED = 1 << 15;
        const MODIFY_BLOCK           = 1 << 16;
        const MODIFY_HEAL            = 1 << 17;
        const MODIFY_GOLD            = 1 << 18;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelicRarity {
    Starter,
    #[default]
    Common,
    Uncommon,
    Rare,
    Boss,
    Shop,
    Event,
}

/// Built-in relic behaviors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelicKind {
    #[default]
    Generic,
    /// Heal after a won combat
    BurningBlood,
    /// Heal at combat start
    BloodVial,
    /// Block at combat start
    Anchor,
    /// Strength at combat start
    Vajra,
    /// Dexterity at combat start
    OddlySmoothStone,
    /// Vulnerable on every enemy at combat start
    BagOfMarbles,
    /// Extra draw at combat start
    BagOfPreparation,
    /// Energy every N cards played
    Nunchaku,
    /// Double damage every N attacks played
    PenNib,
    /// Energy every N turns
    HappyFlower,
    /// Damage all enemies at turn start
    MercuryHourglass,
    /// Block at turn end when the player has none
    Orichalcum,
    /// Energy and a draw whenever an enemy dies
    GremlinHorn,
    /// Damage all enemies whenever a card is exhausted
    CharonsAshes,
    /// Small incoming hits are reduced to 1
    Torii,
    /// Small outgoing hits are raised to `amount`
    Boot,
    /// More gold
    GoldenIdol,
    /// More healing
    MagicFlower,
    /// Max health on pickup
    Strawberry,
    /// Gold on pickup
    OldCoin,
}

impl RelicKind {
    /// Events this kind listens to
    pub fn default_triggers(self) -> RelicTriggers {
        use RelicKind::*;
        match self {
            Generic => RelicTriggers::empty(),
            BurningBlood => RelicTriggers::COMBAT_END,
            BloodVial | Anchor | Vajra | OddlySmoothStone | BagOfMarbles | BagOfPreparation => {
                RelicTriggers::COMBAT_START
            }
            Nunchaku | PenNib => RelicTriggers::CARD_PLAYED,
            HappyFlower | MercuryHourglass => RelicTriggers::TURN_START,
            Orichalcum => RelicTriggers::TURN_END,
            GremlinHorn => RelicTriggers::ENEMY_DEATH,
            CharonsAshes => RelicTriggers::CARD_EXHAUST,
            Torii => RelicTriggers::MODIFY_DAMAGE_RECEIVED,
            Boot => RelicTriggers::MODIFY_DAMAGE_DEALT,
            GoldenIdol => RelicTriggers::MODIFY_GOLD,
            MagicFlower => RelicTriggers::MODIFY_HEAL,
            Strawberry | OldCoin => RelicTriggers::OBTAIN,
        }
    }

    /// Magnitude used when a def leaves `amount` at 0
    pub fn default_amount(self) -> i32 {
        use RelicKind::*;
        match self {
            BurningBlood => 6,
            BloodVial => 2,
            Anchor => 10,
            Vajra | OddlySmoothStone | BagOfMarbles | Nunchaku | PenNib | HappyFlower | GremlinHorn => 1,
            BagOfPreparation => 2,
            MercuryHourglass | CharonsAshes => 3,
            Orichalcum => 6,
            Boot => 5,
            GoldenIdol => 25,
            MagicFlower => 50,
            Strawberry => 7,
            OldCoin => 300,
            Generic | Torii => 0,
        }
    }

    /// Counter length used when a def leaves `counter_max` at 0
    pub fn default_counter_max(self) -> i32 {
        match self {
            RelicKind::Nunchaku | RelicKind::PenNib => 10,
            RelicKind::HappyFlower => 3,
            _ => 0,
        }
    }
}

/// A state change requested by a relic hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelicEffect {
    /// Flat block for the player
    GainBlock { amount: i32 },
    Heal { amount: i32 },
    GainEnergy { amount: i32 },
    DrawCards { count: usize },
    GainGold { amount: i32 },
    GainMaxHealth { amount: i32 },
    ApplyStatusToPlayer { status_id: String, stacks: i32 },
    ApplyStatusToAllEnemies { status_id: String, stacks: i32 },
    /// Unblockable-by-flags normal damage to every living enemy
    DamageAllEnemies { amount: i32 },
    /// Advance the relic's own counter; handled by the instance
    AdvanceCounter,
}

/// Relic catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelicDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rarity: RelicRarity,
    /// Empty means "use the kind's defaults"
    #[serde(default)]
    pub triggers: RelicTriggers,
    /// 0 = no counter
    #[serde(default)]
    pub counter_max: i32,
    /// At most one copy per run
    #[serde(default = "default_unique")]
    pub unique: bool,
    #[serde(default)]
    pub price: i32,
    #[serde(default)]
    pub kind: RelicKind,
    /// Magnitude for the kind's effect, 0 = kind default
    #[serde(default)]
    pub amount: i32,
}

fn default_unique() -> bool {
    true
}

impl RelicDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: RelicKind) -> Self {
        RelicDef {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            rarity: RelicRarity::Common,
            triggers: kind.default_triggers(),
            counter_max: kind.default_counter_max(),
            unique: true,
            price: 0,
            kind,
            amount: kind.default_amount(),
        }
    }

    pub fn with_amount(mut self, amount: i32) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_rarity(mut self, rarity: RelicRarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn with_counter_max(mut self, counter_max: i32) -> Self {
        self.counter_max = counter_max;
        self
    }

    /// Fill unset fields from the kind's defaults
    pub fn normalized(mut self) -> Self {
        if self.triggers.is_empty() {
            self.triggers = self.kind.default_triggers();
        }
        if self.amount == 0 {
            self.amount = self.kind.default_amount();
        }
        if self.counter_max == 0 {
            self.counter_max = self.kind.default_counter_max();
        }
        self
    }

    pub fn listens_to(&self, trigger: RelicTriggers) -> bool {
        self.triggers.contains(trigger)
    }

    // === Lifecycle hooks ===

    pub fn on_obtain(&self) -> Vec<RelicEffect> {
        match self.kind {
            RelicKind::Strawberry => vec![RelicEffect::GainMaxHealth { amount: self.amount }],
            RelicKind::OldCoin => vec![RelicEffect::GainGold { amount: self.amount }],
            _ => Vec::new(),
        }
    }

    pub fn on_remove(&self) -> Vec<RelicEffect> {
        Vec::new()
    }

    // === Combat hooks ===

    pub fn on_combat_start(&self, _player: &dyn Combatant, _cx: &HookContext) -> Vec<RelicEffect> {
        match self.kind {
            RelicKind::BloodVial => vec![RelicEffect::Heal { amount: self.amount }],
            RelicKind::Anchor => vec![RelicEffect::GainBlock { amount: self.amount }],
            RelicKind::Vajra => vec![self.player_status(ids::STRENGTH)],
            RelicKind::OddlySmoothStone => vec![self.player_status(ids::DEXTERITY)],
            RelicKind::BagOfMarbles => vec![RelicEffect::ApplyStatusToAllEnemies {
                status_id: ids::VULNERABLE.to_string(),
                stacks: self.amount,
            }],
            RelicKind::BagOfPreparation => vec![RelicEffect::DrawCards {
                count: self.amount.max(0) as usize,
            }],
            _ => Vec::new(),
        }
    }

    pub fn on_combat_end(&self, _player: &dyn Combatant, victory: bool, _cx: &HookContext) -> Vec<RelicEffect> {
        match self.kind {
            RelicKind::BurningBlood if victory => vec![RelicEffect::Heal { amount: self.amount }],
            _ => Vec::new(),
        }
    }

    pub fn on_turn_start(&self, _player: &dyn Combatant, _turn: u32, _cx: &HookContext) -> Vec<RelicEffect> {
        match self.kind {
            RelicKind::HappyFlower => vec![RelicEffect::AdvanceCounter],
            RelicKind::MercuryHourglass => vec![RelicEffect::DamageAllEnemies { amount: self.amount }],
            _ => Vec::new(),
        }
    }

    pub fn on_turn_end(&self, player: &dyn Combatant, _turn: u32, _cx: &HookContext) -> Vec<RelicEffect> {
        match self.kind {
            RelicKind::Orichalcum if player.block() == 0 => {
                vec![RelicEffect::GainBlock { amount: self.amount }]
            }
            _ => Vec::new(),
        }
    }

    // === Card hooks ===

    pub fn on_card_played(&self, card: &Card, _cx: &HookContext) -> Vec<RelicEffect> {
        match self.kind {
            RelicKind::Nunchaku => vec![RelicEffect::AdvanceCounter],
            RelicKind::PenNib if card.kind == CardKind::Attack => vec![RelicEffect::AdvanceCounter],
            _ => Vec::new(),
        }
    }

    pub fn on_card_draw(&self, _card: &Card, _cx: &HookContext) -> Vec<RelicEffect> {
        Vec::new()
    }

    pub fn on_card_exhaust(&self, _card: &Card, _cx: &HookContext) -> Vec<RelicEffect> {
        match self.kind {
            RelicKind::CharonsAshes => vec![RelicEffect::DamageAllEnemies { amount: self.amount }],
            _ => Vec::new(),
        }
    }

    pub fn on_card_discard(&self, _card: &Card, _cx: &HookContext) -> Vec<RelicEffect> {
        Vec::new()
    }

    // === Damage/heal hooks ===

    pub fn on_damage_dealt(&self, _target: &dyn Combatant, _amount: i32, _cx: &HookContext) -> Vec<RelicEffect> {
        Vec::new()
    }

    pub fn on_damage_received(&self, _amount: i32, _cx: &HookContext) -> Vec<RelicEffect> {
        Vec::new()
    }

    pub fn on_heal(&self, _amount: i32, _cx: &HookContext) -> Vec<RelicEffect> {
        Vec::new()
    }

    pub fn on_enemy_death(&self, _enemy: &dyn Combatant, _cx: &HookContext) -> Vec<RelicEffect> {
        match self.kind {
            RelicKind::GremlinHorn => vec![
                RelicEffect::GainEnergy { amount: self.amount },
                RelicEffect::DrawCards { count: 1 },
            ],
            _ => Vec::new(),
        }
    }

    /// Fired when the counter wraps back to 0
    pub fn on_counter_reached(&self) -> Vec<RelicEffect> {
        match self.kind {
            RelicKind::Nunchaku | RelicKind::HappyFlower => {
                vec![RelicEffect::GainEnergy { amount: self.amount }]
            }
            RelicKind::PenNib => vec![RelicEffect::ApplyStatusToPlayer {
                status_id: "double_damage".to_string(),
                stacks: self.amount,
            }],
            _ => Vec::new(),
        }
    }

    // === Modifier hooks ===

    pub fn modify_damage_dealt(&self, base: i32) -> i32 {
        match self.kind {
            RelicKind::Boot if base > 0 && base < self.amount => self.amount,
            _ => base,
        }
    }

    /// Applied to the unblocked part of an attack on the player
    pub fn modify_damage_received(&self, base: i32) -> i32 {
        match self.kind {
            RelicKind::Torii if (2..=5).contains(&base) => 1,
            _ => base,
        }
    }

    pub fn modify_block_gained(&self, base: i32) -> i32 {
        base
    }

    pub fn modify_heal(&self, base: i32) -> i32 {
        match self.kind {
            RelicKind::MagicFlower => scale_percent(base, self.amount),
            _ => base,
        }
    }

    pub fn modify_gold(&self, base: i32) -> i32 {
        match self.kind {
            RelicKind::GoldenIdol => scale_percent(base, self.amount),
            _ => base,
        }
    }

    fn player_status(&self, status_id: &str) -> RelicEffect {
        RelicEffect::ApplyStatusToPlayer {
            status_id: status_id.to_string(),
            stacks: self.amount,
        }
    }
}

/// `base × (100 + percent) / 100`, floored
fn scale_percent(base: i32, percent: i32) -> i32 {
    ((base as i64 * (100 + percent as i64)) / 100) as i32
}
