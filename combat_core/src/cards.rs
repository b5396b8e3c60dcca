//! Cards - Minimal card records and the draw/discard/exhaust/hand piles
//!
//! The engine treats cards as opaque: it moves them between piles, charges
//! energy, and tells relics about it. What a card *does* is up to the caller.

use serde::{Deserialize, Serialize};

/// Energy cost marker for X-cost cards (spend all remaining energy)
pub const X_COST: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    #[default]
    Attack,
    Skill,
    Power,
    /// Unplayable clutter added by enemies
    Status,
    /// Unplayable clutter added by events
    Curse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: CardKind,
    /// Energy cost, [`X_COST`] for X-cost cards
    #[serde(default)]
    pub cost: i32,
    /// Goes to the exhaust pile when played
    #[serde(default)]
    pub exhausts: bool,
}

impl Card {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: CardKind, cost: i32) -> Self {
        Card {
            id: id.into(),
            name: name.into(),
            kind,
            cost,
            exhausts: false,
        }
    }

    pub fn exhausting(mut self) -> Self {
        self.exhausts = true;
        self
    }

    pub fn is_x_cost(&self) -> bool {
        self.cost == X_COST
    }

    pub fn is_playable(&self) -> bool {
        !matches!(self.kind, CardKind::Status | CardKind::Curse) && self.cost >= X_COST
    }
}

/// The four card piles of one combat
///
/// `deck` is the master list handed in by the run; `setup` copies it into the
/// draw pile in order. Recycling the discard pile keeps order as well, so a
/// caller that wants shuffling shuffles `draw` itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardPiles {
    pub deck: Vec<Card>,
    pub draw: Vec<Card>,
    pub discard: Vec<Card>,
    pub exhaust: Vec<Card>,
    pub hand: Vec<Card>,
}

impl CardPiles {
    pub fn new(deck: Vec<Card>) -> Self {
        CardPiles {
            deck,
            ..Default::default()
        }
    }

    /// Fill the draw pile from the deck and empty everything else
    pub fn setup(&mut self) {
        self.draw = self.deck.clone();
        self.discard.clear();
        self.exhaust.clear();
        self.hand.clear();
    }

    /// Empty every combat pile; the deck is untouched
    pub fn end_combat(&mut self) {
        self.draw.clear();
        self.discard.clear();
        self.exhaust.clear();
        self.hand.clear();
    }

    /// Move up to `count` cards from the top of the draw pile into the hand
    ///
    /// An empty draw pile is refilled from the discard pile once per call.
    /// Returns the cards drawn (copies of what is now in the hand).
    pub fn draw(&mut self, count: usize) -> Vec<Card> {
        let mut drawn = Vec::with_capacity(count);
        for _ in 0..count {
            if self.draw.is_empty() {
                if self.discard.is_empty() {
                    break;
                }
                self.draw.append(&mut self.discard);
            }
            let card = self.draw.remove(0);
            drawn.push(card.clone());
            self.hand.push(card);
        }
        drawn
    }

    /// Remove a card from the hand by slot
    pub fn take_from_hand(&mut self, index: usize) -> Option<Card> {
        if index < self.hand.len() {
            Some(self.hand.remove(index))
        } else {
            None
        }
    }

    /// Move the whole hand to the discard pile, returning how many cards moved
    pub fn discard_hand(&mut self) -> usize {
        let count = self.hand.len();
        self.discard.append(&mut self.hand);
        count
    }

    pub fn discard(&mut self, card: Card) {
        self.discard.push(card);
    }

    pub fn exhaust(&mut self, card: Card) {
        self.exhaust.push(card);
    }

    /// Slot of the first card in hand with this id
    pub fn find_in_hand(&self, id: &str) -> Option<usize> {
        self.hand.iter().position(|c| c.id == id)
    }
}
