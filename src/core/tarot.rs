//! Tarot deck: 22 major arcana plus four suits of 14

use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::{Orientation, TarotCard};

/// Major arcana, numbered
pub const MAJOR_ARCANA: [&str; 22] = [
    "00愚者", "01魔术师", "02女祭司", "03皇后", "04皇帝", "05教皇", "06恋人", "07战车",
    "08力量", "09隐士", "10命运之轮", "11正义", "12倒吊人", "13死神",
    "14节制", "15恶魔", "16高塔", "17星星", "18月亮", "19太阳", "20审判", "21世界",
];

/// Minor arcana suits: cups, wands, swords, pentacles
pub const SUITS: [&str; 4] = ["圣杯", "权杖", "宝剑", "星币"];

/// Ranks within a suit, ace to king
pub const RANKS: [&str; 14] = [
    "ACE", "2", "3", "4", "5", "6", "7", "8", "9", "10", "侍卫", "骑士", "王后", "国王",
];

/// A full 78-card deck
#[derive(Debug, Clone)]
pub struct TarotDeck {
    cards: Vec<String>,
}

impl Default for TarotDeck {
    fn default() -> Self {
        Self::new()
    }
}

impl TarotDeck {
    /// Unshuffled deck: major arcana, then each suit in rank order
    pub fn new() -> Self {
        let major = MAJOR_ARCANA.iter().map(|name| name.to_string());
        let minor = SUITS
            .iter()
            .flat_map(|suit| RANKS.iter().map(move |rank| format!("{}{}", suit, rank)));
        Self {
            cards: major.chain(minor).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.cards
    }

    /// Fisher-Yates shuffle in place
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Draw `count` distinct cards, each upright or reversed with equal odds.
    /// Draws at most the whole deck.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<TarotCard> {
        self.cards
            .choose_multiple(rng, count.min(self.cards.len()))
            .map(|name| TarotCard {
                name: name.clone(),
                orientation: if rng.gen_bool(0.5) {
                    Orientation::Upright
                } else {
                    Orientation::Reversed
                },
            })
            .collect()
    }
}
