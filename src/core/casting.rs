//! Hexagram Engine: the three-coin method
//!
//! Each line is three independent fair coins, tails = 2, heads = 3:
//! - 6 (old yin):   1/8, changing
//! - 7 (young yang): 3/8
//! - 8 (young yin):  3/8
//! - 9 (old yang):  1/8, changing
//!
//! The distribution comes from the three draws, never from a weighted pick.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::core::names::lookup_name;
use crate::types::{DerivedFigure, Hexagram, HexagramBuilder, HexagramFigure, HexagramPayload, Yao};
use crate::{COINS_PER_LINE, COIN_HEADS, COIN_TAILS};

/// Coin caster over an injectable random source
#[derive(Debug)]
pub struct HexagramEngine<R = StdRng> {
    rng: R,
}

impl HexagramEngine<StdRng> {
    /// Engine seeded from OS entropy
    pub fn new() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Deterministic engine for replays and tests
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for HexagramEngine<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> HexagramEngine<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Sum of three coins, in 6..=9
    pub fn toss_coins(&mut self) -> u8 {
        (0..COINS_PER_LINE)
            .map(|_| if self.rng.gen_bool(0.5) { COIN_HEADS } else { COIN_TAILS })
            .sum()
    }

    /// One classified line
    pub fn cast_line(&mut self) -> Yao {
        let value = self.toss_coins();
        match Yao::from_value(value) {
            Ok(yao) => yao,
            Err(_) => unreachable!("three coins summed to {}", value),
        }
    }

    /// Cast the next line onto a hexagram under construction
    pub fn cast_onto(&mut self, builder: &mut HexagramBuilder) -> Option<Yao> {
        if builder.is_complete() {
            return None;
        }
        let yao = self.cast_line();
        builder.push(yao).ok()?;
        Some(yao)
    }

    /// Six lines, bottom first
    pub fn cast_hexagram(&mut self) -> Hexagram {
        // from_fn fills index 0 (the bottom line) first
        Hexagram::new(std::array::from_fn(|_| self.cast_line()))
    }

    /// Cast and name a full reading
    pub fn cast_reading(&mut self) -> CastReading {
        CastReading::from_hexagram(self.cast_hexagram())
    }
}

/// A cast hexagram with its names and derived hexagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CastReading {
    pub original: Hexagram,
    pub original_sequence: String,
    pub original_name: &'static str,
    /// Absent when no line is changing
    pub derived: Option<Hexagram>,
    pub derived_sequence: Option<String>,
    pub derived_name: Option<&'static str>,
    /// 1-based, ascending
    pub changing_lines: Vec<usize>,
}

impl CastReading {
    pub fn from_hexagram(original: Hexagram) -> Self {
        let original_sequence = original.to_binary_sequence();
        let original_name = lookup_name(&original_sequence);
        let derived = original.derive_changed();
        let derived_sequence = derived.as_ref().map(Hexagram::to_binary_sequence);
        let derived_name = derived_sequence.as_deref().map(lookup_name);

        Self {
            changing_lines: original.changing_line_positions(),
            original,
            original_sequence,
            original_name,
            derived,
            derived_sequence,
            derived_name,
        }
    }

    /// Request body context for `POST /api/iching/divination`
    pub fn to_payload(&self) -> HexagramPayload {
        HexagramPayload {
            original: Some(HexagramFigure {
                sequence: self.original_sequence.clone(),
                name: self.original_name.to_string(),
            }),
            derived: match (&self.derived_sequence, self.derived_name) {
                (Some(sequence), Some(name)) => Some(DerivedFigure {
                    sequence: sequence.clone(),
                    name: name.to_string(),
                    changing_yaos: self.changing_lines.clone(),
                }),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_tosses_stay_in_range() {
        let mut engine = HexagramEngine::seeded(7);
        for _ in 0..1000 {
            let value = engine.toss_coins();
            assert!((6..=9).contains(&value), "toss out of range: {}", value);
        }
    }

    #[test]
    fn test_seeded_engines_agree() {
        let mut a = HexagramEngine::seeded(42);
        let mut b = HexagramEngine::seeded(42);
        assert_eq!(a.cast_hexagram(), b.cast_hexagram());
    }

    #[test]
    fn test_all_heads_gives_old_yang() {
        // gen_bool(0.5) is true for a source stuck at zero
        let mut engine = HexagramEngine::with_rng(StepRng::new(0, 0));
        assert_eq!(engine.toss_coins(), 9);
        let reading = engine.cast_reading();
        assert_eq!(reading.original_sequence, "111111");
        assert_eq!(reading.derived_name, Some("坤为地"));
    }

    #[test]
    fn test_all_tails_gives_old_yin() {
        let mut engine = HexagramEngine::with_rng(StepRng::new(u64::MAX, 0));
        assert_eq!(engine.toss_coins(), 6);
        let reading = engine.cast_reading();
        assert_eq!(reading.original_sequence, "000000");
        assert_eq!(reading.changing_lines, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(reading.derived_sequence.as_deref(), Some("111111"));
        assert_eq!(reading.derived_name, Some("乾为天"));
    }

    #[test]
    fn test_cast_onto_stops_at_six() {
        let mut engine = HexagramEngine::seeded(1);
        let mut builder = HexagramBuilder::new();
        for _ in 0..6 {
            assert!(engine.cast_onto(&mut builder).is_some());
        }
        assert!(engine.cast_onto(&mut builder).is_none());
        assert_eq!(builder.len(), 6);
    }

    #[test]
    fn test_payload_without_changes_has_no_derived() {
        let hexagram = Hexagram::from_values(&[7, 7, 7, 8, 8, 8]).unwrap();
        let payload = CastReading::from_hexagram(hexagram).to_payload();
        assert_eq!(payload.original.unwrap().name, "地天泰");
        assert!(payload.derived.is_none());
    }
}
