//! Hexagrams: six lines, bottom to top

use serde::Serialize;
use std::fmt;

use crate::error::HexagramError;
use crate::types::Yao;
use crate::LINES_PER_HEXAGRAM;

/// A complete hexagram. Index 0 is the bottom line (position 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Hexagram {
    lines: [Yao; LINES_PER_HEXAGRAM],
}

impl Hexagram {
    pub fn new(lines: [Yao; LINES_PER_HEXAGRAM]) -> Self {
        Self { lines }
    }

    /// Build from exactly six lines in casting order
    pub fn from_lines(lines: impl IntoIterator<Item = Yao>) -> Result<Self, HexagramError> {
        let mut builder = HexagramBuilder::new();
        for yao in lines {
            builder.push(yao)?;
        }
        builder.finish()
    }

    /// Build from six raw coin sums in casting order
    pub fn from_values(values: &[u8]) -> Result<Self, HexagramError> {
        let lines = values
            .iter()
            .map(|&value| Yao::from_value(value))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_lines(lines)
    }

    /// Lines bottom to top
    pub fn lines(&self) -> &[Yao; LINES_PER_HEXAGRAM] {
        &self.lines
    }

    /// yang → '1', yin → '0', in casting order
    pub fn to_binary_sequence(&self) -> String {
        self.lines.iter().map(|yao| yao.yao_type().bit()).collect()
    }

    /// 1-based positions of changing lines, ascending
    pub fn changing_line_positions(&self) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, yao)| yao.is_changing())
            .map(|(index, _)| index + 1)
            .collect()
    }

    pub fn has_changing_lines(&self) -> bool {
        self.lines.iter().any(Yao::is_changing)
    }

    /// The hexagram after every changing line turns into its opposite.
    ///
    /// `None` when no line is changing: there is no derived hexagram then,
    /// not an identical copy.
    pub fn derive_changed(&self) -> Option<Hexagram> {
        if !self.has_changing_lines() {
            return None;
        }
        let mut lines = self.lines;
        for yao in lines.iter_mut() {
            *yao = yao.changed();
        }
        Some(Hexagram { lines })
    }
}

impl fmt::Display for Hexagram {
    /// Top line first, the way a hexagram is drawn
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, yao) in self.lines.iter().enumerate().rev() {
            write!(f, "{} {}", index + 1, yao)?;
            if index > 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Hexagram under construction, one line per cast
#[derive(Debug, Clone, Default)]
pub struct HexagramBuilder {
    lines: Vec<Yao>,
}

impl HexagramBuilder {
    pub fn new() -> Self {
        Self {
            lines: Vec::with_capacity(LINES_PER_HEXAGRAM),
        }
    }

    /// Append the next line above the previous ones
    pub fn push(&mut self, yao: Yao) -> Result<(), HexagramError> {
        if self.is_complete() {
            return Err(HexagramError::Full);
        }
        self.lines.push(yao);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.lines.len() == LINES_PER_HEXAGRAM
    }

    /// Lines cast so far
    pub fn lines(&self) -> &[Yao] {
        &self.lines
    }

    /// Freeze into a hexagram; fails until six lines are cast
    pub fn finish(self) -> Result<Hexagram, HexagramError> {
        let count = self.lines.len();
        let lines: [Yao; LINES_PER_HEXAGRAM] = self
            .lines
            .try_into()
            .map_err(|_| HexagramError::Incomplete(count))?;
        Ok(Hexagram::new(lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChangeState;

    #[test]
    fn test_binary_sequence_in_casting_order() {
        let hexagram = Hexagram::from_values(&[7, 8, 8, 8, 8, 8]).unwrap();
        assert_eq!(hexagram.to_binary_sequence(), "100000");
    }

    #[test]
    fn test_no_changing_lines_means_no_derived() {
        let hexagram = Hexagram::from_values(&[7, 8, 7, 8, 7, 8]).unwrap();
        assert!(hexagram.changing_line_positions().is_empty());
        assert!(hexagram.derive_changed().is_none());
    }

    #[test]
    fn test_derive_flips_changing_positions() {
        let hexagram = Hexagram::from_values(&[6, 7, 9, 8, 8, 9]).unwrap();
        assert_eq!(hexagram.changing_line_positions(), vec![1, 3, 6]);

        let derived = hexagram.derive_changed().unwrap();
        assert_eq!(hexagram.to_binary_sequence(), "011001");
        assert_eq!(derived.to_binary_sequence(), "110000");
        assert!(derived
            .lines()
            .iter()
            .all(|yao| yao.change_state() == ChangeState::Stable));
    }

    #[test]
    fn test_builder_rejects_seventh_line() {
        let mut builder = HexagramBuilder::new();
        for _ in 0..6 {
            builder.push(Yao::YOUNG_YANG).unwrap();
        }
        assert_eq!(builder.push(Yao::YOUNG_YANG), Err(HexagramError::Full));
    }

    #[test]
    fn test_incomplete_builder_cannot_finish() {
        let mut builder = HexagramBuilder::new();
        builder.push(Yao::OLD_YIN).unwrap();
        builder.push(Yao::OLD_YIN).unwrap();
        assert_eq!(builder.finish(), Err(HexagramError::Incomplete(2)));
    }

    #[test]
    fn test_display_draws_top_line_first() {
        let hexagram = Hexagram::from_values(&[9, 8, 8, 8, 8, 8]).unwrap();
        let drawn = hexagram.to_string();
        let rows: Vec<&str> = drawn.lines().collect();
        assert_eq!(rows.len(), 6);
        assert!(rows[0].starts_with("6 "));
        assert!(rows[5].starts_with("1 ") && rows[5].ends_with('九'));
    }
}
