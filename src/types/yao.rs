//! A single cast line (爻)

use serde::Serialize;
use std::fmt;

use crate::error::HexagramError;

/// Polarity of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum YaoType {
    /// Broken line, even value
    Yin,
    /// Solid line, odd value
    Yang,
}

impl YaoType {
    /// Opposite polarity
    pub fn flipped(self) -> Self {
        match self {
            YaoType::Yin => YaoType::Yang,
            YaoType::Yang => YaoType::Yin,
        }
    }

    /// Binary digit used in hexagram sequences
    pub fn bit(self) -> char {
        match self {
            YaoType::Yin => '0',
            YaoType::Yang => '1',
        }
    }
}

/// Whether a line turns into its opposite in the derived hexagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeState {
    Stable,
    Changing,
}

/// One line, holding only its three-coin sum.
///
/// `yao_type` and `change_state` are computed from the value, so they can
/// never disagree with it:
///
/// | value | line        | type | state    |
/// |-------|-------------|------|----------|
/// | 6     | old yin 老阴 | yin  | changing |
/// | 7     | young yang  | yang | stable   |
/// | 8     | young yin   | yin  | stable   |
/// | 9     | old yang 老阳| yang | changing |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "YaoRecord")]
pub struct Yao {
    value: u8,
}

impl Yao {
    /// Old yin, changing
    pub const OLD_YIN: Yao = Yao { value: 6 };
    /// Young yang, stable
    pub const YOUNG_YANG: Yao = Yao { value: 7 };
    /// Young yin, stable
    pub const YOUNG_YIN: Yao = Yao { value: 8 };
    /// Old yang, changing
    pub const OLD_YANG: Yao = Yao { value: 9 };

    /// Build a line from a three-coin sum
    pub fn from_value(value: u8) -> Result<Self, HexagramError> {
        match value {
            6..=9 => Ok(Self { value }),
            other => Err(HexagramError::InvalidLineValue(other)),
        }
    }

    /// Stable line of the given polarity
    pub fn stable(yao_type: YaoType) -> Self {
        match yao_type {
            YaoType::Yin => Self::YOUNG_YIN,
            YaoType::Yang => Self::YOUNG_YANG,
        }
    }

    /// Raw coin sum
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Yin when even, yang when odd
    pub fn yao_type(&self) -> YaoType {
        if self.value % 2 == 0 {
            YaoType::Yin
        } else {
            YaoType::Yang
        }
    }

    /// Changing for 6 and 9
    pub fn change_state(&self) -> ChangeState {
        if self.value == 6 || self.value == 9 {
            ChangeState::Changing
        } else {
            ChangeState::Stable
        }
    }

    pub fn is_changing(&self) -> bool {
        self.change_state() == ChangeState::Changing
    }

    /// The line as it appears in the derived hexagram
    pub fn changed(&self) -> Self {
        if self.is_changing() {
            Self::stable(self.yao_type().flipped())
        } else {
            *self
        }
    }
}

impl fmt::Display for Yao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = match self.yao_type() {
            YaoType::Yang => "━━━━━━━━━━━",
            YaoType::Yin => "━━━━   ━━━━",
        };
        match (self.yao_type(), self.change_state()) {
            (YaoType::Yang, ChangeState::Changing) => write!(f, "{:<11} 九", line),
            (YaoType::Yin, ChangeState::Changing) => write!(f, "{:<11} 六", line),
            _ => write!(f, "{}", line),
        }
    }
}

/// Serialized view of a line
#[derive(Serialize)]
struct YaoRecord {
    #[serde(rename = "type")]
    yao_type: YaoType,
    change: ChangeState,
    value: u8,
}

impl From<Yao> for YaoRecord {
    fn from(yao: Yao) -> Self {
        Self {
            yao_type: yao.yao_type(),
            change: yao.change_state(),
            value: yao.value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_table() {
        let cases = [
            (6, YaoType::Yin, ChangeState::Changing),
            (7, YaoType::Yang, ChangeState::Stable),
            (8, YaoType::Yin, ChangeState::Stable),
            (9, YaoType::Yang, ChangeState::Changing),
        ];
        for (value, yao_type, state) in cases {
            let yao = Yao::from_value(value).unwrap();
            assert_eq!(yao.yao_type(), yao_type, "type of {}", value);
            assert_eq!(yao.change_state(), state, "state of {}", value);
        }
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert_eq!(Yao::from_value(5), Err(HexagramError::InvalidLineValue(5)));
        assert_eq!(Yao::from_value(10), Err(HexagramError::InvalidLineValue(10)));
    }

    #[test]
    fn test_changed_flips_only_changing_lines() {
        assert_eq!(Yao::OLD_YIN.changed(), Yao::YOUNG_YANG);
        assert_eq!(Yao::OLD_YANG.changed(), Yao::YOUNG_YIN);
        assert_eq!(Yao::YOUNG_YIN.changed(), Yao::YOUNG_YIN);
        assert_eq!(Yao::YOUNG_YANG.changed(), Yao::YOUNG_YANG);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Yao::OLD_YANG).unwrap();
        assert_eq!(json["type"], "yang");
        assert_eq!(json["change"], "changing");
        assert_eq!(json["value"], 9);
    }

    #[test]
    fn test_display_marks_changing_lines() {
        assert!(Yao::OLD_YANG.to_string().ends_with('九'));
        assert!(Yao::OLD_YIN.to_string().ends_with('六'));
        assert!(!Yao::YOUNG_YANG.to_string().contains('九'));
    }
}
