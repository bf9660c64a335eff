//! Reading requests and their context

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ApiError;
use crate::{ICHING_CALLS_KEY, TAROT_CALLS_KEY};

/// Which kind of reading a request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingKind {
    Tarot,
    IChing,
}

impl ReadingKind {
    /// Usage counter bumped for each reading of this kind
    pub fn counter_key(&self) -> &'static str {
        match self {
            ReadingKind::Tarot => TAROT_CALLS_KEY,
            ReadingKind::IChing => ICHING_CALLS_KEY,
        }
    }
}

impl fmt::Display for ReadingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingKind::Tarot => write!(f, "tarot"),
            ReadingKind::IChing => write!(f, "iching"),
        }
    }
}

// =============================================================================
// TAROT
// =============================================================================

/// Card orientation as drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Upright,
    Reversed,
}

impl Orientation {
    pub fn label(&self) -> &'static str {
        match self {
            Orientation::Upright => "正位",
            Orientation::Reversed => "逆位",
        }
    }
}

/// A drawn tarot card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TarotCard {
    pub name: String,
    pub orientation: Orientation,
}

impl fmt::Display for TarotCard {
    /// `<name>(正位)` or `<name>(逆位)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.orientation.label())
    }
}

/// `POST /api/tarot/reading`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TarotReadingRequest {
    #[serde(default)]
    pub question: String,
    /// Cards already formatted as `<name>(正位|逆位)`
    #[serde(default)]
    pub cards: Vec<String>,
}

impl TarotReadingRequest {
    pub fn new(question: impl Into<String>, cards: &[TarotCard]) -> Self {
        Self {
            question: question.into(),
            cards: cards.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.question.trim().is_empty() {
            return Err(ApiError::Validation("question is required".into()));
        }
        if self.cards.is_empty() {
            return Err(ApiError::Validation("at least one card is required".into()));
        }
        Ok(())
    }
}

// =============================================================================
// I CHING
// =============================================================================

/// A named hexagram on the wire
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexagramFigure {
    #[serde(default)]
    pub sequence: String,
    #[serde(default)]
    pub name: String,
}

/// The derived hexagram on the wire, with the lines that changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedFigure {
    #[serde(default)]
    pub sequence: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "changingYaos", default)]
    pub changing_yaos: Vec<usize>,
}

/// Original hexagram plus the derived one when any line changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexagramPayload {
    #[serde(default)]
    pub original: Option<HexagramFigure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived: Option<DerivedFigure>,
}

/// `POST /api/iching/divination`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IChingReadingRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub hexagram: Option<HexagramPayload>,
}

impl IChingReadingRequest {
    pub fn new(question: impl Into<String>, hexagram: HexagramPayload) -> Self {
        Self {
            question: question.into(),
            hexagram: Some(hexagram),
        }
    }

    /// Name of the original hexagram, if the request carries one
    pub fn original_name(&self) -> Option<&str> {
        self.hexagram
            .as_ref()
            .and_then(|h| h.original.as_ref())
            .map(|o| o.name.as_str())
            .filter(|name| !name.trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.question.trim().is_empty() {
            return Err(ApiError::Validation("question is required".into()));
        }
        if self.original_name().is_none() {
            return Err(ApiError::Validation("hexagram.original.name is required".into()));
        }
        Ok(())
    }
}
