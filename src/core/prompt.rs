//! Prompts sent upstream for each reading kind

use crate::types::{IChingReadingRequest, ReadingKind, TarotReadingRequest};

/// Persona for tarot readings
pub const TAROT_SYSTEM_PROMPT: &str = "你是一位专业的塔罗牌解读师，擅长通过塔罗牌为人解惑。\
你会先仔细思考每张牌的含义和它们之间的关联，然后再给出完整的解读。";

/// Persona for I Ching readings
pub const ICHING_SYSTEM_PROMPT: &str = "你是一位德高望重的周易专家，擅长通过卦象为人解惑。\
你会先仔细思考卦象的含义和变化，然后再给出完整的解读。";

/// System instruction plus the user prompt for one reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: ReadingKind,
    pub system: &'static str,
    pub user: String,
}

impl Prompt {
    pub fn for_tarot(request: &TarotReadingRequest) -> Self {
        let user = format!(
            "作为一位专业的塔罗牌解读师，请为以下问题进行解读：\n\
             问题：{}\n\
             抽到的牌：{}\n\
             请详细分析每张牌的含义以及它们之间的关系，最后给出完整的解读。\n\
             注意：请先详细思考每张牌的含义和关联，再给出最终解读。",
            request.question.trim(),
            request.cards.join("、"),
        );
        Self { kind: ReadingKind::Tarot, system: TAROT_SYSTEM_PROMPT, user }
    }

    /// Expects a validated request; a missing original name renders empty
    pub fn for_iching(request: &IChingReadingRequest) -> Self {
        let original = request.original_name().unwrap_or_default();
        let changes = match request.hexagram.as_ref().and_then(|h| h.derived.as_ref()) {
            Some(derived) => {
                let positions: Vec<String> =
                    derived.changing_yaos.iter().map(ToString::to_string).collect();
                format!("变爻：第{}爻\n变卦：{}", positions.join("、"), derived.name)
            }
            None => "无变爻".to_string(),
        };
        let user = format!(
            "作为一位精通周易的专家，请为以下问题进行解卦：\n\
             问题：{}\n\n\
             本卦：{}\n\
             {}\n\n\
             请先详细思考卦象与问题的关联，再给出完整解读。",
            request.question.trim(),
            original,
            changes,
        );
        Self { kind: ReadingKind::IChing, system: ICHING_SYSTEM_PROMPT, user }
    }
}
