//! Core types for the divination service

mod yao;
mod hexagram;
mod event;
mod reading;
mod stats;

pub use yao::{Yao, YaoType, ChangeState};
pub use hexagram::{Hexagram, HexagramBuilder};
pub use event::StreamEvent;
pub use reading::{
    ReadingKind, Orientation, TarotCard, TarotReadingRequest,
    HexagramFigure, DerivedFigure, HexagramPayload, IChingReadingRequest,
};
pub use stats::{Period, TimeStats, StatsSnapshot, PageViewRequest, PageViewResponse};
