pub mod annotate;
pub mod briefing;
pub mod chart;
pub mod format;
pub mod normalize;
pub mod quote;
