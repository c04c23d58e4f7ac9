//! Grade conversion: system value model, rule tables and the engine.

pub mod engine;
pub mod scale;
pub mod table;

pub use engine::{ConversionEngine, ConversionOutcome};
pub use table::{
    classification_bands, classify, default_rule, ConversionRule, RuleEntry, RuleTableRegistry,
    SystemBand,
};
