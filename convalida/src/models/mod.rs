//! Domain models for the conversion and transfer engine.

pub mod grading;
pub mod transfer;

pub use grading::{
    ArGrade, DeGrade, GradeSystem, ModuleGrade, NativeValue, NormalizedValue, Tendencia, UkGrade,
    UsGrade,
};
pub use transfer::{
    Equivalence, EquivalenceKind, GradeRecord, Institution, NewGrade, SimulatedConversion, Subject,
    TransferRecord, TransferSimulation, TransferState, TransferStatus,
};
