//! Error handling for the conversion and transfer engine.
//!
//! Per-concern `thiserror` enums with a single umbrella type at the top.
//! The taxonomy separates values outside a system's native domain
//! (`InvalidRange`, rejected at ingress, never coerced), missing
//! configuration or data (`NoTable`, `NotFound`, invalid equivalences)
//! and concurrency contention (`TransferInProgress`, retryable after
//! backoff).

use thiserror::Error;
use uuid::Uuid;

use crate::models::GradeSystem;

/// Umbrella error for the whole engine.
#[derive(Error, Debug)]
pub enum ConvalidaError {
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("rule table error: {0}")]
    Table(#[from] TableError),

    #[error("equivalence error: {0}")]
    Equivalence(#[from] EquivalenceError),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised while normalizing, looking up or denormalizing a grade.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// A native value's numeric fields fall outside the system's declared
    /// domain. Rejected at the boundary, never clamped.
    #[error("value out of range for {system}: {detail}")]
    InvalidRange {
        system: GradeSystem,
        detail: String,
    },

    /// No conversion table published for the requested directed pair.
    #[error("no conversion table for {origin} -> {destination}")]
    NoTable {
        origin: GradeSystem,
        destination: GradeSystem,
    },

    /// No table published under the pinned version for the pair.
    #[error("no conversion table for {origin} -> {destination} at version {version}")]
    NoTableVersion {
        origin: GradeSystem,
        destination: GradeSystem,
        version: u32,
    },

    /// Normalized value outside [0,100]. Unreachable through `normalize`,
    /// checked again at band lookup.
    #[error("normalized value outside [0,100]: {value}")]
    OutOfRange { value: f64 },

    /// The supplied native value belongs to a different system than the
    /// declared origin.
    #[error("value has system {actual} but origin {declared} was declared")]
    SystemMismatch {
        declared: GradeSystem,
        actual: GradeSystem,
    },
}

/// Load-time validation failures for a conversion rule table. A table
/// failing any of these is rejected at publication, never served.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("table {origin} -> {destination} has no entries")]
    Empty {
        origin: GradeSystem,
        destination: GradeSystem,
    },

    #[error("table {origin} -> {destination}: bands not in descending order at index {index}")]
    NotDescending {
        origin: GradeSystem,
        destination: GradeSystem,
        index: usize,
    },

    #[error("table {origin} -> {destination}: gap between {upper} and {lower}")]
    Gap {
        origin: GradeSystem,
        destination: GradeSystem,
        upper: f64,
        lower: f64,
    },

    #[error("table {origin} -> {destination}: overlap between {upper} and {lower}")]
    Overlap {
        origin: GradeSystem,
        destination: GradeSystem,
        upper: f64,
        lower: f64,
    },

    #[error("table {origin} -> {destination} does not cover [0,100]: spans [{min},{max}]")]
    NotCovering {
        origin: GradeSystem,
        destination: GradeSystem,
        min: f64,
        max: f64,
    },

    /// Published tables are immutable; a version can only be published once.
    #[error("table {origin} -> {destination} version {version} already published")]
    VersionExists {
        origin: GradeSystem,
        destination: GradeSystem,
        version: u32,
    },
}

/// Errors raised while declaring or resolving subject equivalences.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EquivalenceError {
    #[error("subject not found: {0}")]
    SubjectNotFound(Uuid),

    #[error("equivalence not found: {0}")]
    NotFound(Uuid),

    #[error("self-equivalence rejected for subject {0}")]
    SelfEquivalence(Uuid),

    #[error("percentage outside [0,100]: {0}")]
    InvalidPercentage(f64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by the transfer simulator/executor.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Another execute call for the same (student, destination) pair is
    /// in flight. Callers may retry after backoff.
    #[error("transfer already in progress for student {student_id} -> institution {institution_id}")]
    InProgress {
        student_id: Uuid,
        institution_id: Uuid,
    },

    #[error("institution not found: {0}")]
    InstitutionNotFound(Uuid),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Equivalence(#[from] EquivalenceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid lifecycle transition for a transfer request.
    #[error("invalid transfer state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

/// Failures surfaced by the external grade/institution/equivalence stores.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("store backend failure: {0}")]
    Backend(String),
}
