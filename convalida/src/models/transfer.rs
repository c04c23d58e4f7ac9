//! Models for subjects, institutions, grade records, equivalences and
//! the transfer lifecycle.
//!
//! `TransferSimulation` is ephemeral and recomputed on every call;
//! `TransferRecord` is the persisted, append-only result of an executed
//! transfer and is immutable once written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TransferError;
use crate::models::grading::{GradeSystem, NativeValue, NormalizedValue};

// ---------------------------------------------------------------------------
// Institutions, subjects, grade records
// ---------------------------------------------------------------------------

/// An institution and the grading system it operates under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Institution {
    pub id: Uuid,
    pub name: String,
    pub system: GradeSystem,
}

/// A subject within an institution's curriculum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub institution_id: Uuid,
    pub system: GradeSystem,
    pub name: String,
}

/// A stored grade: a subject, the system it was captured under and the
/// native value.
#[derive(Debug, Clone, Serialize)]
pub struct GradeRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub institution_id: Uuid,
    pub subject_id: Uuid,
    pub system: GradeSystem,
    pub value: NativeValue,
    pub period: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for the grade-creation call invoked on transfer execution.
#[derive(Debug, Clone)]
pub struct NewGrade {
    pub student_id: Uuid,
    pub institution_id: Uuid,
    pub subject_id: Uuid,
    pub system: GradeSystem,
    pub value: NativeValue,
    pub period: String,
}

// ---------------------------------------------------------------------------
// Equivalences
// ---------------------------------------------------------------------------

/// Kind of declared equivalence between two subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquivalenceKind {
    Total,
    Partial,
}

/// A declared correspondence between a subject in one curriculum and a
/// subject in another. Stored directionally (origin -> destination); the
/// reverse direction is a distinct, possibly absent, record. Never
/// inferred, never hard-deleted (soft-deactivation only).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equivalence {
    pub id: Uuid,
    pub subject_origin: Uuid,
    pub subject_destination: Uuid,
    #[serde(rename = "tipo")]
    pub kind: EquivalenceKind,
    #[serde(rename = "porcentaje")]
    pub percentage: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Transfer simulation (ephemeral) and record (persisted)
// ---------------------------------------------------------------------------

/// One subject's row in a transfer simulation: the conversion outcome
/// plus the resolved equivalence, if any. A missing equivalence is a
/// normal, counted outcome, not an error; a missing destination value
/// means conversion itself failed for this item (`error` says why).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedConversion {
    pub subject_origin: Uuid,
    pub subject_origin_name: String,
    pub period: String,
    pub native_value_origin: NativeValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_value: Option<NormalizedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_value_destination: Option<NativeValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_equivalent: Option<Equivalence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ephemeral preview of a full-record transfer. Recomputed from scratch
/// on every call; never cached, since source grades can change between
/// simulation and execution.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSimulation {
    pub student_id: Uuid,
    pub institution_destination_id: Uuid,
    /// System the student's grades were captured under. Absent when the
    /// student has no grades at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_origin: Option<GradeSystem>,
    pub system_destination: GradeSystem,
    pub total_subjects: usize,
    pub subjects_with_equivalence: usize,
    pub subjects_without_equivalence: usize,
    pub conversions: Vec<SimulatedConversion>,
}

/// Outcome status of an executed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Completed,
    Partial,
    Failed,
}

/// Persisted result of an executed transfer. Append-only history entry,
/// immutable once created.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub institution_destination_id: Uuid,
    pub system_origin: GradeSystem,
    pub system_destination: GradeSystem,
    pub timestamp: DateTime<Utc>,
    pub subjects_transferred: usize,
    pub status: TransferStatus,
}

// ---------------------------------------------------------------------------
// Transfer request lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle of a transfer request.
///
/// `Draft -> Simulated -> Executed` (terminal), `Simulated -> Draft`
/// (inputs changed, re-simulate) and `Draft/Simulated -> Abandoned`
/// (terminal, no side effects). Execution always re-simulates
/// internally, so `Simulated` is advisory, never trusted across the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferState {
    Draft,
    Simulated,
    Executed,
    Abandoned,
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Executed | TransferState::Abandoned)
    }

    fn can_transition(&self, to: TransferState) -> bool {
        use TransferState::*;
        matches!(
            (self, to),
            (Draft, Simulated)
                | (Simulated, Executed)
                | (Simulated, Draft)
                | (Draft, Abandoned)
                | (Simulated, Abandoned)
        )
    }

    /// Validate and perform a lifecycle transition.
    pub fn transition_to(self, to: TransferState) -> Result<TransferState, TransferError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(TransferError::InvalidTransition {
                from: format!("{self:?}"),
                to: format!("{to:?}"),
            })
        }
    }
}
