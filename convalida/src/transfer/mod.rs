//! Transfer simulator and executor.
//!
//! `simulate` is a pure function of the current grade set and never
//! mutates anything; it is recomputed from scratch on every call because
//! source grades can change between simulation and execution. `execute`
//! re-runs the simulation internally (a client-supplied simulation is
//! never trusted), writes destination grades only for subjects with a
//! resolved equivalence, and records the outcome in an append-only
//! history.
//!
//! Execution is the only operation in the engine requiring mutual
//! exclusion: an in-flight guard keyed by
//! `(student, destination institution)` makes concurrent execute calls
//! for the same pair fail fast with `TransferError::InProgress` instead of
//! queuing, so duplicate grade records cannot be created. The guard is
//! released on every exit path.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::conversion::ConversionEngine;
use crate::equivalence::{EquivalenceService, SubjectStore};
use crate::error::{StoreError, TransferError};
use crate::models::{
    GradeRecord, Institution, NewGrade, SimulatedConversion, TransferRecord, TransferSimulation,
    TransferState, TransferStatus,
};

// ---------------------------------------------------------------------------
// Store boundaries (external collaborators)
// ---------------------------------------------------------------------------

/// Student grade store. The engine reads the full grade set and writes
/// new records only through `create_grade` during an executed transfer.
#[async_trait]
pub trait GradeStore: Send + Sync {
    /// Ordered sequence of the student's current grades.
    async fn grades_for_student(&self, student_id: Uuid) -> Result<Vec<GradeRecord>, StoreError>;

    async fn create_grade(&self, grade: NewGrade) -> Result<Uuid, StoreError>;
}

/// Institution lookup boundary.
#[async_trait]
pub trait InstitutionStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Institution>, StoreError>;
}

/// Append-only transfer history.
#[async_trait]
pub trait TransferHistory: Send + Sync {
    async fn append(&self, record: TransferRecord) -> Result<(), StoreError>;
    async fn for_student(&self, student_id: Uuid) -> Result<Vec<TransferRecord>, StoreError>;
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Result of an executed transfer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutcome {
    #[serde(rename = "calificacionesCreadas")]
    pub grades_created: usize,
    pub status: TransferStatus,
    pub record: TransferRecord,
}

pub struct TransferService {
    engine: Arc<ConversionEngine>,
    equivalences: Arc<EquivalenceService>,
    grades: Arc<dyn GradeStore>,
    institutions: Arc<dyn InstitutionStore>,
    subjects: Arc<dyn SubjectStore>,
    history: Arc<dyn TransferHistory>,
    in_flight: Arc<Mutex<HashSet<(Uuid, Uuid)>>>,
}

impl TransferService {
    pub fn new(
        engine: Arc<ConversionEngine>,
        equivalences: Arc<EquivalenceService>,
        grades: Arc<dyn GradeStore>,
        institutions: Arc<dyn InstitutionStore>,
        subjects: Arc<dyn SubjectStore>,
        history: Arc<dyn TransferHistory>,
    ) -> Self {
        TransferService {
            engine,
            equivalences,
            grades,
            institutions,
            subjects,
            history,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Preview the transfer of a student's full grade set to a
    /// destination institution. No side effects; every call recomputes
    /// from the stores.
    pub async fn simulate(
        &self,
        student_id: Uuid,
        institution_destination_id: Uuid,
    ) -> Result<TransferSimulation, TransferError> {
        let institution = self
            .institutions
            .get(institution_destination_id)
            .await?
            .ok_or(TransferError::InstitutionNotFound(institution_destination_id))?;
        let system_destination = institution.system;
        let grades = self.grades.grades_for_student(student_id).await?;
        let system_origin = grades.first().map(|g| g.system);

        let mut conversions = Vec::with_capacity(grades.len());
        for grade in &grades {
            let subject_name = match self.subjects.get(grade.subject_id).await? {
                Some(subject) => subject.name,
                None => grade.subject_id.to_string(),
            };
            let equivalent = self
                .equivalences
                .resolve(grade.subject_id, system_destination)
                .await?;

            // A failed conversion is reported on the row, never dropped;
            // the rest of the record still converts.
            let (normalized, destination, error) =
                match self.engine.convert(grade.system, system_destination, &grade.value) {
                    Ok(outcome) => (
                        Some(outcome.normalized),
                        Some(outcome.native_destination),
                        None,
                    ),
                    Err(e) => (None, None, Some(e.to_string())),
                };

            conversions.push(SimulatedConversion {
                subject_origin: grade.subject_id,
                subject_origin_name: subject_name,
                period: grade.period.clone(),
                native_value_origin: grade.value.clone(),
                normalized_value: normalized,
                native_value_destination: destination,
                subject_equivalent: equivalent,
                error,
            });
        }

        let with_equivalence = conversions
            .iter()
            .filter(|c| c.subject_equivalent.is_some())
            .count();
        Ok(TransferSimulation {
            student_id,
            institution_destination_id,
            system_origin,
            system_destination,
            total_subjects: conversions.len(),
            subjects_with_equivalence: with_equivalence,
            subjects_without_equivalence: conversions.len() - with_equivalence,
            conversions,
        })
    }

    /// Execute the transfer: re-simulate, then persist one destination
    /// grade per subject with a resolved equivalence. Subjects without
    /// equivalence are skipped and counted, never fabricated. Partial
    /// write failures degrade the status to `partial`; nothing is rolled
    /// back.
    pub async fn execute(
        &self,
        student_id: Uuid,
        institution_destination_id: Uuid,
    ) -> Result<TransferOutcome, TransferError> {
        let key = (student_id, institution_destination_id);
        let _guard = InFlightGuard::acquire(&self.in_flight, key)?;

        // The request walks the lifecycle here: a fresh draft, simulated
        // in-process, executed only from the simulated state.
        let lifecycle = TransferState::Draft;
        let simulation = self.simulate(student_id, institution_destination_id).await?;
        let lifecycle = lifecycle.transition_to(TransferState::Simulated)?;
        let mut created = 0usize;
        let mut failed = 0usize;
        for row in &simulation.conversions {
            let Some(equivalent) = &row.subject_equivalent else {
                continue;
            };
            let Some(value) = &row.native_value_destination else {
                // Equivalence declared but the grade itself could not be
                // converted (e.g. no table); counts as a failed write.
                warn!(
                    subject = %row.subject_origin,
                    error = row.error.as_deref().unwrap_or("unknown"),
                    "subject skipped: conversion failed"
                );
                failed += 1;
                continue;
            };
            let new_grade = NewGrade {
                student_id,
                institution_id: institution_destination_id,
                subject_id: equivalent.subject_destination,
                system: simulation.system_destination,
                value: value.clone(),
                period: row.period.clone(),
            };
            match self.grades.create_grade(new_grade).await {
                Ok(_) => created += 1,
                Err(e) => {
                    warn!(
                        subject = %row.subject_origin,
                        error = %e,
                        "grade write failed during transfer"
                    );
                    failed += 1;
                }
            }
        }

        let status = if failed == 0 {
            TransferStatus::Completed
        } else if created > 0 {
            TransferStatus::Partial
        } else {
            TransferStatus::Failed
        };
        let record = TransferRecord {
            id: Uuid::new_v4(),
            student_id,
            institution_destination_id,
            system_origin: simulation
                .system_origin
                .unwrap_or(simulation.system_destination),
            system_destination: simulation.system_destination,
            timestamp: Utc::now(),
            subjects_transferred: created,
            status,
        };
        self.history.append(record.clone()).await?;
        let lifecycle = lifecycle.transition_to(TransferState::Executed)?;
        info!(
            student = %student_id,
            institution = %institution_destination_id,
            created,
            failed,
            ?status,
            ?lifecycle,
            "transfer executed"
        );
        Ok(TransferOutcome {
            grades_created: created,
            status,
            record,
        })
    }

    pub async fn history_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<TransferRecord>, TransferError> {
        Ok(self.history.for_student(student_id).await?)
    }
}

// ---------------------------------------------------------------------------
// In-flight guard
// ---------------------------------------------------------------------------

/// Scoped membership in the in-flight set. Dropping the guard releases
/// the key on every exit path, including panics unwinding through
/// `execute`.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<(Uuid, Uuid)>>>,
    key: (Uuid, Uuid),
}

impl InFlightGuard {
    fn acquire(
        set: &Arc<Mutex<HashSet<(Uuid, Uuid)>>>,
        key: (Uuid, Uuid),
    ) -> Result<InFlightGuard, TransferError> {
        let mut in_flight = set.lock().expect("in-flight set poisoned");
        if !in_flight.insert(key) {
            return Err(TransferError::InProgress {
                student_id: key.0,
                institution_id: key.1,
            });
        }
        Ok(InFlightGuard {
            set: Arc::clone(set),
            key,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.set.lock() {
            in_flight.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_guard_blocks_duplicate_keys_until_dropped() {
        let set = Arc::new(Mutex::new(HashSet::new()));
        let key = (Uuid::new_v4(), Uuid::new_v4());

        let guard = InFlightGuard::acquire(&set, key).expect("first acquire");
        assert!(matches!(
            InFlightGuard::acquire(&set, key),
            Err(TransferError::InProgress { .. })
        ));
        // A different pair is unaffected.
        let other = (Uuid::new_v4(), key.1);
        InFlightGuard::acquire(&set, other).expect("distinct key acquires");

        drop(guard);
        InFlightGuard::acquire(&set, key).expect("reacquire after drop");
    }
}
