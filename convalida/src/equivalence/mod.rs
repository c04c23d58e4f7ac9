//! Subject equivalence declaration and resolution.
//!
//! Equivalences are declared explicitly by an operator, never inferred
//! from text, and never hard-deleted: deactivation leaves the record in
//! place. Resolution is exact-match over the declared records with a
//! deterministic best-match rule when several exist for one origin
//! subject: a `total` equivalence wins, else the highest-percentage
//! `partial`, ties broken by the most recently created record.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{EquivalenceError, StoreError};
use crate::models::{Equivalence, EquivalenceKind, GradeSystem, Subject};

// ---------------------------------------------------------------------------
// Store boundaries
// ---------------------------------------------------------------------------

/// Subject lookup boundary (external curriculum data).
#[async_trait]
pub trait SubjectStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Subject>, StoreError>;
}

/// Equivalence record store, owned by this module. Single-writer append;
/// readers tolerate eventual visibility of new records.
#[async_trait]
pub trait EquivalenceStore: Send + Sync {
    async fn insert(&self, equivalence: Equivalence) -> Result<(), StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<Equivalence>, StoreError>;
    async fn list_by_origin(&self, subject_origin: Uuid) -> Result<Vec<Equivalence>, StoreError>;
    /// Returns false when no record carries the id.
    async fn set_active(&self, id: Uuid, active: bool) -> Result<bool, StoreError>;
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Request to declare a new equivalence.
#[derive(Debug, Clone)]
pub struct NewEquivalence {
    pub subject_origin: Uuid,
    pub subject_destination: Uuid,
    pub kind: EquivalenceKind,
    pub percentage: f64,
}

pub struct EquivalenceService {
    store: Arc<dyn EquivalenceStore>,
    subjects: Arc<dyn SubjectStore>,
}

impl EquivalenceService {
    pub fn new(store: Arc<dyn EquivalenceStore>, subjects: Arc<dyn SubjectStore>) -> Self {
        EquivalenceService { store, subjects }
    }

    /// Declare an equivalence after validating both subjects exist, the
    /// pair is not a self-equivalence and the percentage is in [0,100].
    pub async fn declare(
        &self,
        request: NewEquivalence,
    ) -> Result<Equivalence, EquivalenceError> {
        if !(0.0..=100.0).contains(&request.percentage) || request.percentage.is_nan() {
            return Err(EquivalenceError::InvalidPercentage(request.percentage));
        }
        let origin = self
            .subject(request.subject_origin)
            .await?
            .ok_or(EquivalenceError::SubjectNotFound(request.subject_origin))?;
        let destination = self
            .subject(request.subject_destination)
            .await?
            .ok_or(EquivalenceError::SubjectNotFound(request.subject_destination))?;

        if origin.id == destination.id
            || (origin.institution_id == destination.institution_id
                && origin.system == destination.system
                && origin.name == destination.name)
        {
            return Err(EquivalenceError::SelfEquivalence(origin.id));
        }

        let equivalence = Equivalence {
            id: Uuid::new_v4(),
            subject_origin: origin.id,
            subject_destination: destination.id,
            kind: request.kind,
            percentage: request.percentage,
            active: true,
            created_at: Utc::now(),
        };
        self.store.insert(equivalence.clone()).await?;
        info!(
            origin = %origin.id,
            destination = %destination.id,
            kind = ?equivalence.kind,
            "equivalence declared"
        );
        Ok(equivalence)
    }

    /// Resolve the best active equivalence for an origin subject toward a
    /// destination system. Returns `None` when no active record points at
    /// a subject of that system; deterministic for a fixed record set.
    pub async fn resolve(
        &self,
        subject_origin: Uuid,
        system_destination: GradeSystem,
    ) -> Result<Option<Equivalence>, EquivalenceError> {
        let records = self.store.list_by_origin(subject_origin).await?;

        let mut candidates = Vec::new();
        for record in records.into_iter().filter(|r| r.active) {
            if let Some(destination) = self.subject(record.subject_destination).await? {
                if destination.system == system_destination {
                    candidates.push(record);
                }
            }
        }

        // total > highest percentage > most recently created.
        candidates.sort_by(|a, b| {
            let a_total = a.kind == EquivalenceKind::Total;
            let b_total = b.kind == EquivalenceKind::Total;
            b_total
                .cmp(&a_total)
                .then(
                    b.percentage
                        .partial_cmp(&a.percentage)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(candidates.into_iter().next())
    }

    pub async fn list_by_origin(
        &self,
        subject_origin: Uuid,
    ) -> Result<Vec<Equivalence>, EquivalenceError> {
        Ok(self.store.list_by_origin(subject_origin).await?)
    }

    /// Soft-deactivate an equivalence. The record stays in the store.
    pub async fn deactivate(&self, id: Uuid) -> Result<(), EquivalenceError> {
        let found = self.store.set_active(id, false).await?;
        if !found {
            return Err(EquivalenceError::NotFound(id));
        }
        info!(equivalence = %id, "equivalence deactivated");
        Ok(())
    }

    async fn subject(&self, id: Uuid) -> Result<Option<Subject>, EquivalenceError> {
        Ok(self.subjects.get(id).await?)
    }
}
