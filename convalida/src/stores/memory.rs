//! In-memory store implementations.
//!
//! The engine's collaborators (grade, institution, subject, equivalence
//! and history stores) are trait boundaries; these shared-map
//! implementations back the web server and the test suite. All of them
//! tolerate concurrent readers with a single writer at a time.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::equivalence::{EquivalenceStore, SubjectStore};
use crate::error::StoreError;
use crate::models::{Equivalence, GradeRecord, Institution, NewGrade, Subject, TransferRecord};
use crate::transfer::{GradeStore, InstitutionStore, TransferHistory};

// ---------------------------------------------------------------------------
// Subjects
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemorySubjectStore {
    subjects: RwLock<HashMap<Uuid, Subject>>,
}

impl InMemorySubjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, subject: Subject) {
        self.subjects.write().await.insert(subject.id, subject);
    }
}

#[async_trait]
impl SubjectStore for InMemorySubjectStore {
    async fn get(&self, id: Uuid) -> Result<Option<Subject>, StoreError> {
        Ok(self.subjects.read().await.get(&id).cloned())
    }
}

// ---------------------------------------------------------------------------
// Institutions
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryInstitutionStore {
    institutions: RwLock<HashMap<Uuid, Institution>>,
}

impl InMemoryInstitutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, institution: Institution) {
        self.institutions
            .write()
            .await
            .insert(institution.id, institution);
    }
}

#[async_trait]
impl InstitutionStore for InMemoryInstitutionStore {
    async fn get(&self, id: Uuid) -> Result<Option<Institution>, StoreError> {
        Ok(self.institutions.read().await.get(&id).cloned())
    }
}

// ---------------------------------------------------------------------------
// Equivalences
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryEquivalenceStore {
    records: RwLock<Vec<Equivalence>>,
}

impl InMemoryEquivalenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EquivalenceStore for InMemoryEquivalenceStore {
    async fn insert(&self, equivalence: Equivalence) -> Result<(), StoreError> {
        self.records.write().await.push(equivalence);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Equivalence>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn list_by_origin(&self, subject_origin: Uuid) -> Result<Vec<Equivalence>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|e| e.subject_origin == subject_origin)
            .cloned()
            .collect())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|e| e.id == id) {
            Some(record) => {
                record.active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Grades
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryGradeStore {
    grades: RwLock<Vec<GradeRecord>>,
}

impl InMemoryGradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a grade directly, bypassing the transfer path.
    pub async fn seed(&self, grade: GradeRecord) {
        self.grades.write().await.push(grade);
    }

    pub async fn all_for_institution(&self, institution_id: Uuid) -> Vec<GradeRecord> {
        self.grades
            .read()
            .await
            .iter()
            .filter(|g| g.institution_id == institution_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl GradeStore for InMemoryGradeStore {
    async fn grades_for_student(&self, student_id: Uuid) -> Result<Vec<GradeRecord>, StoreError> {
        Ok(self
            .grades
            .read()
            .await
            .iter()
            .filter(|g| g.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn create_grade(&self, grade: NewGrade) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        self.grades.write().await.push(GradeRecord {
            id,
            student_id: grade.student_id,
            institution_id: grade.institution_id,
            subject_id: grade.subject_id,
            system: grade.system,
            value: grade.value,
            period: grade.period,
            created_at: Utc::now(),
        });
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Transfer history
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryTransferHistory {
    records: RwLock<Vec<TransferRecord>>,
}

impl InMemoryTransferHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<TransferRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl TransferHistory for InMemoryTransferHistory {
    async fn append(&self, record: TransferRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn for_student(&self, student_id: Uuid) -> Result<Vec<TransferRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect())
    }
}
