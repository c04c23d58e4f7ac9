//! Shared test harness: in-memory stores wired into the full service
//! stack, with a seeded AR student and a US destination institution.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use convalida::conversion::ConversionEngine;
use convalida::equivalence::{EquivalenceService, NewEquivalence};
use convalida::models::{
    ArGrade, EquivalenceKind, GradeRecord, GradeSystem, Institution, NativeValue, Subject,
};
use convalida::stores::{
    InMemoryEquivalenceStore, InMemoryGradeStore, InMemoryInstitutionStore, InMemorySubjectStore,
    InMemoryTransferHistory,
};
use convalida::transfer::TransferService;

pub struct TestWorld {
    pub engine: Arc<ConversionEngine>,
    pub equivalences: Arc<EquivalenceService>,
    pub transfers: Arc<TransferService>,
    pub grades: Arc<InMemoryGradeStore>,
    pub institutions: Arc<InMemoryInstitutionStore>,
    pub subjects: Arc<InMemorySubjectStore>,
    pub history: Arc<InMemoryTransferHistory>,
    pub student_id: Uuid,
    pub ar_institution: Institution,
    pub us_institution: Institution,
    /// AR subjects carrying the student's grades, in seeding order.
    pub origin_subjects: Vec<Subject>,
    /// US counterpart subjects (one per origin subject).
    pub destination_subjects: Vec<Subject>,
}

impl TestWorld {
    /// Empty world: stores wired, no data.
    pub async fn new() -> TestWorld {
        let subjects = Arc::new(InMemorySubjectStore::new());
        let institutions = Arc::new(InMemoryInstitutionStore::new());
        let grades = Arc::new(InMemoryGradeStore::new());
        let history = Arc::new(InMemoryTransferHistory::new());
        let equivalence_store = Arc::new(InMemoryEquivalenceStore::new());

        let engine = Arc::new(ConversionEngine::with_defaults());
        let equivalences = Arc::new(EquivalenceService::new(equivalence_store, subjects.clone()));
        let transfers = Arc::new(TransferService::new(
            engine.clone(),
            equivalences.clone(),
            grades.clone(),
            institutions.clone(),
            subjects.clone(),
            history.clone(),
        ));

        let ar_institution = Institution {
            id: Uuid::new_v4(),
            name: "Universidad Origen".to_string(),
            system: GradeSystem::Ar,
        };
        let us_institution = Institution {
            id: Uuid::new_v4(),
            name: "Destination College".to_string(),
            system: GradeSystem::Us,
        };
        institutions.upsert(ar_institution.clone()).await;
        institutions.upsert(us_institution.clone()).await;

        TestWorld {
            engine,
            equivalences,
            transfers,
            grades,
            institutions,
            subjects,
            history,
            student_id: Uuid::new_v4(),
            ar_institution,
            us_institution,
            origin_subjects: Vec::new(),
            destination_subjects: Vec::new(),
        }
    }

    /// Seed `total` AR subjects with grades for the student, declaring a
    /// total equivalence toward a US subject for the first
    /// `with_equivalence` of them.
    pub async fn seed_student(&mut self, total: usize, with_equivalence: usize) {
        for index in 0..total {
            let origin = Subject {
                id: Uuid::new_v4(),
                institution_id: self.ar_institution.id,
                system: GradeSystem::Ar,
                name: format!("Materia {index}"),
            };
            let destination = Subject {
                id: Uuid::new_v4(),
                institution_id: self.us_institution.id,
                system: GradeSystem::Us,
                name: format!("Subject {index}"),
            };
            self.subjects.upsert(origin.clone()).await;
            self.subjects.upsert(destination.clone()).await;

            self.grades
                .seed(GradeRecord {
                    id: Uuid::new_v4(),
                    student_id: self.student_id,
                    institution_id: self.ar_institution.id,
                    subject_id: origin.id,
                    system: GradeSystem::Ar,
                    value: NativeValue::Ar(ArGrade {
                        nota: 6.0 + index as f64 % 4.0,
                        instancia: None,
                    }),
                    period: "2024-1C".to_string(),
                    created_at: Utc::now(),
                })
                .await;

            if index < with_equivalence {
                self.equivalences
                    .declare(NewEquivalence {
                        subject_origin: origin.id,
                        subject_destination: destination.id,
                        kind: EquivalenceKind::Total,
                        percentage: 100.0,
                    })
                    .await
                    .expect("declare equivalence");
            }

            self.origin_subjects.push(origin);
            self.destination_subjects.push(destination);
        }
    }
}
