//! Equivalence declaration validation and deterministic resolution.

mod common;

use convalida::equivalence::NewEquivalence;
use convalida::error::EquivalenceError;
use convalida::models::{EquivalenceKind, GradeSystem, Subject};
use common::TestWorld;
use uuid::Uuid;

async fn subject(world: &TestWorld, institution: Uuid, system: GradeSystem, name: &str) -> Subject {
    let s = Subject {
        id: Uuid::new_v4(),
        institution_id: institution,
        system,
        name: name.to_string(),
    };
    world.subjects.upsert(s.clone()).await;
    s
}

#[tokio::test]
async fn total_equivalence_beats_higher_percentage_partial() {
    let world = TestWorld::new().await;
    let origin = subject(&world, world.ar_institution.id, GradeSystem::Ar, "Química").await;
    let partial_dest =
        subject(&world, world.us_institution.id, GradeSystem::Us, "Chemistry I").await;
    let total_dest =
        subject(&world, world.us_institution.id, GradeSystem::Us, "General Chemistry").await;

    world
        .equivalences
        .declare(NewEquivalence {
            subject_origin: origin.id,
            subject_destination: partial_dest.id,
            kind: EquivalenceKind::Partial,
            percentage: 95.0,
        })
        .await
        .expect("partial");
    let total = world
        .equivalences
        .declare(NewEquivalence {
            subject_origin: origin.id,
            subject_destination: total_dest.id,
            kind: EquivalenceKind::Total,
            percentage: 100.0,
        })
        .await
        .expect("total");

    let resolved = world
        .equivalences
        .resolve(origin.id, GradeSystem::Us)
        .await
        .expect("resolve")
        .expect("match found");
    assert_eq!(resolved.id, total.id);
}

#[tokio::test]
async fn partials_resolve_by_percentage_then_recency() {
    let world = TestWorld::new().await;
    let origin = subject(&world, world.ar_institution.id, GradeSystem::Ar, "Historia").await;
    let low = subject(&world, world.us_institution.id, GradeSystem::Us, "History A").await;
    let high = subject(&world, world.us_institution.id, GradeSystem::Us, "History B").await;
    let tied = subject(&world, world.us_institution.id, GradeSystem::Us, "History C").await;

    world
        .equivalences
        .declare(NewEquivalence {
            subject_origin: origin.id,
            subject_destination: low.id,
            kind: EquivalenceKind::Partial,
            percentage: 40.0,
        })
        .await
        .expect("low partial");
    world
        .equivalences
        .declare(NewEquivalence {
            subject_origin: origin.id,
            subject_destination: high.id,
            kind: EquivalenceKind::Partial,
            percentage: 80.0,
        })
        .await
        .expect("high partial");
    let most_recent = world
        .equivalences
        .declare(NewEquivalence {
            subject_origin: origin.id,
            subject_destination: tied.id,
            kind: EquivalenceKind::Partial,
            percentage: 80.0,
        })
        .await
        .expect("tied partial");

    // Highest percentage wins; the tie goes to the most recent record.
    let resolved = world
        .equivalences
        .resolve(origin.id, GradeSystem::Us)
        .await
        .expect("resolve")
        .expect("match found");
    assert_eq!(resolved.id, most_recent.id);

    // Repeated resolution over the same record set is deterministic.
    for _ in 0..5 {
        let again = world
            .equivalences
            .resolve(origin.id, GradeSystem::Us)
            .await
            .expect("resolve")
            .expect("match found");
        assert_eq!(again.id, resolved.id);
    }
}

#[tokio::test]
async fn resolution_filters_by_destination_system_and_activity() {
    let world = TestWorld::new().await;
    let origin = subject(&world, world.ar_institution.id, GradeSystem::Ar, "Física").await;
    let us_dest = subject(&world, world.us_institution.id, GradeSystem::Us, "Physics").await;

    let declared = world
        .equivalences
        .declare(NewEquivalence {
            subject_origin: origin.id,
            subject_destination: us_dest.id,
            kind: EquivalenceKind::Total,
            percentage: 100.0,
        })
        .await
        .expect("declare");

    // Wrong destination system: a counted miss, not an error.
    assert!(world
        .equivalences
        .resolve(origin.id, GradeSystem::De)
        .await
        .expect("resolve")
        .is_none());

    // Deactivation removes the record from resolution but not the store.
    world
        .equivalences
        .deactivate(declared.id)
        .await
        .expect("deactivate");
    assert!(world
        .equivalences
        .resolve(origin.id, GradeSystem::Us)
        .await
        .expect("resolve")
        .is_none());
    let listed = world
        .equivalences
        .list_by_origin(origin.id)
        .await
        .expect("list");
    assert_eq!(listed.len(), 1);
    assert!(!listed[0].active);
}

#[tokio::test]
async fn declare_rejects_self_equivalence_and_bad_percentage() {
    let world = TestWorld::new().await;
    let origin = subject(&world, world.ar_institution.id, GradeSystem::Ar, "Álgebra").await;
    let other = subject(&world, world.us_institution.id, GradeSystem::Us, "Algebra").await;

    assert!(matches!(
        world
            .equivalences
            .declare(NewEquivalence {
                subject_origin: origin.id,
                subject_destination: origin.id,
                kind: EquivalenceKind::Total,
                percentage: 100.0,
            })
            .await,
        Err(EquivalenceError::SelfEquivalence(_))
    ));

    assert!(matches!(
        world
            .equivalences
            .declare(NewEquivalence {
                subject_origin: origin.id,
                subject_destination: other.id,
                kind: EquivalenceKind::Partial,
                percentage: 130.0,
            })
            .await,
        Err(EquivalenceError::InvalidPercentage(_))
    ));

    assert!(matches!(
        world
            .equivalences
            .declare(NewEquivalence {
                subject_origin: Uuid::new_v4(),
                subject_destination: other.id,
                kind: EquivalenceKind::Total,
                percentage: 100.0,
            })
            .await,
        Err(EquivalenceError::SubjectNotFound(_))
    ));
}
