//! Convalida web server: wires the conversion engine, the equivalence
//! resolver and the transfer service behind the REST surface, seeded
//! with demo institutions so the API is usable out of the box.

use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use convalida::api::{api_router, ApiState};
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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "convalida=info,tower_http=debug".to_string()),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Stores and services
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
        history,
    ));

    seed_demo_data(&institutions, &subjects, &grades, &equivalences).await?;

    let state = ApiState {
        engine,
        equivalences,
        transfers,
    };

    let app = api_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any)),
    );

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);
    let addr = format!("0.0.0.0:{port}");
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Seed one institution per system, an AR student with a small record,
/// and equivalences toward the US institution.
async fn seed_demo_data(
    institutions: &InMemoryInstitutionStore,
    subjects: &InMemorySubjectStore,
    grades: &InMemoryGradeStore,
    equivalences: &EquivalenceService,
) -> anyhow::Result<()> {
    let unba = Institution {
        id: Uuid::new_v4(),
        name: "Universidad Nacional de Buenos Aires".to_string(),
        system: GradeSystem::Ar,
    };
    let mit = Institution {
        id: Uuid::new_v4(),
        name: "Massachusetts Institute of Technology".to_string(),
        system: GradeSystem::Us,
    };
    let oxford = Institution {
        id: Uuid::new_v4(),
        name: "University of Oxford".to_string(),
        system: GradeSystem::Uk,
    };
    let tum = Institution {
        id: Uuid::new_v4(),
        name: "Technische Universität München".to_string(),
        system: GradeSystem::De,
    };
    for institution in [&unba, &mit, &oxford, &tum] {
        institutions.upsert(institution.clone()).await;
    }

    let student_id = Uuid::new_v4();
    let demo_subjects = [
        ("Análisis Matemático I", "Calculus I"),
        ("Álgebra Lineal", "Linear Algebra"),
        ("Física I", "Physics I"),
    ];
    for (index, (ar_name, us_name)) in demo_subjects.iter().enumerate() {
        let origin = Subject {
            id: Uuid::new_v4(),
            institution_id: unba.id,
            system: GradeSystem::Ar,
            name: ar_name.to_string(),
        };
        let destination = Subject {
            id: Uuid::new_v4(),
            institution_id: mit.id,
            system: GradeSystem::Us,
            name: us_name.to_string(),
        };
        subjects.upsert(origin.clone()).await;
        subjects.upsert(destination.clone()).await;

        grades
            .seed(GradeRecord {
                id: Uuid::new_v4(),
                student_id,
                institution_id: unba.id,
                subject_id: origin.id,
                system: GradeSystem::Ar,
                value: NativeValue::Ar(ArGrade {
                    nota: 7.0 + index as f64,
                    instancia: Some("final".to_string()),
                }),
                period: "2024-2C".to_string(),
                created_at: chrono::Utc::now(),
            })
            .await;

        equivalences
            .declare(NewEquivalence {
                subject_origin: origin.id,
                subject_destination: destination.id,
                kind: EquivalenceKind::Total,
                percentage: 100.0,
            })
            .await?;
    }

    info!(
        %student_id,
        institution_origin = %unba.id,
        institution_destination = %mit.id,
        "demo data seeded"
    );
    Ok(())
}
