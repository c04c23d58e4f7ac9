//! Equivalence administration routes.
//!
//! Equivalences are declared explicitly by an operator and soft-deleted
//! only: `DELETE` deactivates the record, the history stays.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{equivalence_error, ApiError, ApiState};
use crate::equivalence::NewEquivalence;
use crate::models::{Equivalence, EquivalenceKind};

pub fn router() -> Router<ApiState> {
    // GET takes an origin-subject id, DELETE an equivalence id; the path
    // pattern is shared so both live on one route.
    Router::new()
        .route("/equivalencias", post(declare))
        .route("/equivalencias/:id", get(list_by_origin).delete(deactivate))
}

#[derive(Debug, Deserialize)]
struct DeclareRequest {
    #[serde(rename = "materiaOrigenId")]
    materia_origen_id: Uuid,
    #[serde(rename = "materiaDestinoId")]
    materia_destino_id: Uuid,
    tipo: EquivalenceKind,
    porcentaje: f64,
}

async fn declare(
    State(state): State<ApiState>,
    Json(request): Json<DeclareRequest>,
) -> Result<(StatusCode, Json<Equivalence>), ApiError> {
    let equivalence = state
        .equivalences
        .declare(NewEquivalence {
            subject_origin: request.materia_origen_id,
            subject_destination: request.materia_destino_id,
            kind: request.tipo,
            percentage: request.porcentaje,
        })
        .await
        .map_err(equivalence_error)?;
    Ok((StatusCode::CREATED, Json(equivalence)))
}

async fn list_by_origin(
    State(state): State<ApiState>,
    Path(materia_origen_id): Path<Uuid>,
) -> Result<Json<Vec<Equivalence>>, ApiError> {
    let records = state
        .equivalences
        .list_by_origin(materia_origen_id)
        .await
        .map_err(equivalence_error)?;
    Ok(Json(records))
}

async fn deactivate(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .equivalences
        .deactivate(id)
        .await
        .map_err(equivalence_error)?;
    Ok(StatusCode::NO_CONTENT)
}
