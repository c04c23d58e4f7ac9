//! Transfer REST routes.
//!
//! - `POST /transferencias/simular` - preview, no side effects
//! - `POST /transferencias` - execute (re-simulates internally)
//! - `GET  /transferencias/:estudianteId` - append-only history

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{transfer_error, ApiError, ApiState};
use crate::models::{TransferRecord, TransferSimulation};
use crate::transfer::TransferOutcome;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/transferencias/simular", post(simulate))
        .route("/transferencias", post(execute))
        .route("/transferencias/:estudiante_id", get(history))
}

#[derive(Debug, Deserialize)]
struct TransferRequest {
    #[serde(rename = "estudianteId")]
    estudiante_id: Uuid,
    #[serde(rename = "institucionDestinoId")]
    institucion_destino_id: Uuid,
}

async fn simulate(
    State(state): State<ApiState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferSimulation>, ApiError> {
    let simulation = state
        .transfers
        .simulate(request.estudiante_id, request.institucion_destino_id)
        .await
        .map_err(transfer_error)?;
    Ok(Json(simulation))
}

async fn execute(
    State(state): State<ApiState>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferOutcome>), ApiError> {
    let outcome = state
        .transfers
        .execute(request.estudiante_id, request.institucion_destino_id)
        .await
        .map_err(transfer_error)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn history(
    State(state): State<ApiState>,
    Path(estudiante_id): Path<Uuid>,
) -> Result<Json<Vec<TransferRecord>>, ApiError> {
    let records = state
        .transfers
        .history_for_student(estudiante_id)
        .await
        .map_err(transfer_error)?;
    Ok(Json(records))
}
